//! User-visible notifications.
//!
//! Failures and lifecycle changes surface as short-lived toasts: a title and
//! an optional description, never blocking and never acknowledged. The
//! presentation layer supplies a [`Notifier`]; [`TracingNotifier`] writes
//! toasts to the log and [`ToastLog`] keeps them in memory.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub title: String,
    pub description: Option<String>,
}

impl Toast {
    fn new(level: ToastLevel, title: &str, description: Option<String>) -> Self {
        Toast {
            level,
            title: title.to_string(),
            description,
        }
    }

    pub fn info(title: &str) -> Self {
        Self::new(ToastLevel::Info, title, None)
    }

    pub fn success(title: &str) -> Self {
        Self::new(ToastLevel::Success, title, None)
    }

    pub fn warning(title: &str, description: impl Into<String>) -> Self {
        Self::new(ToastLevel::Warning, title, Some(description.into()))
    }

    pub fn error(title: &str, description: impl Into<String>) -> Self {
        Self::new(ToastLevel::Error, title, Some(description.into()))
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}

/// Writes every toast to the `tracing` log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, toast: Toast) {
        let description = toast.description.as_deref().unwrap_or("");
        match toast.level {
            ToastLevel::Info | ToastLevel::Success => info!("{} {}", toast.title, description),
            ToastLevel::Warning => warn!("{} {}", toast.title, description),
            ToastLevel::Error => error!("{} {}", toast.title, description),
        }
    }
}

/// Collects toasts for a caller to drain.
#[derive(Debug, Clone, Default)]
pub struct ToastLog {
    toasts: Arc<Mutex<Vec<Toast>>>,
}

impl ToastLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<Toast> {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn take(&self) -> Vec<Toast> {
        std::mem::take(&mut *self.toasts.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Notifier for ToastLog {
    fn notify(&self, toast: Toast) {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(toast);
    }
}
