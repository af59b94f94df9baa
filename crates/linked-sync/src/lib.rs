pub mod actions;
pub mod client;
pub mod config;
pub mod error;
pub mod notify;
pub mod panels;
pub mod reconciler;
pub mod render;
pub mod session;
pub mod sse;
pub mod store;
pub mod stream;
pub mod transport;
pub mod view;
pub mod viewport;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use actions::{DeletionOutcome, DeletionPlan, MapActions};
pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::{ActionError, ActionErrorKind, ApiError, ConfigError, ConnectError, StreamError};
pub use notify::{Notifier, Toast, ToastLevel, ToastLog, TracingNotifier};
pub use panels::{DetailFeed, DetailKind, DetailPanel};
pub use reconciler::{LeaveReason, ReconcileOutcome, Reconciler};
pub use session::{Session, SessionState};
pub use store::{GraphState, GraphStore};
pub use stream::{MapEventStream, StreamMessage};
pub use view::{MapView, ViewExit};
pub use viewport::{ViewportPersister, ViewportSink};
