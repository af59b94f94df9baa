//! Status and display enums shared by nodes, links and map metadata.
//!
//! The wire names match the backend's lowercase string enums. Ordinals follow
//! the decay order so callers can compare severities directly.

use serde::{Deserialize, Serialize};

/// Decay stage of a wormhole connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifetimeStatus {
    /// More than 24 hours remaining.
    #[default]
    Stable,
    /// Less than 24 hours remaining.
    Aging,
    /// Less than 4 hours remaining.
    Critical,
    /// End of life: less than 1 hour remaining.
    Eol,
}

/// Depletion stage of a wormhole connection's jump-mass budget.
///
/// The backend names the stages stable / destabilized / critical; clients
/// usually present them as fresh / reduced / critical.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MassStatus {
    /// More than 50% mass remaining.
    #[default]
    Stable,
    /// 10-50% mass remaining.
    Destabilized,
    /// Less than 10% mass remaining.
    Critical,
}

/// Connection line style used when drawing edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeType {
    /// Bezier curves.
    #[default]
    Default,
    Straight,
    Step,
    Smoothstep,
    Simplebezier,
}

/// Layout direction for the hierarchical layout pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RankDir {
    /// Top to bottom.
    #[default]
    TB,
    /// Bottom to top.
    BT,
    /// Left to right.
    LR,
    /// Right to left.
    RL,
}

impl LifetimeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifetimeStatus::Stable => "stable",
            LifetimeStatus::Aging => "aging",
            LifetimeStatus::Critical => "critical",
            LifetimeStatus::Eol => "eol",
        }
    }
}

impl MassStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MassStatus::Stable => "stable",
            MassStatus::Destabilized => "destabilized",
            MassStatus::Critical => "critical",
        }
    }
}
