pub mod error;
pub mod event;
pub mod id;
pub mod model;
pub mod types;

// Re-export commonly used types
pub use error::CoreError;
pub use event::{AccessSubject, ChangeKind, MapEvent, PresenceChange};
pub use id::{EventId, LinkId, MapId, NodeId};
pub use model::{
    DisplaySettings, MapDetail, MapEdge, MapInfo, MapNode, NodeCharacter, Note, Position,
    Signature, Viewport,
};
pub use types::{EdgeType, LifetimeStatus, MassStatus, RankDir};
