pub mod classroom;
pub mod hub;
pub mod session;
pub mod store;

pub use classroom::ClassroomService;
pub use hub::{BroadcastHub, SnapshotFanout};
pub use session::{KeepaliveConfig, SessionEnd};
pub use store::{MemoryStore, SnapshotStore};
