//! Domain layer: entity records, the entity registry, live connections, and
//! the broadcaster.
//!
//! The registry and the connection set are two independently locked
//! structures. Nothing in this module ever holds both locks at once.

pub mod broadcaster;
pub mod connection;
pub mod connection_id;
pub mod connection_set;
pub mod entity;
pub mod entity_registry;
pub mod relay_event;

pub use broadcaster::{BroadcastReport, Broadcaster};
pub use connection::ConnectionHandle;
pub use connection_id::ConnectionId;
pub use connection_set::ConnectionSet;
pub use entity::{Entity, EntityUpdate, Username};
pub use entity_registry::{EntityEntry, EntityRegistry};
pub use relay_event::{Notice, RelayEvent};
