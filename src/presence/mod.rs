//! Session registry: who is connected, over which connection, and with
//! which status. The registry is the only writer of [`Session`] records;
//! the persistence store is a best-effort mirror of it.

pub mod errors;
pub mod file_session_store;
pub mod persistence_mirror;
pub mod presence_event;
pub mod registry;
pub mod session;
pub mod session_store;

pub use errors::{PersistenceError, RegistryError};
pub use file_session_store::FileSessionStore;
pub use presence_event::{PresenceCause, PresenceEvent};
pub use registry::{ReconcileReport, SessionRegistry};
pub use session::{ConnectionId, Lookup, PresenceStatus, Principal, Session, SessionId};
pub use session_store::{InMemorySessionStore, SessionStore};
