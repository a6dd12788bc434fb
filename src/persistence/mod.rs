//! Persistence collaborator.
//!
//! The engine never owns a connection. Hosts inject a `GameStore`; the
//! service calls it after every applied action and when rehydrating a game.
//!
//! - `store`: the `GameStore` port and `StorageError`
//! - `codec`: bincode encoding of headers and states
//! - `memory`: `InMemoryStore`, a reference adapter for tests and embedding

pub mod codec;
pub mod memory;
pub mod store;

pub use memory::InMemoryStore;
pub use store::{GameStore, StorageError, StorageResult};
