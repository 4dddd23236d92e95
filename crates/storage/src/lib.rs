//! Storage layer for lightchat
//!
//! Key/value document store (in-memory or PostgreSQL JSONB) and the light
//! repository built on it.

mod backend;
mod devices;
pub mod error;
mod memory;
#[cfg(feature = "postgres")]
mod pg_migrations;
#[cfg(feature = "postgres")]
mod pg_store;
#[cfg(test)]
mod tests;
pub mod traits;

pub use backend::StorageBackend;
pub use devices::DeviceRepository;
pub use error::StorageError;
pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use pg_store::PgStore;
pub use traits::DocumentStore;
