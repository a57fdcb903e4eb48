//! Persistence layer — keyed document storage for sessions, drafts, builds,
//! and the inbound message log.

pub mod libsql_backend;
pub mod traits;

pub use libsql_backend::LibSqlStore;
pub use traits::Store;
