#![forbid(unsafe_code)]

pub mod bank;
pub mod repository;

pub use bank::{BankLoad, load_catalog};
pub use repository::{InMemorySessionStore, SessionRecord, SessionStore, StorageError};
