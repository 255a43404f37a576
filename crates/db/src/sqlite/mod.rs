//! SQLite-Backend fuer den Schluesselspeicher

pub mod keys;
pub mod pool;

pub use pool::SqliteDb;
