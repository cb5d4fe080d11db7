//! Database abstraction for the drug store
//!
//! Simple SQLite wrapper for basic database operations.
//! Drug-specific schema and queries live in the `store` module.
//!
//! # Example
//! ```no_run
//! use drugstore::db::SqliteDatabase;
//!
//! let db = SqliteDatabase::open_existing("data/drugbank.db")?;
//! let drugs: i64 = db
//!     .connection()
//!     .query_row("SELECT COUNT(*) FROM drugs", [], |row| row.get(0))?;
//! println!("{drugs} drugs");
//! # Ok::<(), drugstore::Error>(())
//! ```

pub mod sqlite;

pub use sqlite::SqliteDatabase;
