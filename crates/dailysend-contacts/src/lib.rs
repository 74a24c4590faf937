//! # DailySend Contacts
//!
//! Turns a directory of headerless `phone,name` CSV files into one ordered,
//! validated [`ContactCatalog`].
//!
//! ```text
//! SDB (1).csv ┐
//! SDB (2).csv ├─ select_sources (first matching family, sorted)
//! SDB (3).csv ┘        ↓
//!               parse_csv per file (broken files skipped)
//!                      ↓
//!               ContactValidator (strip non-digits, exact length)
//!                      ↓
//!               ContactCatalog  ← the scheduler's cursor indexes this order
//! ```

pub mod catalog;
pub mod source;
pub mod validator;

pub use catalog::{CatalogStats, CatalogWarning, ContactCatalog};
pub use source::{CsvDirSource, MemorySource, select_sources};
pub use validator::ContactValidator;
