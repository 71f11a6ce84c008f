//! Read-only access to gene-expression prediction weight databases.
//!
//! [`WeightDb`] lazily opens a SQLite weight store and serves filtered bulk reads of its
//! `weights` and `extra` tables. [`WeightIndex`] reads both tables once and materializes
//! the lookups used by prediction pipelines: weights by gene, gene summaries by gene and
//! genes by rsid.

pub mod error;
pub mod index;
pub mod persist;
pub mod record;
pub mod store;

pub use error::{Result, WeightDbError};
pub use index::WeightIndex;
pub use record::{GeneSummaryRecord, WeightRecord};
pub use store::{LoadContext, WeightCallback, WeightDb};
