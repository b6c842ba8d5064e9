//! habits.dataset.v1 snapshot schema
//!
//! This module defines the snapshot format exchanged with the storage
//! collaborator and the parsing rules for check-off dates. Dates are validated
//! here so that the engine only ever sees parsed calendar dates.

mod dataset;
mod date;

pub use dataset::*;
pub use date::*;
