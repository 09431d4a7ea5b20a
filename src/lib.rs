//! In-memory core of a section-based PLC surface editor.
//!
//! The [`model::ModelStore`] owns nodes, facets and regions together with
//! their group and section registries. Every edit goes through a
//! [`command::Command`] so it can be undone. [`synthesis`] and [`check`]
//! are read-only queries, [`session`] persists the whole state and
//! [`export`] writes TetGen input.

pub mod check;
pub mod command;
pub mod error;
pub mod export;
pub mod math;
pub mod model;
pub mod options;
pub mod selection;
pub mod session;
pub mod synthesis;

#[cfg(test)]
mod test_support;

pub use error::{PlcError, Result};
