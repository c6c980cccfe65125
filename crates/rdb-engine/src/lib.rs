//! # Engine: table manager, compactor, and query runner
//!
//! Binds the three inseparable subsystems (`rdb-codec`, `rdb-heap`,
//! `rdb-btree`) into a working table: the [`TableManager`] owns per-table
//! metadata, the [`compactor`] rewrites heap and indexes in lockstep once
//! the deletion ratio crosses a threshold, and [`Runner`] dispatches
//! structured queries to command handlers built on top of all three.

pub mod compactor;
pub mod descriptor;

mod commands;
mod error;
mod query;
mod runner;
mod table_manager;

pub use descriptor::{TableDescriptor, TableStats, INDEX_KIND_BPLUS};
pub use error::Error;
pub use query::{ColumnSpec, CommandResult, Filter, Query, Status};
pub use runner::Runner;
pub use table_manager::TableManager;

#[cfg(test)]
mod tests;
