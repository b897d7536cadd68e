//! Test helpers module
//!
//! Fixtures, a ready-made service context over the in-memory store, store
//! wrappers that inject faults or record queries, and the Postgres test
//! database.

#![allow(dead_code)]

pub mod database_helper;
pub mod store_wrappers;
pub mod test_context;
pub mod test_data;

pub use database_helper::*;
pub use store_wrappers::*;
pub use test_context::*;
pub use test_data::*;
