//! Substitute cover allocation for school timetables.
//!
//! Given each teacher's weekly schedule and a running count of substitutions
//! already done, works out who should cover an absent teacher's slots on a
//! given day, preferring one person for the whole block and falling back to a
//! per-slot pick. The least-loaded eligible teacher wins; only teachers with a
//! duty period in a slot are eligible for it.
//!
//! - **`schedule`**: slot catalog, availability, fairness and allocation
//! - **`ledger`**: workload counters, history and committing confirmed assignments
//! - **`store`**, **`parser`**: files on disk and CSV schedule import
//! - **`config`**, **`display`**, **`web`**: the surfaces used by the binary

pub mod config;
pub mod display;
pub mod error;
pub mod ledger;
pub mod parser;
pub mod schedule;
pub mod store;
pub mod web;
