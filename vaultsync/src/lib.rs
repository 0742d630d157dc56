//! Incremental replication engine for vault events.
//!
//! Moves append-only vault event records from an operational Postgres store
//! into an analytical warehouse, keeping the two consistent under partial
//! failures and without external coordination. Each run performs one pass:
//! resolve the watermark, extract the backlog, shape rows, load them, and
//! refresh the analytics summary view.

pub mod error;
pub mod extract;
pub mod load;
mod macros;
pub mod pipeline;
pub mod refresh;
pub mod shape;
pub mod source;
pub mod types;
pub mod warehouse;
pub mod watermark;
