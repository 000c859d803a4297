//! # lapak-flow
//!
//! The fixed menu catalog, the per-customer session record, and the
//! conversation state machine. Pure data and logic — no I/O.

pub mod machine;
pub mod menu;
pub mod replies;
pub mod session;
