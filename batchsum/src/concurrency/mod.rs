//! Coordination primitives for batches of concurrent operations.
//!
//! The [`barrier`] module holds the [`SessionBarrier`](barrier::SessionBarrier) that
//! every contributor and terminator meets at. The [`session`] module holds the
//! state machine it drives:
//!
//! ```text
//!   Open ──release──▶ Releasing ──▶ Confirming ──all acknowledged──▶ Resetting ──▶ Open
//! ```
//!
//! Contributors register only while the session is open and are released exactly
//! once. A terminator owns the session from the moment it wakes the contributors up
//! until the total is reset, so at most one session is ever outside of `Open`.

pub mod barrier;
pub mod session;
