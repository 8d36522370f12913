//! Batched sum coordination.
//!
//! Contributors add a number to the current batch and wait. A terminator closes the
//! batch: every contributor of it, and the terminator itself, receive the same sum
//! and correlation token, and the next batch starts from zero.
//!
//! The [`Coordinator`](coordinator::Coordinator) exposes the two operations, the
//! [`WorkDispatcher`](dispatcher::WorkDispatcher) runs each of them on its own task
//! and the [`concurrency`] module holds the barrier that synchronizes them.

pub mod accumulator;
pub mod command;
pub mod concurrency;
pub mod coordinator;
pub mod correlation;
pub mod dispatcher;
pub mod error;
pub mod types;
