//! Task decoding, engine bridging and result reconciliation for hopq workers.
//!
//! The crate is split along the path a job travels: [`payload`] turns an untyped
//! queue message into a [`payload::TaskDescriptor`], [`bridge`] hands it to the
//! external engine, [`reconcile`] turns the engine's output back into typed
//! per-host results, and [`worker`] / [`status`] / [`submit`] wire those steps to
//! the queue substrate described in [`queue`].

pub mod api;
pub mod bridge;
pub mod config;
pub mod error;
pub mod payload;
pub mod queue;
pub mod reconcile;
pub mod status;
pub mod submit;
pub mod util;
pub mod worker;
