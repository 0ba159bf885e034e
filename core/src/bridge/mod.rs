//! Launches the external engine for one task and turns its output into results.

mod args;
mod bridge;
mod traits;

pub use args::{build_engine_args, LogHint};
pub use bridge::{BridgeSettings, ProcessBridge, ENGINE_STDOUT_PREVIEW};
pub use traits::{EngineInvocation, EngineOutput, EngineRunner};
