//! Untyped task payload -> validated [`TaskDescriptor`].

mod decode;
mod normalize;
mod types;
mod value;

pub use decode::{
    decode_commands, decode_kwargs, decode_proxy, decode_target, decode_targets, decode_task,
};
pub use normalize::{
    effective_concurrency, normalize_port, normalize_timeout, DEFAULT_PORT, FALLBACK_TIMEOUT_SECS,
};
pub use types::{JobSpec, Kwargs, ProxyCredential, TargetCredential, TaskDescriptor, TaskKind};
pub use value::{value_to_bool, value_to_int, value_to_string};
