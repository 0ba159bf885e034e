mod load;
mod types;

pub use load::{apply_overrides, hopq_data_dir, load_config, load_env_file, load_from_path};
pub use types::{AppConfig, ExecutorConfig, HttpServerConfig, LoggingConfig, QueueConfig};
