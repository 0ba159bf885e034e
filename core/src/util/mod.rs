mod text;

pub use text::{preview, truncate_chars};
