//! hopq-cli library: command handlers and the HTTP front-end, exposed for tests.

pub mod commands;
pub mod http;
