//! HTTP front-end: task submission and status queries over JSON.

pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod state;

pub use models::*;
pub use server::*;
pub use state::*;
