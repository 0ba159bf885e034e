pub mod cli;
pub mod serve;
pub mod signal;
pub mod worker;
