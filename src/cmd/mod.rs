pub mod config;
pub mod tickets;
