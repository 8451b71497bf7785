pub mod cmd;
pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod infra;
pub mod services;
pub mod sync;
#[cfg(test)]
mod test_support;
pub mod workflow;
