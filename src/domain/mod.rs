pub mod draft;
pub mod filter;
pub mod stats;
pub mod ticket;
