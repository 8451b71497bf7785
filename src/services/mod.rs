pub mod classifier;
pub mod ticket_api;

pub use classifier::ClassifierService;
pub use ticket_api::TicketApi;
