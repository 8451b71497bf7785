use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{ClassifierService, TicketApi};
use crate::sync::Scheduler;

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub ticket_api: Arc<dyn TicketApi>,
    pub classifier: Arc<dyn ClassifierService>,
    pub scheduler: Arc<dyn Scheduler>,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        ticket_api: Arc<dyn TicketApi>,
        classifier: Arc<dyn ClassifierService>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self {
            config,
            ticket_api,
            classifier,
            scheduler,
        }
    }
}
