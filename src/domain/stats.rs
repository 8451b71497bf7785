use std::collections::BTreeMap;

use serde::Deserialize;

use crate::domain::ticket::{Category, Priority};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Stats {
    pub total_tickets: u64,
    pub open_tickets: u64,
    pub avg_tickets_per_day: f64,
    pub priority_breakdown: BTreeMap<Priority, u64>,
    pub category_breakdown: BTreeMap<Category, u64>,
}
