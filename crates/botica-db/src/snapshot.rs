//! # Snapshots
//!
//! Plain in-memory copies of the stored collections, loaded once per
//! command and handed to the analytics engines as slices.

use serde::Serialize;
use std::collections::HashMap;

use botica_core::{Client, Order, Settings, Visit};

/// Everything in the database.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    pub clients: Vec<Client>,
    pub orders: Vec<Order>,
    pub visits: Vec<Visit>,
    pub settings: Settings,
}

impl Snapshot {
    /// Orders grouped by client id.
    pub fn orders_by_client(&self) -> HashMap<&str, Vec<Order>> {
        let mut grouped: HashMap<&str, Vec<Order>> = HashMap::new();
        for order in &self.orders {
            grouped
                .entry(order.client_id.as_str())
                .or_default()
                .push(order.clone());
        }
        grouped
    }

    /// Looks a client up by id.
    pub fn client(&self, id: &str) -> Option<&Client> {
        self.clients.iter().find(|c| c.id == id)
    }
}

/// One client with its history.
#[derive(Debug, Clone, Serialize)]
pub struct ClientSnapshot {
    pub client: Client,
    /// Newest first.
    pub orders: Vec<Order>,
    /// Newest first.
    pub visits: Vec<Visit>,
}
