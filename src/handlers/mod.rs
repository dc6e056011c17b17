pub mod activities;
pub mod customers;
pub mod health;
pub mod inventory;
pub mod leads;
pub mod orders;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    activities::ActivityService, customers::CustomerService, inventory::InventoryService,
    leads::LeadService, orders::OrderService,
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub leads: Arc<LeadService>,
    pub customers: Arc<CustomerService>,
    pub orders: Arc<OrderService>,
    pub inventory: Arc<InventoryService>,
    pub activities: Arc<ActivityService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, config: &AppConfig) -> Self {
        let leads = Arc::new(LeadService::new(db_pool.clone(), event_sender.clone()));
        let customers = Arc::new(CustomerService::new(db_pool.clone(), event_sender.clone()));
        let orders = Arc::new(OrderService::new(
            db_pool.clone(),
            event_sender.clone(),
            config.default_brand.clone(),
            config.default_currency.clone(),
        ));
        let inventory = Arc::new(InventoryService::new(db_pool.clone(), event_sender.clone()));
        let activities = Arc::new(ActivityService::new(db_pool, event_sender));

        Self {
            leads,
            customers,
            orders,
            inventory,
            activities,
        }
    }
}
