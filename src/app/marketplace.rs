//! The marketplace service.
//!
//! Bundles the table store, the authorization gate and the change feed, and
//! hands out one scoped repository per role resource.

use super::scoped_repository::ScopedRepository;
use crate::auth::AuthGate;
use crate::domain::model::catalog;
use crate::domain::model::{ResourceRegistry, ResourceSpec};
use crate::domain::records::{FoodItem, Job, Order, Product, Service, ServiceOffer, Task};
use crate::domain::Role;
use crate::realtime::ChangeFeed;
use crate::storage::TableStore;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::sync::Arc;

pub struct Marketplace {
    store: Arc<dyn TableStore>,
    gate: Arc<AuthGate>,
    feed: ChangeFeed,
    registry: ResourceRegistry,
}

impl Marketplace {
    pub fn new(store: Arc<dyn TableStore>, gate: Arc<AuthGate>, feed: ChangeFeed) -> Self {
        Self {
            store,
            gate,
            feed,
            registry: ResourceRegistry::marketplace(),
        }
    }

    pub fn gate(&self) -> &AuthGate {
        &self.gate
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    pub fn store(&self) -> &Arc<dyn TableStore> {
        &self.store
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn repository<R: DeserializeOwned>(&self, spec: &'static ResourceSpec) -> ScopedRepository<R> {
        ScopedRepository::new(self.store.clone(), self.gate.clone(), self.feed.clone(), spec)
    }

    /// Untyped repository for `{role}/{path}`, used by the HTTP layer.
    pub fn resource(&self, role: Role, path: &str) -> Option<ScopedRepository<JsonValue>> {
        self.registry.get(role, path).map(|spec| self.repository(spec))
    }

    pub fn orders(&self) -> ScopedRepository<Order> {
        self.repository(&catalog::CUSTOMER_ORDERS)
    }

    /// Offers the caller made on freelancers' services.
    pub fn customer_offers(&self) -> ScopedRepository<ServiceOffer> {
        self.repository(&catalog::CUSTOMER_OFFERS)
    }

    pub fn tasks(&self) -> ScopedRepository<Task> {
        self.repository(&catalog::DRIVER_TASKS)
    }

    pub fn products(&self) -> ScopedRepository<Product> {
        self.repository(&catalog::SELLER_PRODUCTS)
    }

    pub fn food_items(&self) -> ScopedRepository<FoodItem> {
        self.repository(&catalog::SELLER_FOOD_ITEMS)
    }

    pub fn jobs(&self) -> ScopedRepository<Job> {
        self.repository(&catalog::FREELANCER_JOBS)
    }

    pub fn services(&self) -> ScopedRepository<Service> {
        self.repository(&catalog::FREELANCER_SERVICES)
    }

    /// Offers customers made on the caller's services; read-only apart from `status`.
    pub fn freelancer_offers(&self) -> ScopedRepository<ServiceOffer> {
        self.repository(&catalog::FREELANCER_OFFERS)
    }
}
