//! Document store seam. The managed document database is consumed as a
//! typed collection interface; handlers never see anything richer than
//! get/put/list per collection.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::{Offer, Property, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn put_property(&self, property: Property) -> Result<(), StoreError>;
    async fn get_property(&self, id: &str) -> Result<Option<Property>, StoreError>;
    async fn list_properties(&self) -> Result<Vec<Property>, StoreError>;
    async fn increment_views(&self, id: &str) -> Result<(), StoreError>;

    async fn put_user(&self, user: User) -> Result<(), StoreError>;
    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError>;

    async fn put_offer(&self, offer: Offer) -> Result<(), StoreError>;
    async fn get_offer(&self, id: &str) -> Result<Option<Offer>, StoreError>;
    /// Offers where the user is buyer or seller.
    async fn list_offers_for_user(&self, user_id: &str) -> Result<Vec<Offer>, StoreError>;
}

#[derive(Default)]
struct Collections {
    properties: HashMap<String, Property>,
    users: HashMap<String, User>,
    offers: HashMap<String, Offer>,
}

/// In-memory store used in place of the managed document database.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn put_property(&self, property: Property) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.properties.insert(property.id.clone(), property);
        Ok(())
    }

    async fn get_property(&self, id: &str) -> Result<Option<Property>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.properties.get(id).cloned())
    }

    async fn list_properties(&self) -> Result<Vec<Property>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.properties.values().cloned().collect())
    }

    async fn increment_views(&self, id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(property) = inner.properties.get_mut(id) {
            property.views += 1;
        }
        Ok(())
    }

    async fn put_user(&self, user: User) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.users.insert(user.id.clone(), user);
        Ok(())
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(id).cloned())
    }

    async fn put_offer(&self, offer: Offer) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.offers.insert(offer.id.clone(), offer);
        Ok(())
    }

    async fn get_offer(&self, id: &str) -> Result<Option<Offer>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.offers.get(id).cloned())
    }

    async fn list_offers_for_user(&self, user_id: &str) -> Result<Vec<Offer>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .offers
            .values()
            .filter(|o| o.buyer_id == user_id || o.seller_id == user_id)
            .cloned()
            .collect())
    }
}
