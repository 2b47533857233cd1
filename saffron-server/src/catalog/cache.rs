//! Product listing cache
//!
//! Bounded, time-expiring cache of listing query results. Keys are
//! structured (filter fields, not concatenated strings) so invalidation
//! can match on category/status instead of substring tricks. Writers
//! invalidate; readers may see entries up to the TTL stale.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use shared::models::{Product, ProductStatus};
use tokio::sync::RwLock;

/// Structured cache key: one per distinct listing query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListingKey {
    pub category_id: Option<i64>,
    pub status: Option<ProductStatus>,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug)]
struct Entry {
    inserted_at: Instant,
    products: Arc<Vec<Product>>,
}

/// Product listing cache
#[derive(Debug, Clone)]
pub struct ListingCache {
    inner: Arc<RwLock<HashMap<ListingKey, Entry>>>,
    ttl: Duration,
    capacity: usize,
}

impl ListingCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Look up a listing; expired entries are dropped on access.
    pub async fn get(&self, key: &ListingKey) -> Option<Arc<Vec<Product>>> {
        {
            let inner = self.inner.read().await;
            match inner.get(key) {
                Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                    return Some(entry.products.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }
        // Entry exists but expired: remove it
        let mut inner = self.inner.write().await;
        if let Some(entry) = inner.get(key)
            && entry.inserted_at.elapsed() >= self.ttl
        {
            inner.remove(key);
        }
        None
    }

    /// Store a listing result, evicting the oldest entry when full.
    pub async fn insert(&self, key: ListingKey, products: Vec<Product>) {
        let mut inner = self.inner.write().await;
        if inner.len() >= self.capacity && !inner.contains_key(&key) {
            let oldest = inner
                .iter()
                .min_by_key(|(_, e)| e.inserted_at)
                .map(|(k, _)| k.clone());
            if let Some(k) = oldest {
                inner.remove(&k);
            }
        }
        inner.insert(
            key,
            Entry {
                inserted_at: Instant::now(),
                products: Arc::new(products),
            },
        );
    }

    /// Invalidate every entry a mutation could have affected.
    ///
    /// An entry matches when its category filter is the mutated category
    /// or absent, and likewise for status. `None` arguments match every
    /// entry on that axis.
    pub async fn invalidate(&self, category_id: Option<i64>, status: Option<ProductStatus>) {
        let mut inner = self.inner.write().await;
        inner.retain(|key, _| {
            let category_hit = match (category_id, key.category_id) {
                (Some(cat), Some(key_cat)) => cat == key_cat,
                // Unfiltered listings always contain the mutated row
                _ => true,
            };
            let status_hit = match (status, key.status) {
                (Some(s), Some(key_s)) => s == key_s,
                _ => true,
            };
            !(category_hit && status_hit)
        });
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(category_id: Option<i64>, status: Option<ProductStatus>, page: u32) -> ListingKey {
        ListingKey {
            category_id,
            status,
            page,
            page_size: 20,
        }
    }

    fn product(id: i64, category_id: i64) -> Product {
        Product {
            id,
            name: format!("Product {id}"),
            slug: format!("product-{id}"),
            description: None,
            status: ProductStatus::Published,
            version: 1,
            category_id,
            variants: vec![],
            images: vec![],
        }
    }

    #[tokio::test]
    async fn test_get_and_insert() {
        let cache = ListingCache::new(Duration::from_secs(60), 8);
        assert!(cache.get(&key(None, None, 0)).await.is_none());

        cache.insert(key(None, None, 0), vec![product(1, 1)]).await;
        let hit = cache.get(&key(None, None, 0)).await.unwrap();
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].id, 1);
    }

    #[tokio::test]
    async fn test_expired_entries_miss() {
        let cache = ListingCache::new(Duration::from_millis(10), 8);
        cache.insert(key(None, None, 0), vec![product(1, 1)]).await;
        tokio::time::sleep(Duration::from_millis(25)).await;
        assert!(cache.get(&key(None, None, 0)).await.is_none());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest() {
        let cache = ListingCache::new(Duration::from_secs(60), 2);
        cache.insert(key(Some(1), None, 0), vec![]).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        cache.insert(key(Some(2), None, 0), vec![]).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        cache.insert(key(Some(3), None, 0), vec![]).await;

        assert_eq!(cache.len().await, 2);
        assert!(cache.get(&key(Some(1), None, 0)).await.is_none());
        assert!(cache.get(&key(Some(3), None, 0)).await.is_some());
    }

    #[tokio::test]
    async fn test_invalidation_is_surgical() {
        let cache = ListingCache::new(Duration::from_secs(60), 8);
        cache.insert(key(Some(1), None, 0), vec![]).await;
        cache.insert(key(Some(2), None, 0), vec![]).await;
        cache
            .insert(key(Some(1), Some(ProductStatus::Draft), 0), vec![])
            .await;
        cache.insert(key(None, None, 0), vec![]).await;

        // A PUBLISHED mutation in category 1 must not touch the category-2
        // listing or category 1's DRAFT-only listing, but always drops the
        // unfiltered one.
        cache
            .invalidate(Some(1), Some(ProductStatus::Published))
            .await;

        assert!(cache.get(&key(Some(1), None, 0)).await.is_none());
        assert!(cache.get(&key(None, None, 0)).await.is_none());
        assert!(cache.get(&key(Some(2), None, 0)).await.is_some());
        assert!(cache
            .get(&key(Some(1), Some(ProductStatus::Draft), 0))
            .await
            .is_some());
    }

    #[tokio::test]
    async fn test_invalidate_all_statuses_of_category() {
        let cache = ListingCache::new(Duration::from_secs(60), 8);
        cache
            .insert(key(Some(1), Some(ProductStatus::Draft), 0), vec![])
            .await;
        cache
            .insert(key(Some(1), Some(ProductStatus::Published), 0), vec![])
            .await;

        cache.invalidate(Some(1), None).await;
        assert_eq!(cache.len().await, 0);
    }
}
