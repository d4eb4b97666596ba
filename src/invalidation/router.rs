//! Invalidation router bound to one store instance.

use tracing::info;

use crate::cache::CacheStore;
use crate::invalidation::Domain;

// == Cache Invalidator ==
/// Deletes groups of keys by domain prefix.
///
/// Depends on nothing but the store it wraps, so the same router serves
/// request handlers and any other execution context holding its own store.
/// Every operation returns the number of entries removed; removing nothing
/// is not an error.
#[derive(Debug, Clone)]
pub struct CacheInvalidator<V> {
    store: CacheStore<V>,
}

impl<V> CacheInvalidator<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(store: CacheStore<V>) -> Self {
        Self { store }
    }

    /// The store this router targets.
    pub fn store(&self) -> &CacheStore<V> {
        &self.store
    }

    // == Domain-wide ==
    /// Drops every `<domain>:*` and `<domain>s:*` key.
    pub fn invalidate_all(&self, domain: Domain) -> usize {
        let removed = self.store.delete_prefix(&domain.entity_prefix())
            + self.store.delete_prefix(&domain.list_prefix());

        info!(%domain, removed, "invalidated domain");
        removed
    }

    // == Single entity ==
    /// Drops `<domain>:<id>` and every `<domain>s:*` collection key.
    ///
    /// Collections are dropped wholesale since any of them may contain the entity.
    pub fn invalidate_by_id(&self, domain: Domain, id: &str) -> usize {
        let entity = usize::from(self.store.delete(&domain.entity_key(id)));
        let lists = self.store.delete_prefix(&domain.list_prefix());

        info!(%domain, id, removed = entity + lists, "invalidated entity");
        entity + lists
    }

    /// Drops every key starting with `prefix`.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let removed = self.store.delete_prefix(prefix);
        info!(prefix, removed, "invalidated prefix");
        removed
    }

    // == Everything ==
    pub fn clear_all(&self) -> usize {
        let removed = self.store.clear();
        info!(removed, "cleared cache");
        removed
    }

    pub fn invalidate_all_products(&self) -> usize {
        self.invalidate_all(Domain::Product)
    }

    pub fn invalidate_product_by_id(&self, id: &str) -> usize {
        self.invalidate_by_id(Domain::Product, id)
    }

    pub fn invalidate_all_orders(&self) -> usize {
        self.invalidate_all(Domain::Order)
    }

    pub fn invalidate_order_by_id(&self, id: &str) -> usize {
        self.invalidate_by_id(Domain::Order, id)
    }

    pub fn invalidate_all_users(&self) -> usize {
        self.invalidate_all(Domain::User)
    }

    pub fn invalidate_user_by_id(&self, id: &str) -> usize {
        self.invalidate_by_id(Domain::User, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> CacheInvalidator<String> {
        let store = CacheStore::new();
        for key in [
            "product:42",
            "product:7",
            "products:list:page1",
            "products:featured",
            "order:1",
            "orders:recent",
            "user:7",
            "users:all",
            "settings:site",
        ] {
            store.set(key, key.to_string(), Some(300));
        }
        CacheInvalidator::new(store)
    }

    #[test]
    fn test_invalidate_product_by_id() {
        let router = seeded();

        assert_eq!(router.invalidate_product_by_id("42"), 3);

        let store = router.store();
        assert!(store.get("product:42").is_none());
        assert!(store.get("products:list:page1").is_none());
        assert!(store.get("products:featured").is_none());
        assert!(store.get("product:7").is_some());
        assert!(store.get("order:1").is_some());
    }

    #[test]
    fn test_invalidate_all_orders() {
        let router = seeded();

        assert_eq!(router.invalidate_all_orders(), 2);
        assert!(router.store().keys(Some("order")).is_empty());
        assert_eq!(router.store().len(), 7);
    }

    #[test]
    fn test_invalidate_all_users_leaves_other_domains() {
        let router = seeded();

        router.invalidate_all_users();

        assert_eq!(
            router.store().keys(None),
            vec![
                "order:1",
                "orders:recent",
                "product:42",
                "product:7",
                "products:featured",
                "products:list:page1",
                "settings:site",
            ]
        );
    }

    #[test]
    fn test_invalidate_missing_is_noop() {
        let router = CacheInvalidator::<String>::new(CacheStore::new());

        assert_eq!(router.invalidate_user_by_id("404"), 0);
        assert_eq!(router.invalidate_all_products(), 0);
    }

    #[test]
    fn test_invalidate_prefix_and_clear_all() {
        let router = seeded();

        assert_eq!(router.invalidate_prefix("settings:"), 1);
        assert_eq!(router.clear_all(), 8);
        assert!(router.store().is_empty());
    }

    #[test]
    fn test_routers_target_their_own_store() {
        let server = seeded();
        let client = seeded();

        server.invalidate_all_products();

        assert!(server.store().get("product:42").is_none());
        assert!(client.store().get("product:42").is_some());
    }
}
