use crate::woocommerce::{ApiError, WooCommerceApi};
use anyhow::Context;
use catalog_types::category::normalize_name;
use catalog_types::CategoryId;
use derive_more::{Display, Error};
use log_error::LogError;
use std::collections::HashMap;

pub const DEFAULT_PAGE_SIZE: u32 = 100;
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Display, Error)]
pub enum CategoryError {
    #[display("Empty category name")]
    Empty,
    #[display("{_0}")]
    Api(ApiError),
}

impl From<ApiError> for CategoryError {
    fn from(err: ApiError) -> Self {
        CategoryError::Api(err)
    }
}

/// Maps category names to remote ids for one import session.
///
/// Entries are only ever added. The first id seen for a name stays for the
/// lifetime of the resolver.
#[derive(Debug, Default)]
pub struct CategoryResolver {
    cache: HashMap<String, CategoryId>,
}

impl CategoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every remote category, `page_size` per request.
    ///
    /// A failed page is logged and ends the listing with whatever was read so far.
    pub async fn load(api: &dyn WooCommerceApi, page_size: u32) -> Self {
        let mut resolver = Self::new();
        let per_page = page_size.clamp(1, MAX_PAGE_SIZE);
        let mut page = 1;
        loop {
            let batch = api
                .list_categories(page, per_page)
                .await
                .with_context(|| format!("Failed to fetch categories (page {page})"))
                .log_error("Category listing aborted");
            let Some(batch) = batch else {
                break;
            };
            let len = batch.len();
            for category in batch {
                resolver.insert(&category.name, category.id);
            }
            if len < per_page as usize {
                break;
            }
            page += 1;
        }
        log::info!("Loaded {} categories", resolver.len());
        resolver
    }

    fn insert(&mut self, name: &str, id: CategoryId) -> CategoryId {
        *self.cache.entry(normalize_name(name)).or_insert(id)
    }

    pub fn get(&self, raw: &str) -> Option<CategoryId> {
        self.cache.get(&normalize_name(raw)).copied()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Remote id for a raw category value, creating the category when unknown.
    pub async fn resolve(
        &mut self,
        api: &dyn WooCommerceApi,
        raw: &str,
    ) -> Result<CategoryId, CategoryError> {
        let name = normalize_name(raw);
        if name.is_empty() {
            return Err(CategoryError::Empty);
        }
        if let Some(id) = self.cache.get(&name) {
            return Ok(*id);
        }
        match api.create_category(&name).await {
            Ok(created) => {
                log::info!("Created category {name} with id {}", created.id);
                Ok(self.insert(&name, created.id))
            }
            Err(err) => match err.existing_term() {
                Some(id) => {
                    log::info!("Category {name} already exists with id {id}");
                    Ok(self.insert(&name, id))
                }
                None => {
                    log::error!("Failed to create category {name}. Error: {err}");
                    Err(err.into())
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::woocommerce::fake::FakeStore;

    #[tokio::test]
    async fn loads_every_page() {
        let names: Vec<(String, u64)> = (1..=5).map(|i| (format!("Cat {i}"), i)).collect();
        let refs: Vec<(&str, u64)> = names.iter().map(|(n, i)| (n.as_str(), *i)).collect();
        let store = FakeStore::with_categories(&refs);
        let resolver = CategoryResolver::load(&store, 2).await;
        assert_eq!(resolver.len(), 5);
        assert_eq!(resolver.get("Cat 5"), Some(CategoryId(5)));
        assert_eq!(store.lock().listed_pages, vec![(1, 2), (2, 2), (3, 2)]);
    }

    #[tokio::test]
    async fn page_size_is_clamped_to_api_maximum() {
        let store = FakeStore::with_categories(&[("Shoes", 1)]);
        CategoryResolver::load(&store, 500).await;
        assert_eq!(store.lock().listed_pages, vec![(1, 100)]);
    }

    #[tokio::test]
    async fn first_listed_id_wins() {
        let store = FakeStore::with_categories(&[("Outdoor / Jackets", 3), ("Outdoor, Jackets", 9)]);
        let resolver = CategoryResolver::load(&store, 100).await;
        assert_eq!(resolver.len(), 1);
        assert_eq!(resolver.get("Outdoor, Jackets"), Some(CategoryId(3)));
    }

    #[tokio::test]
    async fn listing_failure_leaves_empty_cache() {
        let store = FakeStore::default();
        store.lock().fail_listing = true;
        let resolver = CategoryResolver::load(&store, 100).await;
        assert!(resolver.is_empty());
    }

    #[tokio::test]
    async fn cached_name_needs_no_request() {
        let store = FakeStore::with_categories(&[("Outdoor / Jackets", 3)]);
        let mut resolver = CategoryResolver::load(&store, 100).await;
        let id = resolver.resolve(&store, "Outdoor, Jackets/").await.unwrap();
        assert_eq!(id, CategoryId(3));
        assert_eq!(store.lock().category_creates, 0);
    }

    #[tokio::test]
    async fn creates_unknown_category_once() {
        let store = FakeStore::default();
        let mut resolver = CategoryResolver::new();
        let first = resolver.resolve(&store, "Footwear, Boots").await.unwrap();
        let second = resolver.resolve(&store, "Footwear / Boots").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.lock().category_creates, 1);
        assert_eq!(store.lock().categories[0].name, "Footwear / Boots");
    }

    #[tokio::test]
    async fn recovers_from_term_exists() {
        let store = FakeStore::default();
        store
            .lock()
            .hidden_categories
            .insert("Hats".to_string(), 77);
        let mut resolver = CategoryResolver::new();
        assert_eq!(resolver.resolve(&store, "Hats").await.unwrap(), CategoryId(77));
        assert_eq!(resolver.get("Hats"), Some(CategoryId(77)));
        assert_eq!(resolver.resolve(&store, "Hats").await.unwrap(), CategoryId(77));
        assert_eq!(store.lock().category_creates, 1);
    }

    #[tokio::test]
    async fn failed_creation_is_not_cached() {
        let store = FakeStore::default();
        store.lock().failing_categories.insert("Gloves".to_string());
        let mut resolver = CategoryResolver::new();
        assert!(matches!(
            resolver.resolve(&store, "Gloves").await,
            Err(CategoryError::Api(_))
        ));
        assert_eq!(resolver.get("Gloves"), None);

        store.lock().failing_categories.clear();
        let id = resolver.resolve(&store, "Gloves").await.unwrap();
        assert_eq!(resolver.resolve(&store, "Gloves").await.unwrap(), id);
        assert_eq!(store.lock().category_creates, 2);
    }

    #[tokio::test]
    async fn blank_category_is_rejected() {
        let store = FakeStore::default();
        let mut resolver = CategoryResolver::new();
        assert!(matches!(
            resolver.resolve(&store, " , /").await,
            Err(CategoryError::Empty)
        ));
        assert_eq!(store.lock().category_creates, 0);
    }
}
