//! User categories persisted under [`CATEGORIES_KEY`].
//!
//! Older data stored plain name strings. Those are upgraded to
//! `{name, color}` records the first time the list is read, and the upgraded
//! list is written straight back.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::KeyValueStore;
use crate::error::{CategoryError, StoreError};

pub const CATEGORIES_KEY: &str = "@focus_categories";

/// Colors handed out by position to migrated entries, and to report slices
/// whose category no longer exists.
pub const CATEGORY_PALETTE: [&str; 6] = [
    "#FF6384", "#36A2EB", "#FFCE56", "#4BC0C0", "#9966FF", "#FF9F40",
];

/// Colors offered when creating a category.
pub const PICKER_PALETTE: [&str; 12] = [
    "#FF6384", "#36A2EB", "#FFCE56", "#4BC0C0", "#9966FF", "#FF9F40", "#E91E63", "#00BCD4",
    "#8BC34A", "#FF5722", "#607D8B", "#795548",
];

pub const DEFAULT_PICK_COLOR: &str = "#FF6384";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub color: String,
}

impl Category {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }

    /// The set shown before the user has saved any categories.
    pub fn defaults() -> Vec<Category> {
        vec![
            Category::new("Study", "#FF6384"),
            Category::new("Coding", "#36A2EB"),
            Category::new("Project", "#FFCE56"),
            Category::new("Reading", "#4BC0C0"),
        ]
    }
}

/// One entry of the stored array: either a record or a legacy bare name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredCategory {
    Record(Category),
    Legacy(String),
}

/// Upgrade legacy entries in place. The flag tells whether anything changed.
pub fn migrate_categories(stored: Vec<StoredCategory>) -> (Vec<Category>, bool) {
    let mut migrated = false;
    let categories = stored
        .into_iter()
        .enumerate()
        .map(|(index, entry)| match entry {
            StoredCategory::Record(category) => category,
            StoredCategory::Legacy(name) => {
                migrated = true;
                Category::new(name, CATEGORY_PALETTE[index % CATEGORY_PALETTE.len()])
            }
        })
        .collect();
    (categories, migrated)
}

/// Append a category. The name is trimmed and must be new (exact match).
pub fn add_category<'a>(
    categories: &'a mut Vec<Category>,
    name: &str,
    color: impl Into<String>,
) -> Result<&'a Category, CategoryError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CategoryError::EmptyName);
    }
    if categories.iter().any(|c| c.name == name) {
        return Err(CategoryError::Duplicate(name.to_string()));
    }
    categories.push(Category::new(name, color));
    Ok(&categories[categories.len() - 1])
}

/// Remove a category by name. The list is never allowed to become empty.
pub fn remove_category(
    categories: &mut Vec<Category>,
    name: &str,
) -> Result<Category, CategoryError> {
    if categories.len() <= 1 {
        return Err(CategoryError::LastCategory(name.to_string()));
    }
    let index = categories
        .iter()
        .position(|c| c.name == name)
        .ok_or_else(|| CategoryError::NotFound(name.to_string()))?;
    Ok(categories.remove(index))
}

#[derive(Clone)]
pub struct CategoryRepository {
    store: Arc<dyn KeyValueStore>,
}

impl CategoryRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Stored categories, or the defaults if none were ever saved or the read failed.
    pub async fn list(&self) -> Vec<Category> {
        match self.try_list().await {
            Ok(categories) => categories,
            Err(e) => {
                error!(error = %e, "failed to fetch categories");
                Category::defaults()
            }
        }
    }

    /// Overwrite the stored list.
    pub async fn save(&self, categories: &[Category]) {
        if let Err(e) = self.try_save(categories).await {
            error!(error = %e, "failed to save categories");
        }
    }

    /// Load, add, and save. Returns the new list.
    pub async fn add(&self, name: &str, color: &str) -> Result<Vec<Category>, CategoryError> {
        let mut categories = self.list().await;
        add_category(&mut categories, name, color)?;
        self.save(&categories).await;
        Ok(categories)
    }

    /// Load, remove, and save. Returns the new list.
    pub async fn remove(&self, name: &str) -> Result<Vec<Category>, CategoryError> {
        let mut categories = self.list().await;
        remove_category(&mut categories, name)?;
        self.save(&categories).await;
        Ok(categories)
    }

    async fn try_list(&self) -> Result<Vec<Category>, StoreError> {
        let Some(json) = self.store.get(CATEGORIES_KEY).await? else {
            return Ok(Category::defaults());
        };
        let stored: Vec<StoredCategory> =
            serde_json::from_str(&json).map_err(|source| StoreError::Malformed {
                key: CATEGORIES_KEY.into(),
                source,
            })?;
        let (categories, migrated) = migrate_categories(stored);
        if migrated {
            warn!(count = categories.len(), "migrating legacy category names");
            self.save(&categories).await;
        }
        Ok(categories)
    }

    async fn try_save(&self, categories: &[Category]) -> Result<(), StoreError> {
        let json = serde_json::to_string(categories).map_err(|source| StoreError::Encode {
            key: CATEGORIES_KEY.into(),
            source,
        })?;
        self.store.set(CATEGORIES_KEY, json).await?;
        debug!(count = categories.len(), "categories saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, UnavailableStore};

    #[test]
    fn migrates_plain_names_by_position() {
        let stored = vec![
            StoredCategory::Legacy("A".into()),
            StoredCategory::Legacy("B".into()),
        ];
        let (categories, migrated) = migrate_categories(stored);
        assert!(migrated);
        assert_eq!(
            categories,
            vec![
                Category::new("A", CATEGORY_PALETTE[0]),
                Category::new("B", CATEGORY_PALETTE[1]),
            ]
        );
    }

    #[test]
    fn migrating_records_is_identity() {
        let records = Category::defaults();
        let stored = records
            .iter()
            .cloned()
            .map(StoredCategory::Record)
            .collect();
        let (categories, migrated) = migrate_categories(stored);
        assert!(!migrated);
        assert_eq!(categories, records);
    }

    #[test]
    fn palette_wraps_and_mixed_lists_keep_positions() {
        let mut stored: Vec<StoredCategory> = (0..7)
            .map(|i| StoredCategory::Legacy(format!("c{i}")))
            .collect();
        stored[1] = StoredCategory::Record(Category::new("kept", "#000000"));
        let (categories, _) = migrate_categories(stored);
        assert_eq!(categories[1].color, "#000000");
        assert_eq!(categories[2].color, CATEGORY_PALETTE[2]);
        assert_eq!(categories[6].color, CATEGORY_PALETTE[0]);
    }

    #[test]
    fn add_trims_and_rejects_empty_or_duplicate() {
        let mut categories = Category::defaults();
        let added = add_category(&mut categories, "  Gym ", "#00BCD4").unwrap();
        assert_eq!(added.name, "Gym");
        assert_eq!(
            add_category(&mut categories, "   ", "#00BCD4"),
            Err(CategoryError::EmptyName)
        );
        assert_eq!(
            add_category(&mut categories, "Gym", "#00BCD4"),
            Err(CategoryError::Duplicate("Gym".into()))
        );
        // Equality is case-sensitive.
        assert!(add_category(&mut categories, "gym", "#00BCD4").is_ok());
    }

    #[test]
    fn last_category_cannot_be_removed() {
        let mut categories = vec![Category::new("Only", "#FF6384")];
        assert_eq!(
            remove_category(&mut categories, "Only"),
            Err(CategoryError::LastCategory("Only".into()))
        );
        assert_eq!(categories.len(), 1);
    }

    #[test]
    fn remove_unknown_name_is_reported() {
        let mut categories = Category::defaults();
        assert_eq!(
            remove_category(&mut categories, "Nope"),
            Err(CategoryError::NotFound("Nope".into()))
        );
        assert_eq!(categories.len(), 4);
    }

    #[tokio::test]
    async fn list_returns_defaults_when_empty() {
        let repo = CategoryRepository::new(Arc::new(MemoryStore::new()));
        assert_eq!(repo.list().await, Category::defaults());
    }

    #[tokio::test]
    async fn legacy_blob_is_rewritten_on_read() {
        let store = Arc::new(MemoryStore::with_entries([(CATEGORIES_KEY, r#"["A","B"]"#)]));
        let repo = CategoryRepository::new(store.clone());

        let categories = repo.list().await;
        assert_eq!(categories[1], Category::new("B", CATEGORY_PALETTE[1]));

        let raw = store.get(CATEGORIES_KEY).await.unwrap().unwrap();
        let persisted: Vec<Category> = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted, categories);
    }

    #[tokio::test]
    async fn malformed_blob_falls_back_to_defaults() {
        let store = Arc::new(MemoryStore::with_entries([(CATEGORIES_KEY, "42")]));
        let repo = CategoryRepository::new(store);
        assert_eq!(repo.list().await, Category::defaults());
    }

    #[tokio::test]
    async fn add_and_remove_persist() {
        let repo = CategoryRepository::new(Arc::new(MemoryStore::new()));
        let after_add = repo.add("Gym", "#8BC34A").await.unwrap();
        assert_eq!(after_add.len(), 5);
        assert_eq!(repo.list().await, after_add);

        let after_remove = repo.remove("Study").await.unwrap();
        assert_eq!(after_remove.len(), 4);
        assert!(repo.list().await.iter().all(|c| c.name != "Study"));
    }

    #[tokio::test]
    async fn unavailable_store_reads_as_defaults() {
        let repo = CategoryRepository::new(Arc::new(UnavailableStore));
        assert_eq!(repo.list().await, Category::defaults());
        // Write failures are logged; the edit still applies to the returned list.
        let after_add = repo.add("Gym", "#8BC34A").await.unwrap();
        assert_eq!(after_add.len(), 5);
        repo.save(&after_add).await;
    }
}
