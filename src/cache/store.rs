use std::borrow::Cow;
use std::collections::HashMap;

use serde_json::{Value, json};

/// A backend "row": arbitrary JSON plus a version folded into its ETag.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRecord {
    pub data: Value,
    pub version: u64,
}

impl ResourceRecord {
    pub fn new(data: Value, version: u64) -> Self {
        Self { data, version }
    }

    /// One-off record served for `/api/*` paths that have no seed entry.
    pub fn synthetic(path: &str) -> Self {
        Self::new(
            json!({
                "message": format!("Data for {path}"),
                "path": path,
            }),
            1,
        )
    }
}

/// Read-only map from request path to [`ResourceRecord`].
///
/// Built once at startup and shared across connections without locking.
///
/// # Examples
///
/// ```
/// use mock_upstream::cache::ResourceStore;
///
/// let store = ResourceStore::seeded();
/// assert!(store.get("/api/users").is_some());
///
/// // Unknown paths still resolve, to a synthetic version-1 record.
/// let record = store.resolve("/api/orders");
/// assert_eq!(record.version, 1);
/// assert_eq!(record.data["path"], "/api/orders");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResourceStore {
    records: HashMap<String, ResourceRecord>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The fixed dataset the mock backend starts with.
    pub fn seeded() -> Self {
        Self::new()
            .with(
                "/api/users",
                ResourceRecord::new(
                    json!({
                        "users": [
                            { "id": 1, "name": "Alice", "email": "alice@example.com" },
                            { "id": 2, "name": "Bob", "email": "bob@example.com" },
                            { "id": 3, "name": "Charlie", "email": "charlie@example.com" }
                        ]
                    }),
                    1,
                ),
            )
            .with(
                "/api/products",
                ResourceRecord::new(
                    json!({
                        "products": [
                            { "id": 1, "name": "Laptop", "price": 999.99 },
                            { "id": 2, "name": "Mouse", "price": 29.99 },
                            { "id": 3, "name": "Keyboard", "price": 79.99 }
                        ]
                    }),
                    1,
                ),
            )
    }

    /// Adds or replaces the record stored under `path`.
    #[must_use]
    pub fn with(mut self, path: impl Into<String>, record: ResourceRecord) -> Self {
        self.records.insert(path.into(), record);
        self
    }

    pub fn get(&self, path: &str) -> Option<&ResourceRecord> {
        self.records.get(path)
    }

    /// Returns the stored record, or a synthetic one when `path` is unseeded.
    pub fn resolve(&self, path: &str) -> Cow<'_, ResourceRecord> {
        match self.records.get(path) {
            Some(record) => Cow::Borrowed(record),
            None => Cow::Owned(ResourceRecord::synthetic(path)),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
