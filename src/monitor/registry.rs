//! Product category registry
//!
//! Loaded once at startup from a JSON file (or seeded programmatically) and
//! read concurrently afterwards. Categories are immutable during normal
//! operation; `create` is the only administrative mutation.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::MonitorError;
use super::types::CategoryId;

/// A trackable product category and its alerting thresholds.
///
/// Invariant: `critical_threshold < low_stock_threshold`.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub low_stock_threshold: u32,
    pub critical_threshold: u32,
    pub created_at: DateTime<Utc>,
}

/// One entry of the category definition file.
///
/// Missing thresholds fall back to the registry defaults; a missing id is
/// assigned sequentially.
#[derive(Debug, Clone, Deserialize)]
pub struct CategorySpec {
    #[serde(default)]
    pub id: Option<CategoryId>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub low_stock_threshold: Option<u32>,
    #[serde(default)]
    pub critical_threshold: Option<u32>,
}

/// Registry of trackable categories, keyed by id.
pub struct CategoryRegistry {
    categories: RwLock<BTreeMap<CategoryId, Category>>,
    next_id: AtomicI64,
    default_low: u32,
    default_critical: u32,
}

impl CategoryRegistry {
    /// Empty registry with the given default thresholds for categories
    /// that do not specify their own.
    pub fn new(default_low: u32, default_critical: u32) -> Self {
        Self {
            categories: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            default_low,
            default_critical,
        }
    }

    /// Load category definitions from a JSON file.
    pub fn load_file(
        path: impl AsRef<Path>,
        default_low: u32,
        default_critical: u32,
    ) -> Result<Self, MonitorError> {
        let raw = fs::read_to_string(path.as_ref())
            .map_err(|e| MonitorError::Unavailable(format!("category file: {}", e)))?;
        let specs: Vec<CategorySpec> = serde_json::from_str(&raw)
            .map_err(|e| MonitorError::InvalidCategory(format!("category file: {}", e)))?;
        Self::from_specs(specs, default_low, default_critical)
    }

    /// Build a registry from parsed category specs.
    pub fn from_specs(
        specs: Vec<CategorySpec>,
        default_low: u32,
        default_critical: u32,
    ) -> Result<Self, MonitorError> {
        let registry = Self::new(default_low, default_critical);
        for spec in specs {
            registry.insert_spec(spec)?;
        }
        Ok(registry)
    }

    fn insert_spec(&self, spec: CategorySpec) -> Result<Category, MonitorError> {
        let low = spec.low_stock_threshold.unwrap_or(self.default_low);
        let critical = spec.critical_threshold.unwrap_or(self.default_critical);
        if critical >= low {
            return Err(MonitorError::InvalidCategory(format!(
                "{}: critical_threshold {} must be below low_stock_threshold {}",
                spec.name, critical, low
            )));
        }

        let mut categories = self.categories.write().unwrap();
        if categories.values().any(|c| c.name == spec.name) {
            return Err(MonitorError::InvalidCategory(format!(
                "duplicate category name: {}",
                spec.name
            )));
        }

        let id = match spec.id {
            Some(id) => {
                if categories.contains_key(&id) {
                    return Err(MonitorError::InvalidCategory(format!(
                        "duplicate category id: {}",
                        id
                    )));
                }
                // Keep the sequence ahead of explicit ids
                self.next_id.fetch_max(id + 1, Ordering::SeqCst);
                id
            }
            None => self.next_id.fetch_add(1, Ordering::SeqCst),
        };

        let category = Category {
            id,
            name: spec.name,
            description: spec.description,
            low_stock_threshold: low,
            critical_threshold: critical,
            created_at: Utc::now(),
        };
        categories.insert(id, category.clone());
        Ok(category)
    }

    /// Administrative create. Thresholds default like file entries.
    pub fn create(
        &self,
        name: &str,
        description: Option<&str>,
        low_stock_threshold: Option<u32>,
    ) -> Result<Category, MonitorError> {
        self.insert_spec(CategorySpec {
            id: None,
            name: name.to_string(),
            description: description.map(|s| s.to_string()),
            low_stock_threshold,
            critical_threshold: None,
        })
    }

    pub fn get(&self, id: CategoryId) -> Option<Category> {
        self.categories.read().unwrap().get(&id).cloned()
    }

    /// All categories ordered by id
    pub fn list(&self) -> Vec<Category> {
        self.categories.read().unwrap().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.categories.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.read().unwrap().is_empty()
    }
}
