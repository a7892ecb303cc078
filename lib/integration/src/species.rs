//! Fish species catalog and identification.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// What the bot knows about a fish family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeciesRecord {
    pub name: String,
    pub common_name: String,
    /// Average length in meters.
    pub length: String,
    /// Average weight in kilograms.
    pub weight: String,
    pub recommended: bool,
    pub edible: bool,
    pub endangered: bool,
}

/// Trait for species lookups by name.
#[async_trait]
pub trait SpeciesLookup: Send + Sync {
    /// Finds the first species whose name contains `name`, ignoring case.
    async fn by_name(&self, name: &str) -> Option<SpeciesRecord>;
}

/// Trait for identifying a fish from a photo.
#[async_trait]
pub trait SpeciesRecognizer: Send + Sync {
    /// Identifies the fish in the image at `image_url`.
    async fn recognize(&self, image_url: &str) -> Option<SpeciesRecord>;
}

/// Hard-coded catalog of fish families.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    records: Vec<SpeciesRecord>,
}

fn family(name: &str, edible: bool) -> SpeciesRecord {
    SpeciesRecord {
        name: name.to_string(),
        common_name: "common fish".to_string(),
        length: "0.5".to_string(),
        weight: "2".to_string(),
        recommended: false,
        edible,
        endangered: !edible,
    }
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self::new(vec![
            family("Carangidae", false),
            family("Chanidae", true),
            family("Cichlids", false),
            family("Rachycentridae", true),
            family("Nemipteridae", false),
            family("Stromateidae", true),
            family("Serranidae", false),
        ])
    }
}

impl StaticCatalog {
    #[must_use]
    pub fn new(records: Vec<SpeciesRecord>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn records(&self) -> &[SpeciesRecord] {
        &self.records
    }

    /// Synchronous form of [`SpeciesLookup::by_name`].
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&SpeciesRecord> {
        let needle = name.to_lowercase();
        self.records
            .iter()
            .find(|r| r.name.to_lowercase().contains(&needle))
    }
}

#[async_trait]
impl SpeciesLookup for StaticCatalog {
    async fn by_name(&self, name: &str) -> Option<SpeciesRecord> {
        self.find(name).cloned()
    }
}

/// Stand-in recognizer that hands out catalog entries in turn.
///
/// There is no image model behind it; every call returns the next family in
/// the catalog, wrapping around.
#[derive(Debug)]
pub struct RotatingRecognizer {
    catalog: Arc<StaticCatalog>,
    next: AtomicUsize,
}

impl RotatingRecognizer {
    #[must_use]
    pub fn new(catalog: Arc<StaticCatalog>) -> Self {
        Self {
            catalog,
            next: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SpeciesRecognizer for RotatingRecognizer {
    async fn recognize(&self, image_url: &str) -> Option<SpeciesRecord> {
        let records = self.catalog.records();
        if records.is_empty() {
            return None;
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % records.len();
        let record = records[index].clone();
        debug!(image_url, species = %record.name, "recognized species");
        Some(record)
    }
}
