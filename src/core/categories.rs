use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;

use crate::models::ServiceCategory;

const BUILTIN_RELATED_CATEGORIES: &str = include_str!("../../config/related_categories.toml");

#[derive(Debug, Error)]
pub enum CategoryMapError {
    #[error("Failed to read category map: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse category map: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Unknown category in map: {0}")]
    UnknownCategory(String),
}

#[derive(Debug, Deserialize)]
struct CategoryMapFile {
    #[serde(default)]
    related: HashMap<String, Vec<String>>,
}

/// Static adjacency map: category -> categories that earn partial credit for it
///
/// Loaded once at startup and shared read-only by the scoring engine.
#[derive(Debug, Clone, Default)]
pub struct RelatedCategories {
    related: HashMap<ServiceCategory, HashSet<ServiceCategory>>,
}

impl RelatedCategories {
    /// The map bundled with the crate
    pub fn builtin() -> Result<Self, CategoryMapError> {
        Self::from_toml(BUILTIN_RELATED_CATEGORIES)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CategoryMapError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, CategoryMapError> {
        let file: CategoryMapFile = toml::from_str(content)?;
        let parse = |s: &str| {
            s.parse::<ServiceCategory>()
                .map_err(|_| CategoryMapError::UnknownCategory(s.to_string()))
        };

        let mut related = HashMap::with_capacity(file.related.len());
        for (key, values) in &file.related {
            let category = parse(key)?;
            let set = values
                .iter()
                .map(|v| parse(v))
                .collect::<Result<HashSet<_>, _>>()?;
            related.insert(category, set);
        }

        Ok(Self { related })
    }

    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (ServiceCategory, ServiceCategory)>,
    {
        let mut related: HashMap<ServiceCategory, HashSet<ServiceCategory>> = HashMap::new();
        for (from, to) in pairs {
            related.entry(from).or_default().insert(to);
        }
        Self { related }
    }

    /// Is `candidate` listed as related to `lead_category`
    pub fn is_related(&self, lead_category: ServiceCategory, candidate: ServiceCategory) -> bool {
        self.related
            .get(&lead_category)
            .is_some_and(|set| set.contains(&candidate))
    }

    /// Related categories for a lead category, in a stable order
    pub fn related_to(&self, lead_category: ServiceCategory) -> Vec<ServiceCategory> {
        let mut out: Vec<ServiceCategory> = self
            .related
            .get(&lead_category)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        out.sort();
        out
    }
}
