// src/catalog.rs

use crate::error::{Result, StatsError};
use std::collections::HashMap;

/// The zero-weight placeholder tag. Rows tagged with it are recorded but earn nothing.
pub const PLACEHOLDER_TAG: &str = "ignore";

const DEFAULT_WEIGHTS: &[(&str, u32)] = &[
    ("cpprefjp/typo", 1),
    ("cpprefjp/link", 2),
    ("cpprefjp/addref", 20),
    ("cpprefjp/addlang", 20),
    ("cpprefjp/addpage", 20),
    ("cpprefjp/fixs", 2),
    ("cpprefjp/fixm", 5),
    ("cpprefjp/fixl", 10),
    ("cpprefjp/compiler", 2),
    ("boostjp/typo", 1),
    ("boostjp/link", 2),
    ("boostjp/releases", 5),
    ("boostjp/releasem", 10),
    ("boostjp/releasel", 20),
    ("boostjp/fixs", 2),
    ("boostjp/fixm", 5),
    ("boostjp/addrefs", 10),
    ("boostjp/addrefm", 20),
    ("tool/fixbug", 30),
    ("tool/improves", 10),
    ("tool/improvem", 30),
    ("tool/improvel", 50),
    ("tool/updatelib", 20),
    ("tool/security", 50),
    ("tool/updatelang", 50),
    ("tool/adds", 30),
    ("tool/addm", 50),
    ("tool/addl", 100),
];

/// Maps contribution tags to their point weight. Immutable once built.
#[derive(Debug, Clone)]
pub struct PointCatalog {
    weights: HashMap<String, u32>,
}

impl PointCatalog {
    pub fn builder() -> PointCatalogBuilder {
        PointCatalogBuilder::default()
    }

    /// The cpprefjp/boostjp vocabulary.
    pub fn standard() -> Result<Self> {
        let builder = DEFAULT_WEIGHTS
            .iter()
            .try_fold(Self::builder(), |builder, &(tag, weight)| builder.tag(tag, weight))?;
        Ok(builder.build())
    }

    pub fn weight(&self, tag: &str) -> Option<u32> {
        self.weights.get(tag).copied()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }
}

#[derive(Debug, Default)]
pub struct PointCatalogBuilder {
    weights: HashMap<String, u32>,
}

impl PointCatalogBuilder {
    pub fn tag(mut self, tag: &str, weight: u32) -> Result<Self> {
        if tag == PLACEHOLDER_TAG || self.weights.contains_key(tag) {
            return Err(StatsError::DuplicatePointTag(tag.to_string()));
        }
        self.weights.insert(tag.to_string(), weight);
        Ok(self)
    }

    /// Finishes the catalog. The placeholder tag is always present with weight 0.
    pub fn build(mut self) -> PointCatalog {
        self.weights.insert(PLACEHOLDER_TAG.to_string(), 0);
        PointCatalog { weights: self.weights }
    }
}
