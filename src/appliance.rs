//! Appliance metadata lookup.

use std::collections::HashMap;
use std::fmt::Debug;

use async_trait::async_trait;
use serde::Serialize;

use crate::schedule::BehaviorClass;

/// Power draw and behavior class of an appliance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ApplianceProfile {
    pub power_kw: f64,
    pub behavior: BehaviorClass,
}

impl Default for ApplianceProfile {
    /// 1 kW, attended.
    fn default() -> Self {
        Self {
            power_kw: 1.0,
            behavior: BehaviorClass::Attended,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApplianceError {
    #[error("no metadata for appliance \"{0}\"")]
    Unknown(String),
    #[error("appliance lookup failed: {0}")]
    Backend(String),
}

/// Source of appliance metadata by task name.
#[async_trait]
pub trait ApplianceCatalog: Send + Sync + Debug {
    async fn lookup(&self, name: &str) -> Result<ApplianceProfile, ApplianceError>;
}

/// In-memory catalog keyed by lower-cased appliance name.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    entries: HashMap<String, ApplianceProfile>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, profile: ApplianceProfile) {
        self.entries.insert(normalize(name), profile);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, ApplianceProfile)> for StaticCatalog {
    fn from_iter<I: IntoIterator<Item = (&'a str, ApplianceProfile)>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for (name, profile) in iter {
            catalog.insert(name, profile);
        }
        catalog
    }
}

#[async_trait]
impl ApplianceCatalog for StaticCatalog {
    async fn lookup(&self, name: &str) -> Result<ApplianceProfile, ApplianceError> {
        self.entries
            .get(&normalize(name))
            .copied()
            .ok_or_else(|| ApplianceError::Unknown(name.to_string()))
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}
