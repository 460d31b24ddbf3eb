use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::errors::EngineError;
use crate::models::Minutes;

/// Service and add-on durations. Authoritative: the engine does not second-guess
/// which add-ons go with which service.
pub trait Catalog: Send + Sync {
    fn service_minutes(&self, service_id: &str) -> Result<Minutes, EngineError>;
    fn addon_minutes(&self, addon_id: &str) -> Result<Minutes, EngineError>;
}

/// Service duration plus every add-on's duration.
pub fn booking_minutes(
    catalog: &dyn Catalog,
    service_id: &str,
    addon_ids: &[String],
) -> Result<Minutes, EngineError> {
    let mut total = catalog.service_minutes(service_id)?;
    for addon in addon_ids {
        total += catalog.addon_minutes(addon)?;
    }
    if total <= 0 {
        return Err(EngineError::InvalidDuration(format!(
            "service {service_id} totals {total} minutes"
        )));
    }
    Ok(total)
}

#[derive(Debug, Default, Deserialize)]
pub struct StaticCatalog {
    #[serde(default)]
    pub services: HashMap<String, Minutes>,
    #[serde(default)]
    pub addons: HashMap<String, Minutes>,
}

impl StaticCatalog {
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let catalog: StaticCatalog = serde_json::from_str(s)?;
        if let Some((id, _)) = catalog
            .services
            .iter()
            .chain(catalog.addons.iter())
            .find(|(_, m)| **m < 0)
        {
            anyhow::bail!("negative duration for {id}");
        }
        Ok(catalog)
    }

    /// Load from disk; a missing file yields an empty catalog.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "catalog file not found, starting empty");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog: {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid catalog: {}", path.display()))
    }

    pub fn with_service(mut self, id: &str, minutes: Minutes) -> Self {
        self.services.insert(id.to_string(), minutes);
        self
    }

    pub fn with_addon(mut self, id: &str, minutes: Minutes) -> Self {
        self.addons.insert(id.to_string(), minutes);
        self
    }
}

impl Catalog for StaticCatalog {
    fn service_minutes(&self, service_id: &str) -> Result<Minutes, EngineError> {
        self.services
            .get(service_id)
            .copied()
            .ok_or_else(|| EngineError::UnknownService(service_id.to_string()))
    }

    fn addon_minutes(&self, addon_id: &str) -> Result<Minutes, EngineError> {
        self.addons
            .get(addon_id)
            .copied()
            .ok_or_else(|| EngineError::UnknownAddon(addon_id.to_string()))
    }
}
