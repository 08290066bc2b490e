//! Tier and add-on reference data the wizard prices against.

use {
    porch_config::{AddOn, PricingConfig, Tier},
    tracing::warn,
};

/// Immutable lookup over the configured tiers and add-ons.
///
/// Lookups are exact and return the first entry when a name or id is
/// repeated; `porch config check` reports such duplicates.
#[derive(Debug, Clone)]
pub struct Catalog {
    tiers: Vec<Tier>,
    add_ons: Vec<AddOn>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::from_config(&PricingConfig::default())
    }
}

impl Catalog {
    pub fn new(tiers: Vec<Tier>, add_ons: Vec<AddOn>) -> Self {
        Self { tiers, add_ons }
    }

    /// Build from loaded pricing. Add-ons priced at zero are skipped.
    pub fn from_config(pricing: &PricingConfig) -> Self {
        let add_ons = pricing
            .add_ons
            .iter()
            .filter(|a| {
                let priced = a.price.0 > 0;
                if !priced {
                    warn!(add_on = %a.id, "skipping add-on with a zero price");
                }
                priced
            })
            .cloned()
            .collect();
        Self::new(pricing.tiers.clone(), add_ons)
    }

    pub fn tier(&self, name: &str) -> Option<&Tier> {
        self.tiers.iter().find(|t| t.name == name)
    }

    pub fn add_on(&self, id: &str) -> Option<&AddOn> {
        self.add_ons.iter().find(|a| a.id == id)
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn add_ons(&self) -> &[AddOn] {
        &self.add_ons
    }
}
