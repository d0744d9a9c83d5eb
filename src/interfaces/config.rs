use crate::domain::payment::PaymentConfig;
use crate::domain::pricing::{RateMaps, RateTable};
use crate::error::{PrintShopError, Result};
use rust_decimal::Decimal;
use serde::de::value::{Error as ValueError, StrDeserializer};
use serde::de::{DeserializeOwned, IntoDeserializer};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::path::Path;
use std::time::Duration;

/// Shop configuration, usually read from `shop.toml`.
///
/// Every section is optional. Pricing entries override the default rate
/// table one option at a time.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShopConfig {
    pub payment: PaymentConfig,
    pub pricing: PricingSection,
    pub analysis: Option<AnalysisSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PricingSection {
    pub color: BTreeMap<String, Decimal>,
    pub paper: BTreeMap<String, Decimal>,
    pub binding: BTreeMap<String, Decimal>,
    pub size_multiplier: BTreeMap<String, Decimal>,
    pub delivery_fee: Option<Decimal>,
    pub express_fraction: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisSection {
    pub endpoint: String,
    #[serde(default = "default_analysis_timeout")]
    pub timeout_seconds: u64,
}

fn default_analysis_timeout() -> u64 {
    20
}

impl AnalysisSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl ShopConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Builds the validated rate table.
    pub fn rate_table(&self) -> Result<RateTable> {
        let pricing = &self.pricing;
        let mut maps: RateMaps = RateTable::default().to_maps();
        apply_overrides("color", &pricing.color, &mut maps.color)?;
        apply_overrides("paper", &pricing.paper, &mut maps.paper)?;
        apply_overrides("binding", &pricing.binding, &mut maps.binding)?;
        apply_overrides("size_multiplier", &pricing.size_multiplier, &mut maps.size_multiplier)?;
        if let Some(fee) = pricing.delivery_fee {
            maps.delivery_fee = fee;
        }
        if let Some(fraction) = pricing.express_fraction {
            maps.express_fraction = fraction;
        }
        RateTable::from_maps(&maps)
    }
}

fn apply_overrides<K>(
    section: &str,
    overrides: &BTreeMap<String, Decimal>,
    rates: &mut HashMap<K, Decimal>,
) -> Result<()>
where
    K: DeserializeOwned + Eq + Hash,
{
    for (name, rate) in overrides {
        let deserializer: StrDeserializer<'_, ValueError> = name.as_str().into_deserializer();
        let key = K::deserialize(deserializer).map_err(|_| {
            PrintShopError::Config(format!("Unknown option '{name}' in [pricing.{section}]"))
        })?;
        rates.insert(key, *rate);
    }
    Ok(())
}
