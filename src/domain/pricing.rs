use crate::domain::settings::{
    BindingType, ColorMode, DeliveryMode, PaperSize, PaperType, PrintSettings,
};
use crate::error::{PrintShopError, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Unvalidated rate configuration, keyed by option.
///
/// This is the shape rate tables arrive in from configuration files. Turn it
/// into a [`RateTable`] with [`RateTable::from_maps`], which checks that every
/// option has a rate.
#[derive(Debug, Clone, Default)]
pub struct RateMaps {
    pub color: HashMap<ColorMode, Decimal>,
    pub paper: HashMap<PaperType, Decimal>,
    pub binding: HashMap<BindingType, Decimal>,
    pub size_multiplier: HashMap<PaperSize, Decimal>,
    pub delivery_fee: Decimal,
    pub express_fraction: Decimal,
}

/// The shop's price list.
///
/// Every option of every setting has exactly one entry; lookups are indexed by
/// the enum discriminant and cannot miss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateTable {
    color: [Decimal; ColorMode::ALL.len()],
    paper: [Decimal; PaperType::ALL.len()],
    binding: [Decimal; BindingType::ALL.len()],
    size_multiplier: [Decimal; PaperSize::ALL.len()],
    delivery_fee: Decimal,
    express_fraction: Decimal,
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            color: [dec!(3.00), dec!(12.00)],
            paper: [dec!(0), dec!(2), dec!(6), dec!(10)],
            binding: [dec!(0), dec!(5), dec!(45), dec!(80)],
            size_multiplier: [dec!(1.0), dec!(1.2), dec!(2.0)],
            delivery_fee: dec!(40.00),
            express_fraction: dec!(0.20),
        }
    }
}

impl RateTable {
    /// Validates a set of rate maps.
    ///
    /// Fails if any option is missing a rate, if any rate or fee is negative,
    /// or if a size multiplier is not positive.
    pub fn from_maps(maps: &RateMaps) -> Result<Self> {
        let table = Self {
            color: exhaustive("color", ColorMode::ALL, &maps.color)?,
            paper: exhaustive("paper", PaperType::ALL, &maps.paper)?,
            binding: exhaustive("binding", BindingType::ALL, &maps.binding)?,
            size_multiplier: exhaustive("size multiplier", PaperSize::ALL, &maps.size_multiplier)?,
            delivery_fee: maps.delivery_fee,
            express_fraction: maps.express_fraction,
        };
        table.validate()?;
        Ok(table)
    }

    /// Expands the table back into maps, e.g. to override a single rate.
    pub fn to_maps(&self) -> RateMaps {
        RateMaps {
            color: ColorMode::ALL.into_iter().zip(self.color).collect(),
            paper: PaperType::ALL.into_iter().zip(self.paper).collect(),
            binding: BindingType::ALL.into_iter().zip(self.binding).collect(),
            size_multiplier: PaperSize::ALL
                .into_iter()
                .zip(self.size_multiplier)
                .collect(),
            delivery_fee: self.delivery_fee,
            express_fraction: self.express_fraction,
        }
    }

    fn validate(&self) -> Result<()> {
        let negative = self
            .color
            .iter()
            .chain(&self.paper)
            .chain(&self.binding)
            .chain([&self.delivery_fee, &self.express_fraction])
            .any(|rate| *rate < Decimal::ZERO);
        if negative {
            return Err(PrintShopError::Config(
                "Rates and fees must not be negative".to_string(),
            ));
        }
        if self.size_multiplier.iter().any(|m| *m <= Decimal::ZERO) {
            return Err(PrintShopError::Config(
                "Size multipliers must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn color_rate(&self, mode: ColorMode) -> Decimal {
        self.color[mode as usize]
    }

    pub fn paper_rate(&self, paper: PaperType) -> Decimal {
        self.paper[paper as usize]
    }

    pub fn binding_rate(&self, binding: BindingType) -> Decimal {
        self.binding[binding as usize]
    }

    pub fn size_multiplier(&self, size: PaperSize) -> Decimal {
        self.size_multiplier[size as usize]
    }

    pub fn delivery_fee(&self) -> Decimal {
        self.delivery_fee
    }

    pub fn express_fraction(&self) -> Decimal {
        self.express_fraction
    }
}

fn exhaustive<K, const N: usize>(
    what: &str,
    all: [K; N],
    rates: &HashMap<K, Decimal>,
) -> Result<[Decimal; N]>
where
    K: Copy + Eq + Hash + Debug,
{
    let mut out = [Decimal::ZERO; N];
    for (slot, key) in out.iter_mut().zip(all) {
        *slot = *rates.get(&key).ok_or_else(|| {
            PrintShopError::Config(format!("Missing {what} rate for {key:?}"))
        })?;
    }
    Ok(out)
}

/// Itemised cost of a set of print settings.
///
/// Component amounts are rounded to 2 decimal places for display; `total` is
/// computed from the unrounded components and rounded once at the end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub per_page_rate: Decimal,
    /// Printing cost across all copies, binding excluded.
    pub document_subtotal: Decimal,
    pub binding_subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub express_surcharge: Decimal,
    pub total: Decimal,
}

/// Computes order totals from a [`RateTable`].
#[derive(Debug, Clone, Default)]
pub struct PricingEngine {
    rates: RateTable,
}

impl PricingEngine {
    pub fn new(rates: RateTable) -> Self {
        Self { rates }
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    pub fn compute_total(&self, settings: &PrintSettings) -> Decimal {
        self.breakdown(settings).total
    }

    /// Prices the settings.
    ///
    /// The steps run in a fixed order: per-page rate, per-copy document cost,
    /// copies plus per-copy binding, flat delivery fee, then the express
    /// surcharge on the whole running subtotal. Amounts that would overflow
    /// saturate at `Decimal::MAX`; every rate is non-negative, so that is the
    /// nearest representable value.
    pub fn breakdown(&self, settings: &PrintSettings) -> PriceBreakdown {
        let rates = &self.rates;
        let copies = Decimal::from(settings.copies);
        let pages = Decimal::from(settings.pages_per_copy);

        let per_page = mul(
            add(
                rates.color_rate(settings.color_mode),
                rates.paper_rate(settings.paper_type),
            ),
            rates.size_multiplier(settings.paper_size),
        );
        let document = mul(per_page, pages);
        let document_subtotal = mul(document, copies);
        let binding_subtotal = mul(rates.binding_rate(settings.binding), copies);

        let mut subtotal = add(document_subtotal, binding_subtotal);

        let delivery_fee = match settings.delivery_mode {
            DeliveryMode::Delivery => rates.delivery_fee,
            DeliveryMode::Pickup => Decimal::ZERO,
        };
        subtotal = add(subtotal, delivery_fee);

        let mut express_surcharge = Decimal::ZERO;
        if settings.is_express {
            let before = subtotal;
            subtotal = mul(subtotal, add(Decimal::ONE, rates.express_fraction));
            express_surcharge = subtotal - before;
        }

        PriceBreakdown {
            per_page_rate: round_money(per_page),
            document_subtotal: round_money(document_subtotal),
            binding_subtotal: round_money(binding_subtotal),
            delivery_fee: round_money(delivery_fee),
            express_surcharge: round_money(express_surcharge),
            total: round_money(subtotal),
        }
    }
}

fn add(a: Decimal, b: Decimal) -> Decimal {
    a.checked_add(b).unwrap_or(Decimal::MAX)
}

fn mul(a: Decimal, b: Decimal) -> Decimal {
    a.checked_mul(b).unwrap_or(Decimal::MAX)
}

/// Rounds to 2 decimal places, half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> PrintSettings {
        PrintSettings::default()
    }

    fn total(settings: &PrintSettings) -> Decimal {
        PricingEngine::default().compute_total(settings)
    }

    #[test]
    fn test_single_bw_page() {
        assert_eq!(total(&base()), dec!(3.00));
    }

    #[test]
    fn test_express_applies_to_whole_subtotal() {
        let express = PrintSettings {
            is_express: true,
            ..base()
        };
        assert_eq!(total(&express), dec!(3.60));

        let express_delivery = PrintSettings {
            is_express: true,
            delivery_mode: DeliveryMode::Delivery,
            ..base()
        };
        assert_eq!(total(&express_delivery), dec!(51.60));
    }

    #[test]
    fn test_delivery_fee_is_flat() {
        let settings = PrintSettings {
            copies: 5,
            delivery_mode: DeliveryMode::Delivery,
            ..base()
        };
        assert_eq!(total(&settings), dec!(55.00));
    }

    #[test]
    fn test_scenario_color_premium_spiral() {
        let settings = PrintSettings {
            copies: 2,
            pages_per_copy: 10,
            color_mode: ColorMode::Color,
            paper_type: PaperType::Premium,
            binding: BindingType::Spiral,
            ..base()
        };
        let breakdown = PricingEngine::default().breakdown(&settings);
        assert_eq!(breakdown.per_page_rate, dec!(14));
        assert_eq!(breakdown.document_subtotal, dec!(280));
        assert_eq!(breakdown.binding_subtotal, dec!(90));
        assert_eq!(breakdown.total, dec!(370.00));
    }

    #[test]
    fn test_scenario_a3_doubles_page_rate() {
        let settings = PrintSettings {
            copies: 2,
            pages_per_copy: 10,
            color_mode: ColorMode::Color,
            paper_type: PaperType::Premium,
            binding: BindingType::Spiral,
            paper_size: PaperSize::A3,
            ..base()
        };
        assert_eq!(total(&settings), dec!(650.00));
    }

    #[test]
    fn test_legal_multiplier_and_rounding() {
        // (3 + 2) * 1.2 = 6.00 per page, 7 pages, 3 copies, express
        let settings = PrintSettings {
            copies: 3,
            pages_per_copy: 7,
            paper_type: PaperType::Premium,
            paper_size: PaperSize::Legal,
            is_express: true,
            ..base()
        };
        let breakdown = PricingEngine::default().breakdown(&settings);
        assert_eq!(breakdown.per_page_rate, dec!(6.00));
        assert_eq!(breakdown.express_surcharge, dec!(25.20));
        assert_eq!(breakdown.total, dec!(151.20));
    }

    #[test]
    fn test_rounds_half_up() {
        let mut maps = RateTable::default().to_maps();
        maps.color.insert(ColorMode::BlackAndWhite, dec!(0.005));
        let engine = PricingEngine::new(RateTable::from_maps(&maps).unwrap());
        assert_eq!(engine.compute_total(&base()), dec!(0.01));
    }

    #[test]
    fn test_compute_is_deterministic() {
        let engine = PricingEngine::default();
        let settings = PrintSettings {
            copies: 13,
            pages_per_copy: 37,
            color_mode: ColorMode::Color,
            paper_type: PaperType::Glossy,
            binding: BindingType::Thermal,
            paper_size: PaperSize::Legal,
            delivery_mode: DeliveryMode::Delivery,
            is_express: true,
            ..base()
        };
        let first = engine.compute_total(&settings);
        for _ in 0..100 {
            assert_eq!(engine.compute_total(&settings).to_string(), first.to_string());
        }
    }

    #[test]
    fn test_monotonic_in_every_option() {
        let engine = PricingEngine::default();
        let start = base();
        let start_total = engine.compute_total(&start);

        let variants: Vec<PrintSettings> = vec![
            PrintSettings { copies: 2, ..base() },
            PrintSettings { pages_per_copy: 2, ..base() },
            PrintSettings { color_mode: ColorMode::Color, ..base() },
            PrintSettings { delivery_mode: DeliveryMode::Delivery, ..base() },
            PrintSettings { is_express: true, ..base() },
        ]
        .into_iter()
        .chain(PaperType::ALL.into_iter().map(|paper_type| PrintSettings { paper_type, ..base() }))
        .chain(BindingType::ALL.into_iter().map(|binding| PrintSettings { binding, ..base() }))
        .collect();

        for settings in variants {
            assert!(
                engine.compute_total(&settings) >= start_total,
                "total decreased for {settings:?}"
            );
        }
    }

    #[test]
    fn test_double_sided_does_not_change_price() {
        let single = base();
        let double = PrintSettings {
            double_sided: true,
            ..base()
        };
        assert_eq!(total(&single), total(&double));
    }

    #[test]
    fn test_from_maps_requires_every_option() {
        let mut maps = RateTable::default().to_maps();
        maps.binding.remove(&BindingType::Thermal);
        let err = RateTable::from_maps(&maps).unwrap_err();
        assert!(matches!(err, PrintShopError::Config(msg) if msg.contains("Thermal")));
    }

    #[test]
    fn test_from_maps_rejects_negative_rates() {
        let mut maps = RateTable::default().to_maps();
        maps.delivery_fee = dec!(-1);
        assert!(RateTable::from_maps(&maps).is_err());
    }

    #[test]
    fn test_from_maps_rejects_zero_multiplier() {
        let mut maps = RateTable::default().to_maps();
        maps.size_multiplier.insert(PaperSize::A3, Decimal::ZERO);
        assert!(RateTable::from_maps(&maps).is_err());
    }

    #[test]
    fn test_default_table_round_trips_through_maps() {
        let table = RateTable::default();
        assert_eq!(RateTable::from_maps(&table.to_maps()).unwrap(), table);
    }

    #[test]
    fn test_substituted_rate_table() {
        let mut maps = RateTable::default().to_maps();
        maps.color.insert(ColorMode::BlackAndWhite, dec!(1.50));
        let engine = PricingEngine::new(RateTable::from_maps(&maps).unwrap());
        let settings = PrintSettings {
            pages_per_copy: 10,
            ..base()
        };
        assert_eq!(engine.compute_total(&settings), dec!(15.00));
    }

    #[test]
    fn test_huge_rates_saturate_instead_of_overflowing() {
        let mut maps = RateTable::default().to_maps();
        let huge = Decimal::from_i128_with_scale(10_i128.pow(21), 0);
        maps.binding.insert(BindingType::Thermal, huge);
        maps.express_fraction = Decimal::MAX;
        let engine = PricingEngine::new(RateTable::from_maps(&maps).unwrap());
        let settings = PrintSettings {
            copies: u32::MAX,
            pages_per_copy: u32::MAX,
            binding: BindingType::Thermal,
            delivery_mode: DeliveryMode::Delivery,
            is_express: true,
            ..base()
        };

        let breakdown = engine.breakdown(&settings);
        assert_eq!(breakdown.binding_subtotal, Decimal::MAX);
        assert_eq!(breakdown.total, Decimal::MAX);
        assert_eq!(engine.compute_total(&settings), Decimal::MAX);
    }

    #[test]
    fn test_large_counts_with_default_rates_are_exact() {
        let settings = PrintSettings {
            copies: u32::MAX,
            pages_per_copy: u32::MAX,
            ..base()
        };
        let expected = dec!(3.00) * Decimal::from(u32::MAX) * Decimal::from(u32::MAX);
        assert_eq!(total(&settings), round_money(expected));
    }
}
