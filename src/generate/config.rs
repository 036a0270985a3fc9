use super::error::GenerateError;
use super::sampling::check_weights;
use crate::catalog::{DiscountRule, ReferenceTables, SeasonalEvent};
use crate::dataset::Cents;
use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_ROWS: usize = 65_000;
pub const DEFAULT_DISCOUNT_RATE: f64 = 0.53;
pub const DEFAULT_POOL_RATIO: f64 = 0.2;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub rows: usize,
    /// First day of the window, inclusive.
    pub start: NaiveDate,
    /// Day after the last day of the window, exclusive.
    pub end: NaiveDate,
    pub seed: Option<u64>,
    /// Probability that an order carries a discount code.
    pub discount_rate: f64,
    /// Customer pool size as a fraction of `rows`.
    pub customer_pool_ratio: f64,
    pub tables: ReferenceTables,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            start: ymd(2024, 7, 1),
            end: ymd(2026, 1, 1),
            seed: None,
            discount_rate: DEFAULT_DISCOUNT_RATE,
            customer_pool_ratio: DEFAULT_POOL_RATIO,
            tables: ReferenceTables::default(),
        }
    }
}

impl GeneratorConfig {
    /// Reads a JSON config; absent fields keep their defaults.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(cfg)
    }

    pub fn customer_pool_size(&self) -> usize {
        let raw = (self.rows as f64 * self.customer_pool_ratio).ceil() as usize;
        raw.clamp(1, self.rows.max(1))
    }

    /// Rejects configurations that cannot produce a valid dataset, before
    /// any sampling happens.
    pub fn validate(&self) -> Result<(), GenerateError> {
        if self.rows == 0 {
            return Err(GenerateError::NoRows);
        }
        if self.start >= self.end {
            return Err(GenerateError::EmptyWindow {
                start: self.start,
                end: self.end,
            });
        }
        if !(0.0..=1.0).contains(&self.discount_rate) {
            return Err(GenerateError::DiscountRate(self.discount_rate));
        }
        if !(self.customer_pool_ratio > 0.0 && self.customer_pool_ratio <= 1.0) {
            return Err(GenerateError::PoolRatio(self.customer_pool_ratio));
        }

        let t = &self.tables;
        check_weights("products", t.products.iter().map(|p| p.popularity))?;
        check_weights("countries", t.countries.iter().map(|c| c.weight))?;
        check_weights("payment_methods", t.payment_methods.iter().map(|p| p.weight))?;
        check_weights("shipping_tiers", t.shipping_tiers.iter().map(|s| s.weight))?;
        check_weights("statuses", t.statuses.iter().map(|s| s.weight))?;
        check_weights("quantity_weights", t.quantity_weights.iter().copied())?;
        check_weights("hour_weights", t.hour_weights.iter().copied())?;
        check_weights("weekday_multipliers", t.weekday_multipliers.iter().copied())?;
        if t.discount_codes.is_empty() {
            return Err(GenerateError::EmptyTable("discount_codes"));
        }
        if t.calendar.events.is_empty() {
            return Err(GenerateError::EmptyTable("calendar"));
        }

        let negative = |table, item: &str| GenerateError::NegativePrice {
            table,
            item: item.to_string(),
        };
        if let Some(p) = t.products.iter().find(|p| p.unit_price < Cents::ZERO) {
            return Err(negative("products", &p.name));
        }
        if let Some(s) = t.shipping_tiers.iter().find(|s| s.cost < Cents::ZERO) {
            return Err(negative("shipping_tiers", &s.name));
        }
        for code in &t.discount_codes {
            if let DiscountRule::Fixed { amount } = code.rule {
                if amount < Cents::ZERO {
                    return Err(negative("discount_codes", &code.code));
                }
            }
        }

        for event in &t.calendar.events {
            check_event(event)?;
        }
        Ok(())
    }
}

fn check_event(event: &SeasonalEvent) -> Result<(), GenerateError> {
    let invalid = |reason: String| GenerateError::InvalidWeights {
        table: "calendar",
        reason,
    };
    if !event.multiplier.is_finite() || event.multiplier < 0.0 {
        return Err(invalid(format!(
            "{} has multiplier {}",
            event.name, event.multiplier
        )));
    }
    // 2024 is a leap year, so Feb 29 is accepted.
    let bounds = [
        (event.start_month, event.start_day),
        (event.end_month, event.end_day),
    ];
    for (month, day) in bounds {
        if NaiveDate::from_ymd_opt(2024, month, day).is_none() {
            return Err(invalid(format!(
                "{} has no such day {:02}-{:02}",
                event.name, month, day
            )));
        }
    }
    Ok(())
}
