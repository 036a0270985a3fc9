use crate::dataset::{Cents, OrderStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weighted<T> {
    pub value: T,
    pub weight: f64,
}

impl<T> Weighted<T> {
    pub fn new(value: T, weight: f64) -> Self {
        Self { value, weight }
    }
}

fn named(items: &[(&str, f64)]) -> Vec<Weighted<String>> {
    items
        .iter()
        .map(|(name, w)| Weighted::new(name.to_string(), *w))
        .collect()
}

pub fn default_countries() -> Vec<Weighted<String>> {
    named(&[
        ("United States", 0.42),
        ("United Kingdom", 0.12),
        ("Canada", 0.10),
        ("Australia", 0.07),
        ("Germany", 0.05),
        ("France", 0.04),
        ("Netherlands", 0.03),
        ("India", 0.03),
        ("Brazil", 0.03),
        ("Japan", 0.02),
        ("Mexico", 0.02),
        ("South Korea", 0.02),
        ("Italy", 0.02),
        ("Spain", 0.015),
        ("Sweden", 0.005),
    ])
}

pub fn default_payment_methods() -> Vec<Weighted<String>> {
    named(&[
        ("Credit Card", 0.40),
        ("PayPal", 0.25),
        ("Shopify Payments", 0.20),
        ("Apple Pay", 0.08),
        ("Google Pay", 0.05),
        ("Klarna", 0.02),
    ])
}

pub fn default_statuses() -> Vec<Weighted<OrderStatus>> {
    vec![
        Weighted::new(OrderStatus::Delivered, 0.72),
        Weighted::new(OrderStatus::Shipped, 0.12),
        Weighted::new(OrderStatus::Processing, 0.06),
        Weighted::new(OrderStatus::Returned, 0.05),
        Weighted::new(OrderStatus::Cancelled, 0.03),
        Weighted::new(OrderStatus::Refunded, 0.02),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingTier {
    pub name: String,
    pub cost: Cents,
    pub weight: f64,
}

pub fn default_shipping_tiers() -> Vec<ShippingTier> {
    [
        ("Standard Shipping", 499, 0.50),
        ("Express Shipping", 1249, 0.30),
        ("Free Shipping", 0, 0.15),
        ("Overnight Shipping", 2499, 0.05),
    ]
    .iter()
    .map(|(name, cost, weight)| ShippingTier {
        name: name.to_string(),
        cost: Cents(*cost),
        weight: *weight,
    })
    .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiscountRule {
    Percent { pct: u32 },
    Fixed { amount: Cents },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountCode {
    pub code: String,
    pub rule: DiscountRule,
}

impl DiscountCode {
    fn percent(code: &str, pct: u32) -> Self {
        Self {
            code: code.to_string(),
            rule: DiscountRule::Percent { pct },
        }
    }

    fn fixed(code: &str, amount: i64) -> Self {
        Self {
            code: code.to_string(),
            rule: DiscountRule::Fixed {
                amount: Cents(amount),
            },
        }
    }

    /// Discount for an order subtotal, never more than the subtotal.
    pub fn amount_for(&self, subtotal: Cents) -> Cents {
        let raw = match self.rule {
            DiscountRule::Percent { pct } => subtotal.percent(pct.min(100)),
            DiscountRule::Fixed { amount } => amount,
        };
        raw.min(subtotal).max(Cents::ZERO)
    }
}

pub fn default_discount_codes() -> Vec<DiscountCode> {
    vec![
        DiscountCode::percent("WELCOME10", 10),
        DiscountCode::percent("SUMMER15", 15),
        DiscountCode::percent("BEAUTY20", 20),
        DiscountCode::percent("VIP25", 25),
        DiscountCode::fixed("FLASH10", 1000),
        DiscountCode::percent("HOLIDAY15", 15),
        DiscountCode::percent("NEWYEAR20", 20),
        DiscountCode::percent("BDAY10", 10),
    ]
}

/// Relative weights for quantities 1..=5.
pub const DEFAULT_QUANTITY_WEIGHTS: [f64; 5] = [55.0, 25.0, 12.0, 5.0, 3.0];

/// Relative weights for hours 0..=23, evening-weighted.
pub const DEFAULT_HOUR_WEIGHTS: [f64; 24] = [
    1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 3.0, 4.0, 6.0, 8.0, 9.0, 10.0, 10.0, 9.0, 8.0, 7.0, 7.0, 8.0,
    9.0, 10.0, 9.0, 7.0, 4.0, 2.0,
];

/// Monday..Sunday multipliers; Friday is the busiest day.
pub const DEFAULT_WEEKDAY_MULTIPLIERS: [f64; 7] = [1.0, 0.95, 1.0, 1.05, 1.2, 1.1, 0.9];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_sizes() {
        assert_eq!(default_countries().len(), 15);
        assert_eq!(default_payment_methods().len(), 6);
        assert_eq!(default_shipping_tiers().len(), 4);
        assert_eq!(default_discount_codes().len(), 8);
        assert_eq!(default_statuses().len(), 6);
    }

    #[test]
    fn fixed_discount_is_capped_at_subtotal() {
        let flash = DiscountCode::fixed("FLASH10", 1000);
        assert_eq!(flash.amount_for(Cents(1299)), Cents(1000));
        assert_eq!(flash.amount_for(Cents(899)), Cents(899));
    }

    #[test]
    fn percent_discount_uses_subtotal() {
        let vip = DiscountCode::percent("VIP25", 25);
        assert_eq!(vip.amount_for(Cents(3998)), Cents(1000));
    }

    #[test]
    fn discount_rule_json_shape() {
        let json = serde_json::to_value(DiscountCode::fixed("FLASH10", 1000)).unwrap();
        assert_eq!(json["rule"]["kind"], "fixed");
        assert_eq!(json["rule"]["amount"], "10.00");
    }
}
