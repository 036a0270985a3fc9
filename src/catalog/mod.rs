pub mod calendar;
pub mod products;
pub mod tables;

pub use calendar::{SeasonalCalendar, SeasonalEvent};
pub use products::Product;
pub use tables::{DiscountCode, DiscountRule, ShippingTier, Weighted};

use crate::dataset::OrderStatus;
use serde::{Deserialize, Serialize};

/// Every fixed table the generator samples from. The defaults are the
/// beauty-store catalog; a JSON config file may replace any of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceTables {
    pub products: Vec<Product>,
    pub countries: Vec<Weighted<String>>,
    pub payment_methods: Vec<Weighted<String>>,
    pub shipping_tiers: Vec<ShippingTier>,
    pub statuses: Vec<Weighted<OrderStatus>>,
    pub discount_codes: Vec<DiscountCode>,
    pub quantity_weights: [f64; 5],
    pub hour_weights: [f64; 24],
    pub weekday_multipliers: [f64; 7],
    pub calendar: SeasonalCalendar,
}

impl Default for ReferenceTables {
    fn default() -> Self {
        Self {
            products: products::default_products(),
            countries: tables::default_countries(),
            payment_methods: tables::default_payment_methods(),
            shipping_tiers: tables::default_shipping_tiers(),
            statuses: tables::default_statuses(),
            discount_codes: tables::default_discount_codes(),
            quantity_weights: tables::DEFAULT_QUANTITY_WEIGHTS,
            hour_weights: tables::DEFAULT_HOUR_WEIGHTS,
            weekday_multipliers: tables::DEFAULT_WEEKDAY_MULTIPLIERS,
            calendar: SeasonalCalendar::default(),
        }
    }
}

impl ReferenceTables {
    pub fn country_names(&self) -> Vec<&str> {
        self.countries.iter().map(|c| c.value.as_str()).collect()
    }

    pub fn payment_method_names(&self) -> Vec<&str> {
        self.payment_methods.iter().map(|p| p.value.as_str()).collect()
    }

    pub fn shipping_tier(&self, name: &str) -> Option<&ShippingTier> {
        self.shipping_tiers.iter().find(|t| t.name == name)
    }

    pub fn discount_code(&self, code: &str) -> Option<&DiscountCode> {
        self.discount_codes.iter().find(|d| d.code == code)
    }

    /// Catalog position and entry of a product by name.
    pub fn product(&self, name: &str) -> Option<(usize, &Product)> {
        self.products.iter().enumerate().find(|(_, p)| p.name == name)
    }

    pub fn allows_status(&self, status: OrderStatus) -> bool {
        self.statuses.iter().any(|s| s.value == status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories(tables: &ReferenceTables) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for p in &tables.products {
            if !out.contains(&p.category.as_str()) {
                out.push(p.category.as_str());
            }
        }
        out
    }

    #[test]
    fn default_categories_in_catalog_order() {
        let tables = ReferenceTables::default();
        assert_eq!(
            categories(&tables),
            vec!["Skincare", "Makeup", "Haircare", "Bath & Body", "Fragrance"]
        );
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let json = r#"{ "weekday_multipliers": [1, 1, 1, 1, 3, 1, 1] }"#;
        let tables: ReferenceTables = serde_json::from_str(json).unwrap();
        assert_eq!(tables.weekday_multipliers[4], 3.0);
        assert_eq!(tables.products.len(), 31);
        assert_eq!(tables.countries.len(), 15);
    }
}
