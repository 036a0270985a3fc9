use super::money::Cents;
use super::model::OrderRecord;
use crate::generate::GeneratorConfig;
use chrono::NaiveDateTime;
use std::collections::HashSet;

const MAX_REPORTED: usize = 50;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ViolationKind {
    #[error("expected {expected} rows, found {actual}")]
    RowCount { expected: usize, actual: usize },
    #[error("duplicate order id")]
    DuplicateId,
    #[error("order date {0} outside the window")]
    DateOutOfWindow(NaiveDateTime),
    #[error("unknown product {0:?}")]
    UnknownProduct(String),
    #[error("category {found:?} does not match catalog category {expected:?}")]
    CategoryMismatch { expected: String, found: String },
    #[error("sku {found:?} does not match catalog sku {expected:?}")]
    SkuMismatch { expected: String, found: String },
    #[error("unit price {found} does not match catalog price {expected}")]
    UnitPriceMismatch { expected: Cents, found: Cents },
    #[error("quantity {0} outside 1..=5")]
    QuantityOutOfRange(u32),
    #[error("unknown discount code {0:?}")]
    UnknownDiscountCode(String),
    #[error("discount amount {found}, code rule gives {expected}")]
    DiscountMismatch { expected: Cents, found: Cents },
    #[error("unknown country {0:?}")]
    UnknownCountry(String),
    #[error("unknown payment method {0:?}")]
    UnknownPaymentMethod(String),
    #[error("unknown shipping method {0:?}")]
    UnknownShippingMethod(String),
    #[error("shipping cost {found}, tier price is {expected}")]
    ShippingCostMismatch { expected: Cents, found: Cents },
    #[error("status {0} is not in the status table")]
    UnknownStatus(String),
    #[error("total {found} does not equal quantity*unit_price - discount + shipping = {expected}")]
    TotalMismatch { expected: Cents, found: Cents },
    #[error("negative total {0}")]
    NegativeTotal(Cents),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Zero-based row index; `None` for dataset-level problems.
    pub row: Option<usize>,
    pub order_id: String,
    pub kind: ViolationKind,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub rows: usize,
    /// First violations found, capped.
    pub violations: Vec<Violation>,
    pub total_violations: usize,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.total_violations == 0
    }

    fn push(&mut self, row: Option<usize>, order_id: &str, kind: ViolationKind) {
        self.total_violations += 1;
        if self.violations.len() < MAX_REPORTED {
            self.violations.push(Violation {
                row,
                order_id: order_id.to_string(),
                kind,
            });
        }
    }
}

/// Checks every dataset invariant against the tables and window of
/// `config`, collecting all violations.
pub fn validate(orders: &[OrderRecord], config: &GeneratorConfig) -> ValidationReport {
    let tables = &config.tables;
    let mut report = ValidationReport {
        rows: orders.len(),
        ..Default::default()
    };
    if orders.len() != config.rows {
        report.push(
            None,
            "",
            ViolationKind::RowCount {
                expected: config.rows,
                actual: orders.len(),
            },
        );
    }

    let countries: HashSet<&str> = tables.country_names().into_iter().collect();
    let payments: HashSet<&str> = tables.payment_method_names().into_iter().collect();
    let mut seen: HashSet<&str> = HashSet::with_capacity(orders.len());

    for (i, o) in orders.iter().enumerate() {
        let row = Some(i);
        let id = o.order_id.as_str();
        let mut flag = |kind: ViolationKind| report.push(row, id, kind);

        if !seen.insert(id) {
            flag(ViolationKind::DuplicateId);
        }
        let day = o.order_date.date();
        if day < config.start || day >= config.end {
            flag(ViolationKind::DateOutOfWindow(o.order_date));
        }

        match tables.product(&o.product_name) {
            Some((pos, product)) => {
                if product.category != o.product_category {
                    flag(ViolationKind::CategoryMismatch {
                        expected: product.category.clone(),
                        found: o.product_category.clone(),
                    });
                }
                let sku = product.sku(pos);
                if sku != o.sku {
                    flag(ViolationKind::SkuMismatch {
                        expected: sku,
                        found: o.sku.clone(),
                    });
                }
                if product.unit_price != o.unit_price {
                    flag(ViolationKind::UnitPriceMismatch {
                        expected: product.unit_price,
                        found: o.unit_price,
                    });
                }
            }
            None => flag(ViolationKind::UnknownProduct(o.product_name.clone())),
        }

        if !(1..=5).contains(&o.quantity) {
            flag(ViolationKind::QuantityOutOfRange(o.quantity));
        }

        match o.discount_code.as_deref() {
            Some(code) => match tables.discount_code(code) {
                Some(dc) => {
                    let expected = dc.amount_for(o.subtotal());
                    if expected != o.discount_amount {
                        flag(ViolationKind::DiscountMismatch {
                            expected,
                            found: o.discount_amount,
                        });
                    }
                }
                None => flag(ViolationKind::UnknownDiscountCode(code.to_string())),
            },
            None => {
                if o.discount_amount != Cents::ZERO {
                    flag(ViolationKind::DiscountMismatch {
                        expected: Cents::ZERO,
                        found: o.discount_amount,
                    });
                }
            }
        }

        if !countries.contains(o.customer_country.as_str()) {
            flag(ViolationKind::UnknownCountry(o.customer_country.clone()));
        }
        if !payments.contains(o.payment_method.as_str()) {
            flag(ViolationKind::UnknownPaymentMethod(o.payment_method.clone()));
        }
        match tables.shipping_tier(&o.shipping_method) {
            Some(tier) if tier.cost != o.shipping_cost => {
                flag(ViolationKind::ShippingCostMismatch {
                    expected: tier.cost,
                    found: o.shipping_cost,
                })
            }
            Some(_) => {}
            None => flag(ViolationKind::UnknownShippingMethod(o.shipping_method.clone())),
        }
        if !tables.allows_status(o.order_status) {
            flag(ViolationKind::UnknownStatus(o.order_status.to_string()));
        }

        let expected = o.expected_total();
        if expected != o.total_price {
            flag(ViolationKind::TotalMismatch {
                expected,
                found: o.total_price,
            });
        }
        if o.total_price < Cents::ZERO {
            flag(ViolationKind::NegativeTotal(o.total_price));
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::service::generate_orders;
    use chrono::NaiveDate;

    fn small_config() -> GeneratorConfig {
        GeneratorConfig {
            rows: 300,
            start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            seed: Some(99),
            ..Default::default()
        }
    }

    #[test]
    fn clean_dataset_passes() {
        let cfg = small_config();
        let orders = generate_orders(&cfg).unwrap();
        let report = validate(&orders, &cfg);
        assert!(report.is_ok(), "{:?}", report.violations);
        assert_eq!(report.rows, 300);
    }

    #[test]
    fn detects_tampered_rows() {
        let cfg = small_config();
        let mut orders = generate_orders(&cfg).unwrap();
        orders[1].order_id = orders[0].order_id.clone();
        orders[2].total_price = orders[2].total_price + Cents(1);
        orders[3].customer_country = "Atlantis".to_string();
        orders[4].order_date = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        orders.pop();

        let report = validate(&orders, &cfg);
        assert!(!report.is_ok());
        let kinds: Vec<&ViolationKind> = report.violations.iter().map(|v| &v.kind).collect();
        assert!(kinds.contains(&&ViolationKind::RowCount {
            expected: 300,
            actual: 299
        }));
        assert!(kinds.contains(&&ViolationKind::DuplicateId));
        assert!(kinds
            .iter()
            .any(|k| matches!(k, ViolationKind::TotalMismatch { .. })));
        assert!(kinds.contains(&&ViolationKind::UnknownCountry("Atlantis".to_string())));
        assert!(kinds
            .iter()
            .any(|k| matches!(k, ViolationKind::DateOutOfWindow(_))));
        assert_eq!(report.total_violations, 5);
    }

    #[test]
    fn report_is_capped() {
        let cfg = small_config();
        let mut orders = generate_orders(&cfg).unwrap();
        for o in orders.iter_mut() {
            o.payment_method = "Cash".to_string();
        }
        let report = validate(&orders, &cfg);
        assert_eq!(report.total_violations, 300);
        assert_eq!(report.violations.len(), MAX_REPORTED);
    }
}
