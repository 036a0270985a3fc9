use crate::dataset::{OrderRecord, OrderStatus};
use chrono::NaiveDate;

/// Row predicate used by the dashboard and the `summary` command. Empty
/// sets mean "no restriction"; date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub categories: Vec<String>,
    pub countries: Vec<String>,
    pub statuses: Vec<OrderStatus>,
}

impl OrderFilter {
    pub fn matches(&self, o: &OrderRecord) -> bool {
        let day = o.order_date.date();
        if self.from.map_or(false, |f| day < f) {
            return false;
        }
        if self.to.map_or(false, |t| day > t) {
            return false;
        }
        if !self.categories.is_empty() && !self.categories.iter().any(|c| *c == o.product_category)
        {
            return false;
        }
        if !self.countries.is_empty() && !self.countries.iter().any(|c| *c == o.customer_country) {
            return false;
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&o.order_status) {
            return false;
        }
        true
    }

    pub fn apply<'a>(&self, orders: &'a [OrderRecord]) -> Vec<&'a OrderRecord> {
        orders.iter().filter(|o| self.matches(o)).collect()
    }

    pub fn is_empty(&self) -> bool {
        *self == OrderFilter::default()
    }

    pub fn clear(&mut self) {
        *self = OrderFilter::default();
    }

    /// Single-status cycle for the dashboard: all → first status → … → last → all.
    pub fn cycle_status(&mut self) {
        let next = match self.statuses.as_slice() {
            [] => Some(OrderStatus::ALL[0]),
            [current] => OrderStatus::ALL
                .iter()
                .position(|s| s == current)
                .and_then(|i| OrderStatus::ALL.get(i + 1))
                .copied(),
            _ => None,
        };
        self.statuses = next.into_iter().collect();
    }

    /// Same cycle over the given category names.
    pub fn cycle_category(&mut self, categories: &[String]) {
        let next = match self.categories.as_slice() {
            [] => categories.first(),
            [current] => categories
                .iter()
                .position(|c| c == current)
                .and_then(|i| categories.get(i + 1)),
            _ => None,
        };
        self.categories = next.cloned().into_iter().collect();
    }

    pub fn describe(&self) -> String {
        if self.is_empty() {
            return "ALL".to_string();
        }
        let mut parts = Vec::new();
        match (self.from, self.to) {
            (Some(f), Some(t)) => parts.push(format!("{}..={}", f, t)),
            (Some(f), None) => parts.push(format!("from {}", f)),
            (None, Some(t)) => parts.push(format!("to {}", t)),
            (None, None) => {}
        }
        if !self.categories.is_empty() {
            parts.push(format!("category={}", self.categories.join("|")));
        }
        if !self.countries.is_empty() {
            parts.push(format!("country={}", self.countries.join("|")));
        }
        if !self.statuses.is_empty() {
            let names: Vec<&str> = self.statuses.iter().map(|s| s.as_str()).collect();
            parts.push(format!("status={}", names.join("|")));
        }
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::service::generate_orders;
    use crate::generate::GeneratorConfig;

    fn orders() -> Vec<OrderRecord> {
        generate_orders(&GeneratorConfig {
            rows: 2_000,
            seed: Some(21),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let rows = orders();
        let f = OrderFilter::default();
        assert!(f.is_empty());
        assert_eq!(f.apply(&rows).len(), rows.len());
        assert_eq!(f.describe(), "ALL");
    }

    #[test]
    fn combines_predicates() {
        let rows = orders();
        let f = OrderFilter {
            from: NaiveDate::from_ymd_opt(2025, 1, 1),
            to: NaiveDate::from_ymd_opt(2025, 6, 30),
            categories: vec!["Skincare".to_string(), "Fragrance".to_string()],
            countries: vec!["United States".to_string()],
            statuses: vec![OrderStatus::Delivered],
        };
        let kept = f.apply(&rows);
        assert!(!kept.is_empty());
        for o in &kept {
            let day = o.order_date.date();
            assert!(day >= f.from.unwrap() && day <= f.to.unwrap());
            assert!(o.product_category == "Skincare" || o.product_category == "Fragrance");
            assert_eq!(o.customer_country, "United States");
            assert_eq!(o.order_status, OrderStatus::Delivered);
        }
        let expected = rows.iter().filter(|o| f.matches(o)).count();
        assert_eq!(kept.len(), expected);
    }

    #[test]
    fn status_cycle_wraps_to_all() {
        let mut f = OrderFilter::default();
        let mut seen = Vec::new();
        for _ in 0..OrderStatus::ALL.len() {
            f.cycle_status();
            seen.push(f.statuses[0]);
        }
        assert_eq!(seen, OrderStatus::ALL.to_vec());
        f.cycle_status();
        assert!(f.statuses.is_empty());
    }

    #[test]
    fn category_cycle_wraps_to_all() {
        let cats = vec!["A".to_string(), "B".to_string()];
        let mut f = OrderFilter::default();
        f.cycle_category(&cats);
        assert_eq!(f.categories, vec!["A".to_string()]);
        f.cycle_category(&cats);
        assert_eq!(f.categories, vec!["B".to_string()]);
        f.cycle_category(&cats);
        assert!(f.categories.is_empty());
    }
}
