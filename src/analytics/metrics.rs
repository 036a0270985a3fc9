use super::filter::OrderFilter;
use crate::dataset::{Cents, OrderRecord};
use chrono::{Datelike, Duration, Timelike};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

pub const TOP_N: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Kpis {
    pub total_revenue: Cents,
    pub total_orders: usize,
    pub avg_order_value: Cents,
    pub median_order_value: Cents,
    pub unique_customers: usize,
    pub best_product: Option<String>,
    /// Revenue of the last 30 days against the 30 days before, in percent,
    /// anchored at the newest order in the subset.
    pub revenue_delta_pct: Option<f64>,
    /// Same windows, by order count.
    pub orders_delta_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal {
    pub key: String,
    pub orders: usize,
    pub revenue: Cents,
    /// Fraction of the subset's revenue.
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthTotal {
    /// `YYYY-MM`
    pub month: String,
    pub orders: usize,
    pub revenue: Cents,
    pub avg_order_value: Cents,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeUsage {
    pub code: String,
    pub orders: usize,
    pub discount_total: Cents,
}

/// Order counts by weekday (Monday first) and hour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
    pub counts: [[u32; 24]; 7],
}

impl Default for Heatmap {
    fn default() -> Self {
        Self {
            counts: [[0; 24]; 7],
        }
    }
}

impl Heatmap {
    pub fn max(&self) -> u32 {
        self.counts
            .iter()
            .flat_map(|row| row.iter().copied())
            .max()
            .unwrap_or(0)
    }
}

/// Everything the dashboard shows for one filter state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub filter: String,
    pub rows_total: usize,
    pub kpis: Kpis,
    pub by_category: Vec<GroupTotal>,
    pub top_products: Vec<GroupTotal>,
    pub top_countries: Vec<GroupTotal>,
    pub by_payment: Vec<GroupTotal>,
    pub by_status: Vec<GroupTotal>,
    pub by_shipping: Vec<GroupTotal>,
    pub discount_usage: Vec<CodeUsage>,
    pub monthly: Vec<MonthTotal>,
    pub heatmap: Heatmap,
}

impl DashboardSnapshot {
    pub fn compute(orders: &[OrderRecord], filter: &OrderFilter) -> Self {
        let rows = filter.apply(orders);
        let mut top_products = group_totals(&rows, |o| o.product_name.as_str());
        top_products.truncate(TOP_N);
        let mut top_countries = group_totals(&rows, |o| o.customer_country.as_str());
        top_countries.truncate(TOP_N);

        Self {
            filter: filter.describe(),
            rows_total: orders.len(),
            kpis: kpis(&rows),
            by_category: group_totals(&rows, |o| o.product_category.as_str()),
            top_products,
            top_countries,
            by_payment: group_totals(&rows, |o| o.payment_method.as_str()),
            by_status: group_totals(&rows, |o| o.order_status.as_str()),
            by_shipping: group_totals(&rows, |o| o.shipping_method.as_str()),
            discount_usage: discount_usage(&rows),
            monthly: monthly(&rows),
            heatmap: heatmap(&rows),
        }
    }
}

fn mean(total: Cents, n: usize) -> Cents {
    if n == 0 {
        return Cents::ZERO;
    }
    let n = n as i64;
    Cents((total.0 + n / 2).div_euclid(n))
}

pub fn median(values: &mut [Cents]) -> Cents {
    if values.is_empty() {
        return Cents::ZERO;
    }
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        mean(values[mid - 1] + values[mid], 2)
    }
}

pub fn kpis(rows: &[&OrderRecord]) -> Kpis {
    let total_revenue: Cents = rows.iter().map(|o| o.total_price).sum();
    let mut totals: Vec<Cents> = rows.iter().map(|o| o.total_price).collect();
    let customers: HashSet<&str> = rows.iter().map(|o| o.customer_id.as_str()).collect();
    let best_product = group_totals(rows, |o| o.product_name.as_str())
        .into_iter()
        .next()
        .map(|g| g.key);

    let (revenue_delta_pct, orders_delta_pct) = match rows.iter().map(|o| o.order_date).max() {
        Some(newest) => {
            let last_start = newest - Duration::days(30);
            let prev_start = newest - Duration::days(60);
            let (mut last, mut prev) = (Cents::ZERO, Cents::ZERO);
            let (mut last_n, mut prev_n) = (0usize, 0usize);
            for o in rows {
                if o.order_date >= last_start {
                    last = last + o.total_price;
                    last_n += 1;
                } else if o.order_date >= prev_start {
                    prev = prev + o.total_price;
                    prev_n += 1;
                }
            }
            (
                (prev > Cents::ZERO).then(|| (last.as_f64() / prev.as_f64() - 1.0) * 100.0),
                (prev_n > 0).then(|| (last_n as f64 / prev_n as f64 - 1.0) * 100.0),
            )
        }
        None => (None, None),
    };

    Kpis {
        total_revenue,
        total_orders: rows.len(),
        avg_order_value: mean(total_revenue, rows.len()),
        median_order_value: median(&mut totals),
        unique_customers: customers.len(),
        best_product,
        revenue_delta_pct,
        orders_delta_pct,
    }
}

/// Revenue per key, largest first; ties broken by key.
pub fn group_totals<'a, F>(rows: &[&'a OrderRecord], key: F) -> Vec<GroupTotal>
where
    F: Fn(&'a OrderRecord) -> &'a str,
{
    let mut groups: HashMap<&str, (usize, Cents)> = HashMap::new();
    let mut total = Cents::ZERO;
    for &o in rows {
        let entry = groups.entry(key(o)).or_insert((0, Cents::ZERO));
        entry.0 += 1;
        entry.1 = entry.1 + o.total_price;
        total = total + o.total_price;
    }
    let mut out: Vec<GroupTotal> = groups
        .into_iter()
        .map(|(k, (orders, revenue))| GroupTotal {
            key: k.to_string(),
            orders,
            revenue,
            share: if total > Cents::ZERO {
                revenue.as_f64() / total.as_f64()
            } else {
                0.0
            },
        })
        .collect();
    out.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.key.cmp(&b.key)));
    out
}

pub fn discount_usage(rows: &[&OrderRecord]) -> Vec<CodeUsage> {
    let mut usage: HashMap<&str, (usize, Cents)> = HashMap::new();
    for o in rows {
        if let Some(code) = o.discount_code.as_deref() {
            let e = usage.entry(code).or_insert((0, Cents::ZERO));
            e.0 += 1;
            e.1 = e.1 + o.discount_amount;
        }
    }
    let mut out: Vec<CodeUsage> = usage
        .into_iter()
        .map(|(code, (orders, discount_total))| CodeUsage {
            code: code.to_string(),
            orders,
            discount_total,
        })
        .collect();
    out.sort_by(|a, b| b.orders.cmp(&a.orders).then_with(|| a.code.cmp(&b.code)));
    out
}

pub fn monthly(rows: &[&OrderRecord]) -> Vec<MonthTotal> {
    let mut months: BTreeMap<(i32, u32), (usize, Cents)> = BTreeMap::new();
    for o in rows {
        let key = (o.order_date.year(), o.order_date.month());
        let e = months.entry(key).or_insert((0, Cents::ZERO));
        e.0 += 1;
        e.1 = e.1 + o.total_price;
    }
    months
        .into_iter()
        .map(|((y, m), (orders, revenue))| MonthTotal {
            month: format!("{:04}-{:02}", y, m),
            orders,
            revenue,
            avg_order_value: mean(revenue, orders),
        })
        .collect()
}

pub fn heatmap(rows: &[&OrderRecord]) -> Heatmap {
    let mut map = Heatmap::default();
    for o in rows {
        let dow = o.order_date.weekday().num_days_from_monday() as usize;
        let hour = o.order_date.hour() as usize;
        map.counts[dow][hour] += 1;
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::OrderStatus;
    use chrono::NaiveDateTime;

    fn order(id: &str, date: &str, product: &str, total: i64, customer: &str) -> OrderRecord {
        OrderRecord {
            order_id: id.to_string(),
            order_date: NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S").unwrap(),
            product_name: product.to_string(),
            product_category: "Makeup".to_string(),
            sku: "MAK-X-101".to_string(),
            quantity: 1,
            unit_price: Cents(total),
            discount_code: None,
            discount_amount: Cents::ZERO,
            total_price: Cents(total),
            customer_id: customer.to_string(),
            customer_country: "Japan".to_string(),
            payment_method: "Klarna".to_string(),
            shipping_method: "Free Shipping".to_string(),
            shipping_cost: Cents::ZERO,
            order_status: OrderStatus::Delivered,
        }
    }

    fn sample() -> Vec<OrderRecord> {
        vec![
            order("#SB1001", "2025-01-06 09:00:00", "Lipstick", 1000, "CUST-000001"),
            order("#SB1002", "2025-01-20 19:30:00", "Mascara", 3000, "CUST-000002"),
            order("#SB1003", "2025-02-25 19:45:00", "Lipstick", 2500, "CUST-000001"),
            order("#SB1004", "2025-03-01 12:00:00", "Palette", 4000, "CUST-000003"),
        ]
    }

    #[test]
    fn kpis_over_subset() {
        let rows = sample();
        let refs: Vec<&OrderRecord> = rows.iter().collect();
        let k = kpis(&refs);
        assert_eq!(k.total_revenue, Cents(10_500));
        assert_eq!(k.total_orders, 4);
        assert_eq!(k.avg_order_value, Cents(2625));
        assert_eq!(k.median_order_value, Cents(2750));
        assert_eq!(k.unique_customers, 3);
        assert_eq!(k.best_product.as_deref(), Some("Palette"));
        // newest 2025-03-01 12:00; last 30 days = 6500, prior 30 days = 4000
        let delta = k.revenue_delta_pct.unwrap();
        assert!((delta - 62.5).abs() < 1e-9, "{}", delta);
        assert_eq!(k.orders_delta_pct, Some(0.0));
    }

    #[test]
    fn delta_windows_include_their_start() {
        // newest 2025-03-31 12:00; windows start at 03-01 12:00 and 01-30 12:00
        let rows = vec![
            order("#SB1001", "2025-01-30 11:59:59", "Lipstick", 9_900, "CUST-000001"),
            order("#SB1002", "2025-01-30 12:00:00", "Lipstick", 1000, "CUST-000001"),
            order("#SB1003", "2025-02-15 12:00:00", "Mascara", 1000, "CUST-000002"),
            order("#SB1004", "2025-03-01 12:00:00", "Palette", 3000, "CUST-000003"),
            order("#SB1005", "2025-03-31 12:00:00", "Palette", 1000, "CUST-000003"),
        ];
        let refs: Vec<&OrderRecord> = rows.iter().collect();
        let k = kpis(&refs);
        // last window: 3000 + 1000 over 2 orders; previous: 1000 + 1000 over 2 orders
        assert_eq!(k.revenue_delta_pct, Some(100.0));
        assert_eq!(k.orders_delta_pct, Some(0.0));
    }

    #[test]
    fn orders_delta_needs_previous_window() {
        let rows = vec![order("#SB1001", "2025-03-31 12:00:00", "Palette", 1000, "CUST-000001")];
        let refs: Vec<&OrderRecord> = rows.iter().collect();
        let k = kpis(&refs);
        assert_eq!(k.orders_delta_pct, None);
        assert_eq!(k.revenue_delta_pct, None);
    }

    #[test]
    fn empty_subset_is_all_zero() {
        let k = kpis(&[]);
        assert_eq!(k, Kpis::default());
    }

    #[test]
    fn groups_sorted_by_revenue_with_shares() {
        let rows = sample();
        let refs: Vec<&OrderRecord> = rows.iter().collect();
        let groups = group_totals(&refs, |o| o.product_name.as_str());
        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["Palette", "Lipstick", "Mascara"]);
        assert_eq!(groups[1].orders, 2);
        let share_sum: f64 = groups.iter().map(|g| g.share).sum();
        assert!((share_sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn monthly_and_heatmap_buckets() {
        let rows = sample();
        let refs: Vec<&OrderRecord> = rows.iter().collect();
        let months = monthly(&refs);
        assert_eq!(
            months.iter().map(|m| m.month.as_str()).collect::<Vec<_>>(),
            vec!["2025-01", "2025-02", "2025-03"]
        );
        assert_eq!(months[0].orders, 2);
        assert_eq!(months[0].avg_order_value, Cents(2000));

        let map = heatmap(&refs);
        // 2025-01-06 and 2025-01-20 are Mondays
        assert_eq!(map.counts[0][9], 1);
        assert_eq!(map.counts[0][19], 1);
        // 2025-02-25 is a Tuesday, 2025-03-01 a Saturday
        assert_eq!(map.counts[1][19], 1);
        assert_eq!(map.counts[5][12], 1);
        assert_eq!(map.max(), 1);
    }

    #[test]
    fn snapshot_respects_filter() {
        let rows = sample();
        let filter = OrderFilter {
            to: chrono::NaiveDate::from_ymd_opt(2025, 1, 31),
            ..Default::default()
        };
        let snap = DashboardSnapshot::compute(&rows, &filter);
        assert_eq!(snap.rows_total, 4);
        assert_eq!(snap.kpis.total_orders, 2);
        assert_eq!(snap.by_category.len(), 1);
        assert_eq!(snap.by_category[0].share, 1.0);
        assert_eq!(snap.filter, "to 2025-01-31");
    }

    #[test]
    fn discount_usage_counts_codes() {
        let mut rows = sample();
        rows[0].discount_code = Some("VIP25".to_string());
        rows[0].discount_amount = Cents(250);
        rows[2].discount_code = Some("VIP25".to_string());
        rows[2].discount_amount = Cents(100);
        rows[3].discount_code = Some("FLASH10".to_string());
        rows[3].discount_amount = Cents(1000);
        let refs: Vec<&OrderRecord> = rows.iter().collect();
        let usage = discount_usage(&refs);
        assert_eq!(usage[0].code, "VIP25");
        assert_eq!(usage[0].orders, 2);
        assert_eq!(usage[0].discount_total, Cents(350));
        assert_eq!(usage[1].code, "FLASH10");
    }
}
