use super::metrics::{DashboardSnapshot, GroupTotal};
use std::fmt::Write;

fn section(out: &mut String, title: &str, groups: &[GroupTotal]) {
    let _ = writeln!(out, "\n{}", title);
    for g in groups {
        let _ = writeln!(
            out,
            "  {:<34} {:>7} orders {:>14} {:>6.1}%",
            g.key,
            g.orders,
            g.revenue.to_string(),
            g.share * 100.0
        );
    }
}

/// Plain-text rendering of a snapshot for the `summary` command.
pub fn render_text(s: &DashboardSnapshot) -> String {
    let k = &s.kpis;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Orders {} of {} (filter: {})",
        k.total_orders, s.rows_total, s.filter
    );
    let _ = writeln!(out, "  revenue           {}", k.total_revenue);
    let _ = writeln!(out, "  avg order value   {}", k.avg_order_value);
    let _ = writeln!(out, "  median order      {}", k.median_order_value);
    let _ = writeln!(out, "  customers         {}", k.unique_customers);
    let _ = writeln!(
        out,
        "  best product      {}",
        k.best_product.as_deref().unwrap_or("-")
    );
    if let Some(delta) = k.revenue_delta_pct {
        let _ = writeln!(out, "  last 30d revenue  {:+.1}%", delta);
    }
    if let Some(delta) = k.orders_delta_pct {
        let _ = writeln!(out, "  last 30d orders   {:+.1}%", delta);
    }

    section(&mut out, "Revenue by category", &s.by_category);
    section(&mut out, "Top products", &s.top_products);
    section(&mut out, "Top countries", &s.top_countries);
    section(&mut out, "Payment methods", &s.by_payment);
    section(&mut out, "Shipping", &s.by_shipping);
    section(&mut out, "Order status", &s.by_status);

    let _ = writeln!(out, "\nDiscount codes");
    for c in &s.discount_usage {
        let _ = writeln!(
            out,
            "  {:<12} {:>7} orders {:>12} off",
            c.code,
            c.orders,
            c.discount_total.to_string()
        );
    }

    let _ = writeln!(out, "\nMonthly");
    for m in &s.monthly {
        let _ = writeln!(
            out,
            "  {} {:>7} orders {:>14} aov {:>8}",
            m.month,
            m.orders,
            m.revenue.to_string(),
            m.avg_order_value.to_string()
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::OrderFilter;
    use crate::generate::service::generate_orders;
    use crate::generate::GeneratorConfig;

    #[test]
    fn text_report_lists_sections() {
        let orders = generate_orders(&GeneratorConfig {
            rows: 500,
            seed: Some(4),
            ..Default::default()
        })
        .unwrap();
        let snap = DashboardSnapshot::compute(&orders, &OrderFilter::default());
        let text = render_text(&snap);
        assert!(text.starts_with("Orders 500 of 500 (filter: ALL)"));
        for heading in ["Revenue by category", "Top products", "Discount codes", "Monthly"] {
            assert!(text.contains(heading), "missing {}", heading);
        }
        assert!(text.contains("Skincare"));
        assert!(text.contains("last 30d orders"));
    }
}
