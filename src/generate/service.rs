use super::config::GeneratorConfig;
use super::error::GenerateError;
use super::sampling::{TimestampSampler, WeightedTable};
use crate::catalog::{Product, ShippingTier, Weighted};
use crate::dataset::{write_orders, Cents, OrderRecord, OrderStatus};
use anyhow::Context;
use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Clone, Debug, Default)]
pub struct GenerateResult {
    pub rows: usize,
    pub customers: usize,
    pub discounted: usize,
    pub revenue: Cents,
    pub path: PathBuf,
}

struct Customer {
    id: String,
    country: usize,
}

/// Samples order records from a validated [`GeneratorConfig`]. All
/// samplers are built up front; `generate` only draws from them.
pub struct OrderGenerator<'a> {
    config: &'a GeneratorConfig,
    timestamps: TimestampSampler,
    products: WeightedTable<'a, Product>,
    skus: Vec<String>,
    quantities: WeightedTable<'a, f64>,
    payments: WeightedTable<'a, Weighted<String>>,
    shipping: WeightedTable<'a, ShippingTier>,
    statuses: WeightedTable<'a, Weighted<OrderStatus>>,
    countries: WeightedTable<'a, Weighted<String>>,
}

impl<'a> OrderGenerator<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Result<Self, GenerateError> {
        config.validate()?;
        let t = &config.tables;
        Ok(Self {
            config,
            timestamps: TimestampSampler::new(config.start, config.end, t)?,
            products: WeightedTable::new("products", &t.products, |p| p.popularity)?,
            skus: t
                .products
                .iter()
                .enumerate()
                .map(|(i, p)| p.sku(i))
                .collect(),
            quantities: WeightedTable::new("quantity_weights", &t.quantity_weights, |w| *w)?,
            payments: WeightedTable::new("payment_methods", &t.payment_methods, |p| p.weight)?,
            shipping: WeightedTable::new("shipping_tiers", &t.shipping_tiers, |s| s.weight)?,
            statuses: WeightedTable::new("statuses", &t.statuses, |s| s.weight)?,
            countries: WeightedTable::new("countries", &t.countries, |c| c.weight)?,
        })
    }

    /// Builds the customer pool; each member gets a home country drawn by
    /// market weight.
    fn customer_pool<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Customer> {
        (0..self.config.customer_pool_size())
            .map(|i| Customer {
                id: format!("CUST-{:06}", i + 1),
                country: self.countries.sample_index(rng),
            })
            .collect()
    }

    /// Produces exactly `rows` records, sorted by date, with sequential ids.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<OrderRecord> {
        let t = &self.config.tables;
        let pool = self.customer_pool(rng);
        let mut orders = Vec::with_capacity(self.config.rows);

        for _ in 0..self.config.rows {
            let order_date = self.timestamps.sample(rng);
            let product_idx = self.products.sample_index(rng);
            let product = &t.products[product_idx];
            let quantity = self.quantities.sample_index(rng) as u32 + 1;
            let subtotal = product.unit_price * quantity;

            let discount = if rng.gen_bool(self.config.discount_rate) {
                t.discount_codes.choose(rng)
            } else {
                None
            };
            let discount_amount = discount
                .map(|d| d.amount_for(subtotal))
                .unwrap_or(Cents::ZERO);

            let shipping = self.shipping.sample(rng);
            let payment = self.payments.sample(rng);
            let status = self.statuses.sample(rng);
            let customer = &pool[rng.gen_range(0..pool.len())];

            orders.push(OrderRecord {
                order_id: String::new(),
                order_date,
                product_name: product.name.clone(),
                product_category: product.category.clone(),
                sku: self.skus[product_idx].clone(),
                quantity,
                unit_price: product.unit_price,
                discount_code: discount.map(|d| d.code.clone()),
                discount_amount,
                total_price: subtotal - discount_amount + shipping.cost,
                customer_id: customer.id.clone(),
                customer_country: t.countries[customer.country].value.clone(),
                payment_method: payment.value.clone(),
                shipping_method: shipping.name.clone(),
                shipping_cost: shipping.cost,
                order_status: status.value,
            });
        }

        // stable: equal timestamps keep draw order
        orders.sort_by(|a, b| a.order_date.cmp(&b.order_date));
        for (i, order) in orders.iter_mut().enumerate() {
            order.order_id = format!("#SB{}", 1001 + i);
        }
        orders
    }
}

pub fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

/// Validates the config and generates the full dataset in memory.
pub fn generate_orders(config: &GeneratorConfig) -> Result<Vec<OrderRecord>, GenerateError> {
    let generator = OrderGenerator::new(config)?;
    let mut rng = rng_for(config.seed);
    Ok(generator.generate(&mut rng))
}

/// Generates the dataset and atomically replaces `output` with it.
pub fn generate_to_file(config: &GeneratorConfig, output: &Path) -> anyhow::Result<GenerateResult> {
    let started = Instant::now();
    info!(
        "generating {} orders for [{}, {}) seed={:?}",
        config.rows, config.start, config.end, config.seed
    );
    let orders = generate_orders(config).context("invalid generator configuration")?;
    write_orders(output, &orders)?;

    let mut customers: Vec<&str> = orders.iter().map(|o| o.customer_id.as_str()).collect();
    customers.sort_unstable();
    customers.dedup();
    let result = GenerateResult {
        rows: orders.len(),
        customers: customers.len(),
        discounted: orders.iter().filter(|o| o.discount_code.is_some()).count(),
        revenue: orders.iter().map(|o| o.total_price).sum(),
        path: output.to_path_buf(),
    };
    info!(
        "wrote {} orders ({} customers, revenue {}) to {} in {:?}",
        result.rows,
        result.customers,
        result.revenue,
        output.display(),
        started.elapsed()
    );
    Ok(result)
}
