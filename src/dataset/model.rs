use super::money::Cents;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Column order of the serialized dataset. Matches the field order of
/// [`OrderRecord`], which is what the csv serializer emits as the header.
pub const COLUMNS: [&str; 16] = [
    "order_id",
    "order_date",
    "product_name",
    "product_category",
    "sku",
    "quantity",
    "unit_price",
    "discount_code",
    "discount_amount",
    "total_price",
    "customer_id",
    "customer_country",
    "payment_method",
    "shipping_method",
    "shipping_cost",
    "order_status",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OrderStatus {
    Delivered,
    Shipped,
    Processing,
    Returned,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Delivered,
        OrderStatus::Shipped,
        OrderStatus::Processing,
        OrderStatus::Returned,
        OrderStatus::Cancelled,
        OrderStatus::Refunded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Processing => "Processing",
            OrderStatus::Returned => "Returned",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Refunded => "Refunded",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .iter()
            .copied()
            .find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown order status: {}", s))
    }
}

/// One generated order. Field order is the on-disk column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: String,
    #[serde(with = "timestamp")]
    pub order_date: NaiveDateTime,
    pub product_name: String,
    pub product_category: String,
    pub sku: String,
    pub quantity: u32,
    pub unit_price: Cents,
    pub discount_code: Option<String>,
    pub discount_amount: Cents,
    pub total_price: Cents,
    pub customer_id: String,
    pub customer_country: String,
    pub payment_method: String,
    pub shipping_method: String,
    pub shipping_cost: Cents,
    pub order_status: OrderStatus,
}

impl OrderRecord {
    pub fn subtotal(&self) -> Cents {
        self.unit_price * self.quantity
    }

    /// `quantity * unit_price - discount_amount + shipping_cost`.
    pub fn expected_total(&self) -> Cents {
        self.subtotal() - self.discount_amount + self.shipping_cost
    }
}

mod timestamp {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&dt.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("refunded".parse::<OrderStatus>(), Ok(OrderStatus::Refunded));
        assert_eq!(" Shipped ".parse::<OrderStatus>(), Ok(OrderStatus::Shipped));
        assert!("Lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn expected_total_includes_shipping() {
        let order = OrderRecord {
            order_id: "#SB1001".to_string(),
            order_date: NaiveDateTime::parse_from_str("2024-07-01 10:00:00", TIMESTAMP_FORMAT)
                .unwrap(),
            product_name: "Volumizing Mascara".to_string(),
            product_category: "Makeup".to_string(),
            sku: "MAK-VOLU-111".to_string(),
            quantity: 2,
            unit_price: Cents(1499),
            discount_code: Some("WELCOME10".to_string()),
            discount_amount: Cents(300),
            total_price: Cents(3197),
            customer_id: "CUST-000001".to_string(),
            customer_country: "Canada".to_string(),
            payment_method: "PayPal".to_string(),
            shipping_method: "Standard Shipping".to_string(),
            shipping_cost: Cents(499),
            order_status: OrderStatus::Delivered,
        };
        assert_eq!(order.subtotal(), Cents(2998));
        assert_eq!(order.expected_total(), order.total_price);
    }
}
