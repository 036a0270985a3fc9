use crate::dataset::Cents;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub category: String,
    pub unit_price: Cents,
    /// Relative sales weight; larger sells more often.
    pub popularity: f64,
}

impl Product {
    fn new(category: &str, name: &str, unit_price: i64, popularity: f64) -> Self {
        Self {
            name: name.to_string(),
            category: category.to_string(),
            unit_price: Cents(unit_price),
            popularity,
        }
    }

    /// Stable SKU for the product at `position` in the catalog:
    /// `<first 3 letters of category>-<first 4 chars of first word>-<101 + position>`.
    pub fn sku(&self, position: usize) -> String {
        let prefix: String = self
            .category
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(3)
            .collect::<String>()
            .to_ascii_uppercase();
        let stem: String = self
            .name
            .split_whitespace()
            .next()
            .unwrap_or("ITEM")
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(4)
            .collect::<String>()
            .to_ascii_uppercase();
        format!("{}-{}-{:03}", prefix, stem, 101 + position)
    }
}

pub fn default_products() -> Vec<Product> {
    vec![
        Product::new("Skincare", "Hydrating Face Serum", 3499, 0.055),
        Product::new("Skincare", "Vitamin C Brightening Cream", 2899, 0.040),
        Product::new("Skincare", "Retinol Night Cream", 4299, 0.035),
        Product::new("Skincare", "Gentle Foaming Cleanser", 1899, 0.045),
        Product::new("Skincare", "SPF 50 Daily Sunscreen", 2499, 0.040),
        Product::new("Skincare", "Hyaluronic Acid Moisturizer", 3199, 0.035),
        Product::new("Skincare", "Niacinamide Pore Minimizer", 2699, 0.025),
        Product::new("Skincare", "Exfoliating Toner", 1999, 0.025),
        Product::new("Makeup", "Matte Liquid Lipstick", 1699, 0.050),
        Product::new("Makeup", "Full Coverage Foundation", 3299, 0.040),
        Product::new("Makeup", "Volumizing Mascara", 1499, 0.045),
        Product::new("Makeup", "Eyeshadow Palette - Neutral", 3899, 0.030),
        Product::new("Makeup", "Cream Blush Stick", 2299, 0.030),
        Product::new("Makeup", "Setting Spray", 1899, 0.030),
        Product::new("Makeup", "Brow Defining Pencil", 1299, 0.025),
        Product::new("Makeup", "Concealer Wand", 1599, 0.030),
        Product::new("Haircare", "Argan Oil Shampoo", 2199, 0.040),
        Product::new("Haircare", "Deep Repair Conditioner", 2199, 0.035),
        Product::new("Haircare", "Leave-In Hair Treatment", 2799, 0.030),
        Product::new("Haircare", "Heat Protectant Spray", 1699, 0.025),
        Product::new("Haircare", "Scalp Detox Scrub", 2499, 0.020),
        Product::new("Haircare", "Keratin Smoothing Mask", 2999, 0.030),
        Product::new("Bath & Body", "Shea Butter Body Lotion", 1999, 0.035),
        Product::new("Bath & Body", "Coconut Milk Body Wash", 1499, 0.035),
        Product::new("Bath & Body", "Exfoliating Body Scrub", 2299, 0.025),
        Product::new("Bath & Body", "Rose Petal Bath Bombs (Set of 4)", 1899, 0.025),
        Product::new("Bath & Body", "Hand & Nail Cream", 1299, 0.020),
        Product::new("Fragrance", "Floral Eau de Parfum", 5499, 0.030),
        Product::new("Fragrance", "Citrus Eau de Toilette", 4499, 0.025),
        Product::new("Fragrance", "Vanilla Musk Body Mist", 2499, 0.025),
        Product::new("Fragrance", "Woody Amber Perfume Oil", 3999, 0.020),
    ]
}
