//! In-memory product catalog backing the mock RBS backend.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const DEFAULT_CULTURE: &str = "en_US";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub category_id: String,
    pub price: f64,
    /// Display name per culture.
    pub names: BTreeMap<String, String>,
}

impl Product {
    pub fn name(&self, culture: &str) -> &str {
        self.names
            .get(culture)
            .or_else(|| self.names.get(DEFAULT_CULTURE))
            .map(String::as_str)
            .unwrap_or(self.id.as_str())
    }

    /// Localized view sent to clients.
    pub fn localized(&self, culture: &str) -> Value {
        json!({
            "id": self.id,
            "categoryId": self.category_id,
            "price": self.price,
            "name": self.name(culture),
        })
    }
}

#[derive(Clone, Debug)]
pub struct Category {
    pub id: String,
    pub names: BTreeMap<String, String>,
}

/// Stock is keyed by (product, merchant, variant).
pub type StockKey = (String, String, String);

#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub products: BTreeMap<String, Product>,
    pub categories: Vec<Category>,
    pub lists: BTreeMap<String, Vec<String>>,
    pub stocks: BTreeMap<StockKey, i64>,
    /// Refresh tokens that may still be exchanged.
    pub refresh_tokens: HashSet<String>,
}

fn names(en: &str, tr: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("en_US".to_string(), en.to_string()),
        ("tr_TR".to_string(), tr.to_string()),
    ])
}

fn key(product: &str, merchant: &str, variant: &str) -> StockKey {
    (product.to_string(), merchant.to_string(), variant.to_string())
}

impl Catalog {
    /// Small fixed data set used by tests and the standalone binary.
    pub fn seeded() -> Self {
        let products = [
            ("p1", "shoes", 120.0, "Running Shoe", "Koşu Ayakkabısı"),
            ("p2", "shoes", 150.0, "Trail Shoe", "Patika Ayakkabısı"),
            ("p3", "socks", 15.5, "Wool Socks", "Yün Çorap"),
            ("p4", "jackets", 220.0, "Rain Jacket", "Yağmurluk"),
        ]
        .into_iter()
        .map(|(id, category, price, en, tr)| {
            (
                id.to_string(),
                Product {
                    id: id.to_string(),
                    category_id: category.to_string(),
                    price,
                    names: names(en, tr),
                },
            )
        })
        .collect();

        let categories = [
            ("shoes", "Shoes", "Ayakkabı"),
            ("socks", "Socks", "Çorap"),
            ("jackets", "Jackets", "Ceket"),
        ]
        .into_iter()
        .map(|(id, en, tr)| Category {
            id: id.to_string(),
            names: names(en, tr),
        })
        .collect();

        let stocks = BTreeMap::from([
            (key("p1", "m1", "42"), 5),
            (key("p1", "m1", "43"), 0),
            (key("p2", "m1", "42"), 2),
            (key("p3", "m2", "std"), 10),
        ]);

        let lists = BTreeMap::from([(
            "summer".to_string(),
            vec!["p1".to_string(), "p3".to_string(), "p4".to_string()],
        )]);

        Self {
            products,
            categories,
            lists,
            stocks,
            refresh_tokens: HashSet::new(),
        }
    }

    pub fn in_stock(&self, product_id: &str) -> bool {
        self.stocks
            .iter()
            .any(|((product, _, _), qty)| product == product_id && *qty > 0)
    }

    pub fn stock(&self, product_id: &str, merchant_id: &str, variant: &str) -> Option<i64> {
        self.stocks
            .get(&key(product_id, merchant_id, variant))
            .copied()
    }

    pub fn set_stock(&mut self, product_id: &str, merchant_id: &str, variant: &str, qty: i64) {
        self.stocks.insert(key(product_id, merchant_id, variant), qty);
    }

    pub fn stock_record(product_id: &str, merchant_id: &str, variant: &str, qty: i64) -> Value {
        json!({
            "productId": product_id,
            "merchantId": merchant_id,
            "variant": variant,
            "qty": qty,
        })
    }

    pub fn merchant_stocks(&self, merchant_id: &str, variant: &str) -> Vec<Value> {
        self.stocks
            .iter()
            .filter(|((_, merchant, v), _)| merchant == merchant_id && v == variant)
            .map(|((product, merchant, v), qty)| Self::stock_record(product, merchant, v, *qty))
            .collect()
    }

    pub fn category_tree(&self, culture: &str) -> Value {
        let categories: Vec<Value> = self
            .categories
            .iter()
            .map(|c| {
                let name = c
                    .names
                    .get(culture)
                    .or_else(|| c.names.get(DEFAULT_CULTURE))
                    .cloned()
                    .unwrap_or_else(|| c.id.clone());
                json!({"id": c.id, "name": name, "children": []})
            })
            .collect();
        json!({"culture": culture, "categories": categories})
    }
}
