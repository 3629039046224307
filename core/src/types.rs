//! Request and response DTOs for the RBS services.
//!
//! # Design
//! Request types are fully typed because the client decides their wire
//! shape. Catalog documents (products, categories, lists, stock records) are
//! owned by the backend's schema, so they are kept as transparent JSON
//! objects with accessors for the few identifiers callers rely on.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::filter::Filter;

pub const DEFAULT_CULTURE: &str = "en_US";
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_SORT_ATTRIBUTE: &str = "price";

/// Response envelope used by every `ProductService2` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ServiceResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Sort direction. The backend expects the ordinal on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn wire_value(self) -> u8 {
        match self {
            SortOrder::Asc => 0,
            SortOrder::Desc => 1,
        }
    }
}

/// Parameters for a product search. Built through [`SearchInput::builder`],
/// which refuses to produce a value without a user id.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchInput {
    pub(crate) user_id: String,
    pub(crate) search_term: Option<String>,
    pub(crate) category_id: String,
    pub(crate) culture: String,
    pub(crate) filters: Vec<Filter>,
    pub(crate) aggs: bool,
    pub(crate) from: u32,
    pub(crate) size: u32,
    pub(crate) sort_attribute: String,
    pub(crate) sort_order: SortOrder,
    pub(crate) in_stock: bool,
}

impl SearchInput {
    pub fn builder() -> SearchInputBuilder {
        SearchInputBuilder::default()
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn aggs(&self) -> bool {
        self.aggs
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchInputBuilder {
    user_id: Option<String>,
    search_term: Option<String>,
    category_id: Option<String>,
    culture: Option<String>,
    filters: Vec<Filter>,
    aggs: bool,
    from: Option<u32>,
    size: Option<u32>,
    sort_attribute: Option<String>,
    sort_order: Option<SortOrder>,
    in_stock: bool,
}

impl SearchInputBuilder {
    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn search_term(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    pub fn category_id(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    pub fn culture(mut self, culture: impl Into<String>) -> Self {
        self.culture = Some(culture.into());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filters(mut self, filters: impl IntoIterator<Item = Filter>) -> Self {
        self.filters.extend(filters);
        self
    }

    /// Query the aggregation endpoint instead of the search endpoint.
    pub fn aggs(mut self, aggs: bool) -> Self {
        self.aggs = aggs;
        self
    }

    pub fn from(mut self, from: u32) -> Self {
        self.from = Some(from);
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn sort_by(mut self, attribute: impl Into<String>, order: SortOrder) -> Self {
        self.sort_attribute = Some(attribute.into());
        self.sort_order = Some(order);
        self
    }

    pub fn in_stock(mut self, in_stock: bool) -> Self {
        self.in_stock = in_stock;
        self
    }

    pub fn build(self) -> Result<SearchInput, ApiError> {
        let user_id = self
            .user_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::configuration("UserId is missing"))?;
        Ok(SearchInput {
            user_id,
            search_term: self.search_term.filter(|t| !t.is_empty()),
            category_id: self.category_id.unwrap_or_default(),
            culture: self.culture.unwrap_or_else(|| DEFAULT_CULTURE.to_string()),
            filters: self.filters,
            aggs: self.aggs,
            from: self.from.unwrap_or(0),
            size: self.size.unwrap_or(DEFAULT_PAGE_SIZE),
            sort_attribute: self
                .sort_attribute
                .unwrap_or_else(|| DEFAULT_SORT_ATTRIBUTE.to_string()),
            sort_order: self.sort_order.unwrap_or_default(),
            in_stock: self.in_stock,
        })
    }
}

/// Quantity change for one variant of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockItem {
    pub variant: String,
    pub qty: i64,
}

/// Stock change for one product, scoped to the configured merchant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockOperation {
    pub product_id: String,
    pub stocks: Vec<StockItem>,
}

impl StockOperation {
    pub fn new(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            stocks: Vec::new(),
        }
    }

    pub fn with_stock(mut self, variant: impl Into<String>, qty: i64) -> Self {
        self.stocks.push(StockItem {
            variant: variant.into(),
            qty,
        });
        self
    }
}

/// Wire body of `insertStockOperation` / `simulatedStockOperation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockOperationRequest {
    pub decrease: bool,
    pub data: Vec<MerchantStockOperation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantStockOperation {
    pub merchant: MerchantRef,
    pub product_id: String,
    pub stocks: Vec<StockQuantity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantRef {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockQuantity {
    pub variant_name: String,
    pub stock_qty: i64,
}

impl StockOperationRequest {
    pub fn new(merchant_id: &str, operations: &[StockOperation], decrease: bool) -> Self {
        let data = operations
            .iter()
            .map(|op| MerchantStockOperation {
                merchant: MerchantRef {
                    id: merchant_id.to_string(),
                },
                product_id: op.product_id.clone(),
                stocks: op
                    .stocks
                    .iter()
                    .map(|s| StockQuantity {
                        variant_name: s.variant.clone(),
                        stock_qty: s.qty,
                    })
                    .collect(),
            })
            .collect();
        Self { decrease, data }
    }
}

macro_rules! json_document {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Map<String, Value>);

        impl $name {
            pub fn get(&self, key: &str) -> Option<&Value> {
                self.0.get(key)
            }

            pub fn get_str(&self, key: &str) -> Option<&str> {
                self.0.get(key).and_then(Value::as_str)
            }
        }

        impl From<Map<String, Value>> for $name {
            fn from(map: Map<String, Value>) -> Self {
                Self(map)
            }
        }
    };
}

json_document!(
    /// A product document as returned by `getProduct`.
    Product
);
json_document!(
    /// Localized category tree.
    CategoryTree
);
json_document!(
    /// A curated product list.
    ProductList
);
json_document!(
    /// Search or aggregation result page.
    SearchResponse
);
json_document!(
    /// Outcome of a stock write or dry run.
    StockOperationResult
);
json_document!(
    /// Stock level of one product variant at one merchant.
    SingleMerchantProductStock
);
json_document!(
    /// One record of a merchant bulk update. Sent to the backend verbatim.
    BulkUpdateItem
);

impl Product {
    pub fn id(&self) -> Option<&str> {
        self.get_str("id")
    }
}

impl ProductList {
    pub fn id(&self) -> Option<&str> {
        self.get_str("id")
    }
}

impl SingleMerchantProductStock {
    pub fn product_id(&self) -> Option<&str> {
        self.get_str("productId")
    }

    pub fn variant(&self) -> Option<&str> {
        self.get_str("variant")
    }

    pub fn qty(&self) -> Option<i64> {
        self.get("qty").and_then(Value::as_i64)
    }
}

impl SearchResponse {
    pub fn total(&self) -> Option<u64> {
        self.get("total").and_then(Value::as_u64)
    }
}

impl CategoryTree {
    pub fn culture(&self) -> Option<&str> {
        self.get_str("culture")
    }
}

impl StockOperationResult {
    pub fn simulated(&self) -> Option<bool> {
        self.get("simulated").and_then(Value::as_bool)
    }
}

impl BulkUpdateItem {
    pub fn product_id(&self) -> Option<&str> {
        self.get_str("productId")
    }
}

/// Token issued by `MainService/token`, exchanged for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomToken {
    pub custom_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientAuthenticateResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}
