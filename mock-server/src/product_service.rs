//! `ProductService2` routes.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Response,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::catalog::{Catalog, Product, DEFAULT_CULTURE};
use crate::{failure, rejection, success, AppState};

type Params = HashMap<String, String>;

fn param<'a>(params: &'a Params, key: &str) -> Option<&'a str> {
    params.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

fn required<'a>(params: &'a Params, key: &str) -> Result<&'a str, Response> {
    param(params, key)
        .ok_or_else(|| rejection(StatusCode::BAD_REQUEST, &format!("{key} is required")))
}

fn flag(params: &Params, key: &str) -> bool {
    param(params, key) == Some("true")
}

fn culture(params: &Params) -> &str {
    param(params, "culture").unwrap_or(DEFAULT_CULTURE)
}

fn number(params: &Params, key: &str, default: usize) -> Result<usize, Response> {
    match param(params, key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| rejection(StatusCode::BAD_REQUEST, &format!("{key} must be a number"))),
    }
}

/// Search parameters after the query string has been decoded.
struct SearchParams<'a> {
    filters: &'a str,
    category_id: Option<&'a str>,
    culture: &'a str,
    from: usize,
    size: usize,
    sort_by: &'a str,
    descending: bool,
    in_stock: bool,
    search_term: Option<String>,
}

impl<'a> SearchParams<'a> {
    fn parse(params: &'a Params) -> Result<Self, Response> {
        if param(params, "userId").is_none() {
            return Err(rejection(StatusCode::BAD_REQUEST, "UserId is missing"));
        }
        Ok(Self {
            filters: params.get("filters").map(String::as_str).unwrap_or(""),
            category_id: param(params, "categoryId"),
            culture: culture(params),
            from: number(params, "from", 0)?,
            size: number(params, "size", 20)?,
            sort_by: param(params, "sortBy").unwrap_or("price"),
            descending: param(params, "sortOrder") != Some("0"),
            in_stock: flag(params, "inStock"),
            search_term: param(params, "searchTerm").map(str::to_lowercase),
        })
    }

    fn matching<'c>(&self, catalog: &'c Catalog) -> Vec<&'c Product> {
        let mut hits: Vec<&Product> = catalog
            .products
            .values()
            .filter(|p| self.category_id.is_none_or(|c| p.category_id == c))
            .filter(|p| !self.in_stock || catalog.in_stock(&p.id))
            .filter(|p| {
                self.search_term
                    .as_deref()
                    .is_none_or(|t| p.name(self.culture).to_lowercase().contains(t))
            })
            .collect();
        hits.sort_by(|a, b| {
            let ord = if self.sort_by == "price" {
                a.price.partial_cmp(&b.price).unwrap_or(Ordering::Equal)
            } else {
                a.id.cmp(&b.id)
            };
            if self.descending {
                ord.reverse()
            } else {
                ord
            }
        });
        hits
    }
}

pub(crate) async fn search(State(state): State<AppState>, Query(params): Query<Params>) -> Response {
    if let Err(response) = state.authorize(&params) {
        return response;
    }
    let query = match SearchParams::parse(&params) {
        Ok(query) => query,
        Err(response) => return response,
    };
    let db = state.db.read().await;
    let hits = query.matching(&db);
    let products: Vec<Value> = hits
        .iter()
        .skip(query.from)
        .take(query.size)
        .map(|p| p.localized(query.culture))
        .collect();
    success(json!({
        "total": hits.len(),
        "from": query.from,
        "size": query.size,
        "products": products,
        "appliedFilters": query.filters,
    }))
}

pub(crate) async fn aggs(State(state): State<AppState>, Query(params): Query<Params>) -> Response {
    if let Err(response) = state.authorize(&params) {
        return response;
    }
    let query = match SearchParams::parse(&params) {
        Ok(query) => query,
        Err(response) => return response,
    };
    let db = state.db.read().await;
    let hits = query.matching(&db);
    let mut by_category: BTreeMap<&str, usize> = BTreeMap::new();
    for product in &hits {
        *by_category.entry(product.category_id.as_str()).or_default() += 1;
    }
    success(json!({
        "total": hits.len(),
        "aggregations": {"categoryId": by_category},
        "appliedFilters": query.filters,
    }))
}

pub(crate) async fn get_product(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Response {
    if let Err(response) = state.authorize(&params) {
        return response;
    }
    let product_id = match required(&params, "productId") {
        Ok(id) => id,
        Err(response) => return response,
    };
    let db = state.db.read().await;
    let Some(product) = db.products.get(product_id) else {
        return failure("Product not found");
    };
    let mut doc = product.localized(culture(&params));
    if let Some(merchant_id) = param(&params, "merchantId") {
        let stocks: Vec<Value> = db
            .stocks
            .iter()
            .filter(|((p, m, _), _)| p == product_id && m == merchant_id)
            .map(|((_, _, variant), qty)| json!({"variant": variant, "qty": qty}))
            .collect();
        doc["merchantId"] = json!(merchant_id);
        doc["stocks"] = json!(stocks);
    }
    success(doc)
}

pub(crate) async fn get_product_stock(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Response {
    if let Err(response) = state.authorize(&params) {
        return response;
    }
    let fields = ["productId", "merchantId", "variant"].map(|key| required(&params, key));
    let [product_id, merchant_id, variant] = match fields {
        [Ok(p), Ok(m), Ok(v)] => [p, m, v],
        [Err(response), _, _] | [_, Err(response), _] | [_, _, Err(response)] => return response,
    };
    let db = state.db.read().await;
    match db.stock(product_id, merchant_id, variant) {
        Some(qty) => success(Catalog::stock_record(product_id, merchant_id, variant, qty)),
        None => failure("Stock not found"),
    }
}

pub(crate) async fn get_product_stock_by_merchant(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Response {
    if let Err(response) = state.authorize(&params) {
        return response;
    }
    let (merchant_id, variant) = match (
        required(&params, "merchantId"),
        required(&params, "variant"),
    ) {
        (Ok(m), Ok(v)) => (m, v),
        (Err(response), _) | (_, Err(response)) => return response,
    };
    let db = state.db.read().await;
    success(db.merchant_stocks(merchant_id, variant))
}

pub(crate) async fn get_multiple_products(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Response {
    if let Err(response) = state.authorize(&params) {
        return response;
    }
    let ids = match required(&params, "productIds") {
        Ok(ids) => ids,
        Err(response) => return response,
    };
    let culture = culture(&params);
    let db = state.db.read().await;
    let products: Vec<Value> = ids
        .split('|')
        .filter_map(|id| db.products.get(id))
        .map(|p| p.localized(culture))
        .collect();
    success(products)
}

pub(crate) async fn get_categories(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Response {
    if let Err(response) = state.authorize(&params) {
        return response;
    }
    let db = state.db.read().await;
    success(db.category_tree(culture(&params)))
}

pub(crate) async fn get_list(State(state): State<AppState>, Query(params): Query<Params>) -> Response {
    if let Err(response) = state.authorize(&params) {
        return response;
    }
    let list_id = match required(&params, "listId") {
        Ok(id) => id,
        Err(response) => return response,
    };
    let culture = culture(&params);
    let in_stock = flag(&params, "inStock");
    let db = state.db.read().await;
    let Some(ids) = db.lists.get(list_id) else {
        return failure("List not found");
    };
    let products: Vec<Value> = ids
        .iter()
        .filter_map(|id| db.products.get(id))
        .filter(|p| !in_stock || db.in_stock(&p.id))
        .map(|p| p.localized(culture))
        .collect();
    success(json!({"id": list_id, "culture": culture, "products": products}))
}

#[derive(Debug, Deserialize)]
pub(crate) struct StockOperationBody {
    #[serde(default)]
    decrease: bool,
    data: Vec<MerchantOperation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MerchantOperation {
    merchant: MerchantRef,
    product_id: String,
    stocks: Vec<StockQty>,
}

#[derive(Debug, Deserialize)]
struct MerchantRef {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StockQty {
    variant_name: String,
    stock_qty: i64,
}

/// Apply every change to a copy of the stock table; only `commit` keeps it.
/// A failing item leaves the table untouched.
async fn stock_operation(state: &AppState, body: StockOperationBody, commit: bool) -> Response {
    let mut db = state.db.write().await;
    let mut stocks = db.stocks.clone();
    let mut items = Vec::new();
    for op in &body.data {
        if !db.products.contains_key(&op.product_id) {
            return failure(&format!("Product {} not found", op.product_id));
        }
        for s in &op.stocks {
            let key = (
                op.product_id.clone(),
                op.merchant.id.clone(),
                s.variant_name.clone(),
            );
            let current = stocks.get(&key).copied().unwrap_or(0);
            let next = if body.decrease {
                current - s.stock_qty
            } else {
                current + s.stock_qty
            };
            if next < 0 {
                return failure(&format!(
                    "Insufficient stock for {}/{}",
                    op.product_id, s.variant_name
                ));
            }
            stocks.insert(key, next);
            items.push(Catalog::stock_record(
                &op.product_id,
                &op.merchant.id,
                &s.variant_name,
                next,
            ));
        }
    }
    if commit {
        db.stocks = stocks;
    }
    success(json!({
        "simulated": !commit,
        "decrease": body.decrease,
        "items": items,
    }))
}

pub(crate) async fn insert_stock_operation(
    State(state): State<AppState>,
    Query(params): Query<Params>,
    Json(body): Json<StockOperationBody>,
) -> Response {
    if let Err(response) = state.authorize(&params) {
        return response;
    }
    stock_operation(&state, body, true).await
}

pub(crate) async fn simulated_stock_operation(
    State(state): State<AppState>,
    Query(params): Query<Params>,
    Json(body): Json<StockOperationBody>,
) -> Response {
    if let Err(response) = state.authorize(&params) {
        return response;
    }
    stock_operation(&state, body, false).await
}

/// One bulk record: `{productId, merchantId, variant, qty}`.
fn bulk_item(item: &Value) -> Option<(&str, &str, &str, i64)> {
    Some((
        item.get("productId")?.as_str()?,
        item.get("merchantId")?.as_str()?,
        item.get("variant")?.as_str()?,
        item.get("qty")?.as_i64()?,
    ))
}

pub(crate) async fn update_merchant_data(
    State(state): State<AppState>,
    Query(params): Query<Params>,
    Json(items): Json<Vec<Value>>,
) -> Response {
    if let Err(response) = state.authorize(&params) {
        return response;
    }
    let mut parsed = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match bulk_item(item) {
            Some(record) => parsed.push(record),
            None => return failure(&format!("Invalid bulk update item at index {i}")),
        }
    }
    let mut db = state.db.write().await;
    for (product_id, merchant_id, variant, qty) in parsed {
        db.set_stock(product_id, merchant_id, variant, qty);
    }
    success(true)
}
