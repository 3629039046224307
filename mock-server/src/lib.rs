//! In-memory fake of the RBS backend.
//!
//! Serves the `ProductService2` and `MainService` routes under both the
//! `/server` and `/client` gateways. Product routes answer with the
//! `{success, data, message}` envelope; token routes answer with plain
//! bodies and signal failure through the status code.

pub mod catalog;
mod main_service;
mod product_service;

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};

pub use catalog::{Catalog, Product};

pub const PROJECT_ID: &str = "mock-project";

pub type Db = Arc<RwLock<Catalog>>;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    /// When set, every call except authenticate and refresh must carry
    /// `auth=<key>`.
    pub api_key: Option<Arc<str>>,
}

impl AppState {
    pub fn new(catalog: Catalog, api_key: Option<&str>) -> Self {
        Self {
            db: Arc::new(RwLock::new(catalog)),
            api_key: api_key.map(Arc::from),
        }
    }

    fn authorize(&self, params: &HashMap<String, String>) -> Result<(), Response> {
        match &self.api_key {
            Some(key) if params.get("auth").map(String::as_str) != Some(&**key) => {
                Err(rejection(StatusCode::UNAUTHORIZED, "Unauthorized"))
            }
            _ => Ok(()),
        }
    }
}

/// `200 {success: true, data}`.
pub(crate) fn success<T: Serialize>(data: T) -> Response {
    Json(json!({"success": true, "data": data})).into_response()
}

/// `200 {success: false, message}`.
pub(crate) fn failure(message: &str) -> Response {
    Json(json!({"success": false, "message": message})).into_response()
}

/// Non-2xx status with an envelope-shaped body.
pub(crate) fn rejection(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"success": false, "message": message}))).into_response()
}

fn gateway() -> Router<AppState> {
    Router::new()
        .route("/ProductService2/search", get(product_service::search))
        .route("/ProductService2/aggs", get(product_service::aggs))
        .route("/ProductService2/getProduct", get(product_service::get_product))
        .route(
            "/ProductService2/getProductStock",
            get(product_service::get_product_stock),
        )
        .route(
            "/ProductService2/getProductStockByMerchant",
            get(product_service::get_product_stock_by_merchant),
        )
        .route(
            "/ProductService2/getMultipleProducts",
            get(product_service::get_multiple_products),
        )
        .route(
            "/ProductService2/getCategories",
            get(product_service::get_categories),
        )
        .route("/ProductService2/getList", get(product_service::get_list))
        .route(
            "/ProductService2/insertStockOperation",
            post(product_service::insert_stock_operation),
        )
        .route(
            "/ProductService2/simulatedStockOperation",
            post(product_service::simulated_stock_operation),
        )
        .route(
            "/ProductService2/updateMerchantData",
            post(product_service::update_merchant_data),
        )
        .route("/MainService/token", get(main_service::token))
        .route(
            "/MainService/public/authenticate",
            post(main_service::authenticate),
        )
        .route(
            "/MainService/public/refresh-token",
            post(main_service::refresh_token),
        )
}

pub fn app_with_state(state: AppState) -> Router {
    Router::new()
        .nest("/server", gateway())
        .nest("/client", gateway())
        .with_state(state)
}

/// Seeded catalog, no API key.
pub fn app() -> Router {
    app_with_state(AppState::new(Catalog::seeded(), None))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_state(listener, AppState::new(Catalog::seeded(), None)).await
}

pub async fn run_with_state(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "mock RBS backend listening");
    }
    axum::serve(listener, app_with_state(state)).await
}
