//! Stateless request builder and response parser for the RBS services.
//!
//! # Design
//! `RbsClient` holds the immutable configuration and the resolved base URL
//! and carries no mutable state between calls. Each operation is split into
//! a `build_*` method that produces an `HttpRequest` and a `parse_*` method
//! that consumes an `HttpResponse`. Preconditions (merchant identity) are
//! checked in `build_*`, so they fail before any request exists.
//!
//! Query strings are concatenated by hand in a fixed parameter order; the
//! backend's parsers depend on it.

use std::fmt::Display;

use serde::Serialize;

use crate::config::{RbsConfig, ServiceHosts};
use crate::envelope::{unwrap_envelope, unwrap_status};
use crate::error::ApiError;
use crate::filter::filters_to_query_string;
use crate::http::{HttpRequest, HttpResponse};
use crate::token::TokenPayload;
use crate::types::{
    BulkUpdateItem, CategoryTree, ClientAuthenticateResponse, CustomToken, Product, ProductList,
    RefreshTokenRequest, SearchInput, SearchResponse, SingleMerchantProductStock, StockOperation,
    StockOperationRequest, StockOperationResult, DEFAULT_CULTURE,
};

pub const SEARCH_ENDPOINT: &str = "/ProductService2/search";
pub const AGGS_ENDPOINT: &str = "/ProductService2/aggs";
const PRODUCT_SERVICE: &str = "/ProductService2";
const MAIN_SERVICE: &str = "/MainService";

/// Separator for `getMultipleProducts` ids.
pub const PRODUCT_ID_SEPARATOR: &str = "|";

/// Query string accumulated in insertion order.
#[derive(Debug, Default)]
struct QueryParams {
    buf: String,
}

impl QueryParams {
    fn new() -> Self {
        Self::default()
    }

    fn param(self, key: &str, value: impl Display) -> Self {
        let encoded = urlencoding::encode(&value.to_string()).into_owned();
        self.raw_param(key, &encoded)
    }

    fn param_if(self, condition: bool, key: &str, value: impl Display) -> Self {
        if condition {
            self.param(key, value)
        } else {
            self
        }
    }

    /// Append a value that is already URL-safe.
    fn raw_param(mut self, key: &str, value: &str) -> Self {
        self.buf.push(if self.buf.is_empty() { '?' } else { '&' });
        self.buf.push_str(key);
        self.buf.push('=');
        self.buf.push_str(value);
        self
    }
}

/// Synchronous, stateless client for the RBS product and main services.
#[derive(Debug, Clone)]
pub struct RbsClient {
    config: RbsConfig,
    base_url: String,
}

impl RbsClient {
    /// Resolve the base URL against the built-in production and test hosts.
    pub fn new(config: RbsConfig) -> Self {
        Self::with_hosts(config, &ServiceHosts::default())
    }

    /// Resolve the base URL against hosts read from the environment.
    pub fn from_env(config: RbsConfig) -> Self {
        Self::with_hosts(config, &ServiceHosts::from_env())
    }

    pub fn with_hosts(config: RbsConfig, hosts: &ServiceHosts) -> Self {
        let base_url = config.base_url(hosts);
        Self { config, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn config(&self) -> &RbsConfig {
        &self.config
    }

    /// Read the claims of a token without verifying it.
    pub fn token_payload(&self, token: &str) -> Result<TokenPayload, ApiError> {
        TokenPayload::decode(token)
    }

    fn url(&self, path: &str, query: QueryParams) -> String {
        format!("{}{}{}", self.base_url, path, query.buf)
    }

    /// Like `url`, plus the `auth` parameter when an API key is configured.
    fn authed_url(&self, path: &str, query: QueryParams) -> String {
        let query = match self.config.api_key() {
            Some(key) => query.param("auth", key),
            None => query,
        };
        self.url(path, query)
    }

    fn product_service_url(&self, method: &str, query: QueryParams) -> String {
        self.authed_url(&format!("{PRODUCT_SERVICE}/{method}"), query)
    }

    pub fn build_search(&self, input: &SearchInput) -> HttpRequest {
        let endpoint = if input.aggs {
            AGGS_ENDPOINT
        } else {
            SEARCH_ENDPOINT
        };
        let filters = filters_to_query_string(&input.filters);
        let query = if filters.is_empty() {
            QueryParams::new()
        } else {
            QueryParams::new().raw_param("filters", &filters)
        };
        let query = query
            .param("categoryId", &input.category_id)
            .param("culture", &input.culture)
            .param("from", input.from)
            .param("size", input.size)
            .param("userId", &input.user_id)
            .param("sortBy", &input.sort_attribute)
            .param("sortOrder", input.sort_order.wire_value())
            .param_if(input.in_stock, "inStock", true);
        let query = match &input.search_term {
            Some(term) => query.param("searchTerm", term),
            None => query,
        };
        HttpRequest::get(self.authed_url(endpoint, query))
    }

    /// `simulated` targets the dry-run endpoint; `decrease` subtracts the
    /// quantities instead of adding them.
    pub fn build_execute_stock_operation(
        &self,
        operations: &[StockOperation],
        decrease: bool,
        simulated: bool,
    ) -> Result<HttpRequest, ApiError> {
        let merchant_id = self
            .config
            .merchant_id()
            .ok_or_else(|| ApiError::configuration("MerchantId should be set in configuration"))?;
        let body = to_json(&StockOperationRequest::new(merchant_id, operations, decrease))?;
        let method = if simulated {
            "simulatedStockOperation"
        } else {
            "insertStockOperation"
        };
        Ok(HttpRequest::post_json(
            self.product_service_url(method, QueryParams::new()),
            body,
        ))
    }

    pub fn build_update_merchant_data(
        &self,
        items: &[BulkUpdateItem],
    ) -> Result<HttpRequest, ApiError> {
        let body = to_json(&items)?;
        Ok(HttpRequest::post_json(
            self.product_service_url("updateMerchantData", QueryParams::new()),
            body,
        ))
    }

    pub fn build_get_product(
        &self,
        product_id: &str,
        culture: Option<&str>,
        merchant_id: Option<&str>,
    ) -> HttpRequest {
        let query = QueryParams::new()
            .param("productId", product_id)
            .param("culture", culture.unwrap_or(DEFAULT_CULTURE));
        let query = match merchant_id.filter(|m| !m.is_empty()) {
            Some(merchant_id) => query.param("merchantId", merchant_id),
            None => query,
        };
        HttpRequest::get(self.product_service_url("getProduct", query))
    }

    pub fn build_get_product_stock(
        &self,
        product_id: &str,
        merchant_id: &str,
        variant: &str,
    ) -> HttpRequest {
        let query = QueryParams::new()
            .param("productId", product_id)
            .param("merchantId", merchant_id)
            .param("variant", variant);
        HttpRequest::get(self.product_service_url("getProductStock", query))
    }

    pub fn build_get_product_stock_by_merchant(
        &self,
        merchant_id: &str,
        variant: &str,
    ) -> HttpRequest {
        let query = QueryParams::new()
            .param("merchantId", merchant_id)
            .param("variant", variant);
        HttpRequest::get(self.product_service_url("getProductStockByMerchant", query))
    }

    pub fn build_get_multiple_products<S: AsRef<str>>(
        &self,
        product_ids: &[S],
        culture: Option<&str>,
    ) -> HttpRequest {
        let joined = product_ids
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(PRODUCT_ID_SEPARATOR);
        let query = QueryParams::new()
            .param("productIds", joined)
            .param("culture", culture.unwrap_or(DEFAULT_CULTURE));
        HttpRequest::get(self.product_service_url("getMultipleProducts", query))
    }

    pub fn build_get_categories(&self, culture: Option<&str>) -> HttpRequest {
        let query = QueryParams::new().param("culture", culture.unwrap_or(DEFAULT_CULTURE));
        HttpRequest::get(self.product_service_url("getCategories", query))
    }

    pub fn build_get_list_products(
        &self,
        list_id: &str,
        culture: Option<&str>,
        in_stock: bool,
    ) -> HttpRequest {
        let query = QueryParams::new()
            .param("culture", culture.unwrap_or(DEFAULT_CULTURE))
            .param("listId", list_id)
            .param_if(in_stock, "inStock", true);
        HttpRequest::get(self.product_service_url("getList", query))
    }

    pub fn build_generate_custom_token(&self, user_id: &str) -> HttpRequest {
        let query = QueryParams::new().param("userId", user_id);
        HttpRequest::get(self.authed_url(&format!("{MAIN_SERVICE}/token"), query))
    }

    /// Never carries the API key.
    pub fn build_client_authenticate(&self, token: &CustomToken) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest::post_json(
            self.url(&format!("{MAIN_SERVICE}/public/authenticate"), QueryParams::new()),
            to_json(token)?,
        ))
    }

    /// Never carries the API key.
    pub fn build_client_refresh_token(&self, refresh_token: &str) -> Result<HttpRequest, ApiError> {
        let body = RefreshTokenRequest {
            refresh_token: refresh_token.to_string(),
        };
        Ok(HttpRequest::post_json(
            self.url(&format!("{MAIN_SERVICE}/public/refresh-token"), QueryParams::new()),
            to_json(&body)?,
        ))
    }

    pub fn parse_search(&self, response: &HttpResponse) -> Result<SearchResponse, ApiError> {
        unwrap_envelope(response)
    }

    pub fn parse_execute_stock_operation(
        &self,
        response: &HttpResponse,
    ) -> Result<StockOperationResult, ApiError> {
        unwrap_envelope(response)
    }

    pub fn parse_update_merchant_data(&self, response: &HttpResponse) -> Result<bool, ApiError> {
        unwrap_envelope(response)
    }

    pub fn parse_get_product(&self, response: &HttpResponse) -> Result<Product, ApiError> {
        unwrap_envelope(response)
    }

    pub fn parse_get_product_stock(
        &self,
        response: &HttpResponse,
    ) -> Result<SingleMerchantProductStock, ApiError> {
        unwrap_envelope(response)
    }

    pub fn parse_get_product_stock_by_merchant(
        &self,
        response: &HttpResponse,
    ) -> Result<Vec<SingleMerchantProductStock>, ApiError> {
        unwrap_envelope(response)
    }

    pub fn parse_get_multiple_products(
        &self,
        response: &HttpResponse,
    ) -> Result<Vec<Product>, ApiError> {
        unwrap_envelope(response)
    }

    pub fn parse_get_categories(&self, response: &HttpResponse) -> Result<CategoryTree, ApiError> {
        unwrap_envelope(response)
    }

    pub fn parse_get_list_products(
        &self,
        response: &HttpResponse,
    ) -> Result<ProductList, ApiError> {
        unwrap_envelope(response)
    }

    pub fn parse_generate_custom_token(
        &self,
        response: &HttpResponse,
    ) -> Result<CustomToken, ApiError> {
        unwrap_status(response)
    }

    pub fn parse_client_authenticate(
        &self,
        response: &HttpResponse,
    ) -> Result<ClientAuthenticateResponse, ApiError> {
        unwrap_status(response)
    }

    pub fn parse_client_refresh_token(
        &self,
        response: &HttpResponse,
    ) -> Result<ClientAuthenticateResponse, ApiError> {
        unwrap_status(response)
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string(value).map_err(|e| ApiError::Serialization(e.to_string()))
}
