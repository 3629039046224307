//! One-call-per-operation façade over `RbsClient` and a `Transport`.
//!
//! Every method builds exactly one request, hands it to the transport and
//! parses the response. Nothing is retried, cached or run in the background.

use std::sync::Arc;

use crate::client::RbsClient;
use crate::config::RbsConfig;
use crate::envelope::extract_message;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::token::TokenPayload;
use crate::transport::{Observer, TracingObserver, Transport};
use crate::types::{
    BulkUpdateItem, CategoryTree, ClientAuthenticateResponse, CustomToken, Product, ProductList,
    SearchInput, SearchResponse, SingleMerchantProductStock, StockOperation, StockOperationResult,
};

pub struct ServiceClient<T> {
    client: RbsClient,
    transport: T,
    observer: Option<Arc<dyn Observer>>,
}

impl<T: Transport> ServiceClient<T> {
    /// `enable_logs` in the configuration attaches a [`TracingObserver`].
    pub fn new(config: RbsConfig, transport: T) -> Self {
        Self::from_client(RbsClient::new(config), transport)
    }

    pub fn from_client(client: RbsClient, transport: T) -> Self {
        let observer: Option<Arc<dyn Observer>> = if client.config().enable_logs {
            Some(Arc::new(TracingObserver))
        } else {
            None
        };
        Self {
            client,
            transport,
            observer,
        }
    }

    /// Replace the observer. Intended for construction time only.
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn client(&self) -> &RbsClient {
        &self.client
    }

    pub fn token_payload(&self, token: &str) -> Result<TokenPayload, ApiError> {
        self.client.token_payload(token)
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        if let Some(observer) = &self.observer {
            observer.on_request(&request);
        }
        match self.transport.execute(&request) {
            Ok(response) => {
                tracing::debug!(
                    method = %request.method,
                    url = %request.url,
                    status = response.status,
                    "rbs call completed"
                );
                if let Some(observer) = &self.observer {
                    observer.on_response(&request, &response);
                }
                Ok(response)
            }
            Err(error) => {
                tracing::debug!(
                    method = %request.method,
                    url = %request.url,
                    error = %error,
                    "rbs call failed"
                );
                if let Some(observer) = &self.observer {
                    observer.on_transport_error(&request, &error);
                }
                match error.body.as_deref().and_then(extract_message) {
                    Some(message) => Err(ApiError::Rejected { message }),
                    None => Err(ApiError::Transport(error.message)),
                }
            }
        }
    }

    pub fn search(&self, input: &SearchInput) -> Result<SearchResponse, ApiError> {
        let response = self.send(self.client.build_search(input))?;
        self.client.parse_search(&response)
    }

    pub fn execute_stock_operation(
        &self,
        operations: &[StockOperation],
        decrease: bool,
        simulated: bool,
    ) -> Result<StockOperationResult, ApiError> {
        let request = self
            .client
            .build_execute_stock_operation(operations, decrease, simulated)?;
        let response = self.send(request)?;
        self.client.parse_execute_stock_operation(&response)
    }

    pub fn update_merchant_data(&self, items: &[BulkUpdateItem]) -> Result<bool, ApiError> {
        let response = self.send(self.client.build_update_merchant_data(items)?)?;
        self.client.parse_update_merchant_data(&response)
    }

    pub fn get_product(
        &self,
        product_id: &str,
        culture: Option<&str>,
        merchant_id: Option<&str>,
    ) -> Result<Product, ApiError> {
        let request = self
            .client
            .build_get_product(product_id, culture, merchant_id);
        let response = self.send(request)?;
        self.client.parse_get_product(&response)
    }

    pub fn get_product_stock(
        &self,
        product_id: &str,
        merchant_id: &str,
        variant: &str,
    ) -> Result<SingleMerchantProductStock, ApiError> {
        let request = self
            .client
            .build_get_product_stock(product_id, merchant_id, variant);
        let response = self.send(request)?;
        self.client.parse_get_product_stock(&response)
    }

    pub fn get_product_stock_by_merchant(
        &self,
        merchant_id: &str,
        variant: &str,
    ) -> Result<Vec<SingleMerchantProductStock>, ApiError> {
        let request = self
            .client
            .build_get_product_stock_by_merchant(merchant_id, variant);
        let response = self.send(request)?;
        self.client.parse_get_product_stock_by_merchant(&response)
    }

    pub fn get_multiple_products<S: AsRef<str>>(
        &self,
        product_ids: &[S],
        culture: Option<&str>,
    ) -> Result<Vec<Product>, ApiError> {
        let request = self
            .client
            .build_get_multiple_products(product_ids, culture);
        let response = self.send(request)?;
        self.client.parse_get_multiple_products(&response)
    }

    pub fn get_categories(&self, culture: Option<&str>) -> Result<CategoryTree, ApiError> {
        let response = self.send(self.client.build_get_categories(culture))?;
        self.client.parse_get_categories(&response)
    }

    pub fn get_list_products(
        &self,
        list_id: &str,
        culture: Option<&str>,
        in_stock: bool,
    ) -> Result<ProductList, ApiError> {
        let request = self
            .client
            .build_get_list_products(list_id, culture, in_stock);
        let response = self.send(request)?;
        self.client.parse_get_list_products(&response)
    }

    pub fn generate_custom_token(&self, user_id: &str) -> Result<CustomToken, ApiError> {
        let response = self.send(self.client.build_generate_custom_token(user_id))?;
        self.client.parse_generate_custom_token(&response)
    }

    pub fn client_authenticate(
        &self,
        token: &CustomToken,
    ) -> Result<ClientAuthenticateResponse, ApiError> {
        let response = self.send(self.client.build_client_authenticate(token)?)?;
        self.client.parse_client_authenticate(&response)
    }

    pub fn client_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<ClientAuthenticateResponse, ApiError> {
        let response = self.send(self.client.build_client_refresh_token(refresh_token)?)?;
        self.client.parse_client_refresh_token(&response)
    }
}
