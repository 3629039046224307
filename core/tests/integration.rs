//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then exercises every
//! `ServiceClient` operation over real HTTP, with ureq as the transport.
//! Validates that request building, the wire format and response parsing
//! agree with the backend's routes.

use std::net::SocketAddr;

use mock_server::{AppState, Catalog};
use rbs_core::filter::parse_filters;
use rbs_core::{
    ApiError, DecodedFilter, Endpoint, Filter, HttpMethod, HttpRequest, HttpResponse, RbsConfig,
    SearchInput, ServiceClient, StockOperation, Transport, TransportError,
};

/// Executes requests with ureq.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses are returned as data rather than `Err`, letting the core
/// client handle status interpretation.
struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, req: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let result = match (req.method, req.body.as_deref()) {
            (HttpMethod::Get, _) => self.agent.get(&req.url).call(),
            (HttpMethod::Post, Some(body)) => self
                .agent
                .post(&req.url)
                .content_type("application/json")
                .send(body.as_bytes()),
            (HttpMethod::Post, None) => self.agent.post(&req.url).send_empty(),
        };
        let mut response = result.map_err(|e| TransportError::new(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response.body_mut().read_to_string().unwrap_or_default();
        Ok(HttpResponse::new(status, body))
    }
}

fn spawn_server(state: AppState) -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with_state(listener, state).await
        })
        .unwrap();
    });
    addr
}

fn config(addr: SocketAddr) -> RbsConfig {
    RbsConfig::new(Endpoint::Server).with_service_url(format!("http://{addr}/server"))
}

#[test]
fn catalog_and_search_lifecycle() {
    let addr = spawn_server(AppState::new(Catalog::seeded(), None));
    let service = ServiceClient::new(config(addr), UreqTransport::new());

    // Step 1: categories are localized.
    let tree = service.get_categories(Some("tr_TR")).unwrap();
    assert_eq!(tree.culture(), Some("tr_TR"));

    // Step 2: search with filters; the backend sees the structural form.
    let filters = vec![
        Filter::eq("name", "a;b").unwrap(),
        Filter::range("price", 10, 200).unwrap(),
        Filter::one_of("size", ["42", "43"]).unwrap(),
    ];
    let input = SearchInput::builder()
        .user_id("u1")
        .filters(filters.clone())
        .in_stock(true)
        .build()
        .unwrap();
    let result = service.search(&input).unwrap();
    assert_eq!(result.total(), Some(3));
    let applied = result.get_str("appliedFilters").unwrap();
    let expected: Vec<DecodedFilter> = filters.iter().map(DecodedFilter::from).collect();
    assert_eq!(parse_filters(applied).unwrap(), expected);

    // Step 3: aggregation endpoint.
    let aggs = SearchInput::builder().user_id("u1").aggs(true).build().unwrap();
    let result = service.search(&aggs).unwrap();
    assert_eq!(result.get("aggregations").unwrap()["categoryId"]["shoes"], 2);

    // Step 4: single product, scoped to a merchant.
    let product = service.get_product("p1", None, Some("m1")).unwrap();
    assert_eq!(product.id(), Some("p1"));
    assert_eq!(product.get_str("name"), Some("Running Shoe"));

    // Step 5: missing product is a backend rejection.
    let err = service.get_product("nope", None, None).unwrap_err();
    assert!(matches!(&err, ApiError::Rejected { message } if message == "Product not found"));

    // Step 6: multiple products.
    let products = service.get_multiple_products(&["p1", "p3"], None).unwrap();
    let ids: Vec<_> = products.iter().filter_map(|p| p.id()).collect();
    assert_eq!(ids, vec!["p1", "p3"]);

    // Step 7: curated list, in stock only.
    let list = service.get_list_products("summer", None, true).unwrap();
    assert_eq!(list.get("products").unwrap().as_array().unwrap().len(), 2);
}

#[test]
fn stock_lifecycle() {
    let addr = spawn_server(AppState::new(Catalog::seeded(), None));

    // Without a merchant the write never leaves the client.
    let anonymous = ServiceClient::new(config(addr), UreqTransport::new());
    let ops = [StockOperation::new("p1").with_stock("42", 3)];
    let err = anonymous.execute_stock_operation(&ops, true, false).unwrap_err();
    assert!(matches!(err, ApiError::Configuration(_)));

    let service = ServiceClient::new(config(addr).with_merchant_id("m1"), UreqTransport::new());

    // Dry run leaves stock unchanged.
    let result = service.execute_stock_operation(&ops, true, true).unwrap();
    assert_eq!(result.simulated(), Some(true));
    let stock = service.get_product_stock("p1", "m1", "42").unwrap();
    assert_eq!(stock.qty(), Some(5));

    // Applied write.
    let result = service.execute_stock_operation(&ops, true, false).unwrap();
    assert_eq!(result.simulated(), Some(false));
    let stock = service.get_product_stock("p1", "m1", "42").unwrap();
    assert_eq!(stock.qty(), Some(2));

    // Overdraw is rejected with the backend's message.
    let err = service.execute_stock_operation(&ops, true, false).unwrap_err();
    assert_eq!(err.to_string(), "Insufficient stock for p1/42");

    // Bulk update, then read back by merchant.
    let item = serde_json::from_value(serde_json::json!({
        "productId": "p4", "merchantId": "m1", "variant": "42", "qty": 9
    }))
    .unwrap();
    assert!(service.update_merchant_data(&[item]).unwrap());
    let stocks = service.get_product_stock_by_merchant("m1", "42").unwrap();
    let p4 = stocks.iter().find(|s| s.product_id() == Some("p4")).unwrap();
    assert_eq!(p4.qty(), Some(9));
}

#[test]
fn token_lifecycle() {
    let addr = spawn_server(AppState::new(Catalog::seeded(), None));
    let service = ServiceClient::new(config(addr), UreqTransport::new());

    let custom = service.generate_custom_token("u1").unwrap();
    let claims = service.token_payload(&custom.custom_token).unwrap();
    assert_eq!(claims.user_id, "u1");
    assert_eq!(claims.project_id, mock_server::PROJECT_ID);
    assert!(claims.exp > claims.iat);

    let session = service.client_authenticate(&custom).unwrap();
    let access = service.token_payload(&session.access_token).unwrap();
    assert_eq!(access.user_id, "u1");

    let renewed = service.client_refresh_token(&session.refresh_token).unwrap();
    assert_ne!(renewed.refresh_token, session.refresh_token);

    let err = service
        .client_refresh_token(&session.refresh_token)
        .unwrap_err();
    assert!(matches!(&err, ApiError::Rejected { message } if message == "Invalid refresh token"));
}

#[test]
fn api_key_is_sent_where_required() {
    let addr = spawn_server(AppState::new(Catalog::seeded(), Some("k")));

    let keyless = ServiceClient::new(config(addr), UreqTransport::new());
    let err = keyless.get_categories(None).unwrap_err();
    assert!(matches!(&err, ApiError::Rejected { message } if message == "Unauthorized"));

    let keyed = ServiceClient::new(config(addr).with_api_key("k"), UreqTransport::new());
    keyed.get_categories(None).unwrap();
    let custom = keyed.generate_custom_token("u1").unwrap();
    // authenticate and refresh go out without the key and still succeed
    let session = keyed.client_authenticate(&custom).unwrap();
    keyed.client_refresh_token(&session.refresh_token).unwrap();
}

#[test]
fn unreachable_backend_is_a_transport_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let service = ServiceClient::new(config(addr), UreqTransport::new());
    let err = service.get_categories(None).unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}
