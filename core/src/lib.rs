//! Client SDK for the RBS product, search, stock and token services.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). `ServiceClient` composes the
//! two around an injected [`Transport`] for callers that want one call per
//! operation.
//!
//! # Design
//! - `RbsClient` is stateless: immutable configuration plus the resolved
//!   base URL.
//! - Each operation is split into `build_*` (produces request) and
//!   `parse_*` (consumes response), so the I/O boundary is explicit.
//! - Search filters are serialized by [`filter::filters_to_query_string`];
//!   the matching parser is exported for backends and tests.
//! - Two response dialects are unwrapped by [`envelope`]: the
//!   `{success, data, message}` envelope and plain status codes.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod filter;
pub mod http;
pub mod service;
pub mod token;
pub mod transport;
pub mod types;

pub use client::RbsClient;
pub use config::{Endpoint, RbsConfig, ServiceHosts};
pub use error::ApiError;
pub use filter::{DecodedFilter, Filter, FilterError, FilterOperator, FilterValue};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use service::ServiceClient;
pub use token::TokenPayload;
pub use transport::{Observer, TracingObserver, Transport, TransportError};
pub use types::{
    BulkUpdateItem, CategoryTree, ClientAuthenticateResponse, CustomToken, Product, ProductList,
    SearchInput, SearchInputBuilder, SearchResponse, ServiceResponse, SingleMerchantProductStock,
    SortOrder, StockItem, StockOperation, StockOperationResult,
};
