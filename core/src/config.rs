//! Client configuration and base URL resolution.

use std::fmt;

use serde::Deserialize;

pub const SERVICE_URL: &str = "https://rbs.rettermobile.com";
pub const SERVICE_URL_TEST: &str = "https://rbsmaintest.rettermobile.com";

/// Which RBS gateway the client talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    #[default]
    Server,
    Client,
}

impl Endpoint {
    pub fn as_str(self) -> &'static str {
        match self {
            Endpoint::Server => "server",
            Endpoint::Client => "client",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Production and test hosts used when no explicit `service_url` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceHosts {
    pub production: String,
    pub test: String,
}

impl Default for ServiceHosts {
    fn default() -> Self {
        Self {
            production: SERVICE_URL.to_string(),
            test: SERVICE_URL_TEST.to_string(),
        }
    }
}

impl ServiceHosts {
    /// Defaults, overridden by `SERVICE_URL` / `SERVICE_URL_TEST` when set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            production: lookup("SERVICE_URL")
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.production),
            test: lookup("SERVICE_URL_TEST")
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.test),
        }
    }
}

/// Immutable client configuration.
///
/// Field names deserialize from camelCase so existing JSON configuration
/// (`apiKey`, `merchantId`, `serviceUrl`, `enableLogs`, `testEnv`,
/// `endpoint`) can be loaded as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RbsConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub merchant_id: Option<String>,
    #[serde(default)]
    pub service_url: Option<String>,
    #[serde(default)]
    pub enable_logs: bool,
    #[serde(default)]
    pub test_env: bool,
    #[serde(default)]
    pub endpoint: Endpoint,
}

impl RbsConfig {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_merchant_id(mut self, merchant_id: impl Into<String>) -> Self {
        self.merchant_id = Some(merchant_id.into());
        self
    }

    pub fn with_service_url(mut self, service_url: impl Into<String>) -> Self {
        self.service_url = Some(service_url.into());
        self
    }

    pub fn with_test_env(mut self, test_env: bool) -> Self {
        self.test_env = test_env;
        self
    }

    pub fn with_logs(mut self, enable_logs: bool) -> Self {
        self.enable_logs = enable_logs;
        self
    }

    /// Explicit `service_url` wins; otherwise `<host>/<endpoint>`.
    pub fn base_url(&self, hosts: &ServiceHosts) -> String {
        if let Some(url) = self.service_url.as_deref().filter(|u| !u.is_empty()) {
            return url.trim_end_matches('/').to_string();
        }
        let host = if self.test_env {
            &hosts.test
        } else {
            &hosts.production
        };
        format!("{}/{}", host.trim_end_matches('/'), self.endpoint)
    }

    pub(crate) fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }

    pub(crate) fn merchant_id(&self) -> Option<&str> {
        self.merchant_id.as_deref().filter(|m| !m.is_empty())
    }
}
