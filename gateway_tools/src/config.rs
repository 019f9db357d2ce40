use log::*;
use mpg_common::{parse_boolean_flag, Secret};

pub const DEFAULT_GATEWAY_BASE_URL: &str = "https://app.sandbox.midtrans.com";

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub server_key: Secret<String>,
    /// If the gateway cannot be reached at all, hand out a mock session instead of failing the request.
    pub fallback_to_mock: bool,
    pub verify_signatures: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GATEWAY_BASE_URL.to_string(),
            server_key: Secret::default(),
            fallback_to_mock: false,
            verify_signatures: true,
        }
    }
}

impl GatewayConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("MPG_GATEWAY_BASE_URL").unwrap_or_else(|_| {
            info!("🪛️ MPG_GATEWAY_BASE_URL not set, using {DEFAULT_GATEWAY_BASE_URL}");
            DEFAULT_GATEWAY_BASE_URL.to_string()
        });
        let server_key = Secret::new(std::env::var("MPG_GATEWAY_SERVER_KEY").unwrap_or_else(|_| {
            warn!("🪛️ MPG_GATEWAY_SERVER_KEY not set. Payment sessions will be MOCKED.");
            String::default()
        }));
        let fallback_to_mock = parse_boolean_flag(std::env::var("MPG_GATEWAY_FALLBACK_TO_MOCK").ok(), false);
        let verify_signatures = parse_boolean_flag(std::env::var("MPG_GATEWAY_VERIFY_SIGNATURES").ok(), true);
        Self { base_url, server_key, fallback_to_mock, verify_signatures }
    }

    /// True if a usable (non-placeholder) server key has been supplied.
    pub fn is_configured(&self) -> bool {
        !is_placeholder_key(self.server_key.reveal())
    }
}

/// Recognises the dummy keys that ship in sample configuration files.
pub fn is_placeholder_key(key: &str) -> bool {
    let key = key.trim();
    key.is_empty() ||
        key.to_ascii_uppercase().contains("PLACEHOLDER") ||
        (key.starts_with("YOUR_") && key.ends_with("_HERE"))
}
