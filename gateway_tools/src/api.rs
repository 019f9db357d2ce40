use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::GatewayConfig,
    data_objects::{SnapSession, SnapTransactionRequest},
    GatewayApiError,
};

#[derive(Clone)]
pub struct GatewayApi {
    config: GatewayConfig,
    client: Arc<Client>,
}

impl GatewayApi {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| GatewayApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, GatewayApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        // The server key is the basic-auth username with an empty password
        let mut req = self.client.request(method, url).basic_auth(self.config.server_key.reveal(), Some(""));
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                GatewayApiError::Unreachable(e.to_string())
            } else {
                GatewayApiError::RestResponseError(e.to_string())
            }
        })?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| GatewayApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| GatewayApiError::RestResponseError(e.to_string()))?;
            Err(GatewayApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Opens a hosted checkout session for the given transaction.
    pub async fn create_transaction(&self, request: &SnapTransactionRequest) -> Result<SnapSession, GatewayApiError> {
        let txid = &request.transaction_details.order_id;
        debug!("💳️ Requesting payment session for {txid}");
        let session = self
            .rest_query::<SnapSession, &SnapTransactionRequest>(Method::POST, "/snap/v1/transactions", Some(request))
            .await?;
        info!("💳️ Payment session created for {txid}");
        Ok(session)
    }
}
