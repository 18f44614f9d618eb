//! Supplier gateway client
//!
//! The gateway fronts portal automation (login, pagination) and the catalog
//! store. One client serves the auth, extraction and persistence ports.
//!
//! Endpoints:
//! - `POST {base}/suppliers/{supplier}/session`  -> `Session`
//! - `POST {base}/suppliers/{supplier}/extract`  -> `ExtractionResult` (bearer session token)
//! - `POST {base}/suppliers/{supplier}/products`  (extraction result body)

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{AuthPort, ExtractionPort, PersistencePort};
use crate::domains::sync::errors::SyncError;
use crate::domains::sync::models::{ExtractionParams, ExtractionResult, Session};

#[derive(Debug, Clone, Copy)]
enum Step {
    Auth,
    Extract,
    Persist,
}

impl Step {
    fn error(self, supplier: &str, message: String) -> SyncError {
        match self {
            Step::Auth => SyncError::auth(supplier, message),
            Step::Extract => SyncError::extraction(supplier, message),
            Step::Persist => SyncError::persist(supplier, message),
        }
    }
}

/// Client request timeouts sit under the activity timeout; extraction gets a
/// longer budget since the gateway paginates synchronously.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const EXTRACT_TIMEOUT: Duration = Duration::from_secs(9 * 60);

#[derive(Clone)]
pub struct SupplierGatewayClient {
    base_url: String,
    http_client: Arc<reqwest::Client>,
}

impl SupplierGatewayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client: Arc::new(reqwest::Client::new()),
        }
    }

    fn url(&self, supplier: &str, endpoint: &str) -> String {
        format!("{}/suppliers/{}/{}", self.base_url, supplier, endpoint)
    }

    async fn post<Req, Res>(
        &self,
        step: Step,
        supplier: &str,
        endpoint: &str,
        body: &Req,
        bearer: Option<&str>,
        timeout: Duration,
    ) -> Result<Res, SyncError>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let response = self.send(step, supplier, endpoint, body, bearer, timeout).await?;
        response
            .json()
            .await
            .map_err(|e| step.error(supplier, format!("invalid {} response: {}", endpoint, e)))
    }

    async fn send<Req>(
        &self,
        step: Step,
        supplier: &str,
        endpoint: &str,
        body: &Req,
        bearer: Option<&str>,
        timeout: Duration,
    ) -> Result<reqwest::Response, SyncError>
    where
        Req: Serialize + ?Sized,
    {
        let url = self.url(supplier, endpoint);
        tracing::debug!(supplier, url = %url, "calling supplier gateway");

        let mut request = self.http_client.post(&url).timeout(timeout).json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| step.error(supplier, format!("gateway unreachable: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        let error = step.error(supplier, format!("gateway returned {}: {}", status, body));
        Err(if is_permanent(status) {
            error.permanent()
        } else {
            error
        })
    }
}

/// 4xx responses other than timeout and throttling will not change on retry.
fn is_permanent(status: StatusCode) -> bool {
    status.is_client_error()
        && status != StatusCode::REQUEST_TIMEOUT
        && status != StatusCode::TOO_MANY_REQUESTS
}

#[async_trait]
impl AuthPort for SupplierGatewayClient {
    async fn authenticate(&self, supplier: &str) -> Result<Session, SyncError> {
        self.post(
            Step::Auth,
            supplier,
            "session",
            &serde_json::json!({}),
            None,
            REQUEST_TIMEOUT,
        )
        .await
    }
}

#[async_trait]
impl ExtractionPort for SupplierGatewayClient {
    async fn extract(
        &self,
        session: &Session,
        params: &ExtractionParams,
    ) -> Result<ExtractionResult, SyncError> {
        self.post(
            Step::Extract,
            &params.supplier,
            "extract",
            params,
            Some(&session.token),
            EXTRACT_TIMEOUT,
        )
        .await
    }
}

#[async_trait]
impl PersistencePort for SupplierGatewayClient {
    async fn persist(&self, supplier: &str, result: &ExtractionResult) -> Result<(), SyncError> {
        self.send(
            Step::Persist,
            supplier,
            "products",
            result,
            None,
            REQUEST_TIMEOUT,
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttling_and_timeouts_stay_retryable() {
        assert!(is_permanent(StatusCode::UNAUTHORIZED));
        assert!(is_permanent(StatusCode::NOT_FOUND));
        assert!(!is_permanent(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_permanent(StatusCode::REQUEST_TIMEOUT));
        assert!(!is_permanent(StatusCode::BAD_GATEWAY));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = SupplierGatewayClient::new("http://gateway.local/");
        assert_eq!(
            client.url("acme", "session"),
            "http://gateway.local/suppliers/acme/session"
        );
    }
}
