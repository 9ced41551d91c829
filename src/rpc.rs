use crate::error::{BraviaError, Result};
use crate::protocol::{RpcEnvelope, RpcRequest};
use crate::session::Session;
use serde_json::Value;
use std::sync::Arc;

/// Generic caller for the scalar service family
///
/// Each scalar sub-service (system, appControl, avContent, guide, ...)
/// lives under its own path below the control URL and speaks the same
/// JSON-RPC envelope. This layer performs no retries; callers decide
/// retry policy.
pub(crate) struct RpcClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<Session>,
}

impl RpcClient {
    pub fn new(http: reqwest::Client, base_url: String, session: Arc<Session>) -> Self {
        Self {
            http,
            base_url,
            session,
        }
    }

    /// POST one JSON-RPC envelope to `{base}/{service}` and unwrap the result
    ///
    /// A `params` value that is not already an array is wrapped in a
    /// one-element array. The payload comes back from either the `result`
    /// or `results` key; a device-reported `error` field fails with the
    /// payload preserved verbatim.
    pub async fn call(
        &self,
        service: &str,
        method: &str,
        version: &str,
        params: Value,
    ) -> Result<Value> {
        let request = RpcRequest::new(method, version, params);
        tracing::debug!(service, method, "scalar call");

        let response = self
            .session
            .decorate(self.http.post(format!("{}/{}", self.base_url, service)))
            .json(&request)
            .send()
            .await?;
        let response = check_status(&self.session, response)?;

        let envelope: RpcEnvelope = response.json().await?;
        envelope.into_result()
    }
}

/// Shared non-success handling for the scalar and IRCC paths
///
/// A 403 means the TV no longer honors our cookie: the session is dropped
/// (firing the auth-lost notification once) and the call fails as
/// unauthenticated. Any other non-2xx status is surfaced as-is.
pub(crate) fn check_status(
    session: &Session,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == reqwest::StatusCode::FORBIDDEN {
        tracing::warn!("TV rejected session cookie");
        session.invalidate();
        return Err(BraviaError::NotAuthenticated);
    }
    Err(BraviaError::Status { status })
}
