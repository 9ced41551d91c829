use crate::error::{BraviaError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request id used for regular scalar calls
///
/// The firmware echoes the id back but correlates nothing over it, so a
/// fixed small integer is what every Bravia client sends.
pub(crate) const SCALAR_REQUEST_ID: u32 = 2;

/// Request id used for the actRegister pairing call
pub(crate) const REGISTER_REQUEST_ID: u32 = 1;

/// JSON-RPC request envelope for the scalar service family
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RpcRequest {
    pub id: u32,
    pub method: String,
    pub version: String,
    pub params: Value,
}

impl RpcRequest {
    /// Create a request envelope for the given method and version
    ///
    /// A params value that is not already an array is wrapped in a
    /// one-element array, the shape every scalar service expects.
    pub fn new(method: impl Into<String>, version: impl Into<String>, params: Value) -> Self {
        Self {
            id: SCALAR_REQUEST_ID,
            method: method.into(),
            version: version.into(),
            params: wrap_params(params),
        }
    }
}

/// Wrap a bare params object in the array the wire format requires
pub(crate) fn wrap_params(params: Value) -> Value {
    match params {
        Value::Array(_) => params,
        other => Value::Array(vec![other]),
    }
}

/// JSON-RPC response envelope
///
/// Depending on firmware generation the payload arrives under `result` or
/// `results`; both are accepted.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RpcEnvelope {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub results: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl RpcEnvelope {
    /// Unwrap the payload, surfacing a device-reported error verbatim
    pub fn into_result(self) -> Result<Value> {
        if let Some(error) = self.error {
            return Err(BraviaError::Remote { error });
        }
        self.result
            .or(self.results)
            .ok_or_else(|| BraviaError::InvalidResponse("no result in response".to_string()))
    }
}

/// One remote controller command as reported by getRemoteControllerInfo
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RemoteCommandInfo {
    pub name: String,
    pub value: String,
}

/// One application entry as reported by getApplicationList
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawApplication {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub icon: Option<String>,
    pub uri: String,
}

/// One scheme entry as reported by getSchemeList
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SchemeEntry {
    pub scheme: String,
}
