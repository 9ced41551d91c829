use crate::error::{BraviaError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Service name the scalar control URL is registered under
pub const SERVICE_SCALAR: &str = "scalar";

/// Service name the IRCC control URL is registered under
pub const SERVICE_IRCC: &str = "ircc";

/// Description of a television as handed over by the discovery layer
///
/// The discovery protocol itself is out of scope for this crate; whatever
/// implements it provides the friendly name, the unique device identifier
/// and the resolved control URLs keyed by service name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Human-readable name the TV announces
    pub friendly_name: String,

    /// Unique device identifier (typically the UPnP UDN)
    pub id: String,

    /// Control URLs keyed by service name, see [`SERVICE_SCALAR`] and
    /// [`SERVICE_IRCC`]
    pub services: BTreeMap<String, String>,
}

/// Resolved control endpoint pair, fixed for the controller's lifetime
#[derive(Debug, Clone)]
pub(crate) struct Endpoints {
    pub scalar: String,
    pub ircc: String,
}

impl Endpoints {
    /// Pull the two required control URLs out of a descriptor
    ///
    /// A TV that does not expose both services cannot be driven and is
    /// rejected here.
    pub fn from_descriptor(descriptor: &DeviceDescriptor) -> Result<Self> {
        let scalar = descriptor
            .services
            .get(SERVICE_SCALAR)
            .ok_or(BraviaError::MissingService(SERVICE_SCALAR))?;
        let ircc = descriptor
            .services
            .get(SERVICE_IRCC)
            .ok_or(BraviaError::MissingService(SERVICE_IRCC))?;

        Ok(Self {
            scalar: scalar.trim_end_matches('/').to_string(),
            ircc: ircc.clone(),
        })
    }
}

/// A launchable application installed on the TV
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Application {
    /// Stable identifier derived from the title, unique within one fetch
    pub id: String,

    /// Application title with HTML entities decoded
    pub name: String,

    /// Icon URL, when the TV reports one
    pub icon: Option<String>,

    /// Opaque launch URI understood by `appControl.setActiveApp`
    pub uri: String,
}

/// One playable content source, e.g. `tv:dvbt` or `extInput:hdmi`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub source: String,

    /// Whatever else the firmware reports alongside the source string
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Signature of one scalar service method
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodSignature {
    pub name: String,
    pub version: String,

    /// Argument type descriptions as the TV reports them
    pub arguments: Value,

    /// Return type description as the TV reports it
    pub return_type: Value,
}

/// Outcome of walking one scalar service during inspection
#[derive(Debug, Clone)]
pub enum ServiceInspection {
    /// The service answered with its method signatures
    Methods(Vec<MethodSignature>),

    /// The version or method walk failed for this service
    Unavailable,
}

impl ServiceInspection {
    /// Whether the walk produced method signatures
    pub fn is_available(&self) -> bool {
        matches!(self, ServiceInspection::Methods(_))
    }
}

impl fmt::Display for ServiceInspection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceInspection::Methods(methods) => write!(f, "{} methods", methods.len()),
            ServiceInspection::Unavailable => write!(f, "Could not fetch methods"),
        }
    }
}

/// Outcome of a pairing attempt
///
/// Pairing is a two-step exchange: an initial request makes the TV show a
/// code on screen, a second request carries that code and yields the
/// session cookie. Both `PairingRequired` outcomes are successes, not
/// errors; only a rejected code fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Pairing completed and the session cookie was stored
    Authenticated,

    /// The TV is showing (or wants to show) a code the user must enter
    PairingRequired,
}

impl fmt::Display for AuthOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthOutcome::Authenticated => write!(f, "Authenticated with TV"),
            AuthOutcome::PairingRequired => {
                write!(f, "Call authenticate with code displayed on TV")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(services: &[(&str, &str)]) -> DeviceDescriptor {
        DeviceDescriptor {
            friendly_name: "Living room TV".to_string(),
            id: "uuid:0000-0001".to_string(),
            services: services
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn endpoints_resolve_from_descriptor() {
        let d = descriptor(&[
            (SERVICE_SCALAR, "http://10.0.0.2/sony/"),
            (SERVICE_IRCC, "http://10.0.0.2/sony/IRCC"),
        ]);
        let endpoints = Endpoints::from_descriptor(&d).unwrap();
        assert_eq!(endpoints.scalar, "http://10.0.0.2/sony");
        assert_eq!(endpoints.ircc, "http://10.0.0.2/sony/IRCC");
    }

    #[test]
    fn missing_ircc_endpoint_is_rejected() {
        let d = descriptor(&[(SERVICE_SCALAR, "http://10.0.0.2/sony")]);
        match Endpoints::from_descriptor(&d) {
            Err(BraviaError::MissingService(name)) => assert_eq!(name, SERVICE_IRCC),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn missing_scalar_endpoint_is_rejected() {
        let d = descriptor(&[(SERVICE_IRCC, "http://10.0.0.2/sony/IRCC")]);
        assert!(matches!(
            Endpoints::from_descriptor(&d),
            Err(BraviaError::MissingService(SERVICE_SCALAR))
        ));
    }

    #[test]
    fn auth_outcome_messages() {
        assert_eq!(AuthOutcome::Authenticated.to_string(), "Authenticated with TV");
        assert_eq!(
            AuthOutcome::PairingRequired.to_string(),
            "Call authenticate with code displayed on TV"
        );
    }
}
