use crate::apps::ApplicationCatalog;
use crate::commands::CommandTable;
use crate::error::{BraviaError, Result};
use crate::ircc::IrccSender;
use crate::poller::PowerPoller;
use crate::protocol::{RpcRequest, SchemeEntry, REGISTER_REQUEST_ID};
use crate::rpc::RpcClient;
use crate::session::Session;
use crate::storage::CookieStore;
use crate::subscription::{StateReceiver, StateUpdate};
use crate::types::{
    Application, AuthOutcome, DeviceDescriptor, Endpoints, MethodSignature, ServiceInspection,
    Source,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::broadcast;

const CLIENT_ID: &str = "sony-bravia";
const CLIENT_NICKNAME: &str = "Sony Bravia controller";
const EVENT_CAPACITY: usize = 100;

/// Controller for one Bravia television
///
/// Composes the session, the scalar RPC caller, the IRCC sender, the
/// power poller, the command table and the application catalog behind a
/// single handle. Construction starts the power poller and kicks off the
/// command table fetch; [`destroy`](BraviaTv::destroy) releases the poll
/// task.
pub struct BraviaTv {
    descriptor: DeviceDescriptor,
    endpoints: Endpoints,
    http: reqwest::Client,
    session: Arc<Session>,
    rpc: Arc<RpcClient>,
    ircc: IrccSender,
    commands: Arc<CommandTable>,
    apps: ApplicationCatalog,
    poller: PowerPoller,
    events: broadcast::Sender<StateUpdate>,
}

impl BraviaTv {
    /// Build a controller for the descriptor's control endpoints
    ///
    /// Fails if the descriptor lacks the scalar or IRCC endpoint. A
    /// cookie previously stored for this device is loaded from the store,
    /// so a paired TV is usable without re-authenticating.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(descriptor: DeviceDescriptor, store: Arc<dyn CookieStore>) -> Result<Self> {
        let endpoints = Endpoints::from_descriptor(&descriptor)?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let http = reqwest::Client::new();

        let session = Arc::new(Session::new(
            descriptor.id.clone(),
            store.clone(),
            events.clone(),
        ));
        if let Some(cookie) = store.load(&descriptor.id) {
            session.set_cookie(Some(cookie));
        }

        let rpc = Arc::new(RpcClient::new(
            http.clone(),
            endpoints.scalar.clone(),
            session.clone(),
        ));
        let ircc = IrccSender::new(http.clone(), endpoints.ircc.clone(), session.clone());
        let commands = Arc::new(CommandTable::new());
        let apps = ApplicationCatalog::new();
        let poller = PowerPoller::start(rpc.clone(), events.clone());

        // Load the command list without holding up construction; until it
        // lands, command() fails as not-ready
        let table = commands.clone();
        let table_rpc = rpc.clone();
        tokio::spawn(async move {
            if let Err(e) = table.populate(&table_rpc).await {
                tracing::warn!("failed to load remote command list: {}", e);
            }
        });

        tracing::info!(
            name = %descriptor.friendly_name,
            id = %descriptor.id,
            "controller created"
        );

        Ok(Self {
            descriptor,
            endpoints,
            http,
            session,
            rpc,
            ircc,
            commands,
            apps,
            poller,
            events,
        })
    }

    /// Name the TV announces on the network
    pub fn friendly_name(&self) -> &str {
        &self.descriptor.friendly_name
    }

    /// Unique device identifier from the descriptor
    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    /// Last observed power state; `false` until the first poll lands
    pub fn power(&self) -> bool {
        self.poller.power()
    }

    /// Whether a session cookie is currently held
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Subscribe to power and authentication state changes
    pub fn subscribe(&self) -> StateReceiver {
        StateReceiver::new(self.events.subscribe())
    }

    // ========== Pairing ==========

    /// Pair with the TV
    ///
    /// Called without a code, this asks the TV to display a pairing code
    /// on screen and returns [`AuthOutcome::PairingRequired`]. Called
    /// again with that code, a successful exchange stores the session
    /// cookie and returns [`AuthOutcome::Authenticated`]; a rejected code
    /// fails with [`BraviaError::PairingRejected`].
    pub async fn authenticate(&self, code: Option<&str>) -> Result<AuthOutcome> {
        let request = RpcRequest {
            id: REGISTER_REQUEST_ID,
            method: "actRegister".to_string(),
            version: "1.0".to_string(),
            params: json!([
                {
                    "clientid": CLIENT_ID,
                    "nickname": CLIENT_NICKNAME,
                    "level": "private"
                },
                [
                    { "value": "yes", "function": "WOL" }
                ]
            ]),
        };

        let mut builder = self
            .http
            .post(format!("{}/accessControl", self.endpoints.scalar))
            .json(&request);
        if let Some(code) = code {
            let credentials = BASE64.encode(format!(":{}", code));
            builder = builder.header(
                reqwest::header::AUTHORIZATION,
                format!("Basic {}", credentials),
            );
        }
        let response = builder.send().await?;

        if !response.status().is_success() {
            if code.is_none() {
                // Pairing has not been completed yet, the TV is now
                // showing the code to enter
                return Ok(AuthOutcome::PairingRequired);
            }
            return Err(BraviaError::PairingRejected);
        }

        let cookie = response
            .headers()
            .get(reqwest::header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .map(cookie_prefix);

        match cookie {
            Some(cookie) => {
                tracing::info!(id = %self.descriptor.id, "paired with TV");
                self.session.set_cookie(Some(cookie));
                Ok(AuthOutcome::Authenticated)
            }
            None => Ok(AuthOutcome::PairingRequired),
        }
    }

    // ========== Remote control commands ==========

    /// Send a named remote control command over IRCC
    pub async fn command(&self, name: &str) -> Result<()> {
        let code = self.commands.lookup(name)?;
        self.ircc.send(&code).await
    }

    /// Names of all supported remote control commands, sorted
    ///
    /// Empty until the command table has been fetched.
    pub fn commands(&self) -> Vec<String> {
        self.commands.names()
    }

    // ========== Power ==========

    /// Switch the TV on or off
    ///
    /// On success the local power state is updated immediately rather
    /// than waiting for the next poll tick.
    pub async fn set_power(&self, power: bool) -> Result<()> {
        self.rpc
            .call("system", "setPowerStatus", "1.0", json!({ "status": power }))
            .await?;
        self.poller.observe(power);
        Ok(())
    }

    // ========== Applications ==========

    /// List the launchable applications
    ///
    /// Fetched once and cached for the controller's lifetime; an app
    /// installed on the TV afterwards is not picked up.
    pub async fn applications(&self) -> Result<Vec<Application>> {
        self.apps.list(&self.rpc).await
    }

    /// Launch an application by catalog id
    ///
    /// Returns `Ok(false)` when no application carries that id.
    pub async fn launch_application(&self, id: &str) -> Result<bool> {
        self.apps.launch(&self.rpc, id).await
    }

    // ========== Content ==========

    /// What the TV is currently playing, as reported by the firmware
    pub async fn playing_content_info(&self) -> Result<Value> {
        self.rpc
            .call("avContent", "getPlayingContentInfo", "1.0", json!({}))
            .await
    }

    /// All playable sources across every scheme
    ///
    /// The TV's embedded HTTP server mishandles request bursts, so the
    /// per-scheme lookups run strictly one after another.
    pub async fn sources(&self) -> Result<Vec<Source>> {
        let schemes = self
            .rpc
            .call("avContent", "getSchemeList", "1.0", json!([]))
            .await?;
        let schemes: Vec<SchemeEntry> =
            serde_json::from_value(schemes.get(0).cloned().unwrap_or_else(|| json!([])))?;

        let mut sources = Vec::new();
        for entry in schemes {
            let result = self
                .rpc
                .call(
                    "avContent",
                    "getSourceList",
                    "1.0",
                    json!({ "scheme": entry.scheme }),
                )
                .await?;
            let batch: Vec<Source> =
                serde_json::from_value(result.get(0).cloned().unwrap_or_else(|| json!([])))?;
            sources.extend(batch);
        }
        Ok(sources)
    }

    // ========== Service introspection ==========

    /// Walk every scalar service the guide endpoint advertises and
    /// collect its method signatures
    ///
    /// Runs strictly sequentially for the same reason as
    /// [`sources`](BraviaTv::sources). A service whose walk fails is
    /// reported as [`ServiceInspection::Unavailable`] instead of aborting
    /// the whole inspection.
    pub async fn inspect_services(&self) -> Result<BTreeMap<String, ServiceInspection>> {
        let protocols = self
            .rpc
            .call("guide", "getServiceProtocols", "1.0", json!([]))
            .await?;
        let protocols = protocols.as_array().cloned().unwrap_or_default();

        let mut inspections = BTreeMap::new();
        for protocol in protocols {
            let Some(service) = protocol.get(0).and_then(|entry| entry.as_str()) else {
                continue;
            };
            let inspection = match self.inspect_service(service).await {
                Ok(methods) => ServiceInspection::Methods(methods),
                Err(e) => {
                    tracing::debug!(service, "service inspection failed: {}", e);
                    ServiceInspection::Unavailable
                }
            };
            inspections.insert(service.to_string(), inspection);
        }
        Ok(inspections)
    }

    async fn inspect_service(&self, service: &str) -> Result<Vec<MethodSignature>> {
        let versions = self.rpc.call(service, "getVersions", "1.0", json!([])).await?;
        let versions: Vec<String> =
            serde_json::from_value(versions.get(0).cloned().unwrap_or_else(|| json!([])))?;

        let mut methods = Vec::new();
        for version in versions {
            let result = self
                .rpc
                .call(service, "getMethodTypes", "1.0", json!([version.clone()]))
                .await?;
            for entry in result.as_array().into_iter().flatten() {
                let Some(name) = entry.get(0).and_then(|name| name.as_str()) else {
                    continue;
                };
                methods.push(MethodSignature {
                    name: name.to_string(),
                    version: version.clone(),
                    arguments: entry.get(1).cloned().unwrap_or(Value::Null),
                    return_type: entry.get(2).cloned().unwrap_or(Value::Null),
                });
            }
        }
        Ok(methods)
    }

    // ========== Teardown ==========

    /// Release the poll task
    ///
    /// Call once when the device goes away; the controller makes no
    /// further unsolicited requests afterwards.
    pub async fn destroy(&mut self) {
        tracing::info!(id = %self.descriptor.id, "destroying controller");
        self.poller.stop().await;
    }
}

/// Everything up to the first `;` of a Set-Cookie header, i.e. the
/// name=value pair without its attributes
fn cookie_prefix(header: &str) -> String {
    header.split(';').next().unwrap_or(header).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_prefix_drops_attributes() {
        assert_eq!(cookie_prefix("auth=abc123; Path=/; Max-Age=1209600"), "auth=abc123");
        assert_eq!(cookie_prefix("auth=abc123"), "auth=abc123");
    }

    #[test]
    fn pairing_code_is_basic_encoded_with_empty_user() {
        let credentials = BASE64.encode(format!(":{}", "1234"));
        assert_eq!(credentials, "OjEyMzQ=");
    }
}
