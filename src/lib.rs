//! Rust library for controlling Sony Bravia networked televisions
//!
//! This library provides an async API for driving a Bravia TV over its
//! two HTTP control surfaces: the Scalar Web API (JSON-RPC over HTTP,
//! organized into sub-services such as system, appControl, avContent and
//! guide) and the legacy IRCC endpoint for simulated remote control
//! button presses. It supports:
//!
//! - Pairing with the on-screen code and persistent session cookies
//! - Remote control commands by normalized name
//! - Power status polling with change notifications
//! - Application listing and launching
//! - Playable source enumeration
//! - Scalar service introspection
//!
//! Network discovery is out of scope; the host hands over a
//! [`DeviceDescriptor`] with the two resolved control URLs.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//! use sony_bravia::{
//!     AuthOutcome, BraviaTv, DeviceDescriptor, MemoryCookieStore, SERVICE_IRCC, SERVICE_SCALAR,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let descriptor = DeviceDescriptor {
//!         friendly_name: "Living room TV".to_string(),
//!         id: "uuid:34567890-1234-1010-8000-544249abcdef".to_string(),
//!         services: BTreeMap::from([
//!             (SERVICE_SCALAR.to_string(), "http://192.168.1.40/sony".to_string()),
//!             (SERVICE_IRCC.to_string(), "http://192.168.1.40/sony/IRCC".to_string()),
//!         ]),
//!     };
//!
//!     let mut tv = BraviaTv::new(descriptor, Arc::new(MemoryCookieStore::new()))?;
//!
//!     // First call makes the TV show a pairing code, second call
//!     // exchanges it for a session cookie
//!     if tv.authenticate(None).await? == AuthOutcome::PairingRequired {
//!         tv.authenticate(Some("1234")).await?;
//!     }
//!
//!     // Watch power and authentication changes
//!     let mut updates = tv.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(update) = updates.recv().await {
//!             println!("State update: {:?}", update);
//!         }
//!     });
//!
//!     // Drive the TV
//!     tv.set_power(true).await?;
//!     tv.command("volume-up").await?;
//!     for app in tv.applications().await? {
//!         println!("{} -> {}", app.id, app.name);
//!     }
//!     tv.launch_application("netflix").await?;
//!
//!     tv.destroy().await;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! The library is organized into several layers:
//!
//! - **Controller**: [`BraviaTv`], the composed per-device handle
//! - **Session**: cookie ownership, auth-loss detection, persistence
//!   through a host-provided [`CookieStore`]
//! - **Rpc**: generic JSON-RPC caller for the scalar services
//! - **Ircc**: SOAP envelope relay for infrared command codes
//! - **Poller**: periodic power polling with edge-triggered events
//! - **Types**: domain types and data structures

mod apps;
mod commands;
mod controller;
mod error;
mod ircc;
mod poller;
mod protocol;
mod rpc;
mod session;
mod storage;
mod subscription;
mod types;

// Public exports
pub use controller::BraviaTv;
pub use error::{BraviaError, Result};
pub use storage::{CookieStore, MemoryCookieStore};
pub use subscription::{StateReceiver, StateUpdate};
pub use types::{
    Application, AuthOutcome, DeviceDescriptor, MethodSignature, ServiceInspection, Source,
    SERVICE_IRCC, SERVICE_SCALAR,
};
