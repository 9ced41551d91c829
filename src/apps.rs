use crate::error::Result;
use crate::protocol::RawApplication;
use crate::rpc::RpcClient;
use crate::types::Application;
use serde_json::json;
use std::collections::BTreeSet;
use tokio::sync::Mutex;

/// Launchable application catalog
///
/// The list is fetched from `appControl.getApplicationList` on first use
/// and memoized for the controller's lifetime; there is no refresh. The
/// async mutex keeps concurrent first calls from fetching twice.
pub(crate) struct ApplicationCatalog {
    apps: Mutex<Option<Vec<Application>>>,
}

impl ApplicationCatalog {
    pub fn new() -> Self {
        Self {
            apps: Mutex::new(None),
        }
    }

    /// Return the cached application list, fetching it on first use
    pub async fn list(&self, rpc: &RpcClient) -> Result<Vec<Application>> {
        let mut apps = self.apps.lock().await;
        if let Some(cached) = apps.as_ref() {
            return Ok(cached.clone());
        }

        let result = rpc
            .call("appControl", "getApplicationList", "1.0", json!([]))
            .await?;
        let raw: Vec<RawApplication> =
            serde_json::from_value(result.get(0).cloned().unwrap_or_else(|| json!([])))?;

        let list = assign_ids(raw);
        tracing::debug!(applications = list.len(), "application list loaded");
        *apps = Some(list.clone());
        Ok(list)
    }

    /// Launch the application with the given id
    ///
    /// Returns `Ok(false)` when no application carries that id; this is a
    /// lookup miss, not a failure.
    pub async fn launch(&self, rpc: &RpcClient, id: &str) -> Result<bool> {
        let apps = self.list(rpc).await?;
        let Some(app) = apps.iter().find(|app| app.id == id) else {
            return Ok(false);
        };

        rpc.call(
            "appControl",
            "setActiveApp",
            "1.0",
            json!({ "uri": app.uri, "data": null }),
        )
        .await?;
        Ok(true)
    }
}

/// Transform raw entries into applications with unique ids
///
/// The id is the decoded title with whitespace runs replaced by hyphens,
/// lowercased; a collision within this fetch appends underscores until
/// the id is free.
fn assign_ids(raw: Vec<RawApplication>) -> Vec<Application> {
    let mut taken = BTreeSet::new();

    raw.into_iter()
        .map(|entry| {
            let name = decode_entities(&entry.title);
            let mut id = slugify(&name);
            while !taken.insert(id.clone()) {
                id.push('_');
            }

            Application {
                id,
                name,
                icon: entry.icon,
                uri: entry.uri,
            }
        })
        .collect()
}

fn slugify(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// Decode the HTML entities application titles arrive with
///
/// Handles the named entities seen in the wild plus numeric character
/// references; anything unrecognized is kept as-is.
fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];

        let decoded = tail.find(';').and_then(|end| {
            let entity = &tail[1..end];
            if entity.is_empty() || entity.contains('&') {
                return None;
            }
            decode_entity(entity).map(|c| (c, end))
        });

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let digits = entity.strip_prefix('#')?;
            let code = if let Some(hex) = digits
                .strip_prefix('x')
                .or_else(|| digits.strip_prefix('X'))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                digits.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}
