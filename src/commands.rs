use crate::error::{BraviaError, Result};
use crate::protocol::RemoteCommandInfo;
use crate::rpc::RpcClient;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Remote control command table, keyed by kebab-cased command name
///
/// Built once from `system.getRemoteControllerInfo` and immutable after
/// that. Until the fetch lands, lookups fail with
/// [`BraviaError::CommandsNotReady`] instead of blocking.
pub(crate) struct CommandTable {
    commands: Mutex<Option<BTreeMap<String, String>>>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self {
            commands: Mutex::new(None),
        }
    }

    /// Fetch the supported command list from the TV
    ///
    /// The response's second element is the ordered `{name, value}`
    /// sequence. On failure the table stays not-ready.
    pub async fn populate(&self, rpc: &RpcClient) -> Result<()> {
        let result = rpc
            .call("system", "getRemoteControllerInfo", "1.0", json!([]))
            .await?;
        let raw = result.get(1).cloned().unwrap_or_else(|| json!([]));
        let infos: Vec<RemoteCommandInfo> = serde_json::from_value(raw)?;

        self.install(infos);
        Ok(())
    }

    fn install(&self, infos: Vec<RemoteCommandInfo>) {
        let mut table = BTreeMap::new();
        for info in infos {
            table.insert(kebab_case(&info.name), info.value);
        }
        tracing::debug!(commands = table.len(), "remote command table loaded");
        *self.commands.lock().unwrap() = Some(table);
    }

    /// Resolve a normalized command name to its IRCC code
    pub fn lookup(&self, name: &str) -> Result<String> {
        let commands = self.commands.lock().unwrap();
        let table = commands.as_ref().ok_or(BraviaError::CommandsNotReady)?;
        table
            .get(name)
            .cloned()
            .ok_or_else(|| BraviaError::UnsupportedCommand(name.to_string()))
    }

    /// All known normalized command names, sorted
    ///
    /// Empty while the table is still loading.
    pub fn names(&self) -> Vec<String> {
        self.commands
            .lock()
            .unwrap()
            .as_ref()
            .map(|table| table.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// Normalize a command name to kebab-case
///
/// Words split on non-alphanumeric characters, camelCase boundaries and
/// letter/digit boundaries; "Power Off" and "PowerOff" both become
/// "power-off", "Num1" becomes "num-1".
pub(crate) fn kebab_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        // `current` being non-empty implies chars[i - 1] is alphanumeric
        if !current.is_empty() {
            let prev = chars[i - 1];
            let upper_run_ends = prev.is_uppercase()
                && c.is_uppercase()
                && chars.get(i + 1).is_some_and(|next| next.is_lowercase());
            let boundary = (prev.is_lowercase() && c.is_uppercase())
                || (prev.is_alphabetic() && c.is_numeric())
                || (prev.is_numeric() && c.is_alphabetic())
                || upper_run_ends;
            if boundary {
                words.push(std::mem::take(&mut current));
            }
        }

        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }

    words.join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kebab_case_matches_remote_names() {
        assert_eq!(kebab_case("Power Off"), "power-off");
        assert_eq!(kebab_case("PowerOff"), "power-off");
        assert_eq!(kebab_case("VolumeUp"), "volume-up");
        assert_eq!(kebab_case("Num1"), "num-1");
        assert_eq!(kebab_case("HDMI 1"), "hdmi-1");
        assert_eq!(kebab_case("GGuide"), "g-guide");
        assert_eq!(kebab_case("Wide"), "wide");
        assert_eq!(kebab_case("3D"), "3-d");
        assert_eq!(kebab_case("  Netflix  "), "netflix");
        assert_eq!(kebab_case(""), "");
    }

    fn info(name: &str, value: &str) -> RemoteCommandInfo {
        serde_json::from_value(serde_json::json!({ "name": name, "value": value })).unwrap()
    }

    #[test]
    fn lookup_before_population_is_not_ready() {
        let table = CommandTable::new();
        assert!(matches!(
            table.lookup("power-off"),
            Err(BraviaError::CommandsNotReady)
        ));
        assert!(table.names().is_empty());
    }

    #[test]
    fn lookup_resolves_normalized_names() {
        let table = CommandTable::new();
        table.install(vec![info("Power Off", "AAA"), info("Power On", "BBB")]);

        assert_eq!(table.names(), vec!["power-off", "power-on"]);
        assert_eq!(table.lookup("power-off").unwrap(), "AAA");
        assert_eq!(table.lookup("power-on").unwrap(), "BBB");
    }

    #[test]
    fn unknown_command_names_the_offender() {
        let table = CommandTable::new();
        table.install(vec![info("Power Off", "AAA")]);

        match table.lookup("jump") {
            Err(BraviaError::UnsupportedCommand(name)) => assert_eq!(name, "jump"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
