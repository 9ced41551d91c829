use crate::error::Result;
use crate::rpc::check_status;
use crate::session::Session;
use std::sync::Arc;

const SOAP_ACTION: &str = "\"urn:schemas-sony-com:service:IRCC:1#X_SendIRCC\"";

/// Sender for the legacy infrared command relay
///
/// IRCC is the SOAP endpoint every Bravia generation keeps around for
/// simulated remote control button presses. It returns no structured
/// data, only success or failure.
pub(crate) struct IrccSender {
    http: reqwest::Client,
    url: String,
    session: Arc<Session>,
}

impl IrccSender {
    pub fn new(http: reqwest::Client, url: String, session: Arc<Session>) -> Self {
        Self { http, url, session }
    }

    /// Relay one infrared command code
    ///
    /// The endpoint rejects anonymous senders outright, so without a
    /// session the call fails before any network I/O.
    pub async fn send(&self, code: &str) -> Result<()> {
        self.session.require_authenticated()?;

        tracing::debug!(code, "sending IRCC command");
        let response = self
            .session
            .decorate(self.http.post(&self.url))
            .header(reqwest::header::CONTENT_TYPE, "text/xml; charset=UTF-8")
            .header("SOAPACTION", SOAP_ACTION)
            .body(envelope(code))
            .send()
            .await?;
        check_status(&self.session, response)?;

        Ok(())
    }
}

/// Build the fixed SOAP envelope with the code inside `IRCCCode`
fn envelope(code: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0"?>"#,
            r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" "#,
            r#"s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">"#,
            "<s:Body>",
            r#"<u:X_SendIRCC xmlns:u="urn:schemas-sony-com:service:IRCC:1">"#,
            "<IRCCCode>{code}</IRCCCode>",
            "</u:X_SendIRCC>",
            "</s:Body>",
            "</s:Envelope>"
        ),
        code = code
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_embeds_the_code() {
        let body = envelope("AAAAAQAAAAEAAAAVAw==");
        assert!(body.starts_with(r#"<?xml version="1.0"?>"#));
        assert!(body.contains("<IRCCCode>AAAAAQAAAAEAAAAVAw==</IRCCCode>"));
        assert!(body.contains(r#"<u:X_SendIRCC xmlns:u="urn:schemas-sony-com:service:IRCC:1">"#));
        assert!(body.ends_with("</s:Body></s:Envelope>"));
    }

    #[test]
    fn soap_action_is_quoted() {
        assert_eq!(SOAP_ACTION, "\"urn:schemas-sony-com:service:IRCC:1#X_SendIRCC\"");
    }
}
