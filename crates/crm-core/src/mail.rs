//! Outbound email delivery.
//!
//! [`MailTransport`] is the seam the dispatcher sends through. The production
//! implementation posts each message as JSON to an HTTP mail relay and reads
//! back the provider's message id.

use serde::{Deserialize, Serialize};

use crate::error::{CrmError, Result};

pub const CHARSET: &str = "UTF-8";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

pub trait MailTransport {
    /// Deliver one message and return the provider-assigned message id.
    fn send(&self, email: &OutboundEmail) -> Result<String>;
}

// ---------------------------------------------------------------------------
// HTTP relay
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SendRequest<'a> {
    #[serde(flatten)]
    email: &'a OutboundEmail,
    charset: &'static str,
}

#[derive(Deserialize)]
struct SendResponse {
    message_id: Option<String>,
}

pub struct HttpMailTransport {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpMailTransport {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| CrmError::Mail(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }
}

impl MailTransport for HttpMailTransport {
    fn send(&self, email: &OutboundEmail) -> Result<String> {
        let mut request = self.client.post(&self.endpoint).json(&SendRequest {
            email,
            charset: CHARSET,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .map_err(|e| CrmError::Mail(format!("request to {} failed: {e}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(CrmError::Mail(format!("relay returned {status}: {body}")));
        }
        let parsed: SendResponse = response
            .json()
            .map_err(|e| CrmError::Mail(format!("unreadable relay response: {e}")))?;
        match parsed.message_id {
            Some(id) if !id.trim().is_empty() => Ok(id),
            _ => Err(CrmError::Mail("relay response has no message_id".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn email() -> OutboundEmail {
        OutboundEmail {
            from: "ventas@example.com".into(),
            to: "ana@example.com".into(),
            subject: "Detalles de tu cotización 7".into(),
            text: "texto".into(),
            html: "<p>html</p>".into(),
        }
    }

    #[test]
    fn posts_json_and_returns_message_id() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/send")
            .match_header("authorization", "Bearer secret")
            .match_body(Matcher::PartialJson(json!({
                "from": "ventas@example.com",
                "to": "ana@example.com",
                "subject": "Detalles de tu cotización 7",
                "charset": "UTF-8",
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message_id":"msg-1"}"#)
            .create();

        let transport =
            HttpMailTransport::new(format!("{}/send", server.url()), Some("secret".into())).unwrap();
        assert_eq!(transport.send(&email()).unwrap(), "msg-1");
        mock.assert();
    }

    #[test]
    fn error_status_is_mail_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/send")
            .with_status(503)
            .with_body("unavailable")
            .create();

        let transport = HttpMailTransport::new(format!("{}/send", server.url()), None).unwrap();
        let err = transport.send(&email()).unwrap_err();
        assert!(matches!(err, CrmError::Mail(ref m) if m.contains("503")), "{err}");
    }

    #[test]
    fn missing_message_id_is_mail_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/send")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{}")
            .create();

        let transport = HttpMailTransport::new(format!("{}/send", server.url()), None).unwrap();
        assert!(matches!(transport.send(&email()), Err(CrmError::Mail(_))));
    }
}
