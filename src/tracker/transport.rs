use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::tracker::error::TransportError;

/// The hardware seam of the tracking controller. Every call is a single
/// round-trip; callers decide whether to retry.
pub trait MountTransport {
    fn connect(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn disconnect(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Runs a device-specific action and returns its string result.
    fn action(
        &mut self,
        name: &str,
        parameters: &str,
    ) -> impl Future<Output = Result<String, TransportError>> + Send;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AlpacaReply {
    #[serde(default)]
    value: Value,
    #[serde(default)]
    error_number: i32,
    #[serde(default)]
    error_message: String,
}

/// ASCOM Alpaca telescope device reached over HTTP.
pub struct AlpacaTransport {
    client: Client,
    base_url: String,
    client_id: u32,
    transaction_id: u32,
}

impl AlpacaTransport {
    pub fn new(address: &str, device_number: u32, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: format!("http://{address}/api/v1/telescope/{device_number}"),
            client_id: std::process::id(),
            transaction_id: 0,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn put(&mut self, endpoint: &str, fields: &[(&str, &str)]) -> Result<Value, TransportError> {
        self.transaction_id = self.transaction_id.wrapping_add(1);
        let client_id = self.client_id.to_string();
        let transaction_id = self.transaction_id.to_string();

        let mut form: Vec<(&str, &str)> = fields.to_vec();
        form.push(("ClientID", client_id.as_str()));
        form.push(("ClientTransactionID", transaction_id.as_str()));

        let url = format!("{}/{}", self.base_url, endpoint);
        log::debug!("PUT {} {:?}", url, fields);

        let reply: AlpacaReply = self
            .client
            .put(&url)
            .form(&form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        decode_reply(reply)
    }
}

fn decode_reply(reply: AlpacaReply) -> Result<Value, TransportError> {
    if reply.error_number != 0 {
        return Err(TransportError::Device {
            number: reply.error_number,
            message: reply.error_message,
        });
    }
    Ok(reply.value)
}

fn value_to_string(value: Value) -> Result<String, TransportError> {
    match value {
        Value::String(s) => Ok(s),
        Value::Null => Ok(String::new()),
        v @ (Value::Bool(_) | Value::Number(_)) => Ok(v.to_string()),
        other => Err(TransportError::Malformed(format!(
            "unexpected action value {other}"
        ))),
    }
}

impl MountTransport for AlpacaTransport {
    async fn connect(&mut self) -> Result<(), TransportError> {
        self.put("connected", &[("Connected", "true")]).await.map(|_| ())
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        self.put("connected", &[("Connected", "false")]).await.map(|_| ())
    }

    async fn action(&mut self, name: &str, parameters: &str) -> Result<String, TransportError> {
        let value = self
            .put("action", &[("Action", name), ("Parameters", parameters)])
            .await?;
        value_to_string(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(json: &str) -> AlpacaReply {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_base_url() {
        let transport = AlpacaTransport::new("localhost:11111", 0, Duration::from_secs(5)).unwrap();
        assert_eq!(
            transport.base_url(),
            "http://localhost:11111/api/v1/telescope/0"
        );
    }

    #[test]
    fn test_decode_action_reply() {
        let value = decode_reply(reply(
            r#"{"Value": "{\"jd\": 2460000.5}", "ClientTransactionID": 1, "ServerTransactionID": 7, "ErrorNumber": 0, "ErrorMessage": ""}"#,
        ))
        .unwrap();
        assert_eq!(value_to_string(value).unwrap(), r#"{"jd": 2460000.5}"#);
    }

    #[test]
    fn test_decode_put_reply_without_value() {
        let value = decode_reply(reply(r#"{"ErrorNumber": 0, "ErrorMessage": ""}"#)).unwrap();
        assert_eq!(value_to_string(value).unwrap(), "");
    }

    #[test]
    fn test_device_error() {
        let result = decode_reply(reply(
            r#"{"ErrorNumber": 1031, "ErrorMessage": "Not connected"}"#,
        ));
        assert!(matches!(
            result,
            Err(TransportError::Device { number: 1031, ref message }) if message == "Not connected"
        ));
    }

    #[test]
    fn test_object_value_is_malformed() {
        assert!(matches!(
            value_to_string(serde_json::json!({"a": 1})),
            Err(TransportError::Malformed(_))
        ));
    }
}
