use serde::{Deserialize, Serialize};

use crate::types::{falsy_bool, non_empty_string};

/// Upstream proxy settings as sent to the backend.
///
/// Host and port are raw user input; nothing here validates them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProxySettings {
    /// Whether the proxy should be used.
    #[serde(rename = "proxyEnabled")]
    pub enabled: bool,

    /// Proxy host or IP address.
    #[serde(rename = "proxyIp")]
    pub host: String,

    /// Proxy port, kept as text.
    #[serde(rename = "proxyPort")]
    pub port: String,
}

impl ProxySettings {
    /// Creates a new set of proxy settings.
    pub fn new(enabled: bool, host: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            enabled,
            host: host.into(),
            port: port.into(),
        }
    }
}

/// Body of a `POST /test-proxy` request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProxyTestRequest {
    /// The proxy to probe.
    #[serde(flatten)]
    pub proxy: ProxySettings,
}

/// Body of a `/test-proxy` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProxyTestResponse {
    /// True when the probe went through the proxy.
    #[serde(default, deserialize_with = "falsy_bool")]
    pub success: bool,

    /// Status the probe target answered with; kept opaque.
    #[serde(default)]
    pub status_code: Option<serde_json::Value>,

    /// Free-form detail text.
    #[serde(default, deserialize_with = "non_empty_string")]
    pub details: Option<String>,

    /// Application-level failure reported by the backend.
    #[serde(default, deserialize_with = "non_empty_string")]
    pub error: Option<String>,
}

impl ProxyTestResponse {
    /// Renders the status code for display, without quotes around strings.
    pub fn status_text(&self) -> String {
        match &self.status_code {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) | None => "unknown".to_string(),
            Some(other) => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_flattens_proxy_fields() {
        let request = ProxyTestRequest {
            proxy: ProxySettings::new(true, "127.0.0.1", "8080"),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "proxyEnabled": true,
                "proxyIp": "127.0.0.1",
                "proxyPort": "8080",
            })
        );
    }

    #[test]
    fn status_text_variants() {
        let numeric: ProxyTestResponse =
            serde_json::from_value(serde_json::json!({"success": true, "status_code": 204}))
                .unwrap();
        assert_eq!(numeric.status_text(), "204");

        let textual: ProxyTestResponse =
            serde_json::from_value(serde_json::json!({"status_code": "200"})).unwrap();
        assert_eq!(textual.status_text(), "200");

        let missing: ProxyTestResponse = serde_json::from_str("{}").unwrap();
        assert!(!missing.success);
        assert_eq!(missing.status_text(), "unknown");
    }
}
