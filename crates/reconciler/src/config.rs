//! Reconciler configuration, loaded from TOML.
//!
//! ```toml
//! [istio]
//! ingress_gateways = [
//!     { namespace = "knative-serving", name = "knative-ingress-gateway", service_url = "istio-ingressgateway.istio-system.svc.cluster.local" },
//! ]
//!
//! [network]
//! http_protocol = "Redirected"
//!
//! [retry]
//! max_attempts = 5
//! ```

use std::{path::Path, str::FromStr};

use netgate_model::HttpProtocol;
use serde::{Deserialize, Serialize};

use crate::{retry::RetryConfig, Error, Result};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    pub istio: IstioConfig,
    pub network: NetworkConfig,
    pub retry: RetryConfig,
}

impl ReconcilerConfig {
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        content.parse()
    }
}

impl FromStr for ReconcilerConfig {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        let config: ReconcilerConfig = toml::from_str(s)?;
        config.retry.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IstioConfig {
    /// Shared gateways and the proxy services they are bound to.
    pub ingress_gateways: Vec<GatewayEntry>,
}

/// A shared gateway `namespace/name` and the URL of its proxy service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayEntry {
    pub namespace: String,
    pub name: String,
    /// `name.namespace.svc.<cluster domain>`
    pub service_url: String,
}

impl GatewayEntry {
    /// `(namespace, name)` of the proxy service.
    pub fn service(&self) -> Result<(String, String)> {
        let parts: Vec<&str> = self.service_url.split('.').collect();
        match parts.as_slice() {
            [name, namespace, _, ..] if !name.is_empty() && !namespace.is_empty() => Ok((namespace.to_string(), name.to_string())),
            _ => Err(Error::InvalidServiceUrl(self.service_url.clone())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub http_protocol: HttpProtocol,
}

#[cfg(test)]
mod test {
    use super::*;

    fn entry(service_url: &str) -> GatewayEntry {
        GatewayEntry {
            namespace: "knative-serving".to_string(),
            name: "knative-ingress-gateway".to_string(),
            service_url: service_url.to_string(),
        }
    }

    #[test]
    fn test_service_url() {
        assert_eq!(
            entry("istio-ingressgateway.istio-system.svc.cluster.local").service().expect("valid url"),
            ("istio-system".to_string(), "istio-ingressgateway".to_string())
        );
        assert_eq!(
            entry("gateway.istio-system.svc").service().expect("valid url"),
            ("istio-system".to_string(), "gateway".to_string())
        );
        for bad in ["", "gateway", "gateway.istio-system", ".istio-system.svc"] {
            assert!(matches!(entry(bad).service(), Err(Error::InvalidServiceUrl(_))), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_parse_config() {
        let config: ReconcilerConfig = r#"
[istio]
ingress_gateways = [
    { namespace = "knative-serving", name = "knative-ingress-gateway", service_url = "istio-ingressgateway.istio-system.svc.cluster.local" },
]

[network]
http_protocol = "Redirected"

[retry]
max_attempts = 3
"#
        .parse()
        .expect("fail to parse config");
        assert_eq!(config.istio.ingress_gateways, vec![entry("istio-ingressgateway.istio-system.svc.cluster.local")]);
        assert_eq!(config.network.http_protocol, HttpProtocol::Redirected);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.initial_delay_ms, RetryConfig::default().initial_delay_ms);
    }

    #[test]
    fn test_empty_config_is_default() {
        let config: ReconcilerConfig = "".parse().expect("fail to parse config");
        assert_eq!(config, ReconcilerConfig::default());
        assert_eq!(config.network.http_protocol, HttpProtocol::Enabled);
    }

    #[test]
    fn test_invalid_config() {
        let result: Result<ReconcilerConfig> = "[network]\nhttp_protocol = \"Sometimes\"".parse();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_retry_config() {
        for retry in ["backoff_multiplier = -1.0", "backoff_multiplier = nan", "initial_delay_ms = 5000\nmax_delay_ms = 100"] {
            let result: Result<ReconcilerConfig> = format!("[retry]\n{retry}").parse();
            assert!(matches!(result, Err(Error::InvalidRetry(_))), "{retry} should be rejected");
        }
    }

    #[tokio::test]
    async fn test_from_missing_file() {
        let result = ReconcilerConfig::from_file("/nonexistent/netgate.toml").await;
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
