use std::{collections::BTreeMap, fmt::Display};

use kube::CustomResource;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{PLACEHOLDER_PORT, PLACEHOLDER_PORT_NAME, TLS_CERT_KEY, TLS_PRIVATE_KEY_KEY};

/// Gateway describes a load balancer operating at the edge of the mesh receiving incoming connections.
///
/// The server list is shared: servers contributed by different ingresses (and servers added by hand)
/// live side by side, and ownership is recovered from the port name of each server.
///
/// Reference: [Istio Gateway](https://istio.io/latest/docs/reference/config/networking/gateway/)
#[derive(CustomResource, Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[kube(group = "networking.istio.io", version = "v1alpha3", kind = "Gateway", namespaced, schema = "disabled", derive = "PartialEq")]
#[serde(default)]
pub struct GatewaySpec {
    /// Labels of the proxy pods this gateway configuration applies to.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub selector: BTreeMap<String, String>,
    /// Servers exposed by the gateway, in order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
}

/// One listener of a [`Gateway`].
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    #[serde(default)]
    pub hosts: Vec<String>,
    #[serde(default)]
    pub port: Port,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<ServerTlsSettings>,
    /// Fields this crate does not model. Kept so that servers written by someone else survive a rewrite.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Server {
    /// The reserved server used only to keep an otherwise empty gateway valid.
    pub fn placeholder() -> Self {
        Server {
            hosts: vec!["*".to_string()],
            port: Port {
                name: PLACEHOLDER_PORT_NAME.to_string(),
                number: PLACEHOLDER_PORT,
                protocol: PortProtocol::Http,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn is_placeholder(&self) -> bool {
        *self == Self::placeholder()
    }

    pub fn port_name(&self) -> &str {
        &self.port.name
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Port {
    /// Label assigned to the port. Generated servers encode their owner here.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub protocol: PortProtocol,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// The protocol exposed on a server port.
///
/// Anything other than `HTTP` and `HTTPS` is carried through verbatim.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
#[serde(from = "String", into = "String")]
pub enum PortProtocol {
    #[default]
    Http,
    Https,
    Other(String),
}

impl From<String> for PortProtocol {
    fn from(value: String) -> Self {
        match value.as_str() {
            "HTTP" => PortProtocol::Http,
            "HTTPS" => PortProtocol::Https,
            _ => PortProtocol::Other(value),
        }
    }
}

impl From<PortProtocol> for String {
    fn from(value: PortProtocol) -> Self {
        value.to_string()
    }
}

impl Display for PortProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortProtocol::Http => write!(f, "HTTP"),
            PortProtocol::Https => write!(f, "HTTPS"),
            PortProtocol::Other(protocol) => write!(f, "{protocol}"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServerTlsSettings {
    /// Send a 301 redirect for all http connections, asking clients to use HTTPS.
    #[serde(default, skip_serializing_if = "is_false")]
    pub https_redirect: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<TlsMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_certificate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    /// Name of the secret the proxy loads key material from. Required when the secret is not mounted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_name: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ServerTlsSettings {
    /// Simple TLS termination with the conventional secret keys.
    pub fn simple(credential_name: Option<String>) -> Self {
        ServerTlsSettings {
            mode: Some(TlsMode::Simple),
            server_certificate: Some(TLS_CERT_KEY.to_string()),
            private_key: Some(TLS_PRIVATE_KEY_KEY.to_string()),
            credential_name,
            ..Default::default()
        }
    }

    pub fn https_redirect() -> Self {
        ServerTlsSettings {
            https_redirect: true,
            ..Default::default()
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(from = "String", into = "String")]
pub enum TlsMode {
    Passthrough,
    Simple,
    Mutual,
    AutoPassthrough,
    IstioMutual,
    OptionalMutual,
    Other(String),
}

impl From<String> for TlsMode {
    fn from(value: String) -> Self {
        match value.as_str() {
            "PASSTHROUGH" => TlsMode::Passthrough,
            "SIMPLE" => TlsMode::Simple,
            "MUTUAL" => TlsMode::Mutual,
            "AUTO_PASSTHROUGH" => TlsMode::AutoPassthrough,
            "ISTIO_MUTUAL" => TlsMode::IstioMutual,
            "OPTIONAL_MUTUAL" => TlsMode::OptionalMutual,
            _ => TlsMode::Other(value),
        }
    }
}

impl From<TlsMode> for String {
    fn from(value: TlsMode) -> Self {
        match value {
            TlsMode::Passthrough => "PASSTHROUGH".to_string(),
            TlsMode::Simple => "SIMPLE".to_string(),
            TlsMode::Mutual => "MUTUAL".to_string(),
            TlsMode::AutoPassthrough => "AUTO_PASSTHROUGH".to_string(),
            TlsMode::IstioMutual => "ISTIO_MUTUAL".to_string(),
            TlsMode::OptionalMutual => "OPTIONAL_MUTUAL".to_string(),
            TlsMode::Other(mode) => mode,
        }
    }
}
