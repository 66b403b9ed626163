use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Ingress is the routing intent of one owner: the hosts it serves and how TLS is terminated for them.
#[derive(CustomResource, Debug, Serialize, Deserialize, Clone, PartialEq, Default, JsonSchema)]
#[kube(group = "networking.netgate.io", version = "v1alpha1", kind = "Ingress", namespaced, derive = "PartialEq")]
#[serde(rename_all = "camelCase")]
pub struct IngressSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<IngressRule>,
    /// TLS termination blocks. Each block becomes one HTTPS server.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tls: Vec<IngressTls>,
    /// Overrides the cluster wide [`HttpProtocol`] for this ingress.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_option: Option<HttpOption>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngressRule {
    pub hosts: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngressTls {
    pub hosts: Vec<String>,
    pub secret_name: String,
    pub secret_namespace: String,
}

impl IngressTls {
    /// Key of the referenced secret in a `namespace/name` keyed secret map.
    pub fn secret_key(&self) -> String {
        format!("{}/{}", self.secret_namespace, self.secret_name)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
pub enum HttpOption {
    Enabled,
    Redirected,
}

/// How plain HTTP traffic is handled by generated gateways.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpProtocol {
    #[default]
    Enabled,
    Disabled,
    Redirected,
}

impl From<HttpOption> for HttpProtocol {
    fn from(value: HttpOption) -> Self {
        match value {
            HttpOption::Enabled => HttpProtocol::Enabled,
            HttpOption::Redirected => HttpProtocol::Redirected,
        }
    }
}

impl Ingress {
    /// All hosts of all rules, deduplicated and sorted.
    pub fn hosts(&self) -> Vec<String> {
        let mut hosts: Vec<String> = self.spec.rules.iter().flat_map(|rule| rule.hosts.iter().cloned()).collect();
        hosts.sort();
        hosts.dedup();
        hosts
    }

    /// The effective HTTP handling: the ingress option when set, the configured protocol otherwise.
    pub fn http_protocol(&self, configured: HttpProtocol) -> HttpProtocol {
        self.spec.http_option.map(HttpProtocol::from).unwrap_or(configured)
    }
}
