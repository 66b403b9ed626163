use std::collections::BTreeMap;

use kube::CustomResource;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// DestinationRule defines policies that apply to traffic intended for a service after routing has occurred.
///
/// Reference: [Istio DestinationRule](https://istio.io/latest/docs/reference/config/networking/destination-rule/)
#[derive(CustomResource, Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[kube(group = "networking.istio.io", version = "v1alpha3", kind = "DestinationRule", namespaced, schema = "disabled", derive = "PartialEq")]
#[serde(rename_all = "camelCase")]
pub struct DestinationRuleSpec {
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_policy: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub export_to: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}
