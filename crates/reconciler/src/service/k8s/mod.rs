//! Kubernetes backend, talking to the API server through a [`kube::Client`].

use std::{fmt::Debug, sync::Arc};

use k8s_openapi::NamespaceResourceScope;
use kube::{Resource, ResourceExt};
use serde::{de::DeserializeOwned, Serialize};

use crate::Error;

pub mod create;
pub mod retrieve;
pub mod update;

/// Namespaced kinds this backend can read and write.
pub trait KubeObject: Resource<Scope = NamespaceResourceScope, DynamicType = ()> + Clone + DeserializeOwned + Serialize + Debug + Send + Sync + 'static {}

impl<K> KubeObject for K where K: Resource<Scope = NamespaceResourceScope, DynamicType = ()> + Clone + DeserializeOwned + Serialize + Debug + Send + Sync + 'static {}

pub struct K8s {
    /// Used for objects that carry no namespace.
    pub namespace: Arc<str>,
    client: kube::Client,
}

impl K8s {
    pub fn new(namespace: impl Into<Arc<str>>, client: kube::Client) -> Self {
        Self {
            namespace: namespace.into(),
            client,
        }
    }

    pub async fn with_default_client(namespace: impl Into<Arc<str>>) -> Result<Self, kube::Error> {
        Ok(Self {
            namespace: namespace.into(),
            client: kube::Client::try_default().await?,
        })
    }

    pub fn get_namespace_api<K: KubeObject>(&self, namespace: &str) -> kube::Api<K> {
        kube::Api::namespaced(self.client.clone(), namespace)
    }

    fn object_namespace<K: KubeObject>(&self, object: &K) -> String {
        object.namespace().unwrap_or_else(|| self.namespace.to_string())
    }
}

/// Maps a failed write of `object`: `409 Conflict` from the API server is an optimistic concurrency failure.
fn write_error<K: KubeObject>(object: &K, namespace: &str, error: kube::Error) -> Error {
    match error {
        kube::Error::Api(response) if response.code == 409 => {
            tracing::debug!("[NG.K8s] {} {}/{} conflicted: {}", K::kind(&()), namespace, object.name_any(), response.message);
            Error::conflict(K::kind(&()), namespace, object.name_any())
        }
        error => Error::Kube(error),
    }
}
