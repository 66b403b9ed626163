//! Converging live objects with desired ones.
//!
//! Every operation here is a read-compare-write cycle run under [`retry_on_conflict`]: a write that loses a
//! race with another writer is retried from a fresh read.

use futures_util::future::try_join_all;
use k8s_openapi::api::core::v1::Service;
use kube::{Resource, ResourceExt};
use netgate_model::{DestinationRule, DestinationRuleSpec, Gateway, GatewaySpec, Server};

use crate::{
    config::IstioConfig,
    gateway::{GatewayService, ServerOwner},
    merge::merge_servers,
    retry::{retry_on_conflict, RetryConfig},
    service::{ObjectStore, Retrieve},
    Error, Result,
};

/// A resource whose desired state is fully described by its spec.
pub trait SpecResource: Resource<DynamicType = ()> + Clone + Send + Sync {
    type Spec: PartialEq + Clone + Send + Sync;
    fn spec(&self) -> &Self::Spec;
    fn spec_mut(&mut self) -> &mut Self::Spec;
}

impl SpecResource for Gateway {
    type Spec = GatewaySpec;
    fn spec(&self) -> &GatewaySpec {
        &self.spec
    }
    fn spec_mut(&mut self) -> &mut GatewaySpec {
        &mut self.spec
    }
}

impl SpecResource for DestinationRule {
    type Spec = DestinationRuleSpec;
    fn spec(&self) -> &DestinationRuleSpec {
        &self.spec
    }
    fn spec_mut(&mut self) -> &mut DestinationRuleSpec {
        &mut self.spec
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Created,
    Updated,
    Unchanged,
}

/// Creates `desired` if absent, replaces the spec of the live object if it differs, and does nothing otherwise.
///
/// When `desired` has a controller owner reference, the live object must be controlled by the same owner.
pub async fn reconcile_resource<K, S>(store: &S, desired: &K, retry: &RetryConfig) -> Result<ReconcileOutcome>
where
    K: SpecResource,
    S: ObjectStore<K>,
{
    let namespace = desired.namespace().unwrap_or_default();
    let name = desired.name_any();
    let operation = format!("reconcile {} {namespace}/{name}", K::kind(&()));
    let (namespace, name) = (namespace.as_str(), name.as_str());
    retry_on_conflict(retry, &operation, || reconcile_resource_once(store, desired, namespace, name)).await
}

async fn reconcile_resource_once<K, S>(store: &S, desired: &K, namespace: &str, name: &str) -> Result<ReconcileOutcome>
where
    K: SpecResource,
    S: ObjectStore<K>,
{
    let Some(existing) = store.get(namespace, name).await? else {
        store.create(desired).await?;
        tracing::info!("[NG.Reconcile] created {} {namespace}/{name}", K::kind(&()));
        return Ok(ReconcileOutcome::Created);
    };
    ensure_controlled(&existing, desired)?;
    if existing.spec() == desired.spec() {
        return Ok(ReconcileOutcome::Unchanged);
    }
    let mut updated = existing;
    *updated.spec_mut() = desired.spec().clone();
    store.replace(&updated).await?;
    tracing::info!("[NG.Reconcile] updated {} {namespace}/{name}", K::kind(&()));
    Ok(ReconcileOutcome::Updated)
}

fn ensure_controlled<K: Resource<DynamicType = ()>>(existing: &K, desired: &K) -> Result<()> {
    let Some(owner) = desired.owner_references().iter().find(|owner| owner.controller == Some(true)) else {
        return Ok(());
    };
    let controlled = existing.owner_references().iter().any(|reference| reference.controller == Some(true) && reference.uid == owner.uid);
    if controlled {
        Ok(())
    } else {
        Err(Error::NotOwned {
            kind: K::kind(&()).to_string(),
            namespace: existing.namespace().unwrap_or_default(),
            name: existing.name_any(),
            owner: format!("{} {}", owner.kind, owner.name),
        })
    }
}

/// Merges the servers of `owner` into the shared gateway `namespace/name`.
///
/// The servers `owner` contributed before are recovered from the live gateway by their port name prefix.
pub async fn reconcile_shared_gateway<S>(store: &S, namespace: &str, name: &str, owner: &ServerOwner, desired: &[Server], retry: &RetryConfig) -> Result<ReconcileOutcome>
where
    S: ObjectStore<Gateway>,
{
    let owned = |live: &[Server]| owner.owned(live);
    reconcile_servers(store, namespace, name, desired, &owned, retry).await
}

/// Like [`reconcile_shared_gateway`], with the servers written last time supplied by the caller.
///
/// A live server in one of the owner's port slots that differs from `prior` was edited by someone else and is kept.
pub async fn reconcile_shared_gateway_with_prior<S>(store: &S, namespace: &str, name: &str, desired: &[Server], prior: &[Server], retry: &RetryConfig) -> Result<ReconcileOutcome>
where
    S: ObjectStore<Gateway>,
{
    let recorded = |_: &[Server]| prior.to_vec();
    reconcile_servers(store, namespace, name, desired, &recorded, retry).await
}

/// Removes every server of `owner` from the shared gateway, leaving the placeholder if nothing else is left.
pub async fn clear_shared_gateway<S>(store: &S, namespace: &str, name: &str, owner: &ServerOwner, retry: &RetryConfig) -> Result<ReconcileOutcome>
where
    S: ObjectStore<Gateway>,
{
    reconcile_shared_gateway(store, namespace, name, owner, &[], retry).await
}

async fn reconcile_servers<S, P>(store: &S, namespace: &str, name: &str, desired: &[Server], prior: &P, retry: &RetryConfig) -> Result<ReconcileOutcome>
where
    S: ObjectStore<Gateway>,
    P: Fn(&[Server]) -> Vec<Server> + Sync,
{
    let operation = format!("reconcile shared Gateway {namespace}/{name}");
    retry_on_conflict(retry, &operation, || async move {
        let live = store.get(namespace, name).await?.ok_or_else(|| Error::GatewayNotFound {
            namespace: namespace.to_string(),
            name: name.to_string(),
        })?;
        let servers = merge_servers(&live.spec.servers, desired, &prior(&live.spec.servers));
        if servers == live.spec.servers {
            return Ok(ReconcileOutcome::Unchanged);
        }
        let count = servers.len();
        let mut updated = live;
        updated.spec.servers = servers;
        store.replace(&updated).await?;
        tracing::info!("[NG.Reconcile] updated shared Gateway {namespace}/{name}, {count} servers");
        Ok(ReconcileOutcome::Updated)
    })
    .await
}

/// Resolves the proxy service of every configured shared gateway.
pub async fn lookup_gateway_services<S>(store: &S, istio: &IstioConfig) -> Result<Vec<GatewayService>>
where
    S: Retrieve<Service>,
{
    try_join_all(istio.ingress_gateways.iter().map(|entry| async move {
        let (namespace, name) = entry.service()?;
        let service = store.get(&namespace, &name).await?.ok_or(Error::ServiceNotFound { namespace, name })?;
        Ok::<_, Error>(GatewayService::from(&service))
    }))
    .await
}
