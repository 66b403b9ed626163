use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Secret, Service};
use kube::ResourceExt;
use netgate_model::{Gateway, Ingress, Server};
use netgate_reconciler::{
    config::ReconcilerConfig,
    gateway::{make_ingress_gateways, qualified_gateway_names, ServerOwner},
    reconcile::{clear_shared_gateway, lookup_gateway_services, reconcile_resource, reconcile_shared_gateway},
    retry::RetryConfig,
    server::make_tls_servers,
    service::{ObjectStore, Retrieve},
    Result,
};

/// Servers one ingress contributes to one shared gateway.
#[derive(Debug, Clone)]
pub struct SharedServers {
    pub namespace: String,
    pub name: String,
    pub servers: Vec<Server>,
}

/// Everything one ingress wants written.
#[derive(Debug, Clone)]
pub struct Plan {
    pub owner: ServerOwner,
    pub gateways: Vec<Gateway>,
    pub shared: Vec<SharedServers>,
}

impl Plan {
    pub async fn build<S>(store: &S, config: &ReconcilerConfig, ingress: &Ingress) -> Result<Self>
    where
        S: Retrieve<Secret> + Retrieve<Service>,
    {
        let mut secrets = BTreeMap::new();
        for tls in &ingress.spec.tls {
            // missing secrets are reported by the server builder
            if let Some(secret) = Retrieve::<Secret>::get(store, &tls.secret_namespace, &tls.secret_name).await? {
                secrets.insert(tls.secret_key(), secret);
            }
        }
        let services = lookup_gateway_services(store, &config.istio).await?;
        let gateways = make_ingress_gateways(ingress, &secrets, &services, config.network.http_protocol)?;
        let shared = config
            .istio
            .ingress_gateways
            .iter()
            .zip(&services)
            .map(|(entry, service)| -> Result<SharedServers> {
                Ok(SharedServers {
                    namespace: entry.namespace.clone(),
                    name: entry.name.clone(),
                    servers: make_tls_servers(ingress, &ingress.spec.tls, &service.namespace, &secrets)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!("[NG.Plan] {} plans gateways {:?}", ingress.name_any(), qualified_gateway_names(&gateways));
        Ok(Plan {
            owner: ServerOwner::for_ingress(ingress),
            gateways,
            shared,
        })
    }

    /// The live gateways this plan touches.
    pub async fn snapshot<S: Retrieve<Gateway>>(&self, store: &S) -> Result<Vec<Gateway>> {
        let mut live = Vec::new();
        for gateway in &self.gateways {
            live.extend(store.get(&gateway.namespace().unwrap_or_default(), &gateway.name_any()).await?);
        }
        for shared in &self.shared {
            live.extend(store.get(&shared.namespace, &shared.name).await?);
        }
        Ok(live)
    }

    pub async fn apply<S: ObjectStore<Gateway>>(&self, store: &S, retry: &RetryConfig) -> Result<()> {
        for gateway in &self.gateways {
            let outcome = reconcile_resource(store, gateway, retry).await?;
            tracing::info!("[NG.Plan] gateway {}/{}: {outcome:?}", gateway.namespace().unwrap_or_default(), gateway.name_any());
        }
        for shared in &self.shared {
            let outcome = reconcile_shared_gateway(store, &shared.namespace, &shared.name, &self.owner, &shared.servers, retry).await?;
            tracing::info!("[NG.Plan] shared gateway {}/{}: {outcome:?}", shared.namespace, shared.name);
        }
        Ok(())
    }

    /// Removes the servers of the owner from every shared gateway. Generated gateways are owned by the ingress and
    /// left to garbage collection.
    pub async fn finalize<S: ObjectStore<Gateway>>(&self, store: &S, retry: &RetryConfig) -> Result<()> {
        for shared in &self.shared {
            let outcome = clear_shared_gateway(store, &shared.namespace, &shared.name, &self.owner, retry).await?;
            tracing::info!("[NG.Plan] cleared shared gateway {}/{}: {outcome:?}", shared.namespace, shared.name);
        }
        Ok(())
    }
}
