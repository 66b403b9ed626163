use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicU32, Ordering},
};

use k8s_openapi::{api::core::v1::Secret, apimachinery::pkg::apis::meta::v1::ObjectMeta};
use netgate_reconciler::{
    gateway::ServerOwner,
    model::{Gateway, GatewaySpec, Ingress, IngressRule, IngressSpec, IngressTls, Server},
    reconcile::{clear_shared_gateway, reconcile_shared_gateway, ReconcileOutcome},
    retry::RetryConfig,
    server::make_tls_servers,
    service::{memory::Memory, Create, Retrieve, Update},
    Error, Result,
};

const GATEWAY_NAMESPACE: &str = "knative-serving";
const GATEWAY_NAME: &str = "knative-ingress-gateway";

fn secret() -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some("secret0".to_string()),
            namespace: Some(GATEWAY_NAMESPACE.to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn ingress(name: &str, host: &str) -> Ingress {
    let mut ingress = Ingress::new(
        name,
        IngressSpec {
            rules: vec![IngressRule { hosts: vec![host.to_string()] }],
            tls: vec![IngressTls {
                hosts: vec![host.to_string()],
                secret_name: "secret0".to_string(),
                secret_namespace: GATEWAY_NAMESPACE.to_string(),
            }],
            ..Default::default()
        },
    );
    ingress.metadata.namespace = Some("test-ns".to_string());
    ingress.metadata.uid = Some(format!("{name}-uid"));
    ingress
}

fn servers_for(ingress: &Ingress) -> Vec<Server> {
    let secrets = BTreeMap::from([(format!("{GATEWAY_NAMESPACE}/secret0"), secret())]);
    make_tls_servers(ingress, &ingress.spec.tls, GATEWAY_NAMESPACE, &secrets).expect("fail to make servers")
}

fn shared_gateway() -> Gateway {
    Gateway {
        metadata: ObjectMeta {
            name: Some(GATEWAY_NAME.to_string()),
            namespace: Some(GATEWAY_NAMESPACE.to_string()),
            ..Default::default()
        },
        spec: GatewaySpec {
            selector: BTreeMap::from([("istio".to_string(), "ingressgateway".to_string())]),
            servers: vec![Server::placeholder()],
        },
    }
}

async fn live_servers(store: &impl Retrieve<Gateway>) -> Vec<Server> {
    store.get(GATEWAY_NAMESPACE, GATEWAY_NAME).await.expect("get").expect("gateway exists").spec.servers
}

#[tokio::test]
async fn test_owners_share_one_gateway() {
    let _ = tracing_subscriber::fmt::try_init();
    let store = Memory::new([shared_gateway()]);
    let retry = RetryConfig::immediate(5);
    let (a, b) = (ingress("ingress-a", "a.example.com"), ingress("ingress-b", "b.example.com"));
    let (owner_a, owner_b) = (ServerOwner::for_ingress(&a), ServerOwner::for_ingress(&b));

    let (desired_a, desired_b) = (servers_for(&a), servers_for(&b));

    let (ra, rb) = tokio::join!(
        reconcile_shared_gateway(&store, GATEWAY_NAMESPACE, GATEWAY_NAME, &owner_a, &desired_a, &retry),
        reconcile_shared_gateway(&store, GATEWAY_NAMESPACE, GATEWAY_NAME, &owner_b, &desired_b, &retry),
    );
    assert_eq!(ra.expect("owner a"), ReconcileOutcome::Updated);
    assert_eq!(rb.expect("owner b"), ReconcileOutcome::Updated);

    let servers = live_servers(&store).await;
    assert_eq!(servers.len(), 2);
    assert!(servers.iter().all(|server| !server.is_placeholder()));
    assert_eq!(owner_a.owned(&servers), desired_a);
    assert_eq!(owner_b.owned(&servers), desired_b);

    // finalizing one owner leaves the other untouched
    clear_shared_gateway(&store, GATEWAY_NAMESPACE, GATEWAY_NAME, &owner_a, &retry).await.expect("clear a");
    assert_eq!(live_servers(&store).await, desired_b);

    clear_shared_gateway(&store, GATEWAY_NAMESPACE, GATEWAY_NAME, &owner_b, &retry).await.expect("clear b");
    assert_eq!(live_servers(&store).await, vec![Server::placeholder()]);
}

/// Another writer changes the gateway between each read and the following write, a bounded number of times.
struct RacingWriter {
    inner: Memory<Gateway>,
    races: AtomicU32,
}

impl RacingWriter {
    fn new(inner: Memory<Gateway>, races: u32) -> Self {
        Self {
            inner,
            races: AtomicU32::new(races),
        }
    }
}

impl Retrieve<Gateway> for RacingWriter {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Gateway>> {
        self.inner.get(namespace, name).await
    }
}

impl Create<Gateway> for RacingWriter {
    async fn create(&self, object: &Gateway) -> Result<Gateway> {
        self.inner.create(object).await
    }
}

impl Update<Gateway> for RacingWriter {
    async fn replace(&self, object: &Gateway) -> Result<Gateway> {
        if let Ok(n) = self.races.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)) {
            if let Some(mut current) = self.inner.get(GATEWAY_NAMESPACE, GATEWAY_NAME).await? {
                current.spec.servers.retain(|server| !server.is_placeholder());
                current.spec.servers.extend(servers_for(&ingress(&format!("other-{n}"), &format!("other-{n}.example.com"))));
                self.inner.put(current).await;
            }
        }
        self.inner.replace(object).await
    }
}

#[tokio::test]
async fn test_conflicting_write_is_retried_from_fresh_read() {
    let store = RacingWriter::new(Memory::new([shared_gateway()]), 2);
    let a = ingress("ingress-a", "a.example.com");
    let owner = ServerOwner::for_ingress(&a);

    let outcome = reconcile_shared_gateway(&store, GATEWAY_NAMESPACE, GATEWAY_NAME, &owner, &servers_for(&a), &RetryConfig::immediate(5))
        .await
        .expect("reconcile after conflicts");
    assert_eq!(outcome, ReconcileOutcome::Updated);

    // both racing writes and this owner's servers survive
    let servers = live_servers(&store).await;
    assert_eq!(servers.len(), 3);
    assert_eq!(servers.last(), servers_for(&a).last());
    assert_eq!(servers.iter().filter(|server| owner.owns(server)).count(), 1);
}

#[tokio::test]
async fn test_conflict_retries_are_bounded() {
    let store = RacingWriter::new(Memory::new([shared_gateway()]), u32::MAX);
    let a = ingress("ingress-a", "a.example.com");
    let owner = ServerOwner::for_ingress(&a);

    let result = reconcile_shared_gateway(&store, GATEWAY_NAMESPACE, GATEWAY_NAME, &owner, &servers_for(&a), &RetryConfig::immediate(3)).await;
    match result {
        Err(e @ Error::RetriesExhausted { attempts: 3, .. }) => assert!(e.is_retryable()),
        other => panic!("expected RetriesExhausted, got {other:?}"),
    }
    assert!(live_servers(&store).await.iter().all(|server| !owner.owns(server)));
}
