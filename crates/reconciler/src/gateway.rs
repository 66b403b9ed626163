//! Assembly of complete gateways for ingresses and wildcard certificates, plus lookups over gateways.

use std::collections::BTreeMap;

use k8s_openapi::{
    api::core::v1::{ObjectReference, Secret, Service},
    apimachinery::pkg::apis::meta::v1::ObjectMeta,
};
use kube::{Resource, ResourceExt};
use netgate_model::{
    constants::{GATEWAY_KIND, HTTPS_PORT, HTTP_SERVER_PORT_NAME, INGRESS_LABEL_KEY, WILDCARD_HTTPS_PORT_NAME},
    Gateway, GatewaySpec, HttpProtocol, Ingress, Port, PortProtocol, Server, ServerTlsSettings,
};

use crate::{
    naming,
    server::{make_http_server, make_tls_servers},
    Error, Result,
};

/// The proxy service a gateway is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GatewayService {
    pub namespace: String,
    pub name: String,
    pub selector: BTreeMap<String, String>,
}

impl From<&Service> for GatewayService {
    fn from(service: &Service) -> Self {
        GatewayService {
            namespace: service.namespace().unwrap_or_default(),
            name: service.name_any(),
            selector: service.spec.as_ref().and_then(|spec| spec.selector.clone()).unwrap_or_default(),
        }
    }
}

/// A wildcard hostname (e.g. `*.example.com`) and the secret holding its certificate.
#[derive(Debug, Clone)]
pub struct WildcardCertificate {
    pub hostname: String,
    pub secret: Secret,
}

/// One gateway per wildcard certificate, placed in the namespace of the certificate secret.
pub fn make_wildcard_gateways(certificates: &BTreeMap<String, WildcardCertificate>, gateway_service: &GatewayService, http_protocol: HttpProtocol) -> Result<Vec<Gateway>> {
    certificates.values().map(|certificate| make_wildcard_gateway(certificate, gateway_service, http_protocol)).collect()
}

fn make_wildcard_gateway(certificate: &WildcardCertificate, gateway_service: &GatewayService, http_protocol: HttpProtocol) -> Result<Gateway> {
    let secret = &certificate.secret;
    let secret_name = secret.name_any();
    let secret_namespace = secret.namespace().unwrap_or_default();
    if certificate.hostname.is_empty() {
        return Err(Error::InvalidCertificate {
            secret: format!("{secret_namespace}/{secret_name}"),
            reason: "no wildcard hostname".to_string(),
        });
    }
    let credential_name = if secret_namespace == gateway_service.namespace {
        secret_name.clone()
    } else {
        naming::wildcard_credential_name(&secret_namespace, &secret_name)
    };
    let mut servers = vec![Server {
        hosts: vec![certificate.hostname.clone()],
        port: Port {
            name: WILDCARD_HTTPS_PORT_NAME.to_string(),
            number: HTTPS_PORT,
            protocol: PortProtocol::Https,
            ..Default::default()
        },
        tls: Some(ServerTlsSettings::simple(Some(credential_name))),
        ..Default::default()
    }];
    servers.extend(make_http_server(http_protocol, vec![certificate.hostname.clone()]));
    Ok(Gateway {
        metadata: ObjectMeta {
            name: Some(naming::wildcard_gateway_name(&secret_name, &gateway_service.namespace, &gateway_service.name)),
            namespace: Some(secret_namespace),
            owner_references: secret.controller_owner_ref(&()).map(|owner| vec![owner]),
            ..Default::default()
        },
        spec: GatewaySpec {
            selector: gateway_service.selector.clone(),
            servers,
        },
    })
}

/// One gateway per gateway service for `ingress`, carrying its TLS servers and its HTTP server.
///
/// An ingress without any hosts gets the placeholder server.
pub fn make_ingress_gateways(
    ingress: &Ingress,
    origin_secrets: &BTreeMap<String, Secret>,
    gateway_services: &[GatewayService],
    http_protocol: HttpProtocol,
) -> Result<Vec<Gateway>> {
    gateway_services
        .iter()
        .map(|gateway_service| {
            let mut servers = make_tls_servers(ingress, &ingress.spec.tls, &gateway_service.namespace, origin_secrets)?;
            servers.extend(make_http_server(ingress.http_protocol(http_protocol), ingress.hosts()));
            if servers.is_empty() {
                servers.push(Server::placeholder());
            }
            Ok(make_ingress_gateway(ingress, gateway_service, servers))
        })
        .collect()
}

fn make_ingress_gateway(ingress: &Ingress, gateway_service: &GatewayService, servers: Vec<Server>) -> Gateway {
    let owner = ingress.name_any();
    Gateway {
        metadata: ObjectMeta {
            name: Some(naming::gateway_name(&owner, &gateway_service.namespace, &gateway_service.name)),
            namespace: ingress.namespace(),
            labels: Some(BTreeMap::from([(INGRESS_LABEL_KEY.to_string(), owner)])),
            owner_references: ingress.controller_owner_ref(&()).map(|owner| vec![owner]),
            ..Default::default()
        },
        spec: GatewaySpec {
            selector: gateway_service.selector.clone(),
            servers,
        },
    }
}

/// Identifies the servers one owner contributed to a shared gateway by their port name prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOwner {
    prefix: String,
}

impl ServerOwner {
    pub fn new(namespace: &str, name: &str) -> Self {
        ServerOwner {
            prefix: format!("{}:", naming::port_name_prefix(namespace, name)),
        }
    }

    pub fn for_ingress(ingress: &Ingress) -> Self {
        Self::new(&ingress.namespace().unwrap_or_default(), &ingress.name_any())
    }

    pub fn owns(&self, server: &Server) -> bool {
        server.port.name.starts_with(&self.prefix)
    }

    pub fn owned(&self, servers: &[Server]) -> Vec<Server> {
        servers.iter().filter(|server| self.owns(server)).cloned().collect()
    }
}

/// The servers of `gateway` that were generated for `ingress`.
pub fn owned_servers(gateway: &Gateway, ingress: &Ingress) -> Vec<Server> {
    ServerOwner::for_ingress(ingress).owned(&gateway.spec.servers)
}

/// The plain HTTP server of `gateway`, if any.
pub fn http_server(gateway: &Gateway) -> Option<&Server> {
    gateway.spec.servers.iter().find(|server| server.port.name == HTTP_SERVER_PORT_NAME)
}

/// `namespace/name` of every gateway, in order.
pub fn qualified_gateway_names(gateways: &[Gateway]) -> Vec<String> {
    gateways.iter().map(|gateway| format!("{}/{}", gateway.namespace().unwrap_or_default(), gateway.name_any())).collect()
}

pub fn gateway_ref(gateway: &Gateway) -> ObjectReference {
    ObjectReference {
        api_version: Some(Gateway::api_version(&()).to_string()),
        kind: Some(GATEWAY_KIND.to_string()),
        name: gateway.metadata.name.clone(),
        namespace: gateway.metadata.namespace.clone(),
        ..Default::default()
    }
}
