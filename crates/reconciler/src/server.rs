//! Construction of gateway servers from the TLS blocks of an ingress.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;
use netgate_model::{
    constants::{HTTPS_PORT, HTTP_PORT, HTTP_SERVER_PORT_NAME},
    HttpProtocol, Ingress, IngressTls, Port, PortProtocol, Server, ServerTlsSettings,
};

use crate::{naming, Error, Result};

/// Builds one HTTPS server per TLS block of `ingress`.
///
/// `origin_secrets` is keyed by `namespace/name`. When the proxy runs in the namespace of the secret
/// the secret is referenced by name, otherwise by the name of the copy made for the owner.
/// A missing secret fails the whole call. TLS blocks without hosts yield no server, and the port name
/// of every other block keeps the index of its position in `tls`.
pub fn make_tls_servers(ingress: &Ingress, tls: &[IngressTls], proxy_namespace: &str, origin_secrets: &BTreeMap<String, Secret>) -> Result<Vec<Server>> {
    let owner = ingress.name_any();
    let namespace = ingress.namespace().unwrap_or_default();
    tls.iter()
        .enumerate()
        .filter(|(index, tls)| {
            if tls.hosts.is_empty() {
                tracing::debug!("[NG.Server] {namespace}/{owner} tls block {index} has no hosts, skip");
            }
            !tls.hosts.is_empty()
        })
        .map(|(index, tls)| {
            let key = tls.secret_key();
            let secret = origin_secrets.get(&key).ok_or_else(|| Error::SecretNotFound {
                owner: format!("{namespace}/{owner}"),
                key: key.clone(),
            })?;
            let secret_namespace = secret.namespace().unwrap_or_default();
            let credential_name = if secret_namespace == proxy_namespace {
                secret.name_any()
            } else {
                naming::target_secret_name(&owner, &secret_namespace, &secret.name_any())
            };
            Ok(Server {
                hosts: tls.hosts.clone(),
                port: Port {
                    name: naming::port_name(&namespace, &owner, index),
                    number: HTTPS_PORT,
                    protocol: PortProtocol::Https,
                    ..Default::default()
                },
                tls: Some(ServerTlsSettings::simple(Some(credential_name))),
                ..Default::default()
            })
        })
        .collect()
}

/// The plain HTTP server for `hosts`, if HTTP is not disabled and there is at least one host.
pub fn make_http_server(protocol: HttpProtocol, hosts: Vec<String>) -> Option<Server> {
    if hosts.is_empty() {
        return None;
    }
    let tls = match protocol {
        HttpProtocol::Disabled => return None,
        HttpProtocol::Enabled => None,
        HttpProtocol::Redirected => Some(ServerTlsSettings::https_redirect()),
    };
    Some(Server {
        hosts,
        port: Port {
            name: HTTP_SERVER_PORT_NAME.to_string(),
            number: HTTP_PORT,
            protocol: PortProtocol::Http,
            ..Default::default()
        },
        tls,
        ..Default::default()
    })
}
