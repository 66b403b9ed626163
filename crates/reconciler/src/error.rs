//! Error type of the reconciler.

use netgate_model::BoxError;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A TLS block references a secret that is not in the supplied secret map.
    #[error("secret {key} referenced by {owner} not found")]
    SecretNotFound { owner: String, key: String },

    #[error("invalid wildcard certificate in secret {secret}: {reason}")]
    InvalidCertificate { secret: String, reason: String },

    #[error("unexpected gateway service url form: {0}")]
    InvalidServiceUrl(String),

    #[error("gateway service {namespace}/{name} not found")]
    ServiceNotFound { namespace: String, name: String },

    #[error("gateway {namespace}/{name} not found")]
    GatewayNotFound { namespace: String, name: String },

    #[error("{kind} {namespace}/{name} is not controlled by {owner}")]
    NotOwned { kind: String, namespace: String, name: String, owner: String },

    /// Optimistic concurrency failure: the object changed since it was read.
    #[error("conflict writing {kind} {namespace}/{name}")]
    Conflict { kind: String, namespace: String, name: String },

    #[error("{operation} still conflicting after {attempts} attempts")]
    RetriesExhausted { operation: String, attempts: u32 },

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid retry config: {0}")]
    InvalidRetry(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Failure of an object store backend, passed through unchanged.
    #[error(transparent)]
    Store(BoxError),

    #[cfg(feature = "k8s")]
    #[error(transparent)]
    Kube(#[from] kube::Error),
}

impl Error {
    pub fn conflict(kind: impl Into<String>, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Error::Conflict {
            kind: kind.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }

    /// Whether the caller should requeue and try the whole reconciliation again later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Conflict { .. } | Error::RetriesExhausted { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_error_classification() {
        let conflict = Error::conflict("Gateway", "istio-system", "knative-ingress-gateway");
        assert!(conflict.is_conflict());
        assert!(conflict.is_retryable());
        assert_eq!(conflict.to_string(), "conflict writing Gateway istio-system/knative-ingress-gateway");

        let exhausted = Error::RetriesExhausted {
            operation: "reconcile Gateway".to_string(),
            attempts: 5,
        };
        assert!(!exhausted.is_conflict());
        assert!(exhausted.is_retryable());

        let missing = Error::SecretNotFound {
            owner: "test-ns/ingress".to_string(),
            key: "knative-testing/secret0".to_string(),
        };
        assert!(!missing.is_retryable());
        assert!(missing.to_string().contains("knative-testing/secret0"));
    }
}
