//! Deterministic names for generated gateways, server ports and credentials.
//!
//! Every name is a pure function of its inputs. Owner names containing `.` cannot be used verbatim
//! because they are joined with other dot-delimited data, so they are replaced by their checksum.
//! A plain owner whose name is exactly that decimal checksum therefore shares its names with the dotted owner.

use std::borrow::Cow;

/// Adler-32 checksum of the UTF-8 bytes of `key`.
pub fn checksum(key: &str) -> u32 {
    adler::adler32_slice(key.as_bytes())
}

/// The owner name as it appears inside generated names.
pub fn owner_component(name: &str) -> Cow<'_, str> {
    if name.contains('.') {
        Cow::Owned(checksum(name).to_string())
    } else {
        Cow::Borrowed(name)
    }
}

fn service_key(svc_namespace: &str, svc_name: &str) -> String {
    format!("{svc_namespace}/{svc_name}")
}

/// Name of the gateway generated for an ingress and bound to one gateway service.
pub fn gateway_name(owner: &str, svc_namespace: &str, svc_name: &str) -> String {
    format!("{}-{}", owner_component(owner), checksum(&service_key(svc_namespace, svc_name)))
}

/// Name of the gateway generated for a wildcard certificate secret.
pub fn wildcard_gateway_name(secret_name: &str, svc_namespace: &str, svc_name: &str) -> String {
    format!("wildcard-{}", checksum(&format!("{secret_name}/{svc_namespace}/{svc_name}")))
}

/// Every port name generated for an owner starts with this prefix.
pub fn port_name_prefix(namespace: &str, owner: &str) -> String {
    format!("{namespace}/{}", owner_component(owner))
}

pub fn port_name(namespace: &str, owner: &str, index: usize) -> String {
    format!("{}:{index}", port_name_prefix(namespace, owner))
}

/// Credential name for a secret living outside of the gateway service namespace.
pub fn target_secret_name(owner: &str, secret_namespace: &str, secret_name: &str) -> String {
    format!("{}-{}", owner_component(owner), checksum(&format!("{secret_namespace}/{secret_name}")))
}

pub fn wildcard_credential_name(secret_namespace: &str, secret_name: &str) -> String {
    format!("{secret_namespace}-{secret_name}")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_checksum_is_adler32() {
        // reference value of Adler-32 for "Wikipedia"
        assert_eq!(checksum("Wikipedia"), 0x11E6_0398);
        assert_eq!(checksum(""), 1);
    }

    #[test]
    fn test_gateway_name() {
        assert_eq!(gateway_name("ingress", "istio-system", "gateway"), format!("ingress-{}", checksum("istio-system/gateway")));
        assert_eq!(
            gateway_name("ingress.com", "istio-system", "istio-ingressgateway"),
            format!("{}-{}", checksum("ingress.com"), checksum("istio-system/istio-ingressgateway"))
        );
        // pure function of the inputs
        assert_eq!(gateway_name("ingress", "istio-system", "gateway"), gateway_name("ingress", "istio-system", "gateway"));
    }

    #[test]
    fn test_owner_component_collisions_need_an_all_digit_name() {
        // a dotted owner is rendered as a decimal number
        let dotted = owner_component("ingress.com");
        assert!(dotted.chars().all(|c| c.is_ascii_digit()));
        assert_ne!(owner_component("ingress"), dotted);

        // so a plain owner named exactly that number shares every generated name with it
        let digits = checksum("ingress.com").to_string();
        assert_eq!(owner_component(&digits), dotted);
        assert_eq!(gateway_name(&digits, "istio-system", "istio-ingressgateway"), gateway_name("ingress.com", "istio-system", "istio-ingressgateway"));
        assert_eq!(port_name_prefix("test-ns", &digits), port_name_prefix("test-ns", "ingress.com"));

        // any other plain name keeps a character no checksum has
        for plain in ["ingress", "ingress-1", "1ingress"] {
            assert_ne!(owner_component(plain), dotted);
        }
    }

    #[test]
    fn test_port_name() {
        assert_eq!(port_name("test-ns", "ingress", 0), "test-ns/ingress:0");
        assert_eq!(port_name("test-ns", "ingress.com", 2), format!("test-ns/{}:2", checksum("ingress.com")));
        assert!(port_name("test-ns", "ingress", 1).starts_with(&port_name_prefix("test-ns", "ingress")));
    }

    #[test]
    fn test_credential_names() {
        assert_eq!(target_secret_name("ingress", "knative-testing", "secret0"), format!("ingress-{}", checksum("knative-testing/secret0")));
        assert_ne!(
            target_secret_name("ingress", "knative-testing", "secret0"),
            target_secret_name("ingress", "other-ns", "secret0")
        );
        assert_eq!(wildcard_credential_name("knative-testing", "secret0"), "knative-testing-secret0");
    }

    #[test]
    fn test_wildcard_gateway_name() {
        let name = wildcard_gateway_name("secret0", "istio-system", "istio-ingressgateway");
        assert_eq!(name, format!("wildcard-{}", checksum("secret0/istio-system/istio-ingressgateway")));
        assert_ne!(name, wildcard_gateway_name("secret0", "knative-testing", "istio-ingressgateway"));
    }
}
