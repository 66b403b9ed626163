pub const GATEWAY_KIND: &str = "Gateway";

/// Label on generated gateways mapping to the name of the owning ingress.
pub const INGRESS_LABEL_KEY: &str = "networking.netgate.io/ingress";

pub const HTTP_SERVER_PORT_NAME: &str = "http-server";
pub const HTTP_PORT: u32 = 80;
pub const WILDCARD_HTTPS_PORT_NAME: &str = "https";
pub const HTTPS_PORT: u32 = 443;

pub const PLACEHOLDER_PORT_NAME: &str = "placeholder";
pub const PLACEHOLDER_PORT: u32 = 9999;

pub const TLS_CERT_KEY: &str = "tls.crt";
pub const TLS_PRIVATE_KEY_KEY: &str = "tls.key";

pub const DEFAULT_NAMESPACE: &str = "default";
