use std::path::PathBuf;

use clap::Parser;
use netgate_model::constants::DEFAULT_NAMESPACE;
use serde::{Deserialize, Serialize};

/// Netgate reconcile arguments
#[derive(Debug, Serialize, Deserialize, Clone, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// The reconciler config file path, built in defaults are used when omitted
    ///
    /// # Example
    /// `-c /etc/netgate/config.toml`
    #[arg(short, long, env = "NETGATE_CONFIG")]
    pub config: Option<PathBuf>,
    /// Namespace of the ingress
    #[arg(short, long, env = "NETGATE_NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    pub namespace: String,
    /// Name of the ingress to reconcile
    #[arg(short, long, env = "NETGATE_INGRESS")]
    pub ingress: String,
    /// Remove the servers of the ingress from the shared gateways instead of reconciling them
    #[arg(long)]
    pub finalize: bool,
    /// Reconcile against an in-memory copy of the cluster objects and print the result instead of writing
    #[arg(long)]
    pub dry_run: bool,
}
