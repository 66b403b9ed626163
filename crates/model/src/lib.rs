//! Resource models shared by the netgate reconciler: the Istio `Gateway` and `DestinationRule`
//! custom resources it writes and the `Ingress` routing intent it reads.
pub mod constants;

pub mod gateway;
pub use gateway::*;

pub mod destination_rule;
pub use destination_rule::*;

pub mod ingress;
pub use ingress::*;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
pub type BoxResult<T> = Result<T, BoxError>;
