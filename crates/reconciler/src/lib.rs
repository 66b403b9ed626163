#![warn(clippy::indexing_slicing, clippy::unwrap_used, clippy::dbg_macro, clippy::undocumented_unsafe_blocks)]
//! This crate translates the routing intent of an [`Ingress`](netgate_model::Ingress) into servers of Istio
//! gateways, and keeps gateways shared by many ingresses converged without clobbering servers it does not own.
//!
//! Building blocks, leaves first:
//! - [`naming`]: deterministic gateway, port and credential names
//! - [`server`] and [`gateway`]: construction of servers and complete gateways
//! - [`merge`]: merging one owner's servers into a shared server list
//! - [`reconcile`]: read-compare-write against an object store, retried on conflict
//! - [`service`]: object store backends

pub mod config;
pub mod error;
pub mod gateway;
pub mod merge;
pub mod naming;
pub mod reconcile;
pub mod retry;
pub mod server;
/// Object store backends and services traits
pub mod service;

pub use error::{Error, Result};
pub use netgate_model as model;
