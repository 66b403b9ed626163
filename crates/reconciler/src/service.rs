//! Object store backends and the traits the reconciler talks to them through.
//!
//! Writes are optimistic: an object carrying a `resourceVersion` is only written if the stored object still has
//! that version, otherwise the write fails with [`Error::Conflict`](crate::Error::Conflict).

use futures_util::Future;

use crate::Result;

#[cfg(feature = "k8s")]
pub mod k8s;
pub mod memory;

pub trait Retrieve<K>: Sync + Send {
    /// `Ok(None)` when the object does not exist.
    fn get(&self, namespace: &str, name: &str) -> impl Future<Output = Result<Option<K>>> + Send;
}

pub trait Create<K>: Sync + Send {
    /// Fails with a conflict when an object with the same namespace and name already exists.
    fn create(&self, object: &K) -> impl Future<Output = Result<K>> + Send;
}

pub trait Update<K>: Sync + Send {
    /// Replaces the stored object, checking the `resourceVersion` of `object` when set.
    fn replace(&self, object: &K) -> impl Future<Output = Result<K>> + Send;
}

/// A store the reconciler can read and write objects of kind `K` in.
pub trait ObjectStore<K>: Retrieve<K> + Create<K> + Update<K> {}

impl<K, S> ObjectStore<K> for S where S: Retrieve<K> + Create<K> + Update<K> {}
