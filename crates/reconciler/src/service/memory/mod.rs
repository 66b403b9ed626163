use std::{collections::BTreeMap, sync::Arc};

use kube::{Resource, ResourceExt};
use tokio::sync::Mutex;

use crate::{
    service::{Create, Retrieve, Update},
    Error, Result,
};

type ObjectKey = (String, String);

#[derive(Debug)]
struct Objects<K> {
    objects: BTreeMap<ObjectKey, K>,
    version: u64,
}

/// In-memory object store with the same optimistic concurrency behavior as the API server.
///
/// Every write stamps a fresh `resourceVersion`. Clones share the same storage.
#[derive(Debug, Clone)]
pub struct Memory<K> {
    inner: Arc<Mutex<Objects<K>>>,
}

impl<K> Default for Memory<K> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Objects {
                objects: BTreeMap::new(),
                version: 0,
            })),
        }
    }
}

fn key<K: Resource>(object: &K) -> ObjectKey {
    (object.namespace().unwrap_or_default(), object.name_any())
}

impl<K> Memory<K>
where
    K: Resource<DynamicType = ()> + Clone + Send + Sync,
{
    pub fn new(objects: impl IntoIterator<Item = K>) -> Self {
        let mut inner = Objects {
            objects: BTreeMap::new(),
            version: 0,
        };
        for mut object in objects {
            inner.version += 1;
            object.meta_mut().resource_version = Some(inner.version.to_string());
            inner.objects.insert(key(&object), object);
        }
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Every stored object, ordered by namespace and name.
    pub async fn objects(&self) -> Vec<K> {
        self.inner.lock().await.objects.values().cloned().collect()
    }

    /// Stores `object` unconditionally, as another writer would.
    pub async fn put(&self, mut object: K) -> K {
        let mut inner = self.inner.lock().await;
        inner.version += 1;
        object.meta_mut().resource_version = Some(inner.version.to_string());
        inner.objects.insert(key(&object), object.clone());
        object
    }
}

impl<K> Retrieve<K> for Memory<K>
where
    K: Resource<DynamicType = ()> + Clone + Send + Sync,
{
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<K>> {
        Ok(self.inner.lock().await.objects.get(&(namespace.to_string(), name.to_string())).cloned())
    }
}

impl<K> Create<K> for Memory<K>
where
    K: Resource<DynamicType = ()> + Clone + Send + Sync,
{
    async fn create(&self, object: &K) -> Result<K> {
        let key = key(object);
        let mut inner = self.inner.lock().await;
        if inner.objects.contains_key(&key) {
            return Err(Error::conflict(K::kind(&()), key.0, key.1));
        }
        inner.version += 1;
        let mut created = object.clone();
        created.meta_mut().resource_version = Some(inner.version.to_string());
        inner.objects.insert(key, created.clone());
        Ok(created)
    }
}

impl<K> Update<K> for Memory<K>
where
    K: Resource<DynamicType = ()> + Clone + Send + Sync,
{
    async fn replace(&self, object: &K) -> Result<K> {
        let key = key(object);
        let mut inner = self.inner.lock().await;
        let Some(stored) = inner.objects.get(&key) else {
            return Err(Error::Store(format!("{} {}/{} not found", K::kind(&()), key.0, key.1).into()));
        };
        if object.meta().resource_version.is_some() && object.meta().resource_version != stored.meta().resource_version {
            return Err(Error::conflict(K::kind(&()), key.0, key.1));
        }
        inner.version += 1;
        let mut replaced = object.clone();
        replaced.meta_mut().resource_version = Some(inner.version.to_string());
        inner.objects.insert(key, replaced.clone());
        Ok(replaced)
    }
}
