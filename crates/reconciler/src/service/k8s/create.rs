use kube::{api::PostParams, Resource, ResourceExt};

use crate::{service::Create, Result};

use super::{write_error, KubeObject, K8s};

impl<K: KubeObject> Create<K> for K8s {
    async fn create(&self, object: &K) -> Result<K> {
        let namespace = self.object_namespace(object);
        let api = self.get_namespace_api::<K>(&namespace);
        let created = api.create(&PostParams::default(), object).await.map_err(|e| write_error(object, &namespace, e))?;
        tracing::info!("[NG.K8s] created {} {}/{}", K::kind(&()), namespace, created.name_any());
        Ok(created)
    }
}
