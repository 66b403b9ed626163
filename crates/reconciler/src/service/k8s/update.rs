use kube::{api::PostParams, Resource, ResourceExt};

use crate::{service::Update, Result};

use super::{write_error, KubeObject, K8s};

impl<K: KubeObject> Update<K> for K8s {
    async fn replace(&self, object: &K) -> Result<K> {
        let namespace = self.object_namespace(object);
        let name = object.name_any();
        let api = self.get_namespace_api::<K>(&namespace);
        // the API server rejects the write with 409 unless metadata.resourceVersion is still current
        let replaced = api.replace(&name, &PostParams::default(), object).await.map_err(|e| write_error(object, &namespace, e))?;
        tracing::info!("[NG.K8s] replaced {} {}/{}", K::kind(&()), namespace, name);
        Ok(replaced)
    }
}
