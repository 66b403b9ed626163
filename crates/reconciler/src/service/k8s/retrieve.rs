use crate::{service::Retrieve, Result};

use super::{KubeObject, K8s};

impl<K: KubeObject> Retrieve<K> for K8s {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<K>> {
        let api = self.get_namespace_api::<K>(namespace);
        Ok(api.get_opt(name).await?)
    }
}
