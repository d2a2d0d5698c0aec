use async_trait::async_trait;
use k8s_openapi::api::apps::v1::DaemonSet;
use k8s_openapi::api::core::v1::Namespace;
use kube::api::{DeleteParams, ListParams, ObjectMeta, PostParams};
use kube::{Api, Client, ResourceExt};
use kube_runtime::wait::{await_condition, conditions};
use log::debug;
use std::collections::BTreeMap;

#[cfg(test)]
use mockall::automock;

use crate::utils::error::Error;

/// The cluster operations pre-loading needs.
///
/// Abstracted so the orchestration can be exercised without a cluster.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterClient: Send + Sync {
    async fn create_namespace(
        &self,
        name: &str,
        labels: &BTreeMap<String, String>,
        annotations: &BTreeMap<String, String>,
    ) -> Result<(), Error>;

    async fn create_daemonset(&self, namespace: &str, daemonset: &DaemonSet) -> Result<(), Error>;

    /// Names of every namespace matching `label_selector`.
    async fn list_namespaces(&self, label_selector: &str) -> Result<Vec<String>, Error>;

    /// Deletes a namespace and waits until it is gone. A missing namespace is not an error.
    async fn delete_namespace(&self, name: &str) -> Result<(), Error>;
}

pub struct KubeClusterClient {
    client: Client,
}

impl KubeClusterClient {
    pub fn new(client: Client) -> Self {
        KubeClusterClient { client }
    }
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn create_namespace(
        &self,
        name: &str,
        labels: &BTreeMap<String, String>,
        annotations: &BTreeMap<String, String>,
    ) -> Result<(), Error> {
        debug!("creating namespace {}", name);

        let api: Api<Namespace> = Api::all(self.client.clone());
        let namespace = Namespace {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                labels: Some(labels.clone()),
                annotations: Some(annotations.clone()),
                ..ObjectMeta::default()
            },
            ..Namespace::default()
        };

        api.create(&PostParams::default(), &namespace).await?;
        Ok(())
    }

    async fn create_daemonset(&self, namespace: &str, daemonset: &DaemonSet) -> Result<(), Error> {
        let api: Api<DaemonSet> = Api::namespaced(self.client.clone(), namespace);

        let created = api.create(&PostParams::default(), daemonset).await?;
        debug!("created DaemonSet {} in namespace {}", created.name(), namespace);
        Ok(())
    }

    async fn list_namespaces(&self, label_selector: &str) -> Result<Vec<String>, Error> {
        let api: Api<Namespace> = Api::all(self.client.clone());

        let namespaces = api.list(&ListParams::default().labels(label_selector)).await?;
        Ok(namespaces.items.iter().map(|namespace| namespace.name()).collect())
    }

    async fn delete_namespace(&self, name: &str) -> Result<(), Error> {
        let api: Api<Namespace> = Api::all(self.client.clone());

        let deleted = match api.delete(name, &DeleteParams::default()).await {
            Ok(deleted) => deleted,
            Err(kube::Error::Api(response)) if response.code == 404 => return Ok(()),
            Err(err) => return Err(err.into()),
        };

        // Namespace finalization is asynchronous, wait for the object to disappear.
        if let Some(namespace) = deleted.left() {
            if let Some(uid) = namespace.metadata.uid {
                debug!("waiting for namespace {} to be deleted", name);
                await_condition(api, name, conditions::is_deleted(&uid)).await?;
            }
        }

        Ok(())
    }
}
