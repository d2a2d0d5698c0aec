use log::debug;
use std::sync::Arc;
use tokio::time::{sleep, timeout, Duration};

use crate::controllers::client::ClusterClient;
use crate::controllers::namespace::{staging_selector, NamespaceController, PRELOAD_NAMESPACE};
use crate::controllers::observer::PreloadObserver;
use crate::models::job::Job;
use crate::utils::error::Error;
use crate::workflows::daemonset::build_preload_daemonset;
use crate::workflows::extract::extract_images;

/// Upper bound for sweeping the staging namespaces.
const CLEANUP_TIMEOUT: Duration = Duration::from_secs(5 * 60);

pub struct PreloadController {
    client: Arc<dyn ClusterClient>,
    namespaces: NamespaceController,
    observer: Arc<dyn PreloadObserver>,
}

impl PreloadController {
    pub fn new(client: Arc<dyn ClusterClient>, observer: Arc<dyn PreloadObserver>) -> Self {
        let namespaces = NamespaceController::new(client.clone());

        PreloadController {
            client,
            namespaces,
            observer,
        }
    }

    /// Makes every node pull the images referenced by `job` before its objects are created.
    ///
    /// Extracts the images, creates the staging namespace and the preload DaemonSet, waits
    /// for the job's pre-load period and deletes all staging namespaces. Jobs without
    /// images leave the cluster untouched.
    ///
    /// A failed DaemonSet creation skips the wait but still attempts the cleanup. A failed
    /// namespace creation returns immediately with a fatal error.
    pub async fn preload_images(&self, job: &Job) -> Result<(), Error> {
        self.observer.started(&job.name);

        let images = extract_images(job).map_err(Error::preload)?;
        if images.is_empty() {
            self.observer.no_images(&job.name);
            return Ok(());
        }

        self.namespaces
            .create_staging_namespace(&job.namespace_labels, &job.namespace_annotations)
            .await
            .map_err(Error::preload)?;

        let created = self.create_daemonset(&images, job).await;
        if created.is_ok() {
            self.observer.sleeping(job.pre_load_period);
            sleep(job.pre_load_period).await;
        }

        let cleaned = self.cleanup().await;
        if let Err(err) = &cleaned {
            self.observer.cleanup_failed(err);
        }

        created.map_err(Error::preload)?;
        cleaned.map_err(Error::preload)
    }

    /// Deletes every staging namespace on the cluster, not only the ones created by this process.
    pub async fn cleanup(&self) -> Result<(), Error> {
        let selector = staging_selector();

        let result = timeout(
            CLEANUP_TIMEOUT,
            self.namespaces.cleanup_staging_namespaces(&selector),
        )
        .await;

        match result {
            Ok(result) => result,
            Err(_) => Err(Error::CleanupError {
                selector,
                source: Box::new(Error::Timeout(CLEANUP_TIMEOUT)),
            }),
        }
    }

    async fn create_daemonset(&self, images: &[String], job: &Job) -> Result<(), Error> {
        let daemonset = build_preload_daemonset(images, &job.pre_load_node_labels);
        debug!(
            "preload DaemonSet for job {} has {} init containers",
            job.name,
            images.len()
        );

        self.observer.pulling(images, PRELOAD_NAMESPACE);
        self.client
            .create_daemonset(PRELOAD_NAMESPACE, &daemonset)
            .await
            .map_err(|source| Error::WorkloadCreateError {
                namespace: PRELOAD_NAMESPACE.to_string(),
                source: Box::new(source),
            })
    }
}
