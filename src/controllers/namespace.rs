use log::{debug, info};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::controllers::client::ClusterClient;
use crate::utils::error::Error;

pub const PRELOAD_NAMESPACE: &str = "preload-image-preloader";
pub const PRELOAD_LABEL: &str = "image-preloader-preload";
pub const PRELOAD_LABEL_VALUE: &str = "true";

/// Label selector matching every staging namespace, whichever run created it.
pub fn staging_selector() -> String {
    format!("{}={}", PRELOAD_LABEL, PRELOAD_LABEL_VALUE)
}

pub struct NamespaceController {
    client: Arc<dyn ClusterClient>,
}

impl NamespaceController {
    pub fn new(client: Arc<dyn ClusterClient>) -> Self {
        NamespaceController { client }
    }

    /// Creates the staging namespace with the caller's labels and annotations.
    ///
    /// The staging marker label always wins over a caller label with the same key.
    /// Failure is fatal for the pre-load run.
    pub async fn create_staging_namespace(
        &self,
        labels: &BTreeMap<String, String>,
        annotations: &BTreeMap<String, String>,
    ) -> Result<(), Error> {
        let mut namespace_labels = labels.clone();
        namespace_labels.insert(PRELOAD_LABEL.to_string(), PRELOAD_LABEL_VALUE.to_string());

        self.client
            .create_namespace(PRELOAD_NAMESPACE, &namespace_labels, annotations)
            .await
            .map_err(|source| Error::NamespaceCreateError {
                namespace: PRELOAD_NAMESPACE.to_string(),
                source: Box::new(source),
            })
    }

    /// Deletes every namespace matching `selector`, one at a time.
    ///
    /// Stops at the first failure; nothing is retried.
    pub async fn cleanup_staging_namespaces(&self, selector: &str) -> Result<(), Error> {
        let cleanup_error = |source: Error| Error::CleanupError {
            selector: selector.to_string(),
            source: Box::new(source),
        };

        let namespaces = self
            .client
            .list_namespaces(selector)
            .await
            .map_err(cleanup_error)?;
        debug!("namespaces matching {}: {:?}", selector, namespaces);

        for namespace in &namespaces {
            info!("Deleting namespace {}", namespace);
            self.client
                .delete_namespace(namespace)
                .await
                .map_err(cleanup_error)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use mockall::Sequence;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use super::{staging_selector, NamespaceController, PRELOAD_NAMESPACE};
    use crate::controllers::client::MockClusterClient;
    use crate::utils::error::Error;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn staging_marker_wins_over_caller_labels() {
        let mut client = MockClusterClient::new();
        client
            .expect_create_namespace()
            .withf(|name, labels, annotations| {
                name == PRELOAD_NAMESPACE
                    && labels.get("image-preloader-preload").map(String::as_str) == Some("true")
                    && labels.get("team").map(String::as_str) == Some("perf")
                    && annotations.get("owner").map(String::as_str) == Some("ci")
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        let controller = NamespaceController::new(Arc::new(client));

        let result = controller
            .create_staging_namespace(
                &labels(&[("image-preloader-preload", "false"), ("team", "perf")]),
                &labels(&[("owner", "ci")]),
            )
            .await;

        tokio_test::assert_ok!(result);
    }

    #[tokio::test]
    async fn namespace_create_failure_is_fatal() {
        let mut client = MockClusterClient::new();
        client
            .expect_create_namespace()
            .returning(|_, _, _| Err(Error::ConfigError("forbidden".to_string())));
        let controller = NamespaceController::new(Arc::new(client));

        let err = controller
            .create_staging_namespace(&BTreeMap::new(), &BTreeMap::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NamespaceCreateError { .. }));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn cleanup_deletes_every_namespace_matching_the_marker() {
        let mut client = MockClusterClient::new();
        let mut seq = Sequence::new();
        client
            .expect_list_namespaces()
            .with(eq("image-preloader-preload=true"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec!["preload-image-preloader".to_string(), "stale".to_string()]));
        client
            .expect_delete_namespace()
            .with(eq("preload-image-preloader"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        client
            .expect_delete_namespace()
            .with(eq("stale"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        let controller = NamespaceController::new(Arc::new(client));

        tokio_test::assert_ok!(controller.cleanup_staging_namespaces(&staging_selector()).await);
    }

    #[tokio::test]
    async fn cleanup_failure_is_not_fatal() {
        let mut client = MockClusterClient::new();
        client
            .expect_list_namespaces()
            .returning(|_| Ok(vec!["a".to_string(), "b".to_string()]));
        client
            .expect_delete_namespace()
            .with(eq("a"))
            .times(1)
            .returning(|_| Err(Error::ConfigError("conflict".to_string())));
        let controller = NamespaceController::new(Arc::new(client));

        let err = controller
            .cleanup_staging_namespaces(&staging_selector())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::CleanupError { .. }));
        assert_eq!(err.is_fatal(), false);
    }
}
