use k8s_openapi::api::apps::v1::{DaemonSet, DaemonSetSpec};
use k8s_openapi::api::core::v1::{Container, PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::api::ObjectMeta;
use std::collections::BTreeMap;

pub const PRELOAD_NAME: &str = "preload";
pub const PAUSE_IMAGE: &str = "registry.k8s.io/pause:3.1";
const PULL_ALWAYS: &str = "Always";

/// Builds the DaemonSet that makes every matching node pull each of `images`.
///
/// Every image gets its own init container, in the given order, that exits right after
/// its image is pulled. A pause container keeps the pod around until the namespace is
/// deleted. An empty `node_selector` schedules onto every node.
pub fn build_preload_daemonset(
    images: &[String],
    node_selector: &BTreeMap<String, String>,
) -> DaemonSet {
    let labels: BTreeMap<String, String> = [("app".to_string(), PRELOAD_NAME.to_string())]
        .iter()
        .cloned()
        .collect();

    let init_containers: Vec<Container> = images
        .iter()
        .enumerate()
        .map(|(i, image)| Container {
            name: format!("container-{}", i),
            image: Some(image.clone()),
            image_pull_policy: Some(PULL_ALWAYS.to_string()),
            command: Some(vec![
                "echo".to_string(),
                format!("init container-{} completed", i),
            ]),
            ..Container::default()
        })
        .collect();

    // Only the Always restart policy is allowed in a DaemonSet, so the pause container never exits.
    let sleep = Container {
        name: "sleep".to_string(),
        image: Some(PAUSE_IMAGE.to_string()),
        image_pull_policy: Some(PULL_ALWAYS.to_string()),
        ..Container::default()
    };

    DaemonSet {
        metadata: ObjectMeta {
            generate_name: Some(PRELOAD_NAME.to_string()),
            ..ObjectMeta::default()
        },
        spec: Some(DaemonSetSpec {
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..LabelSelector::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..ObjectMeta::default()
                }),
                spec: Some(PodSpec {
                    termination_grace_period_seconds: Some(0),
                    init_containers: Some(init_containers),
                    containers: vec![sleep],
                    node_selector: Some(node_selector.clone()),
                    ..PodSpec::default()
                }),
            },
            ..DaemonSetSpec::default()
        }),
        ..DaemonSet::default()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{build_preload_daemonset, PAUSE_IMAGE};

    fn images(images: &[&str]) -> Vec<String> {
        images.iter().map(|image| image.to_string()).collect()
    }

    #[test]
    fn keeps_one_init_container_per_image_in_order() {
        let daemonset = build_preload_daemonset(&images(&["A", "B", "A"]), &BTreeMap::new());
        let pod_spec = daemonset.spec.unwrap().template.spec.unwrap();
        let init_containers = pod_spec.init_containers.unwrap();

        let init_images: Vec<String> = init_containers
            .iter()
            .map(|container| container.image.clone().unwrap())
            .collect();
        assert_eq!(init_images, vec!["A", "B", "A"]);

        assert_eq!(init_containers[1].name, "container-1");
        assert_eq!(
            init_containers[1].command,
            Some(vec!["echo".to_string(), "init container-1 completed".to_string()])
        );
        for container in &init_containers {
            assert_eq!(container.image_pull_policy.as_deref(), Some("Always"));
        }

        assert_eq!(pod_spec.containers.len(), 1);
        assert_eq!(pod_spec.containers[0].image.as_deref(), Some(PAUSE_IMAGE));
        assert_eq!(pod_spec.containers[0].image_pull_policy.as_deref(), Some("Always"));
    }

    #[test]
    fn can_be_deleted_immediately() {
        let daemonset = build_preload_daemonset(&images(&["img1"]), &BTreeMap::new());
        let pod_spec = daemonset.spec.unwrap().template.spec.unwrap();

        assert_eq!(pod_spec.termination_grace_period_seconds, Some(0));
    }

    #[test]
    fn selector_matches_pod_labels() {
        let daemonset = build_preload_daemonset(&images(&["img1"]), &BTreeMap::new());
        let spec = daemonset.spec.unwrap();

        assert_eq!(daemonset.metadata.generate_name.as_deref(), Some("preload"));
        assert_eq!(
            spec.selector.match_labels,
            spec.template.metadata.unwrap().labels
        );
        assert_eq!(spec.selector.match_labels.unwrap()["app"], "preload");
    }

    #[test]
    fn uses_node_selector() {
        let mut node_selector = BTreeMap::new();
        node_selector.insert("node-role.kubernetes.io/worker".to_string(), "".to_string());

        let daemonset = build_preload_daemonset(&images(&["img1"]), &node_selector);
        let pod_spec = daemonset.spec.unwrap().template.spec.unwrap();

        assert_eq!(pod_spec.node_selector, Some(node_selector));
    }

    #[test]
    fn empty_node_selector_targets_all_nodes() {
        let daemonset = build_preload_daemonset(&images(&["img1"]), &BTreeMap::new());
        let pod_spec = daemonset.spec.unwrap().template.spec.unwrap();

        assert_eq!(pod_spec.node_selector, Some(BTreeMap::new()));
    }
}
