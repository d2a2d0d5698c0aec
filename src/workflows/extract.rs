use log::debug;
use serde::Deserialize;
use serde_yaml::Value;

use crate::models::job::Job;
use crate::models::kind::{ImageLayout, WorkloadKind};
use crate::utils::error::Error;
use crate::utils::render::{render_template, MissingKeyPolicy};

/// A pod template nested one level down, as in Deployments or DaemonSets.
#[derive(Deserialize, Default)]
#[serde(default)]
struct NestedPod {
    spec: NestedPodSpec,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct NestedPodSpec {
    template: PlainPod,
}

/// Only the container images are decoded, the rest of the pod is ignored.
#[derive(Deserialize, Default)]
#[serde(default)]
struct PlainPod {
    spec: PodSpec,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct PodSpec {
    containers: Vec<Container>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Container {
    image: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct VirtualMachineInstance {
    spec: VirtualMachineInstanceSpec,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct VirtualMachineInstanceSpec {
    volumes: Vec<Volume>,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct Volume {
    container_disk: ContainerDisk,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ContainerDisk {
    image: String,
}

/// A virtual machine instance nested one level down, as in VirtualMachines.
#[derive(Deserialize, Default)]
#[serde(default)]
struct NestedVirtualMachine {
    spec: NestedVirtualMachineSpec,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct NestedVirtualMachineSpec {
    template: VirtualMachineInstance,
}

/// Renders every object of `job` and collects the container images they reference,
/// in declaration order and without deduplication.
///
/// The first render failure aborts the extraction.
pub fn extract_images(job: &Job) -> Result<Vec<String>, Error> {
    extract_images_with(job, MissingKeyPolicy::Zero)
}

/// Same as [`extract_images`] with an explicit policy for missing template variables.
pub fn extract_images_with(
    job: &Job,
    missing_key: MissingKeyPolicy,
) -> Result<Vec<String>, Error> {
    let mut images = Vec::new();

    for object in &job.objects {
        let rendered = render_template(
            &object.spec,
            &object.definition.input_vars,
            missing_key,
            &job.function_templates,
        )?;

        let mut object_images = extract_document_images(&rendered)?;
        debug!(
            "{:?}: found images {:?}",
            object.definition.object_template, object_images
        );
        images.append(&mut object_images);
    }

    Ok(images)
}

/// Collects the images of a single rendered document according to its declared kind.
pub fn extract_document_images(rendered: &str) -> Result<Vec<String>, Error> {
    if rendered.trim().is_empty() {
        return Ok(Vec::new());
    }

    let document: Value = serde_yaml::from_str(rendered)?;
    let kind = match document.get("kind").and_then(Value::as_str) {
        Some(kind) => WorkloadKind::parse(kind),
        None => return Ok(Vec::new()),
    };

    match kind.image_layout() {
        ImageLayout::PodTemplate => pod_template_images(document),
        ImageLayout::Pod => pod_images(document),
        ImageLayout::VirtualMachineInstance => virtual_machine_instance_images(document),
        ImageLayout::NestedVirtualMachine => nested_virtual_machine_images(document),
        ImageLayout::Unsupported => {
            debug!("skipping unsupported kind {:?}", kind);
            Ok(Vec::new())
        }
    }
}

// Wrapped kinds keep every image, empty ones included.
fn pod_template_images(document: Value) -> Result<Vec<String>, Error> {
    let nested: NestedPod = serde_yaml::from_value(document)?;

    Ok(nested
        .spec
        .template
        .spec
        .containers
        .into_iter()
        .map(|container| container.image.unwrap_or_default())
        .collect())
}

fn pod_images(document: Value) -> Result<Vec<String>, Error> {
    let pod: PlainPod = serde_yaml::from_value(document)?;

    Ok(pod
        .spec
        .containers
        .into_iter()
        .filter_map(|container| container.image)
        .filter(|image| !image.is_empty())
        .collect())
}

fn virtual_machine_instance_images(document: Value) -> Result<Vec<String>, Error> {
    let vmi: VirtualMachineInstance = serde_yaml::from_value(document)?;

    Ok(container_disk_images(vmi.spec.volumes))
}

fn nested_virtual_machine_images(document: Value) -> Result<Vec<String>, Error> {
    let vm: NestedVirtualMachine = serde_yaml::from_value(document)?;

    Ok(container_disk_images(vm.spec.template.spec.volumes))
}

fn container_disk_images(volumes: Vec<Volume>) -> Vec<String> {
    volumes
        .into_iter()
        .map(|volume| volume.container_disk.image)
        .filter(|image| !image.is_empty())
        .collect()
}
