/// Kind of a rendered object, taken from the document's own `kind` field.
#[derive(Clone, Debug, PartialEq)]
pub enum WorkloadKind {
    Deployment,
    DaemonSet,
    ReplicaSet,
    Job,
    StatefulSet,
    Pod,
    VirtualMachineInstance,
    VirtualMachine,
    VirtualMachineInstanceReplicaSet,
    Other(String),
}

/// Where the container images live inside a document of a given kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ImageLayout {
    /// `spec.template.spec.containers[].image`
    PodTemplate,
    /// `spec.containers[].image`
    Pod,
    /// `spec.volumes[].containerDisk.image`
    VirtualMachineInstance,
    /// `spec.template.spec.volumes[].containerDisk.image`
    NestedVirtualMachine,
    /// No images are extracted.
    Unsupported,
}

impl WorkloadKind {
    pub fn parse(kind: &str) -> Self {
        match kind {
            "Deployment" => WorkloadKind::Deployment,
            "DaemonSet" => WorkloadKind::DaemonSet,
            "ReplicaSet" => WorkloadKind::ReplicaSet,
            "Job" => WorkloadKind::Job,
            "StatefulSet" => WorkloadKind::StatefulSet,
            "Pod" => WorkloadKind::Pod,
            "VirtualMachineInstance" => WorkloadKind::VirtualMachineInstance,
            "VirtualMachine" => WorkloadKind::VirtualMachine,
            "VirtualMachineInstanceReplicaSet" => WorkloadKind::VirtualMachineInstanceReplicaSet,
            other => WorkloadKind::Other(other.to_string()),
        }
    }

    pub fn image_layout(&self) -> ImageLayout {
        match self {
            WorkloadKind::Deployment
            | WorkloadKind::DaemonSet
            | WorkloadKind::ReplicaSet
            | WorkloadKind::Job
            | WorkloadKind::StatefulSet => ImageLayout::PodTemplate,
            WorkloadKind::Pod => ImageLayout::Pod,
            WorkloadKind::VirtualMachineInstance => ImageLayout::VirtualMachineInstance,
            WorkloadKind::VirtualMachine | WorkloadKind::VirtualMachineInstanceReplicaSet => {
                ImageLayout::NestedVirtualMachine
            }
            WorkloadKind::Other(_) => ImageLayout::Unsupported,
        }
    }
}
