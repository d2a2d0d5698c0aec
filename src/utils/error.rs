/// Utility enum that covers all possible errors while pre-loading images
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Any error originating from the `kube-rs` crate
    #[error("Kubernetes reported error: {source}")]
    KubeError {
        #[from]
        source: kube::Error,
    },

    #[error("Kubernetes wait error: {source}")]
    WaitError {
        #[from]
        source: kube_runtime::wait::Error,
    },

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    /// Template registration or expansion failed. No cluster state has been touched yet.
    #[error("Render error: {0}")]
    RenderError(String),

    /// A rendered object or a configuration file is not valid YAML for its shape.
    #[error("Decode error: {source}")]
    DecodeError {
        #[from]
        source: serde_yaml::Error,
    },

    /// Error in the job configuration, typically missing or malformed fields.
    #[error("Invalid job configuration: {0}")]
    ConfigError(String),

    /// The staging namespace could not be created. Pre-loading cannot continue without it.
    #[error("creating namespace {namespace}: {source}")]
    NamespaceCreateError {
        namespace: String,
        #[source]
        source: Box<Error>,
    },

    /// The preload DaemonSet could not be created. The staging namespace may be left behind.
    #[error("creating preload DaemonSet in namespace {namespace}: {source}")]
    WorkloadCreateError {
        namespace: String,
        #[source]
        source: Box<Error>,
    },

    #[error("cleaning up namespaces matching {selector}: {source}")]
    CleanupError {
        selector: String,
        #[source]
        source: Box<Error>,
    },

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("pre-load failed for {0} job(s)")]
    JobsFailed(usize),

    #[error("pre-load: {source}")]
    PreloadError {
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Fatal errors must abort the whole run instead of only failing the current job.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::NamespaceCreateError { .. } => true,
            Error::PreloadError { source } => source.is_fatal(),
            _ => false,
        }
    }

    pub fn preload(source: Error) -> Self {
        Error::PreloadError {
            source: Box::new(source),
        }
    }
}

impl From<handlebars::RenderError> for Error {
    fn from(err: handlebars::RenderError) -> Self {
        Error::RenderError(err.to_string())
    }
}

impl From<handlebars::TemplateError> for Error {
    fn from(err: handlebars::TemplateError) -> Self {
        Error::RenderError(err.to_string())
    }
}
