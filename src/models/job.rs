use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::utils::error::Error;

const DEFAULT_PRE_LOAD_PERIOD: Duration = Duration::from_secs(60);

/// One templated object of a job, as written in the job configuration.
#[derive(Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDefinition {
    pub object_template: PathBuf,
    #[serde(default)]
    pub input_vars: BTreeMap<String, Value>,
}

#[derive(Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JobSpec {
    pub name: String,
    #[serde(default)]
    pub objects: Vec<ObjectDefinition>,
    #[serde(default)]
    pub pre_load_images: bool,
    pub pre_load_period: Option<String>,
    #[serde(default)]
    pub namespace_labels: BTreeMap<String, String>,
    #[serde(default)]
    pub namespace_annotations: BTreeMap<String, String>,
    #[serde(default)]
    pub pre_load_node_labels: BTreeMap<String, String>,
    #[serde(default)]
    pub function_templates: Vec<PathBuf>,
}

#[derive(Deserialize, Debug, PartialEq, Clone)]
pub struct JobConfig {
    pub jobs: Vec<JobSpec>,
}

/// An object definition together with its unrendered template body.
#[derive(Debug, PartialEq, Clone)]
pub struct Object {
    pub definition: ObjectDefinition,
    pub spec: String,
}

/// A helper template made available to every object template of a job.
#[derive(Debug, PartialEq, Clone)]
pub struct FunctionTemplate {
    pub name: String,
    pub body: String,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Job {
    pub name: String,
    pub objects: Vec<Object>,
    pub pre_load_images: bool,
    pub pre_load_period: Duration,
    pub namespace_labels: BTreeMap<String, String>,
    pub namespace_annotations: BTreeMap<String, String>,
    pub pre_load_node_labels: BTreeMap<String, String>,
    pub function_templates: Vec<FunctionTemplate>,
}

impl JobConfig {
    pub fn parse(content: &str) -> Result<JobConfig, Error> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Loads a job configuration file and every template it references.
    ///
    /// Relative template paths are resolved against the directory holding `path`.
    pub fn load(path: &Path) -> Result<Vec<Job>, Error> {
        let content = std::fs::read_to_string(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

        JobConfig::parse(&content)?
            .jobs
            .into_iter()
            .map(|spec| Job::from_spec(spec, base_dir))
            .collect()
    }
}

impl Job {
    pub fn from_spec(spec: JobSpec, base_dir: &Path) -> Result<Job, Error> {
        if spec.name.is_empty() {
            return Err(Error::ConfigError("job name must not be empty".to_string()));
        }

        let pre_load_period = match &spec.pre_load_period {
            Some(period) => humantime::parse_duration(period).map_err(|err| {
                Error::ConfigError(format!(
                    "job {}: invalid preLoadPeriod {:?}: {}",
                    spec.name, period, err
                ))
            })?,
            None => DEFAULT_PRE_LOAD_PERIOD,
        };

        let mut objects = Vec::with_capacity(spec.objects.len());
        for definition in spec.objects {
            let spec = std::fs::read_to_string(base_dir.join(&definition.object_template))?;
            objects.push(Object { definition, spec });
        }

        let mut function_templates = Vec::with_capacity(spec.function_templates.len());
        for path in &spec.function_templates {
            let name = match path.file_stem() {
                Some(stem) => stem.to_string_lossy().to_string(),
                None => {
                    return Err(Error::ConfigError(format!(
                        "job {}: invalid function template path {:?}",
                        spec.name, path
                    )))
                }
            };
            let body = std::fs::read_to_string(base_dir.join(path))?;
            function_templates.push(FunctionTemplate { name, body });
        }

        Ok(Job {
            name: spec.name,
            objects,
            pre_load_images: spec.pre_load_images,
            pre_load_period,
            namespace_labels: spec.namespace_labels,
            namespace_annotations: spec.namespace_annotations,
            pre_load_node_labels: spec.pre_load_node_labels,
            function_templates,
        })
    }
}
