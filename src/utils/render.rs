use handlebars::{no_escape, Handlebars};
use serde::Serialize;

use crate::models::job::FunctionTemplate;
use crate::utils::error::Error;

/// What to do when a template references a variable that was not provided.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MissingKeyPolicy {
    /// Render the missing variable as an empty value.
    Zero,
    /// Fail the render.
    Error,
}

/// Expands `template` with `values`.
///
/// Function templates are registered as partials under their own names so object
/// templates can pull them in with `{{> name}}`. Output is not HTML escaped, the
/// rendered documents are YAML.
pub fn render_template<T: Serialize>(
    template: &str,
    values: &T,
    missing_key: MissingKeyPolicy,
    function_templates: &[FunctionTemplate],
) -> Result<String, Error> {
    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(missing_key == MissingKeyPolicy::Error);
    handlebars.register_escape_fn(no_escape);

    for function_template in function_templates {
        handlebars.register_partial(&function_template.name, &function_template.body)?;
    }

    handlebars.register_template_string("template", template)?;

    Ok(handlebars.render("template", values)?)
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use std::collections::BTreeMap;

    use super::{render_template, MissingKeyPolicy};
    use crate::models::job::FunctionTemplate;
    use crate::utils::error::Error;

    fn values() -> BTreeMap<String, Value> {
        let mut values = BTreeMap::new();
        values.insert("image".to_string(), json!("quay.io/cloud-bulldozer/sampleapp:latest"));
        values
    }

    #[test]
    fn can_render_input_vars_without_escaping() {
        let rendered = render_template(
            "image: {{image}}",
            &values(),
            MissingKeyPolicy::Zero,
            &[],
        )
        .unwrap();

        assert_eq!(rendered, "image: quay.io/cloud-bulldozer/sampleapp:latest");
    }

    #[test]
    fn missing_key_renders_empty_with_zero_policy() {
        let rendered =
            render_template("image: '{{missing}}'", &values(), MissingKeyPolicy::Zero, &[])
                .unwrap();

        assert_eq!(rendered, "image: ''");
    }

    #[test]
    fn missing_key_fails_with_error_policy() {
        let result =
            render_template("image: '{{missing}}'", &values(), MissingKeyPolicy::Error, &[]);

        assert!(matches!(result, Err(Error::RenderError(_))));
    }

    #[test]
    fn can_use_function_templates_as_partials() {
        let function_templates = vec![FunctionTemplate {
            name: "registry".to_string(),
            body: "quay.io/{{org}}".to_string(),
        }];
        let mut values = values();
        values.insert("org".to_string(), json!("cloud-bulldozer"));

        let rendered = render_template(
            "image: {{> registry}}/sampleapp:latest",
            &values,
            MissingKeyPolicy::Zero,
            &function_templates,
        )
        .unwrap();

        assert_eq!(rendered, "image: quay.io/cloud-bulldozer/sampleapp:latest");
    }

    #[test]
    fn malformed_template_is_a_render_error() {
        let result = render_template("image: {{#if}}", &values(), MissingKeyPolicy::Zero, &[]);

        assert!(matches!(result, Err(Error::RenderError(_))));
    }
}
