//! String template rendering utilities.

pub struct TemplateVars;

impl TemplateVars {
    pub const SOURCE: &'static str = "source";
    pub const DESCRIPTOR: &'static str = "descriptor";
    pub const OUTPUT: &'static str = "output";
    pub const FORMAT: &'static str = "format";
    pub const WORKDIR: &'static str = "workdir";
}

pub fn render(template: &str, variables: &[(&str, &str)]) -> String {
    let mut result = template.to_string();

    for (key, value) in variables {
        let placeholder = format!("{{{{{}}}}}", key);
        result = result.replace(&placeholder, value);
    }

    result
}

/// Render every argument template with the same variables.
pub fn render_all(templates: &[String], variables: &[(&str, &str)]) -> Vec<String> {
    templates.iter().map(|t| render(t, variables)).collect()
}
