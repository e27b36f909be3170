//! Template rendering.
//!
//! Rendering runs in two phases. Blocks (`{{#NAME}} ... {{/NAME}}`) are expanded
//! first, once per item of the list bound to `NAME`, with each iteration seeing
//! only that item's variables. Placeholders (`{{KEY}}`) are substituted second;
//! unknown keys are left verbatim so templates can be rendered in stages.

use regex::Regex;
use tracing::trace;

use crate::variables::{TemplateValue, TemplateVariables};

/// Template renderer.
///
/// Holds only its compiled patterns, so one renderer can be shared freely.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    variable_pattern: Regex,
    block_pattern: Regex,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    /// Create a new template renderer.
    pub fn new() -> Self {
        Self {
            // Match {{variable_name}} pattern
            variable_pattern: Regex::new(r"\{\{([a-zA-Z_][a-zA-Z0-9_]*)\}\}").unwrap(),
            // Match {{#block_name}} opening tags
            block_pattern: Regex::new(r"\{\{#([a-zA-Z_][a-zA-Z0-9_]*)\}\}").unwrap(),
        }
    }

    /// Render a template against a variable set.
    pub fn render(&self, template: &str, variables: &TemplateVariables) -> String {
        let expanded = self.expand_blocks(template, variables);
        self.render_content(&expanded, variables)
    }

    /// Expand every `{{#NAME}} ... {{/NAME}}` block.
    ///
    /// The first `{{/NAME}}` after an opening tag closes it. An opening tag
    /// without a closing tag is kept as plain text.
    fn expand_blocks(&self, template: &str, variables: &TemplateVariables) -> String {
        let mut output = String::with_capacity(template.len());
        let mut cursor = 0;

        while let Some(caps) = self.block_pattern.captures_at(template, cursor) {
            let Some(open) = caps.get(0) else { break };
            let name = &caps[1];
            let closing_tag = format!("{{{{/{}}}}}", name);

            let Some(body_len) = template[open.end()..].find(&closing_tag) else {
                output.push_str(&template[cursor..open.end()]);
                cursor = open.end();
                continue;
            };

            let body = &template[open.end()..open.end() + body_len];
            output.push_str(&template[cursor..open.start()]);
            output.push_str(&self.render_block(name, body, variables));
            cursor = open.end() + body_len + closing_tag.len();
        }

        output.push_str(&template[cursor..]);
        output
    }

    /// Render one block body once per list item.
    fn render_block(&self, name: &str, body: &str, variables: &TemplateVariables) -> String {
        let Some(TemplateValue::List(items)) = variables.get(name) else {
            trace!("Block '{}' has no list binding, dropping it", name);
            return String::new();
        };

        items.iter().map(|item| self.render(body, item)).collect()
    }

    /// Substitute `{{KEY}}` placeholders with scalar values.
    ///
    /// Unknown keys and list-valued keys are left as written.
    pub fn render_content(&self, content: &str, variables: &TemplateVariables) -> String {
        self.variable_pattern
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                variables
                    .get_scalar(var_name)
                    .unwrap_or_else(|| format!("{{{{{}}}}}", var_name))
            })
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(method: &str, path: &str) -> TemplateVariables {
        TemplateVariables::new()
            .with("METHOD", method)
            .with("PATH", path)
    }

    #[test]
    fn test_render_content() {
        let renderer = TemplateRenderer::new();
        let vars = TemplateVariables::new()
            .with("name", "my-app")
            .with("version", "1.0.0");

        let rendered = renderer.render("App: {{name}}, Version: {{version}}", &vars);
        assert_eq!(rendered, "App: my-app, Version: 1.0.0");
    }

    #[test]
    fn test_unknown_placeholder_passes_through() {
        let renderer = TemplateRenderer::new();
        let vars = TemplateVariables::new().with("KNOWN", "yes");

        let rendered = renderer.render("{{KNOWN}} {{UNKNOWN}}", &vars);
        assert_eq!(rendered, "yes {{UNKNOWN}}");
    }

    #[test]
    fn test_scalars_are_stringified() {
        let renderer = TemplateRenderer::new();
        let vars = TemplateVariables::new()
            .with("REPLICAS", 3_i64)
            .with("ENABLED", false);

        assert_eq!(renderer.render("{{REPLICAS}}/{{ENABLED}}", &vars), "3/false");
    }

    #[test]
    fn test_list_is_not_a_placeholder_value() {
        let renderer = TemplateRenderer::new();
        let vars = TemplateVariables::new().with("ROUTES", vec![route("GET", "/")]);

        assert_eq!(renderer.render("{{ROUTES}}", &vars), "{{ROUTES}}");
    }

    #[test]
    fn test_loop_expansion() {
        let renderer = TemplateRenderer::new();
        let vars = TemplateVariables::new().with(
            "ROUTES",
            vec![route("GET", "/users"), route("POST", "/orders")],
        );

        let rendered = renderer.render("{{#ROUTES}}{{METHOD}} {{PATH}};{{/ROUTES}}", &vars);
        assert_eq!(rendered, "GET /users;POST /orders;");
    }

    #[test]
    fn test_empty_and_missing_loops_render_nothing() {
        let renderer = TemplateRenderer::new();
        let empty = TemplateVariables::new().with("ROUTES", Vec::<TemplateVariables>::new());
        let template = "a{{#ROUTES}}\n- {{PATH}}\n{{/ROUTES}}b";

        assert_eq!(renderer.render(template, &empty), "ab");
        assert_eq!(renderer.render(template, &TemplateVariables::new()), "ab");
    }

    #[test]
    fn test_scalar_bound_block_renders_nothing() {
        let renderer = TemplateRenderer::new();
        let vars = TemplateVariables::new().with("ARGS", "not-a-list");

        assert_eq!(renderer.render("[{{#ARGS}}x{{/ARGS}}]", &vars), "[]");
    }

    #[test]
    fn test_loop_leftovers_reach_outer_placeholder_pass() {
        let renderer = TemplateRenderer::new();
        let item = route("GET", "/");
        let vars = TemplateVariables::new()
            .with("APP_NAME", "shop")
            .with("ROUTES", vec![item.clone()]);
        let body = "{{APP_NAME}}{{PATH}}";

        // The iteration itself only sees the item...
        assert_eq!(renderer.render(body, &item), "{{APP_NAME}}/");
        // ...and the untouched token is filled by the enclosing placeholder pass.
        let rendered = renderer.render("{{#ROUTES}}{{APP_NAME}}{{PATH}}{{/ROUTES}}", &vars);
        assert_eq!(rendered, "shop/");
    }

    #[test]
    fn test_nested_blocks() {
        let renderer = TemplateRenderer::new();
        let container = TemplateVariables::new().with("NAME", "web").with(
            "PORTS",
            vec![
                TemplateVariables::new().with("PORT", 80_i64),
                TemplateVariables::new().with("PORT", 443_i64),
            ],
        );
        let vars = TemplateVariables::new().with("CONTAINERS", vec![container]);

        let template = "{{#CONTAINERS}}{{NAME}}:{{#PORTS}} {{PORT}}{{/PORTS}}\n{{/CONTAINERS}}";
        assert_eq!(renderer.render(template, &vars), "web: 80 443\n");
    }

    #[test]
    fn test_unclosed_block_is_left_verbatim() {
        let renderer = TemplateRenderer::new();
        let vars = TemplateVariables::new().with("X", "1");

        assert_eq!(renderer.render("{{#OPEN}} {{X}}", &vars), "{{#OPEN}} 1");
    }

    #[test]
    fn test_multiline_body() {
        let renderer = TemplateRenderer::new();
        let vars = TemplateVariables::new().with(
            "ENV_VARS",
            vec![TemplateVariables::new().with("KEY", "A").with("VALUE", "1")],
        );
        let template = "env:\n{{#ENV_VARS}}\n  - name: {{KEY}}\n    value: \"{{VALUE}}\"\n{{/ENV_VARS}}\n";

        assert_eq!(
            renderer.render(template, &vars),
            "env:\n\n  - name: A\n    value: \"1\"\n\n"
        );
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let renderer = TemplateRenderer::new();
        let vars = TemplateVariables::new()
            .with("A", "1")
            .with("ROUTES", vec![route("GET", "/a"), route("PUT", "/b")]);
        let template = "{{A}}{{#ROUTES}}{{METHOD}}{{/ROUTES}}{{B}}";

        assert_eq!(renderer.render(template, &vars), renderer.render(template, &vars));
    }
}
