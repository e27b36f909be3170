//! Domain record to template variable binding.

use shipyard_templates::{TemplateValue, TemplateVariables};

use crate::models::{CommandKind, CommandRecord, DeploymentConfig, RouteRecord, SERVICE_PORT};

/// Loop key for routes in the ingress template.
pub const ROUTES_KEY: &str = "ROUTES";

/// Outer keys copied into every `ROUTES` item.
const ROUTE_SHARED_KEYS: [&str; 3] = ["APP_NAME", "NAMESPACE", "DOMAIN"];

/// Variables for a deployment config.
///
/// Layering order: fixed fields, merged resource quotas, then env vars.
/// Later layers win on key collisions.
pub fn bind_config(config: &DeploymentConfig) -> TemplateVariables {
    let mut vars = TemplateVariables::new()
        .with("APP_NAME", &config.app_name)
        .with("IMAGE_NAME", &config.image_name)
        .with("IMAGE_TAG", &config.image_tag)
        .with("DOMAIN", &config.domain)
        .with("NAMESPACE", &config.namespace)
        .with("ENV_NAME", &config.env_name)
        .with("APP_ENV", &config.env_name)
        .with("REPLICAS", config.replicas)
        .with("SERVICE_NAME", config.service_name())
        .with("SERVICE_PORT", SERVICE_PORT);

    vars.extend_strings(&config.merged_resources());
    vars.extend_strings(&config.env_vars);
    vars
}

/// Flat variables for one route, used as a `ROUTES` item.
pub fn bind_route(route: &RouteRecord) -> TemplateVariables {
    TemplateVariables::new()
        .with("PATH", route.normalized_path())
        .with("PATH_TYPE", route.optimized_path_type().as_str())
        .with("SERVICE_NAME", &route.service_name)
        .with("SERVICE_PORT", route.service_port)
        .with("METHOD", &route.method)
        .with("HANDLER", &route.handler)
}

/// Variables for the ingress manifest: the config plus a `ROUTES` list.
///
/// Each route item also carries the config's APP_NAME, NAMESPACE and DOMAIN so
/// loop bodies can use them.
pub fn bind_ingress(config: &DeploymentConfig, routes: &[RouteRecord]) -> TemplateVariables {
    let mut vars = bind_config(config);

    let shared: TemplateVariables = ROUTE_SHARED_KEYS
        .iter()
        .filter_map(|key| vars.get(key).map(|value| (*key, value.clone())))
        .collect();
    let items = TemplateVariables::scoped_items(&shared, routes.iter().map(bind_route));

    vars.insert(ROUTES_KEY, items);
    vars
}

/// Variables for a daemon or cronjob manifest.
pub fn bind_command(command: &CommandRecord, config: &DeploymentConfig) -> TemplateVariables {
    let qualified_name = format!("{}-{}", config.app_name, command.resource_name());

    let mut vars = TemplateVariables::new()
        .with("COMMAND_NAME", &command.name)
        .with("DAEMON_NAME", &qualified_name)
        .with("CRONJOB_NAME", &qualified_name)
        .with("IMAGE_NAME", &config.image_name)
        .with("IMAGE_TAG", &config.image_tag)
        .with("APP_ENV", &config.env_name)
        .with("REPLICAS", command.replicas);

    vars.extend_strings(&command.merged_resources());
    vars.extend_strings(&config.env_vars);

    if !command.args.is_empty() {
        let args: Vec<TemplateVariables> = command
            .args
            .iter()
            .map(|arg| TemplateVariables::new().with("ARG", arg))
            .collect();
        vars.insert("COMMAND_ARGS", true);
        vars.insert("ARGS", args);
    }

    if !command.env_vars.is_empty() {
        let env: Vec<TemplateVariables> = command
            .env_vars
            .iter()
            .map(|(key, value)| TemplateVariables::new().with("KEY", key).with("VALUE", value))
            .collect();
        vars.insert("ENV_VARS", TemplateValue::List(env));
    }

    if command.kind == CommandKind::CronJob {
        if let Some(schedule) = &command.schedule {
            vars.insert("SCHEDULE", schedule);
        }
    }

    vars
}
