//! Integration tests for deploy generation.

use std::fs;
use std::path::Path;

use shipyard_deploy::{
    CommandKind, DeployError, GeneratorSettings, IndexPolicy, ManifestGenerator, ProjectFile,
    RegisterOutcome, ResourceIndex, BUILTIN_TEMPLATES_DIR,
};
use tempfile::tempdir;

const PROJECT: &str = r#"
app:
  name: shop
  image: registry.example.com/shop
  image_tag: "2.0.1"
  domain: shop.example.com
  namespace: shop
  env:
    LOG_LEVEL: info
routes:
  - path: /users/{id}
    method: GET
    handler: UserHandler
  - path: //health/
    method: GET
    handler: HealthHandler
    path_type: Exact
commands:
  queue-worker:
    description: Process the job queue
    args: ["--tries=3"]
  reports-cron:
    description: Nightly reports
    schedule: "0 2 * * *"
    env:
      REPORT_BUCKET: reports
  daily-report:
    description: Declared explicitly
    type: cronjob
  broken-cron:
    schedule: "* * *"
"#;

fn setup(root: &Path) -> (ProjectFile, ManifestGenerator) {
    fs::write(root.join("shipyard.yaml"), PROJECT).unwrap();
    let project = ProjectFile::load(&root.join("shipyard.yaml")).unwrap();
    let generator = ManifestGenerator::new(
        GeneratorSettings::new(root).with_builtin_templates(BUILTIN_TEMPLATES_DIR),
    );
    (project, generator)
}

#[test]
fn test_full_generation_workflow() {
    let temp = tempdir().unwrap();
    let (project, generator) = setup(temp.path());

    generator
        .initialize(&["staging".to_string(), "prod".to_string()])
        .unwrap();
    let summary = generator.generate_all(project.config(), &project, &project);
    assert!(summary.is_success(), "failures: {:?}", summary.failures);

    let base = temp.path().join("deploy").join("base");
    for file in [
        "ingress.yaml",
        "daemon-queue-worker.yaml",
        "cronjob-reports-cron.yaml",
        "cronjob-daily-report.yaml",
    ] {
        assert!(base.join(file).exists(), "missing {}", file);
    }
    assert!(!base.join("cronjob-broken-cron.yaml").exists());
    assert_eq!(summary.written.len(), 4);

    let index = fs::read_to_string(base.join("kustomization.yaml")).unwrap();
    for file in ["ingress.yaml", "daemon-queue-worker.yaml", "cronjob-reports-cron.yaml"] {
        assert_eq!(index.matches(&format!("  - {}\n", file)).count(), 1);
    }

    // Generating again leaves the index unchanged.
    generator.generate_all(project.config(), &project, &project);
    assert_eq!(fs::read_to_string(base.join("kustomization.yaml")).unwrap(), index);
}

#[test]
fn test_rendered_manifests() {
    let temp = tempdir().unwrap();
    let (project, generator) = setup(temp.path());

    let ingress = generator.generate_ingress(project.config(), &project).unwrap();
    assert!(ingress.contains("name: shop-ingress"));
    assert!(ingress.contains("- path: /users/{id}\n            pathType: Prefix"));
    assert!(ingress.contains("- path: /health\n            pathType: Exact"));
    assert!(ingress.contains("name: shop-service"));
    assert!(ingress.contains("number: 80"));
    assert!(!ingress.contains("{{"));

    let daemons = generator
        .generate_daemons(project.config(), &project, None)
        .unwrap();
    let worker = &daemons.manifests["queue-worker"];
    assert!(worker.contains("name: shop-queue-worker"));
    assert!(worker.contains("replicas: 2"));
    assert!(worker.contains(r#"command: ["queue-worker", "--tries=3"]"#));
    assert!(worker.contains("image: registry.example.com/shop:2.0.1"));
    assert!(worker.contains("memory: 128Mi"));
    assert!(!worker.contains("{{"));

    let cronjobs = generator
        .generate_cronjobs(project.config(), &project, None)
        .unwrap();
    let report = &cronjobs.manifests["reports-cron"];
    assert!(report.contains(r#"schedule: "0 2 * * *""#));
    assert!(report.contains(r#"command: ["reports-cron"]"#));
    assert!(report.contains("- name: REPORT_BUCKET\n                  value: \"reports\""));
    assert!(!report.contains("{{"));

    let daily = &cronjobs.manifests["daily-report"];
    assert!(daily.contains(r#"schedule: "0 0 * * *""#));
    assert!(!cronjobs.manifests.contains_key("broken-cron"));
}

#[test]
fn test_user_override_template() {
    let temp = tempdir().unwrap();
    let (project, generator) = setup(temp.path());
    generator.initialize(&[]).unwrap();

    let override_path = temp
        .path()
        .join("deploy/base/templates/ingress-tpl.yaml");
    fs::write(&override_path, "custom {{APP_NAME}}{{#ROUTES}} {{PATH}}{{/ROUTES}}\n").unwrap();

    let ingress = generator.generate_ingress(project.config(), &project).unwrap();
    assert_eq!(ingress, "custom shop /users/{id} /health\n");
}

#[test]
fn test_initialize_is_non_destructive() {
    let temp = tempdir().unwrap();
    let (_project, generator) = setup(temp.path());

    generator.initialize(&["prod".to_string()]).unwrap();
    let prod_index = temp.path().join("deploy/prod/kustomization.yaml");
    let rendered = fs::read_to_string(&prod_index).unwrap();
    assert!(rendered.contains("namespace: prod"));
    assert!(rendered.contains("app.kubernetes.io/instance: app-prod"));
    assert!(rendered.contains("newTag: latest"));

    fs::write(&prod_index, "# customized\nresources:\n  - ../base\n").unwrap();
    let report = generator.initialize(&["prod".to_string()]).unwrap();
    assert!(report.environments["prod"].copied_files.is_empty());
    assert_eq!(
        fs::read_to_string(&prod_index).unwrap(),
        "# customized\nresources:\n  - ../base\n"
    );
}

#[test]
fn test_generation_without_init_skips_index() {
    let temp = tempdir().unwrap();
    let (project, generator) = setup(temp.path());

    let summary = generator.generate_all(project.config(), &project, &project);
    assert!(summary.is_success());
    assert!(!temp.path().join("deploy/base/kustomization.yaml").exists());
    assert!(temp.path().join("deploy/base/ingress.yaml").exists());
}

#[test]
fn test_broken_installation() {
    let temp = tempdir().unwrap();
    let generator = ManifestGenerator::new(
        GeneratorSettings::new(temp.path()).with_builtin_templates(temp.path().join("missing")),
    );

    let err = generator.initialize(&["dev".to_string()]).unwrap_err();
    assert!(matches!(err, DeployError::ScaffoldSourceMissing(_)));
}

#[test]
fn test_list_resources() {
    let temp = tempdir().unwrap();
    let (project, generator) = setup(temp.path());

    let summary = generator.list_resources(project.config(), &project, &project);
    assert_eq!(summary.ingress.count, 2);
    assert_eq!(summary.ingress.routes[1].path, "/health");
    assert_eq!(summary.daemon.count, 1);
    assert_eq!(summary.cronjob.count, 2);

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["daemon"]["commands"][0]["resource_name"], "queue-worker");
    assert!(json["daemon"]["commands"][0].get("schedule").is_none());
    assert!(!temp.path().join("deploy").exists());
}

#[test]
fn test_explicit_kind_overrides_name() {
    let project = ProjectFile::parse(PROJECT).unwrap();
    let record = shipyard_deploy::CommandRecord::from_metadata(
        "daily-report",
        &project.commands["daily-report"],
    );
    assert_eq!(record.kind, CommandKind::CronJob);

    let inferred = shipyard_deploy::CommandRecord::from_metadata(
        "daily-report",
        &Default::default(),
    );
    assert_eq!(inferred.kind, CommandKind::Daemon);
}

#[test]
fn test_header_policy() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("kustomization.yaml");
    fs::write(&path, "kind: Kustomization\n").unwrap();

    let lenient = ResourceIndex::default();
    assert_eq!(
        lenient.register(&path, "ingress.yaml").unwrap(),
        RegisterOutcome::HeaderMissing
    );
    assert_eq!(fs::read_to_string(&path).unwrap(), "kind: Kustomization\n");

    let creating = ResourceIndex::new(IndexPolicy {
        create_missing_header: true,
    });
    assert_eq!(
        creating.register(&path, "ingress.yaml").unwrap(),
        RegisterOutcome::HeaderCreated
    );
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "kind: Kustomization\nresources:\n  - ingress.yaml\n"
    );
    assert_eq!(
        creating.register(&path, "ingress.yaml").unwrap(),
        RegisterOutcome::AlreadyPresent
    );
}
