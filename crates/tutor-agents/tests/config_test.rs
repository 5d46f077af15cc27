//! Integration tests for TOML configuration loading

use std::io::Write;

use coordination::ModelId;
use tempfile::NamedTempFile;
use tutor_agents::config::{ConfigError, PipelineConfig, ENV_MAX_REGENERATIONS};
use tutor_agents::Orchestrator;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

/// Test: file values override defaults and feed the router and orchestrator
#[test]
fn test_file_overrides_defaults() {
    let file = write_config(
        r#"
max_regenerations = 1
generation_timeout_secs = 20
request_deadline_secs = 45
retrieval_top_k = 4

[generator]
url = "http://localhost:8000/v1"

[models]
fast = "local-fast"
math_specialist = "local-math"

[server]
bind = "0.0.0.0:8080"
"#,
    );

    let config = PipelineConfig::from_file(file.path()).unwrap();
    assert_eq!(config.max_regenerations, 1);
    assert_eq!(config.generation_timeout().as_secs(), 20);
    assert_eq!(config.request_deadline().map(|d| d.as_secs()), Some(45));
    assert_eq!(config.retrieval_top_k, 4);
    assert_eq!(config.retrieval_timeout_secs, 10);
    assert_eq!(config.generator.url.as_deref(), Some("http://localhost:8000/v1"));
    assert!(config.retriever.url.is_none());
    assert_eq!(config.server.bind, "0.0.0.0:8080");

    let catalog = config.catalog();
    assert_eq!(catalog.name(ModelId::Fast), "local-fast");
    assert_eq!(catalog.name(ModelId::MathSpecialist), "local-math");
    assert_eq!(
        catalog.name(ModelId::CarefulReasoner),
        ModelId::CarefulReasoner.default_name()
    );

    let orchestrator = Orchestrator::from_config(&config, None);
    assert_eq!(orchestrator.max_regenerations(), 1);
    assert_eq!(orchestrator.router().catalog().name(ModelId::Fast), "local-fast");
}

/// Test: environment overrides win over the file
#[test]
fn test_env_overrides_file() {
    let file = write_config("max_regenerations = 2\n");
    let config = PipelineConfig::from_file(file.path())
        .unwrap()
        .with_env_overrides(|key| (key == ENV_MAX_REGENERATIONS).then(|| "0".to_string()))
        .unwrap();
    assert_eq!(config.max_regenerations, 0);
}

/// Test: unknown model keys are ignored
#[test]
fn test_unknown_model_key_ignored() {
    let file = write_config("[models]\nturbo = \"x\"\n");
    let catalog = PipelineConfig::from_file(file.path()).unwrap().catalog();
    for id in ModelId::ALL {
        assert_eq!(catalog.name(id), id.default_name());
    }
}

/// Test: malformed TOML is a parse error naming the file
#[test]
fn test_malformed_file_is_parse_error() {
    let file = write_config("max_regenerations = \"many\"\n[[[");
    let err = PipelineConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains(&file.path().display().to_string()));
}

/// Test: a missing file is a read error
#[test]
fn test_missing_file_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = PipelineConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}
