//! Configuration layering: defaults, project files, environment.

use std::fs;
use std::path::Path;

use fixloop::domain::models::CommandType;
use fixloop::infrastructure::config::{ConfigLoader, CONFIG_DIR};
use tempfile::TempDir;

fn write_config(root: &Path, name: &str, body: &str) {
    let dir = root.join(CONFIG_DIR);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(name), body).unwrap();
}

#[test]
fn test_defaults_without_files() {
    let root = TempDir::new().unwrap();
    let config = temp_env::with_vars_unset(
        ["FIXLOOP_ORCHESTRATOR__MAX_ITERATIONS", "FIXLOOP_LOGGING__LEVEL"],
        || ConfigLoader::load_from_dir(root.path()).unwrap(),
    );

    assert_eq!(config.orchestrator.max_parallel_agents, 3);
    assert_eq!(config.orchestrator.max_iterations, 10);
    assert_eq!(config.orchestrator.agents_per_phase, 25);
    assert_eq!(config.recovery.max_retries(CommandType::Analysis), 3);
}

#[test]
fn test_project_file_then_local_override() {
    let root = TempDir::new().unwrap();
    write_config(
        root.path(),
        "config.yaml",
        "orchestrator:\n  max_parallel_agents: 5\n  max_iterations: 4\nrecovery:\n  retry_budgets:\n    agent: 6\n",
    );
    write_config(root.path(), "local.yaml", "orchestrator:\n  max_iterations: 7\n");

    let config = temp_env::with_var_unset("FIXLOOP_ORCHESTRATOR__MAX_ITERATIONS", || {
        ConfigLoader::load_from_dir(root.path()).unwrap()
    });

    assert_eq!(config.orchestrator.max_parallel_agents, 5);
    assert_eq!(config.orchestrator.max_iterations, 7);
    assert_eq!(config.recovery.max_retries(CommandType::Agent), 6);
    // Unlisted budgets keep their defaults.
    assert_eq!(config.recovery.max_retries(CommandType::Quick), 2);
}

#[test]
fn test_environment_wins() {
    let root = TempDir::new().unwrap();
    write_config(root.path(), "config.yaml", "orchestrator:\n  max_iterations: 4\n");

    let config = temp_env::with_var("FIXLOOP_ORCHESTRATOR__MAX_ITERATIONS", Some("12"), || {
        ConfigLoader::load_from_dir(root.path()).unwrap()
    });

    assert_eq!(config.orchestrator.max_iterations, 12);
}

#[test]
fn test_invalid_values_are_rejected() {
    let root = TempDir::new().unwrap();
    write_config(root.path(), "config.yaml", "orchestrator:\n  max_parallel_agents: 0\n");

    let result = temp_env::with_var_unset("FIXLOOP_ORCHESTRATOR__MAX_PARALLEL_AGENTS", || {
        ConfigLoader::load_from_dir(root.path())
    });
    assert!(result.is_err());
}

#[test]
fn test_load_from_explicit_file() {
    let root = TempDir::new().unwrap();
    let path = root.path().join("custom.yaml");
    fs::write(&path, "diagnostics:\n  program: tsc\n  args: [\"--noEmit\"]\n").unwrap();

    let config = ConfigLoader::load_from_file(&path).unwrap();

    assert_eq!(config.diagnostics.program, "tsc");
    assert_eq!(config.diagnostics.args, vec!["--noEmit".to_string()]);
    assert_eq!(config.assistant.binary_path, "claude");
}
