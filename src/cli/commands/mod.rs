//! CLI command implementations.

pub mod check;
pub mod config;
pub mod run;

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;

/// Load configuration for a project.
///
/// An explicit file replaces the `.fixloop/` lookup. Relative working
/// directories are resolved against `project`.
pub fn load_config(project: &Path, file: Option<&Path>) -> Result<Config> {
    let mut config = match file {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load_from_dir(project)?,
    };

    config.assistant.working_dir = resolve(project, &config.assistant.working_dir);
    config.diagnostics.working_dir = resolve(project, &config.diagnostics.working_dir);
    Ok(config)
}

fn resolve(project: &Path, dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        project.join(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_dirs() {
        assert_eq!(
            resolve(Path::new("/work/app"), Path::new("src")),
            PathBuf::from("/work/app/src")
        );
        assert_eq!(
            resolve(Path::new("/work/app"), Path::new("/abs")),
            PathBuf::from("/abs")
        );
    }
}
