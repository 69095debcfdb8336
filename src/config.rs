//! Project configuration (spec.md §2): a `lily.toml` manifest loaded with
//! `serde`/`toml`, replacing the teacher's hand-assembled `settings::Config`
//! (which baked in an HTML project's `build_target`/`html_meta` fields).
//! Lily's manifest is plain data the CLI reads once at startup rather than a
//! struct a project-creation subcommand fills in field by field.

use crate::diagnostics::errors::{CompilerError, ErrorLocation, ErrorType};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE_NAME: &str = "lily.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct PackageManifest {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default = "default_entry")]
    pub entry: PathBuf,
}

fn default_version() -> String {
    String::from("0.1.0")
}

fn default_entry() -> PathBuf {
    PathBuf::from("src/main.lily")
}

#[derive(Debug, Clone, Deserialize)]
struct RawManifest {
    package: PackageManifest,
    #[serde(default)]
    dependencies: std::collections::HashMap<String, DependencySpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum DependencySpec {
    Version(String),
    Detailed { path: Option<PathBuf>, url: Option<String> },
}

#[derive(Debug, Clone)]
pub struct LibraryDependency {
    pub name: String,
    pub path: Option<PathBuf>,
    pub url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub package: PackageManifest,
    pub libraries: Vec<LibraryDependency>,
    /// Directory the manifest was loaded from; import resolution and output
    /// paths are relative to this, not the process's current directory.
    pub project_root: PathBuf,
}

impl Config {
    /// Loads and parses `lily.toml` from `project_root`.
    pub fn load(project_root: &Path) -> Result<Self, CompilerError> {
        let manifest_path = project_root.join(MANIFEST_FILE_NAME);
        let content = std::fs::read_to_string(&manifest_path).map_err(|error| {
            CompilerError::new(
                format!("Could not read '{}': {error}", manifest_path.display()),
                ErrorLocation::unknown(),
                ErrorType::File,
            )
            .with_file_path(manifest_path.clone())
        })?;

        let raw: RawManifest = toml::from_str(&content).map_err(|error| {
            CompilerError::new(
                format!("Malformed manifest '{}': {error}", manifest_path.display()),
                ErrorLocation::unknown(),
                ErrorType::Config,
            )
            .with_file_path(manifest_path.clone())
        })?;

        let libraries = raw
            .dependencies
            .into_iter()
            .map(|(name, spec)| match spec {
                DependencySpec::Version(_) => LibraryDependency { name, path: None, url: None },
                DependencySpec::Detailed { path, url } => LibraryDependency { name, path, url },
            })
            .collect();

        Ok(Config {
            package: raw.package,
            libraries,
            project_root: project_root.to_path_buf(),
        })
    }

    /// A manifest-less default, used when compiling a single loose `.lily`
    /// file rather than a full project (spec.md §6's single-file mode).
    pub fn single_file(entry: &Path) -> Self {
        Config {
            package: PackageManifest {
                name: entry.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| "main".into()),
                version: default_version(),
                authors: Vec::new(),
                entry: entry.to_path_buf(),
            },
            libraries: Vec::new(),
            project_root: entry.parent().map(Path::to_path_buf).unwrap_or_default(),
        }
    }

    pub fn entry_path(&self) -> PathBuf {
        if self.package.entry.is_absolute() {
            self.package.entry.clone()
        } else {
            self.project_root.join(&self.package.entry)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_manifest() {
        let raw: RawManifest = toml::from_str(
            r#"
            [package]
            name = "demo"
            "#,
        )
        .unwrap();
        assert_eq!(raw.package.name, "demo");
        assert_eq!(raw.package.version, "0.1.0");
        assert_eq!(raw.package.entry, PathBuf::from("src/main.lily"));
    }

    #[test]
    fn parses_dependency_table() {
        let raw: RawManifest = toml::from_str(
            r#"
            [package]
            name = "demo"

            [dependencies]
            zlib = "1.0"
            local_util = { path = "../util" }
            "#,
        )
        .unwrap();
        assert_eq!(raw.dependencies.len(), 2);
    }

    #[test]
    fn single_file_config_derives_name_from_file_stem() {
        let config = Config::single_file(Path::new("scripts/tool.lily"));
        assert_eq!(config.package.name, "tool");
        assert_eq!(config.entry_path(), PathBuf::from("scripts/tool.lily"));
    }
}
