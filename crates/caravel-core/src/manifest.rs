//! The package.json model.
//!
//! The manifest is held as a raw JSON document (field order preserved)
//! with typed accessors on top, so rewriting the version never disturbs
//! fields caravel knows nothing about. The pre-bump file text is kept
//! around for the build-failure rollback.

use camino::{Utf8Path, Utf8PathBuf};
use semver::Version;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// The manifest file name.
pub const MANIFEST_FILE: &str = "package.json";

/// Errors from manifest handling.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Could not read the manifest file.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Manifest path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Could not write the manifest file.
    #[error("failed to write {path}: {source}")]
    Write {
        /// Manifest path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not valid JSON.
    #[error("{path} is not valid JSON: {source}")]
    Parse {
        /// Manifest path.
        path: Utf8PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A required field is missing or has the wrong type.
    #[error("package.json has no usable '{0}' field")]
    MissingField(&'static str),

    /// The version field is not valid semver.
    #[error("package.json version is not valid semver: {0}")]
    InvalidVersion(#[from] semver::Error),
}

/// Result alias for manifest operations.
pub type ManifestResult<T> = Result<T, ManifestError>;

/// Secondary-repo mirror settings, read from the manifest's
/// `"caravel"` object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorConfig {
    /// Clone URL of the secondary repository.
    pub repo_url: String,
    /// Directory holding the built artifacts to mirror.
    pub build_dir: Utf8PathBuf,
    /// Scratch directory the secondary repo is cloned into.
    pub work_dir: Utf8PathBuf,
}

/// An in-memory package.json.
#[derive(Debug, Clone)]
pub struct Manifest {
    path: Utf8PathBuf,
    doc: Value,
    /// File text as it was at load time, for rollback.
    original: String,
}

impl Manifest {
    /// Load `package.json` from a project root.
    pub fn load(root: &Utf8Path) -> ManifestResult<Self> {
        let path = root.join(MANIFEST_FILE);
        let original = std::fs::read_to_string(&path).map_err(|source| ManifestError::Read {
            path: path.clone(),
            source,
        })?;
        let doc: Value =
            serde_json::from_str(&original).map_err(|source| ManifestError::Parse {
                path: path.clone(),
                source,
            })?;
        debug!(%path, "loaded manifest");
        Ok(Self {
            path,
            doc,
            original,
        })
    }

    /// Current package version.
    pub fn version(&self) -> ManifestResult<Version> {
        let raw = self
            .doc
            .get("version")
            .and_then(Value::as_str)
            .ok_or(ManifestError::MissingField("version"))?;
        Ok(Version::parse(raw)?)
    }

    /// Whether publishing is disabled for this package.
    pub fn is_private(&self) -> bool {
        self.doc
            .get("private")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// The repository URL, from either the string or the object form.
    pub fn repository_url(&self) -> Option<&str> {
        match self.doc.get("repository") {
            Some(Value::String(s)) => Some(s),
            Some(Value::Object(o)) => o.get("url").and_then(Value::as_str),
            _ => None,
        }
    }

    /// Whether a script with this name is declared.
    pub fn has_script(&self, name: &str) -> bool {
        self.doc
            .get("scripts")
            .and_then(|s| s.get(name))
            .and_then(Value::as_str)
            .is_some()
    }

    /// Whether a devDependency with this name is declared.
    pub fn has_dev_dependency(&self, name: &str) -> bool {
        self.doc
            .get("devDependencies")
            .and_then(|d| d.get(name))
            .is_some()
    }

    /// Mirror settings, when a secondary repo is configured.
    pub fn mirror_config(&self) -> Option<MirrorConfig> {
        let cfg = self.doc.get("caravel")?;
        let repo_url = cfg.get("secondaryRepo")?.as_str()?.to_owned();
        let build_dir = cfg
            .get("secondaryRepoBuildDir")
            .and_then(Value::as_str)
            .unwrap_or("amd/");
        let work_dir = cfg
            .get("secondaryRepoWorkDir")
            .and_then(Value::as_str)
            .unwrap_or("tmp-bower-repo");
        Some(MirrorConfig {
            repo_url,
            build_dir: build_dir.into(),
            work_dir: work_dir.into(),
        })
    }

    /// Replace the version field in place.
    pub fn set_version(&mut self, version: &Version) {
        if let Some(obj) = self.doc.as_object_mut() {
            // Re-inserting an existing key keeps its position.
            obj.insert("version".into(), Value::String(version.to_string()));
        }
    }

    /// Write the document back: pretty-printed, trailing newline.
    pub fn save(&self) -> ManifestResult<()> {
        let mut text = serde_json::to_string_pretty(&self.doc).map_err(|source| {
            ManifestError::Parse {
                path: self.path.clone(),
                source,
            }
        })?;
        text.push('\n');
        std::fs::write(&self.path, text).map_err(|source| ManifestError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Restore the file to its load-time contents (build-failure rollback).
    pub fn restore(&self) -> ManifestResult<()> {
        debug!(path = %self.path, "restoring pre-bump manifest");
        std::fs::write(&self.path, &self.original).map_err(|source| ManifestError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    const FIXTURE: &str = r#"{
  "name": "widget",
  "version": "1.2.3",
  "repository": "acme/widget",
  "scripts": {
    "test": "mocha",
    "build": "grunt dist"
  },
  "devDependencies": {
    "conventional-changelog": "^1.1.0"
  },
  "caravel": {
    "secondaryRepo": "git@github.com:acme/widget-bower.git"
  }
}
"#;

    fn write_fixture(dir: &tempfile::TempDir, contents: &str) -> Utf8PathBuf {
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        std::fs::write(root.join(MANIFEST_FILE), contents).unwrap();
        root
    }

    #[test]
    fn load_reads_fields() {
        let dir = tempfile::tempdir().unwrap();
        let root = write_fixture(&dir, FIXTURE);
        let manifest = Manifest::load(&root).unwrap();

        assert_eq!(manifest.version().unwrap(), Version::new(1, 2, 3));
        assert!(!manifest.is_private());
        assert_eq!(manifest.repository_url(), Some("acme/widget"));
        assert!(manifest.has_script("test"));
        assert!(manifest.has_script("build"));
        assert!(!manifest.has_script("lint"));
        assert!(manifest.has_dev_dependency("conventional-changelog"));
        assert!(!manifest.has_dev_dependency("mocha"));
    }

    #[test]
    fn load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        assert!(matches!(
            Manifest::load(&root),
            Err(ManifestError::Read { .. })
        ));
    }

    #[test]
    fn load_invalid_json_fails() {
        let dir = tempfile::tempdir().unwrap();
        let root = write_fixture(&dir, "{ not json");
        assert!(matches!(
            Manifest::load(&root),
            Err(ManifestError::Parse { .. })
        ));
    }

    #[test]
    fn repository_object_form() {
        let dir = tempfile::tempdir().unwrap();
        let root = write_fixture(
            &dir,
            r#"{"name":"w","version":"1.0.0","repository":{"type":"git","url":"git@github.com:acme/widget.git"}}"#,
        );
        let manifest = Manifest::load(&root).unwrap();
        assert_eq!(
            manifest.repository_url(),
            Some("git@github.com:acme/widget.git")
        );
    }

    #[test]
    fn set_version_and_save_preserves_other_fields() {
        let dir = tempfile::tempdir().unwrap();
        let root = write_fixture(&dir, FIXTURE);
        let mut manifest = Manifest::load(&root).unwrap();

        manifest.set_version(&Version::new(1, 3, 0));
        manifest.save().unwrap();

        let written = std::fs::read_to_string(root.join(MANIFEST_FILE)).unwrap();
        assert!(written.contains("\"version\": \"1.3.0\""));
        assert!(written.contains("\"secondaryRepo\""));
        assert!(written.ends_with('\n'));
        // Field order preserved: name still comes before version.
        assert!(written.find("\"name\"").unwrap() < written.find("\"version\"").unwrap());
    }

    #[test]
    fn restore_rolls_back_to_load_time_text() {
        let dir = tempfile::tempdir().unwrap();
        let root = write_fixture(&dir, FIXTURE);
        let mut manifest = Manifest::load(&root).unwrap();

        manifest.set_version(&Version::new(9, 9, 9));
        manifest.save().unwrap();
        manifest.restore().unwrap();

        let written = std::fs::read_to_string(root.join(MANIFEST_FILE)).unwrap();
        assert_eq!(written, FIXTURE);
    }

    #[test]
    fn mirror_config_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let root = write_fixture(&dir, FIXTURE);
        let manifest = Manifest::load(&root).unwrap();

        let cfg = manifest.mirror_config().unwrap();
        assert_eq!(cfg.repo_url, "git@github.com:acme/widget-bower.git");
        assert_eq!(cfg.build_dir, Utf8PathBuf::from("amd/"));
        assert_eq!(cfg.work_dir, Utf8PathBuf::from("tmp-bower-repo"));
    }

    #[test]
    fn mirror_config_absent() {
        let dir = tempfile::tempdir().unwrap();
        let root = write_fixture(&dir, r#"{"name":"w","version":"1.0.0"}"#);
        let manifest = Manifest::load(&root).unwrap();
        assert!(manifest.mirror_config().is_none());
    }

    #[test]
    fn private_flag() {
        let dir = tempfile::tempdir().unwrap();
        let root = write_fixture(&dir, r#"{"name":"w","version":"1.0.0","private":true}"#);
        let manifest = Manifest::load(&root).unwrap();
        assert!(manifest.is_private());
    }
}
