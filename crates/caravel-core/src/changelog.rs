//! Changelog generation via a declared generator tool.
//!
//! The generator is an external binary declared in the package's
//! devDependencies. Declared-but-missing is a hard error raised before
//! the pipeline starts; undeclared simply means no changelog step.

use camino::Utf8Path;
use tracing::debug;

use crate::manifest::Manifest;
use crate::runner::{CommandRunner, ExecResult};

/// The changelog generator caravel knows how to drive.
pub const GENERATOR: &str = "conventional-changelog";

/// The changelog file, relative to the project root.
pub const CHANGELOG_FILE: &str = "CHANGELOG.md";

/// The generator's name when the package declares it, `None` otherwise.
pub fn declared_tool(manifest: &Manifest) -> Option<String> {
    manifest
        .has_dev_dependency(GENERATOR)
        .then(|| GENERATOR.to_owned())
}

/// Whether the generator binary is on PATH.
pub fn is_available(tool: &str) -> bool {
    which::which(tool).is_ok()
}

/// Generate the changelog section for a release.
///
/// Running the generator is read-only, so it happens even under dry-run;
/// the section doubles as the tag annotation.
pub fn generate_section(
    runner: &CommandRunner,
    cwd: &Utf8Path,
    tool: &str,
    tag: &str,
    notes: Option<&str>,
) -> ExecResult<String> {
    let out = runner.required(cwd, tool, &["-p", "angular"])?;
    debug!(tool, tag, "generated changelog section");
    Ok(format_section(tag, notes, out.stdout.trim()))
}

/// Assemble a section: tag heading, optional notes, generator output.
fn format_section(tag: &str, notes: Option<&str>, body: &str) -> String {
    let mut section = format!("## {tag}\n\n");
    if let Some(notes) = notes {
        section.push_str(notes.trim());
        section.push_str("\n\n");
    }
    section.push_str(body);
    section.push('\n');
    section
}

/// Prepend a section to the changelog file, creating it if absent.
pub fn prepend(path: &Utf8Path, section: &str) -> std::io::Result<()> {
    let existing = std::fs::read_to_string(path).unwrap_or_default();
    let mut contents = section.to_owned();
    if !existing.is_empty() {
        contents.push('\n');
        contents.push_str(&existing);
    }
    std::fs::write(path, contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    #[test]
    fn prepend_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join(CHANGELOG_FILE)).unwrap();

        prepend(&path, "## v1.0.0\n\nfirst\n").unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "## v1.0.0\n\nfirst\n"
        );
    }

    #[test]
    fn prepend_keeps_existing_sections_below() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join(CHANGELOG_FILE)).unwrap();

        prepend(&path, "## v1.0.0\n\nfirst\n").unwrap();
        prepend(&path, "## v1.1.0\n\nsecond\n").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("## v1.1.0"));
        assert!(contents.find("v1.1.0").unwrap() < contents.find("v1.0.0").unwrap());
    }

    #[test]
    fn section_titled_with_tag_and_notes() {
        let section = format_section("v1.2.0", Some("highlights here"), "- fix: things");
        assert!(section.starts_with("## v1.2.0\n\n"));
        assert!(section.contains("highlights here\n\n"));
        assert!(section.ends_with("- fix: things\n"));
    }

    #[test]
    fn section_without_notes() {
        let section = format_section("v1.2.0", None, "- feat: stuff");
        assert_eq!(section, "## v1.2.0\n\n- feat: stuff\n");
    }

    #[test]
    fn available_finds_common_binaries() {
        // `sh` exists on any unix-ish test machine; a nonsense name does not.
        assert!(is_available("sh"));
        assert!(!is_available("definitely-not-a-real-binary"));
    }
}
