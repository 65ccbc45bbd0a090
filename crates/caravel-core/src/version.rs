//! Version resolution: bump kinds and pre-release counters.
//!
//! The resolver is a pure function from (current version, bump kind,
//! pre-release identifier) to the next version. It never touches the
//! filesystem; the pipeline is responsible for writing the result back
//! into package.json.

use semver::{BuildMetadata, Prerelease, Version};
use thiserror::Error;
use tracing::debug;

/// Errors from version resolution.
#[derive(Error, Debug)]
pub enum VersionError {
    /// The bump argument was neither a known kind nor a valid version.
    #[error("invalid bump kind '{0}' — expected major, minor, patch, or a semver version")]
    InvalidBumpKind(String),

    /// The `--preid` value cannot appear in a pre-release component.
    #[error("invalid pre-release identifier '{0}'")]
    InvalidPreid(String),
}

/// Result alias for version operations.
pub type VersionResult<T> = Result<T, VersionError>;

/// How the version should move.
///
/// Anything that is not `major`/`minor`/`patch` is treated as an explicit
/// target version and validated when the bump is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BumpKind {
    /// Major release (X.0.0).
    Major,
    /// Minor release (x.Y.0).
    Minor,
    /// Patch release (x.y.Z).
    Patch,
    /// A literal target version (e.g., `"2.0.0-rc.1"`).
    Explicit(String),
}

impl BumpKind {
    /// Parse the positional bump argument.
    pub fn parse(s: &str) -> Self {
        match s {
            "major" => Self::Major,
            "minor" => Self::Minor,
            "patch" => Self::Patch,
            other => Self::Explicit(other.to_owned()),
        }
    }
}

impl std::fmt::Display for BumpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Major => write!(f, "major"),
            Self::Minor => write!(f, "minor"),
            Self::Patch => write!(f, "patch"),
            Self::Explicit(v) => write!(f, "{v}"),
        }
    }
}

/// Resolve the next version.
///
/// - No bump kind (pre-release only): start from `current`.
/// - Major/minor/patch: increment that component, zero the lower ones,
///   and drop any pre-release or build metadata.
/// - Explicit: the string (optionally `v`-prefixed) must parse as semver.
/// - A pre-release identifier is applied on top: an existing counter for
///   the same identifier is incremented, anything else becomes `<id>.0`.
pub fn resolve(
    current: &Version,
    bump: Option<&BumpKind>,
    preid: Option<&str>,
) -> VersionResult<Version> {
    let mut next = match bump {
        None => current.clone(),
        Some(BumpKind::Major) => Version::new(current.major + 1, 0, 0),
        Some(BumpKind::Minor) => Version::new(current.major, current.minor + 1, 0),
        Some(BumpKind::Patch) => Version::new(current.major, current.minor, current.patch + 1),
        Some(BumpKind::Explicit(s)) => parse_version(s)?,
    };

    if let Some(id) = preid {
        apply_preid(&mut next, id)?;
    }

    debug!(%current, ?bump, ?preid, %next, "resolved version");
    Ok(next)
}

/// Parse a version string, stripping an optional `v` prefix.
pub fn parse_version(s: &str) -> VersionResult<Version> {
    let bare = s.strip_prefix('v').unwrap_or(s);
    Version::parse(bare).map_err(|_| VersionError::InvalidBumpKind(s.to_owned()))
}

/// Apply a pre-release identifier with an incrementing counter.
///
/// `1.2.3` + `beta` → `1.2.3-beta.0`; `1.2.3-beta.0` + `beta` →
/// `1.2.3-beta.1`; a different identifier replaces the whole component.
fn apply_preid(version: &mut Version, id: &str) -> VersionResult<()> {
    let pre = version.pre.as_str();

    let next_pre = if pre.is_empty() {
        format!("{id}.0")
    } else {
        let parts: Vec<&str> = pre.split('.').collect();
        if parts.first() == Some(&id) {
            match parts.last().and_then(|p| p.parse::<u64>().ok()) {
                Some(n) => {
                    let mut head: Vec<&str> = parts;
                    head.pop();
                    format!("{}.{}", head.join("."), n + 1)
                }
                // Same identifier but no counter yet: start one.
                None => format!("{pre}.0"),
            }
        } else {
            format!("{id}.0")
        }
    };

    version.pre =
        Prerelease::new(&next_pre).map_err(|_| VersionError::InvalidPreid(id.to_owned()))?;
    version.build = BuildMetadata::EMPTY;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn bump_kind_parses_known_kinds() {
        assert_eq!(BumpKind::parse("major"), BumpKind::Major);
        assert_eq!(BumpKind::parse("minor"), BumpKind::Minor);
        assert_eq!(BumpKind::parse("patch"), BumpKind::Patch);
    }

    #[test]
    fn bump_kind_anything_else_is_explicit() {
        assert_eq!(
            BumpKind::parse("2.0.0"),
            BumpKind::Explicit("2.0.0".into())
        );
        assert_eq!(
            BumpKind::parse("banana"),
            BumpKind::Explicit("banana".into())
        );
    }

    #[test]
    fn bump_major_zeroes_lower_components() {
        let next = resolve(&v("1.2.3"), Some(&BumpKind::Major), None).unwrap();
        assert_eq!(next, v("2.0.0"));
    }

    #[test]
    fn bump_minor_zeroes_patch() {
        let next = resolve(&v("1.2.3"), Some(&BumpKind::Minor), None).unwrap();
        assert_eq!(next, v("1.3.0"));
    }

    #[test]
    fn bump_patch_increments() {
        let next = resolve(&v("1.2.3"), Some(&BumpKind::Patch), None).unwrap();
        assert_eq!(next, v("1.2.4"));
    }

    #[test]
    fn bumps_strictly_increase() {
        for kind in [BumpKind::Major, BumpKind::Minor, BumpKind::Patch] {
            let current = v("1.2.3");
            let next = resolve(&current, Some(&kind), None).unwrap();
            assert!(next > current, "{kind} did not increase the version");
        }
    }

    #[test]
    fn bump_strips_prerelease() {
        let next = resolve(&v("1.2.3-beta.4"), Some(&BumpKind::Patch), None).unwrap();
        assert_eq!(next, v("1.2.4"));
    }

    #[test]
    fn explicit_version_accepted() {
        let next = resolve(&v("1.0.0"), Some(&BumpKind::Explicit("3.1.4".into())), None).unwrap();
        assert_eq!(next, v("3.1.4"));
    }

    #[test]
    fn explicit_version_with_v_prefix() {
        let next = resolve(&v("1.0.0"), Some(&BumpKind::Explicit("v2.0.0".into())), None).unwrap();
        assert_eq!(next, v("2.0.0"));
    }

    #[test]
    fn explicit_garbage_rejected() {
        let err = resolve(&v("1.0.0"), Some(&BumpKind::Explicit("banana".into())), None)
            .unwrap_err();
        assert!(matches!(err, VersionError::InvalidBumpKind(_)));
    }

    #[test]
    fn preid_alone_appends_counter() {
        let next = resolve(&v("1.2.3"), None, Some("beta")).unwrap();
        assert_eq!(next, v("1.2.3-beta.0"));
    }

    #[test]
    fn preid_applied_twice_increments_counter() {
        let first = resolve(&v("1.2.3"), None, Some("beta")).unwrap();
        assert_eq!(first, v("1.2.3-beta.0"));
        let second = resolve(&first, None, Some("beta")).unwrap();
        assert_eq!(second, v("1.2.3-beta.1"));
        assert!(second > first);
    }

    #[test]
    fn preid_without_counter_gains_one() {
        let next = resolve(&v("1.2.3-beta"), None, Some("beta")).unwrap();
        assert_eq!(next, v("1.2.3-beta.0"));
    }

    #[test]
    fn different_preid_replaces_component() {
        let next = resolve(&v("1.2.3-alpha.2"), None, Some("beta")).unwrap();
        assert_eq!(next, v("1.2.3-beta.0"));
    }

    #[test]
    fn bump_with_preid_combines() {
        let next = resolve(&v("1.2.3"), Some(&BumpKind::Minor), Some("rc")).unwrap();
        assert_eq!(next, v("1.3.0-rc.0"));
    }

    #[test]
    fn invalid_preid_rejected() {
        let err = resolve(&v("1.2.3"), None, Some("not valid")).unwrap_err();
        assert!(matches!(err, VersionError::InvalidPreid(_)));
    }

    #[test]
    fn parse_version_strips_prefix() {
        assert_eq!(parse_version("v1.2.3").unwrap(), v("1.2.3"));
        assert_eq!(parse_version("1.2.3").unwrap(), v("1.2.3"));
    }
}
