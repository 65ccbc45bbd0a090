//! Repository identity: owner/name extraction from repository URLs.

use thiserror::Error;

/// Errors from repository URL parsing.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// The URL matched none of the accepted forms.
    #[error("unrecognized repository URL '{0}' — expected owner/name or a github.com URL")]
    Unrecognized(String),
}

/// An owner/name pair identifying a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    /// Repository owner (user or organization).
    pub owner: String,
    /// Repository name.
    pub name: String,
}

/// Parse an owner/name pair out of a repository URL.
///
/// Accepted forms, tried in order:
/// - `git@github.com:owner/repo.git`
/// - `git+https://github.com/owner/repo.git` (plain `https://` too)
/// - bare `owner/repo`
///
/// A string that does not yield two non-empty components is rejected, so
/// callers never see a degenerate (owner, repo).
pub fn parse(url: &str) -> Result<RepoId, RemoteError> {
    let trimmed = url.trim();

    let hosted = trimmed
        .strip_prefix("git@github.com:")
        .or_else(|| trimmed.strip_prefix("git+https://github.com/"))
        .or_else(|| trimmed.strip_prefix("https://github.com/"));

    if let Some(path) = hosted {
        let path = path.strip_suffix(".git").unwrap_or(path);
        if let Some((owner, name)) = path.split_once('/')
            && !owner.is_empty()
            && !name.is_empty()
            && !name.contains('/')
        {
            return Ok(RepoId {
                owner: owner.to_owned(),
                name: name.to_owned(),
            });
        }
        return Err(RemoteError::Unrecognized(url.to_owned()));
    }

    // Bare owner/repo, best effort.
    let parts: Vec<&str> = trimmed.split('/').filter(|p| !p.is_empty()).collect();
    match parts.as_slice() {
        [owner, name] => Ok(RepoId {
            owner: (*owner).to_owned(),
            name: name.strip_suffix(".git").unwrap_or(name).to_owned(),
        }),
        _ => Err(RemoteError::Unrecognized(url.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(owner: &str, name: &str) -> RepoId {
        RepoId {
            owner: owner.into(),
            name: name.into(),
        }
    }

    #[test]
    fn parse_ssh_form() {
        assert_eq!(
            parse("git@github.com:acme/widget.git").unwrap(),
            id("acme", "widget")
        );
    }

    #[test]
    fn parse_git_https_form() {
        assert_eq!(
            parse("git+https://github.com/acme/widget.git").unwrap(),
            id("acme", "widget")
        );
    }

    #[test]
    fn parse_plain_https_form() {
        assert_eq!(
            parse("https://github.com/acme/widget").unwrap(),
            id("acme", "widget")
        );
    }

    #[test]
    fn parse_bare_form() {
        assert_eq!(parse("acme/widget").unwrap(), id("acme", "widget"));
    }

    #[test]
    fn parse_bare_form_with_git_suffix() {
        assert_eq!(parse("acme/widget.git").unwrap(), id("acme", "widget"));
    }

    #[test]
    fn degenerate_single_component_rejected() {
        assert!(parse("widget").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn nested_path_rejected() {
        assert!(parse("git@github.com:acme/widget/extra.git").is_err());
    }
}
