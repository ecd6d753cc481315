//! Collaborators backed by the local filesystem and the `git` binary.

use std::{
    fs, io,
    path::{Path, PathBuf},
    process::Command,
};

use url::Url;

use super::{FileReader, Head, RefResolver, historical_uri, split_historical_uri};

/// Reads `file:` documents from disk and `git:` documents through `git show`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Git;

impl Git {
    /// Runs `git -C dir args..` and returns stdout as is.
    fn output(dir: &Path, args: &[&str]) -> io::Result<String> {
        let output = Command::new("git").arg("-C").arg(dir).args(args).output()?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(io::Error::other(format!(
                "git {} failed: {}",
                args.join(" "),
                stderr.trim()
            )))
        }
    }

    /// Runs `git -C dir args..` and returns trimmed stdout.
    fn run(dir: &Path, args: &[&str]) -> io::Result<String> {
        Self::output(dir, args).map(|out| out.trim_end().to_string())
    }

    /// Like [`Git::run`], but any failure is just "no answer".
    fn query(dir: &Path, args: &[&str]) -> Option<String> {
        match Self::run(dir, args) {
            Ok(out) if !out.is_empty() => Some(out),
            Ok(_) => None,
            Err(e) => {
                tracing::trace!(dir = %dir.display(), error = %e, "git query failed");
                None
            }
        }
    }
}

/// The nearest directory at or above `uri`'s path that still exists.
///
/// Files pinned to an old ref may live in directories the working tree has
/// since dropped; git is run from the closest surviving ancestor instead.
fn existing_dir(uri: &Url) -> Option<PathBuf> {
    let path = uri.to_file_path().ok()?;
    path.ancestors()
        .find(|dir| dir.is_dir())
        .map(Path::to_path_buf)
}

/// The repository-relative name of `path`, and a directory to run git in.
fn repository_path(path: &Path) -> io::Result<(PathBuf, String)> {
    let dir = path
        .ancestors()
        .skip(1)
        .find(|dir| dir.is_dir())
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))?;
    let rest = path.strip_prefix(dir).map_err(io::Error::other)?;

    // `--show-prefix` is relative to the top-level and already ends in `/`.
    let prefix = Git::run(dir, &["rev-parse", "--show-prefix"])?;
    let rest: Vec<_> = rest
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    Ok((dir.to_path_buf(), format!("{prefix}{}", rest.join("/"))))
}

impl RefResolver for Git {
    fn head(&self, uri: &Url) -> Option<Head> {
        let dir = existing_dir(uri)?;
        let commit = Self::query(&dir, &["rev-parse", "HEAD"])?;
        let name = Self::query(&dir, &["rev-parse", "--abbrev-ref", "HEAD"])
            .filter(|name| name != "HEAD");
        Some(Head {
            name,
            commit: Some(commit),
        })
    }

    fn resolve_ref(&self, uri: &Url, git_ref: &str) -> Option<String> {
        let dir = existing_dir(uri)?;
        let rev = format!("{git_ref}^{{commit}}");
        Self::query(&dir, &["rev-parse", "--verify", "--quiet", &rev])
    }

    fn to_historical_uri(&self, uri: &Url, git_ref: &str) -> io::Result<Url> {
        historical_uri(uri, git_ref)
    }
}

impl FileReader for Git {
    fn read_text(&self, uri: &Url) -> io::Result<String> {
        match uri.scheme() {
            "file" => {
                let path = uri.to_file_path().map_err(|()| {
                    io::Error::new(io::ErrorKind::InvalidInput, format!("not a local path: {uri}"))
                })?;
                fs::read_to_string(path)
            }
            "git" => {
                let (live, git_ref) = split_historical_uri(uri).ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidInput, format!("malformed uri: {uri}"))
                })?;
                let path = live.to_file_path().map_err(|()| {
                    io::Error::new(io::ErrorKind::InvalidInput, format!("not a local path: {uri}"))
                })?;
                let (dir, name) = repository_path(&path)?;
                Self::output(&dir, &["show", &format!("{git_ref}:{name}")])
            }
            scheme => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("cannot read {scheme}: documents"),
            )),
        }
    }
}
