//! Unified error type for rerereric operations.
//!
//! Each variant carries enough detail to act on without extra context, and
//! the message distinguishes failure modes the rest of the tool treats
//! differently — in particular a *missing* cache (empty, not an error) from
//! a *corrupt* one (fatal with a clear diagnostic).

use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// RerereError
// ---------------------------------------------------------------------------

/// Unified error type for cache, snapshot, and file operations.
#[derive(Debug)]
pub enum RerereError {
    /// A git command failed (used for git-dir discovery).
    GitCommand {
        /// The command that was run (e.g. `"git rev-parse --git-dir"`).
        command: String,
        /// Captured stderr from git.
        stderr: String,
    },

    /// The cache file exists but could not be parsed.
    ///
    /// Deliberately distinct from a missing cache file, which loads as an
    /// empty cache.
    CacheCorrupt {
        /// Path to the cache file.
        path: PathBuf,
        /// Parser diagnostic.
        detail: String,
    },

    /// The cache file could not be written durably.
    CacheWrite {
        /// Path to the cache file.
        path: PathBuf,
        /// What failed (create, write, fsync, or rename).
        detail: String,
    },

    /// A configuration file could not be read or parsed.
    Config {
        /// Path to the config file.
        path: PathBuf,
        /// Human-readable description of the problem.
        detail: String,
    },

    /// A configuration value is out of range.
    InvalidOption {
        /// The option name (e.g. `"similarity"`).
        option: String,
        /// The offending value as given.
        value: String,
        /// Why it is invalid.
        reason: String,
    },

    /// Reading or writing a source file or snapshot failed.
    FileIo {
        /// The file the operation was for.
        path: PathBuf,
        /// The underlying error.
        detail: String,
    },

    /// Any other I/O error.
    Io(std::io::Error),
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for RerereError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GitCommand { command, stderr } => {
                write!(f, "git command failed: {command}")?;
                if !stderr.is_empty() {
                    write!(f, "\n  stderr: {stderr}")?;
                }
                write!(
                    f,
                    "\n  To fix: run inside a git repository, or pass --git-dir explicitly."
                )
            }
            Self::CacheCorrupt { path, detail } => {
                write!(
                    f,
                    "resolution cache '{}' is corrupt: {detail}\n  The file exists but cannot be parsed (a missing cache would simply be treated as empty).\n  To fix: restore the file from a backup, or delete it to start a fresh cache.",
                    path.display()
                )
            }
            Self::CacheWrite { path, detail } => {
                write!(
                    f,
                    "failed to persist resolution cache '{}': {detail}\n  The previous cache contents are untouched.\n  To fix: check disk space and permissions, then retry.",
                    path.display()
                )
            }
            Self::Config { path, detail } => {
                write!(
                    f,
                    "configuration error in '{}': {detail}\n  To fix: edit the config file and correct the issue.",
                    path.display()
                )
            }
            Self::InvalidOption {
                option,
                value,
                reason,
            } => {
                write!(f, "invalid value '{value}' for {option}: {reason}")
            }
            Self::FileIo { path, detail } => {
                write!(f, "I/O error on '{}': {detail}", path.display())
            }
            Self::Io(err) => {
                write!(f, "I/O error: {err}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// std::error::Error + From impls
// ---------------------------------------------------------------------------

impl std::error::Error for RerereError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RerereError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl RerereError {
    /// Attach a path to a raw I/O error.
    #[must_use]
    pub fn file_io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::FileIo {
            path: path.into(),
            detail: err.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
