//! Shared test helpers for rerereric integration tests.
//!
//! All tests use temp directories — no side effects on any real repo. Each
//! test gets its own fake `.git` dir via `setup_repo()`, so no git binary is
//! needed; the engine only uses the git dir as a place to keep state.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use rerereric::config::RerereConfig;
use rerereric::engine::Rerereric;

/// A temp working tree with a `.git` directory inside it.
pub struct TestRepo {
    pub dir: TempDir,
    pub git_dir: PathBuf,
}

impl TestRepo {
    /// An engine with default config (context 2, similarity 0.8) over this
    /// repo's git dir.
    pub fn engine(&self) -> Rerereric {
        self.engine_with(RerereConfig::default())
    }

    pub fn engine_with(&self, config: RerereConfig) -> Rerereric {
        Rerereric::new(config, self.git_dir.clone())
    }

    /// Write a file under the work tree and return its path.
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent dir");
        }
        fs::write(&path, content).expect("failed to write test file");
        path
    }

    pub fn read(&self, path: &Path) -> String {
        fs::read_to_string(path).expect("failed to read test file")
    }
}

pub fn setup_repo() -> TestRepo {
    let dir = TempDir::new().expect("failed to create temp dir");
    let git_dir = dir.path().join(".git");
    fs::create_dir_all(&git_dir).expect("failed to create .git dir");
    TestRepo { dir, git_dir }
}

/// A minimal two-way conflict between `ours` and `theirs` line blocks,
/// framed by `before` and `after` text.
pub fn conflict_text(before: &str, ours: &[&str], theirs: &[&str], after: &str) -> String {
    let mut text = String::new();
    if !before.is_empty() {
        text.push_str(before);
        if !before.ends_with('\n') {
            text.push('\n');
        }
    }
    text.push_str("<<<<<<< HEAD\n");
    for line in ours {
        text.push_str(line);
        text.push('\n');
    }
    text.push_str("=======\n");
    for line in theirs {
        text.push_str(line);
        text.push('\n');
    }
    text.push_str(">>>>>>> branch\n");
    if !after.is_empty() {
        text.push_str(after);
        if !after.ends_with('\n') {
            text.push('\n');
        }
    }
    text
}
