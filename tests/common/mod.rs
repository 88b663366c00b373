use std::path::Path;
use std::process::Command;

use tempfile::TempDir;
use tokblame::*;

/// A throwaway Git repository.
pub struct Repo {
    dir: TempDir,
}

impl Repo {
    pub fn new() -> Self {
        init_logging();

        let repo = Self {
            dir: tempfile::tempdir().expect("able to create a temporary directory"),
        };
        repo.git(&["init", "--quiet"]);
        repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    // Returns stdout without the trailing newline
    pub fn git(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .arg("-C")
            .arg(self.path())
            .args(["-c", "user.name=A U Thor"])
            .args(["-c", "user.email=author@example.com"])
            .args(["-c", "commit.gpgsign=false"])
            .args(["-c", "init.defaultBranch=main"])
            .args(args)
            .env("GIT_CONFIG_GLOBAL", "/dev/null")
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .output()
            .expect("able to run git");

        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );

        String::from_utf8(output.stdout)
            .expect("valid UTF-8 from git")
            .trim_end()
            .to_string()
    }

    /// Write `contents` to `path` and commit it, returning the commit hash.
    pub fn commit(&self, path: &str, contents: &str, message: &str) -> String {
        std::fs::write(self.path().join(path), contents).expect("able to write file");
        self.git(&["add", path]);
        self.git(&["commit", "--quiet", "-m", message]);
        self.head()
    }

    pub fn head(&self) -> String {
        self.git(&["rev-parse", "HEAD"])
    }

    pub fn blame(&self, path: &str, configure: impl FnOnce(&mut BlameOptions)) -> Result<Blame> {
        let mut options = BlameOptions::new("HEAD", path);
        options.repository = self.path().to_path_buf();
        configure(&mut options);

        blame_file(&options)
    }
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Pairs of token text and the hash of the commit it is attributed to.
pub fn attribution(blame: &Blame) -> Vec<(String, String)> {
    blame
        .tokens()
        .map(|t| (t.text.clone(), blame.commit_of(t).hash.clone()))
        .collect()
}

/// Build the expected value for [`attribution`].
pub fn expect<H: AsRef<str>>(pairs: &[(&str, H)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(text, hash)| (text.to_string(), hash.as_ref().to_string()))
        .collect()
}
