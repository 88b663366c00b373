//! Reading a file's history out of `git log`.
//!
//! Git is run as a separate process and its output is consumed one commit at
//! a time, so memory use does not grow with the length of the history.

use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Child, ChildStderr, ChildStdout, Command, Stdio};
use std::thread::{self, JoinHandle};

use bstr::{BString, ByteSlice};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::error::VcsStreamError;
use crate::Result;

/// Every field is preceded by a NUL so that the diff which follows the last
/// field runs until the next record's first NUL.
const LOG_FORMAT: &str = "--format=%x00%H%x00%an%x00%ae%x00%aI%x00%B%x00";

/// A commit touching the blamed file, newest first as git lists them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    pub hash: String,
    pub author_name: String,
    pub author_email: String,
    pub author_time: OffsetDateTime,
    pub message: String,

    /// The lines of the commit's zero-context diff of the file
    pub diff: Vec<String>,
}

/// Iterator over the commit records of `git log` output in [`LOG_FORMAT`].
pub struct CommitReader<R> {
    reader: R,
    started: bool,
    done: bool,
}

impl<R: BufRead> CommitReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            started: false,
            done: false,
        }
    }

    /// Read up to and excluding the next NUL. The flag tells whether a NUL was
    /// found before the end of input.
    fn field(&mut self) -> std::result::Result<Option<(BString, bool)>, VcsStreamError> {
        let mut buf = vec![];

        if self.reader.read_until(0, &mut buf)? == 0 {
            return Ok(None);
        }

        let terminated = buf.last() == Some(&0);
        if terminated {
            buf.pop();
        }

        Ok(Some((buf.into(), terminated)))
    }

    fn required(&mut self, field: &'static str) -> std::result::Result<String, VcsStreamError> {
        match self.field()? {
            Some((value, true)) => Ok(value.to_str()?.to_owned()),
            _ => Err(VcsStreamError::Truncated { field }),
        }
    }

    fn read_commit(&mut self) -> std::result::Result<Option<Commit>, VcsStreamError> {
        if !self.started {
            self.started = true;

            match self.field()? {
                None => return Ok(None),
                Some((lead, true)) if lead.is_empty() => {}
                Some(_) => return Err(VcsStreamError::MissingSeparator),
            }
        }

        let hash = self.required("hash")?;
        let author_name = self.required("author name")?;
        let author_email = self.required("author email")?;
        let author_time = OffsetDateTime::parse(&self.required("author date")?, &Rfc3339)?;
        let message = self.required("message")?.trim_end().to_owned();

        let diff = match self.field()? {
            Some((body, terminated)) => {
                self.done = !terminated;
                // Only split on \n. A \r belongs to the line like it does when
                // the file itself is tokenized.
                body.split_str("\n")
                    .map(|l| l.to_str().map(str::to_owned))
                    .collect::<std::result::Result<Vec<_>, _>>()?
            }
            None => {
                self.done = true;
                vec![]
            }
        };

        Ok(Some(Commit {
            hash,
            author_name,
            author_email,
            author_time,
            message,
            diff,
        }))
    }
}

impl<R: BufRead> Iterator for CommitReader<R> {
    type Item = std::result::Result<Commit, VcsStreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.read_commit() {
            Ok(Some(commit)) => Some(Ok(commit)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// A running `git log` following one file along first parents.
pub struct GitLog {
    child: Child,
    commits: CommitReader<BufReader<ChildStdout>>,
    // Drained concurrently so a chatty stderr cannot stall stdout
    stderr: Option<JoinHandle<std::io::Result<String>>>,
    finished: bool,
    reaped: bool,
}

impl GitLog {
    pub fn spawn(
        repo: &Path,
        revision: &str,
        path: &Path,
    ) -> std::result::Result<Self, VcsStreamError> {
        let mut child = Command::new("git")
            .arg("-C")
            .arg(repo)
            .args(["-c", "log.showSignature=false"])
            .args([
                "log",
                "--first-parent",
                "--diff-merges=first-parent",
                "--follow",
                "--patch",
                "--unified=0",
                "--no-color",
                "--no-ext-diff",
                "--no-textconv",
                LOG_FORMAT,
                revision,
                "--",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(VcsStreamError::Spawn)?;

        let stdout = child.stdout.take().expect("stdout is piped");
        let stderr = child.stderr.take().map(drain);

        tracing::debug!(repo = %repo.display(), revision, path = %path.display(), "Started git log");

        Ok(Self {
            child,
            commits: CommitReader::new(BufReader::new(stdout)),
            stderr,
            finished: false,
            reaped: false,
        })
    }

    fn wait(&mut self) -> std::result::Result<(), VcsStreamError> {
        let status = self.child.wait()?;
        self.reaped = true;
        let stderr = match self.stderr.take() {
            Some(handle) => handle
                .join()
                .unwrap_or_else(|_| Ok(String::new()))?,
            None => String::new(),
        };

        if status.success() {
            Ok(())
        } else {
            Err(VcsStreamError::Exit {
                status,
                stderr: stderr.trim_end().to_owned(),
            })
        }
    }
}

impl Iterator for GitLog {
    type Item = Result<Commit>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.commits.next() {
            Some(Ok(commit)) => Some(Ok(commit)),
            Some(Err(e)) => {
                self.finished = true;
                Some(Err(e.into()))
            }
            None => {
                self.finished = true;
                self.wait().err().map(|e| Err(e.into()))
            }
        }
    }
}

fn drain(mut pipe: ChildStderr) -> JoinHandle<std::io::Result<String>> {
    thread::spawn(move || {
        let mut output = vec![];
        pipe.read_to_end(&mut output)?;
        Ok(output.to_str_lossy().into_owned())
    })
}

impl Drop for GitLog {
    fn drop(&mut self) {
        if !self.reaped {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// The contents of `path` as of `revision`.
pub fn file_at_revision(
    repo: &Path,
    revision: &str,
    path: &Path,
) -> std::result::Result<String, VcsStreamError> {
    let object = format!("{}:{}", revision, path.display());

    let output = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(["cat-file", "blob", &object])
        .stdin(Stdio::null())
        .output()
        .map_err(VcsStreamError::Spawn)?;

    if !output.status.success() {
        return Err(VcsStreamError::Exit {
            status: output.status,
            stderr: output.stderr.to_str_lossy().trim_end().to_owned(),
        });
    }

    Ok(output.stdout.to_str()?.to_owned())
}
