use std::ops::Range;

/// The error produced if a complete blame cannot be produced.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error parsing diff: {0}")]
    Parse(#[from] ParseError),
    #[error("{remaining} tokens were never attributed to a commit")]
    Unattributed { remaining: usize },
    #[error("Chunk at lines {range:?} of commit {commit} is outside the {rows} tracked lines")]
    ChunkOutOfBounds {
        commit: String,
        range: Range<isize>,
        rows: usize,
    },
    #[error("Error reading history: {0}")]
    VcsStream(#[from] VcsStreamError),
}

/// Malformed unified diff input. `line` is the index into the diff lines.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: malformed hunk header {header:?}")]
    Header { line: usize, header: String },
    #[error("line {line}: invalid range {range:?}")]
    Range { line: usize, range: String },
    #[error("line {line}: hunk is missing {removed} removed and {added} added lines")]
    Truncated {
        line: usize,
        removed: usize,
        added: usize,
    },
    #[error("line {line}: more lines than the hunk header announced")]
    Overrun { line: usize },
}

#[derive(thiserror::Error, Debug)]
pub enum VcsStreamError {
    #[error("Unable to run git: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("Error reading git output: {0}")]
    Io(#[from] std::io::Error),
    #[error("git exited with {status}: {stderr}")]
    Exit {
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("Commit record ended before its {field} field")]
    Truncated { field: &'static str },
    #[error("Commit record does not start with a separator")]
    MissingSeparator,
    #[error("Error converting data to string: {0}")]
    Utf8(#[from] bstr::Utf8Error),
    #[error("Error parsing author date: {0}")]
    Timestamp(#[from] time::error::Parse),
}

pub type Result<T> = std::result::Result<T, Error>;
