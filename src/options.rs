use std::path::PathBuf;

use clap::Args;

use crate::tokenizer::{Granularity, TokenizeOptions};

/// What to blame and how finely. Meant to be flattened into a command line
/// parser.
#[derive(Args, Clone, Debug, PartialEq, Eq)]
pub struct BlameOptions {
    /// How to split the file into tokens
    #[arg(long, value_enum, default_value_t = Granularity::Identifier)]
    pub granularity: Granularity,

    /// Treat whitespace characters as tokens too
    #[arg(long)]
    pub include_whitespace: bool,

    /// Commits (or hash prefixes) to pass over as if they never happened
    #[arg(long = "skip", value_name = "COMMIT")]
    pub skip_commits: Vec<String>,

    /// Repository to run git in
    #[arg(short = 'C', long, default_value = ".")]
    pub repository: PathBuf,

    /// Revision whose version of the file is blamed
    pub start_revision: String,

    /// File to blame, relative to the repository root
    pub file_path: PathBuf,
}

impl BlameOptions {
    pub fn new(start_revision: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        Self {
            granularity: Granularity::default(),
            include_whitespace: false,
            skip_commits: vec![],
            repository: PathBuf::from("."),
            start_revision: start_revision.into(),
            file_path: file_path.into(),
        }
    }

    pub fn tokenize_options(&self) -> TokenizeOptions {
        TokenizeOptions {
            granularity: self.granularity,
            include_whitespace: self.include_whitespace,
        }
    }
}
