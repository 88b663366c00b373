//! Token level `git blame`.
//!
//! Instead of blaming whole lines this crate attributes every token of a file
//! to the commit that introduced it. It walks the history of the file from
//! the newest commit to the oldest, undoing each commit's diff on an in-memory
//! matrix of tokens. Within every changed span the old and new tokens are
//! aligned so that tokens which were merely moved or reformatted keep their
//! older attribution.
//!
//! Git itself is run as a separate process to list the history. Only
//! first-parent history is followed, so changes made on merged side branches
//! are attributed to the merge. The file must be UTF-8 in every revision.
//!
//! The main entry points are [`blame_file`] and, for history obtained some
//! other way, [`BlameEngine`] and [`blame_history`].

mod align;
pub use align::{align, Alignment, Position};

mod blame;
pub use blame::*;

mod error;
pub use error::*;

mod history;
pub use history::{file_at_revision, Commit, CommitReader, GitLog};

mod hunks;
pub use hunks::{parse as parse_diff, Chunk, HunkHeader};

mod matrix;

mod options;
pub use options::BlameOptions;

mod tokenizer;
pub use tokenizer::{tokenize, tokenize_line, Granularity, Line, Token, TokenizeOptions};
