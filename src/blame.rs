use std::path::Path;

use tracing::{debug, info, trace};

use crate::align::align;
use crate::history::{file_at_revision, Commit, GitLog};
use crate::hunks::{self, Chunk};
use crate::matrix::{TokenId, TokenMatrix};
use crate::options::BlameOptions;
use crate::tokenizer::{tokenize, tokenize_line, Line, TokenizeOptions};
use crate::{Error, Result};

/// Decides whether a commit should be passed over entirely, for instance one
/// half of a known delete-everything/restore-everything pair.
pub trait SkipCommit {
    fn skip(&self, commit: &Commit) -> bool;
}

impl<F> SkipCommit for F
where
    F: Fn(&Commit) -> bool,
{
    fn skip(&self, commit: &Commit) -> bool {
        self(commit)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NeverSkip;

impl SkipCommit for NeverSkip {
    fn skip(&self, _commit: &Commit) -> bool {
        false
    }
}

/// Skips commits whose hash starts with any of the given hashes or prefixes.
#[derive(Clone, Debug, Default)]
pub struct SkipList(Vec<String>);

impl SkipList {
    pub fn new(hashes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(
            hashes
                .into_iter()
                .map(Into::into)
                .filter(|h: &String| !h.is_empty())
                .collect(),
        )
    }
}

impl SkipCommit for SkipList {
    fn skip(&self, commit: &Commit) -> bool {
        self.0.iter().any(|h| commit.hash.starts_with(h.as_str()))
    }
}

/// A token of the blamed file together with the commit that introduced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlamedToken {
    /// The line number of the token in the blamed revision
    pub row: usize,

    /// Offset in characters from the start of the line
    pub column: usize,

    pub text: String,

    /// Index into [`Blame::commits`]
    pub commit: usize,
}

/// Every token of a file attributed to a commit.
#[derive(Debug)]
pub struct Blame {
    contents: String,
    commits: Vec<Commit>,
    lines: Vec<Vec<BlamedToken>>,
}

impl Blame {
    /// The blamed file as of the starting revision.
    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Every commit that was walked and not skipped, newest first. Their diffs
    /// are dropped once processed.
    pub fn commits(&self) -> &[Commit] {
        &self.commits
    }

    /// The tokens of each line of the file.
    pub fn lines(&self) -> &[Vec<BlamedToken>] {
        &self.lines
    }

    pub fn tokens(&self) -> impl Iterator<Item = &BlamedToken> {
        self.lines.iter().flatten()
    }

    pub fn commit_of(&self, token: &BlamedToken) -> &Commit {
        &self.commits[token.commit]
    }
}

/// Walks the history of a file from newest to oldest commit, rewriting the
/// token matrix back to each older revision and attributing the tokens each
/// commit introduced.
///
/// Consuming the engine with [`finish`](BlameEngine::finish) ends the walk.
pub struct BlameEngine<S = NeverSkip> {
    options: TokenizeOptions,
    matrix: TokenMatrix,
    contents: String,
    // Token count of each line of the blamed revision
    start_lines: Vec<usize>,
    commits: Vec<Commit>,
    skip: S,
}

impl BlameEngine {
    pub fn new(contents: String, options: TokenizeOptions) -> Self {
        let lines = tokenize(&contents, options);
        let start_lines = lines.iter().map(Vec::len).collect();

        Self {
            options,
            matrix: TokenMatrix::new(lines),
            contents,
            start_lines,
            commits: vec![],
            skip: NeverSkip,
        }
    }
}

impl<S: SkipCommit> BlameEngine<S> {
    pub fn with_skip<T: SkipCommit>(self, skip: T) -> BlameEngine<T> {
        BlameEngine {
            options: self.options,
            matrix: self.matrix,
            contents: self.contents,
            start_lines: self.start_lines,
            commits: self.commits,
            skip,
        }
    }

    /// Undo `commit` on the matrix. Commits must be fed newest first.
    pub fn process(&mut self, mut commit: Commit) -> Result<()> {
        if self.skip.skip(&commit) {
            debug!(commit = %commit.hash, "Skipping commit");
            return Ok(());
        }

        let chunks = hunks::parse(&commit.diff)?;
        commit.diff = vec![];

        debug!(
            commit = %commit.hash,
            chunks = chunks.len(),
            lines = self.matrix.len(),
            tokens = self.matrix.live_tokens(),
            "Processing commit"
        );

        let index = self.commits.len();
        self.commits.push(commit);

        // Chunks are in the coordinates of the file after the commit, but the
        // ones before have already been replaced by their old version.
        let mut offset = 0;
        for chunk in chunks {
            offset += self.apply(chunk, offset, index)?;
        }

        Ok(())
    }

    /// Replace the added lines of `chunk` with its removed lines, stamping the
    /// tokens that did not exist before. Returns the change in line count.
    fn apply(&mut self, chunk: Chunk, offset: isize, commit: usize) -> Result<isize> {
        let start = chunk.added.start as isize + offset;
        let end = chunk.added.end as isize + offset;

        if start < 0 || end as usize > self.matrix.len() {
            return Err(Error::ChunkOutOfBounds {
                commit: self.commits[commit].hash.clone(),
                range: start..end,
                rows: self.matrix.len(),
            });
        }
        let rows = start as usize..end as usize;

        let previous = chunk
            .removed
            .iter()
            .enumerate()
            .map(|(row, line)| tokenize_line(line, row, self.options))
            .collect::<Vec<_>>();
        let current = self.matrix.lines(rows.clone());

        let alignment = {
            let previous_texts = previous
                .iter()
                .map(|l| l.iter().map(|t| t.text.as_str()).collect::<Vec<_>>())
                .collect::<Vec<_>>();
            let current_texts = current
                .iter()
                .map(|l| l.iter().map(|id| self.matrix.text(*id)).collect::<Vec<_>>())
                .collect::<Vec<_>>();

            align(&previous_texts, &current_texts)
        };

        for &(r, c) in &alignment.added {
            self.matrix.stamp(current[r][c], commit);
        }

        let mut carried = previous
            .iter()
            .map(|l| vec![None; l.len()])
            .collect::<Vec<Vec<Option<TokenId>>>>();
        for (&(r, c), &(pr, pc)) in &alignment.changed {
            carried[pr][pc] = Some(current[r][c]);
        }

        let lines = self.rebuild(previous, carried);
        let delta = lines.len() as isize - rows.len() as isize;

        trace!(
            ?rows,
            offset,
            added = alignment.added.len(),
            carried = alignment.changed.len(),
            "Applied chunk"
        );

        self.matrix.splice(rows, lines);

        Ok(delta)
    }

    /// The id lines of the previous revision: carried over tokens where the
    /// alignment found one, freshly allocated tokens everywhere else.
    fn rebuild(
        &mut self,
        previous: Vec<Line>,
        carried: Vec<Vec<Option<TokenId>>>,
    ) -> Vec<Vec<TokenId>> {
        let mut lines = Vec::with_capacity(previous.len());

        for (tokens, ids) in previous.into_iter().zip(carried) {
            let mut line = Vec::with_capacity(tokens.len());
            for (token, id) in tokens.into_iter().zip(ids) {
                line.push(match id {
                    Some(id) => id,
                    None => self.matrix.alloc(token),
                });
            }
            lines.push(line);
        }

        lines
    }

    /// Check that every token has been attributed and produce the [`Blame`].
    pub fn finish(self) -> Result<Blame> {
        let remaining = self.matrix.live_tokens();
        if remaining > 0 {
            return Err(Error::Unattributed { remaining });
        }

        // The tokens of the blamed revision were allocated first, in order.
        let mut tokens = self.matrix.into_tokens().into_iter();
        let mut lines = Vec::with_capacity(self.start_lines.len());

        for count in self.start_lines {
            let line = tokens
                .by_ref()
                .take(count)
                .map(|t| -> Result<BlamedToken> {
                    Ok(BlamedToken {
                        commit: t.commit().ok_or(Error::Unattributed { remaining: 1 })?,
                        row: t.row,
                        column: t.column,
                        text: t.text,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            lines.push(line);
        }

        info!(
            commits = self.commits.len(),
            lines = lines.len(),
            "Blame complete"
        );

        Ok(Blame {
            contents: self.contents,
            commits: self.commits,
            lines,
        })
    }
}

/// Blame `contents` using its history, newest commit first.
pub fn blame_history<S: SkipCommit>(
    contents: String,
    history: impl IntoIterator<Item = Result<Commit>>,
    options: TokenizeOptions,
    skip: S,
) -> Result<Blame> {
    let mut engine = BlameEngine::new(contents, options).with_skip(skip);

    for commit in history {
        engine.process(commit?)?;
    }

    engine.finish()
}

/// Obtain the token blame of a file in a Git repository as described by
/// `options`.
pub fn blame_file(options: &BlameOptions) -> Result<Blame> {
    let repo: &Path = &options.repository;

    info!(
        revision = %options.start_revision,
        path = %options.file_path.display(),
        "Blaming file"
    );

    let contents = file_at_revision(repo, &options.start_revision, &options.file_path)?;
    let log = GitLog::spawn(repo, &options.start_revision, &options.file_path)?;

    blame_history(
        contents,
        log,
        options.tokenize_options(),
        SkipList::new(options.skip_commits.iter().cloned()),
    )
}
