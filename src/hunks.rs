//! Parsing of zero-context unified diffs into [`Chunk`]s.

use std::ops::Range;

use crate::error::ParseError;

/// One contiguous run of removed and added lines from a hunk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Chunk {
    /// The lines the added lines occupy in the file after the commit
    pub added: Range<usize>,

    /// The text of the removed lines, without the leading `-`
    pub removed: Vec<String>,
}

/// The two ranges of a `@@ -a,b +c,d @@` line as zero-based half-open ranges.
///
/// A zero length range `n,0` is the empty range *after* line `n`, which is
/// index `n`, following Git's convention.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HunkHeader {
    pub old: Range<usize>,
    pub new: Range<usize>,
}

impl HunkHeader {
    /// Parse `line`, which is line number `index` of the diff.
    pub fn parse(line: &str, index: usize) -> Result<Self, ParseError> {
        let malformed = || ParseError::Header {
            line: index,
            header: line.to_string(),
        };

        let rest = line.strip_prefix("@@ ").ok_or_else(malformed)?;
        let (ranges, _section) = rest.split_once(" @@").ok_or_else(malformed)?;
        let (old, new) = ranges.split_once(' ').ok_or_else(malformed)?;
        let old = old.strip_prefix('-').ok_or_else(malformed)?;
        let new = new.strip_prefix('+').ok_or_else(malformed)?;

        Ok(Self {
            old: parse_range(old, index)?,
            new: parse_range(new, index)?,
        })
    }
}

fn parse_range(range: &str, line: usize) -> Result<Range<usize>, ParseError> {
    let invalid = || ParseError::Range {
        line,
        range: range.to_string(),
    };

    let (start, count) = match range.split_once(',') {
        Some((start, count)) => (start.parse::<usize>(), count.parse::<usize>()),
        None => (range.parse::<usize>(), Ok(1)),
    };
    let start = start.map_err(|_| invalid())?;
    let count = count.map_err(|_| invalid())?;

    match (start, count) {
        (start, 0) => Ok(start..start),
        (0, _) => Err(invalid()),
        (start, count) => Ok(start - 1..start - 1 + count),
    }
}

/// Bookkeeping for the hunk currently being read.
struct OpenHunk {
    removed_left: usize,
    added_left: usize,
    cursor: usize,
    run: Option<Chunk>,
}

impl OpenHunk {
    fn new(header: HunkHeader) -> Self {
        Self {
            removed_left: header.old.len(),
            added_left: header.new.len(),
            cursor: header.new.start,
            run: None,
        }
    }

    fn is_done(&self) -> bool {
        self.removed_left == 0 && self.added_left == 0
    }

    fn run(&mut self) -> &mut Chunk {
        let cursor = self.cursor;
        self.run.get_or_insert_with(|| Chunk {
            added: cursor..cursor,
            removed: vec![],
        })
    }

    fn close_run(&mut self, chunks: &mut Vec<Chunk>) {
        chunks.extend(self.run.take());
    }

    fn truncated(&self, line: usize) -> ParseError {
        ParseError::Truncated {
            line,
            removed: self.removed_left,
            added: self.added_left,
        }
    }

    /// Consume one line of the hunk body. Returns false if the line does not
    /// belong to the hunk.
    fn take(
        &mut self,
        line: &str,
        index: usize,
        chunks: &mut Vec<Chunk>,
    ) -> Result<bool, ParseError> {
        let overrun = ParseError::Overrun { line: index };

        if let Some(removed) = line.strip_prefix('-') {
            self.removed_left = self.removed_left.checked_sub(1).ok_or(overrun)?;
            self.run().removed.push(removed.to_string());
        } else if line.starts_with('+') {
            self.added_left = self.added_left.checked_sub(1).ok_or(overrun)?;
            self.run().added.end += 1;
            self.cursor += 1;
        } else if line.starts_with(' ') {
            if self.removed_left == 0 || self.added_left == 0 {
                return Err(overrun);
            }
            self.removed_left -= 1;
            self.added_left -= 1;
            self.close_run(chunks);
            self.cursor += 1;
        } else if !line.starts_with('\\') {
            return Ok(false);
        }

        Ok(true)
    }
}

/// Parse the lines of a zero-context unified diff into the [`Chunk`]s it
/// describes, in ascending order of position.
///
/// Lines before the first hunk of each file section (`diff --git`, `index`,
/// `---`, `+++`, rename and mode lines) are skipped.
pub fn parse<S: AsRef<str>>(diff: &[S]) -> Result<Vec<Chunk>, ParseError> {
    let mut chunks = vec![];
    let mut hunk: Option<OpenHunk> = None;
    let mut in_hunks = false;

    for (index, line) in diff.iter().enumerate() {
        let line = line.as_ref();

        if let Some(open) = hunk.as_mut() {
            if open.take(line, index, &mut chunks)? {
                if open.is_done() {
                    open.close_run(&mut chunks);
                    hunk = None;
                }
                continue;
            }
            return Err(open.truncated(index));
        }

        if line.starts_with("@@") {
            let header = HunkHeader::parse(line, index)?;
            let open = OpenHunk::new(header);
            if !open.is_done() {
                hunk = Some(open);
            }
            in_hunks = true;
        } else if line.starts_with("diff ") {
            in_hunks = false;
        } else if in_hunks && [' ', '+', '-'].iter().any(|&c| line.starts_with(c)) {
            return Err(ParseError::Overrun { line: index });
        }
    }

    match hunk {
        Some(open) => Err(open.truncated(diff.len())),
        None => Ok(chunks),
    }
}
