//! The token matrix the blame engine rewrites while walking history.
//!
//! Every token ever seen lives in one arena and is addressed by [`TokenId`],
//! so a token keeps its identity while it moves between lines and revisions.
//! The live matrix is a flat list of ids plus the offset at which each line
//! ends, which turns replacing a span of lines into a single splice.

use std::ops::Range;

use crate::tokenizer::{Line, Token};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenId(usize);

#[derive(Debug)]
pub struct TokenMatrix {
    arena: Vec<Token>,
    ids: Vec<TokenId>,
    // bounds[r]..bounds[r + 1] is the part of `ids` holding line r
    bounds: Vec<usize>,
}

impl TokenMatrix {
    pub fn new(lines: Vec<Line>) -> Self {
        let mut matrix = Self {
            arena: vec![],
            ids: vec![],
            bounds: vec![0],
        };

        for line in lines {
            for token in line {
                let id = matrix.alloc(token);
                matrix.ids.push(id);
            }
            matrix.bounds.push(matrix.ids.len());
        }

        matrix
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.bounds.len() - 1
    }

    /// Number of tokens still waiting to be attributed.
    pub fn live_tokens(&self) -> usize {
        self.ids.len()
    }

    pub fn line(&self, row: usize) -> &[TokenId] {
        &self.ids[self.bounds[row]..self.bounds[row + 1]]
    }

    /// Copies of the id lists for the lines in `rows`.
    pub fn lines(&self, rows: Range<usize>) -> Vec<Vec<TokenId>> {
        rows.map(|r| self.line(r).to_vec()).collect()
    }

    pub fn text(&self, id: TokenId) -> &str {
        &self.arena[id.0].text
    }

    /// Add a token to the arena without placing it in any line.
    pub fn alloc(&mut self, token: Token) -> TokenId {
        self.arena.push(token);
        TokenId(self.arena.len() - 1)
    }

    /// Attribute a token to commit number `commit`.
    pub fn stamp(&mut self, id: TokenId, commit: usize) {
        let token = &mut self.arena[id.0];
        debug_assert!(token.commit.is_none(), "token {:?} stamped twice", id);
        token.commit = Some(commit);
    }

    /// Replace the lines in `rows` with `lines`, which may be of a different
    /// length.
    pub fn splice(&mut self, rows: Range<usize>, lines: Vec<Vec<TokenId>>) {
        let flat = self.bounds[rows.start]..self.bounds[rows.end];
        let removed = flat.len();

        let mut ids = vec![];
        let mut ends = Vec::with_capacity(lines.len());
        for line in lines {
            ids.extend(line);
            ends.push(flat.start + ids.len());
        }
        let inserted = ids.len();

        self.ids.splice(flat, ids);

        let tail = self.bounds[rows.end + 1..]
            .iter()
            .map(|b| b - removed + inserted)
            .collect::<Vec<_>>();
        self.bounds.truncate(rows.start + 1);
        self.bounds.extend(ends);
        self.bounds.extend(tail);
    }

    /// The arena, in allocation order.
    pub fn into_tokens(self) -> Vec<Token> {
        self.arena
    }
}
