//! Token level alignment of the two sides of a [`Chunk`](crate::Chunk).
//!
//! Both sides are flattened into one token stream each and diffed with every
//! token acting as a line. Tokens in an inserted or replaced run of that diff
//! are new. Everything between those runs is carried over unchanged, so a
//! commit that only moves tokens between lines or reformats them does not get
//! the blame for them.

use std::collections::{BTreeMap, BTreeSet};

use rangemap::RangeMap;
use similar::{capture_diff_slices, Algorithm, DiffTag};

/// A `(row, index)` pair addressing a token within a list of token lines.
pub type Position = (usize, usize);

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Alignment {
    /// Tokens on the current side that have no counterpart on the previous side
    pub added: BTreeSet<Position>,

    /// Tokens on the current side mapped to where they were on the previous side
    pub changed: BTreeMap<Position, Position>,
}

/// A list of token lines flattened into one sequence, remembering which flat
/// index range each line occupies.
struct Flattened<'a> {
    texts: Vec<&'a str>,
    rows: RangeMap<usize, usize>,
}

impl<'a> Flattened<'a> {
    fn new(lines: &[Vec<&'a str>]) -> Self {
        let mut texts = vec![];
        let mut rows = RangeMap::new();

        for (row, line) in lines.iter().enumerate() {
            // RangeMap does not accept empty ranges, and an empty line owns no
            // flat index anyway.
            if !line.is_empty() {
                rows.insert(texts.len()..texts.len() + line.len(), row);
            }
            texts.extend(line.iter().copied());
        }

        Self { texts, rows }
    }

    fn position(&self, flat: usize) -> Position {
        let (range, row) = self
            .rows
            .get_key_value(&flat)
            .expect("every flat index belongs to a line");

        (*row, flat - range.start)
    }
}

/// Classify every token of `current` as added or carried over from `previous`.
pub fn align(previous: &[Vec<&str>], current: &[Vec<&str>]) -> Alignment {
    let old = Flattened::new(previous);
    let new = Flattened::new(current);

    let mut alignment = Alignment::default();

    for op in capture_diff_slices(Algorithm::Myers, &old.texts, &new.texts) {
        let (tag, old_range, new_range) = op.as_tag_tuple();

        match tag {
            DiffTag::Equal => {
                for (o, n) in old_range.zip(new_range) {
                    alignment.changed.insert(new.position(n), old.position(o));
                }
            }
            DiffTag::Insert | DiffTag::Replace => {
                alignment
                    .added
                    .extend(new_range.map(|n| new.position(n)));
            }
            DiffTag::Delete => {}
        }
    }

    alignment
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines<'a>(text: &[&'a str]) -> Vec<Vec<&'a str>> {
        text.iter()
            .map(|l| l.split(' ').filter(|t| !t.is_empty()).collect())
            .collect()
    }

    #[test]
    fn changed_literal() {
        let alignment = align(&lines(&["int x = 1 ;"]), &lines(&["int x = 2 ;"]));

        assert_eq!(alignment.added, BTreeSet::from([(0, 3)]));
        assert_eq!(
            alignment.changed,
            BTreeMap::from([
                ((0, 0), (0, 0)),
                ((0, 1), (0, 1)),
                ((0, 2), (0, 2)),
                ((0, 4), (0, 4)),
            ])
        );
    }

    #[test]
    fn identical_lines_swapped() {
        let previous = lines(&["a = b ;", "a = b ;"]);
        let current = previous.clone();

        let alignment = align(&previous, &current);

        assert!(alignment.added.is_empty());
        assert_eq!(alignment.changed.len(), 8);
        assert!(alignment.changed.iter().all(|(new, old)| new == old));
    }

    #[test]
    fn reflowed_across_lines() {
        let previous = lines(&["f ( a , b ) ;"]);
        let current = lines(&["f ( a ,", "", "b ) ;"]);

        let alignment = align(&previous, &current);

        assert!(alignment.added.is_empty());
        assert_eq!(alignment.changed[&(0, 3)], (0, 3));
        assert_eq!(alignment.changed[&(2, 0)], (0, 4));
        assert_eq!(alignment.changed[&(2, 2)], (0, 6));
    }

    #[test]
    fn inserted_line() {
        let alignment = align(&lines(&["a", "c"]), &lines(&["a", "b", "c"]));

        assert_eq!(alignment.added, BTreeSet::from([(1, 0)]));
        assert_eq!(
            alignment.changed,
            BTreeMap::from([((0, 0), (0, 0)), ((2, 0), (1, 0))])
        );
    }

    #[test]
    fn nothing_before() {
        let alignment = align(&[], &lines(&["x y", "z"]));

        assert_eq!(alignment.added, BTreeSet::from([(0, 0), (0, 1), (1, 0)]));
        assert!(alignment.changed.is_empty());
    }

    #[test]
    fn nothing_after() {
        let alignment = align(&lines(&["x y", "z"]), &[]);

        assert_eq!(alignment, Alignment::default());
    }

    #[test]
    fn duplicates_inside_a_replacement_are_added() {
        let alignment = align(&lines(&["p q"]), &lines(&["q r p"]));

        assert_eq!(alignment.added.len() + alignment.changed.len(), 3);
        assert_eq!(alignment.changed.len(), 1);
    }
}
