//! Splitting text into lines of position-tagged tokens.

/// How finely text is split into tokens.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Granularity {
    /// Every character is its own token.
    Char,

    /// Runs of alphanumerics and underscores form one token, every other
    /// character is its own token.
    #[default]
    Identifier,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TokenizeOptions {
    pub granularity: Granularity,
    pub include_whitespace: bool,
}

/// The smallest attributable piece of a file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    /// The line the token was found on when it was tokenized
    pub row: usize,

    /// Offset in characters from the start of that line
    pub column: usize,

    /// The token text itself
    pub text: String,

    pub(crate) commit: Option<usize>,
}

impl Token {
    fn new(row: usize, column: usize, text: String) -> Self {
        Self {
            row,
            column,
            text,
            commit: None,
        }
    }

    /// Index of the commit that introduced this token, once known.
    pub fn commit(&self) -> Option<usize> {
        self.commit
    }
}

pub type Line = Vec<Token>;

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Tokenize `text` into one [`Line`] per `\n` separated line.
///
/// A text ending in a newline yields a trailing empty line, so row `n` of the
/// result is always line `n + 1` as a unified diff counts them.
pub fn tokenize(text: &str, options: TokenizeOptions) -> Vec<Line> {
    text.split('\n')
        .enumerate()
        .map(|(row, line)| tokenize_line(line, row, options))
        .collect()
}

/// Tokenize a single line that contains no `\n`, tagging every token with `row`.
pub fn tokenize_line(line: &str, row: usize, options: TokenizeOptions) -> Line {
    let mut tokens = vec![];
    let mut chars = line.chars().enumerate().peekable();

    while let Some((column, c)) = chars.next() {
        if c.is_whitespace() {
            if options.include_whitespace {
                tokens.push(Token::new(row, column, c.to_string()));
            }
            continue;
        }

        let mut text = String::from(c);
        if options.granularity == Granularity::Identifier && is_word(c) {
            while let Some((_, next)) = chars.next_if(|(_, n)| is_word(*n)) {
                text.push(next);
            }
        }

        tokens.push(Token::new(row, column, text));
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    const IDENT: TokenizeOptions = TokenizeOptions {
        granularity: Granularity::Identifier,
        include_whitespace: false,
    };

    fn texts(lines: &[Line]) -> Vec<Vec<&str>> {
        lines
            .iter()
            .map(|l| l.iter().map(|t| t.text.as_str()).collect())
            .collect()
    }

    #[test]
    fn identifiers() {
        let lines = tokenize("int foo_bar = 42;\nx+=y1", IDENT);

        assert_eq!(
            texts(&lines),
            vec![
                vec!["int", "foo_bar", "=", "42", ";"],
                vec!["x", "+", "=", "y1"],
            ]
        );

        let positions = lines[0]
            .iter()
            .map(|t| (t.row, t.column))
            .collect::<Vec<_>>();
        assert_eq!(positions, vec![(0, 0), (0, 4), (0, 12), (0, 14), (0, 16)]);
        assert!(lines.iter().flatten().all(|t| t.commit().is_none()));
    }

    #[test]
    fn characters() {
        let options = TokenizeOptions {
            granularity: Granularity::Char,
            include_whitespace: false,
        };
        let lines = tokenize("ab c", options);

        assert_eq!(texts(&lines), vec![vec!["a", "b", "c"]]);
        assert_eq!(lines[0][2].column, 3);
    }

    #[test_case("a\nb", 2 ; "no trailing newline")]
    #[test_case("a\nb\n", 3 ; "trailing newline")]
    #[test_case("", 1 ; "empty")]
    #[test_case("\n\n", 3 ; "only newlines")]
    fn line_count(text: &str, rows: usize) {
        assert_eq!(tokenize(text, IDENT).len(), rows);
    }

    #[test]
    fn columns_count_characters() {
        let lines = tokenize("«ö» æøå_1", IDENT);

        assert_eq!(texts(&lines), vec![vec!["«", "ö", "»", "æøå_1"]]);
        assert_eq!(lines[0][3].column, 4);
    }

    #[test_case(Granularity::Identifier ; "identifier")]
    #[test_case(Granularity::Char ; "char")]
    fn round_trip_with_whitespace(granularity: Granularity) {
        let text = "fn main() {\n\tlet x  = \"a b\";\r\n}\n";
        let options = TokenizeOptions {
            granularity,
            include_whitespace: true,
        };

        let rebuilt = tokenize(text, options)
            .iter()
            .map(|l| l.iter().map(|t| t.text.as_str()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n");

        assert_eq!(rebuilt, text);
    }

    #[test]
    fn tokens_sit_at_their_columns() {
        let text = "  if (a_b >= 10) { return; }\n\n    c";

        for (line, tokens) in text.split('\n').zip(tokenize(text, IDENT)) {
            for token in tokens {
                let found = line
                    .chars()
                    .skip(token.column)
                    .take(token.text.chars().count())
                    .collect::<String>();
                assert_eq!(found, token.text);
            }
        }
    }

    #[test]
    fn single_line_matches_file_tokenization() {
        let file = "first\n  let v = w.0 + 1;\nlast";
        let from_file = &tokenize(file, IDENT)[1];
        let from_line = tokenize_line("  let v = w.0 + 1;", 1, IDENT);

        assert_eq!(&from_line, from_file);
    }
}
