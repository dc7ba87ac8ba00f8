use crate::token::{Payload, Token, TokenKind};

fn char_kind(c: char) -> TokenKind {
    if c.is_alphabetic() {
        TokenKind::Word
    } else if c.is_ascii_digit() {
        TokenKind::Number
    } else if c.is_whitespace() {
        TokenKind::Whitespace
    } else {
        TokenKind::Symbol
    }
}

/// Splits a character stream into `WORD`/`NUMBER`/`SYMBOL`/`WHITESPACE` tokens.
///
/// Contiguous runs of the same character class coalesce into a single token,
/// except `SYMBOL`, where every character is its own token. This is a plain
/// one-pass, pull-based iterator: nothing is read from the underlying char
/// iterator until `next()` is called.
pub struct Tokenizer<I: Iterator<Item = char>> {
    chars: I,
    pending: Option<char>,
    start: usize,
    row: usize,
    col: usize,
}

impl<I: Iterator<Item = char>> Tokenizer<I> {
    pub fn new(chars: I) -> Self {
        Self {
            chars,
            pending: None,
            start: 0,
            row: 1,
            col: 1,
        }
    }

    fn advance(&mut self) -> Option<char> {
        self.pending.take().or_else(|| self.chars.next())
    }
}

impl<I: Iterator<Item = char>> Iterator for Tokenizer<I> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let start = self.start;
        let row = self.row;
        let col = self.col;

        let mut ofs = start;
        let mut cur_row = row;
        let mut cur_col = col;

        let mut buf = String::new();
        let mut buf_kind: Option<TokenKind> = None;

        loop {
            let c = match self.advance() {
                Some(c) => c,
                None => {
                    if buf_kind.is_none() {
                        return None;
                    }
                    break;
                }
            };
            let kind = char_kind(c);

            if buf_kind.is_none() {
                if kind == TokenKind::Symbol {
                    self.start = ofs + 1;
                    self.row = if c == '\n' { cur_row + 1 } else { cur_row };
                    self.col = if c == '\n' { 1 } else { cur_col + 1 };
                    return Some(Token::new(
                        TokenKind::Symbol,
                        Payload::Str(c.to_string()),
                        start,
                        start + 1,
                        row,
                        col,
                    ));
                }
                buf_kind = Some(kind);
                buf.push(c);
            } else if Some(kind) == buf_kind {
                buf.push(c);
            } else {
                self.pending = Some(c);
                break;
            }

            ofs += 1;
            if c == '\n' {
                cur_row += 1;
                cur_col = 1;
            } else {
                cur_col += 1;
            }
        }

        self.start = ofs;
        self.row = cur_row;
        self.col = cur_col;

        Some(Token::new(
            buf_kind.expect("buffered token always has a kind"),
            Payload::Str(buf.clone()),
            start,
            start + buf.chars().count(),
            row,
            col,
        ))
    }
}

/// Drops `WHITESPACE` tokens from an upstream token iterator.
pub struct WhitespaceFilter<I: Iterator<Item = Token>> {
    inner: I,
}

impl<I: Iterator<Item = Token>> WhitespaceFilter<I> {
    pub fn new(inner: I) -> Self {
        Self { inner }
    }
}

impl<I: Iterator<Item = Token>> Iterator for WhitespaceFilter<I> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        for token in &mut self.inner {
            if token.kind != TokenKind::Whitespace {
                return Some(token);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(s: &str) -> Vec<Token> {
        Tokenizer::new(s.chars()).collect()
    }

    #[test]
    fn splits_on_class_boundaries() {
        let tokens = tokenize("Gen 1:1");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Word,
                TokenKind::Whitespace,
                TokenKind::Number,
                TokenKind::Symbol,
                TokenKind::Number,
            ]
        );
    }

    #[test]
    fn concatenation_reproduces_input() {
        let input = "Glory, I'm back home Genesis 16:32 - Genesis 3\nin Exodus.";
        let tokens = tokenize(input);
        let joined: String = tokens.iter().map(Token::value).collect();
        assert_eq!(joined, input);
    }

    #[test]
    fn offsets_strictly_increase() {
        let tokens = tokenize("abc 123 : - ,");
        let mut last_start = None;
        for t in &tokens {
            assert_eq!(t.end - t.start, t.value().chars().count());
            if let Some(prev) = last_start {
                assert!(t.start > prev);
            }
            last_start = Some(t.start);
        }
    }

    #[test]
    fn rows_and_cols_track_newlines() {
        let tokens = tokenize("ab\ncd");
        assert_eq!(tokens[0].row, 1);
        assert_eq!(tokens[0].col, 1);
        let cd = tokens.iter().find(|t| t.value() == "cd").unwrap();
        assert_eq!(cd.row, 2);
        assert_eq!(cd.col, 1);
    }

    #[test]
    fn whitespace_filter_drops_whitespace_only() {
        let tokens: Vec<_> = WhitespaceFilter::new(tokenize("a  b\tc").into_iter()).collect();
        assert!(tokens.iter().all(|t| t.kind != TokenKind::Whitespace));
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn empty_input_yields_no_tokens() {
        assert!(tokenize("").is_empty());
    }
}
