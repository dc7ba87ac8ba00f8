use crate::token::{Payload, Token, TokenKind};

/// A partial verse reference: `book` is always known, `chapter` and `verse`
/// may be absent. Invariant: `verse.is_some()` implies `chapter.is_some()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PVerse {
    pub book: usize,
    pub chapter: Option<u32>,
    pub verse: Option<u32>,
}

impl PVerse {
    pub fn new(book: usize, chapter: Option<u32>, verse: Option<u32>) -> Self {
        debug_assert!(verse.is_none() || chapter.is_some());
        Self { book, chapter, verse }
    }
}

/// Extends an `Iterator<Item = Token>` with a variant of `next` that accepts
/// the most recently recognized (partial) verse as carried-over context,
/// letting bare numbers like the `18` in `"John 3:16, 17, 18"` resolve
/// against the verse recognized just before them.
pub trait SeededIterator {
    fn seeded_next(&mut self, seed: Option<PVerse>) -> Option<Token>;
}

fn is_colon(t: &Token) -> bool {
    t.kind == TokenKind::Symbol && t.value() == ":"
}

fn parse_number(t: &Token) -> Option<u32> {
    if t.kind == TokenKind::Number {
        t.value().parse().ok()
    } else {
        None
    }
}

/// Recognizes `Book`, `Book C`, and `Book C:V`, plus, given a seed, the bare
/// continuations `V`, `C:V`, emitting a single `VERSE` token per match.
/// Non-matching input passes through the head token unchanged.
pub struct PVerseFilter<I: Iterator<Item = Token>> {
    inner: I,
    buf: Vec<Token>,
    done: bool,
}

impl<I: Iterator<Item = Token>> PVerseFilter<I> {
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            buf: Vec::with_capacity(4),
            done: false,
        }
    }

    fn refill(&mut self, want: usize) {
        while !self.done && self.buf.len() < want {
            match self.inner.next() {
                Some(t) => self.buf.push(t),
                None => self.done = true,
            }
        }
    }

    fn span_of(&self, k: usize) -> (usize, usize, usize, usize) {
        let first = &self.buf[0];
        let last = &self.buf[k - 1];
        (first.start, last.end, first.row, first.col)
    }
}

impl<I: Iterator<Item = Token>> SeededIterator for PVerseFilter<I> {
    fn seeded_next(&mut self, seed: Option<PVerse>) -> Option<Token> {
        self.refill(4);
        if self.buf.is_empty() {
            return None;
        }

        if self.buf.len() >= 4
            && self.buf[0].kind == TokenKind::Book
            && self.buf[1].kind == TokenKind::Number
            && is_colon(&self.buf[2])
            && self.buf[2].kind == TokenKind::Symbol
            && self.buf[3].kind == TokenKind::Number
        {
            let book = self.buf[0].payload.as_book_index().unwrap();
            let chapter = parse_number(&self.buf[1]);
            let verse = parse_number(&self.buf[3]);
            let (start, end, row, col) = self.span_of(4);
            self.buf.drain(..4);
            return Some(Token::new(
                TokenKind::Verse,
                Payload::Verse(PVerse::new(book, chapter, verse)),
                start,
                end,
                row,
                col,
            ));
        }

        if let Some(seed) = seed.filter(|s| s.chapter.is_some()) {
            if self.buf.len() >= 3
                && self.buf[0].kind == TokenKind::Number
                && is_colon(&self.buf[1])
                && self.buf[2].kind == TokenKind::Number
            {
                let chapter = parse_number(&self.buf[0]);
                let verse = parse_number(&self.buf[2]);
                let (start, end, row, col) = self.span_of(3);
                self.buf.drain(..3);
                return Some(Token::new(
                    TokenKind::Verse,
                    Payload::Verse(PVerse::new(seed.book, chapter, verse)),
                    start,
                    end,
                    row,
                    col,
                ));
            }
        }

        if self.buf.len() >= 2 && self.buf[0].kind == TokenKind::Book && self.buf[1].kind == TokenKind::Number {
            let book = self.buf[0].payload.as_book_index().unwrap();
            let chapter = parse_number(&self.buf[1]);
            let (start, end, row, col) = self.span_of(2);
            self.buf.drain(..2);
            return Some(Token::new(
                TokenKind::Verse,
                Payload::Verse(PVerse::new(book, chapter, None)),
                start,
                end,
                row,
                col,
            ));
        }

        if self.buf[0].kind == TokenKind::Book {
            let book = self.buf[0].payload.as_book_index().unwrap();
            let (start, end, row, col) = self.span_of(1);
            self.buf.drain(..1);
            return Some(Token::new(
                TokenKind::Verse,
                Payload::Verse(PVerse::new(book, None, None)),
                start,
                end,
                row,
                col,
            ));
        }

        if let Some(seed) = seed {
            if seed.chapter.is_some() && self.buf[0].kind == TokenKind::Number {
                let n = parse_number(&self.buf[0]);
                let (start, end, row, col) = self.span_of(1);
                self.buf.drain(..1);
                let pverse = if seed.verse.is_some() {
                    PVerse::new(seed.book, seed.chapter, n)
                } else {
                    PVerse::new(seed.book, n, None)
                };
                return Some(Token::new(TokenKind::Verse, Payload::Verse(pverse), start, end, row, col));
            }
        }

        Some(self.buf.remove(0))
    }
}

impl<I: Iterator<Item = Token>> Iterator for PVerseFilter<I> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.seeded_next(None)
    }
}
