use crate::pverse::SeededIterator;
use crate::span_filter::PVerseSpan;
use crate::token::{Payload, Token, TokenKind};
use std::collections::VecDeque;

/// An ordered sequence of spans, pre-rectification.
#[derive(Debug, Clone, PartialEq)]
pub struct PPassage {
    pub spans: Vec<PVerseSpan>,
}

fn is_passage_sep(t: &Token) -> bool {
    t.kind == TokenKind::Symbol && (t.value() == "," || t.value() == ";")
}

struct Accum {
    spans: Vec<PVerseSpan>,
    start: usize,
    end: usize,
    row: usize,
    col: usize,
}

/// Joins adjacent `SPAN` tokens separated by `,`/`;` into a single `PASSAGE`
/// token, carrying the last verse of each span forward as the seed for the
/// next span's parse (so `"John 3:16, 17"` resolves `17` against `3:16`).
pub struct PPassageFilter<I: SeededIterator> {
    inner: I,
    pending: VecDeque<Token>,
    accum: Option<Accum>,
}

impl<I: SeededIterator> PPassageFilter<I> {
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            pending: VecDeque::new(),
            accum: None,
        }
    }

    fn pull(&mut self, seed: Option<crate::pverse::PVerse>) -> Option<Token> {
        self.pending.pop_front().or_else(|| self.inner.seeded_next(seed))
    }

    fn emit(&mut self) -> Token {
        let accum = self.accum.take().unwrap();
        Token::new(
            TokenKind::Passage,
            Payload::Passage(PPassage { spans: accum.spans }),
            accum.start,
            accum.end,
            accum.row,
            accum.col,
        )
    }
}

impl<I: SeededIterator> SeededIterator for PPassageFilter<I> {
    fn seeded_next(&mut self, seed: Option<crate::pverse::PVerse>) -> Option<Token> {
        loop {
            let inner_seed = self.accum.as_ref().map(|a| a.spans.last().unwrap().last).or(seed);
            match self.pull(inner_seed) {
                None => {
                    return if self.accum.is_some() { Some(self.emit()) } else { None };
                }
                Some(t) => {
                    if t.kind == TokenKind::Span {
                        let span = *t.payload.as_span().unwrap();
                        match &mut self.accum {
                            None => {
                                self.accum = Some(Accum {
                                    spans: vec![span],
                                    start: t.start,
                                    end: t.end,
                                    row: t.row,
                                    col: t.col,
                                });
                            }
                            Some(acc) => {
                                acc.spans.push(span);
                                acc.end = t.end;
                            }
                        }
                        continue;
                    }

                    if is_passage_sep(&t) && self.accum.is_some() {
                        if let Some(acc) = &mut self.accum {
                            acc.end = t.end;
                        }
                        continue;
                    }

                    if self.accum.is_some() {
                        self.pending.push_front(t);
                        return Some(self.emit());
                    }

                    return Some(t);
                }
            }
        }
    }
}

impl<I: SeededIterator> Iterator for PPassageFilter<I> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.seeded_next(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::{BookFilter, BookMatcher};
    use crate::pverse::PVerseFilter;
    use crate::span_filter::PVerseSpanFilter;
    use crate::tokenizer::{Tokenizer, WhitespaceFilter};

    fn toy_matcher() -> BookMatcher {
        BookMatcher::new(&[("Genesis", &["gen"]), ("Exodus", &["ex"]), ("John", &["jn"])]).unwrap()
    }

    fn passages(s: &str, matcher: &BookMatcher) -> Vec<Token> {
        let tokens = WhitespaceFilter::new(Tokenizer::new(s.chars()));
        let books = BookFilter::new(tokens, matcher);
        let verses = PVerseFilter::new(books);
        let spans = PVerseSpanFilter::new(verses);
        PPassageFilter::new(spans).collect()
    }

    #[test]
    fn comma_joins_spans_into_one_passage() {
        let matcher = toy_matcher();
        let tokens = passages("John 3:16, 17, 18", &matcher);
        assert_eq!(tokens.len(), 1);
        let p = tokens[0].payload.as_passage().unwrap();
        assert_eq!(p.spans.len(), 3);
    }

    #[test]
    fn non_reference_text_passes_through() {
        let matcher = toy_matcher();
        let tokens = passages("flugelhorn", &matcher);
        assert_eq!(tokens[0].kind, TokenKind::Word);
    }

    #[test]
    fn two_passages_separated_by_prose() {
        let matcher = toy_matcher();
        let tokens: Vec<_> = passages("Genesis 1:1 and also Exodus 2:2", &matcher)
            .into_iter()
            .filter(|t| t.kind == TokenKind::Passage)
            .collect();
        assert_eq!(tokens.len(), 2);
    }
}
