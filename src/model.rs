use crate::book::{BibleInfo, BookFilter, BookMatcher};
use crate::error::{BibleRefError, Result};
use crate::format::Formatter;
use crate::passage_filter::PPassageFilter;
use crate::pverse::{PVerse, PVerseFilter};
use crate::rectifier::{FullVerse, PPassageRectifier};
use crate::span_filter::PVerseSpanFilter;
use crate::token::{Token, TokenKind};
use crate::tokenizer::{Tokenizer, WhitespaceFilter};
use crate::value::{Passage, Verse, VerseSpan};
use once_cell::sync::Lazy;
use std::str::Chars;

static STANDARD_MODEL: Lazy<BibleModel> = Lazy::new(|| {
    let info = BibleInfo::standard();
    let matcher = BookMatcher::standard();
    let formatter = Formatter::from_info(&info);
    BibleModel { info, matcher, formatter }
});

type Pipeline<'m> =
    PPassageRectifier<'m, PPassageFilter<PVerseSpanFilter<PVerseFilter<BookFilter<'m, WhitespaceFilter<Tokenizer<Chars<'m>>>>>>>>;

/// Owns a `BibleInfo`/`BookMatcher`/`Formatter` triple and exposes the
/// library's entry points: locating references in text, building value
/// objects directly, and formatting them back to strings.
pub struct BibleModel {
    info: BibleInfo,
    matcher: BookMatcher,
    formatter: Formatter,
}

impl BibleModel {
    pub fn new(info: BibleInfo, matcher: BookMatcher, formatter: Formatter) -> Self {
        Self { info, matcher, formatter }
    }

    /// The bundled standard 66-book Protestant canon, built once and shared.
    pub fn standard() -> &'static Self {
        &STANDARD_MODEL
    }

    /// Builds a model for a caller-supplied canon: cardinality data plus a
    /// book metadata file (one line per book: title, then aliases).
    pub fn from_book_data<'a>(info: BibleInfo, lines: impl Iterator<Item = &'a str>) -> Result<Self> {
        let (matcher, titles) = BookMatcher::from_lines(lines)?;
        if titles.len() != info.book_count() {
            return Err(BibleRefError::BookData(format!(
                "book data file names {} books but cardinality table has {}",
                titles.len(),
                info.book_count()
            )));
        }
        let formatter = Formatter::new(titles);
        Ok(Self { info, matcher, formatter })
    }

    pub fn info(&self) -> &BibleInfo {
        &self.info
    }

    pub fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    fn pipeline<'m>(&'m self, s: &'m str) -> Pipeline<'m> {
        let tokens = WhitespaceFilter::new(Tokenizer::new(s.chars()));
        let books = BookFilter::new(tokens, &self.matcher);
        let verses = PVerseFilter::new(books);
        let spans = PVerseSpanFilter::new(verses);
        let passages = PPassageFilter::new(spans);
        PPassageRectifier::new(passages, &self.info)
    }

    fn passage_from_token(&self, token: &Token) -> Result<Passage<'_>> {
        let raw = token.payload.as_passage().expect("rectifier only emits PASSAGE tokens downstream");
        let spans = raw
            .spans
            .iter()
            .map(|s| {
                let first = Verse::from_full(&self.info, full_verse_of(&s.first));
                let last = Verse::from_full(&self.info, full_verse_of(&s.last));
                VerseSpan::new(first, last)
            })
            .collect::<Result<Vec<_>>>()?;
        Passage::new(spans)
    }

    /// The fully rectified token stream over `s`: prose tokens interleaved
    /// with `PASSAGE` tokens. Lets a caller see what lies between passages
    /// as well as the passages themselves.
    pub fn tokens<'m>(&'m self, s: &'m str) -> impl Iterator<Item = Result<Token>> + 'm {
        self.pipeline(s)
    }

    /// Finds every passage in `s`, ignoring surrounding prose.
    pub fn search<'m>(&'m self, s: &'m str) -> impl Iterator<Item = Result<Passage<'m>>> + 'm {
        self.pipeline(s).filter_map(move |r| match r {
            Ok(t) if t.kind == TokenKind::Passage => Some(self.passage_from_token(&t)),
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        })
    }

    /// Parses `s` as exactly one passage, failing if it contains zero
    /// passages or any leftover non-passage content.
    pub fn parse_passage(&self, s: &str) -> Result<Passage<'_>> {
        let mut found: Option<Passage<'_>> = None;
        for result in self.pipeline(s) {
            let token = result?;
            match token.kind {
                TokenKind::Passage => {
                    if found.is_some() {
                        return Err(BibleRefError::Parse(format!("more than one passage found in '{}'", s)));
                    }
                    found = Some(self.passage_from_token(&token)?);
                }
                TokenKind::Whitespace => {}
                _ => {
                    return Err(BibleRefError::Parse(format!(
                        "unexpected trailing content '{}' while parsing '{}'",
                        token.value(),
                        s
                    )))
                }
            }
        }
        found.ok_or_else(|| BibleRefError::Parse(format!("no passage found in '{}'", s)))
    }

    /// Builds a passage directly from already-known spans, fusing them the
    /// same way the rectifier would.
    pub fn passage_spans<'a>(&self, spans: Vec<VerseSpan<'a>>) -> Result<Passage<'a>> {
        Passage::new(fuse_spans(&self.info, spans))
    }

    /// Parses `s`, requiring it to contain exactly one span.
    pub fn span_str(&self, s: &str) -> Result<VerseSpan<'_>> {
        let passage = self.parse_passage(s)?;
        let mut spans = passage.spans;
        if spans.len() != 1 {
            return Err(BibleRefError::Type(format!("'{}' does not resolve to a single span", s)));
        }
        Ok(spans.remove(0))
    }

    pub fn span<'a>(&self, first: Verse<'a>, last: Verse<'a>) -> Result<VerseSpan<'a>> {
        VerseSpan::new(first, last)
    }

    /// Parses `s`, requiring it to resolve to exactly one verse.
    pub fn verse_str(&self, s: &str) -> Result<Verse<'_>> {
        let span = self.span_str(s)?;
        if span.first() != span.last() {
            return Err(BibleRefError::Type(format!("'{}' does not resolve to a single verse", s)));
        }
        Ok(span.first())
    }

    pub fn verse(&self, book: usize, chapter: u32, verse: u32) -> Result<Verse<'_>> {
        Verse::new(&self.info, book, chapter, verse)
    }

    /// Resolves `book_name` via the model's `BookMatcher` before validating.
    pub fn verse_named(&self, book_name: &str, chapter: u32, verse: u32) -> Result<Verse<'_>> {
        let book = self
            .matcher
            .lookup(book_name)
            .ok_or_else(|| BibleRefError::Type(format!("unrecognized book name '{}'", book_name)))?;
        Verse::new(&self.info, book, chapter, verse)
    }

    /// The full span of an entire book.
    pub fn book(&self, book: usize) -> Result<VerseSpan<'_>> {
        let chapters = self
            .info
            .chapter_count(book)
            .ok_or_else(|| BibleRefError::Range(format!("book index {} out of range", book)))?;
        let last_verse = self.info.verse_count(book, chapters).unwrap();
        let first = Verse::new(&self.info, book, 1, 1)?;
        let last = Verse::new(&self.info, book, chapters as u32, last_verse)?;
        VerseSpan::new(first, last)
    }

    /// The full span of a single chapter.
    pub fn chapter(&self, book: usize, chapter: u32) -> Result<VerseSpan<'_>> {
        let last_verse = self
            .info
            .verse_count(book, chapter as usize)
            .ok_or_else(|| BibleRefError::Range(format!("book {} chapter {} out of range", book, chapter)))?;
        let first = Verse::new(&self.info, book, chapter, 1)?;
        let last = Verse::new(&self.info, book, chapter, last_verse)?;
        VerseSpan::new(first, last)
    }
}

/// Lifts a post-rectification `PVerse` (chapter/verse guaranteed present)
/// into a `FullVerse`.
fn full_verse_of(v: &PVerse) -> FullVerse {
    FullVerse {
        book: v.book,
        chapter: v.chapter.expect("rectified verse always has a chapter"),
        verse: v.verse.expect("rectified verse always has a verse"),
    }
}

fn fuse_spans<'m>(info: &BibleInfo, mut spans: Vec<VerseSpan<'m>>) -> Vec<VerseSpan<'m>> {
    spans.sort_by_key(|s| {
        info.ordinal(s.first().book(), s.first().chapter() as usize, s.first().verse() as usize)
            .unwrap_or(0)
    });

    let mut fused: Vec<VerseSpan<'m>> = Vec::with_capacity(spans.len());
    for span in spans {
        let contiguous = fused.last().map_or(false, |last: &VerseSpan<'m>| {
            let last_ord = info
                .ordinal(last.last().book(), last.last().chapter() as usize, last.last().verse() as usize)
                .unwrap();
            let span_first_ord = info
                .ordinal(span.first().book(), span.first().chapter() as usize, span.first().verse() as usize)
                .unwrap();
            if last_ord >= span_first_ord {
                return true;
            }
            match info.next_verse(last.last().book(), last.last().chapter() as usize, last.last().verse() as usize) {
                Some((b, c, v)) => info.ordinal(b, c, v).map_or(false, |o| o >= span_first_ord),
                None => false,
            }
        });

        if contiguous {
            let last = fused.last_mut().unwrap();
            if span.last() > last.last() {
                *last = VerseSpan::new(last.first(), span.last()).expect("fusing valid spans stays valid");
            }
        } else {
            fused.push(span);
        }
    }
    fused
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_model() -> BibleModel {
        let info = BibleInfo::new(vec![
            ("One".into(), vec![1]),
            ("Two".into(), vec![1, 2]),
            ("Three".into(), vec![1, 2, 3]),
            ("Four".into(), vec![1, 2, 3, 4]),
            ("Five".into(), vec![1, 2, 3, 4, 5]),
            ("Six".into(), vec![1, 2, 3, 4, 5, 6]),
        ])
        .unwrap();
        let matcher = BookMatcher::new(&[
            ("One", &[]),
            ("Two", &[]),
            ("Three", &[]),
            ("Four", &[]),
            ("Five", &[]),
            ("Six", &[]),
        ])
        .unwrap();
        let formatter = Formatter::from_info(&info);
        BibleModel::new(info, matcher, formatter)
    }

    #[test]
    fn parse_passage_single_reference() {
        let model = BibleModel::standard();
        let passage = model.parse_passage("Genesis 4:12").unwrap();
        assert_eq!(passage.spans().len(), 1);
        assert_eq!(passage.spans()[0].first(), passage.spans()[0].last());
    }

    #[test]
    fn parse_passage_rejects_trailing_content() {
        let model = BibleModel::standard();
        assert!(model.parse_passage("Genesis 4:12 and more").is_err());
    }

    #[test]
    fn search_finds_two_passages_with_swap_and_clamp() {
        let model = BibleModel::standard();
        let input = "Glory, I'm back home Genesis 16:32 - Genesis 3\n in Exodus 1:10 - Exodus 1:5 Canada";
        let found: Vec<_> = model.search(input).collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(found.len(), 2);

        let first = &found[0];
        assert_eq!(first.spans().len(), 1);
        assert_eq!(first.spans()[0].first(), model.verse(0, 3, 1).unwrap());
        assert_eq!(first.spans()[0].last(), model.verse(0, 16, 16).unwrap());

        let second = &found[1];
        assert_eq!(second.spans()[0].first(), model.verse(1, 1, 5).unwrap());
        assert_eq!(second.spans()[0].last(), model.verse(1, 1, 10).unwrap());
    }

    #[test]
    fn toy_bible_fuses_adjacent_books() {
        let model = toy_model();
        let passage = model.parse_passage("One - Three, Four - Six").unwrap();
        assert_eq!(passage.spans().len(), 1);
        assert_eq!(passage.spans()[0].first(), model.verse(0, 1, 1).unwrap());
        assert_eq!(passage.spans()[0].last(), model.verse(5, 6, 6).unwrap());
    }

    #[test]
    fn toy_bible_clamps_out_of_range_verse() {
        let model = toy_model();
        let span = model.span_str("one 1:1-10").unwrap();
        assert_eq!(span.first(), model.verse(0, 1, 1).unwrap());
        assert_eq!(span.last(), model.verse(0, 1, 1).unwrap());
    }

    #[test]
    fn standard_model_formats_fused_consecutive_verses() {
        let model = BibleModel::standard();
        let passage = model.parse_passage("John 3:16, 17, 18, 19, 20").unwrap();
        assert_eq!(model.formatter().format_passage(&passage), "John 3:16 - 20");
    }

    #[test]
    fn book_and_chapter_constructors() {
        let model = toy_model();
        let book_span = model.book(5).unwrap();
        assert_eq!(book_span.first(), model.verse(5, 1, 1).unwrap());
        assert_eq!(book_span.last(), model.verse(5, 6, 6).unwrap());

        let chapter_span = model.chapter(5, 3).unwrap();
        assert_eq!(chapter_span.first(), model.verse(5, 3, 1).unwrap());
        assert_eq!(chapter_span.last(), model.verse(5, 3, 3).unwrap());
    }
}
