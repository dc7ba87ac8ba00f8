use crate::book::BibleInfo;
use crate::error::{BibleRefError, Result};
use crate::passage_filter::PPassage;
use crate::pverse::{PVerse, SeededIterator};
use crate::span_filter::PVerseSpan;
use crate::token::{Payload, Token, TokenKind};
use std::cmp::Ordering;

/// A fully specified, in-range verse: `(book, chapter, verse)`, all required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FullVerse {
    pub book: usize,
    pub chapter: u32,
    pub verse: u32,
}

/// A fully specified, in-range span: `first <= last`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RectifiedSpan {
    pub first: FullVerse,
    pub last: FullVerse,
}

/// A rectified passage: sorted, non-overlapping, non-adjacent spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RectifiedPassage {
    pub spans: Vec<RectifiedSpan>,
}

fn partial_cmp_verse(a: &PVerse, b: &PVerse) -> Ordering {
    a.book.cmp(&b.book).then_with(|| match (a.chapter, b.chapter) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| match (a.verse, b.verse) {
            (Some(p), Some(q)) => p.cmp(&q),
            _ => Ordering::Equal,
        }),
        _ => Ordering::Equal,
    })
}

fn clamp_chapter(info: &BibleInfo, book: usize, chapter: u32) -> Result<u32> {
    let count = info
        .chapter_count(book)
        .ok_or_else(|| BibleRefError::Range(format!("book index {} out of range", book)))?;
    Ok(chapter.max(1).min(count as u32))
}

fn clamp_verse(info: &BibleInfo, book: usize, chapter: u32, verse: u32) -> Result<u32> {
    let count = info
        .verse_count(book, chapter as usize)
        .ok_or_else(|| BibleRefError::Range(format!("book {} chapter {} out of range", book, chapter)))?;
    Ok(verse.max(1).min(count))
}

fn clamp_endpoint(info: &BibleInfo, v: PVerse) -> Result<PVerse> {
    let chapter = v.chapter.map(|c| clamp_chapter(info, v.book, c)).transpose()?;
    let verse = match (chapter, v.verse) {
        (Some(c), Some(verse)) => Some(clamp_verse(info, v.book, c, verse)?),
        _ => v.verse,
    };
    Ok(PVerse { book: v.book, chapter, verse })
}

fn fill_first(info: &BibleInfo, v: PVerse) -> Result<FullVerse> {
    let chapter = v.chapter.unwrap_or(1);
    let verse = v.verse.unwrap_or(1);
    let _ = info
        .verse_count(v.book, chapter as usize)
        .ok_or_else(|| BibleRefError::Range(format!("book {} chapter {} out of range", v.book, chapter)))?;
    Ok(FullVerse { book: v.book, chapter, verse })
}

fn fill_last(info: &BibleInfo, v: PVerse) -> Result<FullVerse> {
    let chapter = match v.chapter {
        Some(c) => c,
        None => info
            .chapter_count(v.book)
            .ok_or_else(|| BibleRefError::Range(format!("book index {} out of range", v.book)))? as u32,
    };
    let verse = match v.verse {
        Some(v) => v,
        None => info
            .verse_count(v.book, chapter as usize)
            .ok_or_else(|| BibleRefError::Range(format!("book {} chapter {} out of range", v.book, chapter)))?,
    };
    Ok(FullVerse { book: v.book, chapter, verse })
}

fn rectify_span(info: &BibleInfo, span: &PVerseSpan) -> Result<RectifiedSpan> {
    if !info.book_in_range(span.first.book) {
        return Err(BibleRefError::Range(format!("book index {} out of range", span.first.book)));
    }
    if !info.book_in_range(span.last.book) {
        return Err(BibleRefError::Range(format!("book index {} out of range", span.last.book)));
    }

    let first = clamp_endpoint(info, span.first)?;
    let last = clamp_endpoint(info, span.last)?;

    let (first, last) = if partial_cmp_verse(&first, &last) == Ordering::Greater {
        (last, first)
    } else {
        (first, last)
    };

    let first = fill_first(info, first)?;
    let last = fill_last(info, last)?;

    Ok(RectifiedSpan { first, last })
}

fn ordinal(info: &BibleInfo, v: FullVerse) -> u64 {
    info.ordinal(v.book, v.chapter as usize, v.verse as usize)
        .expect("rectified verse is always in range")
}

/// Sorts spans by first endpoint and merges any that overlap or are
/// immediately adjacent (via `next_verse`, so adjacency can cross a chapter
/// or book boundary). A single left-to-right sweep is enough: once sorted,
/// a fused span's `last` only grows, so it can only newly overlap spans
/// further to its right, all of which the sweep still visits.
fn fuse(info: &BibleInfo, mut spans: Vec<RectifiedSpan>) -> Vec<RectifiedSpan> {
    spans.sort_by_key(|s| ordinal(info, s.first));

    let mut fused: Vec<RectifiedSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        match fused.last_mut() {
            Some(last) if is_contiguous(info, last, &span) => {
                if ordinal(info, span.last) > ordinal(info, last.last) {
                    last.last = span.last;
                }
            }
            _ => fused.push(span),
        }
    }
    fused
}

fn is_contiguous(info: &BibleInfo, a: &RectifiedSpan, b: &RectifiedSpan) -> bool {
    let a_last = ordinal(info, a.last);
    let b_first = ordinal(info, b.first);
    if a_last >= b_first {
        return true;
    }
    match info.next_verse(a.last.book, a.last.chapter as usize, a.last.verse as usize) {
        Some((book, chapter, verse)) => {
            info.ordinal(book, chapter, verse).map_or(false, |o| o >= b_first)
        }
        None => false,
    }
}

fn rectify_passage(info: &BibleInfo, passage: &PPassage) -> Result<RectifiedPassage> {
    let spans = passage
        .spans
        .iter()
        .map(|s| rectify_span(info, s))
        .collect::<Result<Vec<_>>>()?;
    Ok(RectifiedPassage { spans: fuse(info, spans) })
}

/// Rectifies raw `PASSAGE` tokens: clamps each span's endpoints into range,
/// swaps reversed endpoints, fills absent chapter/verse, then sorts and
/// fuses the passage's spans.
pub struct PPassageRectifier<'m, I: SeededIterator> {
    inner: I,
    info: &'m BibleInfo,
}

impl<'m, I: SeededIterator> PPassageRectifier<'m, I> {
    pub fn new(inner: I, info: &'m BibleInfo) -> Self {
        Self { inner, info }
    }
}

impl<'m, I: SeededIterator> Iterator for PPassageRectifier<'m, I> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Result<Token>> {
        let token = self.inner.seeded_next(None)?;
        if token.kind != TokenKind::Passage {
            return Some(Ok(token));
        }

        let passage = token.payload.as_passage().unwrap();
        match rectify_passage(self.info, passage) {
            Ok(rectified) => Some(Ok(Token::new(
                TokenKind::Passage,
                Payload::Passage(to_ppassage(&rectified)),
                token.start,
                token.end,
                token.row,
                token.col,
            ))),
            Err(e) => Some(Err(e)),
        }
    }
}

fn to_ppassage(r: &RectifiedPassage) -> PPassage {
    PPassage {
        spans: r
            .spans
            .iter()
            .map(|s| PVerseSpan::new(full_to_pverse(s.first), full_to_pverse(s.last)))
            .collect(),
    }
}

fn full_to_pverse(v: FullVerse) -> PVerse {
    PVerse::new(v.book, Some(v.chapter), Some(v.verse))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_info() -> BibleInfo {
        BibleInfo::new(vec![
            ("One".into(), vec![1]),
            ("Two".into(), vec![1, 2]),
            ("Three".into(), vec![1, 2, 3]),
        ])
        .unwrap()
    }

    fn span(bf: usize, cf: Option<u32>, vf: Option<u32>, bl: usize, cl: Option<u32>, vl: Option<u32>) -> PVerseSpan {
        PVerseSpan::new(PVerse::new(bf, cf, vf), PVerse::new(bl, cl, vl))
    }

    #[test]
    fn clamps_out_of_range_chapter_and_verse() {
        let info = toy_info();
        let s = span(0, Some(1), Some(99), 0, Some(1), Some(99));
        let r = rectify_span(&info, &s).unwrap();
        assert_eq!(r.first.verse, 1);
        assert_eq!(r.last.verse, 1);
    }

    #[test]
    fn swaps_reversed_endpoints() {
        let info = toy_info();
        let s = span(2, Some(3), Some(1), 0, Some(1), Some(1));
        let r = rectify_span(&info, &s).unwrap();
        assert_eq!(r.first.book, 0);
        assert_eq!(r.last.book, 2);
    }

    #[test]
    fn fills_absent_components() {
        let info = toy_info();
        let s = span(1, None, None, 1, None, None);
        let r = rectify_span(&info, &s).unwrap();
        assert_eq!(r.first.chapter, 1);
        assert_eq!(r.first.verse, 1);
        assert_eq!(r.last.chapter, 2);
        assert_eq!(r.last.verse, 2);
    }

    #[test]
    fn fuses_adjacent_spans_across_books() {
        let info = toy_info();
        let passage = PPassage {
            spans: vec![span(0, None, None, 0, None, None), span(1, None, None, 2, None, None)],
        };
        let r = rectify_passage(&info, &passage).unwrap();
        assert_eq!(r.spans.len(), 1);
        assert_eq!(r.spans[0].first.book, 0);
        assert_eq!(r.spans[0].last.book, 2);
    }

    #[test]
    fn does_not_fuse_non_adjacent_spans() {
        let info = toy_info();
        let passage = PPassage {
            spans: vec![span(0, None, None, 0, None, None), span(2, Some(3), None, 2, Some(3), None)],
        };
        let r = rectify_passage(&info, &passage).unwrap();
        assert_eq!(r.spans.len(), 2);
    }

    #[test]
    fn rectification_is_idempotent() {
        let info = toy_info();
        let passage = PPassage {
            spans: vec![span(2, Some(1), Some(1), 2, Some(3), Some(1))],
        };
        let once = rectify_passage(&info, &passage).unwrap();
        let again_input = to_ppassage(&once);
        let twice = rectify_passage(&info, &again_input).unwrap();
        assert_eq!(once, twice);
    }
}
