use crate::book::BibleInfo;
use crate::error::{BibleRefError, Result};
use crate::rectifier::{FullVerse, RectifiedSpan};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// A single verse, validated against its owning model at construction.
/// Immutable once built; borrows the model it was built against.
#[derive(Clone, Copy, Serialize)]
pub struct Verse<'m> {
    pub(crate) book: usize,
    pub(crate) chapter: u32,
    pub(crate) verse: u32,
    #[serde(skip)]
    pub(crate) info: &'m BibleInfo,
}

impl<'m> Verse<'m> {
    pub(crate) fn new(info: &'m BibleInfo, book: usize, chapter: u32, verse: u32) -> Result<Self> {
        let count = info
            .verse_count(book, chapter as usize)
            .ok_or_else(|| BibleRefError::Range(format!("{}:{} is out of range for book {}", chapter, verse, book)))?;
        if verse == 0 || verse > count {
            return Err(BibleRefError::Range(format!(
                "verse {} out of range in book {} chapter {} (max {})",
                verse, book, chapter, count
            )));
        }
        Ok(Self { book, chapter, verse, info })
    }

    pub(crate) fn from_full(info: &'m BibleInfo, v: FullVerse) -> Self {
        Self { book: v.book, chapter: v.chapter, verse: v.verse, info }
    }

    pub fn book(&self) -> usize {
        self.book
    }

    pub fn chapter(&self) -> u32 {
        self.chapter
    }

    pub fn verse(&self) -> u32 {
        self.verse
    }

    fn ordinal(&self) -> u64 {
        self.info
            .ordinal(self.book, self.chapter as usize, self.verse as usize)
            .expect("validated verse is always in range")
    }

    /// The verse immediately following this one, or `None` past the last
    /// verse of the last book.
    pub fn next(&self) -> Option<Self> {
        let (book, chapter, verse) = self.info.next_verse(self.book, self.chapter as usize, self.verse as usize)?;
        Some(Self { book, chapter: chapter as u32, verse: verse as u32, info: self.info })
    }
}

impl<'m> PartialEq for Verse<'m> {
    fn eq(&self, other: &Self) -> bool {
        self.book == other.book && self.chapter == other.chapter && self.verse == other.verse
    }
}
impl<'m> Eq for Verse<'m> {}

impl<'m> PartialOrd for Verse<'m> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl<'m> Ord for Verse<'m> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.book, self.chapter, self.verse).cmp(&(other.book, other.chapter, other.verse))
    }
}

/// An inclusive range of verses, validated and ordered (`first <= last`).
#[derive(Clone, Copy)]
pub struct VerseSpan<'m> {
    pub(crate) first: Verse<'m>,
    pub(crate) last: Verse<'m>,
}

impl<'m> VerseSpan<'m> {
    pub(crate) fn new(first: Verse<'m>, last: Verse<'m>) -> Result<Self> {
        if first > last {
            return Err(BibleRefError::Range(
                "span first endpoint must not be after last endpoint".to_string(),
            ));
        }
        Ok(Self { first, last })
    }

    pub(crate) fn from_rectified(info: &'m BibleInfo, r: &RectifiedSpan) -> Self {
        Self {
            first: Verse::from_full(info, r.first),
            last: Verse::from_full(info, r.last),
        }
    }

    pub fn first(&self) -> Verse<'m> {
        self.first
    }

    pub fn last(&self) -> Verse<'m> {
        self.last
    }

    /// Number of verses the span spans, computed in closed form from the
    /// endpoints' global ordinals rather than by walking every verse.
    pub fn len(&self) -> u64 {
        self.last.ordinal() - self.first.ordinal() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> VerseSpanIter<'m> {
        VerseSpanIter { next: Some(self.first), last: self.last }
    }
}

impl<'m> PartialEq for VerseSpan<'m> {
    fn eq(&self, other: &Self) -> bool {
        self.first == other.first && self.last == other.last
    }
}
impl<'m> Eq for VerseSpan<'m> {}

/// Iterates a `VerseSpan` one verse at a time via `Verse::next`.
pub struct VerseSpanIter<'m> {
    next: Option<Verse<'m>>,
    last: Verse<'m>,
}

impl<'m> Iterator for VerseSpanIter<'m> {
    type Item = Verse<'m>;

    fn next(&mut self) -> Option<Verse<'m>> {
        let current = self.next?;
        self.next = if current == self.last { None } else { current.next() };
        Some(current)
    }
}

impl<'m> IntoIterator for VerseSpan<'m> {
    type Item = Verse<'m>;
    type IntoIter = VerseSpanIter<'m>;

    fn into_iter(self) -> VerseSpanIter<'m> {
        self.iter()
    }
}

/// An ordered, non-overlapping, non-adjacent sequence of verse spans.
#[derive(Debug, Clone)]
pub struct Passage<'m> {
    pub(crate) spans: Vec<VerseSpan<'m>>,
}

impl<'m> Passage<'m> {
    pub(crate) fn new(spans: Vec<VerseSpan<'m>>) -> Result<Self> {
        if spans.is_empty() {
            return Err(BibleRefError::Parse("a passage needs at least one span".to_string()));
        }
        Ok(Self { spans })
    }

    pub fn spans(&self) -> &[VerseSpan<'m>] {
        &self.spans
    }

    /// Total number of verses covered by this passage's spans.
    pub fn len(&self) -> u64 {
        self.spans.iter().map(VerseSpan::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = Verse<'m>> + '_ {
        self.spans.iter().flat_map(VerseSpan::iter)
    }
}

impl<'m> PartialEq for Passage<'m> {
    fn eq(&self, other: &Self) -> bool {
        self.spans == other.spans
    }
}

/// Containment test between value types. Several `impl` blocks stand in for
/// the overload set Rust can't express directly (`issuperset(Verse)`,
/// `issuperset(VerseSpan)`, etc.).
pub trait Contains<T> {
    fn contains(&self, other: &T) -> bool;
}

impl<'m> Contains<Verse<'m>> for VerseSpan<'m> {
    fn contains(&self, other: &Verse<'m>) -> bool {
        self.first <= *other && *other <= self.last
    }
}

impl<'m> Contains<VerseSpan<'m>> for VerseSpan<'m> {
    fn contains(&self, other: &VerseSpan<'m>) -> bool {
        self.first <= other.first && other.last <= self.last
    }
}

impl<'m> Contains<Verse<'m>> for Passage<'m> {
    fn contains(&self, other: &Verse<'m>) -> bool {
        self.spans.iter().any(|s| s.contains(other))
    }
}

/// A `Passage` contains a `VerseSpan` only when a *single* span of the
/// receiver covers it; coverage that straddles two of the receiver's own
/// spans does not count. Callers who need true set coverage should fuse
/// their spans into a passage first.
impl<'m> Contains<VerseSpan<'m>> for Passage<'m> {
    fn contains(&self, other: &VerseSpan<'m>) -> bool {
        self.spans.iter().any(|s| s.contains(other))
    }
}

impl<'m> Contains<Passage<'m>> for Passage<'m> {
    fn contains(&self, other: &Passage<'m>) -> bool {
        other.spans.iter().all(|s| self.contains(s))
    }
}

impl<'m> fmt::Debug for Verse<'m> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Verse({}, {}, {})", self.book, self.chapter, self.verse)
    }
}

impl<'m> fmt::Debug for VerseSpan<'m> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VerseSpan({:?} .. {:?})", self.first, self.last)
    }
}
