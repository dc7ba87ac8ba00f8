use crate::error::{BibleRefError, Result};
use crate::standard_data::STANDARD_BOOKS;
use crate::token::{Payload, Token, TokenKind};
use std::collections::HashMap;

/// A book's canonical title, its recognized lookup aliases, and its
/// chapter/verse cardinality, as loaded from a book metadata file or the
/// bundled standard table.
pub struct BookDef {
    pub title: &'static str,
    pub aliases: &'static [&'static str],
    pub chapters: &'static [u16],
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect::<String>()
        .trim()
        .to_string()
}

/// Immutable cardinality table: how many chapters a book has, and how many
/// verses each chapter has. Backed by cumulative prefix sums computed once
/// at construction so verse ordinals, span lengths, and successor lookups
/// are all O(1)/O(log n) rather than re-walking the table.
pub struct BibleInfo {
    titles: Vec<String>,
    chapters: Vec<Vec<u32>>,
    // chapter_prefix[b][c] = verses in book b before chapter c (0-based chapter index).
    chapter_prefix: Vec<Vec<u64>>,
    // book_prefix[b] = verses in the whole bible before book b.
    book_prefix: Vec<u64>,
}

impl BibleInfo {
    /// Builds a table from per-book (title, chapter verse-counts) pairs.
    ///
    /// # Errors
    /// Returns `BibleRefError::BookData` if any book has zero chapters or a
    /// chapter with zero verses.
    pub fn new(books: Vec<(String, Vec<u32>)>) -> Result<Self> {
        let mut titles = Vec::with_capacity(books.len());
        let mut chapters = Vec::with_capacity(books.len());
        let mut chapter_prefix = Vec::with_capacity(books.len());
        let mut book_prefix = Vec::with_capacity(books.len() + 1);
        let mut running = 0u64;

        for (title, counts) in books {
            if counts.is_empty() || counts.iter().any(|&c| c == 0) {
                return Err(BibleRefError::BookData(format!(
                    "book '{}' has an empty or zero-verse chapter",
                    title
                )));
            }
            book_prefix.push(running);
            let mut prefix = Vec::with_capacity(counts.len() + 1);
            let mut chap_running = 0u64;
            for &count in &counts {
                prefix.push(chap_running);
                chap_running += u64::from(count);
            }
            prefix.push(chap_running);
            running += chap_running;

            titles.push(title);
            chapter_prefix.push(prefix);
            chapters.push(counts);
        }

        Ok(Self {
            titles,
            chapters,
            chapter_prefix,
            book_prefix,
        })
    }

    /// Builds the standard 66-book Protestant canon.
    pub fn standard() -> Self {
        let books = STANDARD_BOOKS
            .iter()
            .map(|b| (b.title.to_string(), b.chapters.iter().map(|&c| u32::from(c)).collect()))
            .collect();
        Self::new(books).expect("bundled standard table is well-formed")
    }

    pub fn book_count(&self) -> usize {
        self.titles.len()
    }

    pub fn title(&self, book: usize) -> Option<&str> {
        self.titles.get(book).map(String::as_str)
    }

    pub fn chapter_count(&self, book: usize) -> Option<usize> {
        self.chapters.get(book).map(Vec::len)
    }

    pub fn verse_count(&self, book: usize, chapter: usize) -> Option<u32> {
        self.chapters.get(book)?.get(chapter.checked_sub(1)?).copied()
    }

    pub fn book_in_range(&self, book: usize) -> bool {
        book < self.titles.len()
    }

    /// Global ordinal of `(book, chapter, verse)`, 0-based, used for ordering
    /// and span-length computation. `chapter`/`verse` are 1-based.
    pub fn ordinal(&self, book: usize, chapter: usize, verse: usize) -> Option<u64> {
        let within_chapter = self.chapter_prefix.get(book)?.get(chapter.checked_sub(1)?)?;
        Some(self.book_prefix[book] + within_chapter + (verse as u64 - 1))
    }

    /// The verse immediately following `(book, chapter, verse)`, rolling over
    /// chapter and book boundaries. `None` past the last verse of the last book.
    pub fn next_verse(&self, book: usize, chapter: usize, verse: usize) -> Option<(usize, usize, usize)> {
        let verses_in_chapter = self.verse_count(book, chapter)?;
        if (verse as u32) < verses_in_chapter {
            return Some((book, chapter, verse + 1));
        }
        let chapters_in_book = self.chapter_count(book)?;
        if chapter < chapters_in_book {
            return Some((book, chapter + 1, 1));
        }
        if book + 1 < self.book_count() {
            return Some((book + 1, 1, 1));
        }
        None
    }
}

/// Normalized-string to book-index lookup.
///
/// Normalization strips whitespace, lowercases, and trims. Construction
/// fails if an alias is claimed by two different books.
pub struct BookMatcher {
    index: HashMap<String, usize>,
}

impl BookMatcher {
    /// # Errors
    /// Returns `BibleRefError::BookData` if the same normalized alias is
    /// registered for two distinct book indices.
    pub fn new(entries: &[(&str, &[&str])]) -> Result<Self> {
        let mut index = HashMap::new();
        for (book_idx, (title, aliases)) in entries.iter().enumerate() {
            let mut names = vec![*title];
            names.extend_from_slice(aliases);
            for name in names {
                let key = normalize(name);
                if key.is_empty() {
                    continue;
                }
                match index.get(&key) {
                    Some(&existing) if existing != book_idx => {
                        return Err(BibleRefError::BookData(format!(
                            "alias '{}' claimed by both book {} and book {}",
                            name, existing, book_idx
                        )));
                    }
                    _ => {
                        index.insert(key, book_idx);
                    }
                }
            }
        }
        Ok(Self { index })
    }

    /// Builds a matcher for the bundled standard 66-book canon.
    pub fn standard() -> Self {
        let entries: Vec<(&str, &[&str])> = STANDARD_BOOKS.iter().map(|b| (b.title, b.aliases)).collect();
        Self::new(&entries).expect("bundled standard table has no alias collisions")
    }

    /// Parses a book metadata file: one line per book, comma-separated
    /// title followed by aliases, in book order. Blank fields are ignored.
    /// Returns the matcher plus the canonical display title of each book,
    /// in file order, for callers that also want to build a `Formatter`.
    pub fn from_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Result<(Self, Vec<String>)> {
        let mut entries: Vec<(String, Vec<String>)> = Vec::new();
        for line in lines {
            let mut fields = line.split(',').map(str::trim).filter(|f| !f.is_empty());
            let title = fields
                .next()
                .ok_or_else(|| BibleRefError::BookData("empty line in book data".to_string()))?
                .to_string();
            let aliases = fields.map(str::to_string).collect();
            entries.push((title, aliases));
        }

        let mut index = HashMap::new();
        for (book_idx, (title, aliases)) in entries.iter().enumerate() {
            let mut names = vec![title.clone()];
            names.extend(aliases.iter().cloned());
            for name in names {
                let key = normalize(&name);
                if key.is_empty() {
                    continue;
                }
                match index.get(&key) {
                    Some(&existing) if existing != book_idx => {
                        return Err(BibleRefError::BookData(format!(
                            "alias '{}' claimed by both book {} and book {}",
                            name, existing, book_idx
                        )));
                    }
                    _ => {
                        index.insert(key, book_idx);
                    }
                }
            }
        }

        let titles = entries.into_iter().map(|(title, _)| title).collect();
        Ok((Self { index }, titles))
    }

    pub fn lookup(&self, candidate: &str) -> Option<usize> {
        self.index.get(&normalize(candidate)).copied()
    }
}

const LOOKAHEAD: usize = 10;

/// Recognizes book names in a token stream via greedy longest-match.
///
/// Refills a bounded buffer of up to `LOOKAHEAD` tokens, then tries joining
/// the first `k` tokens (longest `k` first) against `BookMatcher`. The
/// first successful join is emitted as a single `BOOK` token.
pub struct BookFilter<'m, I: Iterator<Item = Token>> {
    inner: I,
    matcher: &'m BookMatcher,
    buf: Vec<Token>,
    done: bool,
}

impl<'m, I: Iterator<Item = Token>> BookFilter<'m, I> {
    pub fn new(inner: I, matcher: &'m BookMatcher) -> Self {
        Self {
            inner,
            matcher,
            buf: Vec::with_capacity(LOOKAHEAD),
            done: false,
        }
    }

    fn refill(&mut self) {
        while !self.done && self.buf.len() < LOOKAHEAD {
            match self.inner.next() {
                Some(t) => self.buf.push(t),
                None => self.done = true,
            }
        }
    }
}

impl<'m, I: Iterator<Item = Token>> Iterator for BookFilter<'m, I> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.refill();
        if self.buf.is_empty() {
            return None;
        }

        for k in (1..=self.buf.len()).rev() {
            let candidate: String = self.buf[..k].iter().map(Token::value).collect::<Vec<_>>().join(" ");
            if let Some(book_idx) = self.matcher.lookup(&candidate) {
                let first = &self.buf[0];
                let last = &self.buf[k - 1];
                let token = Token::new(
                    TokenKind::Book,
                    Payload::BookIndex(book_idx),
                    first.start,
                    last.end,
                    first.row,
                    first.col,
                );
                self.buf.drain(..k);
                return Some(token);
            }
        }

        Some(self.buf.remove(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::{Tokenizer, WhitespaceFilter};

    fn toy_matcher() -> BookMatcher {
        BookMatcher::new(&[
            ("One", &["1"]),
            ("Two", &[]),
            ("First Samuel", &["1 sam", "1sam"]),
        ])
        .unwrap()
    }

    fn filter_tokens(s: &str, matcher: &BookMatcher) -> Vec<Token> {
        let tokens = WhitespaceFilter::new(Tokenizer::new(s.chars()));
        BookFilter::new(tokens, matcher).collect()
    }

    #[test]
    fn single_word_book_matches() {
        let matcher = toy_matcher();
        let tokens = filter_tokens("Two 3", &matcher);
        assert_eq!(tokens[0].kind, TokenKind::Book);
        assert_eq!(tokens[0].payload.as_book_index(), Some(1));
    }

    #[test]
    fn longest_match_wins_over_shorter_alias() {
        let matcher = toy_matcher();
        let tokens = filter_tokens("1 Sam 3:16", &matcher);
        assert_eq!(tokens[0].kind, TokenKind::Book);
        assert_eq!(tokens[0].payload.as_book_index(), Some(2));
    }

    #[test]
    fn unknown_word_passes_through() {
        let matcher = toy_matcher();
        let tokens = filter_tokens("flugelhorn", &matcher);
        assert_eq!(tokens[0].kind, TokenKind::Word);
    }

    #[test]
    fn standard_table_has_66_books() {
        let info = BibleInfo::standard();
        assert_eq!(info.book_count(), 66);
        let matcher = BookMatcher::standard();
        assert_eq!(matcher.lookup("genesis"), Some(0));
        assert_eq!(matcher.lookup("Gen"), Some(0));
        assert_eq!(matcher.lookup("revelation"), Some(65));
    }

    #[test]
    fn ordinal_and_next_verse_cross_book() {
        let info = BibleInfo::standard();
        let last_genesis = info.chapter_count(0).unwrap();
        let last_verse = info.verse_count(0, last_genesis).unwrap();
        let next = info.next_verse(0, last_genesis, last_verse as usize);
        assert_eq!(next, Some((1, 1, 1)));
    }

    #[test]
    fn duplicate_alias_across_books_fails() {
        let result = BookMatcher::new(&[("One", &["dup"]), ("Two", &["dup"])]);
        assert!(result.is_err());
    }
}
