use crate::book::BibleInfo;
use crate::value::{Passage, Verse, VerseSpan};
use std::fmt::Write as _;

/// Maps a book index to its display title, and renders verses, spans, and
/// passages in the canonical 7-case priority order.
pub struct Formatter {
    titles: Vec<String>,
}

impl Formatter {
    pub fn new(titles: Vec<String>) -> Self {
        Self { titles }
    }

    /// Builds a formatter using the `BibleInfo`'s own titles as display names.
    pub fn from_info(info: &BibleInfo) -> Self {
        let titles = (0..info.book_count()).map(|b| info.title(b).unwrap().to_string()).collect();
        Self::new(titles)
    }

    fn title(&self, book: usize) -> &str {
        self.titles.get(book).map(String::as_str).unwrap_or("?")
    }

    pub fn format_verse(&self, v: &Verse) -> String {
        format!("{} {}:{}", self.title(v.book()), v.chapter(), v.verse())
    }

    fn is_book_start(v: &Verse) -> bool {
        v.chapter() == 1 && v.verse() == 1
    }

    fn is_book_end(v: &Verse) -> bool {
        let info = v.info;
        let last_chapter = info.chapter_count(v.book()).unwrap() as u32;
        v.chapter() == last_chapter && v.verse() == info.verse_count(v.book(), last_chapter as usize).unwrap()
    }

    fn is_whole_chapter(v_first: &Verse, v_last: &Verse) -> bool {
        let info = v_first.info;
        v_first.verse() == 1 && v_last.verse() == info.verse_count(v_first.book(), v_first.chapter() as usize).unwrap()
    }

    pub fn format_span(&self, span: &VerseSpan) -> String {
        let first = span.first();
        let last = span.last();

        if first == last {
            return self.format_verse(&first);
        }

        if first.book() == last.book() {
            if Self::is_book_start(&first) && Self::is_book_end(&last) {
                return self.title(first.book()).to_string();
            }
            if first.chapter() == last.chapter() {
                if Self::is_whole_chapter(&first, &last) {
                    return format!("{} {}", self.title(first.book()), first.chapter());
                }
                return format!("{} {}:{} - {}", self.title(first.book()), first.chapter(), first.verse(), last.verse());
            }
            return format!(
                "{} {}:{} - {}:{}",
                self.title(first.book()),
                first.chapter(),
                first.verse(),
                last.chapter(),
                last.verse()
            );
        }

        if Self::is_book_start(&first) && Self::is_book_end(&last) {
            return format!("{} - {}", self.title(first.book()), self.title(last.book()));
        }

        format!(
            "{} {}:{} - {} {}:{}",
            self.title(first.book()),
            first.chapter(),
            first.verse(),
            self.title(last.book()),
            last.chapter(),
            last.verse()
        )
    }

    pub fn format_passage(&self, passage: &Passage) -> String {
        let mut out = String::new();
        for (i, span) in passage.spans().iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "{}", self.format_span(span));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::VerseSpan;

    fn toy_info() -> BibleInfo {
        BibleInfo::new(vec![("One".into(), vec![3, 4]), ("Two".into(), vec![2])]).unwrap()
    }

    #[test]
    fn whole_book_formats_as_title_only() {
        let info = toy_info();
        let fmt = Formatter::from_info(&info);
        let first = Verse::new(&info, 0, 1, 1).unwrap();
        let last = Verse::new(&info, 0, 2, 4).unwrap();
        let span = VerseSpan::new(first, last).unwrap();
        assert_eq!(fmt.format_span(&span), "One");
    }

    #[test]
    fn single_verse_formats_book_chapter_colon_verse() {
        let info = toy_info();
        let fmt = Formatter::from_info(&info);
        let v = Verse::new(&info, 0, 2, 3).unwrap();
        let span = VerseSpan::new(v, v).unwrap();
        assert_eq!(fmt.format_span(&span), "One 2:3");
    }

    #[test]
    fn whole_chapter_formats_without_verses() {
        let info = toy_info();
        let fmt = Formatter::from_info(&info);
        let first = Verse::new(&info, 0, 2, 1).unwrap();
        let last = Verse::new(&info, 0, 2, 4).unwrap();
        let span = VerseSpan::new(first, last).unwrap();
        assert_eq!(fmt.format_span(&span), "One 2");
    }

    #[test]
    fn same_chapter_range_formats_verse_dash_verse() {
        let info = toy_info();
        let fmt = Formatter::from_info(&info);
        let first = Verse::new(&info, 0, 1, 1).unwrap();
        let last = Verse::new(&info, 0, 1, 2).unwrap();
        let span = VerseSpan::new(first, last).unwrap();
        assert_eq!(fmt.format_span(&span), "One 1:1 - 2");
    }

    #[test]
    fn cross_chapter_same_book() {
        let info = toy_info();
        let fmt = Formatter::from_info(&info);
        let first = Verse::new(&info, 0, 1, 2).unwrap();
        let last = Verse::new(&info, 0, 2, 1).unwrap();
        let span = VerseSpan::new(first, last).unwrap();
        assert_eq!(fmt.format_span(&span), "One 1:2 - 2:1");
    }

    #[test]
    fn cross_book_formats_full_references_on_both_sides() {
        let info = toy_info();
        let fmt = Formatter::from_info(&info);
        let first = Verse::new(&info, 0, 2, 4).unwrap();
        let last = Verse::new(&info, 1, 1, 1).unwrap();
        let span = VerseSpan::new(first, last).unwrap();
        assert_eq!(fmt.format_span(&span), "One 2:4 - Two 1:1");
    }

    #[test]
    fn cross_book_whole_books_formats_book_dash_book() {
        let info = toy_info();
        let fmt = Formatter::from_info(&info);
        let first = Verse::new(&info, 0, 1, 1).unwrap();
        let last = Verse::new(&info, 1, 1, 2).unwrap();
        let span = VerseSpan::new(first, last).unwrap();
        assert_eq!(fmt.format_span(&span), "One - Two");
    }
}
