//! Recognizes, normalizes, and manipulates scripture references inside
//! free-form text.
//!
//! Given input like `"Glory, I'm back home Genesis 16:32 - Genesis 3\nin
//! Exodus 1:10 - Exodus 1:5 Canada"`, [`BibleModel::search`] locates each
//! reference, repairs it (swapping reversed endpoints, clamping
//! out-of-range chapters and verses, fusing overlapping or adjacent
//! ranges), and yields canonical [`Passage`]s whose spans are ordered,
//! non-overlapping, and non-empty.
//!
//! A [`BibleModel`] owns the cardinality table ([`BibleInfo`]) and the
//! book-name lookup ([`BookMatcher`]) a canon is built from. The bundled
//! [`BibleModel::standard`] covers the 66-book Protestant canon; callers
//! with a different canon (another translation's book list, a
//! deuterocanon, a non-English alias set) build their own from a
//! [`BibleInfo`] and a book metadata file via [`BibleModel::from_book_data`].
//!
//! ```
//! use versetrace::BibleModel;
//!
//! let model = BibleModel::standard();
//! let passage = model.parse_passage("Genesis 4:12").unwrap();
//! assert_eq!(model.formatter().format_passage(&passage), "Genesis 4:12");
//!
//! let input = "Glory, I'm back home Genesis 16:32 - Genesis 3\n\
//!              in Exodus 1:10 - Exodus 1:5 Canada";
//! let found: Vec<_> = model.search(input).collect::<Result<_, _>>().unwrap();
//! assert_eq!(found.len(), 2);
//! assert_eq!(model.formatter().format_passage(&found[0]), "Genesis 3:1 - 16:16");
//! ```

mod book;
mod error;
mod format;
mod model;
mod passage_filter;
mod pverse;
mod rectifier;
mod span_filter;
mod standard_data;
mod token;
mod tokenizer;
mod value;

pub use self::book::{BibleInfo, BookMatcher};
pub use self::error::{BibleRefError, Result};
pub use self::format::Formatter;
pub use self::model::BibleModel;
pub use self::passage_filter::PPassage;
pub use self::pverse::PVerse;
pub use self::span_filter::PVerseSpan;
pub use self::token::{Payload, Token, TokenKind};
pub use self::value::{Contains, Passage, Verse, VerseSpan, VerseSpanIter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toy_bible_fuses_adjacent_books_end_to_end() {
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
        let model = BibleModel::new(info, matcher, formatter);

        let passage = model.parse_passage("one - three, four - six").unwrap();
        assert_eq!(model.formatter().format_passage(&passage), "One - Six");
    }

    #[test]
    fn exodus_genesis_reorders_and_fuses_over_standard_canon() {
        let model = BibleModel::standard();
        let passage = model.parse_passage("Exodus, Genesis").unwrap();
        assert_eq!(model.formatter().format_passage(&passage), "Genesis - Exodus");
    }

    #[test]
    fn unrecognized_text_fails_to_match() {
        let model = BibleModel::standard();
        assert!(model.parse_passage("flugelhorn").is_err());
        assert!(model.parse_passage("").is_err());
    }

    #[test]
    fn verse_iteration_matches_len_and_is_strictly_ascending() {
        let model = BibleModel::standard();
        let span = model.span_str("John 3:16-18").unwrap();
        let verses: Vec<_> = span.iter().collect();
        assert_eq!(verses.len() as u64, span.len());
        for w in verses.windows(2) {
            assert!(w[0] < w[1]);
            assert!(span.contains(&w[0]));
        }
    }

    #[test]
    fn formatting_round_trips_through_parsing() {
        let model = BibleModel::standard();
        let passage = model.parse_passage("John 3:16, 17, 18, 19, 20").unwrap();
        let formatted = model.formatter().format_passage(&passage);
        assert_eq!(formatted, "John 3:16 - 20");
        let reparsed = model.parse_passage(&formatted).unwrap();
        assert_eq!(reparsed, passage);
    }
}
