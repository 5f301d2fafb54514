//! Timed lyrics document model
//!
//! An already-parsed, hierarchical, time-tagged document handed to the
//! engine once per song. The tree is read-only from the engine's point of
//! view except for the animator stores it attaches lazily; those are
//! explicit optional fields created through factories on first encounter,
//! and dropped wholesale with the document on song change.
//!
//! Invariants:
//! - within a track, entity time ranges are sorted and disjoint;
//! - at any instant at most one entity per level is `Active`, found by the
//!   first match of an ordered scan;
//! - lifecycle state has no memory, so seeks need no reset; the spring and
//!   fill-trigger state attached here does, and is reset by replacing the
//!   document.

use anyhow::{Context, Result, ensure};

use crate::element::ElementId;
use crate::engine::dot::DotSprings;
use crate::engine::letter::LetterSprings;
use crate::engine::line::LineSprings;
use crate::engine::word::WordSprings;

/// Synchronization granularity of a document, selected once per song.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncKind {
    /// Hierarchical: lines contain timed words, optionally timed letters.
    Syllable,
    /// Flat: only line-level timing is available.
    Line,
}

/// A full lyrics document plus the optional credits footer element.
#[derive(Debug)]
pub struct LyricsDocument {
    pub kind: SyncKind,
    pub lines: Vec<Line>,
    /// Credits element activated once the final line has been sung.
    pub credits: Option<ElementId>,
}

impl LyricsDocument {
    pub fn syllable(lines: Vec<Line>) -> Self {
        Self {
            kind: SyncKind::Syllable,
            lines,
            credits: None,
        }
    }

    pub fn line(lines: Vec<Line>) -> Self {
        Self {
            kind: SyncKind::Line,
            lines,
            credits: None,
        }
    }

    pub fn with_credits(mut self, credits: ElementId) -> Self {
        self.credits = Some(credits);
        self
    }

    /// Strict structural validation for hosts that want to fail early.
    ///
    /// The frame driver itself tolerates malformed entities (logs and skips
    /// them); this is an opt-in check at the parse boundary.
    pub fn validate(&self) -> Result<()> {
        let mut prev_end: Option<f64> = None;
        for (index, line) in self.lines.iter().enumerate() {
            ensure!(
                line.start_ms < line.end_ms,
                "line {index} has an empty or inverted time range"
            );
            if let Some(prev) = prev_end {
                ensure!(
                    line.start_ms >= prev,
                    "line {index} overlaps the previous line"
                );
            }
            prev_end = Some(line.end_ms);

            for (word_index, word) in line.words.iter().enumerate() {
                word.validate()
                    .with_context(|| format!("line {index}, word {word_index}"))?;
            }
        }
        Ok(())
    }
}

/// One lyric line.
#[derive(Debug)]
pub struct Line {
    pub start_ms: f64,
    pub end_ms: f64,
    /// Instrumental marker row: `words` holds dots instead of sung tokens.
    pub dot_line: bool,
    pub words: Vec<Word>,
    pub element: ElementId,
    /// Flat-mode glow springs, attached on first active frame.
    pub(crate) springs: Option<LineSprings>,
}

impl Line {
    pub fn new(start_ms: f64, end_ms: f64, element: ElementId, words: Vec<Word>) -> Self {
        Self {
            start_ms,
            end_ms,
            dot_line: false,
            words,
            element,
            springs: None,
        }
    }

    pub fn dot_line(start_ms: f64, end_ms: f64, element: ElementId, dots: Vec<Word>) -> Self {
        Self {
            start_ms,
            end_ms,
            dot_line: true,
            words: dots,
            element,
            springs: None,
        }
    }
}

/// One timed token inside a line: a plain word, an instrumental dot, or a
/// letter group carrying per-letter timing.
#[derive(Debug)]
pub struct Word {
    pub start_ms: f64,
    pub end_ms: f64,
    /// Instrumental marker sharing the dot animator.
    pub dot: bool,
    /// Per-letter animation; the word's own fill/glow output is delegated
    /// to its letters, but group-level scale/offset still animate.
    pub letter_group: bool,
    pub letters: Vec<Letter>,
    /// Token duration in milliseconds, used by the reduced-mode letter
    /// strength selection.
    pub total_time_ms: f64,
    pub element: ElementId,
    pub(crate) springs: Option<WordSprings>,
    /// Dot-shaped words animate through their own four-channel store.
    pub(crate) dot_springs: Option<DotSprings>,
    /// A discrete fill sweep has been triggered for the current pass.
    pub(crate) fill_animated: bool,
    /// The next-word pre-arm keyframe has been scheduled or applied.
    pub(crate) pre_fill_armed: bool,
}

impl Word {
    pub fn new(start_ms: f64, end_ms: f64, element: ElementId) -> Self {
        Self {
            start_ms,
            end_ms,
            dot: false,
            letter_group: false,
            letters: Vec::new(),
            total_time_ms: end_ms - start_ms,
            element,
            springs: None,
            dot_springs: None,
            fill_animated: false,
            pre_fill_armed: false,
        }
    }

    pub fn dot(start_ms: f64, end_ms: f64, element: ElementId) -> Self {
        Self {
            dot: true,
            ..Self::new(start_ms, end_ms, element)
        }
    }

    pub fn letter_group(
        start_ms: f64,
        end_ms: f64,
        element: ElementId,
        letters: Vec<Letter>,
    ) -> Self {
        Self {
            letter_group: true,
            letters,
            ..Self::new(start_ms, end_ms, element)
        }
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.start_ms < self.end_ms,
            "empty or inverted time range"
        );
        if self.letter_group {
            ensure!(!self.letters.is_empty(), "letter group without letters");
            for letter in &self.letters {
                ensure!(
                    letter.start_ms < letter.end_ms,
                    "letter with empty or inverted time range"
                );
            }
        }
        Ok(())
    }
}

/// One timed letter under a letter-group word.
#[derive(Debug)]
pub struct Letter {
    pub start_ms: f64,
    pub end_ms: f64,
    pub element: ElementId,
    pub(crate) springs: Option<LetterSprings>,
    pub(crate) fill_animated: bool,
    pub(crate) pre_fill_armed: bool,
}

impl Letter {
    pub fn new(start_ms: f64, end_ms: f64, element: ElementId) -> Self {
        Self {
            start_ms,
            end_ms,
            element,
            springs: None,
            fill_animated: false,
            pre_fill_armed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Elements;

    fn ids(elements: &mut Elements, n: usize) -> Vec<ElementId> {
        (0..n).map(|_| elements.create()).collect()
    }

    #[test]
    fn accepts_a_well_formed_document() {
        let mut elements = Elements::new();
        let e = ids(&mut elements, 4);
        let doc = LyricsDocument::syllable(vec![
            Line::new(0.0, 1000.0, e[0], vec![Word::new(0.0, 1000.0, e[1])]),
            Line::new(1000.0, 2000.0, e[2], vec![Word::new(1000.0, 2000.0, e[3])]),
        ]);
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn rejects_overlapping_lines() {
        let mut elements = Elements::new();
        let e = ids(&mut elements, 2);
        let doc = LyricsDocument::line(vec![
            Line::new(0.0, 1500.0, e[0], Vec::new()),
            Line::new(1000.0, 2000.0, e[1], Vec::new()),
        ]);
        assert!(doc.validate().is_err());
    }

    #[test]
    fn rejects_inverted_word_range() {
        let mut elements = Elements::new();
        let e = ids(&mut elements, 2);
        let doc = LyricsDocument::syllable(vec![Line::new(
            0.0,
            1000.0,
            e[0],
            vec![Word::new(800.0, 300.0, e[1])],
        )]);
        assert!(doc.validate().is_err());
    }

    #[test]
    fn rejects_empty_letter_group() {
        let mut elements = Elements::new();
        let e = ids(&mut elements, 2);
        let doc = LyricsDocument::syllable(vec![Line::new(
            0.0,
            1000.0,
            e[0],
            vec![Word::letter_group(0.0, 1000.0, e[1], Vec::new())],
        )]);
        assert!(doc.validate().is_err());
    }

    #[test]
    fn word_constructors_set_flags() {
        let mut elements = Elements::new();
        let e = ids(&mut elements, 3);
        let word = Word::new(0.0, 400.0, e[0]);
        assert!(!word.dot && !word.letter_group);
        assert_eq!(word.total_time_ms, 400.0);

        let dot = Word::dot(0.0, 400.0, e[1]);
        assert!(dot.dot);

        let group =
            Word::letter_group(0.0, 400.0, e[2], vec![Letter::new(0.0, 200.0, e[2])]);
        assert!(group.letter_group);
        assert_eq!(group.letters.len(), 1);
    }
}
