use std::ops::Range;
use std::sync::Arc;

use crate::geom::{ScreenPoint, ScreenRect};
use crate::hocr::HocrDocument;

/// The host-facing text interface: a flat buffer addressed by character
/// offsets, with line/word range lookup and offset-to-screen projection.
pub trait OffsetText {
    fn story_length(&self) -> usize;
    fn text_in_range(&self, start: usize, end: usize) -> String;
    fn line_range_at(&self, offset: usize) -> Range<usize>;
    fn word_range_at(&self, offset: usize) -> Range<usize>;
    fn point_for_offset(&self, offset: usize) -> ScreenPoint;
}

#[derive(Debug, Clone)]
pub struct OcrTextModel {
    document: Arc<HocrDocument>,
    location: ScreenRect,
    position: Range<usize>,
}

impl OcrTextModel {
    pub fn new(document: HocrDocument, location: ScreenRect) -> Self {
        Self {
            document: Arc::new(document),
            location,
            position: 0..0,
        }
    }

    pub fn document(&self) -> &HocrDocument {
        &self.document
    }

    pub fn location(&self) -> ScreenRect {
        self.location
    }

    pub fn position(&self) -> Range<usize> {
        self.position.clone()
    }

    pub fn set_position(&mut self, position: Range<usize>) {
        let end = position.end.min(self.document.text_len);
        let start = position.start.min(end);
        self.position = start..end;
    }

    pub fn next_line_range(&self, offset: usize) -> Option<Range<usize>> {
        let current = self.line_range_at(offset);
        if current.end >= self.document.text_len {
            return None;
        }
        Some(self.line_range_at(current.end))
    }

    pub fn previous_line_range(&self, offset: usize) -> Option<Range<usize>> {
        let current = self.line_range_at(offset);
        if current.start == 0 {
            return None;
        }
        Some(self.line_range_at(current.start - 1))
    }

    pub fn next_word_range(&self, offset: usize) -> Option<Range<usize>> {
        let current = self.word_range_at(offset);
        if current.end >= self.document.text_len {
            return None;
        }
        Some(self.word_range_at(current.end))
    }

    pub fn previous_word_range(&self, offset: usize) -> Option<Range<usize>> {
        let current = self.word_range_at(offset);
        if current.start == 0 {
            return None;
        }
        Some(self.word_range_at(current.start - 1))
    }
}

impl OffsetText for OcrTextModel {
    fn story_length(&self) -> usize {
        self.document.text_len
    }

    fn text_in_range(&self, start: usize, end: usize) -> String {
        let end = end.min(self.document.text_len);
        let start = start.min(end);
        if start == end {
            return String::new();
        }
        self.document
            .text
            .chars()
            .skip(start)
            .take(end - start)
            .collect()
    }

    fn line_range_at(&self, offset: usize) -> Range<usize> {
        range_at(&self.document.line_starts, offset, self.document.text_len)
    }

    fn word_range_at(&self, offset: usize) -> Range<usize> {
        let words = &self.document.words;
        let next = words.partition_point(|word| word.offset <= offset);
        let start = if next == 0 { 0 } else { words[next - 1].offset };
        let end = words
            .get(next)
            .map(|word| word.offset)
            .unwrap_or(self.document.text_len);
        start..end
    }

    fn point_for_offset(&self, offset: usize) -> ScreenPoint {
        let next = self
            .document
            .words
            .partition_point(|word| word.offset <= offset);
        match next.checked_sub(1).map(|idx| &self.document.words[idx]) {
            Some(word) => ScreenPoint {
                x: word.left,
                y: word.top,
            },
            None => self.location.top_left(),
        }
    }
}

// Recorded starts split [0, length] into contiguous half-open ranges: the
// range for an offset runs from the greatest start at or before it (or 0) to
// the next start after it (or the end of the buffer).
fn range_at(starts: &[usize], offset: usize, length: usize) -> Range<usize> {
    let next = starts.partition_point(|&start| start <= offset);
    let start = if next == 0 { 0 } else { starts[next - 1] };
    let end = starts.get(next).copied().unwrap_or(length);
    start..end
}
