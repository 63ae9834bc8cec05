//! Byte and character coordinates over a source file
//!
//! Structure producers report positions as byte offsets into the UTF-8
//! contents, while violations and corrections are expressed in characters
//! (Unicode scalar values). `StringView` keeps both indexings of the same
//! text and converts between them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to map a coordinate onto the text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinateError {
    #[error("byte offset {offset} is beyond the end of the text ({length} bytes)")]
    ByteOffsetOutOfBounds { offset: usize, length: usize },

    #[error("byte offset {offset} does not fall on a character boundary")]
    NotCharBoundary { offset: usize },

    #[error("character offset {offset} is beyond the end of the text ({length} characters)")]
    CharOffsetOutOfBounds { offset: usize, length: usize },
}

/// A span of bytes: `location` is inclusive, `location + length` exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ByteRange {
    pub location: usize,
    pub length: usize,
}

impl ByteRange {
    pub fn new(location: usize, length: usize) -> Self {
        Self { location, length }
    }

    pub fn end(&self) -> usize {
        self.location + self.length
    }

    /// True if `other` lies entirely inside this range. A range whose end
    /// overflows contains nothing and is contained by nothing.
    pub fn contains(&self, other: &ByteRange) -> bool {
        match (
            self.location.checked_add(self.length),
            other.location.checked_add(other.length),
        ) {
            (Some(end), Some(other_end)) => other.location >= self.location && other_end <= end,
            _ => false,
        }
    }
}

/// A span of characters: `location` is inclusive, `location + length` exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharRange {
    pub location: usize,
    pub length: usize,
}

impl CharRange {
    pub fn new(location: usize, length: usize) -> Self {
        Self { location, length }
    }

    pub fn end(&self) -> usize {
        self.location + self.length
    }

    /// Whether two ranges share any text.
    ///
    /// Touching ranges do not intersect. An empty range (an insertion point)
    /// intersects a range that strictly surrounds it, and another empty range
    /// at the same location.
    pub fn intersects(&self, other: &CharRange) -> bool {
        if self.length == 0 && other.length == 0 {
            return self.location == other.location;
        }
        if self.length == 0 {
            return other.location < self.location && self.location < other.end();
        }
        if other.length == 0 {
            return self.location < other.location && other.location < self.end();
        }
        self.location < other.end() && other.location < self.end()
    }
}

/// Immutable text with synchronized byte and character indexing
#[derive(Debug, Clone)]
pub struct StringView {
    contents: String,
    /// Byte offset of every character, followed by `contents.len()`
    char_starts: Vec<usize>,
    /// Character offset at which each line begins
    line_starts: Vec<usize>,
}

impl StringView {
    pub fn new(contents: impl Into<String>) -> Self {
        let contents = contents.into();

        let mut char_starts = Vec::with_capacity(contents.len() + 1);
        let mut line_starts = vec![0];
        for (index, (byte_offset, ch)) in contents.char_indices().enumerate() {
            char_starts.push(byte_offset);
            if ch == '\n' {
                line_starts.push(index + 1);
            }
        }
        char_starts.push(contents.len());

        Self {
            contents,
            char_starts,
            line_starts,
        }
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    pub fn byte_len(&self) -> usize {
        self.contents.len()
    }

    pub fn char_len(&self) -> usize {
        self.char_starts.len() - 1
    }

    pub fn byte_offset_to_char_offset(&self, offset: usize) -> Result<usize, CoordinateError> {
        if offset > self.byte_len() {
            return Err(CoordinateError::ByteOffsetOutOfBounds {
                offset,
                length: self.byte_len(),
            });
        }
        self.char_starts
            .binary_search(&offset)
            .map_err(|_| CoordinateError::NotCharBoundary { offset })
    }

    pub fn char_offset_to_byte_offset(&self, offset: usize) -> Result<usize, CoordinateError> {
        self.char_starts
            .get(offset)
            .copied()
            .ok_or(CoordinateError::CharOffsetOutOfBounds {
                offset,
                length: self.char_len(),
            })
    }

    pub fn byte_range_to_char_range(&self, range: ByteRange) -> Result<CharRange, CoordinateError> {
        let end = range
            .location
            .checked_add(range.length)
            .ok_or(CoordinateError::ByteOffsetOutOfBounds {
                offset: usize::MAX,
                length: self.byte_len(),
            })?;
        let start = self.byte_offset_to_char_offset(range.location)?;
        let end = self.byte_offset_to_char_offset(end)?;
        Ok(CharRange::new(start, end - start))
    }

    pub fn char_range_to_byte_range(&self, range: CharRange) -> Result<ByteRange, CoordinateError> {
        let end = range
            .location
            .checked_add(range.length)
            .ok_or(CoordinateError::CharOffsetOutOfBounds {
                offset: usize::MAX,
                length: self.char_len(),
            })?;
        let start = self.char_offset_to_byte_offset(range.location)?;
        let end = self.char_offset_to_byte_offset(end)?;
        Ok(ByteRange::new(start, end - start))
    }

    pub fn substring_with_byte_range(&self, range: ByteRange) -> Result<&str, CoordinateError> {
        // Validates both ends before slicing.
        self.byte_range_to_char_range(range)?;
        Ok(&self.contents[range.location..range.end()])
    }

    pub fn substring(&self, range: CharRange) -> Result<&str, CoordinateError> {
        let bytes = self.char_range_to_byte_range(range)?;
        Ok(&self.contents[bytes.location..bytes.end()])
    }

    /// 1-based line and column of a character offset
    pub fn line_and_character(&self, char_offset: usize) -> Option<(usize, usize)> {
        if char_offset > self.char_len() {
            return None;
        }
        let line_index = self.line_starts.partition_point(|&start| start <= char_offset) - 1;
        Some((line_index + 1, char_offset - self.line_starts[line_index] + 1))
    }

    /// Text of a 1-based line, without its line terminator
    pub fn line(&self, line: usize) -> Option<&str> {
        let start = *self.line_starts.get(line.checked_sub(1)?)?;
        let end = self
            .line_starts
            .get(line)
            .map(|next| next - 1)
            .unwrap_or_else(|| self.char_len());
        let text = self.substring(CharRange::new(start, end - start)).ok()?;
        Some(text.strip_suffix('\r').unwrap_or(text))
    }
}
