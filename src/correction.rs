//! Applying corrections to a file's text
//!
//! Corrections from every rule are pooled, sorted by position and filtered so
//! that no two accepted corrections touch the same text. The survivors are
//! then spliced into the text from the last one to the first, so the ranges
//! still to be applied keep pointing at the original characters.

use crate::models::Correction;
use crate::text::{ByteRange, StringView};

/// Outcome of applying a batch of corrections to one text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// The rewritten text
    pub contents: String,
    /// Accepted corrections, in document order
    pub applied: Vec<Correction>,
    /// Corrections that overlapped an accepted one or pointed outside the text
    pub dropped: Vec<Correction>,
}

pub struct CorrectionApplier;

impl CorrectionApplier {
    /// Apply `corrections` to the text of `view`.
    ///
    /// Sorts by (range start, rule index) and keeps a correction only if it
    /// does not conflict with the previously accepted one. An insertion at
    /// the exact end of the previous correction is kept; anything starting
    /// inside it, or at the same position, is dropped.
    pub fn apply(view: &StringView, mut corrections: Vec<Correction>) -> Applied {
        corrections.sort_by(|a, b| {
            a.range
                .location
                .cmp(&b.range.location)
                .then(a.rule_index.cmp(&b.rule_index))
        });

        let mut accepted: Vec<(Correction, ByteRange)> = Vec::with_capacity(corrections.len());
        let mut dropped = Vec::new();
        for correction in corrections {
            let bytes = match view.char_range_to_byte_range(correction.range) {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::warn!(
                        "{} correction at {} not applied: {}",
                        correction.rule_id,
                        correction.location,
                        e
                    );
                    dropped.push(correction);
                    continue;
                }
            };

            if let Some((last, _)) = accepted.last() {
                if conflicts(last, &correction) {
                    log::debug!(
                        "{} correction at {} not applied: overlaps {} correction",
                        correction.rule_id,
                        correction.location,
                        last.rule_id
                    );
                    dropped.push(correction);
                    continue;
                }
            }
            accepted.push((correction, bytes));
        }

        let mut contents = view.contents().to_string();
        for (correction, bytes) in accepted.iter().rev() {
            contents.replace_range(bytes.location..bytes.end(), &correction.replacement);
        }

        Applied {
            contents,
            applied: accepted.into_iter().map(|(correction, _)| correction).collect(),
            dropped,
        }
    }
}

/// `next` sorts at or after `last`. Two edits at the same start always
/// conflict, even when both are insertions.
fn conflicts(last: &Correction, next: &Correction) -> bool {
    last.range.intersects(&next.range) || next.range.location == last.range.location
}
