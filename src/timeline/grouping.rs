//! Partitioning of a chronological message stream into display groups.
//!
//! Two independent partitions are computed over the same sequence: one by
//! sender (which message needs an author label) and one by time proximity
//! (where to put date separators and trailing timestamps). Both are instances
//! of the same generic single-pass range scan.

use std::ops::Range;

use tracing::warn;

use crate::timeline::message::{DisplayHints, Message};

/// Maximum gap between two consecutive messages for them to remain in the
/// same time group: 10 minutes, in milliseconds.
pub const DEFAULT_GAP_WINDOW_MS: u64 = 600_000;

/// Splits `items` into contiguous, non-empty index ranges in a single
/// left-to-right scan.
///
/// The first item unconditionally opens a range. Every subsequent item is
/// passed to `predicate` along with its absolute index and the slice of items
/// accumulated in the open range so far: `true` extends the open range,
/// `false` closes it and opens a new one starting at the candidate.
///
/// The returned ranges never overlap and their concatenation always covers
/// `items` exactly. An empty input yields no ranges at all.
pub fn contiguous_ranges<T, P>(items: &[T], mut predicate: P) -> Vec<Range<usize>>
where
    P: FnMut(&T, usize, &[T]) -> bool,
{
    let mut ranges = Vec::new();
    if items.is_empty() {
        return ranges;
    }

    let mut start = 0;
    for (index, candidate) in items.iter().enumerate().skip(1) {
        if !predicate(candidate, index, &items[start..index]) {
            ranges.push(start..index);
            start = index;
        }
    }
    ranges.push(start..items.len());
    ranges
}

/// `true` iff the candidate was sent by the same user as the first message
/// of the open range.
fn same_sender(candidate: &Message, _index: usize, range_so_far: &[Message]) -> bool {
    range_so_far
        .first()
        .is_some_and(|first| first.sender_id == candidate.sender_id)
}

/// `true` iff the candidate arrived within `gap_window_ms` of the last
/// message of the open range.
///
/// A candidate timestamped *before* the last message violates the message
/// source's ascending-order contract. It is reported and forced onto a new
/// range boundary instead of extending this one, so the scan always completes
/// with a valid partition.
fn within_gap_window(
    candidate: &Message,
    index: usize,
    range_so_far: &[Message],
    gap_window_ms: u64,
) -> bool {
    let Some(last) = range_so_far.last() else {
        return false;
    };
    if candidate.sent_at < last.sent_at {
        warn!(
            message_id = %candidate.message_id,
            index,
            candidate_sent_at = candidate.sent_at,
            previous_sent_at = last.sent_at,
            "out-of-order message in timeline, starting a new time group"
        );
        return false;
    }
    candidate.sent_at - last.sent_at <= gap_window_ms
}

/// Computes the display hints for a chronologically ascending message
/// sequence, using the default 10-minute gap window.
///
/// The hints are returned as a side table parallel to `messages` rather than
/// written onto the messages themselves, so annotation never aliases state
/// shared with the rendering layer. The computation is pure: calling it twice
/// on the same input yields the same hints.
pub fn display_hints(messages: &[Message]) -> Vec<DisplayHints> {
    display_hints_with_gap(messages, DEFAULT_GAP_WINDOW_MS)
}

/// Same as [`display_hints`], with an explicit gap window.
pub fn display_hints_with_gap(messages: &[Message], gap_window_ms: u64) -> Vec<DisplayHints> {
    let mut hints = vec![DisplayHints::default(); messages.len()];
    if messages.is_empty() {
        return hints;
    }

    // The two partitions are computed independently over the same unmodified
    // sequence: a message can open an author group and a time group at once.
    for range in contiguous_ranges(messages, same_sender) {
        hints[range.start] |= DisplayHints::ShowAuthorLabel;
    }

    for range in contiguous_ranges(messages, |candidate, index, range_so_far| {
        within_gap_window(candidate, index, range_so_far, gap_window_ms)
    }) {
        hints[range.start] |= DisplayHints::ShowDateSeparator;
        hints[range.end - 1] |= DisplayHints::ShowTrailingTimestamp;
    }

    hints
}
