use serde::Serialize;

use crate::timeline::{
    grouping::display_hints,
    message::{DisplayHints, Message},
};

/// A single entry of the flat display list the adapter renders.
///
/// Date separators are materialized as virtual items interleaved with the
/// real messages, so the frontend can render the list as-is without
/// re-deriving group boundaries.
#[derive(Debug, Clone, Serialize)]
#[serde(
    rename_all = "camelCase",
    rename_all_fields = "camelCase",
    tag = "kind",
    content = "data"
)]
pub enum FrontendTimelineItem {
    Message(FrontendMessageItem),
    Virtual(FrontendVirtualTimelineItem),
}

/// A real message together with its display hints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontendMessageItem {
    #[serde(flatten)]
    pub message: Message,
    pub hints: DisplayHints,
}

/// Items that do not correspond to a real message.
#[derive(Debug, Clone, Serialize)]
#[serde(
    rename_all = "camelCase",
    rename_all_fields = "camelCase",
    tag = "kind"
)]
pub enum FrontendVirtualTimelineItem {
    /// A divider between two time groups. `at` is the origin timestamp (ms)
    /// of the first message below the divider.
    DateDivider { at: u64 },
}

/// Annotates `messages` and materializes the flat display list,
/// inserting a [`FrontendVirtualTimelineItem::DateDivider`] above every
/// message that opens a new time group.
pub fn timeline_items(messages: &[Message]) -> Vec<FrontendTimelineItem> {
    timeline_items_with_hints(messages, &display_hints(messages))
}

/// Same as [`timeline_items`], for callers that already computed the hints.
///
/// `hints` must be the side table produced for exactly this `messages` slice.
pub fn timeline_items_with_hints(
    messages: &[Message],
    hints: &[DisplayHints],
) -> Vec<FrontendTimelineItem> {
    debug_assert_eq!(messages.len(), hints.len());

    let mut items = Vec::with_capacity(messages.len());
    for (message, &hints) in messages.iter().zip(hints) {
        if hints.contains(DisplayHints::ShowDateSeparator) {
            items.push(FrontendTimelineItem::Virtual(
                FrontendVirtualTimelineItem::DateDivider {
                    at: message.sent_at,
                },
            ));
        }
        items.push(FrontendTimelineItem::Message(FrontendMessageItem {
            message: message.clone(),
            hints,
        }));
    }
    items
}
