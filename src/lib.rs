use serde::{Serialize, ser::Serializer};

pub mod models;
pub mod screen;
pub mod timeline;

pub type Result<T> = std::result::Result<T, Error>;

/// chat-timeline-ui Error enum
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
    #[error("the timeline update channel was disconnected")]
    UpdateChannelDisconnected,
}

impl Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}

// Re-exports

pub use models::state_updater::StateUpdater;
pub use screen::content_state::ContentState;
pub use screen::conversation::{ConversationScreen, TimelineUiState, TimelineUpdate};
pub use screen::deferred::DeferredTasks;
pub use timeline::grouping::{
    DEFAULT_GAP_WINDOW_MS, contiguous_ranges, display_hints, display_hints_with_gap,
};
pub use timeline::items::{
    FrontendMessageItem, FrontendTimelineItem, FrontendVirtualTimelineItem, timeline_items,
    timeline_items_with_hints,
};
pub use timeline::message::{DisplayHints, Message};

// The adapter needs to create the update channel itself
pub use crossbeam_channel;
