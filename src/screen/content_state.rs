use serde::Serialize;

/// Generic placeholder/content switcher for a screen section.
///
/// Serialized with a `status` tag so the frontend can swap a placeholder view
/// (spinner, empty-state illustration, error banner) for the content view
/// without inspecting the payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status", content = "data")]
pub enum ContentState<T> {
    /// Placeholder shown while the first page is being fetched.
    Loading,
    /// The source answered, but there is nothing to show.
    Empty,
    /// Real content, ready to render.
    Content(T),
    /// The section failed to load; the message is displayable as-is.
    Error(String),
}

impl<T> ContentState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ContentState::Loading)
    }

    pub fn as_content(&self) -> Option<&T> {
        match self {
            ContentState::Content(content) => Some(content),
            _ => None,
        }
    }

    pub fn as_content_mut(&mut self) -> Option<&mut T> {
        match self {
            ContentState::Content(content) => Some(content),
            _ => None,
        }
    }
}
