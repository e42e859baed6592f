use crate::screen::conversation::ConversationScreen;

/// Implemented by the frontend adapter to push updated backend state into
/// whatever store the frontend renders from.
///
/// The adapter decides how to serialize and deliver the screen (e.g. as JSON
/// over an IPC bridge); this crate only hands it the current state.
pub trait StateUpdater: std::fmt::Debug + Send + Sync {
    fn update_conversation(
        &self,
        screen: &ConversationScreen,
        conversation_id: &str,
    ) -> anyhow::Result<()>;
}
