use std::{collections::HashSet, sync::Arc};

use crossbeam_channel::{Receiver, TryRecvError};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::{
    Error, Result,
    models::state_updater::StateUpdater,
    screen::{content_state::ContentState, deferred::DeferredTasks},
    timeline::{
        grouping::display_hints,
        items::{FrontendTimelineItem, timeline_items_with_hints},
        message::Message,
    },
};

/// The possible updates to a conversation's timeline.
///
/// These are sent by the message-source collaborator (e.g. a history/paging
/// fetch running in the background) and drained by the UI thread in
/// [`ConversationScreen::process_updates`].
#[derive(Debug)]
pub enum TimelineUpdate {
    /// The initial page of messages for this conversation, oldest first.
    FirstUpdate { initial_messages: Vec<Message> },
    /// An older page fetched through backwards pagination, to be prepended.
    OlderMessages {
        messages: Vec<Message>,
        /// Whether this page reached the start of the conversation.
        fully_paginated: bool,
    },
    /// Newly received messages, to be appended.
    NewMessages { messages: Vec<Message> },
    /// The timeline was invalidated and must be re-fetched from scratch.
    Cleared,
    /// The set of users currently typing in this conversation.
    TypingUsers { users: Vec<String> },
}

/// The loaded timeline of a conversation: the annotated display list plus the
/// raw messages it was derived from.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineUiState {
    /// The flat display list the adapter renders, oldest first.
    items: Vec<FrontendTimelineItem>,
    /// Whether backwards pagination has reached the start of the conversation.
    fully_paginated: bool,
    /// The message the UI should scroll to and highlight, if any.
    selected_message_id: Option<String>,
    /// Source of truth for `items`; re-annotated whenever it changes.
    #[serde(skip)]
    messages: Vec<Message>,
}

impl TimelineUiState {
    pub fn items(&self) -> &[FrontendTimelineItem] {
        &self.items
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_fully_paginated(&self) -> bool {
        self.fully_paginated
    }

    pub fn selected_message_id(&self) -> Option<&str> {
        self.selected_message_id.as_deref()
    }

    /// Marks the message the UI should scroll to and highlight.
    pub fn select_message(&mut self, message_id: Option<String>) {
        self.selected_message_id = message_id;
    }

    /// Recomputes the display hints and rebuilds the display list from the
    /// current messages. Hints are always derived from scratch; nothing is
    /// memoized across calls.
    fn rebuild_items(&mut self) {
        let hints = display_hints(&self.messages);
        self.items = timeline_items_with_hints(&self.messages, &hints);
    }
}

/// A serializable struct representing the state of a single conversation
/// screen. Fields are not exposed to the adapter directly, the adapter can
/// only serialize this struct.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationScreen {
    /// The ID of the conversation this screen displays.
    conversation_id: String,
    /// The displayable name of this conversation.
    conversation_name: String,
    /// The timeline section, behind a placeholder until the first page lands.
    timeline: ContentState<TimelineUiState>,
    /// The users of this conversation that are currently typing a message.
    typing_users: HashSet<String>,
    /// The state updater passed by the adapter.
    #[serde(skip)]
    state_updaters: Arc<Box<dyn StateUpdater>>,
    /// Timeline updates enqueued by the message source.
    #[serde(skip)]
    update_receiver: Receiver<TimelineUpdate>,
    /// Configuration tasks held back until the timeline has loaded.
    #[serde(skip)]
    deferred: DeferredTasks<TimelineUiState>,
}

impl ConversationScreen {
    pub fn new(
        updaters: Arc<Box<dyn StateUpdater>>,
        conversation_id: String,
        conversation_name: String,
        update_receiver: Receiver<TimelineUpdate>,
    ) -> Self {
        Self {
            conversation_id,
            conversation_name,
            timeline: ContentState::Loading,
            typing_users: HashSet::new(),
            state_updaters: updaters,
            update_receiver,
            deferred: DeferredTasks::new(),
        }
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn conversation_name(&self) -> &str {
        &self.conversation_name
    }

    pub fn timeline(&self) -> &ContentState<TimelineUiState> {
        &self.timeline
    }

    pub fn typing_users(&self) -> &HashSet<String> {
        &self.typing_users
    }

    /// Runs `task` against the loaded timeline, or holds it back until the
    /// timeline has loaded if it is still behind a placeholder.
    pub fn defer(&mut self, task: impl FnOnce(&mut TimelineUiState) + Send + 'static) {
        match self.timeline.as_content_mut() {
            Some(state) => task(state),
            None => self.deferred.defer(task),
        }
    }

    /// Processes all pending background updates for this conversation and,
    /// if any were applied, pushes the new state to the frontend.
    ///
    /// Display hints are recomputed from scratch whenever the message list
    /// changed, so group boundaries stay correct across page prepends and
    /// live appends. Returns the number of updates applied.
    pub fn process_updates(&mut self) -> Result<usize> {
        let mut num_updates = 0;
        let mut timeline_changed = false;

        loop {
            let update = match self.update_receiver.try_recv() {
                Ok(update) => update,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!(
                        conversation_id = %self.conversation_id,
                        "timeline update channel disconnected"
                    );
                    self.timeline =
                        ContentState::Error("timeline update channel disconnected".to_owned());
                    self.update_frontend_state();
                    return Err(Error::UpdateChannelDisconnected);
                }
            };
            num_updates += 1;
            debug!(conversation_id = %self.conversation_id, "processing update: {update:?}");

            match update {
                TimelineUpdate::FirstUpdate { initial_messages } => {
                    self.timeline = ContentState::Content(TimelineUiState {
                        messages: initial_messages,
                        ..TimelineUiState::default()
                    });
                    timeline_changed = true;
                }
                TimelineUpdate::OlderMessages {
                    messages,
                    fully_paginated,
                } => {
                    let state = self.loaded_timeline_mut();
                    state.messages.splice(0..0, messages);
                    state.fully_paginated = fully_paginated;
                    timeline_changed = true;
                }
                TimelineUpdate::NewMessages { messages } => {
                    if messages.is_empty() {
                        continue;
                    }
                    self.loaded_timeline_mut().messages.extend(messages);
                    timeline_changed = true;
                }
                TimelineUpdate::Cleared => {
                    debug!(
                        conversation_id = %self.conversation_id,
                        "timeline cleared, waiting for a fresh first page"
                    );
                    self.timeline = ContentState::Loading;
                    timeline_changed = false;
                }
                TimelineUpdate::TypingUsers { users } => {
                    self.typing_users = users.into_iter().collect();
                }
            }
        }

        if timeline_changed {
            if self
                .timeline
                .as_content()
                .is_some_and(|state| state.messages.is_empty())
            {
                self.timeline = ContentState::Empty;
            } else if let Some(state) = self.timeline.as_content_mut() {
                state.rebuild_items();
                // The timeline exists now: run the configuration tasks that
                // were waiting for it.
                self.deferred.run_pending(state);
            }
        }

        if num_updates > 0 {
            self.update_frontend_state();
        }
        Ok(num_updates)
    }

    /// Pushes the current state of this screen to the frontend store.
    fn update_frontend_state(&self) {
        if let Err(e) = self
            .state_updaters
            .update_conversation(self, &self.conversation_id)
        {
            error!(
                conversation_id = %self.conversation_id,
                "cannot update frontend conversation store: {e}"
            );
        }
    }

    /// Returns the loaded timeline state, promoting a placeholder to empty
    /// content first if pages arrive before (or without) a `FirstUpdate`.
    fn loaded_timeline_mut(&mut self) -> &mut TimelineUiState {
        if self.timeline.as_content().is_none() {
            self.timeline = ContentState::Content(TimelineUiState::default());
        }
        self.timeline
            .as_content_mut()
            .expect("BUG: timeline content was just initialized")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use crossbeam_channel::{Sender, unbounded};
    use serde_json::Value;

    use super::*;
    use crate::timeline::message::DisplayHints;

    /// Records every state push so tests can assert on what the frontend
    /// would have received.
    #[derive(Debug, Default)]
    struct RecordingUpdater {
        pushes: Mutex<Vec<(String, Value)>>,
    }

    impl StateUpdater for RecordingUpdater {
        fn update_conversation(
            &self,
            screen: &ConversationScreen,
            conversation_id: &str,
        ) -> anyhow::Result<()> {
            self.pushes.lock().unwrap().push((
                conversation_id.to_owned(),
                serde_json::to_value(screen)?,
            ));
            Ok(())
        }
    }

    fn new_screen() -> (ConversationScreen, Sender<TimelineUpdate>, Arc<RecordingUpdater>) {
        let updater = Arc::new(RecordingUpdater::default());
        let boxed: Arc<Box<dyn StateUpdater>> =
            Arc::new(Box::new(SharedUpdater(updater.clone())));
        let (sender, receiver) = unbounded();
        let screen = ConversationScreen::new(
            boxed,
            "conv-1".to_owned(),
            "Climbing circle".to_owned(),
            receiver,
        );
        (screen, sender, updater)
    }

    /// Forwards to a shared [`RecordingUpdater`] so the test keeps a handle
    /// to the recorded pushes after the screen takes ownership of the boxed
    /// trait object.
    #[derive(Debug)]
    struct SharedUpdater(Arc<RecordingUpdater>);

    impl StateUpdater for SharedUpdater {
        fn update_conversation(
            &self,
            screen: &ConversationScreen,
            conversation_id: &str,
        ) -> anyhow::Result<()> {
            self.0.update_conversation(screen, conversation_id)
        }
    }

    fn msg(id: &str, sender_id: &str, sent_at: u64) -> Message {
        Message {
            message_id: id.to_owned(),
            sender_id: sender_id.to_owned(),
            sender: None,
            sent_at,
            body: String::new(),
        }
    }

    fn message_hints(state: &TimelineUiState) -> Vec<DisplayHints> {
        state
            .items()
            .iter()
            .filter_map(|item| match item {
                FrontendTimelineItem::Message(item) => Some(item.hints),
                FrontendTimelineItem::Virtual(_) => None,
            })
            .collect()
    }

    #[test]
    fn first_update_swaps_the_placeholder_for_annotated_content() {
        let (mut screen, sender, updater) = new_screen();
        assert!(screen.timeline().is_loading());

        sender
            .send(TimelineUpdate::FirstUpdate {
                initial_messages: vec![msg("a", "@u1", 0), msg("b", "@u1", 100)],
            })
            .unwrap();
        assert_eq!(screen.process_updates().unwrap(), 1);

        let state = screen.timeline().as_content().expect("timeline loaded");
        assert_eq!(state.messages().len(), 2);
        // One divider and two messages; only the first message gets labels.
        assert_eq!(state.items().len(), 3);
        let hints = message_hints(state);
        assert!(hints[0].contains(DisplayHints::ShowAuthorLabel));
        assert!(!hints[1].contains(DisplayHints::ShowAuthorLabel));

        // The frontend received exactly one push, for this conversation.
        let pushes = updater.pushes.lock().unwrap();
        assert_eq!(pushes.len(), 1);
        assert_eq!(pushes[0].0, "conv-1");
        assert_eq!(pushes[0].1["timeline"]["status"], "content");
    }

    #[test]
    fn an_empty_first_page_shows_the_empty_placeholder() {
        let (mut screen, sender, _updater) = new_screen();
        sender
            .send(TimelineUpdate::FirstUpdate {
                initial_messages: Vec::new(),
            })
            .unwrap();
        screen.process_updates().unwrap();
        assert!(matches!(screen.timeline(), ContentState::Empty));
    }

    #[test]
    fn appended_messages_are_regrouped_with_the_existing_ones() {
        let (mut screen, sender, _updater) = new_screen();
        sender
            .send(TimelineUpdate::FirstUpdate {
                initial_messages: vec![msg("a", "@u1", 0)],
            })
            .unwrap();
        screen.process_updates().unwrap();

        // Same sender, within the gap window: the new message must join the
        // existing author and time groups instead of opening new ones.
        sender
            .send(TimelineUpdate::NewMessages {
                messages: vec![msg("b", "@u1", 1_000)],
            })
            .unwrap();
        screen.process_updates().unwrap();

        let state = screen.timeline().as_content().unwrap();
        let hints = message_hints(state);
        assert_eq!(hints.len(), 2);
        assert!(!hints[1].contains(DisplayHints::ShowAuthorLabel));
        assert!(!hints[1].contains(DisplayHints::ShowDateSeparator));
        // The trailing timestamp moved from the old last message to the new one.
        assert!(!hints[0].contains(DisplayHints::ShowTrailingTimestamp));
        assert!(hints[1].contains(DisplayHints::ShowTrailingTimestamp));
    }

    #[test]
    fn older_pages_are_prepended_and_mark_pagination_progress() {
        let (mut screen, sender, _updater) = new_screen();
        sender
            .send(TimelineUpdate::FirstUpdate {
                initial_messages: vec![msg("c", "@u1", 2_000_000)],
            })
            .unwrap();
        sender
            .send(TimelineUpdate::OlderMessages {
                messages: vec![msg("a", "@u1", 0), msg("b", "@u1", 1_000)],
                fully_paginated: true,
            })
            .unwrap();
        // Both updates are drained in one call.
        assert_eq!(screen.process_updates().unwrap(), 2);

        let state = screen.timeline().as_content().unwrap();
        assert!(state.is_fully_paginated());
        let order: Vec<&str> = state
            .messages()
            .iter()
            .map(|m| m.message_id.as_str())
            .collect();
        assert_eq!(order, vec!["a", "b", "c"]);
        // The 2_000_000 - 1_000 gap exceeds the window: two time groups.
        let hints = message_hints(state);
        assert!(hints[2].contains(DisplayHints::ShowDateSeparator));
    }

    #[test]
    fn cleared_returns_to_the_loading_placeholder() {
        let (mut screen, sender, _updater) = new_screen();
        sender
            .send(TimelineUpdate::FirstUpdate {
                initial_messages: vec![msg("a", "@u1", 0)],
            })
            .unwrap();
        screen.process_updates().unwrap();
        sender.send(TimelineUpdate::Cleared).unwrap();
        screen.process_updates().unwrap();
        assert!(screen.timeline().is_loading());
    }

    #[test]
    fn typing_users_are_replaced_not_accumulated() {
        let (mut screen, sender, _updater) = new_screen();
        sender
            .send(TimelineUpdate::TypingUsers {
                users: vec!["@u1".to_owned(), "@u2".to_owned()],
            })
            .unwrap();
        screen.process_updates().unwrap();
        assert_eq!(screen.typing_users().len(), 2);

        sender
            .send(TimelineUpdate::TypingUsers {
                users: vec!["@u3".to_owned()],
            })
            .unwrap();
        screen.process_updates().unwrap();
        assert_eq!(
            screen.typing_users().iter().collect::<Vec<_>>(),
            vec!["@u3"]
        );
    }

    #[test]
    fn deferred_configuration_runs_once_the_timeline_loads() {
        let (mut screen, sender, _updater) = new_screen();

        // Deferred while still loading: held back.
        screen.defer(|state| state.select_message(Some("b".to_owned())));
        assert!(screen.timeline().is_loading());

        sender
            .send(TimelineUpdate::FirstUpdate {
                initial_messages: vec![msg("a", "@u1", 0), msg("b", "@u1", 100)],
            })
            .unwrap();
        screen.process_updates().unwrap();

        let state = screen.timeline().as_content().unwrap();
        assert_eq!(state.selected_message_id(), Some("b"));

        // Deferred once loaded: runs immediately.
        screen.defer(|state| state.select_message(None));
        let state = screen.timeline().as_content().unwrap();
        assert_eq!(state.selected_message_id(), None);
    }

    #[test]
    fn a_disconnected_update_channel_is_surfaced_as_an_error() {
        let (mut screen, sender, updater) = new_screen();
        drop(sender);
        assert!(matches!(
            screen.process_updates(),
            Err(Error::UpdateChannelDisconnected)
        ));
        assert!(matches!(screen.timeline(), ContentState::Error(_)));
        // The error state was pushed so the frontend can show it.
        assert_eq!(updater.pushes.lock().unwrap().len(), 1);
    }

    #[test]
    fn screen_serializes_in_the_frontend_shape() {
        let (mut screen, sender, _updater) = new_screen();
        sender
            .send(TimelineUpdate::FirstUpdate {
                initial_messages: vec![msg("a", "@u1", 0)],
            })
            .unwrap();
        screen.process_updates().unwrap();

        let value = serde_json::to_value(&screen).unwrap();
        assert_eq!(value["conversationId"], "conv-1");
        assert_eq!(value["conversationName"], "Climbing circle");
        assert_eq!(value["timeline"]["status"], "content");
        let items = value["timeline"]["data"]["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["kind"], "virtual");
        assert_eq!(items[1]["kind"], "message");
    }
}
