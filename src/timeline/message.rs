use bitflags::bitflags;
use serde::{Deserialize, Serialize, Serializer};

/// A single chat message as delivered by the message source.
///
/// The source is expected to hand messages over in ascending `sent_at` order;
/// see [`crate::timeline::grouping`] for how out-of-order messages are handled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// A unique ID for this message, assigned by the message source.
    pub message_id: String,
    /// The ID of the user who sent this message.
    pub sender_id: String,
    /// The resolved display name of the sender, if known.
    pub sender: Option<String>,
    /// Origin timestamp in milliseconds since the Unix epoch.
    /// Kept as raw millis so the adapter can sort items without parsing dates.
    pub sent_at: u64,
    /// The text content of this message.
    pub body: String,
}

bitflags! {
    /// Display annotations attached to a message.
    ///
    /// These are consumed purely by the rendering layer to decide whether to
    /// draw an author label above the message, a date separator above it,
    /// and/or a timestamp below it. They carry no meaning beyond display.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub struct DisplayHints: u8 {
        /// Show the sender's name above this message.
        /// Set on the first message of each run of same-sender messages.
        const ShowAuthorLabel = 1 << 0;
        /// Show a date separator above this message.
        /// Set on the first message of each time group.
        const ShowDateSeparator = 1 << 1;
        /// Show a timestamp below this message.
        /// Set on the last message of each time group.
        const ShowTrailingTimestamp = 1 << 2;
    }
}

impl Serialize for DisplayHints {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeSeq;

        let mut seq = serializer.serialize_seq(None)?;

        if self.contains(DisplayHints::ShowAuthorLabel) {
            seq.serialize_element("showAuthorLabel")?;
        }
        if self.contains(DisplayHints::ShowDateSeparator) {
            seq.serialize_element("showDateSeparator")?;
        }
        if self.contains(DisplayHints::ShowTrailingTimestamp) {
            seq.serialize_element("showTrailingTimestamp")?;
        }

        seq.end()
    }
}
