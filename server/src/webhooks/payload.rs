//! Webhook Payload Decoding
//!
//! Turns a loosely structured WhatsApp Business notification into a
//! [`WebhookEvent`]. The change value is read from `metaData.entry[0].changes[0].value`
//! (archived sample envelope) or from `entry[0].changes[0].value` (live delivery).
//! Anything that does not fit decodes to [`WebhookEvent::Unrecognized`].

use serde::Deserialize;
use wa_common::DeliveryState;

/// A decoded webhook notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    /// A message sent by or to the business.
    NewMessage(NewMessageEvent),
    /// A delivery status change for a previously sent message.
    StatusUpdate(StatusUpdateEvent),
    /// Nothing actionable in the payload.
    Unrecognized(UnrecognizedReason),
}

/// First message of a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessageEvent {
    pub external_id: String,
    pub sender_id: String,
    /// Vendor-supplied recipient, present on some outbound echoes.
    pub recipient_id: Option<String>,
    pub sent_at: i64,
    pub kind: String,
    pub body: String,
    /// `wa_id` of the first contact card.
    pub contact_wa_id: Option<String>,
    /// Profile name of the first contact card.
    pub contact_name: Option<String>,
}

/// First status of a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdateEvent {
    pub external_id: String,
    pub status: DeliveryState,
}

/// Why a payload was not actionable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnrecognizedReason {
    /// The document does not match the notification schema.
    Malformed(String),
    /// No change value at the end of the entry/changes chain.
    MissingValue,
    /// The change value has neither messages nor statuses.
    Empty,
    /// The message timestamp is not a Unix time in seconds.
    InvalidTimestamp(String),
    /// The status is not one of sent/delivered/read/failed.
    UnknownStatus(String),
}

impl std::fmt::Display for UnrecognizedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(e) => write!(f, "malformed payload: {e}"),
            Self::MissingValue => f.write_str("no change value"),
            Self::Empty => f.write_str("no messages or statuses"),
            Self::InvalidTimestamp(ts) => write!(f, "invalid timestamp {ts:?}"),
            Self::UnknownStatus(s) => write!(f, "unknown status {s:?}"),
        }
    }
}

// ============================================================================
// Wire Schema
// ============================================================================

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "metaData")]
    meta_data: Option<Notification>,
    #[serde(default)]
    entry: Option<Vec<Entry>>,
}

#[derive(Debug, Deserialize)]
struct Notification {
    #[serde(default)]
    entry: Option<Vec<Entry>>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    changes: Option<Vec<Change>>,
}

#[derive(Debug, Deserialize)]
struct Change {
    value: Option<ChangeValue>,
}

#[derive(Debug, Default, Deserialize)]
struct ChangeValue {
    #[serde(default)]
    contacts: Vec<ContactCard>,
    #[serde(default)]
    messages: Vec<WireMessage>,
    #[serde(default)]
    statuses: Vec<WireStatus>,
}

#[derive(Debug, Deserialize)]
struct ContactCard {
    wa_id: Option<String>,
    profile: Option<Profile>,
}

#[derive(Debug, Deserialize)]
struct Profile {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    from: String,
    id: String,
    timestamp: WireTimestamp,
    #[serde(rename = "type")]
    kind: Option<String>,
    text: Option<WireText>,
    recipient_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireText {
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireStatus {
    id: String,
    status: String,
}

/// Vendor timestamps arrive as decimal strings; replayed archives sometimes hold numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireTimestamp {
    Number(i64),
    Text(String),
}

impl WireTimestamp {
    fn seconds(&self) -> Result<i64, UnrecognizedReason> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| UnrecognizedReason::InvalidTimestamp(s.clone())),
        }
    }
}

// ============================================================================
// Decoding
// ============================================================================

impl WebhookEvent {
    /// Decode a raw notification document. Never fails.
    pub fn decode(payload: &serde_json::Value) -> Self {
        match decode_value(payload) {
            Ok(event) => event,
            Err(reason) => Self::Unrecognized(reason),
        }
    }

    /// Short label for logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NewMessage(_) => "new_message",
            Self::StatusUpdate(_) => "status_update",
            Self::Unrecognized(_) => "unrecognized",
        }
    }
}

fn decode_value(payload: &serde_json::Value) -> Result<WebhookEvent, UnrecognizedReason> {
    let envelope = Envelope::deserialize(payload)
        .map_err(|e| UnrecognizedReason::Malformed(e.to_string()))?;

    let entries = match envelope.meta_data {
        Some(notification) => notification.entry,
        None => envelope.entry,
    };

    let value = entries
        .and_then(|entries| entries.into_iter().next())
        .and_then(|entry| entry.changes)
        .and_then(|changes| changes.into_iter().next())
        .and_then(|change| change.value)
        .ok_or(UnrecognizedReason::MissingValue)?;

    if let Some(message) = value.messages.into_iter().next() {
        let contact = value.contacts.into_iter().next();
        return Ok(WebhookEvent::NewMessage(new_message_event(message, contact)?));
    }

    if let Some(status) = value.statuses.into_iter().next() {
        let state = DeliveryState::parse_str(&status.status)
            .ok_or(UnrecognizedReason::UnknownStatus(status.status))?;
        return Ok(WebhookEvent::StatusUpdate(StatusUpdateEvent {
            external_id: status.id,
            status: state,
        }));
    }

    Err(UnrecognizedReason::Empty)
}

fn new_message_event(
    message: WireMessage,
    contact: Option<ContactCard>,
) -> Result<NewMessageEvent, UnrecognizedReason> {
    let sent_at = message.timestamp.seconds()?;
    let kind = message.kind.unwrap_or_else(|| "text".to_string());

    // Only text content is interpreted; other kinds carry an empty body.
    let body = if kind == "text" {
        message.text.and_then(|t| t.body).unwrap_or_default()
    } else {
        String::new()
    };

    let (contact_wa_id, contact_name) = match contact {
        Some(card) => (card.wa_id, card.profile.and_then(|p| p.name)),
        None => (None, None),
    };

    Ok(NewMessageEvent {
        external_id: message.id,
        sender_id: message.from,
        recipient_id: message.recipient_id,
        sent_at,
        kind,
        body,
        contact_wa_id,
        contact_name,
    })
}
