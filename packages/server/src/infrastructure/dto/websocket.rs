//! WebSocket message DTOs
//!
//! All frames are JSON objects discriminated by a `type` field.
//!
//! Inbound frames are decoded in two steps: the `type` is read first, then the
//! rest of the object is decoded into the request struct for that type. Anything
//! that fails either step (not JSON, not an object, missing or mistyped fields)
//! becomes [`InboundMessage::Unrecognized`], so a bad frame can never take the
//! connection down.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Type name reported for frames that carry no readable `type`
pub const UNDEFINED_TYPE: &str = "undefined";

/// `{type:"offer", offer, toId, ...}`
///
/// Every field other than `offer` and `toId` is relayed to the target untouched
/// (e.g. `media`, `isMeta`, `play`). `name` is used as the target only when
/// `toId` is absent; otherwise it is relayed like any other field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "OfferWire")]
pub struct OfferRequest {
    pub offer: Value,
    pub to_id: String,
    pub passthrough: Map<String, Value>,
}

/// `{type:"answer", answer, toId}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "AnswerWire")]
pub struct AnswerRequest {
    pub answer: Value,
    pub to_id: String,
}

/// `{type:"candidate", candidate, toId}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "CandidateWire")]
pub struct CandidateRequest {
    pub candidate: Value,
    pub to_id: String,
}

const MISSING_TARGET: &str = "missing field `toId`";

#[derive(Deserialize)]
struct OfferWire {
    offer: Value,
    #[serde(rename = "toId", default)]
    to_id: Option<String>,
    #[serde(flatten)]
    passthrough: Map<String, Value>,
}

impl TryFrom<OfferWire> for OfferRequest {
    type Error = &'static str;

    fn try_from(wire: OfferWire) -> Result<Self, Self::Error> {
        let mut passthrough = wire.passthrough;
        let to_id = match wire.to_id {
            Some(to_id) => to_id,
            None => match passthrough.remove("name") {
                Some(Value::String(name)) => name,
                _ => return Err(MISSING_TARGET),
            },
        };
        Ok(Self {
            offer: wire.offer,
            to_id,
            passthrough,
        })
    }
}

#[derive(Deserialize)]
struct AnswerWire {
    answer: Value,
    #[serde(rename = "toId", default)]
    to_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl TryFrom<AnswerWire> for AnswerRequest {
    type Error = &'static str;

    fn try_from(wire: AnswerWire) -> Result<Self, Self::Error> {
        Ok(Self {
            answer: wire.answer,
            to_id: wire.to_id.or(wire.name).ok_or(MISSING_TARGET)?,
        })
    }
}

#[derive(Deserialize)]
struct CandidateWire {
    candidate: Value,
    #[serde(rename = "toId", default)]
    to_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl TryFrom<CandidateWire> for CandidateRequest {
    type Error = &'static str;

    fn try_from(wire: CandidateWire) -> Result<Self, Self::Error> {
        Ok(Self {
            candidate: wire.candidate,
            to_id: wire.to_id.or(wire.name).ok_or(MISSING_TARGET)?,
        })
    }
}

/// `{type:"close", toId}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CloseRequest {
    #[serde(rename = "toId")]
    pub to_id: String,
}

/// `{type:"friend", name, img, account_id, toId}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FriendRequest {
    pub name: Value,
    pub img: Value,
    pub account_id: Value,
    #[serde(rename = "toId")]
    pub to_id: String,
}

/// `{type:"online", ids}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OnlineRequest {
    pub ids: Vec<String>,
}

/// `{type:"join", room, play?}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JoinRequest {
    pub room: String,
    #[serde(default)]
    pub play: Value,
}

/// `{type:"quit", room}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QuitRequest {
    pub room: String,
}

/// `{type:"login", name}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoginRequest {
    pub name: String,
}

/// Decoded inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Offer(OfferRequest),
    Answer(AnswerRequest),
    Candidate(CandidateRequest),
    Close(CloseRequest),
    Friend(FriendRequest),
    Online(OnlineRequest),
    Join(JoinRequest),
    Quit(QuitRequest),
    Login(LoginRequest),
    /// Unknown `type`, or a known `type` whose fields failed to decode
    Unrecognized { message_type: String },
}

impl InboundMessage {
    /// Decode a text frame. Never fails.
    pub fn parse(text: &str) -> Self {
        let value: Value = serde_json::from_str(text).unwrap_or_else(|e| {
            tracing::debug!("Inbound frame is not JSON: {}", e);
            Value::Null
        });
        let message_type = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or(UNDEFINED_TYPE)
            .to_string();

        let decoded = match message_type.as_str() {
            "offer" => serde_json::from_value(value).map(|mut offer: OfferRequest| {
                // `type` is the envelope tag and `from` is stamped by the relay
                offer.passthrough.remove("type");
                offer.passthrough.remove("from");
                Self::Offer(offer)
            }),
            "answer" => serde_json::from_value(value).map(Self::Answer),
            "candidate" => serde_json::from_value(value).map(Self::Candidate),
            "close" => serde_json::from_value(value).map(Self::Close),
            "friend" => serde_json::from_value(value).map(Self::Friend),
            "online" => serde_json::from_value(value).map(Self::Online),
            "join" => serde_json::from_value(value).map(Self::Join),
            "quit" => serde_json::from_value(value).map(Self::Quit),
            "login" => serde_json::from_value(value).map(Self::Login),
            _ => {
                return Self::Unrecognized {
                    message_type: message_type.clone(),
                };
            }
        };

        decoded.unwrap_or_else(|e| {
            tracing::debug!("Malformed '{}' message: {}", message_type, e);
            Self::Unrecognized { message_type }
        })
    }

    /// The `type` this frame was sent with
    pub fn message_type(&self) -> &str {
        match self {
            Self::Offer(_) => "offer",
            Self::Answer(_) => "answer",
            Self::Candidate(_) => "candidate",
            Self::Close(_) => "close",
            Self::Friend(_) => "friend",
            Self::Online(_) => "online",
            Self::Join(_) => "join",
            Self::Quit(_) => "quit",
            Self::Login(_) => "login",
            Self::Unrecognized { message_type } => message_type,
        }
    }
}

/// Outbound frame
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundMessage {
    Offer {
        offer: Value,
        from: String,
        #[serde(flatten)]
        passthrough: Map<String, Value>,
    },
    Answer {
        answer: Value,
        from: String,
    },
    Candidate {
        candidate: Value,
        from: String,
    },
    Close,
    Friend {
        name: Value,
        img: Value,
        account_id: Value,
    },
    Online {
        online: Vec<bool>,
    },
    /// Reply to `join`. `plays` is absent when the room is full.
    Join {
        #[serde(skip_serializing_if = "Option::is_none")]
        plays: Option<Vec<Value>>,
    },
    /// A room mate left the room
    Quit {
        key: String,
    },
    /// A peer disconnected from the relay
    Leave {
        key: String,
    },
    Login {
        success: bool,
    },
    /// Sent to a channel that was taken over by a newer connection
    Replaced,
    Error {
        message: String,
    },
}

impl OutboundMessage {
    pub fn unrecognized(message_type: &str) -> Self {
        Self::Error {
            message: format!("Unrecognized command: {message_type}"),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
