use serde_json::{json, Value};

/// Named conversation-list filters offered in place of free-form filter
/// code. Each one maps to a declarative filter object the SDK understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationFilter {
    All,
    Unread,
    P2p,
    Team,
}

impl ConversationFilter {
    pub const NAMES: &'static [&'static str] = &["all", "unread", "p2p", "team"];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "all" => Some(Self::All),
            "unread" => Some(Self::Unread),
            "p2p" => Some(Self::P2p),
            "team" => Some(Self::Team),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Unread => "unread",
            Self::P2p => "p2p",
            Self::Team => "team",
        }
    }

    /// `None` means no filter at all.
    pub fn to_filter(self) -> Option<Value> {
        match self {
            Self::All => None,
            Self::Unread => Some(json!({ "unreadOnly": true })),
            Self::P2p => Some(json!({ "conversationTypes": ["p2p"] })),
            Self::Team => Some(json!({ "conversationTypes": ["team"] })),
        }
    }
}
