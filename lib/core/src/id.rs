//! Strongly-typed identifiers.
//!
//! Messaging platforms hand out opaque, platform-scoped ids (Messenger's
//! page-scoped user id, for example). They are carried verbatim, wrapped so
//! that a conversation id can never be mixed up with other strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when parsing an ID from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse.
    pub id_type: &'static str,
    /// The reason for the parse failure.
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {}: {}", self.id_type, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Generates an opaque string id wrapper.
macro_rules! define_external_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw platform id.
            #[must_use]
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Returns the raw platform id.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(ParseIdError {
                        id_type: stringify!($name),
                        reason: "id is empty".to_string(),
                    });
                }
                Ok(Self(trimmed.to_string()))
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self::new(raw)
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }
    };
}

define_external_id!(
    /// Identifies one conversation, which is also the reply recipient.
    ConversationId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_raw_id() {
        let id = ConversationId::new("1254459154682919");
        assert_eq!(id.to_string(), "1254459154682919");
        assert_eq!(id.as_str(), "1254459154682919");
    }

    #[test]
    fn parse_trims_whitespace() {
        let id: ConversationId = " 42 ".parse().expect("should parse");
        assert_eq!(id, ConversationId::new("42"));
    }

    #[test]
    fn parse_rejects_empty() {
        let result: Result<ConversationId, _> = "   ".parse();
        let err = result.unwrap_err();
        assert_eq!(err.id_type, "ConversationId");
    }

    #[test]
    fn id_hash() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(ConversationId::new("a"));
        set.insert(ConversationId::new("b"));
        set.insert(ConversationId::new("a"));

        assert_eq!(set.len(), 2);
    }

    #[test]
    fn serializes_transparently() {
        let id = ConversationId::new("psid-7");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"psid-7\"");
    }
}
