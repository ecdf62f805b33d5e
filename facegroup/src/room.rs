use std::fmt;
use std::str::FromStr;

use crate::error::FaceGroupError;

const MAX_ROOM_LEN: usize = 255;

/// Validated room identifier, safe to use as a single directory name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoomId(String);

impl RoomId {
    /// Validates `id`. Rejects empty ids, ids longer than 255 bytes, ids
    /// starting with `.`, and ids containing path separators or control
    /// characters.
    pub fn new(id: impl Into<String>) -> Result<Self, FaceGroupError> {
        let id = id.into();
        let reason = if id.is_empty() {
            Some("must not be empty")
        } else if id.len() > MAX_ROOM_LEN {
            Some("must be at most 255 bytes")
        } else if id.starts_with('.') {
            Some("must not start with '.'")
        } else if id.contains(['/', '\\']) {
            Some("must not contain path separators")
        } else if id.chars().any(char::is_control) {
            Some("must not contain control characters")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(FaceGroupError::InvalidRoom { room: id, reason }),
            None => Ok(Self(id)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoomId {
    type Err = FaceGroupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for RoomId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_ids() {
        for id in ["514409", "r1", "team-photos_2024", "été"] {
            assert_eq!(RoomId::new(id).unwrap().as_str(), id);
        }
    }

    #[test]
    fn rejects_traversal() {
        for id in ["", ".", "..", "../etc", "a/b", "a\\b", ".hidden", "a\0b", "a\nb"] {
            assert!(
                matches!(RoomId::new(id), Err(FaceGroupError::InvalidRoom { .. })),
                "{id:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_overlong() {
        assert!(RoomId::new("x".repeat(256)).is_err());
        assert!(RoomId::new("x".repeat(255)).is_ok());
    }

    #[test]
    fn parse_and_display() {
        let room: RoomId = "r1".parse().unwrap();
        assert_eq!(room.to_string(), "r1");
    }
}
