//! Ticket comments.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{TicketId, UserId};

/// Maximum comment length in characters.
pub const COMMENT_MAX: usize = 5_000;

/// Validation errors raised by comment value constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommentValidationError {
    #[error("comment id must be a valid UUID")]
    InvalidId,
    #[error("comment text must not be empty")]
    EmptyText,
    #[error("comment text must be at most {max} characters")]
    TextTooLong { max: usize },
}

impl CommentValidationError {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidId => "invalid_comment_id",
            Self::EmptyText => "empty_text",
            Self::TextTooLong { .. } => "text_too_long",
        }
    }
}

/// Stable comment identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(Uuid);

impl CommentId {
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CommentId {
    type Err = CommentValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| CommentValidationError::InvalidId)
    }
}

/// Comment body: trimmed, non-empty, at most [`COMMENT_MAX`] characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentText(String);

impl CommentText {
    /// # Examples
    /// ```
    /// use helpdesk::domain::CommentText;
    ///
    /// assert!(CommentText::new("   ").is_err());
    /// assert_eq!(CommentText::new(" Reiniciado ").unwrap().as_ref(), "Reiniciado");
    /// ```
    pub fn new(raw: impl AsRef<str>) -> Result<Self, CommentValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CommentValidationError::EmptyText);
        }
        if trimmed.chars().count() > COMMENT_MAX {
            return Err(CommentValidationError::TextTooLong { max: COMMENT_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for CommentText {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// A comment that has not been stored yet; storage assigns the sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub id: CommentId,
    pub ticket_id: TicketId,
    pub user_id: UserId,
    pub text: CommentText,
    pub created_at: DateTime<Utc>,
}

impl NewComment {
    #[must_use]
    pub fn new(ticket_id: TicketId, user_id: UserId, text: CommentText, now: DateTime<Utc>) -> Self {
        Self {
            id: CommentId::random(),
            ticket_id,
            user_id,
            text,
            created_at: now,
        }
    }
}

/// Stored comment.
///
/// `sequence` is the storage insertion order and breaks ties between equal
/// `created_at` values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: CommentId,
    pub ticket_id: TicketId,
    pub user_id: UserId,
    pub text: CommentText,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub sequence: i64,
}

impl Comment {
    /// Attach the storage sequence to a new comment.
    #[must_use]
    pub fn stored(new_comment: NewComment, sequence: i64) -> Self {
        let NewComment {
            id,
            ticket_id,
            user_id,
            text,
            created_at,
        } = new_comment;
        Self {
            id,
            ticket_id,
            user_id,
            text,
            created_at,
            updated_at: created_at,
            sequence,
        }
    }

    /// Chronological ordering key.
    #[must_use]
    pub fn order_key(&self) -> (DateTime<Utc>, i64) {
        (self.created_at, self.sequence)
    }
}
