//! Ticket aggregate and its value types.
//!
//! Status and assignment are never written directly: they change only
//! through [`Ticket::apply_state`], fed by the state machine in
//! [`crate::domain::ticket_lifecycle`]. Every persisted mutation bumps the
//! `revision`, which storage uses as the optimistic concurrency token.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ticket_lifecycle::TicketState;
use super::UserId;

/// Maximum title length in characters.
pub const TITLE_MAX: usize = 200;
/// Maximum description length in characters.
pub const DESCRIPTION_MAX: usize = 10_000;

/// Validation errors raised by ticket value constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TicketValidationError {
    #[error("ticket id must be a valid UUID")]
    InvalidId,
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("title must be at most {max} characters")]
    TitleTooLong { max: usize },
    #[error("description must not be empty")]
    EmptyDescription,
    #[error("description must be at most {max} characters")]
    DescriptionTooLong { max: usize },
    #[error("status must be one of abierto, en_progreso, cerrado")]
    UnknownStatus,
    #[error("priority must be one of baja, media, alta")]
    UnknownPriority,
    #[error("category must be one of hardware, software, red, impresoras, otro")]
    UnknownCategory,
}

impl TicketValidationError {
    /// Stable code describing the failure, used in error details.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidId => "invalid_ticket_id",
            Self::EmptyTitle => "empty_title",
            Self::TitleTooLong { .. } => "title_too_long",
            Self::EmptyDescription => "empty_description",
            Self::DescriptionTooLong { .. } => "description_too_long",
            Self::UnknownStatus => "unknown_status",
            Self::UnknownPriority => "unknown_priority",
            Self::UnknownCategory => "unknown_category",
        }
    }

    /// Request field the failure refers to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::InvalidId => "id",
            Self::EmptyTitle | Self::TitleTooLong { .. } => "title",
            Self::EmptyDescription | Self::DescriptionTooLong { .. } => "description",
            Self::UnknownStatus => "status",
            Self::UnknownPriority => "priority",
            Self::UnknownCategory => "category",
        }
    }
}

/// Stable ticket identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(Uuid);

impl TicketId {
    /// Generate a new random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TicketId {
    type Err = TicketValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| TicketValidationError::InvalidId)
    }
}

/// Ticket title: trimmed, non-empty, at most [`TITLE_MAX`] characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketTitle(String);

impl TicketTitle {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, TicketValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TicketValidationError::EmptyTitle);
        }
        if trimmed.chars().count() > TITLE_MAX {
            return Err(TicketValidationError::TitleTooLong { max: TITLE_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for TicketTitle {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Free-form problem description: non-empty, at most [`DESCRIPTION_MAX`] characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketDescription(String);

impl TicketDescription {
    pub fn new(raw: impl Into<String>) -> Result<Self, TicketValidationError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(TicketValidationError::EmptyDescription);
        }
        if raw.chars().count() > DESCRIPTION_MAX {
            return Err(TicketValidationError::DescriptionTooLong {
                max: DESCRIPTION_MAX,
            });
        }
        Ok(Self(raw))
    }
}

impl AsRef<str> for TicketDescription {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $error:ident {
            $( $(#[$variant_meta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$variant_meta])* #[serde(rename = $wire)] $variant, )+
        }

        impl $name {
            /// Wire and storage identifier.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $wire, )+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = TicketValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $wire => Ok(Self::$variant), )+
                    _ => Err(TicketValidationError::$error),
                }
            }
        }
    };
}

wire_enum! {
    /// Ticket workflow status.
    TicketStatus, UnknownStatus {
        /// Filed and waiting for a technician.
        Abierto => "abierto",
        /// A technician is working on it.
        EnProgreso => "en_progreso",
        /// Resolved. May be reopened.
        Cerrado => "cerrado",
    }
}

wire_enum! {
    /// Urgency chosen by the creator.
    TicketPriority, UnknownPriority {
        Baja => "baja",
        Media => "media",
        Alta => "alta",
    }
}

wire_enum! {
    /// Problem area.
    TicketCategory, UnknownCategory {
        Hardware => "hardware",
        Software => "software",
        Red => "red",
        Impresoras => "impresoras",
        Otro => "otro",
    }
}

impl Default for TicketPriority {
    fn default() -> Self {
        Self::Media
    }
}

impl Default for TicketCategory {
    fn default() -> Self {
        Self::Otro
    }
}

/// Validated input for a new ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    pub title: TicketTitle,
    pub description: TicketDescription,
    pub priority: TicketPriority,
    pub category: TicketCategory,
}

/// Partial content edit. Status and assignment are not editable here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketEdit {
    pub title: Option<TicketTitle>,
    pub description: Option<TicketDescription>,
    pub priority: Option<TicketPriority>,
    pub category: Option<TicketCategory>,
}

impl TicketEdit {
    /// True when no field would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.category.is_none()
    }
}

/// Field set used to rehydrate a [`Ticket`] from storage.
#[derive(Debug, Clone)]
pub struct TicketParts {
    pub id: TicketId,
    pub title: TicketTitle,
    pub description: TicketDescription,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub category: TicketCategory,
    pub creator_id: UserId,
    pub assigned_to: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub revision: u32,
}

/// Support ticket.
///
/// ## Invariants
/// - `revision` starts at 1 and increases by one per persisted mutation.
/// - `assigned_to`, when set, names a technician; see
///   [`crate::domain::ticket_lifecycle::Technician`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    id: TicketId,
    title: TicketTitle,
    description: TicketDescription,
    status: TicketStatus,
    priority: TicketPriority,
    category: TicketCategory,
    creator_id: UserId,
    assigned_to: Option<UserId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    revision: u32,
}

impl From<TicketParts> for Ticket {
    fn from(parts: TicketParts) -> Self {
        let TicketParts {
            id,
            title,
            description,
            status,
            priority,
            category,
            creator_id,
            assigned_to,
            created_at,
            updated_at,
            revision,
        } = parts;
        Self {
            id,
            title,
            description,
            status,
            priority,
            category,
            creator_id,
            assigned_to,
            created_at,
            updated_at,
            revision,
        }
    }
}

impl Ticket {
    /// Open a new, unassigned ticket at revision 1.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// use helpdesk::domain::{
    ///     NewTicket, Ticket, TicketCategory, TicketDescription, TicketPriority, TicketStatus,
    ///     TicketTitle, UserId,
    /// };
    ///
    /// let ticket = Ticket::open(
    ///     NewTicket {
    ///         title: TicketTitle::new("Printer jam").unwrap(),
    ///         description: TicketDescription::new("Paper stuck").unwrap(),
    ///         priority: TicketPriority::Alta,
    ///         category: TicketCategory::Impresoras,
    ///     },
    ///     UserId::random(),
    ///     Utc::now(),
    /// );
    /// assert_eq!(ticket.status(), TicketStatus::Abierto);
    /// assert!(ticket.assigned_to().is_none());
    /// assert_eq!(ticket.revision(), 1);
    /// ```
    #[must_use]
    pub fn open(new_ticket: NewTicket, creator_id: UserId, now: DateTime<Utc>) -> Self {
        let NewTicket {
            title,
            description,
            priority,
            category,
        } = new_ticket;
        Self {
            id: TicketId::random(),
            title,
            description,
            status: TicketStatus::Abierto,
            priority,
            category,
            creator_id,
            assigned_to: None,
            created_at: now,
            updated_at: now,
            revision: 1,
        }
    }

    #[must_use]
    pub fn id(&self) -> TicketId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &TicketTitle {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &TicketDescription {
        &self.description
    }

    #[must_use]
    pub fn status(&self) -> TicketStatus {
        self.status
    }

    #[must_use]
    pub fn priority(&self) -> TicketPriority {
        self.priority
    }

    #[must_use]
    pub fn category(&self) -> TicketCategory {
        self.category
    }

    #[must_use]
    pub fn creator_id(&self) -> &UserId {
        &self.creator_id
    }

    #[must_use]
    pub fn assigned_to(&self) -> Option<&UserId> {
        self.assigned_to.as_ref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Optimistic concurrency token.
    #[must_use]
    pub fn revision(&self) -> u32 {
        self.revision
    }

    /// Current `(status, assignment)` pair.
    #[must_use]
    pub fn state(&self) -> TicketState {
        TicketState::new(self.status, self.assigned_to.clone())
    }

    /// Adopt a state computed by the lifecycle and start a new revision.
    pub fn apply_state(&mut self, state: TicketState, now: DateTime<Utc>) {
        let (status, assigned_to) = state.into_parts();
        self.status = status;
        self.assigned_to = assigned_to;
        self.bump(now);
    }

    /// Apply a content edit and start a new revision.
    pub fn apply_edit(&mut self, edit: TicketEdit, now: DateTime<Utc>) {
        let TicketEdit {
            title,
            description,
            priority,
            category,
        } = edit;
        if let Some(value) = title {
            self.title = value;
        }
        if let Some(value) = description {
            self.description = value;
        }
        if let Some(value) = priority {
            self.priority = value;
        }
        if let Some(value) = category {
            self.category = value;
        }
        self.bump(now);
    }

    fn bump(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.updated_at);
        self.revision = self.revision.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for ticket value types.
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn ticket() -> Ticket {
        Ticket::open(
            NewTicket {
                title: TicketTitle::new("Printer jam").expect("valid title"),
                description: TicketDescription::new("Paper stuck").expect("valid description"),
                priority: TicketPriority::Alta,
                category: TicketCategory::Impresoras,
            },
            UserId::random(),
            Utc::now(),
        )
    }

    #[rstest]
    #[case("", TicketValidationError::EmptyTitle)]
    #[case("   ", TicketValidationError::EmptyTitle)]
    fn title_rejects_blank(#[case] raw: &str, #[case] expected: TicketValidationError) {
        assert_eq!(TicketTitle::new(raw), Err(expected));
    }

    #[rstest]
    fn title_length_is_bounded_in_characters() {
        assert!(TicketTitle::new("é".repeat(TITLE_MAX)).is_ok());
        assert_eq!(
            TicketTitle::new("é".repeat(TITLE_MAX + 1)),
            Err(TicketValidationError::TitleTooLong { max: TITLE_MAX })
        );
    }

    #[rstest]
    fn title_is_trimmed() {
        let title = TicketTitle::new("  Printer jam ").expect("valid title");
        assert_eq!(title.as_ref(), "Printer jam");
    }

    #[rstest]
    fn description_is_bounded() {
        assert_eq!(
            TicketDescription::new(" \n "),
            Err(TicketValidationError::EmptyDescription)
        );
        assert_eq!(
            TicketDescription::new("x".repeat(DESCRIPTION_MAX + 1)),
            Err(TicketValidationError::DescriptionTooLong {
                max: DESCRIPTION_MAX
            })
        );
    }

    #[rstest]
    #[case("abierto", TicketStatus::Abierto)]
    #[case("en_progreso", TicketStatus::EnProgreso)]
    #[case("cerrado", TicketStatus::Cerrado)]
    fn status_parses_wire_values(#[case] raw: &str, #[case] expected: TicketStatus) {
        assert_eq!(raw.parse::<TicketStatus>(), Ok(expected));
        assert_eq!(expected.as_str(), raw);
    }

    #[rstest]
    #[case("ABIERTO")]
    #[case("closed")]
    #[case("")]
    fn status_rejects_unknown_values(#[case] raw: &str) {
        assert_eq!(
            raw.parse::<TicketStatus>(),
            Err(TicketValidationError::UnknownStatus)
        );
    }

    #[rstest]
    fn enums_serialise_to_wire_values() {
        let value = serde_json::to_value((
            TicketStatus::EnProgreso,
            TicketPriority::Baja,
            TicketCategory::Impresoras,
        ))
        .expect("serialises");
        assert_eq!(value, serde_json::json!(["en_progreso", "baja", "impresoras"]));
    }

    #[rstest]
    fn defaults_are_media_and_otro() {
        assert_eq!(TicketPriority::default(), TicketPriority::Media);
        assert_eq!(TicketCategory::default(), TicketCategory::Otro);
    }

    #[rstest]
    fn unknown_category_reports_field() {
        let err = "scanner".parse::<TicketCategory>().expect_err("unknown");
        assert_eq!(err.field(), "category");
        assert_eq!(err.code(), "unknown_category");
    }

    #[rstest]
    fn empty_edit_is_detected() {
        assert!(TicketEdit::default().is_empty());
        let edit = TicketEdit {
            priority: Some(TicketPriority::Baja),
            ..TicketEdit::default()
        };
        assert!(!edit.is_empty());
    }

    #[rstest]
    fn apply_edit_changes_only_supplied_fields(mut ticket: Ticket) {
        let before = ticket.clone();
        ticket.apply_edit(
            TicketEdit {
                category: Some(TicketCategory::Red),
                ..TicketEdit::default()
            },
            Utc::now(),
        );
        assert_eq!(ticket.category(), TicketCategory::Red);
        assert_eq!(ticket.title(), before.title());
        assert_eq!(ticket.status(), before.status());
        assert_eq!(ticket.revision(), before.revision() + 1);
    }

    #[rstest]
    fn apply_state_bumps_revision(mut ticket: Ticket) {
        let technician = UserId::random();
        ticket.apply_state(
            TicketState::new(TicketStatus::EnProgreso, Some(technician.clone())),
            Utc::now(),
        );
        assert_eq!(ticket.status(), TicketStatus::EnProgreso);
        assert_eq!(ticket.assigned_to(), Some(&technician));
        assert_eq!(ticket.revision(), 2);
    }
}
