//! Role-based authorization policy.
//!
//! [`authorize`] is the single place that decides who may do what. It is a
//! pure function of the caller's [`Identity`] and the requested [`Action`];
//! it never touches storage and never fails. Deny overrides allow and an
//! inactive account is denied before any other rule is consulted.

use serde_json::json;
use tracing::debug;

use super::{Comment, Error, ErrorCode, Identity, Role, Ticket, TicketStatus, UserId};

/// Kind of account change requested through the admin surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserChange {
    List,
    Create,
    Update,
    Activate,
    Deactivate,
    Delete,
}

/// Something a caller wants to do.
#[derive(Debug, Clone, Copy)]
pub enum Action<'a> {
    ViewTicket(&'a Ticket),
    ListTickets,
    CreateTicket,
    EditTicket(&'a Ticket),
    /// `target` is `None` when the requested status is not a known value.
    ChangeStatus { target: Option<TicketStatus> },
    /// Assign or unassign any technician.
    AssignTicket,
    SelfAssign(&'a Ticket),
    ViewComments(&'a Ticket),
    CreateComment(&'a Ticket),
    DeleteComment(&'a Comment),
    ManageUsers {
        target: Option<&'a UserId>,
        change: UserChange,
    },
}

impl Action<'_> {
    /// Short label used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ViewTicket(_) => "view_ticket",
            Self::ListTickets => "list_tickets",
            Self::CreateTicket => "create_ticket",
            Self::EditTicket(_) => "edit_ticket",
            Self::ChangeStatus { .. } => "change_status",
            Self::AssignTicket => "assign_ticket",
            Self::SelfAssign(_) => "self_assign",
            Self::ViewComments(_) => "view_comments",
            Self::CreateComment(_) => "create_comment",
            Self::DeleteComment(_) => "delete_comment",
            Self::ManageUsers { .. } => "manage_users",
        }
    }
}

/// Why an action was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenyReason {
    InactiveAccount,
    NotTicketOwner,
    StaffOnly,
    AdminOnly,
    TechnicianOnly,
    AlreadyAssigned,
    InvalidStatus,
    NotCommentOwner,
    CannotModifyOwnAccount,
}

impl DenyReason {
    /// Stable machine-readable code carried in error details.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InactiveAccount => "inactive_account",
            Self::NotTicketOwner => "not_ticket_owner",
            Self::StaffOnly => "staff_only",
            Self::AdminOnly => "admin_only",
            Self::TechnicianOnly => "technician_only",
            Self::AlreadyAssigned => "already_assigned",
            Self::InvalidStatus => "invalid_status",
            Self::NotCommentOwner => "not_comment_owner",
            Self::CannotModifyOwnAccount => "cannot_modify_own_account",
        }
    }

    /// Human-readable message.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InactiveAccount => "account is inactive",
            Self::NotTicketOwner => "ticket belongs to another user",
            Self::StaffOnly => "only technicians and administrators may do this",
            Self::AdminOnly => "only administrators may do this",
            Self::TechnicianOnly => "only technicians may self-assign tickets",
            Self::AlreadyAssigned => "ticket is already assigned",
            Self::InvalidStatus => "status must be one of abierto, en_progreso, cerrado",
            Self::NotCommentOwner => "comment belongs to another user",
            Self::CannotModifyOwnAccount => "cannot modify own account",
        }
    }

    /// Error category the denial surfaces as.
    #[must_use]
    pub const fn error_code(self) -> ErrorCode {
        match self {
            Self::InactiveAccount => ErrorCode::Unauthorized,
            Self::InvalidStatus => ErrorCode::InvalidRequest,
            Self::AlreadyAssigned => ErrorCode::InvalidOperation,
            Self::NotTicketOwner
            | Self::StaffOnly
            | Self::AdminOnly
            | Self::TechnicianOnly
            | Self::NotCommentOwner
            | Self::CannotModifyOwnAccount => ErrorCode::Forbidden,
        }
    }
}

impl From<DenyReason> for Error {
    fn from(reason: DenyReason) -> Self {
        Self::new(reason.error_code(), reason.message())
            .with_details(json!({ "reason": reason.code() }))
    }
}

/// Outcome of [`authorize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Convert a denial into the matching domain error.
    pub fn into_result(self) -> Result<(), Error> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(reason) => Err(reason.into()),
        }
    }
}

/// Which tickets a listing may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketScope {
    All,
    CreatedBy(UserId),
}

impl TicketScope {
    /// Staff see every ticket; end users see their own.
    #[must_use]
    pub fn for_identity(identity: &Identity) -> Self {
        if identity.is_staff() {
            Self::All
        } else {
            Self::CreatedBy(identity.user_id().clone())
        }
    }

    #[must_use]
    pub fn includes(&self, ticket: &Ticket) -> bool {
        match self {
            Self::All => true,
            Self::CreatedBy(user_id) => ticket.creator_id() == user_id,
        }
    }
}

/// Decide whether `identity` may perform `action`.
///
/// # Examples
/// ```
/// use helpdesk::domain::policy::{authorize, Action, Decision, DenyReason};
/// use helpdesk::domain::{Identity, Role, UserId};
///
/// let clerk = Identity::new(UserId::random(), Role::Usuario, true);
/// assert_eq!(
///     authorize(&clerk, Action::AssignTicket),
///     Decision::Deny(DenyReason::AdminOnly)
/// );
/// ```
#[must_use]
pub fn authorize(identity: &Identity, action: Action<'_>) -> Decision {
    if !identity.is_active() {
        return Decision::Deny(DenyReason::InactiveAccount);
    }
    let role = identity.role();
    match action {
        Action::ViewTicket(ticket) | Action::ViewComments(ticket) | Action::CreateComment(ticket) => {
            can_see(identity, ticket)
        }
        Action::ListTickets | Action::CreateTicket => Decision::Allow,
        Action::EditTicket(_) => staff_only(role),
        Action::ChangeStatus { target } => match (staff_only(role), target) {
            (Decision::Allow, None) => Decision::Deny(DenyReason::InvalidStatus),
            (decision, _) => decision,
        },
        Action::AssignTicket => admin_only(role),
        Action::SelfAssign(ticket) => {
            if ticket.assigned_to().is_some() {
                Decision::Deny(DenyReason::AlreadyAssigned)
            } else if role == Role::Tecnico {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::TechnicianOnly)
            }
        }
        Action::DeleteComment(comment) => {
            if role == Role::Admin || &comment.user_id == identity.user_id() {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::NotCommentOwner)
            }
        }
        Action::ManageUsers { target, change } => {
            let destructive = matches!(change, UserChange::Deactivate | UserChange::Delete);
            if destructive && target == Some(identity.user_id()) {
                Decision::Deny(DenyReason::CannotModifyOwnAccount)
            } else {
                admin_only(role)
            }
        }
    }
}

/// [`authorize`], turning a denial into the matching domain error.
///
/// Denials are logged at `debug` with their reason code.
pub fn enforce(identity: &Identity, action: Action<'_>) -> Result<(), Error> {
    let decision = authorize(identity, action);
    if let Decision::Deny(reason) = decision {
        debug!(
            user_id = %identity.user_id(),
            role = %identity.role(),
            action = action.name(),
            reason = reason.code(),
            "policy denied action"
        );
    }
    decision.into_result()
}

fn can_see(identity: &Identity, ticket: &Ticket) -> Decision {
    if identity.is_staff() || ticket.creator_id() == identity.user_id() {
        Decision::Allow
    } else {
        Decision::Deny(DenyReason::NotTicketOwner)
    }
}

const fn staff_only(role: Role) -> Decision {
    if role.is_staff() {
        Decision::Allow
    } else {
        Decision::Deny(DenyReason::StaffOnly)
    }
}

const fn admin_only(role: Role) -> Decision {
    match role {
        Role::Admin => Decision::Allow,
        Role::Tecnico | Role::Usuario => Decision::Deny(DenyReason::AdminOnly),
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
