//! Ticket state machine.
//!
//! Pure and synchronous: given the current `(status, assignment)` pair and an
//! operation it computes the next pair, or refuses. It never reads storage
//! and never checks who is asking; that is the policy's job.
//!
//! | Operation | Assignment | Status |
//! |---|---|---|
//! | `ChangeStatus(s)` | unchanged | `s` (reopening allowed) |
//! | `Assign(t)` | `t` | `en_progreso`, unless `cerrado` |
//! | `SelfAssign(t)` | `t`, fails if already assigned | as `Assign` |
//! | `Unassign` | none | `abierto`, unless `cerrado` |

use super::{Identity, Role, TicketStatus, User, UserId};

/// Proof that a user id belongs to an active technician.
///
/// Only obtainable from a loaded [`User`] or a resolved [`Identity`] whose
/// role is `tecnico`, so an assignment can never point elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Technician(UserId);

/// Why a user cannot be treated as a technician.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TechnicianError {
    #[error("user is not a technician")]
    NotTechnician,
    #[error("technician account is inactive")]
    Inactive,
}

impl Technician {
    /// Check a stored user.
    pub fn try_from_user(user: &User) -> Result<Self, TechnicianError> {
        Self::check(user.id(), user.role(), user.is_active())
    }

    /// Check the calling identity, used for self-assignment.
    pub fn try_from_identity(identity: &Identity) -> Result<Self, TechnicianError> {
        Self::check(identity.user_id(), identity.role(), identity.is_active())
    }

    fn check(id: &UserId, role: Role, active: bool) -> Result<Self, TechnicianError> {
        if role != Role::Tecnico {
            return Err(TechnicianError::NotTechnician);
        }
        if !active {
            return Err(TechnicianError::Inactive);
        }
        Ok(Self(id.clone()))
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.0
    }
}

/// The coupled `(status, assignment)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketState {
    status: TicketStatus,
    assigned_to: Option<UserId>,
}

/// Operations the state machine understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketOperation {
    ChangeStatus(TicketStatus),
    Assign(Technician),
    Unassign,
    SelfAssign(Technician),
}

impl TicketOperation {
    /// Short label used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ChangeStatus(_) => "change_status",
            Self::Assign(_) => "assign",
            Self::Unassign => "unassign",
            Self::SelfAssign(_) => "self_assign",
        }
    }
}

/// Refusals from the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("ticket is already assigned")]
    AlreadyAssigned,
}

/// Result of applying an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: TicketState,
    /// False when the operation left the pair untouched.
    pub changed: bool,
}

impl TicketState {
    #[must_use]
    pub const fn new(status: TicketStatus, assigned_to: Option<UserId>) -> Self {
        Self {
            status,
            assigned_to,
        }
    }

    #[must_use]
    pub const fn status(&self) -> TicketStatus {
        self.status
    }

    #[must_use]
    pub fn assigned_to(&self) -> Option<&UserId> {
        self.assigned_to.as_ref()
    }

    #[must_use]
    pub fn into_parts(self) -> (TicketStatus, Option<UserId>) {
        (self.status, self.assigned_to)
    }

    /// Compute the next state.
    ///
    /// # Examples
    /// ```
    /// use helpdesk::domain::ticket_lifecycle::{TicketOperation, TicketState};
    /// use helpdesk::domain::TicketStatus;
    ///
    /// let closed = TicketState::new(TicketStatus::Cerrado, None);
    /// let next = closed.apply(TicketOperation::Unassign).expect("unassign never fails");
    /// assert_eq!(next.state.status(), TicketStatus::Cerrado);
    /// assert!(!next.changed);
    /// ```
    pub fn apply(&self, operation: TicketOperation) -> Result<Transition, TransitionError> {
        let next = match operation {
            TicketOperation::ChangeStatus(status) => Self::new(status, self.assigned_to.clone()),
            TicketOperation::Assign(technician) => self.assigned(technician),
            TicketOperation::SelfAssign(technician) => {
                if self.assigned_to.is_some() {
                    return Err(TransitionError::AlreadyAssigned);
                }
                self.assigned(technician)
            }
            TicketOperation::Unassign => Self::new(
                self.keep_closed_or(TicketStatus::Abierto),
                None,
            ),
        };
        let changed = next != *self;
        Ok(Transition {
            state: next,
            changed,
        })
    }

    fn assigned(&self, technician: Technician) -> Self {
        let Technician(user_id) = technician;
        Self::new(self.keep_closed_or(TicketStatus::EnProgreso), Some(user_id))
    }

    fn keep_closed_or(&self, status: TicketStatus) -> TicketStatus {
        if self.status == TicketStatus::Cerrado {
            TicketStatus::Cerrado
        } else {
            status
        }
    }
}
