//! Shared fixtures for domain service tests.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{
    DisplayName, EmailAddress, Identity, NewTicket, PasswordHash, Role, Ticket, TicketCategory,
    TicketDescription, TicketPriority, TicketTitle, User, UserId, UserParts,
};

/// Clock frozen at [`fixture_timestamp`].
pub(crate) struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

pub(crate) fn fixture_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 10, 30, 0)
        .single()
        .expect("valid fixture timestamp")
}

pub(crate) fn fixture_clock() -> Arc<dyn Clock> {
    Arc::new(FixtureClock {
        utc_now: fixture_timestamp(),
    })
}

/// One active caller per role.
pub(crate) struct Cast {
    pub(crate) admin: Identity,
    pub(crate) tecnico: Identity,
    pub(crate) owner: Identity,
}

impl Cast {
    pub(crate) fn new() -> Self {
        Self {
            admin: Identity::new(UserId::random(), Role::Admin, true),
            tecnico: Identity::new(UserId::random(), Role::Tecnico, true),
            owner: Identity::new(UserId::random(), Role::Usuario, true),
        }
    }
}

pub(crate) fn new_ticket() -> NewTicket {
    NewTicket {
        title: TicketTitle::new("Printer jam").expect("valid title"),
        description: TicketDescription::new("Paper stuck in tray two").expect("valid description"),
        priority: TicketPriority::Alta,
        category: TicketCategory::Impresoras,
    }
}

pub(crate) fn open_ticket(creator: &Identity) -> Ticket {
    Ticket::open(new_ticket(), creator.user_id().clone(), fixture_timestamp())
}

/// Stored account with the given id, role and active flag.
pub(crate) fn stored_user(id: &UserId, email: &str, role: Role, active: bool) -> User {
    User::from(UserParts {
        id: id.clone(),
        email: EmailAddress::new(email).expect("valid email"),
        password_hash: PasswordHash::new("$argon2id$v=19$m=8,t=1,p=1$c2FsdA$aGFzaA")
            .expect("valid hash"),
        display_name: DisplayName::new("Marta Ruiz").expect("valid name"),
        role,
        active,
        created_at: fixture_timestamp(),
        updated_at: fixture_timestamp(),
    })
}
