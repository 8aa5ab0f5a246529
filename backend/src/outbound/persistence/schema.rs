//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Accounts that can sign in.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Normalised, unique login email.
        email -> Varchar,
        /// Argon2id PHC string.
        password_hash -> Text,
        display_name -> Varchar,
        /// One of `admin`, `tecnico`, `usuario`.
        role -> Varchar,
        active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Support tickets.
    ///
    /// `revision` drives optimistic concurrency: writes are conditional on
    /// the revision the caller loaded.
    tickets (id) {
        id -> Uuid,
        title -> Varchar,
        description -> Text,
        /// One of `abierto`, `en_progreso`, `cerrado`.
        status -> Varchar,
        priority -> Varchar,
        category -> Varchar,
        creator_id -> Uuid,
        assigned_to -> Nullable<Uuid>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        revision -> Int4,
    }
}

diesel::table! {
    /// Ticket comments. Deleted with their ticket.
    comments (id) {
        id -> Uuid,
        ticket_id -> Uuid,
        user_id -> Uuid,
        text -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        /// Insertion order; breaks ties between equal `created_at` values.
        sequence -> Int8,
    }
}

diesel::joinable!(comments -> tickets (ticket_id));
diesel::joinable!(comments -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(comments, tickets, users);
