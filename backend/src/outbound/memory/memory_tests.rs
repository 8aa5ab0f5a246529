//! Behaviour of the in-memory store as a stand-in for Postgres.

use rstest::{fixture, rstest};

use super::*;
use crate::domain::service_test_support::{fixture_timestamp, new_ticket, stored_user};
use crate::domain::ticket_lifecycle::{Technician, TicketOperation};
use crate::domain::{CommentText, Identity, Role, TicketEdit, TicketPriority, TicketStatus};

struct Seeded {
    store: InMemoryStore,
    owner: User,
    tech: User,
}

#[fixture]
async fn seeded() -> Seeded {
    let store = InMemoryStore::new();
    let owner = stored_user(&UserId::random(), "owner@example.com", Role::Usuario, true);
    let tech = stored_user(&UserId::random(), "tech@example.com", Role::Tecnico, true);
    UserRepository::insert(&store, &owner)
        .await
        .expect("owner stored");
    UserRepository::insert(&store, &tech)
        .await
        .expect("tech stored");
    Seeded { store, owner, tech }
}

async fn stored_ticket(seeded: &Seeded) -> Ticket {
    let ticket = Ticket::open(new_ticket(), seeded.owner.id().clone(), fixture_timestamp());
    TicketRepository::insert(&seeded.store, &ticket)
        .await
        .expect("ticket stored");
    ticket
}

fn assigned_to(mut ticket: Ticket, user: &User) -> Ticket {
    let technician = Technician::try_from_user(user).expect("technician");
    let state = ticket
        .state()
        .apply(TicketOperation::Assign(technician))
        .expect("assignable")
        .state;
    ticket.apply_state(state, fixture_timestamp());
    ticket
}

fn priority_edit() -> TicketEdit {
    TicketEdit {
        priority: Some(TicketPriority::Baja),
        ..TicketEdit::default()
    }
}

#[rstest]
#[tokio::test]
async fn duplicate_emails_are_rejected(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let clash = stored_user(&UserId::random(), "owner@example.com", Role::Admin, true);

    let error = UserRepository::insert(&seeded.store, &clash)
        .await
        .expect_err("email taken");

    assert_eq!(
        error,
        UserRepositoryError::duplicate_email("owner@example.com")
    );
}

#[rstest]
#[tokio::test]
async fn save_checks_the_revision(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let mut ticket = stored_ticket(&seeded).await;
    ticket.apply_edit(priority_edit(), fixture_timestamp());

    seeded
        .store
        .save(&ticket, 1)
        .await
        .expect("first save wins");
    let error = seeded
        .store
        .save(&ticket, 1)
        .await
        .expect_err("stale revision");

    assert_eq!(
        error,
        TicketRepositoryError::revision_mismatch(1_u32, 2_u32)
    );
    let stored = TicketRepository::find_by_id(&seeded.store, &ticket.id())
        .await
        .expect("lookup")
        .expect("ticket present");
    assert_eq!(stored.revision(), 2);
    assert_eq!(stored.priority(), TicketPriority::Baja);
}

#[rstest]
#[tokio::test]
async fn saving_unknown_ticket_reports_missing(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let ticket = Ticket::open(new_ticket(), seeded.owner.id().clone(), fixture_timestamp());

    let error = seeded
        .store
        .save(&ticket, 1)
        .await
        .expect_err("never inserted");

    assert_eq!(
        error,
        TicketRepositoryError::missing(ticket.id().to_string())
    );
}

#[rstest]
#[tokio::test]
async fn tickets_need_a_known_creator(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let orphan = Ticket::open(new_ticket(), UserId::random(), fixture_timestamp());

    let error = TicketRepository::insert(&seeded.store, &orphan)
        .await
        .expect_err("unknown creator");

    assert!(matches!(error, TicketRepositoryError::Query { .. }));
}

#[rstest]
#[tokio::test]
async fn list_applies_scope_and_filter(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let first = stored_ticket(&seeded).await;
    let second = stored_ticket(&seeded).await;
    let staff = Identity::from(&seeded.tech);
    let stranger = Identity::new(UserId::random(), Role::Usuario, true);

    let all = TicketRepository::list(
        &seeded.store,
        &TicketScope::for_identity(&staff),
        &TicketFilter::default(),
    )
    .await
    .expect("list");
    let none = TicketRepository::list(
        &seeded.store,
        &TicketScope::for_identity(&stranger),
        &TicketFilter::default(),
    )
    .await
    .expect("list");
    let closed = TicketRepository::list(
        &seeded.store,
        &TicketScope::All,
        &TicketFilter {
            status: Some(TicketStatus::Cerrado),
            assigned_to: None,
        },
    )
    .await
    .expect("list");

    let mut ids: Vec<_> = all.iter().map(Ticket::id).collect();
    ids.sort_by_key(|id| *id.as_uuid());
    let mut expected = vec![first.id(), second.id()];
    expected.sort_by_key(|id| *id.as_uuid());
    assert_eq!(ids, expected);
    assert!(none.is_empty());
    assert!(closed.is_empty());
}

#[rstest]
#[tokio::test]
async fn referenced_users_cannot_be_deleted(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    stored_ticket(&seeded).await;

    let error = UserRepository::delete(&seeded.store, seeded.owner.id())
        .await
        .expect_err("creator of a ticket");
    let removed = UserRepository::delete(&seeded.store, seeded.tech.id())
        .await
        .expect("tech has no references");

    assert_eq!(
        error,
        UserRepositoryError::in_use(seeded.owner.id().as_ref())
    );
    assert!(removed);
    assert!(
        !UserRepository::delete(&seeded.store, seeded.tech.id())
            .await
            .expect("second delete")
    );
}

#[rstest]
#[tokio::test]
async fn comments_get_increasing_sequences(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let ticket = stored_ticket(&seeded).await;
    let mut stored = Vec::new();
    for text in ["first", "second"] {
        let comment = NewComment::new(
            ticket.id(),
            seeded.tech.id().clone(),
            CommentText::new(text).expect("valid text"),
            fixture_timestamp(),
        );
        stored.push(
            CommentRepository::insert(&seeded.store, comment)
                .await
                .expect("comment stored"),
        );
    }

    let listed = seeded
        .store
        .list_for_ticket(&ticket.id())
        .await
        .expect("list comments");

    assert!(stored[0].sequence < stored[1].sequence);
    let texts: Vec<&str> = listed.iter().map(|c| c.text.as_ref()).collect();
    assert_eq!(texts, ["first", "second"]);
}

#[rstest]
#[tokio::test]
async fn comments_need_a_live_ticket(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let ticket_id = TicketId::random();
    let comment = NewComment::new(
        ticket_id,
        seeded.tech.id().clone(),
        CommentText::new("hello").expect("valid text"),
        fixture_timestamp(),
    );

    let error = CommentRepository::insert(&seeded.store, comment)
        .await
        .expect_err("no ticket");

    assert_eq!(
        error,
        CommentRepositoryError::ticket_missing(ticket_id.to_string())
    );
}

#[rstest]
#[tokio::test]
async fn count_assigned_to_counts_only_that_technician(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let ticket = assigned_to(stored_ticket(&seeded).await, &seeded.tech);
    stored_ticket(&seeded).await;
    seeded.store.save(&ticket, 1).await.expect("assigned");

    assert_eq!(
        seeded
            .store
            .count_assigned_to(seeded.tech.id())
            .await
            .expect("count"),
        1
    );
    assert_eq!(
        seeded
            .store
            .count_assigned_to(seeded.owner.id())
            .await
            .expect("count"),
        0
    );
}

#[rstest]
#[case::demoted(Role::Usuario, true, |id| TicketRepositoryError::assignee_not_technician(id))]
#[case::deactivated(Role::Tecnico, false, |id| TicketRepositoryError::assignee_inactive(id))]
#[tokio::test]
async fn save_rechecks_a_new_assignee(
    #[future] seeded: Seeded,
    #[case] role: Role,
    #[case] active: bool,
    #[case] expected: fn(String) -> TicketRepositoryError,
) {
    let seeded = seeded.await;
    let ticket = assigned_to(stored_ticket(&seeded).await, &seeded.tech);
    let mut changed = seeded.tech.clone();
    changed.change_role(role, fixture_timestamp());
    changed.set_active(active, fixture_timestamp());
    UserRepository::update(&seeded.store, &changed)
        .await
        .expect("no assignments yet");

    let error = seeded
        .store
        .save(&ticket, 1)
        .await
        .expect_err("assignee no longer eligible");

    assert_eq!(error, expected(seeded.tech.id().to_string()));
    let stored = TicketRepository::find_by_id(&seeded.store, &ticket.id())
        .await
        .expect("lookup")
        .expect("ticket present");
    assert_eq!(stored.assigned_to(), None);
    assert_eq!(stored.revision(), 1);
}

#[rstest]
#[tokio::test]
async fn unchanged_assignee_is_not_rechecked(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let mut ticket = assigned_to(stored_ticket(&seeded).await, &seeded.tech);
    seeded.store.save(&ticket, 1).await.expect("assigned");
    let mut inactive = seeded.tech.clone();
    inactive.set_active(false, fixture_timestamp());
    UserRepository::update(&seeded.store, &inactive)
        .await
        .expect("deactivation keeps assignments");

    ticket.apply_edit(priority_edit(), fixture_timestamp());
    seeded
        .store
        .save(&ticket, 2)
        .await
        .expect("edit of an already assigned ticket");
}

#[rstest]
#[tokio::test]
async fn assigned_technician_cannot_be_demoted(#[future] seeded: Seeded) {
    let seeded = seeded.await;
    let ticket = assigned_to(stored_ticket(&seeded).await, &seeded.tech);
    seeded.store.save(&ticket, 1).await.expect("assigned");
    let mut demoted = seeded.tech.clone();
    demoted.change_role(Role::Usuario, fixture_timestamp());

    let error = UserRepository::update(&seeded.store, &demoted)
        .await
        .expect_err("tickets still assigned");

    assert_eq!(
        error,
        UserRepositoryError::still_assigned(seeded.tech.id().as_ref())
    );
    let stored = UserRepository::find_by_id(&seeded.store, seeded.tech.id())
        .await
        .expect("lookup")
        .expect("tech present");
    assert_eq!(stored.role(), Role::Tecnico);
}
