//! Behaviour tests for the ticket lifecycle over HTTP.
//!
//! Each scenario drives a fresh in-memory backend. The world owns an Actix
//! system runner because steps are synchronous while the service is not.
//
// rstest-bdd generates guard variables with double underscores, which trips
// the non_snake_case lint under -D warnings.
#![allow(non_snake_case)]

// Shared harness has helpers unused by some suites.
#[allow(dead_code)]
#[path = "helpdesk_support/app.rs"]
mod app;

use std::cell::RefCell;
use std::rc::Rc;

use actix_rt::SystemRunner;
use actix_web::cookie::Cookie;
use actix_web::http::Method;
use app::{ADMIN_EMAIL, Backend, Reply, login, send};
use helpdesk::domain::Role;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};

const TECNICO_EMAIL: &str = "luis@example.com";
const USUARIO_EMAIL: &str = "ana@example.com";

struct LifecycleWorld {
    system: SystemRunner,
    backend: Option<Backend>,
    technician_id: Option<String>,
    ticket_id: Option<String>,
    last: Option<Reply>,
}

type SharedWorld = Rc<RefCell<LifecycleWorld>>;

struct WorldFixture {
    world: SharedWorld,
}

impl WorldFixture {
    fn world(&self) -> SharedWorld {
        self.world.clone()
    }
}

#[fixture]
fn world() -> WorldFixture {
    WorldFixture {
        world: Rc::new(RefCell::new(LifecycleWorld {
            system: actix_rt::System::new(),
            backend: None,
            technician_id: None,
            ticket_id: None,
            last: None,
        })),
    }
}

fn backend(world: &SharedWorld) -> Backend {
    world.borrow().backend.clone().expect("backend started")
}

fn ticket_uri(world: &SharedWorld) -> String {
    let id = world.borrow().ticket_id.clone().expect("ticket reported");
    format!("/api/v1/tickets/{id}")
}

/// Send one request as `email` against a fresh app over the shared backend.
fn request_as(
    world: &SharedWorld,
    email: &str,
    method: Method,
    uri: String,
    body: Option<Value>,
) -> Reply {
    let backend = backend(world);
    let email = email.to_owned();
    let ctx = world.borrow();
    ctx.system.block_on(async move {
        let app = actix_web::test::init_service(backend.app()).await;
        let cookie: Cookie<'static> = login(&app, &email).await;
        send(&app, method, &uri, Some(&cookie), body).await
    })
}

fn record(world: &SharedWorld, reply: Reply) {
    world.borrow_mut().last = Some(reply);
}

fn claim(world: &SharedWorld) -> Reply {
    let uri = format!("{}/assign-self", ticket_uri(world));
    request_as(world, TECNICO_EMAIL, Method::PATCH, uri, None)
}

fn set_status(world: &SharedWorld, email: &str, status: &str) -> Reply {
    let uri = format!("{}/status", ticket_uri(world));
    request_as(
        world,
        email,
        Method::PATCH,
        uri,
        Some(json!({ "status": status })),
    )
}

fn current_ticket(world: &SharedWorld) -> Value {
    let uri = ticket_uri(world);
    let reply = request_as(world, ADMIN_EMAIL, Method::GET, uri, None);
    assert_eq!(reply.status, 200);
    reply.body
}

#[given("a helpdesk with an end user and a technician")]
fn a_helpdesk_with_an_end_user_and_a_technician(world: &WorldFixture) {
    let world = world.world();
    let (backend, technician_id) = world.borrow().system.block_on(async {
        let backend = Backend::start().await;
        let technician_id = backend
            .add_user(TECNICO_EMAIL, "Luis", Role::Tecnico)
            .await;
        backend
            .add_user(USUARIO_EMAIL, "Ana", Role::Usuario)
            .await;
        (backend, technician_id)
    });
    let mut ctx = world.borrow_mut();
    ctx.backend = Some(backend);
    ctx.technician_id = Some(technician_id);
}

#[given("the end user has reported a ticket")]
fn the_end_user_has_reported_a_ticket(world: &WorldFixture) {
    let world = world.world();
    let reply = request_as(
        &world,
        USUARIO_EMAIL,
        Method::POST,
        "/api/v1/tickets".to_owned(),
        Some(json!({ "title": "Screen flickers", "description": "Since Monday" })),
    );
    assert_eq!(reply.status, 201);
    let id = reply.body["id"].as_str().expect("ticket id").to_owned();
    world.borrow_mut().ticket_id = Some(id);
}

#[given("the technician has claimed the ticket")]
fn the_technician_has_claimed_the_ticket(world: &WorldFixture) {
    let reply = claim(&world.world());
    assert_eq!(reply.status, 200);
}

#[given("the technician has closed the ticket")]
fn the_technician_has_closed_the_ticket(world: &WorldFixture) {
    let reply = set_status(&world.world(), TECNICO_EMAIL, "cerrado");
    assert_eq!(reply.status, 200);
}

#[when("the technician claims the ticket")]
fn the_technician_claims_the_ticket(world: &WorldFixture) {
    let world = world.world();
    let reply = claim(&world);
    record(&world, reply);
}

#[when("the administrator unassigns the ticket")]
fn the_administrator_unassigns_the_ticket(world: &WorldFixture) {
    let world = world.world();
    let uri = format!("{}/assign", ticket_uri(&world));
    let reply = request_as(
        &world,
        ADMIN_EMAIL,
        Method::PATCH,
        uri,
        Some(json!({ "technicianId": null })),
    );
    record(&world, reply);
}

#[when("the end user sets the status to {status}")]
fn the_end_user_sets_the_status_to(world: &WorldFixture, status: String) {
    let world = world.world();
    let reply = set_status(&world, USUARIO_EMAIL, &status);
    record(&world, reply);
}

#[then("the ticket status is {status}")]
fn the_ticket_status_is(world: &WorldFixture, status: String) {
    let ticket = current_ticket(&world.world());
    assert_eq!(ticket["status"].as_str(), Some(status.as_str()));
}

#[then("the ticket is assigned to the technician")]
fn the_ticket_is_assigned_to_the_technician(world: &WorldFixture) {
    let world = world.world();
    let ticket = current_ticket(&world);
    let expected = world.borrow().technician_id.clone();
    assert_eq!(ticket["assignedTo"].as_str(), expected.as_deref());
}

#[then("the ticket is unassigned")]
fn the_ticket_is_unassigned(world: &WorldFixture) {
    let ticket = current_ticket(&world.world());
    assert!(ticket["assignedTo"].is_null());
}

#[then("the request is rejected with status {status} and reason {reason}")]
fn the_request_is_rejected(world: &WorldFixture, status: u16, reason: String) {
    let world = world.world();
    let ctx = world.borrow();
    let reply = ctx.last.as_ref().expect("a request was sent");
    assert_eq!(reply.status, status);
    assert_eq!(reply.body["details"]["reason"].as_str(), Some(reason.as_str()));
    assert_eq!(reply.body["traceId"].as_str(), reply.trace_id.as_deref());
}

#[scenario(path = "tests/features/ticket_lifecycle.feature")]
fn ticket_lifecycle_scenarios(world: WorldFixture) {
    drop(world);
}
