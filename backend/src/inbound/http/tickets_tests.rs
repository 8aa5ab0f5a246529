//! Tests for ticket handlers over the in-memory store.

use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use rstest::rstest;
use serde_json::{Value, json};

use crate::inbound::http::test_utils::{
    ADMIN_EMAIL, OTHER_USUARIO_EMAIL, TECNICO_EMAIL, TestApp, USUARIO_EMAIL, login_cookie,
};

async fn send<S, B>(app: &S, req: actix_test::TestRequest) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let res = actix_test::call_service(app, req.to_request()).await;
    let status = res.status();
    let body = actix_test::read_body(res).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("JSON body")
    };
    (status, value)
}

async fn open_ticket<S, B>(app: &S, cookie: &Cookie<'static>) -> String
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, body) = send(
        app,
        actix_test::TestRequest::post()
            .uri("/api/v1/tickets")
            .cookie(cookie.clone())
            .set_json(json!({
                "title": "Printer jams",
                "description": "Every job jams on page two",
                "priority": "alta",
                "category": "impresoras",
            })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().expect("ticket id").to_owned()
}

#[actix_web::test]
async fn create_ticket_starts_open_and_unassigned() {
    let fixture = TestApp::new().await;
    let app = fixture.service().await;
    let ana = login_cookie(&app, USUARIO_EMAIL).await;

    let (status, body) = send(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/tickets")
            .cookie(ana)
            .set_json(json!({ "title": "VPN down", "description": "Cannot connect" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "abierto");
    assert_eq!(body["priority"], "media");
    assert_eq!(body["category"], "otro");
    assert_eq!(body["assignedTo"], Value::Null);
    assert_eq!(body["creatorId"], fixture.usuario.to_string());
    assert_eq!(body["revision"], 1);
}

#[rstest]
#[case(json!({ "title": "  ", "description": "x" }), "title", "empty_title")]
#[case(json!({ "title": "t", "description": "" }), "description", "empty_description")]
#[case(
    json!({ "title": "t", "description": "x", "priority": "urgente" }),
    "priority",
    "unknown_priority"
)]
#[actix_web::test]
async fn create_ticket_reports_field_errors(
    #[case] payload: Value,
    #[case] field: &str,
    #[case] code: &str,
) {
    let fixture = TestApp::new().await;
    let app = fixture.service().await;
    let ana = login_cookie(&app, USUARIO_EMAIL).await;

    let (status, body) = send(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/tickets")
            .cookie(ana)
            .set_json(payload),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], field);
    assert_eq!(body["details"]["code"], code);
}

#[actix_web::test]
async fn anonymous_requests_are_unauthorized() {
    let fixture = TestApp::new().await;
    let app = fixture.service().await;

    let (status, body) = send(&app, actix_test::TestRequest::get().uri("/api/v1/tickets")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");
}

#[actix_web::test]
async fn end_users_only_see_their_own_tickets() {
    let fixture = TestApp::new().await;
    let app = fixture.service().await;
    let ana = login_cookie(&app, USUARIO_EMAIL).await;
    let bea = login_cookie(&app, OTHER_USUARIO_EMAIL).await;
    let luis = login_cookie(&app, TECNICO_EMAIL).await;
    let ticket = open_ticket(&app, &ana).await;

    let (get_status, get_body) = send(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!("/api/v1/tickets/{ticket}"))
            .cookie(bea.clone()),
    )
    .await;
    assert_eq!(get_status, StatusCode::FORBIDDEN);
    assert_eq!(get_body["details"]["reason"], "not_ticket_owner");

    let (_, bea_list) = send(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/tickets")
            .cookie(bea),
    )
    .await;
    assert_eq!(bea_list.as_array().map(Vec::len), Some(0));

    let (_, staff_list) = send(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/tickets")
            .cookie(luis),
    )
    .await;
    assert_eq!(staff_list.as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
async fn list_filters_by_status_and_assignee() {
    let fixture = TestApp::new().await;
    let app = fixture.service().await;
    let ana = login_cookie(&app, USUARIO_EMAIL).await;
    let admin = login_cookie(&app, ADMIN_EMAIL).await;
    let first = open_ticket(&app, &ana).await;
    open_ticket(&app, &ana).await;

    let (status, _) = send(
        &app,
        actix_test::TestRequest::patch()
            .uri(&format!("/api/v1/tickets/{first}/assign"))
            .cookie(admin.clone())
            .set_json(json!({ "technicianId": fixture.tecnico.to_string() })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, in_progress) = send(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/tickets?status=en_progreso")
            .cookie(admin.clone()),
    )
    .await;
    let (_, assigned) = send(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!("/api/v1/tickets?assignedTo={}", fixture.tecnico))
            .cookie(admin.clone()),
    )
    .await;
    let (bad_status, bad_body) = send(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/tickets?status=pendiente")
            .cookie(admin),
    )
    .await;

    for listing in [&in_progress, &assigned] {
        let items = listing.as_array().expect("array");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["id"], first.as_str());
    }
    assert_eq!(bad_status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_body["details"]["code"], "unknown_status");
}

#[actix_web::test]
async fn assignment_round_trip_keeps_closed_status() {
    let fixture = TestApp::new().await;
    let app = fixture.service().await;
    let ana = login_cookie(&app, USUARIO_EMAIL).await;
    let admin = login_cookie(&app, ADMIN_EMAIL).await;
    let ticket = open_ticket(&app, &ana).await;
    let base = format!("/api/v1/tickets/{ticket}");

    let (_, assigned) = send(
        &app,
        actix_test::TestRequest::patch()
            .uri(&format!("{base}/assign"))
            .cookie(admin.clone())
            .set_json(json!({ "technicianId": fixture.tecnico.to_string() })),
    )
    .await;
    assert_eq!(assigned["status"], "en_progreso");
    assert_eq!(assigned["assignedTo"], fixture.tecnico.to_string());

    let (_, closed) = send(
        &app,
        actix_test::TestRequest::patch()
            .uri(&format!("{base}/status"))
            .cookie(admin.clone())
            .set_json(json!({ "status": "cerrado" })),
    )
    .await;
    assert_eq!(closed["status"], "cerrado");
    assert_eq!(closed["assignedTo"], fixture.tecnico.to_string());

    let (_, unassigned) = send(
        &app,
        actix_test::TestRequest::patch()
            .uri(&format!("{base}/assign"))
            .cookie(admin)
            .set_json(json!({ "technicianId": null })),
    )
    .await;
    assert_eq!(unassigned["status"], "cerrado");
    assert_eq!(unassigned["assignedTo"], Value::Null);
    assert_eq!(unassigned["revision"], 4);
}

#[actix_web::test]
async fn assigning_a_non_technician_is_invalid_operation() {
    let fixture = TestApp::new().await;
    let app = fixture.service().await;
    let ana = login_cookie(&app, USUARIO_EMAIL).await;
    let admin = login_cookie(&app, ADMIN_EMAIL).await;
    let ticket = open_ticket(&app, &ana).await;

    let (status, body) = send(
        &app,
        actix_test::TestRequest::patch()
            .uri(&format!("/api/v1/tickets/{ticket}/assign"))
            .cookie(admin)
            .set_json(json!({ "technicianId": fixture.other_usuario.to_string() })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"]["code"], "not_a_technician");
}

#[actix_web::test]
async fn self_assign_twice_is_invalid_operation() {
    let fixture = TestApp::new().await;
    let app = fixture.service().await;
    let ana = login_cookie(&app, USUARIO_EMAIL).await;
    let luis = login_cookie(&app, TECNICO_EMAIL).await;
    let ticket = open_ticket(&app, &ana).await;
    let uri = format!("/api/v1/tickets/{ticket}/assign-self");

    let (first_status, first) = send(
        &app,
        actix_test::TestRequest::patch()
            .uri(&uri)
            .cookie(luis.clone()),
    )
    .await;
    let (second_status, second) = send(
        &app,
        actix_test::TestRequest::patch().uri(&uri).cookie(luis),
    )
    .await;

    assert_eq!(first_status, StatusCode::OK);
    assert_eq!(first["assignedTo"], fixture.tecnico.to_string());
    assert_eq!(first["status"], "en_progreso");
    assert_eq!(second_status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(second["details"]["reason"], "already_assigned");
}

#[rstest]
#[case(USUARIO_EMAIL, "technician_only")]
#[case(ADMIN_EMAIL, "technician_only")]
#[actix_web::test]
async fn only_technicians_self_assign(#[case] email: &str, #[case] reason: &str) {
    let fixture = TestApp::new().await;
    let app = fixture.service().await;
    let ana = login_cookie(&app, USUARIO_EMAIL).await;
    let ticket = open_ticket(&app, &ana).await;
    let caller = login_cookie(&app, email).await;

    let (status, body) = send(
        &app,
        actix_test::TestRequest::patch()
            .uri(&format!("/api/v1/tickets/{ticket}/assign-self"))
            .cookie(caller),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["details"]["reason"], reason);
}

#[actix_web::test]
async fn status_changes_are_staff_only_and_validated() {
    let fixture = TestApp::new().await;
    let app = fixture.service().await;
    let ana = login_cookie(&app, USUARIO_EMAIL).await;
    let luis = login_cookie(&app, TECNICO_EMAIL).await;
    let ticket = open_ticket(&app, &ana).await;
    let uri = format!("/api/v1/tickets/{ticket}/status");

    let (owner_status, _) = send(
        &app,
        actix_test::TestRequest::patch()
            .uri(&uri)
            .cookie(ana)
            .set_json(json!({ "status": "cerrado" })),
    )
    .await;
    let (bad_status, bad_body) = send(
        &app,
        actix_test::TestRequest::patch()
            .uri(&uri)
            .cookie(luis)
            .set_json(json!({ "status": "resuelto" })),
    )
    .await;

    assert_eq!(owner_status, StatusCode::FORBIDDEN);
    assert_eq!(bad_status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_body["details"]["reason"], "invalid_status");
}

#[actix_web::test]
async fn staff_edit_changes_only_given_fields() {
    let fixture = TestApp::new().await;
    let app = fixture.service().await;
    let ana = login_cookie(&app, USUARIO_EMAIL).await;
    let luis = login_cookie(&app, TECNICO_EMAIL).await;
    let ticket = open_ticket(&app, &ana).await;
    let uri = format!("/api/v1/tickets/{ticket}");

    let (status, body) = send(
        &app,
        actix_test::TestRequest::patch()
            .uri(&uri)
            .cookie(luis.clone())
            .set_json(json!({ "priority": "baja" })),
    )
    .await;
    let (empty_status, _) = send(
        &app,
        actix_test::TestRequest::patch()
            .uri(&uri)
            .cookie(luis)
            .set_json(json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["priority"], "baja");
    assert_eq!(body["title"], "Printer jams");
    assert_eq!(body["revision"], 2);
    assert_eq!(empty_status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn unknown_and_malformed_ticket_ids() {
    let fixture = TestApp::new().await;
    let app = fixture.service().await;
    let admin = login_cookie(&app, ADMIN_EMAIL).await;

    let (missing, missing_body) = send(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/tickets/3fa85f64-5717-4562-b3fc-2c963f66afa6")
            .cookie(admin.clone()),
    )
    .await;
    let (malformed, _) = send(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/tickets/42")
            .cookie(admin),
    )
    .await;

    assert_eq!(missing, StatusCode::NOT_FOUND);
    assert_eq!(missing_body["details"]["code"], "ticket_not_found");
    assert_eq!(malformed, StatusCode::BAD_REQUEST);
}
