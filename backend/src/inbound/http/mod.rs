//! HTTP inbound adapter exposing REST endpoints.

pub mod auth;
pub mod comments;
pub mod error;
pub mod health;
pub mod schemas;
pub mod session;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod tickets;
pub mod users;
pub mod validation;

pub use error::ApiResult;

use actix_web::web;

/// Register every `/api/v1` handler on `cfg`.
///
/// `/users/me` is registered before `/users/{id}` so the literal segment
/// wins.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use helpdesk::inbound::http::configure_api;
///
/// let app = App::new().service(web::scope("/api/v1").configure(configure_api));
/// ```
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(users::login)
        .service(users::logout)
        .service(users::register)
        .service(users::current_user)
        .service(users::list_users)
        .service(users::create_user)
        .service(users::update_user)
        .service(users::set_user_active)
        .service(users::delete_user)
        .service(tickets::create_ticket)
        .service(tickets::list_tickets)
        .service(tickets::get_ticket)
        .service(tickets::update_ticket)
        .service(tickets::change_status)
        .service(tickets::assign_ticket)
        .service(tickets::self_assign_ticket)
        .service(comments::list_comments)
        .service(comments::add_comment)
        .service(comments::delete_comment);
}
