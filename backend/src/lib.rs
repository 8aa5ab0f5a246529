//! Support-ticket tracker library.
//!
//! The crate follows a hexagonal layout: [`domain`] holds entities, the
//! access policy, the ticket state machine and the services behind the
//! driving ports; [`inbound`] adapts HTTP onto those ports; [`outbound`]
//! implements the driven ports over PostgreSQL, memory and Argon2.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
