//! Agent service client adapter.
//!
//! Implements the [`agents::AgentsService`] trait over the agent service's
//! JSON REST API using `reqwest`.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** URL construction, authentication headers, pagination,
//! and mapping of HTTP statuses onto [`agents::AgentsError`] all live here. The
//! [`agents`] crate sees only [`agents::AgentsService`].
//!
//! ## Authentication
//!
//! [`Credential::from_environment`] resolves the ambient credential:
//!
//! - `PROJECT_ACCESS_TOKEN` sends `Authorization: Bearer <token>`.
//! - `PROJECT_API_KEY` sends `api-key: <key>`.
//! - With neither set, requests go out unauthenticated.
//!
//! ## Error Mapping
//!
//! | HTTP status        | Error                                    |
//! |--------------------|------------------------------------------|
//! | 404                | [`agents::AgentsError::NotFound`]        |
//! | 401, 403           | [`agents::AgentsError::Authentication`]  |
//! | other non-2xx      | [`agents::AgentsError::RemoteService`]   |
//! | no response        | [`agents::AgentsError::Transport`]       |
//! | undecodable body   | [`agents::AgentsError::InvalidResponse`] |

mod client;
mod credential;
mod wire;

pub use client::{ClientOptions, HttpAgentsClient, API_VERSION_VAR, DEFAULT_API_VERSION};
pub use credential::{Credential, ACCESS_TOKEN_VAR, API_KEY_VAR};
