//! The two services built on the shared middleware.
//!
//! # Data Flow
//! ```text
//! user-service:    /api/users/*  ── details ──→ profile_client.rs ──→ profile-service
//! profile-service: /api/addresses/*, /api/educations/*
//! both:            /actuator/health
//! ```

pub mod error;
pub mod profile;
pub mod profile_client;
pub mod repository;
pub mod user;

use std::time::Duration;

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::config::ServiceConfig;
use crate::http::client::OutboundClient;
use crate::observability::ExchangeLogger;

pub use error::ServiceError;
pub use profile::{Address, Education, ProfileStore};
pub use profile_client::ProfileServiceClient;
pub use user::{User, UserDetailsResponse, UserService};

/// Which service this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ServiceRole {
    #[value(name = "user-service")]
    User,
    #[value(name = "profile-service")]
    Profile,
}

impl ServiceRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceRole::User => "user-service",
            ServiceRole::Profile => "profile-service",
        }
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    service: &'static str,
}

/// Routes of `role`, without middleware.
pub fn routes(
    role: ServiceRole,
    config: &ServiceConfig,
    logger: ExchangeLogger,
) -> Result<Router, url::ParseError> {
    let router = match role {
        ServiceRole::User => {
            let outbound = OutboundClient::new(logger, Duration::from_secs(config.timeouts.outbound_secs));
            let profiles = ProfileServiceClient::new(outbound, &config.profile_service.url)?;
            user::router(UserService::new(), profiles)
        }
        ServiceRole::Profile => profile::router(ProfileStore::default()),
    };

    let service = role.as_str();
    Ok(router.route(
        "/actuator/health",
        get(move || async move {
            Json(Health {
                status: "UP",
                service,
            })
        }),
    ))
}
