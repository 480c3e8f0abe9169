//! Users and the aggregated user details view.
//!
//! ```text
//! GET    /api/users                list (optional ?page=&size=)
//! POST   /api/users                create → 201, 400 on duplicate username/email
//! GET    /api/users/count          total
//! GET    /api/users/{id}           find → 404 if missing
//! PUT    /api/users/{id}           update → 404 if missing, 400 on duplicate
//! DELETE /api/users/{id}           delete → 204, 404 if missing
//! GET    /api/users/{id}/details   user + addresses + educations from profile-service
//! ```

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::services::error::ServiceError;
use crate::services::profile::{Address, Education};
use crate::services::profile_client::ProfileServiceClient;
use crate::services::repository::{Entity, InMemoryRepository, PageQuery};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Option<u64>,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default)]
    pub active: bool,
}

impl Entity for User {
    fn id(&self) -> Option<u64> {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetailsResponse {
    pub id: Option<u64>,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub active: bool,
    pub addresses: Vec<Address>,
    pub educations: Vec<Education>,
}

impl UserDetailsResponse {
    fn new(user: User, addresses: Vec<Address>, educations: Vec<Education>) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            active: user.active,
            addresses,
            educations,
        }
    }
}

/// User storage with username/email uniqueness.
#[derive(Clone, Default)]
pub struct UserService {
    users: InMemoryRepository<User>,
}

impl UserService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, user: User) -> Result<User, ServiceError> {
        if self.users.any(|u| u.username == user.username) {
            return Err(ServiceError::Conflict(format!(
                "Username already exists: {}",
                user.username
            )));
        }
        if self.users.any(|u| u.email == user.email) {
            return Err(ServiceError::Conflict(format!("Email already exists: {}", user.email)));
        }
        let created = self.users.insert(user);
        tracing::info!(id = ?created.id, username = %created.username, "User created");
        Ok(created)
    }

    pub fn find(&self, id: u64) -> Result<User, ServiceError> {
        self.users.find(id).ok_or_else(|| ServiceError::not_found("User", id))
    }

    pub fn list(&self, page: PageQuery) -> Vec<User> {
        page.apply(self.users.find_all())
    }

    pub fn count(&self) -> usize {
        self.users.count()
    }

    pub fn update(&self, id: u64, mut details: User) -> Result<User, ServiceError> {
        let existing = self.find(id)?;
        if existing.username != details.username
            && self.users.any(|u| u.username == details.username)
        {
            return Err(ServiceError::Conflict(format!(
                "Username already exists: {}",
                details.username
            )));
        }
        if existing.email != details.email && self.users.any(|u| u.email == details.email) {
            return Err(ServiceError::Conflict(format!(
                "Email already exists: {}",
                details.email
            )));
        }
        details.set_id(id);
        let updated = self.users.save(details);
        tracing::info!(id, "User updated");
        Ok(updated)
    }

    pub fn delete(&self, id: u64) -> Result<(), ServiceError> {
        if self.users.delete(id) {
            tracing::info!(id, "User deleted");
            Ok(())
        } else {
            Err(ServiceError::not_found("User", id))
        }
    }
}

#[derive(Clone)]
struct UserState {
    users: UserService,
    profiles: ProfileServiceClient,
}

pub fn router(users: UserService, profiles: ProfileServiceClient) -> Router {
    Router::new()
        .route("/api/users", get(list).post(create))
        .route("/api/users/count", get(count))
        .route("/api/users/{id}", get(find).put(update).delete(remove))
        .route("/api/users/{id}/details", get(details))
        .with_state(UserState { users, profiles })
}

async fn list(State(state): State<UserState>, Query(page): Query<PageQuery>) -> Json<Vec<User>> {
    let users = state.users.list(page);
    tracing::info!(count = users.len(), "Listing users");
    Json(users)
}

async fn create(
    State(state): State<UserState>,
    Json(user): Json<User>,
) -> Result<(StatusCode, Json<User>), ServiceError> {
    let created = state.users.create(user)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn count(State(state): State<UserState>) -> Json<usize> {
    Json(state.users.count())
}

async fn find(State(state): State<UserState>, Path(id): Path<u64>) -> Result<Json<User>, ServiceError> {
    state.users.find(id).map(Json)
}

async fn update(
    State(state): State<UserState>,
    Path(id): Path<u64>,
    Json(details): Json<User>,
) -> Result<Json<User>, ServiceError> {
    state.users.update(id, details).map(Json)
}

async fn remove(State(state): State<UserState>, Path(id): Path<u64>) -> Result<StatusCode, ServiceError> {
    state.users.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Profile lookups run concurrently inside this request's task, so both
/// outbound calls carry the request's forwarded headers. A failed lookup
/// yields an empty list.
async fn details(
    State(state): State<UserState>,
    Path(id): Path<u64>,
) -> Result<Json<UserDetailsResponse>, ServiceError> {
    let user = state.users.find(id)?;

    let (addresses, educations) = futures_util::join!(
        state.profiles.addresses_by_user(id),
        state.profiles.educations_by_user(id)
    );
    let addresses = addresses.unwrap_or_else(|e| {
        tracing::error!(user_id = id, error = %e, "Failed to fetch addresses");
        Vec::new()
    });
    let educations = educations.unwrap_or_else(|e| {
        tracing::error!(user_id = id, error = %e, "Failed to fetch educations");
        Vec::new()
    });

    tracing::info!(
        user_id = id,
        addresses = addresses.len(),
        educations = educations.len(),
        "User details fetched"
    );
    Ok(Json(UserDetailsResponse::new(user, addresses, educations)))
}
