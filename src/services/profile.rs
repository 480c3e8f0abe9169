//! Profile records: addresses and educations.
//!
//! Both resources expose the same surface:
//! ```text
//! GET    /            list (optional ?page=&size=)
//! POST   /            create → 201
//! GET    /count       total
//! GET    /{id}        find → 404 if missing
//! PUT    /{id}        replace → 404 if missing
//! DELETE /{id}        delete → 204, 404 if missing
//! GET    /user/{id}   all records of a user
//! DELETE /user/{id}   delete all records of a user → 204
//! ```

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::services::error::ServiceError;
use crate::services::repository::{Entity, InMemoryRepository, PageQuery, UserOwned};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: Option<u64>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub area: Option<String>,
    pub city: Option<String>,
    pub pincode: Option<String>,
    pub user_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub id: Option<u64>,
    pub stream: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub per: Option<f64>,
    pub user_id: Option<u64>,
}

macro_rules! user_owned {
    ($ty:ty) => {
        impl Entity for $ty {
            fn id(&self) -> Option<u64> {
                self.id
            }

            fn set_id(&mut self, id: u64) {
                self.id = Some(id);
            }
        }

        impl UserOwned for $ty {
            fn user_id(&self) -> Option<u64> {
                self.user_id
            }
        }
    };
}

user_owned!(Address);
user_owned!(Education);

/// A profile resource type with its display name.
pub trait ProfileRecord: UserOwned + Serialize + DeserializeOwned {
    const NAME: &'static str;
}

impl ProfileRecord for Address {
    const NAME: &'static str = "Address";
}

impl ProfileRecord for Education {
    const NAME: &'static str = "Education";
}

/// Storage for the profile service.
#[derive(Clone, Default)]
pub struct ProfileStore {
    pub addresses: InMemoryRepository<Address>,
    pub educations: InMemoryRepository<Education>,
}

pub fn router(store: ProfileStore) -> Router {
    Router::new()
        .nest("/api/addresses", resource_router(store.addresses))
        .nest("/api/educations", resource_router(store.educations))
}

fn resource_router<T: ProfileRecord>(repo: InMemoryRepository<T>) -> Router {
    Router::new()
        .route("/", get(list::<T>).post(create::<T>))
        .route("/count", get(count::<T>))
        .route("/user/{user_id}", get(list_for_user::<T>).delete(delete_for_user::<T>))
        .route("/{id}", get(find::<T>).put(update::<T>).delete(remove::<T>))
        .with_state(repo)
}

async fn list<T: ProfileRecord>(
    State(repo): State<InMemoryRepository<T>>,
    Query(page): Query<PageQuery>,
) -> Json<Vec<T>> {
    let items = page.apply(repo.find_all());
    tracing::info!(resource = T::NAME, count = items.len(), "Listing records");
    Json(items)
}

async fn create<T: ProfileRecord>(
    State(repo): State<InMemoryRepository<T>>,
    Json(item): Json<T>,
) -> (StatusCode, Json<T>) {
    let created = repo.insert(item);
    tracing::info!(resource = T::NAME, id = ?created.id(), user_id = ?created.user_id(), "Record created");
    (StatusCode::CREATED, Json(created))
}

async fn count<T: ProfileRecord>(State(repo): State<InMemoryRepository<T>>) -> Json<usize> {
    Json(repo.count())
}

async fn find<T: ProfileRecord>(
    State(repo): State<InMemoryRepository<T>>,
    Path(id): Path<u64>,
) -> Result<Json<T>, ServiceError> {
    repo.find(id)
        .map(Json)
        .ok_or_else(|| ServiceError::not_found(T::NAME, id))
}

async fn update<T: ProfileRecord>(
    State(repo): State<InMemoryRepository<T>>,
    Path(id): Path<u64>,
    Json(mut item): Json<T>,
) -> Result<Json<T>, ServiceError> {
    if !repo.exists(id) {
        return Err(ServiceError::not_found(T::NAME, id));
    }
    item.set_id(id);
    let updated = repo.save(item);
    tracing::info!(resource = T::NAME, id, "Record updated");
    Ok(Json(updated))
}

async fn remove<T: ProfileRecord>(
    State(repo): State<InMemoryRepository<T>>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ServiceError> {
    if repo.delete(id) {
        tracing::info!(resource = T::NAME, id, "Record deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ServiceError::not_found(T::NAME, id))
    }
}

async fn list_for_user<T: ProfileRecord>(
    State(repo): State<InMemoryRepository<T>>,
    Path(user_id): Path<u64>,
) -> Json<Vec<T>> {
    let items = repo.find_by_user(user_id);
    tracing::info!(resource = T::NAME, user_id, count = items.len(), "Listing records for user");
    Json(items)
}

async fn delete_for_user<T: ProfileRecord>(
    State(repo): State<InMemoryRepository<T>>,
    Path(user_id): Path<u64>,
) -> StatusCode {
    let removed = repo.delete_by_user(user_id);
    tracing::info!(resource = T::NAME, user_id, removed, "Records deleted for user");
    StatusCode::NO_CONTENT
}
