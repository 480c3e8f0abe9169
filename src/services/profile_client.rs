//! Typed client for the profile service.

use axum::{
    body::Body,
    http::{header, Request},
};
use serde::de::DeserializeOwned;
use url::Url;

use crate::http::client::{OutboundClient, OutboundError};
use crate::services::profile::{Address, Education};

#[derive(Clone)]
pub struct ProfileServiceClient {
    client: OutboundClient,
    base_url: String,
}

impl ProfileServiceClient {
    pub fn new(client: OutboundClient, base_url: &str) -> Result<Self, url::ParseError> {
        let parsed = Url::parse(base_url)?;
        Ok(Self {
            client,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub async fn addresses_by_user(&self, user_id: u64) -> Result<Vec<Address>, OutboundError> {
        self.get_json(&format!("/api/addresses/user/{user_id}")).await
    }

    pub async fn educations_by_user(&self, user_id: u64) -> Result<Vec<Education>, OutboundError> {
        self.get_json(&format!("/api/educations/user/{user_id}")).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, OutboundError> {
        let request = Request::get(format!("{}{}", self.base_url, path))
            .header(header::ACCEPT, "application/json")
            .body(Body::empty())?;

        let response = self.client.send(request).await?;
        if !response.status().is_success() {
            return Err(OutboundError::Status(response.status()));
        }
        Ok(serde_json::from_slice(response.body())?)
    }
}
