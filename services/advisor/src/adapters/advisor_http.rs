//! services/advisor/src/adapters/advisor_http.rs
//!
//! This module contains the adapter for the remote advisory backend.
//! It implements the `AdvisoryService` port from the `core` crate over HTTP.

use async_trait::async_trait;
use futures::TryStreamExt;
use pet_advisor_core::{
    domain::{AskRequest, PetContext},
    ports::{AdvisoryService, ByteStream, PortError, PortResult},
};
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

//=========================================================================================
// Wire Format
//=========================================================================================

/// The JSON body of `POST /ask`.
#[derive(Serialize)]
struct AskBody<'a> {
    question: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pet_profile: Option<PetProfileBody<'a>>,
}

#[derive(Serialize)]
struct PetProfileBody<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    species: &'static str,
    breed: &'a str,
    allergies: &'a [String],
}

impl<'a> From<&'a PetContext> for PetProfileBody<'a> {
    fn from(pet: &'a PetContext) -> Self {
        Self {
            name: &pet.name,
            species: pet.species.label(),
            breed: &pet.breed,
            allergies: &pet.allergies,
        }
    }
}

impl<'a> From<&'a AskRequest> for AskBody<'a> {
    fn from(request: &'a AskRequest) -> Self {
        Self {
            question: &request.question,
            pet_profile: request.pet.as_ref().map(PetProfileBody::from),
        }
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `AdvisoryService` port against the backend's `/ask` endpoint.
#[derive(Clone)]
pub struct HttpAdvisoryAdapter {
    client: Client,
    base_url: String,
}

impl HttpAdvisoryAdapter {
    /// Creates a new `HttpAdvisoryAdapter`. `base_url` must not end with a slash.
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn ask_url(&self) -> String {
        format!("{}/ask", self.base_url)
    }
}

//=========================================================================================
// `AdvisoryService` Trait Implementation
//=========================================================================================

#[async_trait]
impl AdvisoryService for HttpAdvisoryAdapter {
    /// Posts the question and hands back the response body as it arrives.
    async fn ask(&self, request: &AskRequest) -> PortResult<ByteStream> {
        let body = AskBody::from(request);

        // `json` sets `Content-Type: application/json`.
        let response = self
            .client
            .post(self.ask_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| PortError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PortError::Status(status.as_u16()));
        }
        debug!(%status, "Advisory backend accepted the question.");

        let stream = response
            .bytes_stream()
            .map_err(|e| PortError::Transport(e.to_string()));
        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pet_advisor_core::domain::{PetProfile, Species};
    use serde_json::json;

    #[test]
    fn body_omits_pet_profile_when_unmatched() {
        let request = AskRequest::new("狗狗可以吃西瓜吗？", None);
        let value = serde_json::to_value(AskBody::from(&request)).unwrap();
        assert_eq!(value, json!({ "question": "狗狗可以吃西瓜吗？" }));
    }

    #[test]
    fn body_includes_pet_profile_with_species_label() {
        let pet = PetProfile::new("旺财", Species::Dog, "金毛").with_allergies(["牛肉", "小麦"]);
        let request = AskRequest::new("旺财可以吃葡萄吗", Some(&pet));
        let value = serde_json::to_value(AskBody::from(&request)).unwrap();
        assert_eq!(
            value,
            json!({
                "question": "旺财可以吃葡萄吗",
                "pet_profile": {
                    "name": "旺财",
                    "type": "狗",
                    "breed": "金毛",
                    "allergies": ["牛肉", "小麦"]
                }
            })
        );
    }
}
