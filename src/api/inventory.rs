//! Inventory and vocabulary endpoints.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::error::ApiError;
use super::request::{ApiRequest, ApiResponse, Transport};
use crate::models::deserializers::value_to_string;
use crate::models::{Camera, QueryDescriptor, Server, Site};

/// Read-only endpoints exposed by the upstream service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Health,
    Capabilities,
    Cameras,
    Sites,
    Site,
    Servers,
    EventSubtopics,
    AppearanceDescriptions,
}

impl Endpoint {
    pub const ALL: [Endpoint; 8] = [
        Endpoint::Health,
        Endpoint::Capabilities,
        Endpoint::Cameras,
        Endpoint::Sites,
        Endpoint::Site,
        Endpoint::Servers,
        Endpoint::EventSubtopics,
        Endpoint::AppearanceDescriptions,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Health => "/health",
            Endpoint::Capabilities => "/wep-capabilities",
            Endpoint::Cameras => "/cameras",
            Endpoint::Sites => "/sites",
            Endpoint::Site => "/site",
            Endpoint::Servers => "/servers",
            Endpoint::EventSubtopics => "/event-subtopics",
            Endpoint::AppearanceDescriptions => "/appearance-descriptions",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Endpoint::Health => "Health Check",
            Endpoint::Capabilities => "Web Capabilities",
            Endpoint::Cameras => "Cameras",
            Endpoint::Sites => "Sites",
            Endpoint::Site => "Site (by ID)",
            Endpoint::Servers => "Servers",
            Endpoint::EventSubtopics => "Event Subtopics",
            Endpoint::AppearanceDescriptions => "Appearance Descriptions",
        }
    }

    /// Build the request; only `Site` uses `id`.
    pub fn request(&self, id: Option<&str>) -> ApiRequest {
        let req = ApiRequest::get(self.path());
        match (self, id) {
            (Endpoint::Site, Some(id)) if !id.is_empty() => req.param("id", id),
            _ => req,
        }
    }
}

/// Fetch any read-only endpoint as-is (JSON or raw text).
pub async fn fetch_endpoint<T: Transport + ?Sized>(
    api: &T,
    endpoint: Endpoint,
    id: Option<&str>,
) -> Result<ApiResponse, ApiError> {
    api.send(endpoint.request(id)).await
}

/// `result.<key>` of a JSON body, or `result` itself when `key` is `None`.
/// Missing pieces yield `Null` so listings degrade to empty.
fn result_field(body: &Value, key: Option<&str>) -> Value {
    let result = body.get("result").cloned().unwrap_or(Value::Null);
    match key {
        Some(key) => result.get(key).cloned().unwrap_or(Value::Null),
        None => result,
    }
}

fn parse_list<T: DeserializeOwned>(value: Value) -> Vec<T> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    }
}

async fn listing<T, D>(api: &T, req: ApiRequest, key: Option<&str>) -> Result<Vec<D>, ApiError>
where
    T: Transport + ?Sized,
    D: DeserializeOwned,
{
    let path = req.path.clone();
    let body: Value = api.send(req).await?.into_json()?;
    let items = parse_list(result_field(&body, key));
    debug!("{} returned {} items", path, items.len());
    Ok(items)
}

pub async fn cameras<T: Transport + ?Sized>(api: &T) -> Result<Vec<Camera>, ApiError> {
    listing(api, Endpoint::Cameras.request(None), Some("cameras")).await
}

pub async fn servers<T: Transport + ?Sized>(api: &T) -> Result<Vec<Server>, ApiError> {
    listing(api, Endpoint::Servers.request(None), Some("servers")).await
}

pub async fn sites<T: Transport + ?Sized>(api: &T) -> Result<Vec<Site>, ApiError> {
    listing(api, Endpoint::Sites.request(None), Some("sites")).await
}

/// Fetch one site by id. Returns the raw `result` document.
pub async fn site<T: Transport + ?Sized>(api: &T, id: &str) -> Result<Value, ApiError> {
    if id.is_empty() {
        return Err(ApiError::precondition("site id is required"));
    }
    let body: Value = api.send(Endpoint::Site.request(Some(id))).await?.into_json()?;
    Ok(result_field(&body, None))
}

/// Event topic names usable as `eventTopics`.
pub async fn event_subtopics<T: Transport + ?Sized>(api: &T) -> Result<Vec<String>, ApiError> {
    let body: Value = api
        .send(Endpoint::EventSubtopics.request(None))
        .await?
        .into_json()?;
    Ok(match result_field(&body, None) {
        Value::Array(items) => items.iter().filter_map(value_to_string).collect(),
        _ => Vec::new(),
    })
}

pub async fn appearance_descriptions<T: Transport + ?Sized>(
    api: &T,
) -> Result<Vec<QueryDescriptor>, ApiError> {
    listing(api, Endpoint::AppearanceDescriptions.request(None), None).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::ScriptedTransport;
    use serde_json::json;

    #[tokio::test]
    async fn test_cameras_parses_result() {
        let api = ScriptedTransport::new();
        api.push_json(json!({"result": {"cameras": [
            {"id": "c1", "name": "Lobby"},
            {"id": "c2", "name": "Dock", "model": "H5A"}
        ]}}));

        let cams = cameras(&api).await.unwrap();
        assert_eq!(cams.len(), 2);
        assert_eq!(cams[1].extra["model"], json!("H5A"));
        assert_eq!(api.requests()[0].path, "/cameras");
    }

    #[tokio::test]
    async fn test_missing_result_is_empty() {
        let api = ScriptedTransport::new();
        api.push_json(json!({"status": "ok"}));
        assert!(servers(&api).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_site_requires_id_without_request() {
        let api = ScriptedTransport::new();
        let err = site(&api, "").await.unwrap_err();
        assert!(err.is_precondition());
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn test_site_sends_id() {
        let api = ScriptedTransport::new();
        api.push_json(json!({"result": {"id": "s1", "name": "HQ"}}));
        let doc = site(&api, "s1").await.unwrap();
        assert_eq!(doc["name"], json!("HQ"));
        assert_eq!(
            api.requests()[0].query,
            vec![("id".to_string(), "s1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_subtopics_and_descriptions() {
        let api = ScriptedTransport::new();
        api.push_json(json!({"result": ["DEVICE_FACET_START", "DEVICE_FACE_MATCH_START"]}));
        api.push_json(json!({"result": [
            {"facet": "gender", "tag": "male"},
            {"facet": "broken"}
        ]}));

        let topics = event_subtopics(&api).await.unwrap();
        assert_eq!(topics.len(), 2);
        let descriptors = appearance_descriptions(&api).await.unwrap();
        assert_eq!(descriptors, vec![QueryDescriptor::new("gender", "male")]);
    }

    #[test]
    fn test_endpoint_request_only_site_takes_id() {
        assert!(Endpoint::Cameras.request(Some("x")).query.is_empty());
        assert_eq!(Endpoint::Site.request(Some("x")).query.len(), 1);
        assert!(Endpoint::Site.request(Some("")).query.is_empty());
    }
}
