use crate::models::{HierarchyNode, MuscleCategory, MuscleGroup, OrderUpdate};
use crate::storage::{clear_token, load_token, save_token};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-field validation messages reported by the backend (or the form itself).
pub(crate) type FieldErrors = BTreeMap<String, String>;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub(crate) enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request failed ({status}): {body}")]
    Http { status: u16, body: String },
    #[error("{message}")]
    Validation { message: String, fields: FieldErrors },
    #[error("Unexpected response: {0}")]
    Parse(String),
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        Self::Parse(e.to_string())
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct EnvConfig {
    pub api_url: String,
    pub log_level: String,
}

impl EnvConfig {
    pub fn new() -> Self {
        let mut config = Self {
            api_url: "http://localhost:3000/api".to_string(),
            log_level: "info".to_string(),
        };

        // Both `window.ENV.API_URL` (documented) and lower-case keys are accepted.
        if let Some(window) = web_sys::window() {
            if let Some(env) = window.get("ENV") {
                if !env.is_undefined() && env.is_object() {
                    let read = |keys: [&str; 2]| {
                        keys.into_iter().find_map(|k| {
                            js_sys::Reflect::get(&env, &k.into())
                                .ok()
                                .and_then(|v| v.as_string())
                        })
                    };

                    if let Some(url) = read(["API_URL", "api_url"]) {
                        config.api_url = url;
                    }
                    if let Some(level) = read(["LOG_LEVEL", "log_level"]) {
                        config.log_level = level;
                    }
                }
            }
        }

        config
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Every response body is wrapped as `{ "data": ... }`; a missing `data` is an empty result.
#[derive(Deserialize, Debug)]
struct Envelope<T> {
    data: Option<T>,
}

pub(crate) fn parse_envelope<T: serde::de::DeserializeOwned>(body: &str) -> ApiResult<Option<T>> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    let envelope: Envelope<T> = serde_json::from_str(body).map_err(ApiError::parse)?;
    Ok(envelope.data)
}

/// Maps a 400/422 body to `ApiError::Validation`.
///
/// Accepts `message` or `error` for the summary, and an `errors` object whose
/// values are either a message or a list of messages (first one wins).
pub(crate) fn parse_validation_error(body: &str) -> ApiError {
    let value: serde_json::Value = serde_json::from_str(body).unwrap_or_default();

    let message = value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(|v| v.as_str())
        .unwrap_or("Validation failed")
        .to_string();

    let mut fields = FieldErrors::new();
    if let Some(errors) = value.get("errors").and_then(|v| v.as_object()) {
        for (field, v) in errors {
            let msg = match v {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Array(xs) => {
                    xs.iter().find_map(|x| x.as_str()).map(str::to_string)
                }
                _ => None,
            };
            if let Some(msg) = msg {
                fields.insert(field.clone(), msg);
            }
        }
    }

    ApiError::Validation { message, fields }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GroupPayload {
    pub name: String,
    pub category: MuscleCategory,
    /// Always sent; `null` clears a stored description on update.
    pub description: Option<String>,
    /// Serialized as `null` for root groups.
    pub parent_group_id: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MoveGroupRequest {
    pub new_parent_id: Option<String>,
}

/// Muscle group endpoints. `ApiClient` talks to the backend; tests swap in a fake.
#[async_trait(?Send)]
pub(crate) trait MuscleGroupApi {
    async fn fetch_hierarchy(&self) -> ApiResult<Vec<HierarchyNode>>;
    async fn get_group(&self, id: &str) -> ApiResult<Option<MuscleGroup>>;
    async fn create_group(&self, payload: &GroupPayload) -> ApiResult<Option<MuscleGroup>>;
    async fn update_group(&self, id: &str, payload: &GroupPayload) -> ApiResult<Option<MuscleGroup>>;
    async fn delete_group(&self, id: &str) -> ApiResult<()>;
    async fn move_group(&self, id: &str, new_parent_id: Option<&str>) -> ApiResult<Option<MuscleGroup>>;
    async fn reorder_groups(&self, updates: &[OrderUpdate]) -> ApiResult<()>;
}

const GROUPS_PATH: &str = "/muscles/groups";

#[derive(Clone, Debug)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
    pub(crate) token: Option<String>,
}

impl ApiClient {
    #[cfg(test)]
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            token: None,
        }
    }

    pub fn load_from_storage() -> Self {
        Self {
            base_url: EnvConfig::new().api_url,
            token: load_token(),
        }
    }

    pub fn save_to_storage(&self) {
        if let Some(token) = &self.token {
            save_token(token);
        }
    }

    pub fn clear_storage() {
        clear_token();
    }

    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    #[cfg(test)]
    pub fn get_token(&self) -> Option<&String> {
        self.token.as_ref()
    }

    fn get_auth_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {}", t))
    }

    pub fn logout(&mut self) {
        self.token = None;
        Self::clear_storage();
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn group_path(id: &str) -> String {
        format!("{}/{}", GROUPS_PATH, urlencoding::encode(id))
    }

    /// Sends one request and unwraps the `{data}` envelope.
    ///
    /// `not_found_is_empty` turns a 404 into `Ok(None)` for lookups.
    async fn request_api<T, B>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&B>,
        not_found_is_empty: bool,
    ) -> ApiResult<Option<T>>
    where
        T: serde::de::DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let client = reqwest::Client::new();
        let url = format!("{}{}", self.base_url, path);
        let mut req = client.request(method.clone(), url);
        if let Some(header) = self.get_auth_header() {
            req = req.header("Authorization", header);
        }
        if let Some(b) = body {
            req = req.json(b);
        }

        log::debug!("[api] {} {}", method, path);
        let res = req.send().await.map_err(ApiError::network)?;
        let status = res.status();

        if status.is_success() {
            let text = res.text().await.map_err(ApiError::network)?;
            parse_envelope(&text)
        } else if status.as_u16() == 401 {
            Err(ApiError::Unauthorized)
        } else if status.as_u16() == 404 && not_found_is_empty {
            Ok(None)
        } else if status.as_u16() == 400 || status.as_u16() == 422 {
            let text = res.text().await.unwrap_or_default();
            Err(parse_validation_error(&text))
        } else {
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::Http {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait(?Send)]
impl MuscleGroupApi for ApiClient {
    async fn fetch_hierarchy(&self) -> ApiResult<Vec<HierarchyNode>> {
        let path = format!("{}/hierarchy", GROUPS_PATH);
        let nodes: Option<Vec<HierarchyNode>> = self
            .request_api(reqwest::Method::GET, &path, None::<&()>, false)
            .await?;
        Ok(nodes.unwrap_or_default())
    }

    async fn get_group(&self, id: &str) -> ApiResult<Option<MuscleGroup>> {
        self.request_api(reqwest::Method::GET, &Self::group_path(id), None::<&()>, true)
            .await
    }

    async fn create_group(&self, payload: &GroupPayload) -> ApiResult<Option<MuscleGroup>> {
        self.request_api(reqwest::Method::POST, GROUPS_PATH, Some(payload), false)
            .await
    }

    async fn update_group(&self, id: &str, payload: &GroupPayload) -> ApiResult<Option<MuscleGroup>> {
        self.request_api(reqwest::Method::PUT, &Self::group_path(id), Some(payload), false)
            .await
    }

    async fn delete_group(&self, id: &str) -> ApiResult<()> {
        self.request_api::<serde_json::Value, _>(
            reqwest::Method::DELETE,
            &Self::group_path(id),
            None::<&()>,
            false,
        )
        .await
        .map(|_| ())
    }

    async fn move_group(&self, id: &str, new_parent_id: Option<&str>) -> ApiResult<Option<MuscleGroup>> {
        let path = format!("{}/move", Self::group_path(id));
        let body = MoveGroupRequest {
            new_parent_id: new_parent_id.map(str::to_string),
        };
        self.request_api(reqwest::Method::PUT, &path, Some(&body), false)
            .await
    }

    async fn reorder_groups(&self, updates: &[OrderUpdate]) -> ApiResult<()> {
        let path = format!("{}/order", GROUPS_PATH);
        self.request_api::<serde_json::Value, _>(reqwest::Method::PUT, &path, Some(updates), false)
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_client_new() {
        let client = ApiClient::new("http://localhost:3000/api".to_string());
        assert_eq!(client.base_url, "http://localhost:3000/api");
        assert!(client.token.is_none());
        assert!(!client.is_authenticated());
    }

    #[test]
    fn test_api_client_auth_header() {
        let mut client = ApiClient::new("http://localhost:3000/api".to_string());
        assert!(client.get_auth_header().is_none());

        client.set_token("my-jwt-token".to_string());
        assert!(client.is_authenticated());
        let header = client.get_auth_header().expect("Should have auth header");
        assert_eq!(header, "Bearer my-jwt-token");
    }

    #[test]
    fn test_group_path_encodes_id() {
        assert_eq!(ApiClient::group_path("abc"), "/muscles/groups/abc");
        assert_eq!(ApiClient::group_path("a/b c"), "/muscles/groups/a%2Fb%20c");
    }

    #[test]
    fn test_envelope_missing_data_is_empty() {
        let parsed: Option<Vec<HierarchyNode>> = parse_envelope("{}").expect("should parse");
        assert!(parsed.is_none());
        let parsed: Option<Vec<HierarchyNode>> = parse_envelope("").expect("should parse");
        assert!(parsed.is_none());
        let parsed: Option<Vec<HierarchyNode>> =
            parse_envelope(r#"{"data": null}"#).expect("should parse");
        assert!(parsed.is_none());
    }

    #[test]
    fn test_envelope_with_group() {
        let body = r#"{"data": {"id": "g1", "name": "Chest", "category": "upper-body"}}"#;
        let parsed: Option<MuscleGroup> = parse_envelope(body).expect("should parse");
        let group = parsed.expect("group present");
        assert_eq!(group.name, "Chest");
        assert!(group.parent_group_id.is_none());
    }

    #[test]
    fn test_envelope_malformed_is_parse_error() {
        let err = parse_envelope::<MuscleGroup>(r#"{"data": {"id": 5}}"#).unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));
        let err = parse_envelope::<MuscleGroup>("<html>").unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));
    }

    #[test]
    fn test_validation_error_shapes() {
        let err = parse_validation_error(
            r#"{"message": "Invalid group", "errors": {"name": "Name is required", "category": ["Unknown category", "x"], "n": 3}}"#,
        );
        match err {
            ApiError::Validation { message, fields } => {
                assert_eq!(message, "Invalid group");
                assert_eq!(fields.get("name").map(String::as_str), Some("Name is required"));
                assert_eq!(fields.get("category").map(String::as_str), Some("Unknown category"));
                assert!(!fields.contains_key("n"));
            }
            other => panic!("unexpected error {other:?}"),
        }

        let err = parse_validation_error("not json");
        assert_eq!(
            err,
            ApiError::Validation {
                message: "Validation failed".to_string(),
                fields: FieldErrors::new(),
            }
        );
    }

    #[test]
    fn test_group_payload_serialization() {
        let req = GroupPayload {
            name: "Legs".to_string(),
            category: MuscleCategory::LowerBody,
            description: None,
            parent_group_id: None,
        };
        let v = serde_json::to_value(req).expect("should serialize");
        assert_eq!(
            v,
            serde_json::json!({"name": "Legs", "category": "lower-body", "description": null, "parentGroupId": null})
        );
    }

    #[test]
    fn test_cleared_description_is_sent_as_null() {
        let req = GroupPayload {
            name: "Chest".to_string(),
            category: MuscleCategory::UpperBody,
            description: None,
            parent_group_id: Some("g1".to_string()),
        };
        let v = serde_json::to_value(req).expect("should serialize");
        assert_eq!(v.get("description"), Some(&serde_json::Value::Null));

        let req = GroupPayload {
            name: "Chest".to_string(),
            category: MuscleCategory::UpperBody,
            description: Some("Pecs".to_string()),
            parent_group_id: None,
        };
        let v = serde_json::to_value(req).expect("should serialize");
        assert_eq!(v["description"], "Pecs");
    }

    #[test]
    fn test_move_request_serialization() {
        let v = serde_json::to_value(MoveGroupRequest { new_parent_id: None }).expect("should serialize");
        assert_eq!(v, serde_json::json!({"newParentId": null}));
        let v = serde_json::to_value(MoveGroupRequest {
            new_parent_id: Some("g2".to_string()),
        })
        .expect("should serialize");
        assert_eq!(v, serde_json::json!({"newParentId": "g2"}));
    }
}
