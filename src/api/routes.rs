//! REST-shaped request routing for the synthesis service.
//!
//! Transport is left to the host: it turns an HTTP request into an [`ApiRequest`] and writes the
//! returned [`ApiResponse`] back. Paths may carry an `/api` prefix.
//!
//! | method | path | operation |
//! |---|---|---|
//! | `POST` | `/synthesis` | create |
//! | `GET` | `/synthesis/liked` | list liked by caller |
//! | `GET` | `/synthesis/mine` (or `/my`) | list owned by caller |
//! | `GET` | `/synthesis/{id}` | read |
//! | `PUT` | `/synthesis/{id}` | update transform |
//! | `DELETE` | `/synthesis/{id}` | delete |
//! | `POST` | `/synthesis/{id}/like` | toggle like |
//! | `GET` | `/hair-styles/{id}` | catalog lookup |

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Value, json};

use crate::catalog::HairStyleId;
use crate::foundation::error::{SynthError, SynthResult};
use crate::persistence::model::{SynthesisId, UserId, Visibility};
use crate::persistence::service::{NewSynthesis, SynthesisService, Upload};
use crate::transform::model::OverlayTransform;

/// HTTP method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
}

/// Transport-independent request.
#[derive(Clone, Debug)]
pub struct ApiRequest {
    /// Method.
    pub method: Method,
    /// Path without query string.
    pub path: String,
    /// Raw `Authorization` header.
    pub authorization: Option<String>,
    /// JSON body, or form fields as a JSON object.
    pub body: Value,
    /// Uploaded image (multipart field `image`).
    pub upload: Option<Upload>,
    /// Original photo (multipart field `baseImage`).
    pub base_upload: Option<Upload>,
}

impl ApiRequest {
    /// Request without body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            authorization: None,
            body: Value::Null,
            upload: None,
            base_upload: None,
        }
    }

    /// Attach a bearer token.
    pub fn bearer(mut self, token: &str) -> Self {
        self.authorization = Some(format!("Bearer {token}"));
        self
    }

    /// Attach a JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Attach an uploaded image.
    pub fn upload(mut self, upload: Upload) -> Self {
        self.upload = Some(upload);
        self
    }

    /// Attach the original photo.
    pub fn base_upload(mut self, upload: Upload) -> Self {
        self.base_upload = Some(upload);
        self
    }
}

/// Transport-independent response.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
    /// HTTP status.
    pub status: u16,
    /// JSON body.
    pub body: Value,
}

impl ApiResponse {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn created(body: Value) -> Self {
        Self { status: 201, body }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "message": message.into() }),
        }
    }
}

/// Resolves bearer credentials to users. Token issuance is someone else's job.
pub trait Authenticator: Send + Sync {
    /// Return the user behind `token`, if valid.
    fn resolve(&self, token: &str) -> Option<UserId>;
}

/// Fixed token table.
#[derive(Clone, Debug, Default)]
pub struct StaticTokens {
    tokens: HashMap<String, UserId>,
}

impl StaticTokens {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a token.
    pub fn with(mut self, token: impl Into<String>, user: UserId) -> Self {
        self.tokens.insert(token.into(), user);
        self
    }
}

impl Authenticator for StaticTokens {
    fn resolve(&self, token: &str) -> Option<UserId> {
        self.tokens.get(token).cloned()
    }
}

/// HTTP status for an error.
pub fn status_for(err: &SynthError) -> u16 {
    match err {
        SynthError::InvalidInput(_) | SynthError::Serde(_) => 400,
        SynthError::Unauthorized(_) => 401,
        SynthError::Forbidden(_) => 403,
        SynthError::NotFound(_) | SynthError::InvalidReference(_) => 404,
        SynthError::DeviceUnavailable(_) | SynthError::TransientStorage(_) => 503,
        SynthError::Other(_) => 500,
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Route<'a> {
    Create,
    Liked,
    Mine,
    Synthesis(&'a str),
    Like(&'a str),
    HairStyle(&'a str),
}

fn parse_route(method: Method, path: &str) -> Option<Route<'_>> {
    let path = path.strip_prefix("/api").unwrap_or(path);
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    let route = match (method, segments.as_slice()) {
        (Method::Post, ["synthesis"]) => Route::Create,
        (Method::Get, ["synthesis", "liked"]) => Route::Liked,
        (Method::Get, ["synthesis", "mine" | "my"]) => Route::Mine,
        (Method::Get | Method::Put | Method::Delete, ["synthesis", id]) => Route::Synthesis(*id),
        (Method::Post, ["synthesis", id, "like"]) => Route::Like(*id),
        (Method::Get, ["hair-styles", id]) => Route::HairStyle(*id),
        _ => return None,
    };
    Some(route)
}

/// Routes requests to a [`SynthesisService`].
pub struct Router {
    service: Arc<SynthesisService>,
    auth: Arc<dyn Authenticator>,
}

impl Router {
    /// Create a router.
    pub fn new(service: Arc<SynthesisService>, auth: Arc<dyn Authenticator>) -> Self {
        Self { service, auth }
    }

    /// Handle one request. Errors become JSON `{ "message": ... }` bodies.
    pub fn handle(&self, req: &ApiRequest) -> ApiResponse {
        let Some(route) = parse_route(req.method, &req.path) else {
            return ApiResponse::error(404, format!("no route for {:?} {}", req.method, req.path));
        };
        let response = self.dispatch(req, route).unwrap_or_else(|err| {
            let status = status_for(&err);
            if status >= 500 {
                tracing::warn!(path = %req.path, status, error = %err, "request failed");
            }
            ApiResponse::error(status, err.to_string())
        });
        tracing::debug!(
            method = ?req.method,
            path = %req.path,
            status = response.status,
            "request handled"
        );
        response
    }

    fn dispatch(&self, req: &ApiRequest, route: Route<'_>) -> SynthResult<ApiResponse> {
        match route {
            Route::Create => {
                let user = self.require_user(req)?;
                let new = create_payload(req)?;
                let record = self.service.create(&user, new)?;
                Ok(ApiResponse::created(json!({
                    "id": record.id,
                    "synthesis": record,
                })))
            }
            Route::Liked => {
                let user = self.require_user(req)?;
                Ok(ApiResponse::ok(serde_json::to_value(
                    self.service.list_liked_by(&user)?,
                )?))
            }
            Route::Mine => {
                let user = self.require_user(req)?;
                Ok(ApiResponse::ok(serde_json::to_value(
                    self.service.list_owned_by(&user)?,
                )?))
            }
            Route::Synthesis(id) => {
                let id = SynthesisId::parse(id)?;
                match req.method {
                    Method::Get => {
                        let viewer = self.optional_user(req)?;
                        let record = self.service.get(&id, viewer.as_ref())?;
                        Ok(ApiResponse::ok(serde_json::to_value(record)?))
                    }
                    Method::Put => {
                        let user = self.require_user(req)?;
                        let transform = transform_field(&req.body)?.ok_or_else(|| {
                            SynthError::invalid_input("request body needs a transform")
                        })?;
                        let record = self.service.update_transform(&id, &user, transform)?;
                        Ok(ApiResponse::ok(json!({ "synthesis": record })))
                    }
                    Method::Delete => {
                        let user = self.require_user(req)?;
                        self.service.delete(&id, &user)?;
                        Ok(ApiResponse::ok(json!({ "message": "synthesis deleted" })))
                    }
                    Method::Post => Err(SynthError::not_found("route")),
                }
            }
            Route::Like(id) => {
                let user = self.require_user(req)?;
                let id = SynthesisId::parse(id)?;
                let state = self.service.toggle_like(&id, &user)?;
                Ok(ApiResponse::ok(serde_json::to_value(state)?))
            }
            Route::HairStyle(id) => {
                let style = self.service.catalog().get(&HairStyleId::new(id))?;
                Ok(ApiResponse::ok(serde_json::to_value(style)?))
            }
        }
    }

    fn optional_user(&self, req: &ApiRequest) -> SynthResult<Option<UserId>> {
        match &req.authorization {
            None => Ok(None),
            Some(_) => self.require_user(req).map(Some),
        }
    }

    fn require_user(&self, req: &ApiRequest) -> SynthResult<UserId> {
        let header = req
            .authorization
            .as_deref()
            .ok_or_else(|| SynthError::unauthorized("missing bearer token"))?;
        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SynthError::unauthorized("malformed authorization header"))?;
        self.auth
            .resolve(token)
            .ok_or_else(|| SynthError::unauthorized("invalid token"))
    }
}

fn create_payload(req: &ApiRequest) -> SynthResult<NewSynthesis> {
    let composite = req
        .upload
        .clone()
        .ok_or_else(|| SynthError::invalid_input("an image upload is required"))?;
    let hair_style_id = req
        .body
        .get("hairStyleId")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SynthError::invalid_input("hairStyleId is required"))?;
    let visibility = match req.body.get("visibility") {
        Some(v) => serde_json::from_value::<Visibility>(v.clone())?,
        None => match req.body.get("isPublic").and_then(Value::as_bool) {
            Some(false) => Visibility::Private,
            _ => Visibility::Public,
        },
    };
    Ok(NewSynthesis {
        composite,
        base_image: req.base_upload.clone(),
        hair_style_id: HairStyleId::new(hair_style_id),
        transform: transform_field(&req.body)?,
        visibility,
    })
}

/// Read `transform` (or legacy `adjustments`), accepting an object or a JSON-encoded string.
fn transform_field(body: &Value) -> SynthResult<Option<OverlayTransform>> {
    let Some(raw) = body.get("transform").or_else(|| body.get("adjustments")) else {
        return Ok(None);
    };
    let transform = match raw {
        Value::Null => return Ok(None),
        Value::String(s) => serde_json::from_str(s)?,
        other => serde_json::from_value(other.clone())?,
    };
    Ok(Some(transform))
}

#[cfg(test)]
#[path = "../../tests/unit/api/routes.rs"]
mod tests;
