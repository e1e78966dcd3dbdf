//! REST client for the review backend.
//!
//! Every call returns [`ApiResult`]: non-2xx responses, connection failures
//! and undecodable bodies all come back as [`ApiError`].

use crate::config::{ClientConfig, CSRF_HEADER};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use vos_review_core::{
    ApiError, ApiResult, Comment, Document, DocumentContent, DocumentDiff, DocumentUpdate,
    MetaComment, NewDocument, Persona, PersonaWeightUpdate, ReviewJob, ReviewSummary,
};

/// Client for the review backend.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    pub(crate) http: Client,
    pub(crate) config: Arc<ClientConfig>,
}

impl ApiClient {
    /// Create a client from a config.
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let http = config.build_client()?;
        Ok(Self::with_http_client(config, http))
    }

    /// Create a client configured from the environment.
    pub fn from_env() -> ApiResult<Self> {
        Self::new(ClientConfig::from_env())
    }

    /// Create a client around an existing HTTP client.
    pub fn with_http_client(config: ClientConfig, http: Client) -> Self {
        Self {
            http,
            config: Arc::new(config),
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Documents
    // ------------------------------------------------------------------

    /// List documents, optionally including archived ones.
    pub async fn list_documents(&self, include_archived: bool) -> ApiResult<Vec<Document>> {
        let mut request = self.request(Method::GET, &["documents", ""])?;
        if include_archived {
            request = request.query(&[("include_archived", "true")]);
        }
        self.send_json(request, "Failed to load documents").await
    }

    /// Fetch one document.
    pub async fn get_document(&self, id: &str) -> ApiResult<Document> {
        let request = self.request(Method::GET, &["documents", id])?;
        self.send_json(request, "Failed to load document").await
    }

    /// Create a document.
    pub async fn create_document(&self, document: &NewDocument) -> ApiResult<Document> {
        let request = self.request(Method::POST, &["documents", ""])?.json(document);
        self.send_json(request, "Failed to create document").await
    }

    /// Fetch document content, at `version` if given, otherwise the latest.
    pub async fn document_content(
        &self,
        id: &str,
        version: Option<&str>,
    ) -> ApiResult<DocumentContent> {
        let mut request = self.request(Method::GET, &["documents", id, "content"])?;
        if let Some(version) = version {
            request = request.query(&[("version", version)]);
        }
        self.send_json(request, "Failed to load document content").await
    }

    /// Store new content as a new version.
    pub async fn update_document(&self, id: &str, update: &DocumentUpdate) -> ApiResult<Document> {
        let request = self.request(Method::PUT, &["documents", id])?.json(update);
        self.send_json(request, "Failed to update document").await
    }

    /// Diff two versions. `to_version` defaults to the latest.
    pub async fn document_diff(
        &self,
        id: &str,
        from_version: &str,
        to_version: Option<&str>,
    ) -> ApiResult<DocumentDiff> {
        let mut request = self
            .request(Method::GET, &["documents", id, "diff"])?
            .query(&[("from_version", from_version)]);
        if let Some(to_version) = to_version {
            request = request.query(&[("to_version", to_version)]);
        }
        self.send_json(request, "Failed to load diff").await
    }

    // ------------------------------------------------------------------
    // Personas
    // ------------------------------------------------------------------

    /// List review personas.
    pub async fn list_personas(&self) -> ApiResult<Vec<Persona>> {
        let request = self.request(Method::GET, &["personas", ""])?;
        self.send_json(request, "Failed to load personas").await
    }

    /// Fetch one persona.
    pub async fn get_persona(&self, id: &str) -> ApiResult<Persona> {
        let request = self.request(Method::GET, &["personas", id])?;
        self.send_json(request, "Failed to load persona").await
    }

    /// Change a persona's weight.
    ///
    /// Weights outside [`PersonaWeightUpdate::RANGE`] are rejected without
    /// contacting the backend.
    pub async fn update_persona_weight(&self, id: &str, weight: f64) -> ApiResult<Persona> {
        let update = PersonaWeightUpdate::new(weight).ok_or_else(|| {
            ApiError::invalid_request(format!(
                "Weight must be between {:.1} and {:.1}, got {weight}",
                PersonaWeightUpdate::RANGE.start(),
                PersonaWeightUpdate::RANGE.end(),
            ))
        })?;
        let request = self.request(Method::PATCH, &["personas", id])?.json(&update);
        self.send_json(request, "Failed to update persona").await
    }

    // ------------------------------------------------------------------
    // Reviews and jobs
    // ------------------------------------------------------------------

    /// List stored reviews of a document.
    pub async fn list_reviews(&self, document_id: &str) -> ApiResult<Vec<ReviewSummary>> {
        let request = self.request(Method::GET, &["reviews", document_id, "reviews"])?;
        self.send_json(request, "Failed to load reviews").await
    }

    /// Comments of the latest review of a document.
    pub async fn latest_comments(&self, document_id: &str) -> ApiResult<Vec<Comment>> {
        let request = self.request(
            Method::GET,
            &["reviews", document_id, "reviews", "latest", "comments"],
        )?;
        self.send_json(request, "Failed to load comments").await
    }

    /// Merged cross-persona findings of a review.
    pub async fn meta_comments(
        &self,
        document_id: &str,
        review_id: &str,
    ) -> ApiResult<Vec<MetaComment>> {
        let request = self.request(
            Method::GET,
            &["reviews", document_id, "reviews", review_id, "meta"],
        )?;
        self.send_json(request, "Failed to load meta-review").await
    }

    /// Most recent review jobs, newest first.
    pub async fn list_jobs(&self, limit: u32) -> ApiResult<Vec<ReviewJob>> {
        let request = self
            .request(Method::GET, &["jobs", ""])?
            .query(&[("limit", limit)]);
        self.send_json(request, "Failed to load jobs").await
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    /// Start a request to an API endpoint.
    ///
    /// Attaches the CSRF token to state-changing methods.
    pub(crate) fn request(&self, method: Method, segments: &[&str]) -> ApiResult<RequestBuilder> {
        let url = self.config.endpoint(segments)?;
        let needs_csrf = is_state_changing(&method);
        let mut request = self.http.request(method, url);
        if needs_csrf {
            if let Some(token) = &self.config.csrf_token {
                request = request.header(CSRF_HEADER, token);
            }
        }
        Ok(request)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        fallback: &str,
    ) -> ApiResult<T> {
        let response = request
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let success = response.status().is_success();
        let body = response.bytes().await.map_err(transport_error)?;

        if !success {
            let error = ApiError::from_body(status, &body, fallback);
            tracing::debug!(
                status,
                code = %error.code,
                detail = %error.detail,
                "API request failed"
            );
            return Err(error);
        }

        serde_json::from_slice(&body).map_err(|err| {
            ApiError::invalid_response(
                status,
                format!("{fallback}: unexpected response body ({err})"),
            )
        })
    }
}

fn is_state_changing(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// Normalize a reqwest failure that produced no response.
pub(crate) fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::transport(format!("Request timed out: {err}"))
    } else if err.is_connect() {
        ApiError::transport(format!("Connection failed: {err}"))
    } else {
        ApiError::transport(err.to_string())
    }
}
