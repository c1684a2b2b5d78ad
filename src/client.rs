use std::env;
use std::path::Path;
use std::time::{Duration, Instant};

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::types::{
    Acknowledgement, BearerToken, ChatRequest, ChatResponse, Conversation, ConversationList,
    FileList, HealthStatus, LoginForm, MAX_UPLOAD_BYTES, Registration, RequestContext,
    StoredFile, TokenResponse, UploadedFile, User,
};

/// Base address of a locally running Kris Bot API.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the Kris Bot API.
///
/// The client holds no credential of its own.  Each call takes a
/// [`RequestContext`] and attaches whatever bearer token it carries.
#[derive(Debug, Clone)]
pub struct KrisBot {
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
}

impl KrisBot {
    /// Create a new client.
    ///
    /// The base URL is read from the KRISBOT_BASE_URL environment variable,
    /// falling back to `http://localhost:8000/`.
    pub fn new() -> Result<Self> {
        Self::with_options(env::var("KRISBOT_BASE_URL").ok(), None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let base_url = Url::parse(&base_url)?;

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// The base URL every endpoint is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Exchange an email and password for a bearer token.
    ///
    /// Credentials are sent form-encoded; the email travels as `username`.
    pub async fn issue_token(&self, email: &str, password: &str) -> Result<BearerToken> {
        let url = self.endpoint("api/auth/token")?;
        let form = LoginForm {
            username: email,
            password,
        };
        let request = self
            .client
            .post(url)
            .headers(self.headers(&RequestContext::anonymous()))
            .form(&form);
        let response: TokenResponse = self.execute_json(request).await?;
        Ok(response.access_token)
    }

    /// Fetch the profile of the user `context` is authenticated as.
    pub async fn current_user(&self, context: &RequestContext) -> Result<User> {
        let url = self.endpoint("api/auth/me")?;
        let request = self.client.get(url).headers(self.headers(context));
        self.execute_json(request).await
    }

    /// Create a new account.  Does not log in.
    pub async fn register(&self, registration: &Registration) -> Result<()> {
        let url = self.endpoint("api/auth/register")?;
        let request = self
            .client
            .post(url)
            .headers(self.headers(&RequestContext::anonymous()))
            .json(registration);
        self.execute(request).await?;
        Ok(())
    }

    /// Send one chat message along with the prior conversation.
    pub async fn send_chat(
        &self,
        context: &RequestContext,
        request: &ChatRequest,
    ) -> Result<ChatResponse> {
        let url = self.endpoint("api/chat/send")?;
        let request = self
            .client
            .post(url)
            .headers(self.headers(context))
            .json(request);
        self.execute_json(request).await
    }

    /// List the conversations stored for the current user.
    pub async fn chat_history(&self, context: &RequestContext) -> Result<Vec<Conversation>> {
        let url = self.endpoint("api/chat/history")?;
        let request = self.client.get(url).headers(self.headers(context));
        let list: ConversationList = self.execute_json(request).await?;
        Ok(list.conversations)
    }

    /// Delete a stored conversation, returning the server's confirmation.
    pub async fn delete_conversation(
        &self,
        context: &RequestContext,
        conversation_id: &str,
    ) -> Result<String> {
        let mut url = self.endpoint("api/chat/history/")?;
        url.path_segments_mut()
            .map_err(|_| Error::url("base URL cannot carry a path", None))?
            .pop_if_empty()
            .push(conversation_id);
        let request = self.client.delete(url).headers(self.headers(context));
        let ack: Acknowledgement = self.execute_json(request).await?;
        Ok(ack.message)
    }

    /// Upload `contents` as a multipart file named `filename`.
    ///
    /// Bodies over [`MAX_UPLOAD_BYTES`] are refused without contacting the server.
    pub async fn upload_file(
        &self,
        context: &RequestContext,
        filename: &str,
        contents: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<UploadedFile> {
        let size = contents.len() as u64;
        if size > MAX_UPLOAD_BYTES {
            return Err(Error::payload_too_large(
                format!("{filename} is {size} bytes"),
                Some(MAX_UPLOAD_BYTES),
            ));
        }
        let mut part = Part::bytes(contents).file_name(filename.to_string());
        if let Some(content_type) = content_type {
            part = part.mime_str(content_type).map_err(|e| {
                Error::validation(
                    format!("invalid content type: {}", e),
                    Some("content_type".to_string()),
                )
            })?;
        }
        let url = self.endpoint("api/files/upload")?;
        let request = self
            .client
            .post(url)
            .headers(self.headers(context))
            .multipart(Form::new().part("file", part));
        self.execute_json(request).await
    }

    /// Upload the file at `path` under its own file name.
    pub async fn upload_path(
        &self,
        context: &RequestContext,
        path: impl AsRef<Path>,
    ) -> Result<UploadedFile> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                Error::validation("path has no usable file name", Some("path".to_string()))
            })?;
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|err| Error::io(format!("failed to stat {}", path.display()), err))?;
        if metadata.len() > MAX_UPLOAD_BYTES {
            return Err(Error::payload_too_large(
                format!("{} is {} bytes", path.display(), metadata.len()),
                Some(MAX_UPLOAD_BYTES),
            ));
        }
        let contents = tokio::fs::read(path)
            .await
            .map_err(|err| Error::io(format!("failed to read {}", path.display()), err))?;
        self.upload_file(context, filename, contents, None).await
    }

    /// List the files uploaded by the current user.
    pub async fn list_files(&self, context: &RequestContext) -> Result<Vec<StoredFile>> {
        let url = self.endpoint("api/files/list")?;
        let request = self.client.get(url).headers(self.headers(context));
        let list: FileList = self.execute_json(request).await?;
        Ok(list.files)
    }

    /// Delete an uploaded file, returning the server's confirmation.
    pub async fn delete_file(&self, context: &RequestContext, filename: &str) -> Result<String> {
        let mut url = self.endpoint("api/files/")?;
        url.path_segments_mut()
            .map_err(|_| Error::url("base URL cannot carry a path", None))?
            .pop_if_empty()
            .push(filename);
        let request = self.client.delete(url).headers(self.headers(context));
        let ack: Acknowledgement = self.execute_json(request).await?;
        Ok(ack.message)
    }

    /// Ask the server whether it is up.
    pub async fn health(&self) -> Result<HealthStatus> {
        let url = self.endpoint("health")?;
        let request = self
            .client
            .get(url)
            .headers(self.headers(&RequestContext::anonymous()));
        self.execute_json(request).await
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Headers for one request.  The bearer header is present iff the context carries a token.
    fn headers(&self, context: &RequestContext) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(authorization) = context.authorization() {
            match HeaderValue::from_str(&authorization) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(header::AUTHORIZATION, value);
                }
                Err(_) => {
                    tracing::warn!("bearer token is not a valid header value; sending without it");
                }
            }
        }
        headers
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let result = self.execute_inner(request).await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        if result.is_err() {
            CLIENT_REQUEST_ERRORS.click();
        }
        result
    }

    async fn execute_inner(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::timeout(
                    format!("Request timed out: {}", e),
                    Some(self.timeout.as_secs_f64()),
                )
            } else if e.is_connect() {
                Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
            } else {
                Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
            }
        })?;
        tracing::debug!(url = %response.url(), status = %response.status(), "krisbot response");

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }
        Ok(response)
    }

    async fn execute_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.execute(request).await?;
        response.json::<T>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };
        let error_message = error_detail(&error_body);

        match status_code {
            400 => Error::bad_request(error_message),
            401 => Error::authentication(error_message),
            403 => Error::permission(error_message),
            404 => Error::not_found(error_message),
            408 => Error::timeout(error_message, None),
            413 => Error::payload_too_large(error_message, None),
            422 => Error::validation(error_message, None),
            500 => Error::internal_server(error_message),
            502..=504 => Error::service_unavailable(error_message),
            _ => Error::api(status_code, error_message),
        }
    }
}

/// Pull the human-readable part out of an error body.
///
/// The server answers `{"detail": "..."}`, or a list of field errors for
/// validation failures.  Anything else is returned verbatim.
fn error_detail(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorResponse {
        detail: serde_json::Value,
    }

    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorResponse { detail }) => detail.to_string(),
        Err(_) => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let client = KrisBot::with_options(None, None).unwrap();
        assert_eq!(client.base_url().as_str(), DEFAULT_BASE_URL);
        assert_eq!(client.timeout(), DEFAULT_TIMEOUT);

        let client = KrisBot::with_options(
            Some("http://bot.example.com:9000".to_string()),
            Some(Duration::from_secs(5)),
        )
        .unwrap();
        assert_eq!(client.base_url().as_str(), "http://bot.example.com:9000/");
        assert_eq!(client.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn invalid_base_url() {
        let err = KrisBot::with_options(Some("not a url".to_string()), None).unwrap_err();
        assert!(matches!(err, Error::Url { .. }));
    }

    #[test]
    fn endpoints_resolve_under_prefix() {
        let client =
            KrisBot::with_options(Some("http://host/prefix".to_string()), None).unwrap();
        assert_eq!(
            client.endpoint("api/chat/send").unwrap().as_str(),
            "http://host/prefix/api/chat/send"
        );
    }

    #[test]
    fn authorization_only_with_token() {
        let client = KrisBot::with_options(None, None).unwrap();
        let anonymous = client.headers(&RequestContext::anonymous());
        assert!(anonymous.get(header::AUTHORIZATION).is_none());

        let context = RequestContext::bearer(BearerToken::new("abc"), 0);
        let headers = client.headers(&context);
        assert_eq!(headers.get(header::AUTHORIZATION).unwrap(), "Bearer abc");
        assert!(headers.get(header::AUTHORIZATION).unwrap().is_sensitive());
    }

    #[test]
    fn error_detail_shapes() {
        assert_eq!(
            error_detail(r#"{"detail":"Incorrect email or password"}"#),
            "Incorrect email or password"
        );
        assert!(error_detail(r#"{"detail":[{"loc":["body","email"]}]}"#).contains("email"));
        assert_eq!(error_detail("Bad Gateway"), "Bad Gateway");
    }

    #[tokio::test]
    async fn oversized_upload_is_refused_locally() {
        // Nothing listens here; the limit check must come first.
        let client = KrisBot::with_options(Some("http://127.0.0.1:9/".to_string()), None).unwrap();
        let contents = vec![0u8; MAX_UPLOAD_BYTES as usize + 1];
        let err = client
            .upload_file(&RequestContext::anonymous(), "big.bin", contents, None)
            .await
            .unwrap_err();
        assert!(err.is_payload_too_large());
        assert_eq!(err.status_code(), Some(413));
    }

    #[tokio::test]
    async fn upload_path_without_file_name() {
        let client = KrisBot::with_options(Some("http://127.0.0.1:9/".to_string()), None).unwrap();
        let err = client
            .upload_path(&RequestContext::anonymous(), "/")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }
}
