//! HTTP client for the hosting API.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{header, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    AddDomainRequest, AddDomainResponse, ApiErrorBody, AuthResponse, CreateProjectRequest,
    CreateProjectResponse, DeployResponse, Deployment, Domain, LoginRequest, Project,
    RegisterRequest, RemoteId,
};

use crate::collect::CollectedFile;
use crate::config::Settings;
use crate::error::{Result, RolloutError};
use crate::session::{Session, SessionStore};

pub const NOT_LOGGED_IN: &str = "Please login first: rollout login";

/// Git metadata attached to an upload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployMeta {
    pub commit_hash: Option<String>,
    pub branch: Option<String>,
}

/// The calls deploying needs from the hosting service
#[async_trait]
pub trait Remote: Send + Sync {
    fn is_authenticated(&self) -> bool;

    async fn list_projects(&self) -> Result<Vec<Project>>;

    /// `name: None` lets the service generate one
    async fn create_project(&self, name: Option<&str>, description: &str) -> Result<Project>;

    async fn deploy(
        &self,
        project_id: &RemoteId,
        files: &[CollectedFile],
        meta: &DeployMeta,
    ) -> Result<DeployResponse>;

    async fn add_domain(&self, project_id: &RemoteId, domain: &str) -> Result<AddDomainResponse>;

    /// Public URL of a project
    fn project_url(&self, slug: &str) -> String;
}

pub struct ApiClient {
    http: reqwest::Client,
    settings: Settings,
    session: Session,
    store: SessionStore,
}

impl ApiClient {
    /// Build a client carrying whatever session `store` holds
    pub fn new(settings: Settings, store: SessionStore) -> Result<Self> {
        let session = store.load();
        Self::with_session(settings, store, session)
    }

    pub fn with_session(settings: Settings, store: SessionStore, session: Session) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("rollout-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            settings,
            session,
            store,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_store(&self) -> &SessionStore {
        &self.store
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.api_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Persist a fresh token and use it for the following requests
    fn set_token(&mut self, token: &str) -> Result<()> {
        self.store.save(token)?;
        self.session = Session::new(token);
        Ok(())
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<AuthResponse> {
        let resp = self
            .request(Method::POST, "/auth/login")
            .json(&LoginRequest { email, password })
            .send()
            .await?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            return Err(RolloutError::remote(Some(401), "Invalid email or password"));
        }
        let auth: AuthResponse = expect_success(resp, "Login failed").await?.json().await?;
        self.set_token(&auth.token)?;
        tracing::info!("Logged in as {}", auth.user.name);
        Ok(auth)
    }

    pub async fn register(&mut self, name: &str, email: &str, password: &str) -> Result<AuthResponse> {
        let resp = self
            .request(Method::POST, "/auth/register")
            .json(&RegisterRequest {
                name,
                email,
                password,
                password_confirmation: password,
            })
            .send()
            .await?;

        if resp.status() == StatusCode::UNPROCESSABLE_ENTITY {
            let (_, body) = read_error(resp).await;
            return Err(RolloutError::remote(Some(422), registration_message(&body)));
        }
        let auth: AuthResponse = expect_success(resp, "Registration failed").await?.json().await?;
        self.set_token(&auth.token)?;
        Ok(auth)
    }

    /// Revoke the token remotely (best effort) and forget it locally.
    pub async fn logout(&mut self) {
        if self.session.is_authenticated() {
            match self.request(Method::POST, "/auth/logout").send().await {
                Ok(resp) if !resp.status().is_success() => {
                    tracing::debug!("Remote logout returned {}", resp.status());
                }
                Err(e) => tracing::debug!("Remote logout failed: {}", e),
                Ok(_) => {}
            }
        }

        self.session = Session::anonymous();
        if let Err(e) = self.store.clear() {
            tracing::warn!("Could not remove session file: {}", e);
        }
    }

    pub async fn list_deployments(&self, project_id: &RemoteId, limit: usize) -> Result<Vec<Deployment>> {
        let resp = self
            .request(Method::GET, &format!("/projects/{}/deployments", project_id))
            .query(&[("limit", limit)])
            .send()
            .await?;
        Ok(expect_success(resp, "Failed to fetch deployments").await?.json().await?)
    }

    pub async fn get_deployment_status(
        &self,
        project_id: &RemoteId,
        deployment_id: &str,
    ) -> Result<Deployment> {
        let resp = self
            .request(
                Method::GET,
                &format!("/projects/{}/deployments/{}", project_id, deployment_id),
            )
            .send()
            .await?;
        Ok(expect_success(resp, "Failed to fetch deployment status")
            .await?
            .json()
            .await?)
    }

    pub async fn remove_domain(&self, project_id: &RemoteId, domain_id: &RemoteId) -> Result<()> {
        let resp = self
            .request(
                Method::DELETE,
                &format!("/projects/{}/domains/{}", project_id, domain_id),
            )
            .send()
            .await?;
        expect_success(resp, "Failed to remove domain").await?;
        Ok(())
    }

    pub async fn list_domains(&self, project_id: &RemoteId) -> Result<Vec<Domain>> {
        let resp = self
            .request(Method::GET, &format!("/projects/{}/domains", project_id))
            .send()
            .await?;
        Ok(expect_success(resp, "Failed to fetch domains").await?.json().await?)
    }

    /// Find a project by slug
    pub async fn find_project(&self, slug: &str) -> Result<Option<Project>> {
        let projects = self.list_projects().await?;
        Ok(projects.into_iter().find(|p| p.slug == slug))
    }
}

#[async_trait]
impl Remote for ApiClient {
    fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        let resp = self.request(Method::GET, "/projects").send().await?;
        Ok(expect_success(resp, "Failed to fetch projects").await?.json().await?)
    }

    async fn create_project(&self, name: Option<&str>, description: &str) -> Result<Project> {
        let resp = self
            .request(Method::POST, "/projects")
            .json(&CreateProjectRequest { name, description })
            .send()
            .await?;
        let created: CreateProjectResponse = expect_success(resp, "Failed to create project")
            .await?
            .json()
            .await?;
        Ok(created.project)
    }

    async fn deploy(
        &self,
        project_id: &RemoteId,
        files: &[CollectedFile],
        meta: &DeployMeta,
    ) -> Result<DeployResponse> {
        let mut form = Form::new();
        for file in files {
            form = form.part(
                "files[]",
                Part::bytes(file.content.clone()).file_name(file.relative_path.clone()),
            );
        }
        if let Some(hash) = &meta.commit_hash {
            form = form.text("commit_hash", hash.clone());
        }
        if let Some(branch) = &meta.branch {
            form = form.text("branch", branch.clone());
        }

        tracing::debug!("Uploading {} files to project {}", files.len(), project_id);
        let resp = self
            .request(Method::POST, &format!("/projects/{}/deploy", project_id))
            .multipart(form)
            .send()
            .await?;
        lenient_body(expect_success(resp, "Deployment failed").await?).await
    }

    async fn add_domain(&self, project_id: &RemoteId, domain: &str) -> Result<AddDomainResponse> {
        let resp = self
            .request(Method::POST, &format!("/projects/{}/domains", project_id))
            .json(&AddDomainRequest { domain })
            .send()
            .await?;
        lenient_body(expect_success(resp, "Failed to add domain").await?).await
    }

    fn project_url(&self, slug: &str) -> String {
        self.settings.project_url(slug)
    }
}

/// Pass 2xx responses through; turn anything else into `RolloutError::Remote`.
async fn expect_success(resp: Response, fallback: &str) -> Result<Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let (status, body) = read_error(resp).await;
    if status == StatusCode::UNAUTHORIZED {
        return Err(RolloutError::remote(Some(401), NOT_LOGGED_IN));
    }
    let message = body
        .message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string());
    Err(RolloutError::remote(Some(status.as_u16()), message))
}

/// Decode a 2xx body whose fields are all optional. The request has already
/// taken effect, so an empty or non-JSON body reads as the default.
async fn lenient_body<T: DeserializeOwned + Default>(resp: Response) -> Result<T> {
    let bytes = resp.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    Ok(serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        tracing::warn!("Ignoring unparseable response body: {}", e);
        T::default()
    }))
}

async fn read_error(resp: Response) -> (StatusCode, ApiErrorBody) {
    let status = resp.status();
    let body = resp.json::<ApiErrorBody>().await.unwrap_or_default();
    tracing::debug!("API error {}: {:?}", status, body);
    (status, body)
}

fn registration_message(body: &ApiErrorBody) -> String {
    if body.errors.contains_key("email") {
        return "Email already exists or is invalid".to_string();
    }
    if body.errors.contains_key("password") {
        return "Password requirements not met".to_string();
    }
    let details: Vec<&str> = body
        .errors
        .values()
        .flatten()
        .map(String::as_str)
        .collect();
    format!("Validation failed: {}", details.join(", "))
}
