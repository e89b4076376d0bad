use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

/// Identifier assigned by the hosting service.
///
/// The API is not consistent about encoding ids: projects and deployments
/// come back as JSON numbers, while some payloads use strings. Both decode
/// into the same value and compare by their textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RemoteId(String);

impl RemoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RemoteId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<u64> for RemoteId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Number(n) => n.to_string(),
        }
    }
}

impl<'de> Deserialize<'de> for RemoteId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Scalar::deserialize(deserializer).map(|s| RemoteId(s.into_string()))
    }
}

/// Accepts a string or a number (deployment versions are sent either way).
pub fn scalar_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Scalar::deserialize(deserializer).map(Scalar::into_string)
}

/// Like `#[serde(default)]`, but also for an explicit `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn optional_scalar_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Option::<Scalar>::deserialize(deserializer).map(|s| s.map(Scalar::into_string))
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub password_confirmation: &'a str,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<RemoteId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Returned by both login and register
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub user: User,
}

// ============================================================================
// Projects and deployments
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: RemoteId,
    pub slug: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Newest deployment first; the service sends at most one
    #[serde(default, deserialize_with = "null_as_default")]
    pub latest_deployment: Vec<Deployment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateProjectRequest<'a> {
    /// Left out so the service generates a name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    pub description: &'a str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectResponse {
    pub project: Project,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    pub id: RemoteId,
    #[serde(deserialize_with = "scalar_text")]
    pub version: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub file_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_size: u64,
    #[serde(default)]
    pub deployed_at: Option<String>,
    #[serde(default)]
    pub commit_hash: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
}

/// The subset of the new deployment echoed back by the deploy endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentSummary {
    #[serde(default)]
    pub id: Option<RemoteId>,
    #[serde(default, deserialize_with = "optional_scalar_text")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployResponse {
    #[serde(default)]
    pub deployment_url: Option<String>,
    #[serde(default)]
    pub deployment: Option<DeploymentSummary>,
}

// ============================================================================
// Domains
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Domain {
    pub id: RemoteId,
    pub domain: String,
    #[serde(default)]
    pub verified_at: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ssl_enabled: bool,
}

impl Domain {
    pub fn is_verified(&self) -> bool {
        self.verified_at.is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AddDomainRequest<'a> {
    pub domain: &'a str,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddDomainResponse {
    #[serde(default)]
    pub verification_token: Option<String>,
}

// ============================================================================
// Errors
// ============================================================================

/// Body of a non-2xx response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    /// Field validation errors (422)
    #[serde(default, deserialize_with = "null_as_default")]
    pub errors: BTreeMap<String, Vec<String>>,
}

// ============================================================================
// Tests
// ============================================================================
