//! In-memory stand-in for the hosting service.

use async_trait::async_trait;
use shared::{AddDomainResponse, DeployResponse, DeploymentSummary, Project, RemoteId};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::api::{DeployMeta, Remote};
use crate::collect::CollectedFile;
use crate::error::{Result, RolloutError};

#[derive(Debug, Clone)]
pub struct RecordedDeploy {
    pub project_id: RemoteId,
    pub paths: Vec<String>,
    pub meta: DeployMeta,
}

#[derive(Default)]
pub struct FakeRemote {
    logged_out: AtomicBool,
    next_id: AtomicU64,
    list_calls: AtomicUsize,
    projects: Mutex<Vec<Project>>,
    created: Mutex<Vec<(Option<String>, String)>>,
    deploys: Mutex<Vec<RecordedDeploy>>,
    domains: Mutex<Vec<(RemoteId, String)>>,
    listing_error: Mutex<Option<String>>,
    deploy_error: Mutex<Option<String>>,
    domain_error: Mutex<Option<String>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn logged_out() -> Self {
        let remote = Self::default();
        remote.logged_out.store(true, Ordering::SeqCst);
        remote
    }

    fn next_id(&self) -> RemoteId {
        RemoteId::from(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn project(&self, slug: &str) -> Project {
        Project {
            id: self.next_id(),
            slug: slug.to_string(),
            name: slug.to_string(),
            status: "active".to_string(),
            created_at: None,
            description: None,
            latest_deployment: Vec::new(),
        }
    }

    /// Seed a project that already exists remotely
    pub fn add_project(&self, slug: &str) -> Project {
        let project = self.project(slug);
        self.projects.lock().unwrap().push(project.clone());
        project
    }

    pub fn delete_project(&self, id: &RemoteId) {
        self.projects.lock().unwrap().retain(|p| &p.id != id);
    }

    pub fn fail_listing(&self, message: &str) {
        *self.listing_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_deploy(&self, message: &str) {
        *self.deploy_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_domain(&self, message: &str) {
        *self.domain_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// `(name, description)` of every create call
    pub fn created(&self) -> Vec<(Option<String>, String)> {
        self.created.lock().unwrap().clone()
    }

    pub fn deploys(&self) -> Vec<RecordedDeploy> {
        self.deploys.lock().unwrap().clone()
    }

    pub fn domains(&self) -> Vec<(RemoteId, String)> {
        self.domains.lock().unwrap().clone()
    }

    /// Every remote call made so far
    pub fn call_count(&self) -> usize {
        self.list_calls() + self.created().len() + self.deploys().len() + self.domains().len()
    }
}

fn failure(slot: &Mutex<Option<String>>) -> Result<()> {
    match slot.lock().unwrap().clone() {
        Some(message) => Err(RolloutError::remote(Some(500), message)),
        None => Ok(()),
    }
}

#[async_trait]
impl Remote for FakeRemote {
    fn is_authenticated(&self) -> bool {
        !self.logged_out.load(Ordering::SeqCst)
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        failure(&self.listing_error)?;
        Ok(self.projects.lock().unwrap().clone())
    }

    async fn create_project(&self, name: Option<&str>, description: &str) -> Result<Project> {
        self.created
            .lock()
            .unwrap()
            .push((name.map(String::from), description.to_string()));

        let mut project = self.project(name.unwrap_or(""));
        if name.is_none() {
            project.slug = format!("generated-{}", project.id);
            project.name = project.slug.clone();
        }
        self.projects.lock().unwrap().push(project.clone());
        Ok(project)
    }

    async fn deploy(
        &self,
        project_id: &RemoteId,
        files: &[CollectedFile],
        meta: &DeployMeta,
    ) -> Result<DeployResponse> {
        failure(&self.deploy_error)?;

        let mut deploys = self.deploys.lock().unwrap();
        deploys.push(RecordedDeploy {
            project_id: project_id.clone(),
            paths: files.iter().map(|f| f.relative_path.clone()).collect(),
            meta: meta.clone(),
        });
        let n = deploys.len();
        Ok(DeployResponse {
            deployment_url: Some(format!("https://deploy-{}.rollout.sh", n)),
            deployment: Some(DeploymentSummary {
                id: Some(RemoteId::from(n as u64)),
                version: Some(format!("v{}", n)),
            }),
        })
    }

    async fn add_domain(&self, project_id: &RemoteId, domain: &str) -> Result<AddDomainResponse> {
        failure(&self.domain_error)?;
        self.domains
            .lock()
            .unwrap()
            .push((project_id.clone(), domain.to_string()));
        Ok(AddDomainResponse {
            verification_token: Some("verify-me".to_string()),
        })
    }

    fn project_url(&self, slug: &str) -> String {
        format!("https://{}.rollout.sh", slug)
    }
}
