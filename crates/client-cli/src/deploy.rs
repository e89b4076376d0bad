//! One deployment of a folder: checks, collection, resolution, upload, and
//! the local bookkeeping that follows a successful upload.

use chrono::Utc;
use shared::{AddDomainResponse, Project};
use std::path::Path;

use crate::api::{DeployMeta, Remote, NOT_LOGGED_IN};
use crate::collect::{collect_files, total_size};
use crate::error::{LocalStateError, Result, RolloutError};
use crate::history::{DeploymentRecord, HistoryStore, STATUS_SUCCESS};
use crate::project::{link_path, LinkStore, ProjectLink};
use crate::resolver::{resolve_project, validate_project_name, Resolution};

#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    /// Requested project slug
    pub project: Option<String>,
    pub commit: Option<String>,
    pub branch: Option<String>,
    /// Custom domain to attach after the upload
    pub domain: Option<String>,
}

#[derive(Debug)]
pub struct DeployOutcome {
    pub project: Project,
    pub resolution: Resolution,
    pub project_url: String,
    pub deployment_url: Option<String>,
    pub record: DeploymentRecord,
    /// Outcome of attaching the requested custom domain. A failure here does
    /// not undo the deployment.
    pub domain: Option<Result<AddDomainResponse>>,
    /// Local bookkeeping that failed; the deployment itself succeeded
    pub warnings: Vec<LocalStateError>,
}

pub struct Deployer<'a, R: ?Sized, L, H> {
    remote: &'a R,
    links: &'a L,
    history: &'a H,
    session_file: Option<&'a Path>,
}

impl<'a, R, L, H> Deployer<'a, R, L, H>
where
    R: Remote + ?Sized,
    L: LinkStore,
    H: HistoryStore,
{
    pub fn new(remote: &'a R, links: &'a L, history: &'a H) -> Self {
        Self {
            remote,
            links,
            history,
            session_file: None,
        }
    }

    /// Never put a project link on top of the stored login session. The two
    /// share a path when deploying the home directory.
    pub fn with_session_file(mut self, path: &'a Path) -> Self {
        self.session_file = Some(path);
        self
    }

    fn link_is_session(&self, dir: &Path) -> bool {
        self.session_file
            .is_some_and(|session| is_same_file(&link_path(dir), session))
    }

    /// Everything that can be rejected without talking to the service
    fn check_preconditions(&self, dir: &Path, options: &DeployOptions) -> Result<()> {
        if !self.remote.is_authenticated() {
            return Err(RolloutError::precondition(NOT_LOGGED_IN));
        }
        if !dir.exists() {
            return Err(RolloutError::precondition(format!(
                "Folder not found: {}",
                dir.display()
            )));
        }
        if !dir.is_dir() {
            return Err(RolloutError::precondition(format!(
                "Not a folder: {}",
                dir.display()
            )));
        }
        let mut entries = std::fs::read_dir(dir).map_err(|source| RolloutError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        if entries.next().is_none() {
            return Err(RolloutError::precondition("Folder is empty"));
        }
        if let Some(name) = &options.project {
            validate_project_name(name)?;
        }
        Ok(())
    }

    pub async fn deploy(&self, dir: &Path, options: &DeployOptions) -> Result<DeployOutcome> {
        self.check_preconditions(dir, options)?;

        let files = collect_files(dir)?;
        if files.is_empty() {
            return Err(RolloutError::precondition(format!(
                "No deployable files in {}",
                dir.display()
            )));
        }
        let size = total_size(&files);
        tracing::info!("Deploying {} files ({} bytes) from {:?}", files.len(), size, dir);

        let mut warnings = Vec::new();

        let link_is_session = self.link_is_session(dir);

        // An unreadable link counts as no link
        let link = if link_is_session {
            None
        } else {
            self.links.read(dir).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable project link: {}", e);
                warnings.push(e);
                None
            })
        };

        let resolved =
            resolve_project(self.remote, dir, link.as_ref(), options.project.as_deref()).await?;
        let project = resolved.project;

        let meta = DeployMeta {
            commit_hash: options.commit.clone(),
            branch: options.branch.clone(),
        };
        let response = self.remote.deploy(&project.id, &files, &meta).await?;

        let deployed_at = Utc::now();
        let project_url = self.remote.project_url(&project.slug);
        let summary = response.deployment.unwrap_or_default();
        let record = DeploymentRecord {
            id: summary
                .id
                .map(|id| id.to_string())
                .unwrap_or_else(|| format!("deployment-{}", deployed_at.timestamp_millis())),
            version: summary.version.unwrap_or_else(|| "unknown".to_string()),
            status: STATUS_SUCCESS.to_string(),
            url: response
                .deployment_url
                .clone()
                .unwrap_or_else(|| project_url.clone()),
            deployed_at,
            file_count: files.len(),
            total_size_bytes: size,
        };

        // Remote state is authoritative from here on
        if link_is_session {
            let e = LocalStateError::SessionFile {
                path: link_path(dir),
            };
            tracing::warn!("{}", e);
            warnings.push(e);
        } else if let Err(e) = self
            .links
            .write(dir, &ProjectLink::from_project(&project, deployed_at))
        {
            tracing::warn!("Could not save project link: {}", e);
            warnings.push(e);
        }
        match self.history.append(dir, record.clone()) {
            Ok(None) => {}
            Ok(Some(discarded)) => warnings.push(discarded),
            Err(e) => {
                tracing::warn!("Could not record deployment: {}", e);
                warnings.push(e);
            }
        }

        let domain = match &options.domain {
            Some(domain) => {
                let added = self.remote.add_domain(&project.id, domain).await;
                if let Err(e) = &added {
                    tracing::warn!("Could not attach domain {}: {}", domain, e);
                }
                Some(added)
            }
            None => None,
        };

        Ok(DeployOutcome {
            project,
            resolution: resolved.resolution,
            project_url,
            deployment_url: response.deployment_url,
            record,
            domain,
            warnings,
        })
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    let parent = |p: &Path| p.parent().and_then(|d| d.canonicalize().ok());
    match (parent(a), parent(b)) {
        (Some(da), Some(db)) => da == db && a.file_name() == b.file_name(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{FileHistoryStore, MemoryHistoryStore};
    use crate::project::{link_path, FileLinkStore, MemoryLinkStore};
    use crate::testing::FakeRemote;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    struct BrokenLinks;

    impl LinkStore for BrokenLinks {
        fn read(&self, _dir: &Path) -> std::result::Result<Option<ProjectLink>, LocalStateError> {
            Ok(None)
        }

        fn write(&self, dir: &Path, _link: &ProjectLink) -> std::result::Result<(), LocalStateError> {
            Err(LocalStateError::io(
                dir,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            ))
        }
    }

    fn site() -> TempDir {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<h1>demo</h1>").unwrap();
        fs::create_dir_all(dir.path().join("css")).unwrap();
        fs::write(dir.path().join("css/site.css"), "h1{}").unwrap();
        dir
    }

    fn named(name: &str) -> DeployOptions {
        DeployOptions {
            project: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_first_deploy_creates_project_and_local_state() {
        let dir = site();
        let remote = FakeRemote::new();
        let deployer = Deployer::new(&remote, &FileLinkStore, &FileHistoryStore);

        let outcome = deployer.deploy(dir.path(), &named("demo")).await.unwrap();

        assert_eq!(outcome.resolution, Resolution::Created);
        assert_eq!(outcome.project.slug, "demo");
        assert!(outcome.warnings.is_empty());

        let link = FileLinkStore.read(dir.path()).unwrap().unwrap();
        assert_eq!(link.project_id, outcome.project.id);
        assert_eq!(link.project_slug, "demo");

        let log = FileHistoryStore.read(dir.path(), 50).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].file_count, 2);
        assert_eq!(log[0].total_size_bytes, 13 + 4);
        assert_eq!(log[0].version, "v1");
        assert_eq!(log[0].url, "https://deploy-1.rollout.sh");

        let upload = &remote.deploys()[0];
        assert_eq!(upload.project_id, outcome.project.id);
        assert_eq!(upload.paths, vec!["css/site.css", "index.html"]);
    }

    #[tokio::test]
    async fn test_redeploy_reuses_linked_project() {
        let dir = site();
        let remote = FakeRemote::new();
        let deployer = Deployer::new(&remote, &FileLinkStore, &FileHistoryStore);

        let first = deployer.deploy(dir.path(), &named("demo")).await.unwrap();
        let second = deployer.deploy(dir.path(), &named("demo")).await.unwrap();

        assert_eq!(second.resolution, Resolution::Linked);
        assert_eq!(second.project.id, first.project.id);
        assert_eq!(remote.created().len(), 1);

        let log = FileHistoryStore.read(dir.path(), 50).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].version, "v2");
        assert_eq!(log[1].version, "v1");
    }

    #[tokio::test]
    async fn test_preconditions_fail_before_any_remote_call() {
        let dir = site();
        let empty = tempdir().unwrap();
        let hidden_only = tempdir().unwrap();
        fs::write(hidden_only.path().join(".gitignore"), "dist").unwrap();

        let remote = FakeRemote::new();
        let deployer = Deployer::new(&remote, &FileLinkStore, &FileHistoryStore);

        let cases = [
            (empty.path().join("missing"), DeployOptions::default(), "Folder not found"),
            (empty.path().to_path_buf(), DeployOptions::default(), "Folder is empty"),
            (hidden_only.path().to_path_buf(), DeployOptions::default(), "No deployable files"),
            (dir.path().to_path_buf(), named("My Site"), "lowercase letters"),
        ];
        for (path, options, expected) in cases {
            let err = deployer.deploy(&path, &options).await.unwrap_err();
            assert!(err.is_precondition(), "{err}");
            assert!(err.to_string().contains(expected), "{err}");
        }

        let logged_out = FakeRemote::logged_out();
        let err = Deployer::new(&logged_out, &FileLinkStore, &FileHistoryStore)
            .deploy(dir.path(), &DeployOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), NOT_LOGGED_IN);

        assert_eq!(remote.call_count(), 0);
        assert_eq!(logged_out.call_count(), 0);
        assert!(!link_path(dir.path()).exists());
    }

    #[tokio::test]
    async fn test_upload_failure_leaves_local_state_alone() {
        let dir = site();
        let remote = FakeRemote::new();
        remote.fail_deploy("Storage quota exceeded");
        let deployer = Deployer::new(&remote, &FileLinkStore, &FileHistoryStore);

        let err = deployer.deploy(dir.path(), &named("demo")).await.unwrap_err();

        assert_eq!(err.to_string(), "Storage quota exceeded");
        assert!(FileLinkStore.read(dir.path()).unwrap().is_none());
        assert!(FileHistoryStore.read(dir.path(), 50).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_local_write_failure_is_only_a_warning() {
        let dir = site();
        let remote = FakeRemote::new();
        let history = MemoryHistoryStore::new();
        let deployer = Deployer::new(&remote, &BrokenLinks, &history);

        let outcome = deployer.deploy(dir.path(), &named("demo")).await.unwrap();

        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(remote.deploys().len(), 1);
        assert_eq!(history.read(dir.path(), 10).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_link_is_treated_as_missing() {
        let dir = site();
        fs::create_dir_all(dir.path().join(".rollout")).unwrap();
        fs::write(link_path(dir.path()), "{ broken").unwrap();

        let remote = FakeRemote::new();
        let deployer = Deployer::new(&remote, &FileLinkStore, &FileHistoryStore);
        let outcome = deployer.deploy(dir.path(), &DeployOptions::default()).await.unwrap();

        assert_eq!(outcome.resolution, Resolution::Created);
        assert_eq!(outcome.warnings.len(), 1);
        // Overwritten with a valid link
        let link = FileLinkStore.read(dir.path()).unwrap().unwrap();
        assert_eq!(link.project_id, outcome.project.id);
    }

    #[tokio::test]
    async fn test_metadata_and_domain_are_forwarded() {
        let dir = site();
        let remote = FakeRemote::new();
        let links = MemoryLinkStore::new();
        let history = MemoryHistoryStore::new();
        let deployer = Deployer::new(&remote, &links, &history);

        let options = DeployOptions {
            project: Some("demo".to_string()),
            commit: Some("abc123".to_string()),
            branch: Some("main".to_string()),
            domain: Some("www.example.com".to_string()),
        };
        let outcome = deployer.deploy(dir.path(), &options).await.unwrap();

        let upload = &remote.deploys()[0];
        assert_eq!(upload.meta.commit_hash.as_deref(), Some("abc123"));
        assert_eq!(upload.meta.branch.as_deref(), Some("main"));
        assert_eq!(
            remote.domains(),
            vec![(outcome.project.id.clone(), "www.example.com".to_string())]
        );
        let added = outcome.domain.unwrap().unwrap();
        assert_eq!(added.verification_token.as_deref(), Some("verify-me"));
    }

    #[tokio::test]
    async fn test_domain_failure_after_upload_keeps_local_state() {
        let dir = site();
        let remote = FakeRemote::new();
        remote.fail_domain("Domain already in use");
        let links = MemoryLinkStore::new();
        let history = MemoryHistoryStore::new();
        let deployer = Deployer::new(&remote, &links, &history);

        let options = DeployOptions {
            domain: Some("taken.example.com".to_string()),
            ..Default::default()
        };
        let outcome = deployer.deploy(dir.path(), &options).await.unwrap();

        let err = outcome.domain.unwrap().unwrap_err();
        assert_eq!(err.to_string(), "Domain already in use");
        assert_eq!(outcome.deployment_url.as_deref(), Some("https://deploy-1.rollout.sh"));
        assert!(outcome.warnings.is_empty());
        assert!(links.read(dir.path()).unwrap().is_some());
        assert_eq!(history.read(dir.path(), 10).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_log_is_restarted_with_warning() {
        let dir = site();
        fs::create_dir_all(dir.path().join(".rollout")).unwrap();
        fs::write(crate::history::history_path(dir.path()), "not a log").unwrap();

        let remote = FakeRemote::new();
        let deployer = Deployer::new(&remote, &FileLinkStore, &FileHistoryStore);
        let outcome = deployer.deploy(dir.path(), &named("demo")).await.unwrap();

        assert_eq!(outcome.warnings.len(), 1);
        assert!(matches!(outcome.warnings[0], LocalStateError::Json { .. }));
        let log = FileHistoryStore.read(dir.path(), 50).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].version, "v1");
    }

    #[tokio::test]
    async fn test_link_never_overwrites_session_file() {
        let home = site();
        let session = crate::session::SessionStore::new(link_path(home.path()));
        session.save("tok-123").unwrap();

        let remote = FakeRemote::new();
        let session_path = session.path().to_path_buf();
        let deployer = Deployer::new(&remote, &FileLinkStore, &FileHistoryStore)
            .with_session_file(&session_path);
        let outcome = deployer.deploy(home.path(), &named("demo")).await.unwrap();

        assert_eq!(outcome.resolution, Resolution::Created);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(matches!(outcome.warnings[0], LocalStateError::SessionFile { .. }));
        assert_eq!(session.load().token(), Some("tok-123"));
        assert_eq!(FileHistoryStore.read(home.path(), 50).unwrap().len(), 1);
    }
}
