//! In-memory doubles of the remote collaborators, shared by the unit tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use github_client::{
    Autolink, AutolinkPayload, Branch, BranchCommit, BranchProtection, BranchProtectionUpdate,
    Collaborator, CollaboratorPermissions, Error, GitObject, GitRef, ProtectionToggle,
    RefCreatePayload, Repository, RepositoryClient, RepositoryCreatePayload,
    RepositorySettingsUpdate, RequiredPullRequestReviews, RequiredStatusChecks,
    SignatureProtection, TemplateRepositoryPayload,
};
use serde_json::{json, Value};

use crate::{
    BranchPolicy, NotificationSink, RepositoryPolicy, WardenError, WardenResult,
    DEVELOPMENT_BRANCH, PRIMARY_BRANCH,
};

pub const OWNER: &str = "test-org";
pub const ADMIN: &str = "admin-user";

#[derive(Default)]
struct FakeState {
    repositories: BTreeMap<String, Value>,
    branches: HashMap<String, Vec<String>>,
    protections: HashMap<(String, String), BranchProtection>,
    protection_updates: Vec<(String, BranchProtectionUpdate)>,
    signatures: HashSet<(String, String)>,
    collaborators: HashMap<String, Vec<Collaborator>>,
    files: HashMap<(String, String), String>,
    autolinks: Vec<(String, AutolinkPayload)>,
    team_access: Vec<(String, String, String)>,
    default_branch_on_create: Option<String>,
    empty_branch_lists: u32,
    ignore_settings: bool,
    failing: HashSet<&'static str>,
}

/// A `RepositoryClient` keeping a single organization in memory.
///
/// Every call is appended to a call log as `"<operation> <repo>"` or
/// `"<operation> <repo>/<branch>"`.
pub struct FakeRepositoryClient {
    state: Mutex<FakeState>,
    calls: Mutex<Vec<String>>,
}

impl FakeRepositoryClient {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A private repository satisfying every policy check, with `ADMIN` as admin.
    pub fn with_compliant_private_repo(self, name: &str) -> Self {
        let policy = RepositoryPolicy::new(OWNER, name, None, None);
        let settings = serde_json::to_value(policy.settings_update()).unwrap();
        let mut repository = json!({
            "name": name,
            "full_name": format!("{OWNER}/{name}"),
            "node_id": format!("node-{name}"),
            "visibility": "private",
            "default_branch": PRIMARY_BRANCH,
        });
        merge(&mut repository, &settings);

        {
            let mut state = self.state.lock().unwrap();
            state.repositories.insert(name.to_string(), repository);
            state.branches.insert(
                name.to_string(),
                vec![PRIMARY_BRANCH.to_string(), DEVELOPMENT_BRANCH.to_string()],
            );
            for branch in [PRIMARY_BRANCH, DEVELOPMENT_BRANCH] {
                let key = (name.to_string(), branch.to_string());
                state.protections.insert(
                    key.clone(),
                    to_protection(&BranchPolicy::for_branch(branch).protection_update()),
                );
                state.signatures.insert(key);
            }
            state
                .collaborators
                .insert(name.to_string(), vec![collaborator(ADMIN, "admin")]);
        }
        self
    }

    /// A public repository with the given branches, none of them protected.
    pub fn with_public_repo(self, name: &str, branches: &[&str]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.repositories.insert(
                name.to_string(),
                json!({
                    "name": name,
                    "full_name": format!("{OWNER}/{name}"),
                    "private": false,
                    "visibility": "public",
                    "default_branch": branches.first().copied().unwrap_or(PRIMARY_BRANCH),
                }),
            );
            state.branches.insert(
                name.to_string(),
                branches.iter().map(|b| b.to_string()).collect(),
            );
        }
        self
    }

    /// Name of the initial branch of repositories created through the fake.
    pub fn with_default_branch_on_create(self, branch: &str) -> Self {
        self.state.lock().unwrap().default_branch_on_create = Some(branch.to_string());
        self
    }

    /// Number of branch listings answered with an empty list before branches appear.
    pub fn with_empty_branch_lists(self, count: u32) -> Self {
        self.state.lock().unwrap().empty_branch_lists = count;
        self
    }

    /// Accepts repository settings updates without applying them.
    pub fn with_ignored_settings_updates(self) -> Self {
        self.state.lock().unwrap().ignore_settings = true;
        self
    }

    /// Makes every call to `operation` fail with `Error::ApiError`.
    pub fn fail_on(&self, operation: &'static str) {
        self.state.lock().unwrap().failing.insert(operation);
    }

    pub fn set_repository_field(&self, repo: &str, field: &str, value: Value) {
        let mut state = self.state.lock().unwrap();
        if let Some(repository) = state.repositories.get_mut(repo) {
            repository[field] = value;
        }
    }

    pub fn set_protection(&self, repo: &str, branch: &str, protection: BranchProtection) {
        self.state
            .lock()
            .unwrap()
            .protections
            .insert((repo.to_string(), branch.to_string()), protection);
    }

    pub fn update_protection(&self, repo: &str, branch: &str, change: impl FnOnce(&mut BranchProtection)) {
        let mut state = self.state.lock().unwrap();
        if let Some(protection) = state
            .protections
            .get_mut(&(repo.to_string(), branch.to_string()))
        {
            change(protection);
        }
    }

    pub fn remove_protection(&self, repo: &str, branch: &str) {
        let mut state = self.state.lock().unwrap();
        let key = (repo.to_string(), branch.to_string());
        state.protections.remove(&key);
        state.signatures.remove(&key);
    }

    pub fn remove_branch(&self, repo: &str, branch: &str) {
        self.remove_protection(repo, branch);
        let mut state = self.state.lock().unwrap();
        if let Some(branches) = state.branches.get_mut(repo) {
            branches.retain(|b| b != branch);
        }
    }

    /// Adds an unprotected branch.
    pub fn add_branch(&self, repo: &str, branch: &str) {
        self.state
            .lock()
            .unwrap()
            .branches
            .entry(repo.to_string())
            .or_default()
            .push(branch.to_string());
    }

    pub fn remove_collaborators(&self, repo: &str) {
        self.state.lock().unwrap().collaborators.remove(repo);
    }

    pub fn protection(&self, repo: &str, branch: &str) -> Option<BranchProtection> {
        self.state
            .lock()
            .unwrap()
            .protections
            .get(&(repo.to_string(), branch.to_string()))
            .cloned()
    }

    pub fn branch_names(&self, repo: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .branches
            .get(repo)
            .cloned()
            .unwrap_or_default()
    }

    pub fn file(&self, repo: &str, path: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .files
            .get(&(repo.to_string(), path.to_string()))
            .cloned()
    }

    pub fn add_file(&self, repo: &str, path: &str, content: &str) {
        self.state
            .lock()
            .unwrap()
            .files
            .insert((repo.to_string(), path.to_string()), content.to_string());
    }

    /// Every protection payload sent, as `("<repo>/<branch>", payload)`.
    pub fn protection_updates(&self) -> Vec<(String, BranchProtectionUpdate)> {
        self.state.lock().unwrap().protection_updates.clone()
    }

    pub fn autolinks(&self) -> Vec<(String, AutolinkPayload)> {
        self.state.lock().unwrap().autolinks.clone()
    }

    pub fn team_access(&self) -> Vec<(String, String, String)> {
        self.state.lock().unwrap().team_access.clone()
    }

    pub fn repository_json(&self, repo: &str) -> Option<Value> {
        self.state.lock().unwrap().repositories.get(repo).cloned()
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls made to `operation`.
    pub fn call_count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.split_whitespace().next() == Some(operation))
            .count()
    }

    fn record(&self, operation: &'static str, target: String) -> Result<(), Error> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", operation, target));
        if self.state.lock().unwrap().failing.contains(operation) {
            return Err(Error::ApiError());
        }
        Ok(())
    }

    fn repository(&self, repo: &str) -> Result<Repository, Error> {
        let state = self.state.lock().unwrap();
        let value = state.repositories.get(repo).ok_or(Error::NotFound)?;
        Ok(serde_json::from_value(value.clone())?)
    }

    fn is_protected(state: &FakeState, repo: &str, branch: &str) -> bool {
        state
            .protections
            .contains_key(&(repo.to_string(), branch.to_string()))
    }
}

#[async_trait]
impl RepositoryClient for FakeRepositoryClient {
    async fn create_org_repository(
        &self,
        org_name: &str,
        payload: &RepositoryCreatePayload,
    ) -> Result<Repository, Error> {
        self.record("create_org_repository", payload.name.clone())?;
        {
            let mut state = self.state.lock().unwrap();
            let default_branch = state
                .default_branch_on_create
                .clone()
                .unwrap_or_else(|| PRIMARY_BRANCH.to_string());
            let mut repository = json!({
                "name": payload.name,
                "full_name": format!("{}/{}", org_name, payload.name),
                "default_branch": default_branch,
            });
            merge(&mut repository, &serde_json::to_value(payload)?);
            state.repositories.insert(payload.name.clone(), repository);
            state
                .branches
                .insert(payload.name.clone(), vec![default_branch]);
        }
        self.repository(&payload.name)
    }

    async fn create_repository_from_template(
        &self,
        template_owner: &str,
        template_repo: &str,
        payload: &TemplateRepositoryPayload,
    ) -> Result<Repository, Error> {
        self.record("create_repository_from_template", payload.name.clone())?;
        {
            let mut state = self.state.lock().unwrap();
            let default_branch = state
                .default_branch_on_create
                .clone()
                .unwrap_or_else(|| PRIMARY_BRANCH.to_string());
            state.repositories.insert(
                payload.name.clone(),
                json!({
                    "name": payload.name,
                    "full_name": format!("{}/{}", payload.owner, payload.name),
                    "private": payload.private,
                    "visibility": if payload.private { "private" } else { "public" },
                    "default_branch": default_branch,
                    "has_issues": true,
                    "allow_squash_merge": true,
                    "allow_merge_commit": true,
                    "allow_rebase_merge": true,
                    "allow_auto_merge": false,
                    "delete_branch_on_merge": false,
                    "template_repository": {
                        "name": template_repo,
                        "full_name": format!("{}/{}", template_owner, template_repo)
                    }
                }),
            );
            state
                .branches
                .insert(payload.name.clone(), vec![default_branch]);
        }
        self.repository(&payload.name)
    }

    async fn update_repository_settings(
        &self,
        _owner: &str,
        repo: &str,
        settings: &RepositorySettingsUpdate,
    ) -> Result<Repository, Error> {
        self.record("update_repository_settings", repo.to_string())?;
        {
            let mut state = self.state.lock().unwrap();
            let ignore = state.ignore_settings;
            let repository = state.repositories.get_mut(repo).ok_or(Error::NotFound)?;
            if !ignore {
                merge(repository, &serde_json::to_value(settings)?);
            }
        }
        self.repository(repo)
    }

    async fn get_repository(&self, _owner: &str, repo: &str) -> Result<Repository, Error> {
        self.record("get_repository", repo.to_string())?;
        self.repository(repo)
    }

    async fn delete_repository(&self, _owner: &str, repo: &str) -> Result<(), Error> {
        self.record("delete_repository", repo.to_string())?;
        self.state
            .lock()
            .unwrap()
            .repositories
            .remove(repo)
            .map(drop)
            .ok_or(Error::NotFound)
    }

    async fn list_org_repositories(&self, org_name: &str) -> Result<Vec<Repository>, Error> {
        self.record("list_org_repositories", org_name.to_string())?;
        let state = self.state.lock().unwrap();
        state
            .repositories
            .values()
            .map(|v| serde_json::from_value(v.clone()).map_err(Error::from))
            .collect()
    }

    async fn list_branches(&self, _owner: &str, repo: &str) -> Result<Vec<Branch>, Error> {
        self.record("list_branches", repo.to_string())?;
        let mut state = self.state.lock().unwrap();
        if !state.repositories.contains_key(repo) {
            return Err(Error::NotFound);
        }
        if state.empty_branch_lists > 0 {
            state.empty_branch_lists -= 1;
            return Ok(Vec::new());
        }
        let names = state.branches.get(repo).cloned().unwrap_or_default();
        Ok(names
            .into_iter()
            .map(|name| Branch {
                protected: Self::is_protected(&state, repo, &name),
                commit: BranchCommit {
                    sha: format!("sha-{name}"),
                },
                name,
            })
            .collect())
    }

    async fn get_branch(&self, _owner: &str, repo: &str, branch: &str) -> Result<Branch, Error> {
        self.record("get_branch", format!("{repo}/{branch}"))?;
        let state = self.state.lock().unwrap();
        let exists = state
            .branches
            .get(repo)
            .is_some_and(|b| b.iter().any(|n| n == branch));
        if !exists {
            return Err(Error::NotFound);
        }
        Ok(Branch {
            name: branch.to_string(),
            commit: BranchCommit {
                sha: format!("sha-{branch}"),
            },
            protected: Self::is_protected(&state, repo, branch),
        })
    }

    async fn rename_branch(
        &self,
        _owner: &str,
        repo: &str,
        branch: &str,
        new_name: &str,
    ) -> Result<Branch, Error> {
        self.record("rename_branch", format!("{repo}/{branch}"))?;
        let mut state = self.state.lock().unwrap();
        let branches = state.branches.get_mut(repo).ok_or(Error::NotFound)?;
        let position = branches
            .iter()
            .position(|b| b == branch)
            .ok_or(Error::NotFound)?;
        branches[position] = new_name.to_string();

        let old_key = (repo.to_string(), branch.to_string());
        let new_key = (repo.to_string(), new_name.to_string());
        if let Some(protection) = state.protections.remove(&old_key) {
            state.protections.insert(new_key.clone(), protection);
        }
        if state.signatures.remove(&old_key) {
            state.signatures.insert(new_key);
        }
        if let Some(repository) = state.repositories.get_mut(repo) {
            if repository["default_branch"] == branch {
                repository["default_branch"] = json!(new_name);
            }
        }

        Ok(Branch {
            name: new_name.to_string(),
            commit: BranchCommit {
                sha: format!("sha-{new_name}"),
            },
            protected: false,
        })
    }

    async fn get_ref(&self, _owner: &str, repo: &str, reference: &str) -> Result<GitRef, Error> {
        self.record("get_ref", format!("{repo}/{reference}"))?;
        let branch = reference.trim_start_matches("heads/");
        let state = self.state.lock().unwrap();
        let exists = state
            .branches
            .get(repo)
            .is_some_and(|b| b.iter().any(|n| n == branch));
        if !exists {
            return Err(Error::NotFound);
        }
        Ok(GitRef {
            reference: format!("refs/heads/{branch}"),
            object: GitObject {
                sha: format!("sha-{branch}"),
                object_type: "commit".to_string(),
            },
        })
    }

    async fn create_ref(
        &self,
        _owner: &str,
        repo: &str,
        payload: &RefCreatePayload,
    ) -> Result<GitRef, Error> {
        let branch = payload
            .reference
            .trim_start_matches("refs/heads/")
            .to_string();
        self.record("create_ref", format!("{repo}/{branch}"))?;
        let mut state = self.state.lock().unwrap();
        let branches = state.branches.get_mut(repo).ok_or(Error::NotFound)?;
        if branches.contains(&branch) {
            return Err(Error::Validation("Reference already exists".to_string()));
        }
        branches.push(branch);
        Ok(GitRef {
            reference: payload.reference.clone(),
            object: GitObject {
                sha: payload.sha.clone(),
                object_type: "commit".to_string(),
            },
        })
    }

    async fn get_branch_protection(
        &self,
        _owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<BranchProtection, Error> {
        self.record("get_branch_protection", format!("{repo}/{branch}"))?;
        let state = self.state.lock().unwrap();
        let mut protection = state
            .protections
            .get(&(repo.to_string(), branch.to_string()))
            .cloned()
            .ok_or(Error::NotFound)?;
        let signed = state
            .signatures
            .contains(&(repo.to_string(), branch.to_string()));
        protection.required_signatures = Some(ProtectionToggle::new(signed));
        Ok(protection)
    }

    async fn update_branch_protection(
        &self,
        _owner: &str,
        repo: &str,
        branch: &str,
        protection: &BranchProtectionUpdate,
    ) -> Result<BranchProtection, Error> {
        self.record("update_branch_protection", format!("{repo}/{branch}"))?;
        let mut state = self.state.lock().unwrap();
        let exists = state
            .branches
            .get(repo)
            .is_some_and(|b| b.iter().any(|n| n == branch));
        if !exists {
            return Err(Error::NotFound);
        }
        state
            .protection_updates
            .push((format!("{repo}/{branch}"), protection.clone()));
        let applied = to_protection(protection);
        state
            .protections
            .insert((repo.to_string(), branch.to_string()), applied.clone());
        Ok(applied)
    }

    async fn get_commit_signature_protection(
        &self,
        _owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<SignatureProtection, Error> {
        self.record("get_commit_signature_protection", format!("{repo}/{branch}"))?;
        let state = self.state.lock().unwrap();
        if !Self::is_protected(&state, repo, branch) {
            return Err(Error::NotFound);
        }
        Ok(SignatureProtection {
            enabled: state
                .signatures
                .contains(&(repo.to_string(), branch.to_string())),
        })
    }

    async fn require_commit_signatures(
        &self,
        _owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<SignatureProtection, Error> {
        self.record("require_commit_signatures", format!("{repo}/{branch}"))?;
        let mut state = self.state.lock().unwrap();
        if !Self::is_protected(&state, repo, branch) {
            return Err(Error::NotFound);
        }
        state
            .signatures
            .insert((repo.to_string(), branch.to_string()));
        Ok(SignatureProtection { enabled: true })
    }

    async fn list_collaborators(
        &self,
        _owner: &str,
        repo: &str,
    ) -> Result<Vec<Collaborator>, Error> {
        self.record("list_collaborators", repo.to_string())?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .collaborators
            .get(repo)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_collaborator(
        &self,
        _owner: &str,
        repo: &str,
        username: &str,
        permission: &str,
    ) -> Result<(), Error> {
        self.record("add_collaborator", format!("{repo}/{username}"))?;
        let mut state = self.state.lock().unwrap();
        let collaborators = state.collaborators.entry(repo.to_string()).or_default();
        collaborators.retain(|c| c.login != username);
        collaborators.push(collaborator(username, permission));
        Ok(())
    }

    async fn add_team_access(
        &self,
        _org_name: &str,
        team_slug: &str,
        _owner: &str,
        repo: &str,
        permission: &str,
    ) -> Result<(), Error> {
        self.record("add_team_access", format!("{repo}/{team_slug}"))?;
        self.state.lock().unwrap().team_access.push((
            repo.to_string(),
            team_slug.to_string(),
            permission.to_string(),
        ));
        Ok(())
    }

    async fn add_autolink(
        &self,
        _owner: &str,
        repo: &str,
        payload: &AutolinkPayload,
    ) -> Result<Autolink, Error> {
        self.record("add_autolink", repo.to_string())?;
        let mut state = self.state.lock().unwrap();
        state.autolinks.push((repo.to_string(), payload.clone()));
        Ok(Autolink {
            id: state.autolinks.len() as u64,
            key_prefix: payload.key_prefix.clone(),
            url_template: payload.url_template.clone(),
        })
    }

    async fn file_exists(&self, _owner: &str, repo: &str, path: &str) -> bool {
        if self.record("file_exists", format!("{repo}/{path}")).is_err() {
            return false;
        }
        self.state
            .lock()
            .unwrap()
            .files
            .contains_key(&(repo.to_string(), path.to_string()))
    }

    async fn write_file(
        &self,
        _owner: &str,
        repo: &str,
        path: &str,
        content: &str,
        _message: &str,
    ) -> Result<(), Error> {
        self.record("write_file", format!("{repo}/{path}"))?;
        self.add_file(repo, path, content);
        Ok(())
    }
}

/// A notification sink remembering every message.
#[derive(Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose sends always fail, after recording the message.
    pub fn failing() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, message: &str) -> WardenResult<()> {
        self.messages.lock().unwrap().push(message.to_string());
        if self.fail {
            return Err(WardenError::Notification("sink unavailable".to_string()));
        }
        Ok(())
    }
}

pub fn collaborator(login: &str, permission: &str) -> Collaborator {
    let admin = permission == "admin";
    Collaborator {
        login: login.to_string(),
        permissions: CollaboratorPermissions {
            admin,
            maintain: admin || permission == "maintain",
            push: admin || permission == "maintain" || permission == "push",
            triage: permission != "pull",
            pull: true,
        },
    }
}

/// The protection GitHub reports after applying `update`.
pub fn to_protection(update: &BranchProtectionUpdate) -> BranchProtection {
    BranchProtection {
        required_status_checks: update
            .required_status_checks
            .as_ref()
            .map(|c| RequiredStatusChecks {
                strict: c.strict,
                contexts: c.contexts.clone(),
            }),
        required_pull_request_reviews: update.required_pull_request_reviews.as_ref().map(|r| {
            RequiredPullRequestReviews {
                required_approving_review_count: r.required_approving_review_count,
                require_code_owner_reviews: r.require_code_owner_reviews,
                require_last_push_approval: r.require_last_push_approval,
                dismiss_stale_reviews: r.dismiss_stale_reviews,
            }
        }),
        enforce_admins: Some(ProtectionToggle::new(update.enforce_admins.unwrap_or(false))),
        restrictions: update
            .restrictions
            .as_ref()
            .map(|r| json!({ "users": r.users, "teams": r.teams })),
        allow_force_pushes: Some(ProtectionToggle::new(
            update.allow_force_pushes.unwrap_or(false),
        )),
        allow_deletions: Some(ProtectionToggle::new(update.allow_deletions.unwrap_or(false))),
        lock_branch: Some(ProtectionToggle::new(update.lock_branch.unwrap_or(false))),
        required_signatures: None,
    }
}

fn merge(target: &mut Value, patch: &Value) {
    if let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
    }
}
