//! Recording `CodeHost` for workflow tests.
//!
//! Every call is logged in order. Replies are plain fields that tests
//! overwrite before running the workflow; REST issue creation takes a queue so
//! retries can see different answers.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};

use super::{
    AgentIdentity, CodeHost, CreateIssueInput, GithubError, GithubResult, IssueState, NewIssue,
    PutFile, RemoteFile, RemoteIssue, RepoRef,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Search(String),
    GetIssue(u64),
    CreateIssue(NewIssue),
    CreateIssueTyped(CreateIssueInput),
    AddComment { number: u64, body: String },
    AddAssignees { number: u64, logins: Vec<String> },
    AddLabels { number: u64, labels: Vec<String> },
    SuggestedActors,
    RepositoryId,
    ReplaceActors {
        assignable_id: String,
        actor_ids: Vec<String>,
    },
    CreateLinkedBranch {
        repository_id: String,
        issue_id: String,
        branch: String,
        oid: String,
    },
    DefaultBranch,
    BranchSha(String),
    CreateBranch { branch: String, sha: String },
    GetFile(String),
    PutFile(PutFile),
}

pub fn issue(number: u64) -> RemoteIssue {
    RemoteIssue {
        number,
        node_id: Some(format!("I_{number}")),
        url: format!("https://github.com/acme/app/issues/{number}"),
        title: String::new(),
        state: IssueState::Open,
        assignees: Vec::new(),
        labels: Vec::new(),
    }
}

pub fn identity(login: &str, id: &str) -> AgentIdentity {
    AgentIdentity {
        login: login.to_string(),
        opaque_id: id.to_string(),
    }
}

pub fn server_error() -> GithubError {
    GithubError::Status {
        status: 500,
        body: "boom".to_string(),
    }
}

pub struct FakeHost {
    pub calls: RefCell<Vec<Call>>,
    pub search: GithubResult<Vec<RemoteIssue>>,
    pub issue: GithubResult<RemoteIssue>,
    pub rest_creates: RefCell<VecDeque<GithubResult<RemoteIssue>>>,
    pub typed_create: GithubResult<RemoteIssue>,
    pub comment: GithubResult<()>,
    pub assignees_reply: GithubResult<RemoteIssue>,
    pub labels: GithubResult<()>,
    pub actors: GithubResult<Vec<AgentIdentity>>,
    pub repository_id: GithubResult<String>,
    pub replace_reply: GithubResult<Vec<String>>,
    pub linked_branch: GithubResult<()>,
    pub default_branch: GithubResult<String>,
    pub branches: RefCell<HashMap<String, String>>,
    pub create_branch: GithubResult<()>,
    pub files: HashMap<String, String>,
    pub failing_puts: HashSet<String>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            search: Ok(Vec::new()),
            issue: Ok(issue(1)),
            rest_creates: RefCell::new(VecDeque::new()),
            typed_create: Ok(issue(1)),
            comment: Ok(()),
            assignees_reply: Ok(issue(1)),
            labels: Ok(()),
            actors: Ok(Vec::new()),
            repository_id: Ok("R_1".to_string()),
            replace_reply: Ok(Vec::new()),
            linked_branch: Ok(()),
            default_branch: Ok("main".to_string()),
            branches: RefCell::new(HashMap::from([(
                "main".to_string(),
                "sha-main".to_string(),
            )])),
            create_branch: Ok(()),
            files: HashMap::new(),
            failing_puts: HashSet::new(),
        }
    }
}

impl FakeHost {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|&c| pred(c)).count()
    }

    /// Position of the first call matching `pred`.
    pub fn position(&self, pred: impl Fn(&Call) -> bool) -> Option<usize> {
        self.calls.borrow().iter().position(pred)
    }

    pub fn queue_rest_create(&self, reply: GithubResult<RemoteIssue>) {
        self.rest_creates.borrow_mut().push_back(reply);
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl CodeHost for FakeHost {
    fn search_issues(&self, query: &str, _per_page: u32) -> GithubResult<Vec<RemoteIssue>> {
        self.record(Call::Search(query.to_string()));
        self.search.clone()
    }

    fn get_issue(&self, _repo: &RepoRef, number: u64) -> GithubResult<RemoteIssue> {
        self.record(Call::GetIssue(number));
        self.issue.clone()
    }

    fn create_issue(&self, _repo: &RepoRef, new_issue: &NewIssue) -> GithubResult<RemoteIssue> {
        self.record(Call::CreateIssue(new_issue.clone()));
        self.rest_creates
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(issue(1)))
    }

    fn create_issue_typed(&self, input: &CreateIssueInput) -> GithubResult<RemoteIssue> {
        self.record(Call::CreateIssueTyped(input.clone()));
        self.typed_create.clone()
    }

    fn add_comment(&self, _repo: &RepoRef, number: u64, body: &str) -> GithubResult<()> {
        self.record(Call::AddComment {
            number,
            body: body.to_string(),
        });
        self.comment.clone()
    }

    fn add_assignees(
        &self,
        _repo: &RepoRef,
        number: u64,
        logins: &[String],
    ) -> GithubResult<RemoteIssue> {
        self.record(Call::AddAssignees {
            number,
            logins: logins.to_vec(),
        });
        self.assignees_reply.clone()
    }

    fn add_labels(&self, _repo: &RepoRef, number: u64, labels: &[String]) -> GithubResult<()> {
        self.record(Call::AddLabels {
            number,
            labels: labels.to_vec(),
        });
        self.labels.clone()
    }

    fn suggested_actors(&self, _repo: &RepoRef) -> GithubResult<Vec<AgentIdentity>> {
        self.record(Call::SuggestedActors);
        self.actors.clone()
    }

    fn repository_id(&self, _repo: &RepoRef) -> GithubResult<String> {
        self.record(Call::RepositoryId);
        self.repository_id.clone()
    }

    fn replace_actors(
        &self,
        assignable_id: &str,
        actor_ids: &[String],
    ) -> GithubResult<Vec<String>> {
        self.record(Call::ReplaceActors {
            assignable_id: assignable_id.to_string(),
            actor_ids: actor_ids.to_vec(),
        });
        self.replace_reply.clone()
    }

    fn create_linked_branch(
        &self,
        repository_id: &str,
        issue_id: &str,
        branch: &str,
        oid: &str,
    ) -> GithubResult<()> {
        self.record(Call::CreateLinkedBranch {
            repository_id: repository_id.to_string(),
            issue_id: issue_id.to_string(),
            branch: branch.to_string(),
            oid: oid.to_string(),
        });
        self.linked_branch.clone()
    }

    fn default_branch(&self, _repo: &RepoRef) -> GithubResult<String> {
        self.record(Call::DefaultBranch);
        self.default_branch.clone()
    }

    fn branch_sha(&self, _repo: &RepoRef, branch: &str) -> GithubResult<Option<String>> {
        self.record(Call::BranchSha(branch.to_string()));
        Ok(self.branches.borrow().get(branch).cloned())
    }

    fn create_branch(&self, _repo: &RepoRef, branch: &str, sha: &str) -> GithubResult<()> {
        self.record(Call::CreateBranch {
            branch: branch.to_string(),
            sha: sha.to_string(),
        });
        self.create_branch.clone()?;
        self.branches
            .borrow_mut()
            .insert(branch.to_string(), sha.to_string());
        Ok(())
    }

    fn get_file(
        &self,
        _repo: &RepoRef,
        path: &str,
        _branch: &str,
    ) -> GithubResult<Option<RemoteFile>> {
        self.record(Call::GetFile(path.to_string()));
        Ok(self.files.get(path).map(|sha| RemoteFile {
            path: path.to_string(),
            sha: sha.clone(),
        }))
    }

    fn put_file(&self, _repo: &RepoRef, file: &PutFile) -> GithubResult<()> {
        self.record(Call::PutFile(file.clone()));
        if self.failing_puts.contains(&file.path) {
            return Err(server_error());
        }
        Ok(())
    }
}
