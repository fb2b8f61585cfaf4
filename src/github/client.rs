//! Blocking GitHub client over `ureq`.
//!
//! One agent with a global timeout serves both the REST surface and the
//! GraphQL endpoint. Statuses are never turned into transport errors by
//! `ureq`; each method decides what a status means.

use std::time::Duration;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use ureq::Agent;

use super::adapters::{ContentPayload, IssuePayload, RefPayload, RepositoryPayload, SearchPayload};
use super::graphql::{
    self, CreateIssueData, Envelope, InputVars, LinkedBranchData, LinkedBranchInput,
    ReplaceActorsData, ReplaceActorsVars, RepoVars, RepositoryIdData, SuggestedActorsData,
};
use super::{
    AgentIdentity, CodeHost, CreateIssueInput, GithubError, GithubResult, NewIssue, PutFile,
    RemoteFile, RemoteIssue, RepoRef,
};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = "jira-relay";

/// Bytes escaped inside one path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/');

pub struct GithubClient {
    agent: Agent,
    api_base: String,
    token: String,
}

/// Status and raw body of a finished request.
#[derive(Debug)]
struct Reply {
    status: u16,
    body: String,
}

impl Reply {
    const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    fn ok(self) -> GithubResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(GithubError::Status {
                status: self.status,
                body: self.body,
            })
        }
    }

    /// `None` on 404, the successful reply otherwise.
    fn found(self) -> GithubResult<Option<Self>> {
        if self.status == 404 {
            Ok(None)
        } else {
            self.ok().map(Some)
        }
    }

    fn json<T: DeserializeOwned>(&self) -> GithubResult<T> {
        serde_json::from_str(&self.body).map_err(|e| GithubError::Decode(e.to_string()))
    }
}

impl GithubClient {
    pub fn new(api_base: &str, token: &str, timeout: Duration) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        Self {
            agent: config.into(),
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.trim().to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn authorize<B>(&self, request: ureq::RequestBuilder<B>) -> ureq::RequestBuilder<B> {
        request
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .header("User-Agent", USER_AGENT)
    }

    fn get(&self, path: &str, query: &[(&str, &str)]) -> GithubResult<Reply> {
        tracing::debug!(path, "GET");
        let mut request = self.authorize(self.agent.get(self.url(path)));
        for (key, value) in query {
            request = request.query(*key, *value);
        }
        read_reply(request.call())
    }

    fn post<T: Serialize>(&self, path: &str, body: &T) -> GithubResult<Reply> {
        tracing::debug!(path, "POST");
        read_reply(self.authorize(self.agent.post(self.url(path))).send_json(body))
    }

    fn put<T: Serialize>(&self, path: &str, body: &T) -> GithubResult<Reply> {
        tracing::debug!(path, "PUT");
        read_reply(self.authorize(self.agent.put(self.url(path))).send_json(body))
    }

    fn graphql<V: Serialize, T: DeserializeOwned>(&self, query: &str, variables: V) -> GithubResult<T> {
        let request = graphql::Request { query, variables };
        let reply = self.post("/graphql", &request)?.ok()?;
        reply.json::<Envelope<T>>()?.into_data()
    }
}

fn repo_path(repo: &RepoRef) -> String {
    format!("/repos/{}/{}", repo.owner, repo.name)
}

/// Percent-encode each segment of a slash-separated path, keeping the slashes.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn read_reply(
    result: Result<ureq::http::Response<ureq::Body>, ureq::Error>,
) -> GithubResult<Reply> {
    let mut response = result.map_err(|e| GithubError::Transport(e.to_string()))?;
    let status = response.status().as_u16();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| GithubError::Transport(e.to_string()))?;
    Ok(Reply { status, body })
}

impl CodeHost for GithubClient {
    fn search_issues(&self, query: &str, per_page: u32) -> GithubResult<Vec<RemoteIssue>> {
        let per_page = per_page.to_string();
        let reply = self
            .get("/search/issues", &[("q", query), ("per_page", &per_page)])?
            .ok()?;
        let search: SearchPayload = reply.json()?;
        Ok(search.items.into_iter().map(Into::into).collect())
    }

    fn get_issue(&self, repo: &RepoRef, number: u64) -> GithubResult<RemoteIssue> {
        let reply = self
            .get(&format!("{}/issues/{number}", repo_path(repo)), &[])?
            .ok()?;
        Ok(reply.json::<IssuePayload>()?.into())
    }

    fn create_issue(&self, repo: &RepoRef, issue: &NewIssue) -> GithubResult<RemoteIssue> {
        let reply = self
            .post(&format!("{}/issues", repo_path(repo)), issue)?
            .ok()?;
        Ok(reply.json::<IssuePayload>()?.into())
    }

    fn create_issue_typed(&self, input: &CreateIssueInput) -> GithubResult<RemoteIssue> {
        let data: CreateIssueData = self.graphql(graphql::CREATE_ISSUE, InputVars { input })?;
        data.create_issue
            .and_then(|payload| payload.issue)
            .map(Into::into)
            .ok_or(GithubError::Missing("createIssue.issue"))
    }

    fn add_comment(&self, repo: &RepoRef, number: u64, body: &str) -> GithubResult<()> {
        self.post(
            &format!("{}/issues/{number}/comments", repo_path(repo)),
            &json!({ "body": body }),
        )?
        .ok()?;
        Ok(())
    }

    fn add_assignees(
        &self,
        repo: &RepoRef,
        number: u64,
        logins: &[String],
    ) -> GithubResult<RemoteIssue> {
        let reply = self
            .post(
                &format!("{}/issues/{number}/assignees", repo_path(repo)),
                &json!({ "assignees": logins }),
            )?
            .ok()?;
        Ok(reply.json::<IssuePayload>()?.into())
    }

    fn add_labels(&self, repo: &RepoRef, number: u64, labels: &[String]) -> GithubResult<()> {
        self.post(
            &format!("{}/issues/{number}/labels", repo_path(repo)),
            &json!({ "labels": labels }),
        )?
        .ok()?;
        Ok(())
    }

    fn suggested_actors(&self, repo: &RepoRef) -> GithubResult<Vec<AgentIdentity>> {
        let data: SuggestedActorsData = self.graphql(
            graphql::SUGGESTED_ACTORS,
            RepoVars {
                owner: &repo.owner,
                name: &repo.name,
            },
        )?;
        Ok(data.into_identities())
    }

    fn repository_id(&self, repo: &RepoRef) -> GithubResult<String> {
        let data: RepositoryIdData = self.graphql(
            graphql::REPOSITORY_ID,
            RepoVars {
                owner: &repo.owner,
                name: &repo.name,
            },
        )?;
        data.repository
            .map(|r| r.id)
            .ok_or(GithubError::Missing("repository.id"))
    }

    fn replace_actors(
        &self,
        assignable_id: &str,
        actor_ids: &[String],
    ) -> GithubResult<Vec<String>> {
        let data: ReplaceActorsData = self.graphql(
            graphql::REPLACE_ACTORS,
            ReplaceActorsVars {
                assignable_id,
                actor_ids,
            },
        )?;
        Ok(data.assignee_logins())
    }

    fn create_linked_branch(
        &self,
        repository_id: &str,
        issue_id: &str,
        branch: &str,
        oid: &str,
    ) -> GithubResult<()> {
        let data: LinkedBranchData = self.graphql(
            graphql::CREATE_LINKED_BRANCH,
            InputVars {
                input: LinkedBranchInput {
                    repository_id,
                    issue_id,
                    name: branch,
                    oid,
                },
            },
        )?;
        data.create_linked_branch
            .map(|_| ())
            .ok_or(GithubError::Missing("createLinkedBranch"))
    }

    fn default_branch(&self, repo: &RepoRef) -> GithubResult<String> {
        let reply = self.get(&repo_path(repo), &[])?.ok()?;
        reply
            .json::<RepositoryPayload>()?
            .default_branch
            .ok_or(GithubError::Missing("default_branch"))
    }

    fn branch_sha(&self, repo: &RepoRef, branch: &str) -> GithubResult<Option<String>> {
        let path = format!("{}/git/ref/heads/{}", repo_path(repo), encode_path(branch));
        let reply = self.get(&path, &[])?;
        match reply.found()? {
            Some(reply) => Ok(Some(reply.json::<RefPayload>()?.object.sha)),
            None => Ok(None),
        }
    }

    fn create_branch(&self, repo: &RepoRef, branch: &str, sha: &str) -> GithubResult<()> {
        self.post(
            &format!("{}/git/refs", repo_path(repo)),
            &json!({ "ref": format!("refs/heads/{branch}"), "sha": sha }),
        )?
        .ok()?;
        Ok(())
    }

    fn get_file(
        &self,
        repo: &RepoRef,
        path: &str,
        branch: &str,
    ) -> GithubResult<Option<RemoteFile>> {
        let reply = self.get(
            &format!("{}/contents/{}", repo_path(repo), encode_path(path)),
            &[("ref", branch)],
        )?;
        match reply.found()? {
            Some(reply) => Ok(Some(reply.json::<ContentPayload>()?.into())),
            None => Ok(None),
        }
    }

    fn put_file(&self, repo: &RepoRef, file: &PutFile) -> GithubResult<()> {
        let path = format!("{}/contents/{}", repo_path(repo), encode_path(&file.path));
        self.put(&path, file)?.ok()?;
        Ok(())
    }
}
