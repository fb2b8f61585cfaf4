//! GraphQL documents and their typed responses.

use serde::{Deserialize, Serialize};

use super::{AgentIdentity, GithubError, GithubResult, IssueState, RemoteIssue};

pub const REPOSITORY_ID: &str = r"
query($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    id
  }
}
";

pub const SUGGESTED_ACTORS: &str = r"
query($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    suggestedActors(capabilities: [CAN_BE_ASSIGNED], first: 100) {
      nodes {
        login
        __typename
        ... on Bot { id }
        ... on User { id }
      }
    }
  }
}
";

pub const REPLACE_ACTORS: &str = r"
mutation($assignableId: ID!, $actorIds: [ID!]!) {
  replaceActorsForAssignable(input: {assignableId: $assignableId, actorIds: $actorIds}) {
    assignable {
      ... on Issue {
        id
        number
        assignees(first: 10) { nodes { login } }
      }
    }
  }
}
";

pub const CREATE_ISSUE: &str = r"
mutation($input: CreateIssueInput!) {
  createIssue(input: $input) {
    issue {
      id
      number
      url
      title
      state
      assignees(first: 10) { nodes { login id } }
    }
  }
}
";

pub const CREATE_LINKED_BRANCH: &str = r"
mutation($input: CreateLinkedBranchInput!) {
  createLinkedBranch(input: $input) {
    linkedBranch {
      id
      ref { name }
    }
  }
}
";

/// Body posted to the GraphQL endpoint.
#[derive(Debug, Serialize)]
pub struct Request<'a, V: Serialize> {
    pub query: &'a str,
    pub variables: V,
}

#[derive(Debug, Serialize)]
pub struct RepoVars<'a> {
    pub owner: &'a str,
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceActorsVars<'a> {
    pub assignable_id: &'a str,
    pub actor_ids: &'a [String],
}

#[derive(Debug, Serialize)]
pub struct InputVars<T: Serialize> {
    pub input: T,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedBranchInput<'a> {
    pub repository_id: &'a str,
    pub issue_id: &'a str,
    pub name: &'a str,
    pub oid: &'a str,
}

/// Standard `{data, errors}` envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorEntry {
    #[serde(default)]
    pub message: String,
}

impl<T> Envelope<T> {
    /// Data when the response carried no error entries.
    pub fn into_data(self) -> GithubResult<T> {
        if !self.errors.is_empty() {
            return Err(GithubError::GraphQl(
                self.errors.into_iter().map(|e| e.message).collect(),
            ));
        }
        self.data.ok_or(GithubError::Missing("data"))
    }
}

// --- repository id ---

#[derive(Debug, Deserialize)]
pub struct RepositoryIdData {
    pub repository: Option<RepositoryId>,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryId {
    pub id: String,
}

// --- suggested actors ---

#[derive(Debug, Deserialize)]
pub struct SuggestedActorsData {
    pub repository: Option<SuggestedActorsRepo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedActorsRepo {
    pub suggested_actors: Connection<ActorNode>,
}

#[derive(Debug, Deserialize)]
pub struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct ActorNode {
    pub login: String,
    #[serde(default)]
    pub id: Option<String>,
}

impl SuggestedActorsData {
    /// Actors that expose a node id; others cannot be assigned through GraphQL.
    pub fn into_identities(self) -> Vec<AgentIdentity> {
        self.repository
            .map(|repo| repo.suggested_actors.nodes)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|node| {
                node.id.filter(|id| !id.is_empty()).map(|id| AgentIdentity {
                    login: node.login,
                    opaque_id: id,
                })
            })
            .collect()
    }
}

// --- replace actors ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceActorsData {
    pub replace_actors_for_assignable: Option<AssignablePayload>,
}

#[derive(Debug, Deserialize)]
pub struct AssignablePayload {
    pub assignable: Option<AssignableIssue>,
}

#[derive(Debug, Deserialize)]
pub struct AssignableIssue {
    #[serde(default)]
    pub assignees: Option<Connection<LoginNode>>,
}

#[derive(Debug, Deserialize)]
pub struct LoginNode {
    pub login: String,
    #[serde(default)]
    pub id: Option<String>,
}

impl ReplaceActorsData {
    pub fn assignee_logins(self) -> Vec<String> {
        self.replace_actors_for_assignable
            .and_then(|payload| payload.assignable)
            .and_then(|issue| issue.assignees)
            .map(|conn| conn.nodes.into_iter().map(|n| n.login).collect())
            .unwrap_or_default()
    }
}

// --- create issue ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIssueData {
    pub create_issue: Option<CreatedIssuePayload>,
}

#[derive(Debug, Deserialize)]
pub struct CreatedIssuePayload {
    pub issue: Option<IssueNode>,
}

#[derive(Debug, Deserialize)]
pub struct IssueNode {
    pub id: String,
    pub number: u64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub assignees: Option<Connection<LoginNode>>,
}

impl From<IssueNode> for RemoteIssue {
    fn from(node: IssueNode) -> Self {
        RemoteIssue {
            number: node.number,
            node_id: Some(node.id),
            url: node.url,
            title: node.title,
            state: node
                .state
                .as_deref()
                .map_or(IssueState::Open, IssueState::parse),
            assignees: node
                .assignees
                .map(|conn| conn.nodes)
                .unwrap_or_default()
                .into_iter()
                .map(|n| AgentIdentity {
                    login: n.login,
                    opaque_id: n.id.unwrap_or_default(),
                })
                .collect(),
            labels: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedBranchData {
    pub create_linked_branch: Option<serde_json::Value>,
}
