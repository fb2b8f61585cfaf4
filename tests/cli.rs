use assert_cmd::Command;
use httpmock::prelude::*;
use predicates::prelude::*;
use serde_json::json;

fn relay(server: &MockServer, cwd: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("jira-relay").unwrap();
    cmd.env_clear()
        .current_dir(cwd)
        .env("GITHUB_API_URL", server.base_url())
        .env("GITHUB_TOKEN", "ghp_test")
        .env("TARGET_REPO_OWNER", "acme")
        .env("TARGET_REPO_NAME", "app");
    cmd
}

#[test]
fn missing_env_exits_with_config_error_before_any_request() {
    let server = MockServer::start();
    let any = server.mock(|when, then| {
        when.path_contains("/");
        then.status(500);
    });
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = Command::cargo_bin("jira-relay").unwrap();
    cmd.env_clear()
        .current_dir(dir.path())
        .env("GITHUB_API_URL", server.base_url())
        .env("TARGET_REPO_OWNER", "acme")
        .arg("create-issue");
    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("GITHUB_TOKEN"))
        .stderr(predicate::str::contains("TARGET_REPO_NAME"))
        .stderr(predicate::str::contains("JIRA_ISSUE_KEY"));

    assert_eq!(any.hits(), 0);
}

#[test]
fn existing_issue_is_reported_and_exported() {
    let server = MockServer::start();
    let search = server.mock(|when, then| {
        when.method(GET)
            .path("/search/issues")
            .query_param("q", "repo:acme/app PROJ-42 in:title,body type:issue state:open")
            .query_param("per_page", "1");
        then.status(200).json_body(json!({
            "total_count": 1,
            "items": [{
                "number": 12,
                "node_id": "I_12",
                "html_url": "https://github.com/acme/app/issues/12",
                "title": "[PROJ-42] Add export",
                "state": "open",
                "assignees": [],
                "labels": []
            }]
        }));
    });
    let create = server.mock(|when, then| {
        when.method(POST).path("/repos/acme/app/issues");
        then.status(201);
    });

    let dir = tempfile::tempdir().unwrap();
    let env_file = dir.path().join("github_env");

    relay(&server, dir.path())
        .env("JIRA_ISSUE_KEY", "PROJ-42")
        .env("GITHUB_ENV", &env_file)
        .arg("create-issue")
        .assert()
        .success()
        .stdout(predicate::str::contains("Issue #12 already exists"))
        .stdout(predicate::str::contains("::notice title=Existing issue::"));

    search.assert();
    assert_eq!(create.hits(), 0);
    let exported = std::fs::read_to_string(&env_file).unwrap();
    assert_eq!(exported, "ISSUE_NUMBER=12\n");
}

#[test]
fn assign_rejects_non_numeric_issue() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();

    relay(&server, dir.path())
        .env("ISSUE_NUMBER", "twelve")
        .env("CONTEXT_BRANCH", "jira/proj-42")
        .arg("assign")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("ISSUE_NUMBER"));
}

#[test]
fn sync_context_publishes_docs_and_exports_branch() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/repos/acme/app");
        then.status(200).json_body(json!({ "default_branch": "main" }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/repos/acme/app/git/ref/heads/jira/proj-42");
        then.status(404).json_body(json!({ "message": "Not Found" }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/repos/acme/app/git/ref/heads/main");
        then.status(200)
            .json_body(json!({ "ref": "refs/heads/main", "object": { "sha": "abc123" } }));
    });
    let create_ref = server.mock(|when, then| {
        when.method(POST)
            .path("/repos/acme/app/git/refs")
            .json_body(json!({ "ref": "refs/heads/jira/proj-42", "sha": "abc123" }));
        then.status(201).json_body(json!({}));
    });
    server.mock(|when, then| {
        when.method(GET).path_contains("/repos/acme/app/contents/");
        then.status(404).json_body(json!({ "message": "Not Found" }));
    });
    let put = server.mock(|when, then| {
        when.method(PUT)
            .path("/repos/acme/app/contents/docs/overview.md")
            .body_contains("Sync project context: docs/overview.md for PROJ-42");
        then.status(201).json_body(json!({}));
    });

    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("docs")).unwrap();
    std::fs::write(dir.path().join("docs/overview.md"), "# Overview\n").unwrap();
    let env_file = dir.path().join("github_env");

    relay(&server, dir.path())
        .env("JIRA_ISSUE_KEY", "PROJ-42")
        .env("GITHUB_ENV", &env_file)
        .arg("sync-context")
        .assert()
        .success()
        .stdout(predicate::str::contains("Synced 1/1 files to jira/proj-42"));

    create_ref.assert();
    put.assert();
    let exported = std::fs::read_to_string(&env_file).unwrap();
    assert_eq!(exported, "CONTEXT_BRANCH=jira/proj-42\n");
}

#[test]
fn sync_context_without_docs_fails() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/repos/acme/app");
        then.status(200).json_body(json!({ "default_branch": "main" }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/repos/acme/app/git/ref/heads/jira/proj-42");
        then.status(200)
            .json_body(json!({ "object": { "sha": "abc123" } }));
    });
    let dir = tempfile::tempdir().unwrap();

    relay(&server, dir.path())
        .env("JIRA_ISSUE_KEY", "PROJ-42")
        .arg("sync-context")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("docs directory not found"));
}

#[test]
fn schema_describes_settings() {
    Command::cargo_bin("jira-relay")
        .unwrap()
        .arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains("strategies"))
        .stdout(predicate::str::contains("opaque-id-mutation"));
}

#[test]
fn invalid_settings_file_is_config_error() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".jira-relay.toml"), "timeout_secs = 0\n").unwrap();

    relay(&server, dir.path())
        .env("JIRA_ISSUE_KEY", "PROJ-42")
        .arg("create-issue")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("timeout_secs"));
}

#[test]
fn schema_does_not_read_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".jira-relay.toml"), "timeout_secs = 0\n").unwrap();

    Command::cargo_bin("jira-relay")
        .unwrap()
        .current_dir(dir.path())
        .arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains("timeout_secs"));
}

fn assign(server: &MockServer, cwd: &std::path::Path) -> Command {
    let mut cmd = relay(server, cwd);
    cmd.env("ISSUE_NUMBER", "7")
        .env("CONTEXT_BRANCH", "jira/proj-42")
        .arg("assign");
    cmd
}

fn issue_json(assignees: &[&str]) -> serde_json::Value {
    json!({
        "number": 7,
        "node_id": "I_7",
        "html_url": "https://github.com/acme/app/issues/7",
        "title": "[PROJ-42] Add export",
        "state": "open",
        "assignees": assignees.iter().map(|l| json!({ "login": l })).collect::<Vec<_>>(),
        "labels": []
    })
}

#[test]
fn assign_exits_unnotified_when_nothing_lands() {
    let server = MockServer::start();
    let get_issue = server.mock(|when, then| {
        when.method(GET).path("/repos/acme/app/issues/7");
        then.status(500).body("boom");
    });
    let comments = server.mock(|when, then| {
        when.method(POST).path("/repos/acme/app/issues/7/comments");
        then.status(500).body("boom");
    });
    let assignees = server.mock(|when, then| {
        when.method(POST).path("/repos/acme/app/issues/7/assignees");
        then.status(500).body("boom");
    });
    server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(500).body("boom");
    });
    let dir = tempfile::tempdir().unwrap();

    assign(&server, dir.path())
        .assert()
        .code(5)
        .stdout(predicate::str::contains("::warning title=Instructions not posted::"))
        .stderr(predicate::str::contains(
            "issue #7 was neither assigned nor commented on",
        ));

    get_issue.assert();
    assignees.assert();
    // Instructions, then the mention fallback.
    assert_eq!(comments.hits(), 2);
}

#[test]
fn assign_posts_instructions_then_warns_when_agent_unbound() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/repos/acme/app/issues/7");
        then.status(200).json_body(issue_json(&[]));
    });
    let instructions = server.mock(|when, then| {
        when.method(POST)
            .path("/repos/acme/app/issues/7/comments")
            .body_contains("Implementation Instructions");
        then.status(201).json_body(json!({ "id": 1 }));
    });
    let mention = server.mock(|when, then| {
        when.method(POST)
            .path("/repos/acme/app/issues/7/comments")
            .body_contains("please pick up issue #7");
        then.status(500).body("boom");
    });
    server.mock(|when, then| {
        when.method(POST).path("/repos/acme/app/issues/7/assignees");
        then.status(500).body("boom");
    });
    server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(500).body("boom");
    });
    let dir = tempfile::tempdir().unwrap();

    assign(&server, dir.path())
        .assert()
        .success()
        .stdout(predicate::str::is_match(
            "(?s)Posted instructions on issue #7.*direct-login: Failure.*comment-mention: Failure",
        ).unwrap())
        .stdout(predicate::str::contains("::warning title=Agent not assigned::"));

    instructions.assert();
    mention.assert();
}

#[test]
fn assign_skips_strategies_when_agent_already_assigned() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/repos/acme/app/issues/7");
        then.status(200).json_body(issue_json(&["Copilot"]));
    });
    let comments = server.mock(|when, then| {
        when.method(POST).path("/repos/acme/app/issues/7/comments");
        then.status(201).json_body(json!({ "id": 1 }));
    });
    let assignees = server.mock(|when, then| {
        when.method(POST).path("/repos/acme/app/issues/7/assignees");
        then.status(201).json_body(issue_json(&["Copilot"]));
    });
    let graphql = server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(200).json_body(json!({ "data": null }));
    });
    let dir = tempfile::tempdir().unwrap();

    assign(&server, dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("@Copilot is already assigned"));

    assert_eq!(comments.hits(), 1);
    assert_eq!(assignees.hits(), 0);
    assert_eq!(graphql.hits(), 0);
}
