//! Mock GitHub fixtures shared by the integration tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use serde_json::{Value, json};
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const OWNER: &str = "acme";

/// Mount a JSON response for `GET <path>`.
pub async fn mount_json(server: &MockServer, route: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_json_regex(server: &MockServer, pattern: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path_regex(pattern))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn commit(sha: &str, login: &str, message: &str, date: &str) -> Value {
    json!({
        "sha": sha,
        "author": { "login": login },
        "commit": { "message": message, "author": { "date": date } }
    })
}

fn pull(number: u64, day: u32) -> Value {
    json!({
        "number": number,
        "created_at": format!("2024-01-{day:02}T08:00:00Z"),
        "merged_at": format!("2024-01-{:02}T08:00:00Z", day + 2),
    })
}

fn run(conclusion: &str, attempt: u32, day: u32) -> Value {
    json!({
        "conclusion": conclusion,
        "run_attempt": attempt,
        "created_at": format!("2024-01-{day:02}T12:00:00Z"),
    })
}

/// A repository with activity in January 2024 that exercises every metric.
///
/// Expected values for the window 2024-01-01..2024-02-01:
/// - branch: 400 bytes in 2 files
/// - commits: alice 3, bob 1, carol 1; one revert; every commit touches `src/main.rs`
/// - pull requests: 10 in the window, #1-#3 not mergeable, merged after 2 days, 2 reviewers each
/// - issues: one rollback issue and one integration issue, both resolved in the window
/// - workflow `deploy`: runs success/1, success/2, success/1, failure/1, success/3
/// - threads: issue #20 with 2 comments and 10 pull requests with 1 comment each
pub async fn mount_active_repo(server: &MockServer, repo: &str) {
    let base = format!("/repos/{OWNER}/{repo}");

    mount_json(server, &base, json!({ "full_name": format!("{OWNER}/{repo}"), "default_branch": "main" })).await;
    mount_json(server, &format!("{base}/git/ref/heads/main"), json!({ "object": { "sha": "head1" } })).await;
    mount_json(
        server,
        &format!("{base}/git/trees/head1"),
        json!({
            "tree": [
                { "path": "README.md", "type": "blob", "size": 100 },
                { "path": "src", "type": "tree" },
                { "path": "src/main.rs", "type": "blob", "size": 300 }
            ],
            "truncated": false
        }),
    )
    .await;

    mount_json(
        server,
        &format!("{base}/commits"),
        json!([
            commit("c1", "alice", "Add login endpoint", "2024-01-03T10:00:00Z"),
            commit("c2", "alice", "Revert \"Add login endpoint\"", "2024-01-04T10:00:00Z"),
            commit("c3", "alice", "Add login endpoint again", "2024-01-05T10:00:00Z"),
            commit("c4", "bob", "Fix typo", "2024-01-06T10:00:00Z"),
            commit("c5", "carol", "Bump dependencies", "2024-01-07T10:00:00Z"),
        ]),
    )
    .await;
    mount_json_regex(
        server,
        &format!("^{base}/commits/c[0-9]+$"),
        json!({ "files": [ { "filename": "src/main.rs" } ] }),
    )
    .await;

    let mut pulls: Vec<Value> = (1..=10).rev().map(|n| pull(n, 10 + u32::try_from(n).unwrap())).collect();
    pulls.push(json!({ "number": 99, "created_at": "2023-12-15T08:00:00Z", "merged_at": null }));
    mount_json(server, &format!("{base}/pulls"), Value::Array(pulls)).await;

    for number in 1..=3 {
        Mock::given(method("GET"))
            .and(path(format!("{base}/pulls/{number}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "mergeable": false })))
            .with_priority(1)
            .mount(server)
            .await;
    }
    mount_json_regex(server, &format!("^{base}/pulls/[0-9]+$"), json!({ "mergeable": true })).await;
    mount_json_regex(
        server,
        &format!("^{base}/pulls/[0-9]+/reviews$"),
        json!([
            { "user": { "login": "dan" } },
            { "user": { "login": "erin" } },
            { "user": { "login": "dan" } }
        ]),
    )
    .await;
    mount_json_regex(server, &format!("^{base}/pulls/[0-9]+/comments$"), json!([ { "id": 1 } ])).await;

    Mock::given(method("GET"))
        .and(path(format!("{base}/issues")))
        .and(query_param("labels", "bug-integration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "number": 22,
                "created_at": "2024-01-05T09:00:00Z",
                "closed_at": "2024-01-06T09:00:00Z",
                "labels": [ { "name": "bug-integration" } ]
            }
        ])))
        .with_priority(1)
        .mount(server)
        .await;
    mount_json(
        server,
        &format!("{base}/issues"),
        json!([
            {
                "number": 20,
                "created_at": "2024-01-03T09:00:00Z",
                "closed_at": "2024-01-10T09:00:00Z",
                "labels": [ { "name": "Rollback-Prod" } ]
            },
            {
                "number": 21,
                "created_at": "2024-01-04T09:00:00Z",
                "closed_at": null,
                "labels": [ { "name": "bug" } ]
            },
            {
                "number": 5,
                "created_at": "2024-01-15T08:00:00Z",
                "closed_at": "2024-01-17T08:00:00Z",
                "labels": [ { "name": "rollback" } ],
                "pull_request": { "url": "https://api.github.com/repos/acme/api/pulls/5" }
            }
        ]),
    )
    .await;
    mount_json(server, &format!("{base}/issues/20/comments"), json!([ { "id": 1 }, { "id": 2 } ])).await;

    mount_json(
        server,
        &format!("{base}/actions/workflows"),
        json!({ "total_count": 2, "workflows": [ { "id": 3, "name": "lint" }, { "id": 7, "name": "deploy" } ] }),
    )
    .await;
    mount_json(
        server,
        &format!("{base}/actions/workflows/7/runs"),
        json!({
            "total_count": 5,
            "workflow_runs": [
                run("success", 1, 5),
                run("success", 2, 6),
                run("success", 1, 7),
                run("failure", 1, 8),
                run("success", 3, 9)
            ]
        }),
    )
    .await;
}

/// A repository with a branch and commits but without the configured workflow.
///
/// The commit listing also returns one commit by carol authored on 2023-12-31, which the
/// server would normally filter out and which must not count for January 2024. Expected
/// values: alice 3 and bob 2 commits, each touching `x/y.rs`; one 10-byte file on `main`.
pub async fn mount_team_repo(server: &MockServer, repo: &str) {
    let base = format!("/repos/{OWNER}/{repo}");

    mount_json(server, &base, json!({ "full_name": format!("{OWNER}/{repo}") })).await;
    mount_json(server, &format!("{base}/git/ref/heads/main"), json!({ "object": { "sha": "head2" } })).await;
    mount_json(
        server,
        &format!("{base}/git/trees/head2"),
        json!({ "tree": [ { "path": "x/y.rs", "type": "blob", "size": 10 } ], "truncated": false }),
    )
    .await;

    mount_json(
        server,
        &format!("{base}/commits"),
        json!([
            commit("t1", "alice", "Add parser", "2024-01-02T10:00:00Z"),
            commit("t2", "bob", "Add lexer", "2024-01-03T10:00:00Z"),
            commit("t3", "alice", "Handle comments", "2024-01-04T10:00:00Z"),
            commit("t4", "bob", "Fix off-by-one", "2024-01-05T10:00:00Z"),
            commit("t5", "alice", "Add error spans", "2024-01-06T10:00:00Z"),
            commit("t0", "carol", "Year-end cleanup", "2023-12-31T10:00:00Z"),
        ]),
    )
    .await;
    mount_json_regex(server, &format!("^{base}/commits/t[0-9]+$"), json!({ "files": [ { "filename": "x/y.rs" } ] })).await;

    mount_json(server, &format!("{base}/pulls"), json!([])).await;
    mount_json(server, &format!("{base}/issues"), json!([])).await;
    mount_json(
        server,
        &format!("{base}/actions/workflows"),
        json!({ "total_count": 1, "workflows": [ { "id": 3, "name": "lint" } ] }),
    )
    .await;
}

/// A reachable repository without a `main` branch, activity, or the configured workflow.
pub async fn mount_quiet_repo(server: &MockServer, repo: &str) {
    let base = format!("/repos/{OWNER}/{repo}");

    mount_json(server, &base, json!({ "full_name": format!("{OWNER}/{repo}"), "default_branch": "trunk" })).await;
    mount_json(server, &format!("{base}/commits"), json!([])).await;
    mount_json(server, &format!("{base}/pulls"), json!([])).await;
    mount_json(server, &format!("{base}/issues"), json!([])).await;
    mount_json(server, &format!("{base}/actions/workflows"), json!({ "total_count": 0, "workflows": [] })).await;
}
