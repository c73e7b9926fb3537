//! In-memory fake for the `RepoApi` trait (testing only)
//!
//! `ScriptedApi` answers from a fixed table of `(method, path)` rules and
//! records every call in the order it was made, so tests can assert on the
//! exact sequence of remote mutations.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::api::{ApiResponse, ClientResult, RepoApi};
use crate::error::ClientError;

/// A call observed by the fake.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
enum Reply {
    Respond(ApiResponse),
    Fail(String),
}

#[derive(Debug, Clone)]
struct Rule {
    method: &'static str,
    path: String,
    reply: Reply,
}

/// Scripted fake backed by a rule table and a call log.
///
/// Paths are matched without their query string. When several rules match,
/// the most recently added one wins. Unmatched GETs answer 404 and
/// unmatched PATCHes answer 500.
#[derive(Debug, Default)]
pub struct ScriptedApi {
    rules: Vec<Rule>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer GET `path` with `status` and `body`.
    pub fn on_get(self, path: &str, status: u16, body: Value) -> Self {
        self.with_rule("GET", path, Reply::Respond(ApiResponse::new(status, body)))
    }

    /// Answer PATCH `path` with `status` and `body`.
    pub fn on_patch(self, path: &str, status: u16, body: Value) -> Self {
        self.with_rule("PATCH", path, Reply::Respond(ApiResponse::new(status, body)))
    }

    /// Make GET `path` fail at the transport level.
    pub fn fail_get(self, path: &str, reason: &str) -> Self {
        self.with_rule("GET", path, Reply::Fail(reason.to_string()))
    }

    /// Make PATCH `path` fail at the transport level.
    pub fn fail_patch(self, path: &str, reason: &str) -> Self {
        self.with_rule("PATCH", path, Reply::Fail(reason.to_string()))
    }

    /// Convenience: serve a branch listing for `owner/name`.
    pub fn with_branches(self, owner: &str, name: &str, branches: &[&str]) -> Self {
        let body = Value::Array(branches.iter().map(|b| json!({ "name": b })).collect());
        self.on_get(&format!("/repos/{}/{}/branches", owner, name), 200, body)
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Only the PATCH calls, in order.
    pub fn patches(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == "PATCH")
            .collect()
    }

    fn with_rule(mut self, method: &'static str, path: &str, reply: Reply) -> Self {
        self.rules.push(Rule {
            method,
            path: path.to_string(),
            reply,
        });
        self
    }

    fn answer(
        &self,
        method: &'static str,
        path: &str,
        body: Option<&Value>,
    ) -> ClientResult<ApiResponse> {
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            path: path.to_string(),
            body: body.cloned(),
        });

        let bare_path = path.split('?').next().unwrap_or(path);
        let rule = self
            .rules
            .iter()
            .rev()
            .find(|r| r.method == method && r.path == bare_path);

        match rule.map(|r| &r.reply) {
            Some(Reply::Respond(resp)) => Ok(resp.clone()),
            Some(Reply::Fail(reason)) => Err(ClientError::Transport(reason.clone())),
            None if method == "GET" => Ok(ApiResponse::new(404, json!({ "message": "Not Found" }))),
            None => Ok(ApiResponse::new(500, json!({ "message": "Server Error" }))),
        }
    }
}

#[async_trait]
impl RepoApi for ScriptedApi {
    async fn get(&self, path: &str) -> ClientResult<ApiResponse> {
        self.answer("GET", path, None)
    }

    async fn patch(&self, path: &str, body: &Value) -> ClientResult<ApiResponse> {
        self.answer("PATCH", path, Some(body))
    }
}
