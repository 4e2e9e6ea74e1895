// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: a mocked Kubernetes API, an in-memory control plane and a
//! scripted operator.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::io;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use async_trait::async_trait;
use http::{Request, Response};
use kube::client::Body;
use kube::core::ErrorResponse;
use kube::Client;
use tower::Service;

use crate::error::{ProvisionError, Result};
use crate::kubernetes::control_plane::{ControlPlane, Presence};
use crate::prompt::Prompter;
use crate::types::identity::{ResourceIdentity, ResourceKind};
use crate::types::payload::Document;

/// A request received by [`MockService`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: String,
    pub body: String,
}

impl RecordedRequest {
    /// Request body parsed as JSON, `Null` when empty
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap_or(serde_json::Value::Null)
    }
}

/// A mock HTTP service that returns predefined responses based on request paths.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
    hanging: Arc<Mutex<HashSet<(String, String)>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            hanging: Arc::new(Mutex::new(HashSet::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a response for requests with `method` matching the exact path
    pub fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses.lock().unwrap().insert(
            (method.to_string(), path.to_string()),
            (status, body.to_string()),
        );
        self
    }

    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.on("POST", path, status, body)
    }

    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PATCH", path, status, body)
    }

    pub fn on_put(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PUT", path, status, body)
    }

    /// Never answer requests with `method` on the exact path
    pub fn hang(self, method: &str, path: &str) -> Self {
        self.hanging
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()));
        self
    }

    /// Method and path of every request received so far
    pub fn requests(&self) -> Vec<(String, String)> {
        self.recorded()
            .into_iter()
            .map(|r| (r.method, r.path))
            .collect()
    }

    /// Every request received so far, including query and body
    pub fn recorded(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let key = (req.method().to_string(), req.uri().path().to_string());
        let query = req.uri().query().unwrap_or_default().to_string();

        let hangs = self.hanging.lock().unwrap().contains(&key);
        let response = self.responses.lock().unwrap().get(&key).cloned();
        let requests = self.requests.clone();

        Box::pin(async move {
            let body = req.into_body().collect_bytes().await?;
            requests.lock().unwrap().push(RecordedRequest {
                method: key.0.clone(),
                path: key.1.clone(),
                query,
                body: String::from_utf8_lossy(&body).into_owned(),
            });

            if hangs {
                std::future::pending::<()>().await;
            }

            // Default 404 for unmatched requests
            let (status, body) = response.unwrap_or_else(|| {
                (404, not_found_json("resource", &key.1))
            });
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Create a mock namespace JSON response
pub fn namespace_json(name: &str) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": {
            "name": name,
            "uid": "test-uid"
        }
    })
    .to_string()
}

/// Create a mock secret JSON response
pub fn secret_json(name: &str, namespace: &str) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Secret",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "uid": "test-uid"
        },
        "type": "Opaque",
        "data": {}
    })
    .to_string()
}

/// Create a mock config map JSON response
pub fn config_map_json(name: &str, namespace: &str) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "uid": "test-uid"
        },
        "data": {}
    })
    .to_string()
}

/// Create a failure Status response
pub fn status_json(code: u16, reason: &str, message: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
    .to_string()
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    status_json(404, "NotFound", &format!("{} \"{}\" not found", resource, name))
}

/// A control plane call recorded by [`FakeControlPlane`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    NamespaceExists(String),
    CreateNamespace(String),
    ResourceExists(ResourceKind, String),
    Create(ResourceKind, String),
    Apply(ResourceKind, String),
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Call::CreateNamespace(_) | Call::Create(..) | Call::Apply(..)
        )
    }
}

type StoreKey = (ResourceKind, String, String);

/// In-memory control plane recording every call made against it
#[derive(Default)]
pub struct FakeControlPlane {
    namespaces: Mutex<BTreeSet<String>>,
    stored: Mutex<BTreeMap<StoreKey, serde_json::Value>>,
    calls: Mutex<Vec<Call>>,
    probe_failures: Mutex<HashMap<String, VecDeque<u16>>>,
    write_failure: Mutex<Option<u16>>,
}

impl FakeControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(self, name: &str) -> Self {
        self.namespaces.lock().unwrap().insert(name.to_string());
        self
    }

    /// Seed an existing resource (and its namespace)
    pub fn with_resource(self, kind: ResourceKind, name: &str, namespace: &str) -> Self {
        self.stored.lock().unwrap().insert(
            (kind, name.to_string(), namespace.to_string()),
            serde_json::json!({"seeded": true}),
        );
        self.with_namespace(namespace)
    }

    /// The next probes of `target` (`name` for namespaces, `namespace/name`
    /// otherwise) fail with these HTTP status codes, in order
    pub fn failing_probes(self, target: &str, codes: &[u16]) -> Self {
        self.probe_failures
            .lock()
            .unwrap()
            .entry(target.to_string())
            .or_default()
            .extend(codes);
        self
    }

    /// Every create and apply fails with this HTTP status code
    pub fn failing_writes(self, code: u16) -> Self {
        *self.write_failure.lock().unwrap() = Some(code);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    /// Stored document of a namespaced resource, as JSON
    pub fn stored(&self, kind: ResourceKind, name: &str, namespace: &str) -> Option<serde_json::Value> {
        self.stored
            .lock()
            .unwrap()
            .get(&(kind, name.to_string(), namespace.to_string()))
            .cloned()
    }

    pub fn has_namespace(&self, name: &str) -> bool {
        self.namespaces.lock().unwrap().contains(name)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_probe_failure(&self, target: &str) -> Result<()> {
        let mut failures = self.probe_failures.lock().unwrap();
        match failures.get_mut(target).and_then(VecDeque::pop_front) {
            Some(code) => Err(api_error(code)),
            None => Ok(()),
        }
    }

    fn write_failure(&self) -> Result<()> {
        match *self.write_failure.lock().unwrap() {
            Some(code) => Err(api_error(code)),
            None => Ok(()),
        }
    }

    fn key(document: &Document) -> StoreKey {
        (
            document.kind(),
            document.name().to_string(),
            document.namespace().unwrap_or_default().to_string(),
        )
    }
}

#[async_trait]
impl ControlPlane for FakeControlPlane {
    async fn namespace_exists(&self, name: &str) -> Result<Presence> {
        self.record(Call::NamespaceExists(name.to_string()));
        self.next_probe_failure(name)?;
        Ok(presence(self.has_namespace(name)))
    }

    async fn create_namespace(&self, name: &str) -> Result<()> {
        self.record(Call::CreateNamespace(name.to_string()));
        self.write_failure()?;
        if !self.namespaces.lock().unwrap().insert(name.to_string()) {
            return Err(api_error(409));
        }
        Ok(())
    }

    async fn resource_exists(
        &self,
        kind: ResourceKind,
        name: &str,
        namespace: &str,
    ) -> Result<Presence> {
        let target = format!("{}/{}", namespace, name);
        self.record(Call::ResourceExists(kind, target.clone()));
        self.next_probe_failure(&target)?;
        let key = (kind, name.to_string(), namespace.to_string());
        Ok(presence(self.stored.lock().unwrap().contains_key(&key)))
    }

    async fn create_resource(&self, document: &Document) -> Result<()> {
        let key = Self::key(document);
        self.record(Call::Create(key.0, format!("{}/{}", key.2, key.1)));
        self.write_failure()?;

        let mut stored = self.stored.lock().unwrap();
        if stored.contains_key(&key) {
            return Err(api_error(409));
        }
        stored.insert(key, serde_json::to_value(document)?);
        Ok(())
    }

    async fn apply_resource(&self, document: &Document) -> Result<()> {
        let key = Self::key(document);
        self.record(Call::Apply(key.0, format!("{}/{}", key.2, key.1)));
        self.write_failure()?;

        self.stored
            .lock()
            .unwrap()
            .insert(key, serde_json::to_value(document)?);
        Ok(())
    }
}

fn presence(exists: bool) -> Presence {
    if exists {
        Presence::Present
    } else {
        Presence::Absent
    }
}

/// A kube API error with the given HTTP status code
pub fn api_error(code: u16) -> ProvisionError {
    ProvisionError::KubeError(kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: format!("fake failure {}", code),
        reason: "Fake".to_string(),
        code,
    }))
}

/// Prompter answering from a fixed script and remembering what it was asked
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            asked: Vec::new(),
        }
    }

    /// Questions asked so far, overwrite confirmations as `Overwrite <identity>?`
    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    fn answer(&mut self, question: String) -> Result<String> {
        self.asked.push(question.clone());
        self.answers.pop_front().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("no scripted answer for '{}'", question),
            )
            .into()
        })
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm_overwrite(&mut self, identity: &ResourceIdentity) -> Result<bool> {
        let answer = self.answer(format!("Overwrite {}?", identity))?;
        Ok(answer.trim().eq_ignore_ascii_case("y"))
    }

    fn prompt_value(&mut self, label: &str) -> Result<String> {
        self.answer(label.to_string())
    }
}
