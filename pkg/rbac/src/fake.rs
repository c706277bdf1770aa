//! In-memory [`ClusterClient`] for tests.
//!
//! Objects are kept as JSON keyed by kind, namespace and name. Calls are
//! recorded, failures can be injected per operation and name, and token
//! secrets can be set to populate only after a number of reads.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use pkg_kubectl::{ClusterClient, ClusterError, ExecError, ListOptions};
use pkg_types::kind::{ResourceId, ResourceKind};
use pkg_types::resource::Resource;
use serde_json::{Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FakeOp {
    Get,
    List,
    Create,
    Apply,
    Delete,
}

type Key = (ResourceKind, Option<String>, String);

#[derive(Default)]
struct State {
    objects: BTreeMap<Key, Value>,
    calls: Vec<(FakeOp, ResourceId)>,
    failures: Vec<(FakeOp, String)>,
    gets: HashMap<ResourceId, usize>,
    /// Token secrets created from now on get `data.token` on this read.
    token_on_get: Option<(usize, String)>,
    pending_tokens: HashMap<ResourceId, (usize, String)>,
    config_view: Value,
    version: Value,
}

#[derive(Default)]
pub struct FakeCluster {
    state: Mutex<State>,
}

fn key_of(id: &ResourceId) -> Key {
    (id.kind, id.namespace.clone(), id.name.clone())
}

fn id_of(manifest: &Value) -> Result<ResourceId, ClusterError> {
    let kind = manifest
        .get("kind")
        .and_then(Value::as_str)
        .and_then(ResourceKind::from_kind)
        .ok_or_else(|| ClusterError::Decode("manifest without a known kind".to_string()))?;
    let name = manifest
        .pointer("/metadata/name")
        .and_then(Value::as_str)
        .ok_or_else(|| ClusterError::Decode("manifest without a name".to_string()))?;
    Ok(match manifest.pointer("/metadata/namespace").and_then(Value::as_str) {
        Some(ns) if kind.is_namespaced() => ResourceId::namespaced(kind, name, ns),
        _ => ResourceId::cluster(kind, name),
    })
}

fn injected(what: &str) -> ClusterError {
    ClusterError::Exec(ExecError::Failed {
        code: Some(1),
        signal: None,
        stderr: format!("injected failure for {}", what),
    })
}

fn matches_selector(obj: &Value, selector: &str, root: &str) -> bool {
    selector.split(',').filter(|s| !s.is_empty()).all(|pair| {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        let actual = if root == "labels" {
            obj.pointer("/metadata/labels").and_then(|l| l.get(k))
        } else {
            obj.get(k)
        };
        actual.and_then(Value::as_str) == Some(v)
    })
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed an object as-is, bypassing failure injection and labels.
    pub fn insert<T: Resource>(&self, obj: &T) {
        let value = serde_json::to_value(obj).unwrap_or(Value::Null);
        let id = obj.id();
        self.lock().objects.insert(key_of(&id), value);
    }

    pub fn insert_raw(&self, id: &ResourceId, value: Value) {
        self.lock().objects.insert(key_of(id), value);
    }

    pub fn object(&self, id: &ResourceId) -> Option<Value> {
        self.lock().objects.get(&key_of(id)).cloned()
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.lock().objects.contains_key(&key_of(id))
    }

    /// Fail every `op` whose target name equals `name` (for lists: the kind's CLI name).
    pub fn fail_on(&self, op: FakeOp, name: &str) {
        self.lock().failures.push((op, name.to_string()));
    }

    /// Token secrets created after this call show `token` from their `nth` read on.
    pub fn populate_tokens_on_get(&self, nth: usize, token: &str) {
        self.lock().token_on_get = Some((nth, token.to_string()));
    }

    pub fn set_config_view(&self, value: Value) {
        self.lock().config_view = value;
    }

    pub fn set_version(&self, value: Value) {
        self.lock().version = value;
    }

    pub fn calls(&self) -> Vec<(FakeOp, ResourceId)> {
        self.lock().calls.clone()
    }

    pub fn count(&self, op: FakeOp) -> usize {
        self.lock().calls.iter().filter(|(o, _)| *o == op).count()
    }

    pub fn count_kind(&self, op: FakeOp, kind: ResourceKind) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|(o, id)| *o == op && id.kind == kind)
            .count()
    }

    pub fn gets_of(&self, id: &ResourceId) -> usize {
        self.lock().gets.get(id).copied().unwrap_or(0)
    }

    fn record(&self, op: FakeOp, id: &ResourceId) -> Result<(), ClusterError> {
        let mut state = self.lock();
        state.calls.push((op, id.clone()));
        if state.failures.iter().any(|(o, n)| *o == op && *n == id.name) {
            return Err(injected(&id.to_string()));
        }
        Ok(())
    }

    fn insert_new(&self, id: &ResourceId, mut manifest: Value) {
        let mut state = self.lock();
        if let Some(meta) = manifest.get_mut("metadata").and_then(Value::as_object_mut) {
            meta.insert("uid".to_string(), json!(format!("uid-{}", state.objects.len())));
            meta.insert(
                "creationTimestamp".to_string(),
                json!(chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)),
            );
        }
        if id.kind == ResourceKind::Secret
            && manifest.get("type").and_then(Value::as_str)
                == Some(pkg_constants::token::SERVICE_ACCOUNT_TOKEN_TYPE)
            && let Some(program) = state.token_on_get.clone()
        {
            state.pending_tokens.insert(id.clone(), program);
        }
        state.objects.insert(key_of(id), manifest);
    }
}

#[async_trait]
impl ClusterClient for FakeCluster {
    async fn get(&self, id: &ResourceId) -> Result<Value, ClusterError> {
        self.record(FakeOp::Get, id)?;
        let mut state = self.lock();
        let reads = {
            let n = state.gets.entry(id.clone()).or_insert(0);
            *n += 1;
            *n
        };
        if let Some((nth, token)) = state.pending_tokens.get(id).cloned()
            && reads >= nth
        {
            state.pending_tokens.remove(id);
            if let Some(obj) = state.objects.get_mut(&key_of(id)) {
                obj["data"] = json!({
                    "token": STANDARD.encode(token.as_bytes()),
                    "ca.crt": STANDARD.encode(b"fake-ca"),
                });
            }
        }
        state
            .objects
            .get(&key_of(id))
            .cloned()
            .ok_or_else(|| ClusterError::NotFound(id.to_string()))
    }

    async fn list(
        &self,
        kind: ResourceKind,
        opts: &ListOptions,
    ) -> Result<Vec<Value>, ClusterError> {
        let scope = match (&opts.namespace, kind.is_namespaced()) {
            (Some(ns), true) => ResourceId::namespaced(kind, kind.cli_name(), ns),
            _ => ResourceId::cluster(kind, kind.cli_name()),
        };
        self.record(FakeOp::List, &scope)?;
        let state = self.lock();
        Ok(state
            .objects
            .iter()
            .filter(|((k, ns, _), _)| {
                *k == kind
                    && (!kind.is_namespaced()
                        || opts.namespace.is_none()
                        || ns.as_deref() == opts.namespace.as_deref())
            })
            .map(|(_, v)| v)
            .filter(|v| {
                opts.label_selector
                    .as_deref()
                    .is_none_or(|s| matches_selector(v, s, "labels"))
                    && opts
                        .field_selector
                        .as_deref()
                        .is_none_or(|s| matches_selector(v, s, "fields"))
            })
            .cloned()
            .collect())
    }

    async fn create(&self, manifest: &Value) -> Result<(), ClusterError> {
        let id = id_of(manifest)?;
        self.record(FakeOp::Create, &id)?;
        if self.contains(&id) {
            return Err(ClusterError::AlreadyExists(id.to_string()));
        }
        self.insert_new(&id, manifest.clone());
        Ok(())
    }

    async fn apply(&self, manifest: &Value) -> Result<(), ClusterError> {
        let id = id_of(manifest)?;
        self.record(FakeOp::Apply, &id)?;
        if self.contains(&id) {
            self.lock().objects.insert(key_of(&id), manifest.clone());
        } else {
            self.insert_new(&id, manifest.clone());
        }
        Ok(())
    }

    async fn delete(&self, id: &ResourceId, ignore_not_found: bool) -> Result<(), ClusterError> {
        self.record(FakeOp::Delete, id)?;
        let removed = self.lock().objects.remove(&key_of(id));
        match removed {
            Some(_) => Ok(()),
            None if ignore_not_found => Ok(()),
            None => Err(ClusterError::NotFound(id.to_string())),
        }
    }

    async fn config_view_raw(&self) -> Result<Value, ClusterError> {
        Ok(self.lock().config_view.clone())
    }

    async fn server_version(&self) -> Result<Value, ClusterError> {
        Ok(self.lock().version.clone())
    }
}
