//! Realtime key-path store.
//!
//! The dashboard only ever reads from the store through [`DataStore`]:
//! subscribe to a path, receive pushes, unsubscribe. [`MemoryStore`] is the
//! in-process tree the host bridge feeds with backend changes.
//!
//! # Invariants
//! - Every subscription receives the current value of its path on subscribe
//!   (while connected), then one push per write that changes that value.
//! - Handles are allocated monotonically and never reused.
//! - Unsubscribe takes effect immediately; no later write is pushed for the
//!   dropped handle.

use crate::error::StoreError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::mpsc::{channel, Receiver, Sender};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct StorePath {
    segments: Vec<String>,
}

impl StorePath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses `a/b/c`. Leading and trailing slashes are ignored; `""` and `"/"`
    /// address the root.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let trimmed = raw.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        let mut path = Self::root();
        for segment in trimmed.split('/') {
            path = path.child(segment)?;
        }
        Ok(path)
    }

    pub fn child(&self, key: &str) -> Result<Self, StoreError> {
        validate_key(key)?;
        let mut segments = self.segments.clone();
        segments.push(key.to_string());
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    fn is_prefix_of(&self, other: &StorePath) -> bool {
        other.segments.starts_with(&self.segments)
    }

    /// True when a write at one path can change the value seen at the other.
    pub fn overlaps(&self, other: &StorePath) -> bool {
        self.is_prefix_of(other) || other.is_prefix_of(self)
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        f.write_str(&self.segments.join("/"))
    }
}

fn validate_key(key: &str) -> Result<(), StoreError> {
    let reason = if key.is_empty() {
        Some("empty key")
    } else if key
        .chars()
        .any(|c| matches!(c, '.' | '#' | '$' | '[' | ']' | '/'))
    {
        Some("contains one of . # $ [ ] /")
    } else if key.chars().any(char::is_control) {
        Some("contains control characters")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(StoreError::InvalidKey {
            key: key.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SubscriptionHandle(u64);

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// One delivery for one subscription. `value` is `None` when the path holds no
/// data.
#[derive(Debug, Clone, PartialEq)]
pub struct StorePush {
    pub handle: SubscriptionHandle,
    pub path: StorePath,
    pub value: Option<Value>,
}

pub trait DataStore {
    fn subscribe(&mut self, path: &StorePath) -> SubscriptionHandle;
    fn unsubscribe(&mut self, handle: SubscriptionHandle);
}

pub struct MemoryStore {
    root: Value,
    subscriptions: BTreeMap<SubscriptionHandle, StorePath>,
    next_handle: u64,
    connected: bool,
    pushes: Sender<StorePush>,
}

impl MemoryStore {
    pub fn new() -> (Self, Receiver<StorePush>) {
        let (tx, rx) = channel();
        let store = Self {
            root: Value::Null,
            subscriptions: BTreeMap::new(),
            next_handle: 1,
            connected: true,
            pushes: tx,
        };
        (store, rx)
    }

    pub fn get(&self, path: &StorePath) -> Option<Value> {
        read_at(&self.root, path.segments()).cloned()
    }

    /// Writes `value` at `path`. `null` removes the key; objects left empty by a
    /// write collapse to absent.
    pub fn set(&mut self, path: &StorePath, value: Value) {
        let before = self.snapshot_overlapping(path);
        write_at(&mut self.root, path.segments(), normalize(value));
        self.deliver_changes(before);
    }

    pub fn remove(&mut self, path: &StorePath) {
        self.set(path, Value::Null);
    }

    /// Replaces the whole tree, e.g. from a backend JSON export.
    pub fn load(&mut self, root: Value) {
        let before = self.snapshot_overlapping(&StorePath::root());
        self.root = normalize(root);
        self.deliver_changes(before);
    }

    /// While disconnected, writes apply but nothing is delivered. Reconnecting
    /// re-delivers the current value to every live subscription.
    pub fn set_connected(&mut self, connected: bool) {
        let reconnecting = connected && !self.connected;
        self.connected = connected;
        if reconnecting {
            let live: Vec<(SubscriptionHandle, StorePath)> = self
                .subscriptions
                .iter()
                .map(|(h, p)| (*h, p.clone()))
                .collect();
            for (handle, path) in live {
                self.push(handle, path);
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Live subscription count per path, keyed by the path's display form.
    pub fn subscriptions_by_path(&self) -> BTreeMap<String, usize> {
        let mut out = BTreeMap::new();
        for path in self.subscriptions.values() {
            *out.entry(path.to_string()).or_insert(0) += 1;
        }
        out
    }

    fn snapshot_overlapping(
        &self,
        written: &StorePath,
    ) -> Vec<(SubscriptionHandle, StorePath, Option<Value>)> {
        self.subscriptions
            .iter()
            .filter(|(_, path)| path.overlaps(written))
            .map(|(handle, path)| (*handle, path.clone(), self.get(path)))
            .collect()
    }

    fn deliver_changes(&mut self, before: Vec<(SubscriptionHandle, StorePath, Option<Value>)>) {
        if !self.connected {
            return;
        }
        for (handle, path, previous) in before {
            if self.get(&path) != previous {
                self.push(handle, path);
            }
        }
    }

    fn push(&self, handle: SubscriptionHandle, path: StorePath) {
        let value = self.get(&path);
        // The receiver only goes away at shutdown.
        let _ = self.pushes.send(StorePush {
            handle,
            path,
            value,
        });
    }
}

impl DataStore for MemoryStore {
    fn subscribe(&mut self, path: &StorePath) -> SubscriptionHandle {
        let handle = SubscriptionHandle(self.next_handle);
        self.next_handle += 1;
        self.subscriptions.insert(handle, path.clone());
        if self.connected {
            self.push(handle, path.clone());
        }
        handle
    }

    fn unsubscribe(&mut self, handle: SubscriptionHandle) {
        self.subscriptions.remove(&handle);
    }
}

fn is_empty(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.iter().all(Value::is_null),
        _ => false,
    }
}

/// Drops nulls and empty containers anywhere in a written value.
fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let cleaned: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, normalize(v)))
                .filter(|(_, v)| !is_empty(v))
                .collect();
            if cleaned.is_empty() {
                Value::Null
            } else {
                Value::Object(cleaned)
            }
        }
        Value::Array(items) => {
            let cleaned: Vec<Value> = items.into_iter().map(normalize).collect();
            if cleaned.iter().all(Value::is_null) {
                Value::Null
            } else {
                Value::Array(cleaned)
            }
        }
        other => other,
    }
}

fn read_at<'a>(node: &'a Value, segments: &[String]) -> Option<&'a Value> {
    let Some((head, rest)) = segments.split_first() else {
        return if node.is_null() { None } else { Some(node) };
    };
    let child = match node {
        Value::Object(map) => map.get(head)?,
        Value::Array(items) => items.get(head.parse::<usize>().ok()?)?,
        _ => return None,
    };
    read_at(child, rest)
}

/// Array-shaped nodes become keyed objects once written through, the way the
/// backend stores them.
fn array_to_object(items: Vec<Value>) -> Map<String, Value> {
    items
        .into_iter()
        .enumerate()
        .filter(|(_, v)| !v.is_null())
        .map(|(i, v)| (i.to_string(), v))
        .collect()
}

fn write_at(node: &mut Value, segments: &[String], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *node = value;
        return;
    };
    if node.is_array() {
        let items = match node.take() {
            Value::Array(items) => items,
            _ => Vec::new(),
        };
        *node = Value::Object(array_to_object(items));
    }
    if !node.is_object() {
        if value.is_null() {
            return;
        }
        *node = Value::Object(Map::new());
    }
    let Value::Object(map) = node else {
        return;
    };
    let now_empty = {
        let child = map.entry(head.clone()).or_insert(Value::Null);
        write_at(child, rest, value);
        is_empty(child)
    };
    if now_empty {
        map.remove(head);
    }
    if map.is_empty() {
        *node = Value::Null;
    }
}
