//! Scripted in-memory [`RemoteCi`] for unit tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::{PutContents, RemoteCi, RemoteDownload, RemoteReply, WorkflowDispatch};
use crate::error::{Error, Result};
use crate::types::StoragePath;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// A remote call as observed by the fake
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Call {
    GetContents(String),
    PutContents(String, PutContents),
    Dispatch(WorkflowDispatch),
    ListRuns(u32),
    ListArtifacts(String),
    Download(u64),
}

/// Scripted outcome of one call
#[derive(Clone, Debug)]
pub(crate) enum Scripted {
    Reply(u16, String),
    /// Transport-level failure (connection refused)
    Fail(String),
}

impl Scripted {
    pub(crate) fn json(status: u16, body: serde_json::Value) -> Self {
        Scripted::Reply(status, body.to_string())
    }

    pub(crate) fn empty(status: u16) -> Self {
        Scripted::Reply(status, String::new())
    }

    fn into_reply(self) -> Result<RemoteReply> {
        match self {
            Scripted::Reply(status, body) => Ok(RemoteReply::new(status, body)),
            Scripted::Fail(message) => Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                message,
            ))),
        }
    }
}

/// Queue of outcomes; the last one repeats forever
#[derive(Default)]
struct Script(VecDeque<Scripted>);

impl Script {
    fn next(&mut self, fallback: Scripted) -> Scripted {
        match self.0.len() {
            0 => fallback,
            1 => self.0[0].clone(),
            _ => self.0.pop_front().unwrap_or(fallback),
        }
    }
}

#[derive(Default)]
struct Scripts {
    contents: Script,
    put: Script,
    dispatch: Script,
    runs: Script,
    artifacts: HashMap<String, Script>,
    downloads: HashMap<u64, (u16, Vec<Bytes>)>,
}

/// Records every call and answers from per-endpoint scripts
///
/// Unscripted endpoints answer 404, except dispatch (204) and put (201).
#[derive(Default)]
pub(crate) struct FakeRemote {
    scripts: Mutex<Scripts>,
    calls: Mutex<Vec<Call>>,
}

impl FakeRemote {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on_get_contents(&self, outcome: Scripted) -> &Self {
        self.scripts.lock().unwrap().contents.0.push_back(outcome);
        self
    }

    pub(crate) fn on_put_contents(&self, outcome: Scripted) -> &Self {
        self.scripts.lock().unwrap().put.0.push_back(outcome);
        self
    }

    pub(crate) fn on_dispatch(&self, outcome: Scripted) -> &Self {
        self.scripts.lock().unwrap().dispatch.0.push_back(outcome);
        self
    }

    pub(crate) fn on_list_runs(&self, outcome: Scripted) -> &Self {
        self.scripts.lock().unwrap().runs.0.push_back(outcome);
        self
    }

    pub(crate) fn on_list_artifacts(&self, url: &str, outcome: Scripted) -> &Self {
        self.scripts
            .lock()
            .unwrap()
            .artifacts
            .entry(url.to_string())
            .or_default()
            .0
            .push_back(outcome);
        self
    }

    pub(crate) fn on_download(&self, artifact_id: u64, status: u16, chunks: Vec<Bytes>) -> &Self {
        self.scripts
            .lock()
            .unwrap()
            .downloads
            .insert(artifact_id, (status, chunks));
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RemoteCi for FakeRemote {
    async fn get_contents(&self, path: &StoragePath) -> Result<RemoteReply> {
        self.record(Call::GetContents(path.to_string()));
        let outcome = self
            .scripts
            .lock()
            .unwrap()
            .contents
            .next(Scripted::Reply(404, "{\"message\":\"Not Found\"}".into()));
        outcome.into_reply()
    }

    async fn put_contents(&self, path: &StoragePath, body: &PutContents) -> Result<RemoteReply> {
        self.record(Call::PutContents(path.to_string(), body.clone()));
        let outcome = self
            .scripts
            .lock()
            .unwrap()
            .put
            .next(Scripted::Reply(201, "{}".into()));
        outcome.into_reply()
    }

    async fn dispatch_workflow(&self, body: &WorkflowDispatch) -> Result<RemoteReply> {
        self.record(Call::Dispatch(body.clone()));
        let outcome = self
            .scripts
            .lock()
            .unwrap()
            .dispatch
            .next(Scripted::empty(204));
        outcome.into_reply()
    }

    async fn list_runs(&self, per_page: u32) -> Result<RemoteReply> {
        self.record(Call::ListRuns(per_page));
        let outcome = self
            .scripts
            .lock()
            .unwrap()
            .runs
            .next(Scripted::Reply(404, String::new()));
        outcome.into_reply()
    }

    async fn list_artifacts(&self, artifacts_url: &str) -> Result<RemoteReply> {
        self.record(Call::ListArtifacts(artifacts_url.to_string()));
        let outcome = self
            .scripts
            .lock()
            .unwrap()
            .artifacts
            .entry(artifacts_url.to_string())
            .or_default()
            .next(Scripted::Reply(404, String::new()));
        outcome.into_reply()
    }

    async fn download_artifact(&self, artifact_id: u64) -> Result<RemoteDownload> {
        self.record(Call::Download(artifact_id));
        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .downloads
            .get(&artifact_id)
            .cloned();
        match scripted {
            Some((status, chunks)) => {
                let len: usize = chunks.iter().map(Bytes::len).sum();
                Ok(RemoteDownload {
                    status,
                    content_length: Some(len as u64),
                    body: futures::stream::iter(chunks.into_iter().map(Ok)).boxed(),
                })
            }
            None => Ok(RemoteDownload::from_bytes(404, "Not Found")),
        }
    }
}
