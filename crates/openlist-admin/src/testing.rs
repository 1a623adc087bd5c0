//! Scripted in-memory backend for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::api::PluginApi;
use crate::envelope::Envelope;
use crate::error::{AdminError, Result};
use crate::types::{Plugin, PluginStatus, UpdateCheck, UpdateMap};

pub fn plugin(id: &str) -> Plugin {
    Plugin {
        id: id.to_owned(),
        name: format!("{id} plugin"),
        version: "1.0.0".to_owned(),
        author: "tester".to_owned(),
        description: String::new(),
        icon_url: None,
        source_url: format!("https://github.com/example/{id}"),
        wasm_path: None,
        status: PluginStatus::Active,
        message: String::new(),
    }
}

/// A request the mock received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List,
    CheckOne(String),
    CheckAll,
    Update(String),
    Uninstall(String),
    Install(String),
    Upload { file_name: String, size: usize },
}

type Reply<T> = Result<Envelope<T>>;
pub type Gate<T> = oneshot::Sender<Reply<T>>;

enum Scripted<T> {
    Ready(Reply<T>),
    Gated(oneshot::Receiver<Reply<T>>),
}

struct Script<T>(Mutex<VecDeque<Scripted<T>>>);

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self(Mutex::new(VecDeque::new()))
    }
}

impl<T> Script<T> {
    fn push(&self, reply: Reply<T>) {
        self.0.lock().unwrap().push_back(Scripted::Ready(reply));
    }

    fn gated(&self) -> Gate<T> {
        let (tx, rx) = oneshot::channel();
        self.0.lock().unwrap().push_back(Scripted::Gated(rx));
        tx
    }

    async fn next(&self, fallback: impl FnOnce() -> Reply<T>) -> Reply<T> {
        let scripted = self.0.lock().unwrap().pop_front();
        match scripted {
            None => fallback(),
            Some(Scripted::Ready(reply)) => reply,
            Some(Scripted::Gated(rx)) => rx.await.unwrap_or_else(|_| {
                Err(AdminError::Http {
                    status: 499,
                    path: "gate dropped".into(),
                })
            }),
        }
    }
}

fn unscripted<T>() -> Reply<T> {
    Ok(Envelope::failure(500, "no scripted response"))
}

/// [`PluginApi`] that replays queued replies and records every call.
///
/// Unscripted `list` calls succeed with an empty list; every other
/// unscripted call gets a failure envelope.
#[derive(Default)]
pub struct MockApi {
    calls: Mutex<Vec<Call>>,
    list: Script<Vec<Plugin>>,
    check_one: Script<UpdateCheck>,
    check_all: Script<UpdateMap>,
    update: Script<Plugin>,
    uninstall: Script<String>,
    install: Script<Plugin>,
    upload: Script<Plugin>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_list(&self, reply: Reply<Vec<Plugin>>) {
        self.list.push(reply);
    }

    pub fn push_list_gated(&self) -> Gate<Vec<Plugin>> {
        self.list.gated()
    }

    pub fn push_check_one(&self, reply: Reply<UpdateCheck>) {
        self.check_one.push(reply);
    }

    pub fn push_check_one_gated(&self) -> Gate<UpdateCheck> {
        self.check_one.gated()
    }

    pub fn push_check_all(&self, reply: Reply<UpdateMap>) {
        self.check_all.push(reply);
    }

    pub fn push_update(&self, reply: Reply<Plugin>) {
        self.update.push(reply);
    }

    pub fn push_uninstall(&self, reply: Reply<String>) {
        self.uninstall.push(reply);
    }

    pub fn push_install(&self, reply: Reply<Plugin>) {
        self.install.push(reply);
    }

    pub fn push_install_gated(&self) -> Gate<Plugin> {
        self.install.gated()
    }

    pub fn push_upload(&self, reply: Reply<Plugin>) {
        self.upload.push(reply);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.calls().iter().filter(|c| **c == Call::List).count()
    }

    /// Yield until at least `n` list requests have been issued.
    pub async fn wait_for_list_calls(&self, n: usize) {
        self.wait_for(|api| api.list_calls() >= n).await;
    }

    /// Yield until at least `n` requests of any kind have been issued.
    pub async fn wait_for_calls(&self, n: usize) {
        self.wait_for(|api| api.calls().len() >= n).await;
    }

    async fn wait_for(&self, done: impl Fn(&Self) -> bool) {
        for _ in 0..1_000 {
            if done(self) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("timed out waiting for mock calls: {:?}", self.calls());
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PluginApi for MockApi {
    async fn list(&self) -> Result<Envelope<Vec<Plugin>>> {
        self.record(Call::List);
        self.list.next(|| Ok(Envelope::ok(Vec::new()))).await
    }

    async fn check_one(&self, id: &str) -> Result<Envelope<UpdateCheck>> {
        self.record(Call::CheckOne(id.to_owned()));
        self.check_one.next(unscripted).await
    }

    async fn check_all(&self) -> Result<Envelope<UpdateMap>> {
        self.record(Call::CheckAll);
        self.check_all.next(unscripted).await
    }

    async fn update(&self, id: &str) -> Result<Envelope<Plugin>> {
        self.record(Call::Update(id.to_owned()));
        self.update.next(unscripted).await
    }

    async fn uninstall(&self, id: &str) -> Result<Envelope<String>> {
        self.record(Call::Uninstall(id.to_owned()));
        self.uninstall.next(unscripted).await
    }

    async fn install(&self, source: &str) -> Result<Envelope<Plugin>> {
        self.record(Call::Install(source.to_owned()));
        self.install.next(unscripted).await
    }

    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<Envelope<Plugin>> {
        self.record(Call::Upload {
            file_name: file_name.to_owned(),
            size: bytes.len(),
        });
        self.upload.next(unscripted).await
    }
}
