//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use netpanel::config::LifecycleConfig;
use netpanel::database::Database;
use netpanel::server::{ServerError, ServerFactory, ServerHandle, ServerKind, ServerState};

/// Operation observed on a fake handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Start,
    Stop,
}

/// One recorded call: `instance` is the n-th handle built for `kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Call {
    pub kind: ServerKind,
    pub instance: u32,
    pub op: Op,
    pub ok: bool,
}

impl Call {
    pub fn ok(kind: ServerKind, instance: u32, op: Op) -> Self {
        Self {
            kind,
            instance,
            op,
            ok: true,
        }
    }
}

/// Injected misbehavior for a specific instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    FailStart,
    FailStop,
    HangStart,
    HangStop,
}

#[derive(Default)]
pub struct Recorder {
    calls: Mutex<Vec<Call>>,
}

impl Recorder {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, kind: ServerKind, op: Op) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.kind == kind && c.op == op)
            .count()
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

pub struct FakeHandle {
    kind: ServerKind,
    instance: u32,
    fault: Option<Fault>,
    running: AtomicBool,
    recorder: Arc<Recorder>,
}

impl FakeHandle {
    pub fn instance(&self) -> u32 {
        self.instance
    }
}

#[async_trait]
impl ServerHandle for FakeHandle {
    fn kind(&self) -> ServerKind {
        self.kind
    }

    fn state(&self) -> ServerState {
        if self.running.load(Ordering::SeqCst) {
            ServerState::Running
        } else {
            ServerState::Stopped
        }
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        None
    }

    async fn start(&self) -> Result<(), ServerError> {
        if self.fault == Some(Fault::HangStart) {
            std::future::pending::<()>().await;
        }
        let ok = self.fault != Some(Fault::FailStart);
        self.recorder.push(Call {
            kind: self.kind,
            instance: self.instance,
            op: Op::Start,
            ok,
        });
        if !ok {
            return Err(ServerError::Task {
                kind: self.kind,
                message: "injected start failure".into(),
            });
        }
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<(), ServerError> {
        if self.fault == Some(Fault::HangStop) {
            std::future::pending::<()>().await;
        }
        let ok = self.fault != Some(Fault::FailStop);
        self.recorder.push(Call {
            kind: self.kind,
            instance: self.instance,
            op: Op::Stop,
            ok,
        });
        self.running.store(false, Ordering::SeqCst);
        if ok {
            Ok(())
        } else {
            Err(ServerError::Task {
                kind: self.kind,
                message: "injected stop failure".into(),
            })
        }
    }
}

/// Factory producing recording fakes, with per-instance faults.
#[derive(Clone, Default)]
pub struct FakeFactory {
    pub recorder: Arc<Recorder>,
    built: Arc<Mutex<HashMap<ServerKind, u32>>>,
    faults: Arc<Mutex<HashMap<(ServerKind, u32), Fault>>>,
}

impl FakeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fault(self, kind: ServerKind, instance: u32, fault: Fault) -> Self {
        self.faults.lock().unwrap().insert((kind, instance), fault);
        self
    }

    pub fn built(&self, kind: ServerKind) -> u32 {
        self.built.lock().unwrap().get(&kind).copied().unwrap_or(0)
    }
}

impl ServerFactory for FakeFactory {
    fn build(&self, kind: ServerKind) -> Arc<dyn ServerHandle> {
        let instance = {
            let mut built = self.built.lock().unwrap();
            let n = built.entry(kind).or_insert(0);
            let instance = *n;
            *n += 1;
            instance
        };
        let fault = self.faults.lock().unwrap().get(&(kind, instance)).copied();
        Arc::new(FakeHandle {
            kind,
            instance,
            fault,
            running: AtomicBool::new(false),
            recorder: self.recorder.clone(),
        })
    }
}

/// Short deadlines so hang tests finish quickly.
pub fn fast_lifecycle() -> LifecycleConfig {
    LifecycleConfig {
        start_timeout_secs: 1,
        stop_timeout_secs: 1,
        drain_secs: 1,
    }
}

/// A fresh store whose servers listen on loopback ephemeral ports.
pub fn loopback_database() -> (tempfile::TempDir, PathBuf, Database) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("netpanel.json");
    let db = Database::open(&path).unwrap();
    for (key, value) in [
        ("webListen", "127.0.0.1"),
        ("webPort", "0"),
        ("subListen", "127.0.0.1"),
        ("subPort", "0"),
    ] {
        db.set_setting(key, value).unwrap();
    }
    (dir, path, db)
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}
