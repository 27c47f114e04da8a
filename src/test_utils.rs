//! Shared test doubles for the dispatcher and scanner tests.
//!
//! Every external seam gets a scripted or recording stand-in: a bank that
//! replays queued replies and logs which endpoints were hit, project lookups
//! with fixed behavior, a music adapter that records forwards, and a sink
//! that collects all output. Helpers at the bottom assemble dispatchers in
//! the configurations the tests need.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::api::ApiReply;
use crate::api::bank::BankApi;
use crate::core::dispatch::{Dispatcher, MusicAdapter, SkipOutcome, StopOutcome};
use crate::core::money::Coins;
use crate::core::reply::{Notification, ReplySink};
use crate::core::scanner::{ProjectHit, ProjectLookup};
use crate::core::session::{Session, SessionStore};
use crate::errors::Result;

/// A bank that replays queued replies and records every endpoint hit.
#[derive(Clone, Default)]
pub struct ScriptedBank {
    inner: Arc<ScriptedBankInner>,
}

#[derive(Default)]
struct ScriptedBankInner {
    replies: Mutex<VecDeque<Value>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedBank {
    /// An empty script; calls return `{}` until replies are pushed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the next reply body.
    pub fn push_reply(&self, body: Value) {
        self.inner
            .replies
            .lock()
            .expect("not poisoned")
            .push_back(body);
    }

    /// Endpoint names hit so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.inner.calls.lock().expect("not poisoned").clone()
    }

    fn record(&self, endpoint: &str) -> ApiReply {
        self.inner
            .calls
            .lock()
            .expect("not poisoned")
            .push(endpoint.to_string());
        let body = self
            .inner
            .replies
            .lock()
            .expect("not poisoned")
            .pop_front()
            .unwrap_or_else(|| json!({}));
        ApiReply::from_value(body)
    }
}

#[async_trait]
impl BankApi for ScriptedBank {
    async fn register(&self, _username: &str, _password: &str) -> ApiReply {
        self.record("register")
    }
    async fn login(&self, _username: &str, _password: &str) -> ApiReply {
        self.record("login")
    }
    async fn get_balance(&self, _token: &str) -> ApiReply {
        self.record("get_balance")
    }
    async fn transfer(&self, _token: &str, _to_id: &str, _amount: f64) -> ApiReply {
        self.record("transfer")
    }
    async fn claim(&self, _token: &str) -> ApiReply {
        self.record("claim")
    }
    async fn get_tx(&self, _txid: &str) -> ApiReply {
        self.record("get_tx")
    }
    async fn get_transactions(&self, _user_id: &str, _page: u32) -> ApiReply {
        self.record("get_transactions")
    }
    async fn card_info(&self, _token: &str) -> ApiReply {
        self.record("card_info")
    }
    async fn reset_card(&self, _token: &str) -> ApiReply {
        self.record("reset_card")
    }
    async fn create_bill(
        &self,
        _token: &str,
        _to_id: &str,
        _amount: f64,
        _time: Option<&str>,
    ) -> ApiReply {
        self.record("create_bill")
    }
    async fn pay_bill(&self, _token: &str, _bill_id: &str) -> ApiReply {
        self.record("pay_bill")
    }
}

/// A directory where no id ever resolves.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverFoundLookup;

#[async_trait]
impl ProjectLookup for NeverFoundLookup {
    async fn lookup(&self, _id: &str) -> Option<ProjectHit> {
        None
    }
}

/// Records every queried id; never resolves.
#[derive(Clone, Default)]
pub struct RecordingLookup {
    queried: Arc<Mutex<Vec<String>>>,
}

impl RecordingLookup {
    /// Ids queried so far, in order.
    #[must_use]
    pub fn queried(&self) -> Vec<String> {
        self.queried.lock().expect("not poisoned").clone()
    }
}

#[async_trait]
impl ProjectLookup for RecordingLookup {
    async fn lookup(&self, id: &str) -> Option<ProjectHit> {
        self.queried
            .lock()
            .expect("not poisoned")
            .push(id.to_string());
        None
    }
}

/// Every id resolves to a project with a fixed name.
#[derive(Debug, Clone)]
pub struct NamedLookup {
    name: String,
}

impl NamedLookup {
    /// Creates a lookup whose every hit carries `name`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl ProjectLookup for NamedLookup {
    async fn lookup(&self, id: &str) -> Option<ProjectHit> {
        Some(ProjectHit {
            name: self.name.clone(),
            url: format!("https://castle.xyz/d/{id}"),
        })
    }
}

/// Collects all dispatcher output in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    /// Direct responses, in order.
    pub responses: Vec<String>,
    /// Channel notifications, in order.
    pub notifications: Vec<Notification>,
}

#[async_trait]
impl ReplySink for RecordingSink {
    async fn respond(&mut self, text: String) -> Result<()> {
        self.responses.push(text);
        Ok(())
    }

    async fn notify(&mut self, note: Notification) -> Result<()> {
        self.notifications.push(note);
        Ok(())
    }
}

/// A music adapter that records forwards instead of playing anything.
#[derive(Clone)]
pub struct StubMusic {
    inner: Arc<StubMusicInner>,
}

struct StubMusicInner {
    playing: bool,
    next_track: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl StubMusic {
    /// An idle adapter: stop and skip report nothing playing.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StubMusicInner {
                playing: false,
                next_track: None,
                calls: Mutex::new(Vec::new()),
            }),
        }
    }

    /// An adapter mid-playback with `next` queued after the current track.
    #[must_use]
    pub fn playing_with_next(next: &str) -> Self {
        Self {
            inner: Arc::new(StubMusicInner {
                playing: true,
                next_track: Some(next.to_string()),
                calls: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Forwarded calls so far.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.inner.calls.lock().expect("not poisoned").clone()
    }

    fn record(&self, call: String) {
        self.inner.calls.lock().expect("not poisoned").push(call);
    }
}

impl Default for StubMusic {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MusicAdapter for StubMusic {
    async fn play(
        &self,
        room: u64,
        voice_channel: u64,
        text_channel: u64,
        query: &str,
    ) -> Result<()> {
        self.record(format!("play {room} {voice_channel} {text_channel} {query}"));
        Ok(())
    }

    async fn stop(&self, room: u64) -> StopOutcome {
        self.record(format!("stop {room}"));
        if self.inner.playing {
            StopOutcome::Stopped
        } else {
            StopOutcome::NothingPlaying
        }
    }

    async fn skip(&self, room: u64) -> Result<SkipOutcome> {
        self.record(format!("skip {room}"));
        if self.inner.playing {
            Ok(SkipOutcome::Skipped(self.inner.next_track.clone()))
        } else {
            Ok(SkipOutcome::NothingPlaying)
        }
    }
}

/// Dispatcher over `bank` with a fruitless lookup and an idle music stub.
#[must_use]
pub fn dispatcher(bank: ScriptedBank) -> (Dispatcher, Arc<tokio::sync::Mutex<SessionStore>>) {
    dispatcher_with(bank, NeverFoundLookup, StubMusic::new())
}

/// Dispatcher with explicit seams; returns the session store for inspection.
#[must_use]
pub fn dispatcher_with(
    bank: ScriptedBank,
    lookup: impl ProjectLookup + 'static,
    music: StubMusic,
) -> (Dispatcher, Arc<tokio::sync::Mutex<SessionStore>>) {
    let sessions = Arc::new(tokio::sync::Mutex::new(SessionStore::in_memory()));
    let dispatcher = Dispatcher::new(
        Arc::new(bank),
        Arc::new(lookup),
        Arc::new(music),
        Arc::clone(&sessions),
    );
    (dispatcher, sessions)
}

/// Dispatcher with `user_id` already holding a full session: token `s1`,
/// username `alice`, cached balance `10.00000000`, bank id `u1`.
pub async fn logged_in_dispatcher(
    bank: ScriptedBank,
    user_id: &str,
) -> (Dispatcher, Arc<tokio::sync::Mutex<SessionStore>>) {
    let (dispatcher, sessions) = dispatcher(bank);
    sessions.lock().await.set(
        user_id.to_string(),
        Session {
            token: "s1".to_string(),
            username: Some("alice".to_string()),
            balance: Some(Coins::parse("10.00000000").expect("valid")),
            bank_user_id: Some("u1".to_string()),
        },
    );
    (dispatcher, sessions)
}
