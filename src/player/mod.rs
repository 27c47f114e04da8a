//! Music queue adapter over songbird.
//!
//! All queue mechanics (resolution via yt-dlp, buffering, encoding,
//! playback) belong to songbird; this module only forwards play/stop/skip
//! calls and re-broadcasts playback events as text notifications to the
//! room's registered text channel: song started, song queued, track error,
//! queue finished (with disconnect), and room emptied (driven by the
//! gateway handler in [`crate::bot`]).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use songbird::input::{Compose, YoutubeDl};
use songbird::typemap::TypeMapKey;
use songbird::{Event, EventContext, Songbird, TrackEvent};
use tokio::sync::Mutex;
use tracing::{error, warn};

use crate::core::dispatch::{MusicAdapter, SkipOutcome, StopOutcome};
use crate::errors::{Error, Result};

/// Track title stored on each queued track for notifications and skip
/// responses.
struct TrackTitle;

impl TypeMapKey for TrackTitle {
    type Value = String;
}

/// Songbird-backed implementation of [`MusicAdapter`].
pub struct Player {
    manager: Arc<Songbird>,
    http: Arc<serenity::Http>,
    http_client: reqwest::Client,
    /// Guild id → text channel playback notifications go to.
    rooms: Mutex<HashMap<u64, serenity::ChannelId>>,
}

impl Player {
    /// Creates the adapter over an initialized songbird manager.
    #[must_use]
    pub fn new(
        manager: Arc<Songbird>,
        http: Arc<serenity::Http>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            manager,
            http,
            http_client,
            rooms: Mutex::new(HashMap::new()),
        }
    }

    /// The text channel registered for a room's notifications.
    pub async fn text_channel(&self, room: u64) -> Option<serenity::ChannelId> {
        self.rooms.lock().await.get(&room).copied()
    }

    /// The voice channel the bot currently occupies in a room, if any.
    pub async fn current_voice_channel(&self, room: u64) -> Option<serenity::ChannelId> {
        let call = self.manager.get(serenity::GuildId::new(room))?;
        let channel = call.lock().await.current_channel()?;
        Some(serenity::ChannelId::new(channel.0.get()))
    }

    /// Drops the room's queue and leaves its voice channel.
    pub async fn disconnect(&self, room: u64) {
        let guild_id = serenity::GuildId::new(room);
        if let Some(call) = self.manager.get(guild_id) {
            call.lock().await.queue().stop();
        }
        if let Err(e) = self.manager.remove(guild_id).await {
            warn!(room, "voice disconnect failed: {e}");
        }
        self.rooms.lock().await.remove(&room);
    }
}

#[async_trait]
impl MusicAdapter for Player {
    async fn play(
        &self,
        room: u64,
        voice_channel: u64,
        text_channel: u64,
        query: &str,
    ) -> Result<()> {
        let guild_id = serenity::GuildId::new(room);
        let notify_channel = serenity::ChannelId::new(text_channel);
        self.rooms.lock().await.insert(room, notify_channel);

        let call = match self.manager.get(guild_id) {
            Some(call) => call,
            None => {
                let call = self
                    .manager
                    .join(guild_id, serenity::ChannelId::new(voice_channel))
                    .await
                    .map_err(|e| Error::Playback(format!("join failed: {e}")))?;
                // Fires once per finished track; disconnects when the queue
                // runs dry.
                call.lock().await.add_global_event(
                    Event::Track(TrackEvent::End),
                    QueueEndWatcher {
                        manager: Arc::clone(&self.manager),
                        http: Arc::clone(&self.http),
                        room,
                        channel: notify_channel,
                    },
                );
                call
            }
        };

        let mut source = if query.starts_with("http://") || query.starts_with("https://") {
            YoutubeDl::new(self.http_client.clone(), query.to_string())
        } else {
            YoutubeDl::new_search(self.http_client.clone(), query.to_string())
        };
        let title = match source.aux_metadata().await {
            Ok(metadata) => metadata.title.unwrap_or_else(|| query.to_string()),
            Err(e) => {
                return Err(Error::Playback(format!("could not resolve `{query}`: {e}")));
            }
        };

        let (handle, was_playing) = {
            let mut call = call.lock().await;
            let was_playing = !call.queue().is_empty();
            let handle = call.enqueue_input(source.into()).await;
            (handle, was_playing)
        };

        handle
            .typemap()
            .write()
            .await
            .insert::<TrackTitle>(title.clone());

        let started = TrackNotifier {
            http: Arc::clone(&self.http),
            channel: notify_channel,
            message: format!("🎶 Tocando: **{title}**"),
        };
        let failed = TrackNotifier {
            http: Arc::clone(&self.http),
            channel: notify_channel,
            message: format!("❌ Erro encontrado ao tocar **{title}**."),
        };
        handle
            .add_event(Event::Track(TrackEvent::Play), started)
            .map_err(|e| Error::Playback(e.to_string()))?;
        handle
            .add_event(Event::Track(TrackEvent::Error), failed)
            .map_err(|e| Error::Playback(e.to_string()))?;

        if was_playing {
            let _ = notify_channel
                .say(&self.http, format!("📜 Adicionado à fila: **{title}**"))
                .await;
        }
        Ok(())
    }

    async fn stop(&self, room: u64) -> StopOutcome {
        let guild_id = serenity::GuildId::new(room);
        let Some(call) = self.manager.get(guild_id) else {
            return StopOutcome::NothingPlaying;
        };
        if call.lock().await.queue().is_empty() {
            return StopOutcome::NothingPlaying;
        }
        self.disconnect(room).await;
        StopOutcome::Stopped
    }

    async fn skip(&self, room: u64) -> Result<SkipOutcome> {
        let guild_id = serenity::GuildId::new(room);
        let Some(call) = self.manager.get(guild_id) else {
            return Ok(SkipOutcome::NothingPlaying);
        };

        let queue = {
            let call = call.lock().await;
            if call.queue().is_empty() {
                return Ok(SkipOutcome::NothingPlaying);
            }
            call.queue().clone()
        };

        let next = match queue.current_queue().get(1) {
            Some(handle) => handle.typemap().read().await.get::<TrackTitle>().cloned(),
            None => None,
        };
        queue
            .skip()
            .map_err(|e| Error::Playback(e.to_string()))?;
        Ok(SkipOutcome::Skipped(next))
    }
}

/// Sends one fixed message when its track event fires.
struct TrackNotifier {
    http: Arc<serenity::Http>,
    channel: serenity::ChannelId,
    message: String,
}

#[async_trait]
impl songbird::EventHandler for TrackNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::Track(_) = ctx {
            if let Err(e) = self.channel.say(&self.http, &self.message).await {
                error!("playback notification failed: {e}");
            }
        }
        None
    }
}

/// Announces the end of the queue and leaves the voice channel.
struct QueueEndWatcher {
    manager: Arc<Songbird>,
    http: Arc<serenity::Http>,
    room: u64,
    channel: serenity::ChannelId,
}

#[async_trait]
impl songbird::EventHandler for QueueEndWatcher {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        let EventContext::Track(_) = ctx else {
            return None;
        };
        let manager = Arc::clone(&self.manager);
        let http = Arc::clone(&self.http);
        let room = self.room;
        let channel = self.channel;

        // The disconnect takes the call lock; run it outside the driver's
        // event dispatch.
        tokio::spawn(async move {
            let guild_id = serenity::GuildId::new(room);
            let Some(call) = manager.get(guild_id) else {
                return;
            };
            if !call.lock().await.queue().is_empty() {
                return;
            }
            let _ = channel
                .say(&http, "✅ Fila vazia, desconectando do canal de voz.")
                .await;
            if let Err(e) = manager.remove(guild_id).await {
                warn!(room, "voice disconnect failed: {e}");
            }
        });
        None
    }
}
