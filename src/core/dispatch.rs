//! Central command dispatcher.
//!
//! Both front-ends (slash and prefix) normalize their input into a
//! [`Command`] plus a [`CommandContext`] and feed it through
//! [`Dispatcher::execute`]. The dispatcher owns all command behavior: session
//! gating, local validation before any remote call, optimistic cached-balance
//! updates, and the scan orchestration. Remote error messages are surfaced
//! verbatim to the user; nothing on this path panics or propagates a remote
//! failure as a crash.
//!
//! The session map is the only shared mutable state. The lock is held for
//! individual reads/writes, never across a remote call, so a cached balance
//! update is not atomic with the call that caused it — a known consistency
//! gap, the cache is advisory.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::error;

use crate::api::bank::BankApi;
use crate::core::money::Coins;
use crate::core::reply::{Notification, ReplySink};
use crate::core::scanner::{self, ProjectLookup, ScanLimits};
use crate::core::session::{Session, SessionStore};
use crate::errors::Result;

/// A fully parsed user command.
#[derive(Debug, Clone)]
pub enum Command {
    /// Authenticate against the bank and open a session.
    Login {
        /// Bank username.
        username: String,
        /// Bank password.
        password: String,
    },
    /// Create a bank account.
    Registrar {
        /// Desired username.
        username: String,
        /// Desired password.
        password: String,
    },
    /// Show the cached balance (fetches fresh for restored sessions).
    Saldo,
    /// Claim the faucet reward.
    Claim,
    /// Send coins to another account.
    Transferir {
        /// Destination account id at the bank.
        to_id: String,
        /// Amount as entered by the user (validated here).
        amount: String,
    },
    /// Queue a song in the caller's voice channel.
    Play {
        /// URL or search text.
        query: String,
    },
    /// Stop playback, clear the queue, disconnect.
    Stop,
    /// Skip to the next queued song.
    Skip,
    /// Run the randomized Castle project scan.
    Castle {
        /// Case-insensitive substring to match project names against.
        term: String,
    },
    /// Look up a single bank transaction.
    Tx {
        /// Transaction id.
        txid: String,
    },
    /// List the logged-in account's transactions.
    Extrato {
        /// Result page, 1-based.
        page: u32,
    },
    /// Show the account's card info.
    Cartao,
    /// Reset the account's card.
    CartaoReset,
    /// Create a bill for another account to pay.
    Cobrar {
        /// Account the bill is addressed to.
        to_id: String,
        /// Amount as entered by the user.
        amount: String,
    },
    /// Pay a bill by id.
    Pagar {
        /// Bill id.
        bill_id: String,
    },
}

/// Caller identity and room capabilities, the same shape for both front-ends.
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    /// Discord user id of the caller (the session key).
    pub user_id: String,
    /// Guild ("room") the command came from, if any.
    pub room: Option<u64>,
    /// Text channel notifications should go to.
    pub text_channel: Option<u64>,
    /// Voice channel the caller sits in, if any.
    pub voice_channel: Option<u64>,
}

/// Result of a stop request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// Playback stopped, queue cleared, voice channel left.
    Stopped,
    /// There was no active queue for the room.
    NothingPlaying,
}

/// Result of a skip request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipOutcome {
    /// Skipped; the next track's name when one is queued.
    Skipped(Option<String>),
    /// There was no active queue for the room.
    NothingPlaying,
}

/// Seam to the external playback-queue engine. Queue mechanics (resolution,
/// buffering, events) live behind it; the dispatcher only forwards.
#[async_trait]
pub trait MusicAdapter: Send + Sync {
    /// Joins `voice_channel` if needed and queues `query` for `room`,
    /// registering `text_channel` for asynchronous playback notifications.
    async fn play(&self, room: u64, voice_channel: u64, text_channel: u64, query: &str)
    -> Result<()>;

    /// Stops playback and disconnects.
    async fn stop(&self, room: u64) -> StopOutcome;

    /// Skips the current track.
    async fn skip(&self, room: u64) -> Result<SkipOutcome>;
}

fn not_logged(command: &str) -> String {
    format!("❌ Você deve estar logado para usar `{command}`. Use `/login` ou `!login`.")
}

/// Positive finite amounts only; everything else is rejected before any
/// remote call.
fn parse_amount(raw: &str) -> Option<f64> {
    let amount: f64 = raw.trim().parse().ok()?;
    (amount.is_finite() && amount > 0.0).then_some(amount)
}

/// Discord caps messages at 2000 chars; raw payload dumps get clipped.
fn clip(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Executes commands against the three external seams and the session store.
pub struct Dispatcher {
    bank: Arc<dyn BankApi>,
    lookup: Arc<dyn ProjectLookup>,
    music: Arc<dyn MusicAdapter>,
    sessions: Arc<Mutex<SessionStore>>,
    scan_limits: ScanLimits,
}

impl Dispatcher {
    /// Creates a dispatcher with production scan limits.
    #[must_use]
    pub fn new(
        bank: Arc<dyn BankApi>,
        lookup: Arc<dyn ProjectLookup>,
        music: Arc<dyn MusicAdapter>,
        sessions: Arc<Mutex<SessionStore>>,
    ) -> Self {
        Self {
            bank,
            lookup,
            music,
            sessions,
            scan_limits: ScanLimits::default(),
        }
    }

    /// Overrides the scan limits (tests shrink the attempt budget).
    #[must_use]
    pub fn with_scan_limits(mut self, limits: ScanLimits) -> Self {
        self.scan_limits = limits;
        self
    }

    async fn session_snapshot(&self, user_id: &str) -> Option<Session> {
        self.sessions.lock().await.get(user_id).cloned()
    }

    /// Runs one command to completion, delivering output through `sink`.
    pub async fn execute(
        &self,
        command: Command,
        ctx: &CommandContext,
        sink: &mut dyn ReplySink,
    ) -> Result<()> {
        match command {
            Command::Login { username, password } => {
                self.login(ctx, &username, &password, sink).await
            }
            Command::Registrar { username, password } => {
                self.registrar(&username, &password, sink).await
            }
            Command::Saldo => self.saldo(ctx, sink).await,
            Command::Claim => self.claim(ctx, sink).await,
            Command::Transferir { to_id, amount } => {
                self.transferir(ctx, &to_id, &amount, sink).await
            }
            Command::Play { query } => self.play(ctx, &query, sink).await,
            Command::Stop => self.stop(ctx, sink).await,
            Command::Skip => self.skip(ctx, sink).await,
            Command::Castle { term } => self.castle(&term, sink).await,
            Command::Tx { txid } => self.tx(&txid, sink).await,
            Command::Extrato { page } => self.extrato(ctx, page, sink).await,
            Command::Cartao => self.cartao(ctx, sink).await,
            Command::CartaoReset => self.cartao_reset(ctx, sink).await,
            Command::Cobrar { to_id, amount } => self.cobrar(ctx, &to_id, &amount, sink).await,
            Command::Pagar { bill_id } => self.pagar(ctx, &bill_id, sink).await,
        }
    }

    async fn login(
        &self,
        ctx: &CommandContext,
        username: &str,
        password: &str,
        sink: &mut dyn ReplySink,
    ) -> Result<()> {
        if let Some(session) = self.session_snapshot(&ctx.user_id).await {
            let name = session.username.as_deref().unwrap_or("(sessão restaurada)");
            sink.respond(format!("Você já está logado como **{name}**."))
                .await?;
            return Ok(());
        }

        let reply = self.bank.login(username, password).await;

        let Some(token) = reply.str_field("sessionId").map(str::to_string) else {
            let reason = if reply.is_error() {
                reply.message()
            } else {
                "Credenciais inválidas ou erro no servidor.".to_string()
            };
            sink.respond(format!("❌ Falha no login: {reason}")).await?;
            return Ok(());
        };

        let balance = reply
            .display_field("saldo")
            .and_then(|s| Coins::parse(&s).ok());
        let shown = balance.map_or_else(|| "N/A".to_string(), |b| b.to_string());

        let session = Session {
            token,
            username: Some(username.to_string()),
            balance,
            bank_user_id: reply.display_field("userId"),
        };
        self.sessions
            .lock()
            .await
            .set(ctx.user_id.clone(), session);

        sink.respond(format!(
            "✅ Login bem-sucedido! Saldo inicial: **{shown} coins**."
        ))
        .await?;
        Ok(())
    }

    async fn registrar(
        &self,
        username: &str,
        password: &str,
        sink: &mut dyn ReplySink,
    ) -> Result<()> {
        let reply = self.bank.register(username, password).await;
        if reply.is_error() {
            sink.respond(format!("❌ Falha no registro: {}", reply.message()))
                .await?;
        } else {
            sink.respond(format!(
                "✅ Conta **{username}** criada! Agora use `/login {username} <password>`."
            ))
            .await?;
        }
        Ok(())
    }

    async fn saldo(&self, ctx: &CommandContext, sink: &mut dyn ReplySink) -> Result<()> {
        let Some(session) = self.session_snapshot(&ctx.user_id).await else {
            sink.respond(not_logged("saldo")).await?;
            return Ok(());
        };

        if let Some(balance) = session.balance {
            let text = match &session.username {
                Some(name) => format!("💰 Saldo de **{name}**: **{balance} coins**"),
                None => format!("💰 Saldo: **{balance} coins**"),
            };
            sink.respond(text).await?;
            return Ok(());
        }

        // Restored session: no cached balance yet, ask the bank.
        let reply = self.bank.get_balance(&session.token).await;
        if reply.is_error() {
            sink.respond(format!(
                "❌ Não foi possível obter o saldo: {}",
                reply.message()
            ))
            .await?;
            return Ok(());
        }

        let balance = reply
            .display_field("saldo")
            .and_then(|s| Coins::parse(&s).ok());
        if let Some(balance) = balance {
            if let Some(session) = self.sessions.lock().await.get_mut(&ctx.user_id) {
                session.balance = Some(balance);
            }
            sink.respond(format!("💰 Saldo: **{balance} coins**")).await?;
        } else {
            sink.respond("💰 Saldo: **N/A coins**".to_string()).await?;
        }
        Ok(())
    }

    async fn claim(&self, ctx: &CommandContext, sink: &mut dyn ReplySink) -> Result<()> {
        let Some(session) = self.session_snapshot(&ctx.user_id).await else {
            sink.respond(not_logged("claim")).await?;
            return Ok(());
        };

        let reply = self.bank.claim(&session.token).await;
        if reply.is_error() {
            if reply.message() == "Cooldown active" {
                sink.respond("⏳ Cooldown ativo. Tente novamente mais tarde.".to_string())
                    .await?;
            } else {
                sink.respond(format!(
                    "❌ Não foi possível fazer claim: {}",
                    reply.message()
                ))
                .await?;
            }
            return Ok(());
        }

        let claimed = reply.display_field("claimed");
        if let Some(amount) = claimed.as_deref().and_then(|c| Coins::parse(c).ok()) {
            let mut sessions = self.sessions.lock().await;
            if let Some(session) = sessions.get_mut(&ctx.user_id) {
                session.balance = session
                    .balance
                    .and_then(|balance| balance.checked_add(amount));
            }
        }

        sink.respond(format!(
            "🎁 Claim realizado! Você ganhou: **{} coins**.",
            claimed.as_deref().unwrap_or("0")
        ))
        .await?;
        Ok(())
    }

    async fn transferir(
        &self,
        ctx: &CommandContext,
        to_id: &str,
        amount_raw: &str,
        sink: &mut dyn ReplySink,
    ) -> Result<()> {
        let Some(session) = self.session_snapshot(&ctx.user_id).await else {
            sink.respond(not_logged("transferir")).await?;
            return Ok(());
        };

        let Some(amount) = parse_amount(amount_raw) else {
            sink.respond("Quantia inválida.".to_string()).await?;
            return Ok(());
        };
        if session.bank_user_id.as_deref() == Some(to_id) {
            sink.respond("Você não pode transferir para si mesmo.".to_string())
                .await?;
            return Ok(());
        }

        let reply = self.bank.transfer(&session.token, to_id, amount).await;
        if reply.is_error() {
            sink.respond(format!("❌ Falha na transferência: {}", reply.message()))
                .await?;
            return Ok(());
        }

        if let Ok(sent) = Coins::from_f64(amount) {
            let mut sessions = self.sessions.lock().await;
            if let Some(session) = sessions.get_mut(&ctx.user_id) {
                session.balance = session
                    .balance
                    .and_then(|balance| balance.checked_sub(sent));
            }
        }

        sink.respond(format!(
            "✅ Transferido **{amount} coins** para o ID **{to_id}**. (TxId: {})",
            reply.display_field("txId").as_deref().unwrap_or("N/A")
        ))
        .await?;
        Ok(())
    }

    async fn play(
        &self,
        ctx: &CommandContext,
        query: &str,
        sink: &mut dyn ReplySink,
    ) -> Result<()> {
        let (Some(room), Some(text_channel)) = (ctx.room, ctx.text_channel) else {
            sink.respond("Este comando só funciona em um servidor.".to_string())
                .await?;
            return Ok(());
        };
        let Some(voice_channel) = ctx.voice_channel else {
            sink.respond("Entre em um canal de voz primeiro.".to_string())
                .await?;
            return Ok(());
        };

        match self.music.play(room, voice_channel, text_channel, query).await {
            Ok(()) => {
                sink.respond(format!(
                    "🎶 **Busca iniciada:** {query}. A música será notificada no chat."
                ))
                .await?;
            }
            Err(e) => {
                error!("play failed: {e}");
                sink.respond("❌ Ocorreu um erro ao tentar tocar essa música.".to_string())
                    .await?;
            }
        }
        Ok(())
    }

    async fn stop(&self, ctx: &CommandContext, sink: &mut dyn ReplySink) -> Result<()> {
        let Some(room) = ctx.room else {
            sink.respond("Este comando só funciona em um servidor.".to_string())
                .await?;
            return Ok(());
        };
        match self.music.stop(room).await {
            StopOutcome::NothingPlaying => {
                sink.respond("Não estou tocando nada.".to_string()).await?;
            }
            StopOutcome::Stopped => {
                sink.respond("🛑 Música parada e fila limpa. Desconectado.".to_string())
                    .await?;
            }
        }
        Ok(())
    }

    async fn skip(&self, ctx: &CommandContext, sink: &mut dyn ReplySink) -> Result<()> {
        let Some(room) = ctx.room else {
            sink.respond("Este comando só funciona em um servidor.".to_string())
                .await?;
            return Ok(());
        };
        match self.music.skip(room).await {
            Ok(SkipOutcome::NothingPlaying) => {
                sink.respond("Não estou tocando nada para pular.".to_string())
                    .await?;
            }
            Ok(SkipOutcome::Skipped(Some(next))) => {
                sink.respond(format!("⏭️ Pulando para: **{next}**")).await?;
            }
            Ok(SkipOutcome::Skipped(None)) => {
                sink.respond("⏭️ Música pulada. A fila acabou.".to_string())
                    .await?;
            }
            Err(e) => {
                sink.respond(format!("❌ {e}")).await?;
            }
        }
        Ok(())
    }

    async fn castle(&self, term: &str, sink: &mut dyn ReplySink) -> Result<()> {
        let limits = &self.scan_limits;
        sink.respond(format!(
            "🔍 **INICIANDO SCAN:** Tentando **{} IDs** aleatórios ({} a {} caracteres) que contenham: **{term}**...",
            limits.max_attempts, limits.min_len, limits.max_len
        ))
        .await?;

        let summary = scanner::run_scan(self.lookup.as_ref(), term, limits, sink).await?;

        sink.respond(format!(
            "✅ **SCAN FINALIZADO!** Tentativas: **{}** | Total Encontrado: **{}**",
            summary.attempts,
            summary.results.len()
        ))
        .await?;

        if summary.results.is_empty() {
            sink.notify(Notification::ScanEmpty {
                term: term.to_string(),
            })
            .await?;
        } else {
            sink.notify(Notification::ScanReport {
                term: term.to_string(),
                results: summary.results,
            })
            .await?;
        }
        Ok(())
    }

    async fn tx(&self, txid: &str, sink: &mut dyn ReplySink) -> Result<()> {
        let reply = self.bank.get_tx(txid).await;
        if reply.is_error() {
            sink.respond(format!("❌ Transação não encontrada: {}", reply.message()))
                .await?;
        } else {
            sink.respond(format!(
                "📄 Transação `{txid}`:\n```json\n{}\n```",
                clip(&reply.pretty(), 1500)
            ))
            .await?;
        }
        Ok(())
    }

    async fn extrato(&self, ctx: &CommandContext, page: u32, sink: &mut dyn ReplySink) -> Result<()> {
        let Some(session) = self.session_snapshot(&ctx.user_id).await else {
            sink.respond(not_logged("extrato")).await?;
            return Ok(());
        };
        let Some(bank_user_id) = session.bank_user_id else {
            sink.respond(
                "❌ Sessão restaurada sem ID de usuário. Faça `/login` novamente.".to_string(),
            )
            .await?;
            return Ok(());
        };

        let reply = self.bank.get_transactions(&bank_user_id, page).await;
        if reply.is_error() {
            sink.respond(format!("❌ Não foi possível obter o extrato: {}", reply.message()))
                .await?;
        } else {
            sink.respond(format!(
                "📑 Extrato (página {page}):\n```json\n{}\n```",
                clip(&reply.pretty(), 1500)
            ))
            .await?;
        }
        Ok(())
    }

    async fn cartao(&self, ctx: &CommandContext, sink: &mut dyn ReplySink) -> Result<()> {
        let Some(session) = self.session_snapshot(&ctx.user_id).await else {
            sink.respond(not_logged("cartao")).await?;
            return Ok(());
        };
        let reply = self.bank.card_info(&session.token).await;
        if reply.is_error() {
            sink.respond(format!(
                "❌ Não foi possível obter o cartão: {}",
                reply.message()
            ))
            .await?;
        } else {
            sink.respond(format!(
                "💳 Cartão:\n```json\n{}\n```",
                clip(&reply.pretty(), 1500)
            ))
            .await?;
        }
        Ok(())
    }

    async fn cartao_reset(&self, ctx: &CommandContext, sink: &mut dyn ReplySink) -> Result<()> {
        let Some(session) = self.session_snapshot(&ctx.user_id).await else {
            sink.respond(not_logged("cartao_reset")).await?;
            return Ok(());
        };
        let reply = self.bank.reset_card(&session.token).await;
        if reply.is_error() {
            sink.respond(format!(
                "❌ Não foi possível resetar o cartão: {}",
                reply.message()
            ))
            .await?;
        } else {
            sink.respond("✅ Cartão resetado.".to_string()).await?;
        }
        Ok(())
    }

    async fn cobrar(
        &self,
        ctx: &CommandContext,
        to_id: &str,
        amount_raw: &str,
        sink: &mut dyn ReplySink,
    ) -> Result<()> {
        let Some(session) = self.session_snapshot(&ctx.user_id).await else {
            sink.respond(not_logged("cobrar")).await?;
            return Ok(());
        };
        let Some(amount) = parse_amount(amount_raw) else {
            sink.respond("Quantia inválida.".to_string()).await?;
            return Ok(());
        };

        let reply = self
            .bank
            .create_bill(&session.token, to_id, amount, None)
            .await;
        if reply.is_error() {
            sink.respond(format!("❌ Falha ao criar cobrança: {}", reply.message()))
                .await?;
        } else {
            sink.respond(format!(
                "🧾 Cobrança de **{amount} coins** criada para o ID **{to_id}**. (BillId: {})",
                reply.display_field("billId").as_deref().unwrap_or("N/A")
            ))
            .await?;
        }
        Ok(())
    }

    async fn pagar(
        &self,
        ctx: &CommandContext,
        bill_id: &str,
        sink: &mut dyn ReplySink,
    ) -> Result<()> {
        let Some(session) = self.session_snapshot(&ctx.user_id).await else {
            sink.respond(not_logged("pagar")).await?;
            return Ok(());
        };
        let reply = self.bank.pay_bill(&session.token, bill_id).await;
        if reply.is_error() {
            sink.respond(format!("❌ Falha ao pagar cobrança: {}", reply.message()))
                .await?;
        } else {
            sink.respond(format!(
                "✅ Cobrança **{bill_id}** paga. (TxId: {})",
                reply.display_field("txId").as_deref().unwrap_or("N/A")
            ))
            .await?;
        }
        Ok(())
    }
}
