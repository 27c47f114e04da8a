//! Bot layer - Discord-specific interface and command handlers
//!
//! Owns the poise framework setup, the shared [`BotData`] available to all
//! commands, the error hook, and the gateway event handler that detects an
//! emptied voice channel.

/// Discord command implementations (coins, music, scanner, general)
pub mod commands;

use std::sync::Arc;

use poise::serenity_prelude as serenity;
use songbird::SerenityInit;
use tokio::sync::Mutex;
use tracing::{error, info, instrument};

use crate::api::bank::BankClient;
use crate::api::castle::CastleClient;
use crate::config::AppConfig;
use crate::core::dispatch::Dispatcher;
use crate::core::session::SessionStore;
use crate::errors;
use crate::player::Player;

/// Shared data available to all bot commands.
pub struct BotData {
    /// The command dispatcher holding the bank, lookup, and music seams.
    pub dispatcher: Dispatcher,
    /// Playback adapter, also used by the voice-state handler.
    pub player: Arc<Player>,
}

pub(crate) type Error = errors::Error;
pub(crate) type Context<'a> = poise::Context<'a, BotData, Error>;

/// Reply for a free-text invocation that is missing its required argument.
fn usage_hint(command: &str) -> &'static str {
    match command {
        "play" => "Manda o link ou o nome da música.",
        "castle" => "Diga o que pesquisar (ex: nome do projeto Castle).",
        _ => "Argumentos inválidos. Veja `/help`.",
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            panic!("Failed to start bot: {error:?}");
        }
        poise::FrameworkError::ArgumentParse { ctx, .. } => {
            if let Err(e) = ctx.say(usage_hint(&ctx.command().name)).await {
                tracing::error!("Failed to send usage hint: {e}");
            }
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            tracing::error!("Error in command `{}`: {:?}", ctx.command().name, error);
            if let Err(e) = ctx.say(format!("An error occurred: {error}")).await {
                tracing::error!("Failed to send error message: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                tracing::error!("Error while handling error: {e}");
            }
        }
    }
}

/// Reacts to gateway events. The only one this bot cares about is voice
/// state: when the bot ends up alone in a voice channel, announce it and
/// disconnect (the "room emptied" playback notification).
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, BotData, Error>,
    data: &BotData,
) -> Result<(), Error> {
    let serenity::FullEvent::VoiceStateUpdate { old, new } = event else {
        return Ok(());
    };

    let Some(guild_id) = new.guild_id.or(old.as_ref().and_then(|o| o.guild_id)) else {
        return Ok(());
    };
    let bot_id = ctx.cache.current_user().id;
    if new.user_id == bot_id {
        return Ok(());
    }

    let room = guild_id.get();
    let Some(bot_channel) = data.player.current_voice_channel(room).await else {
        return Ok(());
    };

    let alone = {
        let Some(guild) = ctx.cache.guild(guild_id) else {
            return Ok(());
        };
        !guild
            .voice_states
            .values()
            .any(|vs| vs.channel_id == Some(bot_channel) && vs.user_id != bot_id)
    };
    if !alone {
        return Ok(());
    }

    if let Some(text_channel) = data.player.text_channel(room).await {
        if let Err(e) = text_channel.say(ctx, "Canal de voz vazio. Saindo...").await {
            error!("room-emptied notification failed: {e}");
        }
    }
    data.player.disconnect(room).await;
    Ok(())
}

/// Connects to Discord and runs the bot until the gateway shuts down.
#[instrument(skip_all)]
pub async fn run_bot(token: String, config: Arc<AppConfig>) -> crate::errors::Result<()> {
    let http_client = reqwest::Client::new();
    let bank = BankClient::new(http_client.clone(), config.bank_api_base.clone());
    let castle = CastleClient::new(
        http_client.clone(),
        config.castle_api_base.clone(),
        config.castle_web_base.clone(),
    );
    let sessions = Arc::new(Mutex::new(SessionStore::load(config.session_file.clone())));

    let prefix = config.command_prefix.clone();
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::login(),
                commands::registrar(),
                commands::saldo(),
                commands::claim(),
                commands::transferir(),
                commands::tx(),
                commands::extrato(),
                commands::cartao(),
                commands::cartao_reset(),
                commands::cobrar(),
                commands::pagar(),
                commands::play(),
                commands::stop(),
                commands::skip(),
                commands::castle(),
                commands::ping(),
                commands::help(),
            ],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(prefix),
                ..Default::default()
            },
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                let manager = songbird::get(ctx)
                    .await
                    .expect("songbird was registered at client init");
                let player = Arc::new(Player::new(
                    manager,
                    Arc::clone(&ctx.http),
                    http_client,
                ));

                let dispatcher = Dispatcher::new(
                    Arc::new(bank),
                    Arc::new(castle),
                    Arc::clone(&player) as Arc<dyn crate::core::dispatch::MusicAdapter>,
                    sessions,
                );

                Ok(BotData { dispatcher, player })
            })
        })
        .build();

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_VOICE_STATES;

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::Client::builder(&token, intents)
        .framework(framework)
        .register_songbird()
        .await?;

    info!("Starting bot client...");
    client.start().await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_invocations_get_the_original_usage_hints() {
        assert_eq!(usage_hint("play"), "Manda o link ou o nome da música.");
        assert_eq!(
            usage_hint("castle"),
            "Diga o que pesquisar (ex: nome do projeto Castle)."
        );
        assert!(usage_hint("transferir").contains("help"));
    }
}
