//! Discord command implementations organized by category.
//!
//! Every command here is a thin front-end: it parses platform input into a
//! [`Command`](crate::core::dispatch::Command) plus a
//! [`CommandContext`](crate::core::dispatch::CommandContext) and hands both
//! to the shared dispatcher through a poise-backed sink. Registering each as
//! both `slash_command` and `prefix_command` gives the structured and the
//! free-text front-end from one definition.

/// Banking commands (login, saldo, claim, transferir, and the rest)
pub mod coins;

/// General utility commands
pub mod general;

/// Music commands (play, stop, skip)
pub mod music;

/// Castle scanner command
pub mod scan;

use async_trait::async_trait;
use poise::serenity_prelude as serenity;

use crate::bot::Context;
use crate::core::dispatch::{Command, CommandContext};
use crate::core::reply::{Notification, ReplySink};
use crate::errors::Result;

// Export commands
pub use coins::*;
pub use general::*;
pub use music::*;
pub use scan::*;

/// Resolves the caller's identity, room, and voice membership.
fn command_context(ctx: &Context<'_>) -> CommandContext {
    let voice_channel = ctx.guild().and_then(|guild| {
        guild
            .voice_states
            .get(&ctx.author().id)
            .and_then(|vs| vs.channel_id)
            .map(serenity::ChannelId::get)
    });

    CommandContext {
        user_id: ctx.author().id.to_string(),
        room: ctx.guild_id().map(serenity::GuildId::get),
        text_channel: Some(ctx.channel_id().get()),
        voice_channel,
    }
}

/// Delivers dispatcher output through poise: direct responses edit the
/// (deferred) reply, notifications go straight to the text channel.
struct PoiseSink<'a> {
    ctx: Context<'a>,
}

#[async_trait]
impl ReplySink for PoiseSink<'_> {
    async fn respond(&mut self, text: String) -> Result<()> {
        self.ctx.say(text).await?;
        Ok(())
    }

    async fn notify(&mut self, note: Notification) -> Result<()> {
        let channel = self.ctx.channel_id();
        let http = self.ctx.serenity_context();
        match note {
            Notification::ScanMatch { name, url } => {
                channel
                    .say(http, format!("✨ **PROJETO ENCONTRADO!** Nome: **[{name}]({url})**"))
                    .await?;
            }
            Notification::ScanEmpty { term } => {
                channel
                    .say(
                        http,
                        format!(
                            "😭 O scan não encontrou nenhum projeto com o termo **\"{term}\"**. \
                             Tente um termo diferente."
                        ),
                    )
                    .await?;
            }
            Notification::ScanReport { term, results } => {
                let listing = results
                    .iter()
                    .map(|r| format!("* **[{}]({})**", r.name, r.url))
                    .collect::<Vec<_>>()
                    .join("\n");
                let embed = serenity::CreateEmbed::default()
                    .title("🏰 Resultado Final do Scan Castle")
                    .description(format!(
                        "O scan encontrou **{}** projeto(s) com o termo **\"{term}\"**:\n\n{listing}",
                        results.len()
                    ))
                    .color(0x0058_65F2)
                    .footer(serenity::CreateEmbedFooter::new("Castle Bot Scanner"));
                channel
                    .send_message(http, serenity::CreateMessage::default().embed(embed))
                    .await?;
            }
        }
        Ok(())
    }
}

/// Runs a parsed command through the shared dispatcher.
async fn run(ctx: Context<'_>, command: Command) -> Result<()> {
    let context = command_context(&ctx);
    let mut sink = PoiseSink { ctx };
    ctx.data().dispatcher.execute(command, &context, &mut sink).await
}
