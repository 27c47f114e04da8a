//! Music Discord commands - play, stop, skip.
//!
//! Playback itself is songbird's job; the dispatcher forwards to the
//! [`Player`](crate::player::Player) adapter and now-playing/queued
//! notifications arrive asynchronously in the text channel, not as the
//! command response.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::bot::Context;
    use crate::bot::commands::run;
    use crate::core::dispatch::Command;
    use crate::errors::Result;

    /// Toca uma música no canal de voz.
    #[poise::command(slash_command, prefix_command, guild_only)]
    pub async fn play(
        ctx: Context<'_>,
        #[description = "Link ou nome da música."]
        #[rest]
        musica: String,
    ) -> Result<()> {
        ctx.defer().await?;
        run(ctx, Command::Play { query: musica }).await
    }

    /// Para a música e desconecta do canal de voz.
    #[poise::command(slash_command, prefix_command, guild_only)]
    pub async fn stop(ctx: Context<'_>) -> Result<()> {
        ctx.defer().await?;
        run(ctx, Command::Stop).await
    }

    /// Pula para a próxima música na fila.
    #[poise::command(slash_command, prefix_command, guild_only)]
    pub async fn skip(ctx: Context<'_>) -> Result<()> {
        ctx.defer().await?;
        run(ctx, Command::Skip).await
    }
}

// Re-export all commands
pub use inner::*;
