//! Castle scanner command.
//!
//! The scan can take a very long time (up to 20.000 sequential lookups), so
//! the interaction is deferred and matches stream into the channel while the
//! loop runs; the deferred reply only carries the start and final summary.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::bot::Context;
    use crate::bot::commands::run;
    use crate::core::dispatch::Command;
    use crate::errors::Result;

    /// Busca projetos do Castle Make and Play por nome.
    #[poise::command(slash_command, prefix_command)]
    pub async fn castle(
        ctx: Context<'_>,
        #[description = "Termo para procurar nos projetos."]
        #[rest]
        busca: String,
    ) -> Result<()> {
        ctx.defer().await?;
        run(ctx, Command::Castle { term: busca }).await
    }
}

// Re-export all commands
pub use inner::*;
