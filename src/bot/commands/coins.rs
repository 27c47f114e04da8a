//! Banking Discord commands - the coin API proxy surface.
//!
//! All behavior lives in the dispatcher; these functions only declare the
//! slash/prefix surface, defer the interaction (ephemerally for anything
//! money-related), and forward.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::bot::Context;
    use crate::bot::commands::run;
    use crate::core::dispatch::Command;
    use crate::errors::Result;

    /// Faz login na sua conta do banco FoxSRV.
    #[poise::command(slash_command, prefix_command)]
    pub async fn login(
        ctx: Context<'_>,
        #[description = "Seu nome de usuário no banco."] username: String,
        #[description = "Sua senha no banco."] password: String,
    ) -> Result<()> {
        ctx.defer_ephemeral().await?;
        run(ctx, Command::Login { username, password }).await
    }

    /// Cria uma conta nova no banco FoxSRV.
    #[poise::command(slash_command, prefix_command)]
    pub async fn registrar(
        ctx: Context<'_>,
        #[description = "Nome de usuário desejado."] username: String,
        #[description = "Senha desejada."] password: String,
    ) -> Result<()> {
        ctx.defer_ephemeral().await?;
        run(ctx, Command::Registrar { username, password }).await
    }

    /// Verifica o saldo de coins do usuário logado.
    #[poise::command(slash_command, prefix_command)]
    pub async fn saldo(ctx: Context<'_>) -> Result<()> {
        ctx.defer_ephemeral().await?;
        run(ctx, Command::Saldo).await
    }

    /// Resgata a recompensa diária/faucet.
    #[poise::command(slash_command, prefix_command)]
    pub async fn claim(ctx: Context<'_>) -> Result<()> {
        ctx.defer_ephemeral().await?;
        run(ctx, Command::Claim).await
    }

    /// Transfere coins para outro usuário.
    #[poise::command(slash_command, prefix_command)]
    pub async fn transferir(
        ctx: Context<'_>,
        #[description = "O ID do usuário (do banco) que receberá os coins."] id_destino: String,
        #[description = "A quantia de coins a ser transferida."] quantia: String,
    ) -> Result<()> {
        ctx.defer_ephemeral().await?;
        run(
            ctx,
            Command::Transferir {
                to_id: id_destino,
                amount: quantia,
            },
        )
        .await
    }

    /// Consulta uma transação pelo ID.
    #[poise::command(slash_command, prefix_command)]
    pub async fn tx(
        ctx: Context<'_>,
        #[description = "ID da transação."] txid: String,
    ) -> Result<()> {
        ctx.defer_ephemeral().await?;
        run(ctx, Command::Tx { txid }).await
    }

    /// Mostra o extrato de transações da conta logada.
    #[poise::command(slash_command, prefix_command)]
    pub async fn extrato(
        ctx: Context<'_>,
        #[description = "Página do extrato (padrão: 1)."] pagina: Option<u32>,
    ) -> Result<()> {
        ctx.defer_ephemeral().await?;
        run(
            ctx,
            Command::Extrato {
                page: pagina.unwrap_or(1).max(1),
            },
        )
        .await
    }

    /// Mostra as informações do cartão da conta logada.
    #[poise::command(slash_command, prefix_command)]
    pub async fn cartao(ctx: Context<'_>) -> Result<()> {
        ctx.defer_ephemeral().await?;
        run(ctx, Command::Cartao).await
    }

    /// Reseta o cartão da conta logada.
    #[poise::command(slash_command, prefix_command)]
    pub async fn cartao_reset(ctx: Context<'_>) -> Result<()> {
        ctx.defer_ephemeral().await?;
        run(ctx, Command::CartaoReset).await
    }

    /// Cria uma cobrança para outro usuário pagar.
    #[poise::command(slash_command, prefix_command)]
    pub async fn cobrar(
        ctx: Context<'_>,
        #[description = "O ID do usuário (do banco) a ser cobrado."] id_destino: String,
        #[description = "A quantia de coins da cobrança."] quantia: String,
    ) -> Result<()> {
        ctx.defer_ephemeral().await?;
        run(
            ctx,
            Command::Cobrar {
                to_id: id_destino,
                amount: quantia,
            },
        )
        .await
    }

    /// Paga uma cobrança pelo ID.
    #[poise::command(slash_command, prefix_command)]
    pub async fn pagar(
        ctx: Context<'_>,
        #[description = "ID da cobrança."] bill_id: String,
    ) -> Result<()> {
        ctx.defer_ephemeral().await?;
        run(ctx, Command::Pagar { bill_id }).await
    }
}

// Re-export all commands
pub use inner::*;
