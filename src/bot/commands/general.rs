//! General Discord commands - ping and help.
//! Simple commands that touch neither the bank nor the player.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::bot::Context;
    use crate::errors::Result;

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: Context<'_>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: Context<'_>) -> Result<()> {
        let help_text = "**FoxCoin Bot**\n\
        Todos os comandos funcionam como `/comando` e como `!comando`.\n\n\
        **Banco**\n\
        • `/registrar <username> <password>` - Cria uma conta no banco.\n\
        • `/login <username> <password>` - Faz login na sua conta.\n\
        • `/saldo` - Mostra o saldo em cache da sessão.\n\
        • `/claim` - Resgata a recompensa do faucet.\n\
        • `/transferir <id_destino> <quantia>` - Transfere coins.\n\
        • `/tx <txid>` - Consulta uma transação.\n\
        • `/extrato [pagina]` - Extrato da conta logada.\n\
        • `/cartao` / `/cartao_reset` - Informações e reset do cartão.\n\
        • `/cobrar <id_destino> <quantia>` / `/pagar <bill_id>` - Cobranças.\n\n\
        **Música**\n\
        • `/play <musica>` - Toca no seu canal de voz.\n\
        • `/stop` - Para tudo e desconecta.\n\
        • `/skip` - Pula para a próxima da fila.\n\n\
        **Castle**\n\
        • `/castle <busca>` - Scan de projetos por nome (pode demorar!).\n\n\
        **Util**\n\
        • `/ping` - Verifica se o bot está vivo.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
