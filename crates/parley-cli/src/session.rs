use anyhow::{Context, Result};
use parley::agent::Agent;
use parley::builtin::register_builtins;
use parley::errors::RunError;
use parley::providers::anthropic::AnthropicProvider;
use parley::tools::ToolRegistry;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::configuration::Settings;
use crate::prompt::rustyline::{terminal, RustylineInput, TerminalOutput};

pub struct Session {
    agent: Agent,
    input: RustylineInput,
    output: TerminalOutput,
}

impl Session {
    pub fn new(settings: Settings) -> Result<Self> {
        let config = settings.provider.into_config()?;
        info!(model = %config.model, host = %config.host, "starting session");

        let mut registry = ToolRegistry::new();
        register_builtins(&mut registry).context("failed to register tools")?;
        let provider = AnthropicProvider::new(config)?;
        let agent = Agent::new(Box::new(provider), registry, settings.max_tokens);

        let (input, output) = terminal()?;
        Ok(Session {
            agent,
            input,
            output,
        })
    }

    /// Interactive loop. Ctrl-C interrupts the model or the tools and returns to
    /// the prompt with the conversation intact.
    pub async fn start(&mut self) -> Result<()> {
        self.output.ready();
        loop {
            let (cancel, interrupt) = interrupt_on_ctrl_c();
            let result = self
                .agent
                .run(&mut self.input, &mut self.output, cancel)
                .await;
            interrupt.abort();

            match result {
                Ok(()) => return Ok(()),
                Err(RunError::Cancelled) => self.output.interrupted(),
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Answer a single message and return.
    pub async fn headless_start(&mut self, message: &str) -> Result<()> {
        let (cancel, interrupt) = interrupt_on_ctrl_c();
        let result = self.agent.reply(message, &mut self.output, cancel).await;
        interrupt.abort();
        Ok(result?)
    }
}

fn interrupt_on_ctrl_c() -> (watch::Receiver<bool>, JoinHandle<()>) {
    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(true);
        }
    });
    (rx, handle)
}
