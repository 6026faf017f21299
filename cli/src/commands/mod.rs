mod assets;
mod contacts;
mod workflows;

use std::io::{self, BufRead, Write};

use anyhow::{Result, bail};
use clap::Subcommand;
use products_crm::Crm;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::config::AppConfig;

pub use self::{
    ab_test::AbTestCommand, assets::AssetsCommand, contacts::ContactsCommand,
    workflows::WorkflowsCommand,
};

pub struct Context {
    pub crm: Crm,
    pub config: AppConfig,
    pub assume_yes: bool,
}

impl Context {
    /// Asks on stderr unless `--yes` was given.
    pub fn confirm(&self, prompt: &str) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        confirm_with(prompt, &mut io::stdin().lock(), &mut io::stderr())
    }

    pub fn require_confirmation(&self, prompt: &str) -> Result<()> {
        if !self.confirm(prompt)? {
            bail!("aborted");
        }
        Ok(())
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Browse, search and delete contacts.
    #[command(subcommand)]
    Contacts(ContactsCommand),
    /// Trigger workflow test runs.
    #[command(subcommand)]
    Workflows(WorkflowsCommand),
    /// Preview traffic splits and conclude A/B tests.
    #[command(name = "ab-test", subcommand)]
    AbTest(AbTestCommand),
    /// Webhook utilities.
    #[command(subcommand)]
    Webhooks(WebhooksCommand),
    /// SMS utilities.
    #[command(subcommand)]
    Sms(SmsCommand),
    /// Upload to and prune the asset library.
    #[command(subcommand)]
    Assets(AssetsCommand),
    /// Review platform integrations.
    #[command(subcommand)]
    Integrations(IntegrationsCommand),
}

#[derive(Subcommand, Debug)]
pub enum WebhooksCommand {
    /// Send a sample event to a webhook.
    Test { id: Uuid },
}

#[derive(Subcommand, Debug)]
pub enum SmsCommand {
    /// Check a phone number with the carrier lookup.
    Validate { number: String },
}

#[derive(Subcommand, Debug)]
pub enum IntegrationsCommand {
    /// List connected review platforms.
    List,
    /// Remove a platform connection.
    Disconnect { connection_id: Uuid },
}

pub fn run_offline(command: &Command) -> Option<Result<()>> {
    match command {
        Command::AbTest(cmd) => ab_test::run_offline(cmd),
        _ => None,
    }
}

pub async fn run(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Contacts(cmd) => contacts::run(cmd, ctx).await,
        Command::Workflows(cmd) => workflows::run(cmd, ctx).await,
        Command::AbTest(cmd) => ab_test::run(cmd, ctx).await,
        Command::Assets(cmd) => assets::run(cmd, ctx).await,
        Command::Webhooks(WebhooksCommand::Test { id }) => {
            print_json(&ctx.crm.webhooks.test(id).await?)
        }
        Command::Sms(SmsCommand::Validate { number }) => {
            print_json(&ctx.crm.sms.validate_number(&number).await?)
        }
        Command::Integrations(IntegrationsCommand::List) => {
            print_json(&ctx.crm.reputation.connections().await?)
        }
        Command::Integrations(IntegrationsCommand::Disconnect { connection_id }) => {
            ctx.require_confirmation(&format!("Disconnect integration {connection_id}?"))?;
            let removed = ctx.crm.reputation.disconnect(connection_id).await?;
            info!(platform = ?removed.platform, "integration disconnected");
            print_json(&removed)
        }
    }
}

/// Pretty JSON on stdout; diagnostics stay on stderr.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

pub(crate) fn confirm_with(
    prompt: &str,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<bool> {
    write!(output, "{prompt} [y/N] ")?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(reply: &str) -> bool {
        let mut input = io::Cursor::new(reply.as_bytes().to_vec());
        let mut output = Vec::new();
        let confirmed = confirm_with("Delete contact?", &mut input, &mut output).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "Delete contact? [y/N] ");
        confirmed
    }

    #[test]
    fn only_explicit_yes_confirms() {
        assert!(answer("y\n"));
        assert!(answer(" YES \n"));
        assert!(!answer("\n"));
        assert!(!answer("no\n"));
        assert!(!answer(""));
    }
}
