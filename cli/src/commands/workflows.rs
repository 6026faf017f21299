use anyhow::{Context as _, Result};
use clap::Subcommand;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use super::{Context, print_json};

#[derive(Subcommand, Debug)]
pub enum WorkflowsCommand {
    /// Run a workflow once with a sample trigger payload.
    TestRun {
        id: Uuid,
        /// Trigger payload as JSON.
        #[arg(long, default_value = "{}")]
        payload: String,
        /// Stream execution logs until the run finishes.
        #[arg(long)]
        follow: bool,
    },
    /// Recent executions of a workflow.
    Executions {
        id: Uuid,
        #[arg(long, default_value_t = 20)]
        limit: u64,
    },
}

pub async fn run(command: WorkflowsCommand, ctx: &Context) -> Result<()> {
    let workflows = &ctx.crm.workflows;
    match command {
        WorkflowsCommand::TestRun {
            id,
            payload,
            follow,
        } => {
            let payload: Value =
                serde_json::from_str(&payload).context("--payload must be valid JSON")?;
            let handle = workflows.test_run(id, &payload).await?;
            print_json(&handle)?;
            if !follow {
                return Ok(());
            }

            let mut logs = workflows.subscribe_logs(handle.execution_id, ctx.config.log_poll_interval);
            let mut interrupted = false;
            loop {
                tokio::select! {
                    line = logs.next() => match line {
                        Some(Ok(line)) => print_json(&line)?,
                        Some(Err(err)) => return Err(err.into()),
                        None => break,
                    },
                    _ = tokio::signal::ctrl_c() => {
                        interrupted = true;
                        break;
                    }
                }
            }
            logs.unsubscribe();
            if interrupted {
                warn!(execution_id = %handle.execution_id, "stopped following logs");
            } else {
                info!(execution_id = %handle.execution_id, "execution finished");
            }
            Ok(())
        }
        WorkflowsCommand::Executions { id, limit } => {
            print_json(&workflows.executions(id, limit).await?)
        }
    }
}
