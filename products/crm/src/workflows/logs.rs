use std::{collections::HashSet, time::Duration};

use chrono::{DateTime, Utc};
use entity::workflow::ExecutionLog;
use platform_api::ApiResult;
use platform_client::{BackendClient, Direction};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, warn};
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 64;

/// Live view of a workflow execution log.
///
/// A background task polls the log table and forwards new lines in order.
/// The task ends after forwarding a terminal line or a failed poll; dropping
/// the subscription or calling [`LogSubscription::unsubscribe`] stops it early.
pub struct LogSubscription {
    execution_id: Uuid,
    receiver: mpsc::Receiver<ApiResult<ExecutionLog>>,
    task: JoinHandle<()>,
}

impl LogSubscription {
    pub(crate) fn spawn(client: BackendClient, execution_id: Uuid, interval: Duration) -> Self {
        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let task = tokio::spawn(poll_logs(client, execution_id, interval, sender));
        Self {
            execution_id,
            receiver,
            task,
        }
    }

    pub fn execution_id(&self) -> Uuid {
        self.execution_id
    }

    /// Next log line, or `None` once the stream has ended.
    pub async fn next(&mut self) -> Option<ApiResult<ExecutionLog>> {
        self.receiver.recv().await
    }

    /// Collects lines until the stream ends, stopping at the first error.
    pub async fn collect(mut self) -> ApiResult<Vec<ExecutionLog>> {
        let mut lines = Vec::new();
        while let Some(line) = self.next().await {
            lines.push(line?);
        }
        Ok(lines)
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for LogSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Inclusive `created_at` cursor. Lines can share a timestamp, so ids already
/// forwarded at the cursor's timestamp are remembered until it moves on.
#[derive(Debug, Default)]
struct LogCursor {
    since: Option<DateTime<Utc>>,
    seen: HashSet<Uuid>,
}

impl LogCursor {
    /// Returns `true` when `line` has not been forwarded yet.
    fn advance(&mut self, line: &ExecutionLog) -> bool {
        match self.since {
            Some(since) if line.created_at < since => return false,
            Some(since) if line.created_at == since => {}
            _ => {
                self.since = Some(line.created_at);
                self.seen.clear();
            }
        }
        self.seen.insert(line.id)
    }
}

async fn poll_logs(
    client: BackendClient,
    execution_id: Uuid,
    interval: Duration,
    sender: mpsc::Sender<ApiResult<ExecutionLog>>,
) {
    let mut cursor = LogCursor::default();
    loop {
        let mut query = client
            .table(ExecutionLog::TABLE)
            .eq("execution_id", execution_id)
            .order("created_at", Direction::Asc);
        if let Some(since) = cursor.since {
            query = query.gte("created_at", since);
        }
        let lines = match query.select::<ExecutionLog>().await {
            Ok(lines) => lines,
            Err(err) => {
                warn!(%execution_id, error = %err, "log poll failed");
                let _ = sender.send(Err(err)).await;
                return;
            }
        };
        for line in lines {
            if !cursor.advance(&line) {
                continue;
            }
            let terminal = line.is_terminal();
            if sender.send(Ok(line)).await.is_err() {
                debug!(%execution_id, "log subscriber went away");
                return;
            }
            if terminal {
                debug!(%execution_id, "terminal log line forwarded");
                return;
            }
        }
        tokio::time::sleep(interval).await;
    }
}
