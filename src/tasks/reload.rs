// src/tasks/reload.rs

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::tasks::TaskContext;

/// Ask every connected browser for a full page reload.
pub async fn run(ctx: &Arc<TaskContext>) -> Result<()> {
    let clients = ctx.live_reload.reload();
    info!(clients, "reload pushed");
    Ok(())
}
