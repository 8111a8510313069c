// src/tasks/serve.rs

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::tasks::TaskContext;

/// Start the dev server. The task completes once the socket is bound; the
/// server keeps running until the process stops it.
pub async fn run(ctx: &Arc<TaskContext>) -> Result<()> {
    let mut server = ctx.server.lock().await;
    let addr = server.start().await?;
    info!(url = %format!("http://{addr}"), "serving");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigFile, RawConfigFile};
    use crate::fs::RealFileSystem;

    #[tokio::test]
    async fn starts_the_shared_server() {
        let dir = tempfile::tempdir().unwrap();
        let mut raw = RawConfigFile::default();
        raw.server.port = 0;
        let cfg = ConfigFile::try_from(raw).unwrap().with_root(dir.path());
        let ctx = Arc::new(TaskContext::new(cfg, Arc::new(RealFileSystem)));

        run(&ctx).await.unwrap();
        assert!(ctx.server.lock().await.is_serving());

        ctx.server.lock().await.stop().await.unwrap();
        assert!(!ctx.server.lock().await.is_serving());
    }
}
