use anyhow::Context;
use tracing::Level;

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    #[cfg(debug_assertions)]
    let level = Some(Level::DEBUG);
    #[cfg(not(debug_assertions))]
    let level = Some(Level::INFO);

    let r = workload_backend::create(level)
        .await
        .context("Unable to set up the workload server")?;

    if let Err(e) = r.launch().await {
        let kind = e.kind().to_string();
        tracing::error!("Error launching server: {}", kind);
        anyhow::bail!("Server terminated abnormally: {}", kind);
    }

    Ok(())
}
