use anyhow::Result;
use clap::Parser;
use lcdd_bin::{configure_logging, install_panic_hook, resolve_config, spawn_server, Args};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = configure_logging(args.foreground);
    install_panic_hook();

    let config = resolve_config(&args)?;
    info!(target: "runtime", port = config.port, driver = %config.driver, "startup");

    let running = spawn_server(config).await?;
    info!(target: "runtime", addr = %running.local_addr, "lcdd running");
    running.join.await?;
    Ok(())
}
