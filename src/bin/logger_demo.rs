use hubgate::logger::*;

fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap();
    debug!("bootstrap debug log, hidden");
    info!(username = "alice", "bootstrap info log");

    let config = LogConfig {
        filter: "hubgate=debug,warn".to_string(),
    };
    logger.reload_from_config(&config)?;
    debug!(target: "hubgate::demo", path = "/private", "application debug log");
    info!(target: "other_crate", "hidden after reload");
    warn!(error = "connection refused", "revocation lookup failed");

    Ok(())
}
