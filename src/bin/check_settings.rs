//! Loads the settings file and every startup artefact it points at, without
//! binding a listener or touching Redis/MySQL.
//!
//! $ cargo run --bin check_settings -- --settings=settings/dev.toml

use hubgate::application_impl::SigningKeys;
use hubgate::infra_openapi::OpenApiRouteCatalog;
use hubgate::settings::*;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = parse_settings(cli.settings.as_deref())?;
    println!(
        "settings ok: backend={} access_ttl={}s refresh_ttl={}s",
        settings.auth.backend, settings.auth.access_token_ttl, settings.auth.refresh_token_ttl
    );

    SigningKeys::load(&settings.auth.jwt_private_key_path)?;
    println!("signing key ok: {}", settings.auth.jwt_private_key_path);

    let catalog = OpenApiRouteCatalog::load(&settings.routes.api_document_path)?;
    println!(
        "route catalog ok: {} paths in {}",
        catalog.len(),
        settings.routes.api_document_path
    );
    Ok(())
}
