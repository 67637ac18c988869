use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use ssogate::config::GateConfig;
use ssogate::directory::{InMemoryDirectory, Role, StaticScopeRegistry};
use ssogate::gate::{guard, Gate};
use ssogate::identity::{CurrentPrincipal, Principal};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    // Startup banner at info level so something always prints at default verbosity
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    let http_port = std::env::var("SSOGATE_HTTP_PORT").unwrap_or_else(|_| "7070".to_string());
    info!(
        target: "ssogate",
        "ssogate starting: RUST_LOG='{}', http_port={}",
        rust_log, http_port
    );

    // Gate configuration comes as a JSON document; absent means defaults.
    let config = match std::env::var("SSOGATE_CONFIG") {
        Ok(raw) => serde_json::from_str::<GateConfig>(&raw)?,
        Err(_) => GateConfig::default(),
    };

    // Demo directory: role definitions for one scope, users created on
    // first sight from the proxy headers.
    let directory = Arc::new(InMemoryDirectory::default());
    directory.add_role(Role { name: "service_support".into(), scope: "FR".into() });
    directory.add_role(Role { name: "service_operator".into(), scope: "FR".into() });
    let scopes = Arc::new(StaticScopeRegistry::with_languages([("FR", vec!["fr", "en"])]));

    let gate = Arc::new(Gate::new(config, directory, scopes)?);

    let app = guard(
        Router::new()
            .route("/pages/{lang}/home", get(home))
            .route("/pages/admin/roles", get(admin_roles))
            .route("/api/session/whoami", get(whoami)),
        gate,
    );

    let addr = format!("0.0.0.0:{http_port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(target: "ssogate", "listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn home(CurrentPrincipal(principal): CurrentPrincipal) -> String {
    format!("welcome {}", principal.login)
}

async fn admin_roles(CurrentPrincipal(principal): CurrentPrincipal) -> String {
    format!("admin console for {} ({:?})", principal.login, principal.admin_level)
}

async fn whoami(CurrentPrincipal(principal): CurrentPrincipal) -> Json<Principal> {
    Json(principal.as_ref().clone())
}
