/**
 * CELLSIM KERNEL - Point d'entrée du serveur de simulation
 *
 * RÔLE : Bootstrap : .env, logging, config, moteur natif, renderer, routeur HTTP.
 * Le routeur est construit une seule fois ; chaque requête est indépendante.
 */

use anyhow::Context;
use cellsim_kernel::config::load_config;
use cellsim_kernel::{build_router, AppState, NativeEngine, PlottersRenderer};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Charger les variables d'environnement depuis .env (si présent)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = load_config().await;
    cfg.validate().context("invalid kernel configuration")?;

    let engine = NativeEngine::from_config(&cfg.simulation).context("failed to build simulation engine")?;
    tracing::info!(
        "[kernel] engine native, parameter set {}, output period {} s",
        cfg.simulation.parameter_set,
        cfg.simulation.output_period_s
    );

    let addr = cfg.server.socket_addr().await?;
    let app_state = AppState::new(Arc::new(engine), Arc::new(PlottersRenderer), cfg);
    let app = build_router(app_state);

    tracing::info!("[kernel] listening on http://{addr}");
    let listener = TcpListener::bind(addr).await.with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;
    Ok(())
}
