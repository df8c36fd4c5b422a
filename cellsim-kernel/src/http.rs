/**
 * API REST CELLSIM - Serveur HTTP du kernel de simulation
 *
 * RÔLE :
 * Expose la simulation de décharge au frontend : validation de la requête,
 * appel du moteur, rendu du graphe et assemblage de la réponse JSON.
 *
 * FONCTIONNEMENT :
 * - Serveur Axum, routes sous /api
 * - POST /api/run : requête → SimulationRequest → moteur → graphe → JSON
 * - GET /api/health : liveness, toujours {"status":"ok"}
 * - GET /api/system/health : compteurs de diagnostic du process
 * - CORS permissif (toute origine) quand la config l'autorise
 *
 * ERREURS :
 * - 400 {"error": "..."} : validation, rien n'est exécuté
 * - 500 {"error": "Simulation failed: ..."} : moteur ou rendu, message brut
 *
 * CONCURRENCE :
 * Le calcul (bloquant) tourne dans spawn_blocking ; la réponse attend sa fin.
 * Aucun timeout, aucun retry, aucun état partagé entre requêtes hors compteurs.
 */

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::KernelConfig;
use crate::engine::SimulationEngine;
use crate::error::ApiError;
use crate::health::{HealthTracker, KernelHealth};
use crate::models::{RunResponse, SimulationRequest};
use crate::plot::PlotRenderer;
use crate::simulation::run_simulation_with_period;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<dyn SimulationEngine>,
    pub renderer: Arc<dyn PlotRenderer>,
    pub health_tracker: HealthTracker,
    pub cfg: Arc<KernelConfig>,
}

impl AppState {
    pub fn new(engine: Arc<dyn SimulationEngine>, renderer: Arc<dyn PlotRenderer>, cfg: KernelConfig) -> Self {
        Self {
            engine,
            renderer,
            health_tracker: HealthTracker::new(),
            cfg: Arc::new(cfg),
        }
    }
}

pub fn build_router(app_state: AppState) -> Router {
    let cors_any = app_state.cfg.server.cors_allow_any_origin;

    let router = Router::new()
        .route("/api/health", get(health))
        .route("/api/system/health", get(get_system_health))
        .route("/api/run", post(run))
        .with_state(app_state);

    if cors_any {
        router.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
    } else {
        router
    }
}

// GET /api/health (liveness)
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// GET /api/system/health (diagnostic)
async fn get_system_health(State(app): State<AppState>) -> Json<KernelHealth> {
    Json(app.health_tracker.get_health(app.engine.name(), app.engine.parameter_set()))
}

// POST /api/run
async fn run(State(app): State<AppState>, body: Bytes) -> Result<Json<RunResponse>, ApiError> {
    let request = match SimulationRequest::from_body(&body) {
        Ok(request) => request,
        Err(e) => {
            app.health_tracker.record_rejected();
            return Err(e);
        }
    };

    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("run", %run_id, model = %request.model);

    let engine = app.engine.clone();
    let renderer = app.renderer.clone();
    let period_s = app.cfg.simulation.output_period_s;

    let outcome = async move {
        tracing::info!(
            "[http] run c_rate={} t_hours={} init_soc={}",
            request.c_rate,
            request.t_hours,
            request.init_soc
        );

        let blocking_span = tracing::Span::current();
        tokio::task::spawn_blocking(move || {
            let _guard = blocking_span.enter();
            execute(engine.as_ref(), renderer.as_ref(), &request, period_s)
        })
        .await
        .unwrap_or_else(|e| Err(ApiError::Simulation(e.to_string())))
    }
    .instrument(span.clone())
    .await;

    let _guard = span.enter();
    match outcome {
        Ok(response) => {
            app.health_tracker.record_success();
            tracing::info!("[http] run ok: {} points", response.result.meta.outputs.n_points);
            Ok(Json(response))
        }
        Err(e) => {
            app.health_tracker.record_failure(&e.to_string());
            tracing::warn!("[http] {}", e);
            Err(e)
        }
    }
}

/// Simulation puis rendu, le tout synchrone
pub fn execute(
    engine: &dyn SimulationEngine,
    renderer: &dyn PlotRenderer,
    request: &SimulationRequest,
    period_s: f64,
) -> Result<RunResponse, ApiError> {
    let result = run_simulation_with_period(engine, request, period_s)?;
    let plot_png_base64 = renderer.render_voltage(&result.series.time_s, &result.series.voltage_v)?;
    Ok(RunResponse { result, plot_png_base64 })
}
