/*!
# CellSim Kernel - Service HTTP de simulation de batteries

Reçoit des paramètres de décharge (C-rate, durée, SOC initial, modèle),
délègue la simulation à un moteur derrière le trait `SimulationEngine`,
et renvoie les séries temporelles et un graphe PNG encodé en base64.

- `request` : validation stricte du JSON entrant
- `simulation` : adaptateur requête → moteur → résultat
- `plot` : rendu du graphe tension/temps
- `engine` : trait moteur + moteur natif (SPM, Thevenin, Chen2020)
- `http` : routeur Axum
*/

pub mod config;
pub mod engine;
pub mod error;
pub mod health;
pub mod http;
pub mod models;
pub mod plot;
pub mod request;
pub mod simulation;

pub use engine::{Experiment, ModelKind, NativeEngine, SimulationEngine, Solution};
pub use error::ApiError;
pub use http::{build_router, AppState};
pub use models::{RunResponse, SimulationRequest, SimulationResult};
pub use plot::{PlotRenderer, PlottersRenderer};
