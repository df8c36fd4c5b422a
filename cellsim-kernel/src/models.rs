use crate::engine::{ModelKind, Termination};
use serde::Serialize;

/// Paramètres validés d'une simulation (créés par requête, immuables)
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationRequest {
    pub c_rate: f64,
    pub t_hours: f64,
    pub init_soc: f64,
    pub model: ModelKind,
}

impl Default for SimulationRequest {
    fn default() -> Self {
        Self { c_rate: 1.0, t_hours: 1.0, init_soc: 1.0, model: ModelKind::Spm }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationInputs {
    pub c_rate: f64,
    pub t_hours: f64,
    pub init_soc: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputSummary {
    pub n_points: usize,
    pub v_min: f64,
    pub v_max: f64,
    pub termination: Termination,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationMetadata {
    pub model: ModelKind,
    pub parameter_set: String,
    pub inputs: SimulationInputs,
    pub outputs: OutputSummary,
    /// Origine de current_a : constante nominale, pas une sortie du solveur
    pub current_model: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Series {
    pub time_s: Vec<f64>,
    pub voltage_v: Vec<f64>,
    pub current_a: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    pub meta: SimulationMetadata,
    pub series: Series,
}

/// Corps de réponse de POST /api/run
#[derive(Debug, Clone, Serialize)]
pub struct RunResponse {
    pub result: SimulationResult,
    pub plot_png_base64: String,
}
