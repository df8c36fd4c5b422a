/*!
Stubs moteur et renderer pour tests sans calcul numérique

Le StubEngine renvoie une décharge linéaire sur la durée demandée et
enregistre chaque appel, pour vérifier ce que le kernel transmet au moteur
(modèle normalisé, C-rate, durée, SOC initial).
*/

use cellsim_kernel::engine::{
    EngineError, Experiment, ModelKind, SimulationEngine, Solution, Termination, VAR_TIME, VAR_VOLTAGE,
};
use cellsim_kernel::plot::{encode_data_uri, PlotError, PlotRenderer};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Appel reçu par le StubEngine
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: ModelKind,
    pub experiment: Experiment,
    pub initial_soc: f64,
}

/// Moteur factice : tension linéaire de v_start à v_end
pub struct StubEngine {
    pub points: usize,
    pub v_start: f64,
    pub v_end: f64,
    calls: Mutex<Vec<RecordedCall>>,
}

impl StubEngine {
    pub fn new() -> Self {
        Self::with_points(61)
    }

    pub fn with_points(points: usize) -> Self {
        Self {
            points,
            v_start: 4.1,
            v_end: 3.4,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Tous les appels reçus (pour assertions de tests)
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        self.calls.lock().unwrap().last().cloned()
    }
}

impl Default for StubEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationEngine for StubEngine {
    fn name(&self) -> &str {
        "stub"
    }

    fn parameter_set(&self) -> &str {
        "Chen2020"
    }

    fn solve(&self, model: ModelKind, experiment: &Experiment, initial_soc: f64) -> Result<Solution, EngineError> {
        self.calls.lock().unwrap().push(RecordedCall {
            model,
            experiment: experiment.clone(),
            initial_soc,
        });
        log::debug!("🧪 [STUB] solve {} {}", model, experiment);

        let n = self.points.max(1);
        let last = (n - 1).max(1) as f64;
        let time: Vec<f64> = (0..n).map(|i| experiment.duration_s * i as f64 / last).collect();
        let voltage: Vec<f64> = (0..n)
            .map(|i| self.v_start + (self.v_end - self.v_start) * i as f64 / last)
            .collect();

        Ok(Solution::new(Termination::Completed)
            .with_variable(VAR_TIME, time)
            .with_variable(VAR_VOLTAGE, voltage))
    }
}

/// Moteur qui échoue toujours avec le message donné
pub struct FailingEngine {
    pub message: String,
}

impl FailingEngine {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl SimulationEngine for FailingEngine {
    fn name(&self) -> &str {
        "failing"
    }

    fn parameter_set(&self) -> &str {
        "Chen2020"
    }

    fn solve(&self, _: ModelKind, _: &Experiment, _: f64) -> Result<Solution, EngineError> {
        Err(EngineError::Backend(self.message.clone()))
    }
}

/// Renderer factice : data URI d'un PNG minimal, compte les rendus
#[derive(Default)]
pub struct StubRenderer {
    renders: AtomicUsize,
}

impl StubRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::Relaxed)
    }
}

impl PlotRenderer for StubRenderer {
    fn render_voltage(&self, time_s: &[f64], voltage_v: &[f64]) -> Result<String, PlotError> {
        cellsim_kernel::plot::check_series(time_s, voltage_v)?;
        self.renders.fetch_add(1, Ordering::Relaxed);
        Ok(encode_data_uri(b"\x89PNG\r\n\x1a\nstub"))
    }
}

/// Renderer qui échoue toujours
pub struct FailingRenderer;

impl PlotRenderer for FailingRenderer {
    fn render_voltage(&self, _: &[f64], _: &[f64]) -> Result<String, PlotError> {
        Err(PlotError::Render("no font available".into()))
    }
}
