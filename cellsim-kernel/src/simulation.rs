/**
 * ADAPTATEUR DE SIMULATION - SimulationRequest → moteur → SimulationResult
 *
 * RÔLE :
 * Traduit une requête validée en expérience de décharge, appelle le moteur,
 * extrait temps et tension par nom de variable, puis assemble séries et
 * métadonnées. Toute erreur moteur remonte inchangée.
 *
 * COURANT APPROXIMÉ :
 * current_a n'est PAS lu dans la solution : chaque point vaut
 * -(c_rate * 5.0 Ah), convention décharge négative. C'est une
 * approximation nominale, signalée dans meta.current_model.
 */

use crate::engine::{EngineError, Experiment, SimulationEngine, VAR_TIME, VAR_VOLTAGE};
use crate::models::{OutputSummary, Series, SimulationInputs, SimulationMetadata, SimulationRequest, SimulationResult};

/// Capacité nominale utilisée pour le courant approximé [A.h]
pub const NOMINAL_CAPACITY_AH: f64 = 5.0;

/// Valeur de meta.current_model
pub const CURRENT_MODEL: &str = "nominal_capacity_constant";

/// Courant approximé (négatif = décharge)
pub fn approximate_current(c_rate: f64) -> f64 {
    -(c_rate * NOMINAL_CAPACITY_AH)
}

/// Exécute une simulation avec la période d'échantillonnage par défaut
pub fn run_simulation(engine: &dyn SimulationEngine, request: &SimulationRequest) -> Result<SimulationResult, EngineError> {
    run_simulation_with_period(engine, request, Experiment::DEFAULT_PERIOD_S)
}

pub fn run_simulation_with_period(
    engine: &dyn SimulationEngine,
    request: &SimulationRequest,
    period_s: f64,
) -> Result<SimulationResult, EngineError> {
    let experiment = Experiment::constant_current_discharge(request.c_rate, request.t_hours).with_period(period_s);
    let solution = engine.solve(request.model, &experiment, request.init_soc)?;

    let time_s = solution.get(VAR_TIME)?.to_vec();
    let voltage_v = solution.get(VAR_VOLTAGE)?.to_vec();

    if time_s.is_empty() {
        return Err(EngineError::MalformedSolution("solver returned no points".into()));
    }
    if time_s.len() != voltage_v.len() {
        return Err(EngineError::MalformedSolution(format!(
            "time has {} points but voltage has {}",
            time_s.len(),
            voltage_v.len()
        )));
    }

    let current_a = vec![approximate_current(request.c_rate); time_s.len()];
    let v_min = voltage_v.iter().copied().fold(f64::INFINITY, f64::min);
    let v_max = voltage_v.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let meta = SimulationMetadata {
        model: request.model,
        parameter_set: engine.parameter_set().to_string(),
        inputs: SimulationInputs {
            c_rate: request.c_rate,
            t_hours: request.t_hours,
            init_soc: request.init_soc,
        },
        outputs: OutputSummary {
            n_points: time_s.len(),
            v_min,
            v_max,
            termination: solution.termination,
        },
        current_model: CURRENT_MODEL,
    };

    Ok(SimulationResult { meta, series: Series { time_s, voltage_v, current_a } })
}
