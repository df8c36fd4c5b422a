//! Moteur natif : SPM / Thevenin intégrés en processus.

use super::parameters::ParameterSet;
use super::solver::{integrate, CellModel, SolverSettings, Trajectory};
use super::spm::SingleParticleModel;
use super::thevenin::TheveninModel;
use super::{EngineError, Experiment, ModelKind, SimulationEngine, Solution, Termination};
use super::{VAR_CAPACITY, VAR_TIME, VAR_VOLTAGE};
use crate::config::SimulationConf;

pub struct NativeEngine {
    params: ParameterSet,
    max_step_s: f64,
    max_steps: usize,
}

impl NativeEngine {
    pub fn new(params: ParameterSet) -> Self {
        Self { params, max_step_s: 1.0, max_steps: 2_000_000 }
    }

    /// Construit le moteur depuis la section `simulation` de kernel.yaml
    pub fn from_config(conf: &SimulationConf) -> Result<Self, EngineError> {
        let params = ParameterSet::by_name(&conf.parameter_set)?;
        Ok(Self::new(params).with_limits(conf.max_step_s, conf.max_steps))
    }

    pub fn with_limits(mut self, max_step_s: f64, max_steps: usize) -> Self {
        self.max_step_s = max_step_s;
        self.max_steps = max_steps;
        self
    }

    fn run<M: CellModel<2>>(&self, model: &M, experiment: &Experiment, initial_soc: f64) -> Result<(Trajectory, Termination), EngineError> {
        let current_a = experiment.c_rate * self.params.nominal_capacity_ah;
        let settings = SolverSettings {
            max_step_s: self.max_step_s,
            max_steps: self.max_steps,
            lower_cutoff_v: self.params.lower_cutoff_v,
        };
        integrate(model, initial_soc, current_a, experiment.duration_s, experiment.period_s, &settings)
    }
}

impl Default for NativeEngine {
    fn default() -> Self {
        Self::new(ParameterSet::chen2020())
    }
}

impl SimulationEngine for NativeEngine {
    fn name(&self) -> &str {
        "native"
    }

    fn parameter_set(&self) -> &str {
        self.params.name
    }

    fn solve(&self, model: ModelKind, experiment: &Experiment, initial_soc: f64) -> Result<Solution, EngineError> {
        experiment.validate()?;
        if !(0.0..=1.0).contains(&initial_soc) {
            return Err(EngineError::InvalidExperiment(format!("initial SOC must be in [0, 1], got {initial_soc}")));
        }

        tracing::debug!("[engine] {} / {}: {} from SOC {}", model, self.params.name, experiment, initial_soc);

        let (traj, termination) = match model {
            ModelKind::Spm => self.run(&SingleParticleModel::new(&self.params), experiment, initial_soc)?,
            ModelKind::Thevenin => self.run(&TheveninModel::new(&self.params), experiment, initial_soc)?,
        };

        tracing::debug!("[engine] {} points, termination = {:?}", traj.time_s.len(), termination);

        Ok(Solution::new(termination)
            .with_variable(VAR_TIME, traj.time_s)
            .with_variable(VAR_VOLTAGE, traj.voltage_v)
            .with_variable(VAR_CAPACITY, traj.capacity_ah))
    }
}
