/**
 * MOTEUR DE SIMULATION - Interface étroite entre le service et le solveur
 *
 * RÔLE :
 * Définit le contrat que tout moteur électrochimique doit respecter :
 * construire un modèle, exécuter une expérience, exposer la solution
 * par nom de variable. Le service HTTP ne connaît que ce trait.
 *
 * FONCTIONNEMENT :
 * - SimulationEngine = trait (solve) implémenté par NativeEngine ou des stubs de test
 * - Experiment = décharge à courant constant (C-rate + durée + période d'échantillonnage)
 * - Solution = variables nommées ("Time [s]", "Terminal voltage [V]"...) + raison d'arrêt
 * - EngineError = erreurs du solveur, remontées telles quelles à l'appelant
 *
 * IMPLÉMENTATION NATIVE :
 * - parameters : jeu Chen2020 (OCP des électrodes, géométrie, cinétique)
 * - spm / thevenin : modèles réduits sous forme d'ODE
 * - solver : intégration RK4 à pas fixe + événement de tension de coupure
 */

pub mod native;
pub mod parameters;
pub mod solver;
pub mod spm;
pub mod thevenin;

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub use native::NativeEngine;
pub use parameters::ParameterSet;

pub const VAR_TIME: &str = "Time [s]";
pub const VAR_VOLTAGE: &str = "Terminal voltage [V]";
pub const VAR_CAPACITY: &str = "Discharge capacity [A.h]";

/// Erreurs remontées par un moteur de simulation
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("unknown parameter set: {0}")]
    UnknownParameterSet(String),
    #[error("invalid experiment: {0}")]
    InvalidExperiment(String),
    #[error("initial terminal voltage {voltage:.4} V is below the lower cut-off {cutoff:.4} V")]
    InitialVoltageBelowCutoff { voltage: f64, cutoff: f64 },
    #[error("step limit of {0} exceeded before the experiment finished")]
    StepLimitExceeded(usize),
    #[error("solver produced a non-finite value at t = {0} s")]
    NonFinite(f64),
    #[error("variable '{0}' not found in solution")]
    UnknownVariable(String),
    #[error("malformed solution: {0}")]
    MalformedSolution(String),
    /// Erreur d'un moteur externe, message conservé tel quel
    #[error("{0}")]
    Backend(String),
}

/// Modèles disponibles, identifiants canoniques "SPM" / "Thevenin"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ModelKind {
    #[serde(rename = "SPM")]
    Spm,
    #[serde(rename = "Thevenin")]
    Thevenin,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Spm => "SPM",
            ModelKind::Thevenin => "Thevenin",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparaison insensible à la casse, sans trim ("spm", "Thevenin", "THEVENIN")
impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SPM" => Ok(ModelKind::Spm),
            "THEVENIN" => Ok(ModelKind::Thevenin),
            other => Err(format!("unknown model: {other}")),
        }
    }
}

/// Décharge à courant constant : "{c_rate}C discharge for {t_hours} hours"
#[derive(Debug, Clone, PartialEq)]
pub struct Experiment {
    pub c_rate: f64,
    pub duration_s: f64,
    /// Période d'échantillonnage des points de sortie
    pub period_s: f64,
}

impl Experiment {
    pub const DEFAULT_PERIOD_S: f64 = 60.0;

    pub fn constant_current_discharge(c_rate: f64, t_hours: f64) -> Self {
        Self {
            c_rate,
            duration_s: t_hours * 3600.0,
            period_s: Self::DEFAULT_PERIOD_S,
        }
    }

    pub fn with_period(mut self, period_s: f64) -> Self {
        self.period_s = period_s;
        self
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.c_rate.is_finite() && self.c_rate > 0.0) {
            return Err(EngineError::InvalidExperiment(format!("C-rate must be positive, got {}", self.c_rate)));
        }
        if !(self.duration_s.is_finite() && self.duration_s > 0.0) {
            return Err(EngineError::InvalidExperiment(format!("duration must be positive, got {} s", self.duration_s)));
        }
        if !(self.period_s.is_finite() && self.period_s > 0.0) {
            return Err(EngineError::InvalidExperiment(format!("period must be positive, got {} s", self.period_s)));
        }
        Ok(())
    }
}

impl fmt::Display for Experiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}C discharge for {} hours", self.c_rate, self.duration_s / 3600.0)
    }
}

/// Raison de fin d'une expérience
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Durée demandée atteinte
    Completed,
    /// Tension de coupure basse franchie avant la fin
    VoltageCutoff,
    /// Stœchiométrie d'une électrode sortie de ]0, 1[
    ElectrodeDepleted,
}

/// Solution d'un moteur : séries nommées de même longueur
#[derive(Debug, Clone)]
pub struct Solution {
    variables: BTreeMap<String, Vec<f64>>,
    pub termination: Termination,
}

impl Solution {
    pub fn new(termination: Termination) -> Self {
        Self { variables: BTreeMap::new(), termination }
    }

    pub fn with_variable(mut self, name: &str, values: Vec<f64>) -> Self {
        self.variables.insert(name.to_string(), values);
        self
    }

    /// Lecture d'une variable par son nom (ex: "Terminal voltage [V]")
    pub fn get(&self, name: &str) -> Result<&[f64], EngineError> {
        self.variables
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| EngineError::UnknownVariable(name.to_string()))
    }

    pub fn variable_names(&self) -> Vec<String> {
        self.variables.keys().cloned().collect()
    }
}

/// Contrat commun à tous les moteurs (natif, stubs de test...)
pub trait SimulationEngine: Send + Sync {
    /// Nom court du moteur, exposé dans /api/system/health
    fn name(&self) -> &str;

    /// Identifiant du jeu de paramètres attaché à chaque simulation
    fn parameter_set(&self) -> &str;

    /// Exécute l'expérience depuis l'état de charge initial donné
    fn solve(&self, model: ModelKind, experiment: &Experiment, initial_soc: f64) -> Result<Solution, EngineError>;
}
