//! Modèle Thevenin (circuit équivalent R0 + R1||C1).
//!
//! États : [soc, v1] où v1 est la tension aux bornes de la branche RC.
//! L'OCV vient des potentiels d'électrode du jeu de paramètres.

use super::parameters::ParameterSet;
use super::solver::CellModel;

pub struct TheveninModel<'a> {
    params: &'a ParameterSet,
}

impl<'a> TheveninModel<'a> {
    pub fn new(params: &'a ParameterSet) -> Self {
        Self { params }
    }
}

impl CellModel<2> for TheveninModel<'_> {
    fn initial_state(&self, soc: f64) -> [f64; 2] {
        [soc, 0.0]
    }

    fn derivatives(&self, state: &[f64; 2], current_a: f64) -> [f64; 2] {
        let ecm = &self.params.ecm;
        [
            -current_a / (3600.0 * self.params.nominal_capacity_ah),
            current_a / ecm.c1_farad - state[1] / (ecm.r1_ohm * ecm.c1_farad),
        ]
    }

    fn terminal_voltage(&self, state: &[f64; 2], current_a: f64) -> f64 {
        self.params.open_circuit_voltage(state[0]) - state[1] - current_a * self.params.ecm.r0_ohm
    }

    fn discharged_capacity(&self, state: &[f64; 2], initial: &[f64; 2]) -> f64 {
        (initial[0] - state[0]) * self.params.nominal_capacity_ah
    }

    fn is_admissible(&self, state: &[f64; 2], _current_a: f64) -> bool {
        state[0] >= 0.0 && state[0] <= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::solver::{integrate, rk4_step, SolverSettings};
    use crate::engine::Termination;

    #[test]
    fn test_rc_branch_relaxes_to_steady_state() {
        let p = ParameterSet::chen2020();
        let model = TheveninModel::new(&p);
        let mut state = model.initial_state(0.8);
        // 10 constantes de temps R1.C1
        for _ in 0..320 {
            state = rk4_step(&model, &state, 5.0, 1.0);
        }
        let steady = 5.0 * p.ecm.r1_ohm;
        assert!((state[1] - steady).abs() < 1e-4 * steady.max(1.0), "v1 = {}", state[1]);
    }

    #[test]
    fn test_instant_ohmic_drop() {
        let p = ParameterSet::chen2020();
        let model = TheveninModel::new(&p);
        let state = model.initial_state(0.5);
        let drop = model.terminal_voltage(&state, 0.0) - model.terminal_voltage(&state, 5.0);
        assert!((drop - 5.0 * p.ecm.r0_ohm).abs() < 1e-12);
    }

    #[test]
    fn test_half_c_discharge_completes_one_hour() {
        let p = ParameterSet::chen2020();
        let model = TheveninModel::new(&p);
        let settings = SolverSettings { max_step_s: 1.0, max_steps: 1_000_000, lower_cutoff_v: p.lower_cutoff_v };
        let (traj, term) = integrate(&model, 1.0, 2.5, 3600.0, 60.0, &settings).unwrap();
        assert_eq!(term, Termination::Completed);
        assert_eq!(traj.time_s.len(), 61);
        assert!((traj.capacity_ah.last().unwrap() - 2.5).abs() < 1e-6);
    }
}
