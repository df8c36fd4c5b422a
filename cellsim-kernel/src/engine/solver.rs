//! Intégration RK4 à pas fixe des modèles réduits.
//!
//! Le pilote `integrate` avance l'état par sous-pas (au plus `max_step_s`),
//! enregistre un point à chaque période de sortie et s'arrête sur
//! l'événement de tension de coupure. Le point de coupure est placé par
//! interpolation linéaire entre les deux derniers sous-pas.

use super::{EngineError, Termination};

/// Modèle de cellule exprimé comme une ODE à N états sous courant imposé
pub trait CellModel<const N: usize> {
    /// État initial pour un SOC donné
    fn initial_state(&self, soc: f64) -> [f64; N];

    /// dy/dt sous le courant `current_a` (positif en décharge)
    fn derivatives(&self, state: &[f64; N], current_a: f64) -> [f64; N];

    /// Tension aux bornes [V]
    fn terminal_voltage(&self, state: &[f64; N], current_a: f64) -> f64;

    /// Capacité déchargée depuis le début [A.h]
    fn discharged_capacity(&self, state: &[f64; N], initial: &[f64; N]) -> f64;

    /// false si l'état sort du domaine physique (électrode vide/pleine)
    fn is_admissible(&self, state: &[f64; N], current_a: f64) -> bool;
}

#[derive(Debug, Clone, Copy)]
pub struct SolverSettings {
    pub max_step_s: f64,
    pub max_steps: usize,
    pub lower_cutoff_v: f64,
}

/// Trajectoire échantillonnée produite par `integrate`
#[derive(Debug, Clone, Default)]
pub struct Trajectory {
    pub time_s: Vec<f64>,
    pub voltage_v: Vec<f64>,
    pub capacity_ah: Vec<f64>,
}

impl Trajectory {
    fn push(&mut self, t: f64, v: f64, q: f64) {
        self.time_s.push(t);
        self.voltage_v.push(v);
        self.capacity_ah.push(q);
    }
}

/// Un pas RK4 classique : y + dt/6 (k1 + 2k2 + 2k3 + k4)
pub fn rk4_step<const N: usize, M: CellModel<N>>(model: &M, y: &[f64; N], current_a: f64, dt: f64) -> [f64; N] {
    let k1 = model.derivatives(y, current_a);
    let k2 = model.derivatives(&axpy(y, dt / 2.0, &k1), current_a);
    let k3 = model.derivatives(&axpy(y, dt / 2.0, &k2), current_a);
    let k4 = model.derivatives(&axpy(y, dt, &k3), current_a);

    let mut next = *y;
    for i in 0..N {
        next[i] += dt / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]);
    }
    next
}

fn axpy<const N: usize>(y: &[f64; N], a: f64, k: &[f64; N]) -> [f64; N] {
    let mut out = *y;
    for i in 0..N {
        out[i] += a * k[i];
    }
    out
}

/// Intègre une décharge à courant constant sur `duration_s`
pub fn integrate<const N: usize, M: CellModel<N>>(
    model: &M,
    initial_soc: f64,
    current_a: f64,
    duration_s: f64,
    period_s: f64,
    settings: &SolverSettings,
) -> Result<(Trajectory, Termination), EngineError> {
    let initial = model.initial_state(initial_soc);
    let mut state = initial;
    let mut t = 0.0_f64;

    let v0 = model.terminal_voltage(&state, current_a);
    if !v0.is_finite() {
        return Err(EngineError::NonFinite(0.0));
    }
    if !model.is_admissible(&state, current_a) || v0 < settings.lower_cutoff_v {
        return Err(EngineError::InitialVoltageBelowCutoff { voltage: v0, cutoff: settings.lower_cutoff_v });
    }

    let mut traj = Trajectory::default();
    traj.push(0.0, v0, 0.0);

    let mut v_prev = v0;
    let mut next_output = period_s.min(duration_s);
    let mut steps = 0usize;

    while t < duration_s {
        steps += 1;
        if steps > settings.max_steps {
            return Err(EngineError::StepLimitExceeded(settings.max_steps));
        }

        let dt = settings.max_step_s.min(next_output - t);
        let candidate = rk4_step(model, &state, current_a, dt);
        let t_next = if next_output - t <= settings.max_step_s { next_output } else { t + dt };

        if !model.is_admissible(&candidate, current_a) {
            let q = model.discharged_capacity(&state, &initial);
            if traj.time_s.last().copied() != Some(t) {
                traj.push(t, v_prev, q);
            }
            return Ok((traj, Termination::ElectrodeDepleted));
        }

        let v_next = model.terminal_voltage(&candidate, current_a);
        if !v_next.is_finite() || candidate.iter().any(|x| !x.is_finite()) {
            return Err(EngineError::NonFinite(t_next));
        }

        if v_next < settings.lower_cutoff_v {
            // Interpolation linéaire du franchissement de la coupure
            let frac = ((v_prev - settings.lower_cutoff_v) / (v_prev - v_next)).clamp(0.0, 1.0);
            let t_cut = t + frac * (t_next - t);
            let q_prev = model.discharged_capacity(&state, &initial);
            let q_next = model.discharged_capacity(&candidate, &initial);
            traj.push(t_cut, settings.lower_cutoff_v, q_prev + frac * (q_next - q_prev));
            return Ok((traj, Termination::VoltageCutoff));
        }

        state = candidate;
        t = t_next;
        v_prev = v_next;

        if t >= next_output {
            traj.push(t, v_next, model.discharged_capacity(&state, &initial));
            next_output = (next_output + period_s).min(duration_s);
        }
    }

    Ok((traj, Termination::Completed))
}
