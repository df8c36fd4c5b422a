//! Single Particle Model réduit.
//!
//! États : stœchiométries moyennes [x_n, y_p]. La concentration de surface
//! suit le profil parabolique (approximation polynomiale) ; la cinétique
//! est en Butler-Volmer symétrique. L'électrolyte n'est pas résolu.

use super::parameters::{ElectrodeParams, ParameterSet, FARADAY};
use super::solver::CellModel;

pub struct SingleParticleModel<'a> {
    params: &'a ParameterSet,
}

impl<'a> SingleParticleModel<'a> {
    pub fn new(params: &'a ParameterSet) -> Self {
        Self { params }
    }

    /// Densité de courant interfaciale [A/m2]
    fn interfacial_current(&self, electrode: &ElectrodeParams, current_a: f64) -> f64 {
        current_a / (electrode.specific_area() * electrode.thickness * self.params.electrode_area)
    }

    /// Écart surface/moyenne en stœchiométrie (profil parabolique)
    fn surface_offset(&self, electrode: &ElectrodeParams, current_a: f64) -> f64 {
        let j = self.interfacial_current(electrode, current_a);
        electrode.particle_radius * j / (5.0 * FARADAY * electrode.diffusivity * electrode.max_concentration)
    }

    /// Stœchiométries de surface (négative, positive)
    pub fn surface_stoichiometries(&self, state: &[f64; 2], current_a: f64) -> (f64, f64) {
        let p = self.params;
        (
            state[0] - self.surface_offset(&p.negative, current_a),
            state[1] + self.surface_offset(&p.positive, current_a),
        )
    }

    /// Surtension Butler-Volmer |eta| = 2RT/F asinh(j / 2 i0)
    fn overpotential(&self, electrode: &ElectrodeParams, surface_stoich: f64, current_a: f64) -> f64 {
        let cs = surface_stoich.clamp(1e-9, 1.0 - 1e-9) * electrode.max_concentration;
        let i0 = electrode.reaction_rate
            * (self.params.electrolyte_concentration * cs * (electrode.max_concentration - cs)).sqrt();
        let j = self.interfacial_current(electrode, current_a);
        2.0 * self.params.thermal_voltage() * (j / (2.0 * i0)).asinh()
    }

    fn electrode_moles_per_stoich(&self, electrode: &ElectrodeParams) -> f64 {
        electrode.max_concentration * electrode.active_fraction * electrode.thickness * self.params.electrode_area
    }
}

impl CellModel<2> for SingleParticleModel<'_> {
    fn initial_state(&self, soc: f64) -> [f64; 2] {
        [self.params.negative.stoich_at_soc(soc), self.params.positive.stoich_at_soc(soc)]
    }

    fn derivatives(&self, _state: &[f64; 2], current_a: f64) -> [f64; 2] {
        let p = self.params;
        [
            -current_a / (FARADAY * self.electrode_moles_per_stoich(&p.negative)),
            current_a / (FARADAY * self.electrode_moles_per_stoich(&p.positive)),
        ]
    }

    fn terminal_voltage(&self, state: &[f64; 2], current_a: f64) -> f64 {
        let p = self.params;
        let (x_surf, y_surf) = self.surface_stoichiometries(state, current_a);
        let ocv = super::parameters::nmc811_ocp(y_surf) - super::parameters::graphite_siox_ocp(x_surf);
        ocv - self.overpotential(&p.negative, x_surf, current_a) - self.overpotential(&p.positive, y_surf, current_a)
    }

    fn discharged_capacity(&self, state: &[f64; 2], initial: &[f64; 2]) -> f64 {
        (initial[0] - state[0]) * self.electrode_moles_per_stoich(&self.params.negative) * FARADAY / 3600.0
    }

    fn is_admissible(&self, state: &[f64; 2], current_a: f64) -> bool {
        let (x_surf, y_surf) = self.surface_stoichiometries(state, current_a);
        x_surf > 0.0 && x_surf < 1.0 && y_surf > 0.0 && y_surf < 1.0
    }
}
