//! Jeux de paramètres cellule.
//!
//! Seul Chen2020 (LG M50 21700, graphite-SiOx / NMC811, 5 Ah) est fourni.
//! Les potentiels d'équilibre des électrodes sont les ajustements tanh
//! publiés avec le jeu de paramètres.

use super::EngineError;

pub const FARADAY: f64 = 96_485.332_12; // C/mol
pub const GAS_CONSTANT: f64 = 8.314_462_618; // J/(mol.K)

/// Paramètres d'une électrode (particule sphérique unique)
#[derive(Debug, Clone)]
pub struct ElectrodeParams {
    /// Concentration maximale en lithium [mol/m3]
    pub max_concentration: f64,
    /// Rayon de particule [m]
    pub particle_radius: f64,
    /// Diffusivité solide [m2/s]
    pub diffusivity: f64,
    /// Épaisseur [m]
    pub thickness: f64,
    /// Fraction volumique de matière active
    pub active_fraction: f64,
    /// Constante de réaction [A/m2 (m3/mol)^1.5]
    pub reaction_rate: f64,
    /// Stœchiométrie à SOC = 0
    pub stoich_empty: f64,
    /// Stœchiométrie à SOC = 1
    pub stoich_full: f64,
}

impl ElectrodeParams {
    /// Surface active par unité de volume d'électrode [1/m]
    pub fn specific_area(&self) -> f64 {
        3.0 * self.active_fraction / self.particle_radius
    }

    /// Stœchiométrie moyenne correspondant à un état de charge
    pub fn stoich_at_soc(&self, soc: f64) -> f64 {
        self.stoich_empty + soc * (self.stoich_full - self.stoich_empty)
    }
}

/// Circuit équivalent 1RC utilisé par le modèle Thevenin
#[derive(Debug, Clone)]
pub struct EcmParams {
    pub r0_ohm: f64,
    pub r1_ohm: f64,
    pub c1_farad: f64,
}

#[derive(Debug, Clone)]
pub struct ParameterSet {
    pub name: &'static str,
    pub nominal_capacity_ah: f64,
    /// Surface d'électrode [m2]
    pub electrode_area: f64,
    pub temperature_k: f64,
    /// Concentration d'électrolyte supposée uniforme [mol/m3]
    pub electrolyte_concentration: f64,
    pub lower_cutoff_v: f64,
    pub negative: ElectrodeParams,
    pub positive: ElectrodeParams,
    pub ecm: EcmParams,
}

impl ParameterSet {
    pub fn chen2020() -> Self {
        Self {
            name: "Chen2020",
            nominal_capacity_ah: 5.0,
            electrode_area: 0.065 * 1.58,
            temperature_k: 298.15,
            electrolyte_concentration: 1000.0,
            lower_cutoff_v: 2.5,
            negative: ElectrodeParams {
                max_concentration: 33_133.0,
                particle_radius: 5.86e-6,
                diffusivity: 3.3e-14,
                thickness: 85.2e-6,
                active_fraction: 0.75,
                reaction_rate: 6.48e-7,
                stoich_empty: 0.0279,
                stoich_full: 0.9014,
            },
            positive: ElectrodeParams {
                max_concentration: 63_104.0,
                particle_radius: 5.22e-6,
                diffusivity: 4.0e-15,
                thickness: 75.6e-6,
                active_fraction: 0.665,
                reaction_rate: 3.42e-6,
                stoich_empty: 0.9084,
                stoich_full: 0.2661,
            },
            ecm: EcmParams {
                r0_ohm: 0.012,
                r1_ohm: 0.008,
                c1_farad: 4_000.0,
            },
        }
    }

    /// Recherche par nom (insensible à la casse)
    pub fn by_name(name: &str) -> Result<Self, EngineError> {
        match name.to_ascii_lowercase().as_str() {
            "chen2020" => Ok(Self::chen2020()),
            _ => Err(EngineError::UnknownParameterSet(name.to_string())),
        }
    }

    /// Facteur thermique RT/F [V]
    pub fn thermal_voltage(&self) -> f64 {
        GAS_CONSTANT * self.temperature_k / FARADAY
    }

    /// Tension à vide de la cellule pour un état de charge donné
    pub fn open_circuit_voltage(&self, soc: f64) -> f64 {
        nmc811_ocp(self.positive.stoich_at_soc(soc)) - graphite_siox_ocp(self.negative.stoich_at_soc(soc))
    }
}

/// OCP de l'électrode négative graphite-SiOx [V]
pub fn graphite_siox_ocp(x: f64) -> f64 {
    1.9793 * (-39.3631 * x).exp() + 0.2482
        - 0.0909 * (29.8538 * (x - 0.1234)).tanh()
        - 0.04478 * (14.9159 * (x - 0.2769)).tanh()
        - 0.0205 * (30.4444 * (x - 0.6103)).tanh()
}

/// OCP de l'électrode positive NMC811 [V]
pub fn nmc811_ocp(y: f64) -> f64 {
    -0.8090 * y + 4.4875
        - 0.0428 * (18.5138 * (y - 0.5542)).tanh()
        - 17.7326 * (15.7890 * (y - 0.3117)).tanh()
        + 17.5842 * (15.9308 * (y - 0.3120)).tanh()
}
