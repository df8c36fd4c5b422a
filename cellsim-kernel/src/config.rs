use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use tokio::{fs, net};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid bind address '{0}': {1}")]
    InvalidBind(String, String),
    #[error("invalid simulation setting: {0}")]
    InvalidSimulation(String),
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct KernelConfig {
    pub server: ServerConf,
    pub simulation: SimulationConf,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConf {
    pub host: String,
    pub port: u16,
    /// Politique CORS de développement : toute origine acceptée
    pub cors_allow_any_origin: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SimulationConf {
    pub parameter_set: String,
    pub output_period_s: f64,
    pub max_step_s: f64,
    pub max_steps: usize,
}

impl Default for ServerConf {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5000,
            cors_allow_any_origin: true,
        }
    }
}

impl Default for SimulationConf {
    fn default() -> Self {
        Self {
            parameter_set: "Chen2020".into(),
            output_period_s: 60.0,
            max_step_s: 1.0,
            max_steps: 2_000_000,
        }
    }
}

impl ServerConf {
    /// Adresse d'écoute ; CELLSIM_BIND ("host:port") a priorité sur le fichier
    pub async fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = std::env::var("CELLSIM_BIND").unwrap_or_else(|_| format!("{}:{}", self.host, self.port));
        resolve_bind(&raw).await
    }
}

/// Résolution "host:port" ; accepte les noms d'hôte (localhost...) en plus des IP
pub async fn resolve_bind(raw: &str) -> Result<SocketAddr, ConfigError> {
    let mut addrs = net::lookup_host(raw)
        .await
        .map_err(|e| ConfigError::InvalidBind(raw.to_string(), e.to_string()))?;
    addrs
        .next()
        .ok_or_else(|| ConfigError::InvalidBind(raw.to_string(), "no address resolved".into()))
}

impl KernelConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sim = &self.simulation;
        if !(sim.output_period_s.is_finite() && sim.output_period_s > 0.0) {
            return Err(ConfigError::InvalidSimulation(format!("output_period_s must be > 0, got {}", sim.output_period_s)));
        }
        if !(sim.max_step_s.is_finite() && sim.max_step_s > 0.0) {
            return Err(ConfigError::InvalidSimulation(format!("max_step_s must be > 0, got {}", sim.max_step_s)));
        }
        if sim.max_steps == 0 {
            return Err(ConfigError::InvalidSimulation("max_steps must be > 0".into()));
        }
        Ok(())
    }
}

/// Parse le YAML ; contenu vide = config par défaut
pub fn parse_config(txt: &str) -> Result<KernelConfig, serde_yaml::Error> {
    if txt.trim().is_empty() {
        return Ok(KernelConfig::default());
    }
    serde_yaml::from_str(txt)
}

pub async fn load_config() -> KernelConfig {
    let path = std::env::var("CELLSIM_KERNEL_CONFIG").unwrap_or_else(|_| "kernel.yaml".into());
    if Path::new(&path).exists() {
        let txt = fs::read_to_string(&path).await.unwrap_or_default();
        parse_config(&txt).unwrap_or_else(|e| {
            tracing::warn!("[kernel] config invalide ({path}): {e}");
            KernelConfig::default()
        })
    } else {
        tracing::info!("[kernel] pas de {path}, usage config par défaut");
        KernelConfig::default()
    }
}
