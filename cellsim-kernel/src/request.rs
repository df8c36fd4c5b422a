/**
 * VALIDATION DES REQUÊTES - JSON brut → SimulationRequest typée
 *
 * RÔLE :
 * Transforme le corps de POST /api/run en structure typée avant toute
 * exécution. Valeurs par défaut pour les champs absents, coercition
 * stricte des types, puis contrôles de bornes.
 *
 * FONCTIONNEMENT :
 * - Corps vide = {} ; JSON invalide ou non-objet = InvalidInput
 * - Nombres JSON ou chaînes numériques acceptés pour c_rate / t_hours / init_soc
 * - Toutes les coercitions d'abord, puis bornes dans l'ordre :
 *   c_rate, t_hours, init_soc, model
 * - Modèle insensible à la casse, normalisé en "SPM" / "Thevenin"
 */

use serde_json::{Map, Value};

use crate::engine::ModelKind;
use crate::error::ApiError;
use crate::models::SimulationRequest;

const MODEL_ERROR: &str = "model must be SPM or THEVENIN";

impl SimulationRequest {
    /// Parse et valide un corps HTTP brut
    pub fn from_body(body: &[u8]) -> Result<Self, ApiError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Self::from_json(&Value::Object(Map::new()));
        }
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| ApiError::invalid(format!("Invalid input: {e}")))?;
        Self::from_json(&value)
    }

    /// Valide un objet JSON déjà parsé
    pub fn from_json(value: &Value) -> Result<Self, ApiError> {
        let obj = value
            .as_object()
            .ok_or_else(|| ApiError::invalid("Invalid input: request body must be a JSON object"))?;

        let defaults = SimulationRequest::default();
        let c_rate = number_field(obj, "c_rate", defaults.c_rate)?;
        let t_hours = number_field(obj, "t_hours", defaults.t_hours)?;
        let init_soc = number_field(obj, "init_soc", defaults.init_soc)?;
        let model = obj.get("model");

        if c_rate <= 0.0 {
            return Err(ApiError::invalid("c_rate must be > 0"));
        }
        if t_hours <= 0.0 {
            return Err(ApiError::invalid("t_hours must be > 0"));
        }
        if !(0.0..=1.0).contains(&init_soc) {
            return Err(ApiError::invalid("init_soc must be in [0, 1]"));
        }

        let model = match model {
            None => defaults.model,
            Some(Value::String(s)) => s.parse::<ModelKind>().map_err(|_| ApiError::invalid(MODEL_ERROR))?,
            Some(_) => return Err(ApiError::invalid(MODEL_ERROR)),
        };

        Ok(Self { c_rate, t_hours, init_soc, model })
    }
}

/// Coercition d'un champ numérique : nombre JSON ou chaîne numérique
fn number_field(obj: &Map<String, Value>, field: &str, default: f64) -> Result<f64, ApiError> {
    let parsed = match obj.get(field) {
        None => return Ok(default),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    let value = parsed.ok_or_else(|| ApiError::invalid(format!("Invalid input: could not convert {field} to float")))?;
    if !value.is_finite() {
        return Err(ApiError::invalid(format!("Invalid input: {field} must be a finite number")));
    }
    Ok(value)
}
