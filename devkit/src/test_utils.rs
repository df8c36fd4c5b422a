/*!
Test Harness pour le kernel CellSim

Facilite l'écriture de tests HTTP avec:
- Routeur Axum construit avec les stubs (ou le moteur natif)
- Requêtes envoyées en mémoire via tower::ServiceExt::oneshot
- Assertions sur les champs JSON des réponses (chemins "a.b.c")
- Décodage du graphe PNG renvoyé en data URI
*/

use crate::engine_stub::{StubEngine, StubRenderer};
use anyhow::Result;
use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use cellsim_kernel::config::KernelConfig;
use cellsim_kernel::plot::DATA_URI_PREFIX;
use cellsim_kernel::{build_router, AppState, NativeEngine, PlotRenderer, SimulationEngine};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Harness de test complet pour le routeur du kernel
pub struct TestHarness {
    pub state: AppState,
    router: Router,
}

/// Réponse HTTP décodée
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestHarness {
    /// Harness avec StubEngine + StubRenderer et config par défaut
    pub fn new() -> Self {
        Self::with_parts(Arc::new(StubEngine::new()), Arc::new(StubRenderer::new()))
    }

    /// Harness avec moteur natif (vrai calcul) et renderer factice
    pub fn native() -> Self {
        Self::with_parts(Arc::new(NativeEngine::default()), Arc::new(StubRenderer::new()))
    }

    pub fn with_parts(engine: Arc<dyn SimulationEngine>, renderer: Arc<dyn PlotRenderer>) -> Self {
        Self::with_config(engine, renderer, KernelConfig::default())
    }

    pub fn with_config(engine: Arc<dyn SimulationEngine>, renderer: Arc<dyn PlotRenderer>, cfg: KernelConfig) -> Self {
        env_logger::try_init().ok(); // Init logging pour tests

        let state = AppState::new(engine, renderer, cfg);
        let router = build_router(state.clone());
        Self { state, router }
    }

    /// POST d'un corps JSON
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<TestResponse> {
        self.post_raw(path, serde_json::to_vec(body)?).await
    }

    /// POST d'un corps brut (JSON invalide, corps vide...)
    pub async fn post_raw(&self, path: &str, body: impl Into<Body>) -> Result<TestResponse> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())?;
        self.send(request).await
    }

    pub async fn get(&self, path: &str) -> Result<TestResponse> {
        let request = Request::builder().method(Method::GET).uri(path).body(Body::empty())?;
        self.send(request).await
    }

    /// Envoie une requête arbitraire (ex: preflight CORS)
    pub async fn send(&self, request: Request<Body>) -> Result<TestResponse> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        log::info!("📨 {} -> {}", status, body.get("error").and_then(Value::as_str).unwrap_or("ok"));

        Ok(TestResponse { status, headers, body })
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestResponse {
    /// Champ imbriqué par chemin pointé ("result.meta.outputs.v_min")
    pub fn field(&self, path: &str) -> Option<&Value> {
        get_nested_field(&self.body, path)
    }

    /// Assert qu'un champ spécifique existe
    pub fn assert_field_exists(&self, path: &str) -> Result<()> {
        if self.field(path).is_some() {
            return Ok(());
        }
        anyhow::bail!("Field '{}' not found in response: {}", path, self.body);
    }

    /// Assert qu'un champ a une valeur spécifique
    pub fn assert_field_equals(&self, path: &str, expected: &Value) -> Result<()> {
        match self.field(path) {
            Some(actual) if actual == expected => Ok(()),
            Some(actual) => anyhow::bail!("Field '{}' mismatch: expected {:?}, got {:?}", path, expected, actual),
            None => anyhow::bail!("Field '{}' not found for comparison", path),
        }
    }

    /// Série numérique (ex: "result.series.voltage_v")
    pub fn series(&self, path: &str) -> Result<Vec<f64>> {
        let values = self
            .field(path)
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow::anyhow!("Field '{}' is not an array", path))?;
        values
            .iter()
            .map(|v| v.as_f64().ok_or_else(|| anyhow::anyhow!("non-numeric value in '{}': {}", path, v)))
            .collect()
    }

    /// Octets PNG de `plot_png_base64`
    pub fn plot_png(&self) -> Result<Vec<u8>> {
        let uri = self
            .field("plot_png_base64")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow::anyhow!("no plot_png_base64 in response"))?;
        let b64 = uri
            .strip_prefix(DATA_URI_PREFIX)
            .ok_or_else(|| anyhow::anyhow!("plot is not a PNG data URI"))?;
        Ok(STANDARD.decode(b64)?)
    }

    /// Message d'erreur de la réponse, s'il y en a un
    pub fn error(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }
}

/// (largeur, hauteur) d'un PNG, lues dans l'en-tête IHDR
pub fn png_dimensions(png: &[u8]) -> Option<(u32, u32)> {
    if png.len() < 24 || &png[..8] != b"\x89PNG\r\n\x1a\n" || &png[12..16] != b"IHDR" {
        return None;
    }
    let be = |b: &[u8]| u32::from_be_bytes([b[0], b[1], b[2], b[3]]);
    Some((be(&png[16..20]), be(&png[20..24])))
}

fn get_nested_field<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for part in path.split('.') {
        match current {
            Value::Object(obj) => current = obj.get(part)?,
            _ => return None,
        }
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_harness_basic_functionality() {
        let harness = TestHarness::new();

        let resp = harness.get("/api/health").await.unwrap();
        assert_eq!(resp.status, StatusCode::OK);
        resp.assert_field_equals("status", &Value::String("ok".into())).unwrap();

        let resp = harness.post_json("/api/run", &serde_json::json!({})).await.unwrap();
        assert_eq!(resp.status, StatusCode::OK);
        resp.assert_field_exists("result.meta.outputs.n_points").unwrap();
        assert_eq!(resp.series("result.series.time_s").unwrap().len(), 61);
        assert!(resp.assert_field_exists("result.meta.missing").is_err());
    }

    #[tokio::test]
    async fn test_plot_png_from_stub_renderer() {
        let harness = TestHarness::new();
        let resp = harness.post_json("/api/run", &serde_json::json!({})).await.unwrap();
        let png = resp.plot_png().unwrap();
        assert!(png.starts_with(b"\x89PNG"));
        // PNG factice : pas d'IHDR
        assert!(png_dimensions(&png).is_none());
    }

    #[test]
    fn test_nested_field_lookup() {
        let value = serde_json::json!({"a": {"b": {"c": 1}}, "x": [1, 2]});
        assert_eq!(get_nested_field(&value, "a.b.c"), Some(&serde_json::json!(1)));
        assert!(get_nested_field(&value, "a.z").is_none());
        assert!(get_nested_field(&value, "x.0").is_none());
    }
}
