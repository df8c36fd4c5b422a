/*!
# CellSim DevKit - Stubs et Utilitaires pour Tests

Bibliothèque facilitant les tests du kernel sans moteur numérique ni polices:
- Stub moteur (séries linéaires déterministes) et moteur en échec
- Stub renderer (PNG factice) et renderer en échec
- Harness pilotant le routeur Axum en mémoire (pas de socket)
*/

pub mod engine_stub;
pub mod test_utils;

pub use engine_stub::{FailingEngine, FailingRenderer, StubEngine, StubRenderer};
pub use test_utils::{png_dimensions, TestHarness, TestResponse};
