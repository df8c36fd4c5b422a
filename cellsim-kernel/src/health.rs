use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// Diagnostic exposé par GET /api/system/health
#[derive(Debug, Serialize)]
pub struct KernelHealth {
    pub status: &'static str,
    pub engine: String,
    pub parameter_set: String,
    pub started_at: String,
    pub uptime_seconds: u64,
    pub runs_succeeded: u64,
    pub runs_rejected: u64,
    pub runs_failed: u64,
    pub last_failure: Option<String>,
    pub memory_usage_mb: f32,
}

/// Compteurs de diagnostic, sans effet sur l'exécution des simulations
#[derive(Clone)]
pub struct HealthTracker {
    start_time: Instant,
    started_at: OffsetDateTime,
    succeeded: Arc<AtomicU64>,
    rejected: Arc<AtomicU64>,
    failed: Arc<AtomicU64>,
    last_failure: Arc<Mutex<Option<String>>>,
}

impl HealthTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            started_at: OffsetDateTime::now_utc(),
            succeeded: Arc::new(AtomicU64::new(0)),
            rejected: Arc::new(AtomicU64::new(0)),
            failed: Arc::new(AtomicU64::new(0)),
            last_failure: Arc::new(Mutex::new(None)),
        }
    }

    pub fn record_success(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self, message: &str) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        *self.last_failure.lock() = Some(message.to_string());
    }

    pub fn get_health(&self, engine: &str, parameter_set: &str) -> KernelHealth {
        KernelHealth {
            status: "ok",
            engine: engine.to_string(),
            parameter_set: parameter_set.to_string(),
            started_at: self.started_at.format(&Rfc3339).unwrap_or_default(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            runs_succeeded: self.succeeded.load(Ordering::Relaxed),
            runs_rejected: self.rejected.load(Ordering::Relaxed),
            runs_failed: self.failed.load(Ordering::Relaxed),
            last_failure: self.last_failure.lock().clone(),
            memory_usage_mb: get_memory_usage_mb(),
        }
    }
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn get_memory_usage_mb() -> f32 {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            let rss_kb = status
                .lines()
                .find(|line| line.starts_with("VmRSS:"))
                .and_then(|line| line.split_whitespace().nth(1))
                .and_then(|kb| kb.parse::<u64>().ok());
            if let Some(kb) = rss_kb {
                return kb as f32 / 1024.0; // KB -> MB
            }
        }
    }

    // Inconnu hors Linux
    0.0
}
