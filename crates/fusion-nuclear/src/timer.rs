// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Solve Timer
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use std::collections::BTreeMap;
use std::time::Instant;

/// Wall-clock stopwatch with named splits [s].
#[derive(Debug, Clone, Default)]
pub struct Timer {
    started: Option<Instant>,
    elapsed_s: f64,
    splits: BTreeMap<String, f64>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Stop and keep the time since the last `start`. No-op when stopped.
    pub fn stop(&mut self) {
        if let Some(t0) = self.started.take() {
            self.elapsed_s = t0.elapsed().as_secs_f64();
        }
    }

    /// Seconds between the last start and stop.
    pub fn elapsed(&self) -> f64 {
        self.elapsed_s
    }

    pub fn record_split(&mut self, name: &str) {
        self.splits.insert(name.to_string(), self.elapsed_s);
    }

    pub fn split(&self, name: &str) -> Option<f64> {
        self.splits.get(name).copied()
    }

    pub fn clear_split(&mut self, name: &str) {
        self.splits.remove(name);
    }
}
