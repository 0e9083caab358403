// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Solver Reporting
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Progress messages and the end-of-solve performance report.
//!
//! The solver never prints directly; it talks to a [`Reporter`]. The
//! default [`LogReporter`] forwards to the `log` facade.

/// Width of the dotted label column in the performance report.
const LABEL_WIDTH: usize = 53;

/// Sink for solver messages, split by severity.
pub trait Reporter: Send {
    fn title(&mut self, message: &str);
    fn normal(&mut self, message: &str);
    /// Final figures of a solve.
    fn result(&mut self, message: &str);
    fn separator(&mut self, ch: char);
    fn warning(&mut self, message: &str);
}

/// Forwards every message to `log`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn title(&mut self, message: &str) {
        log::info!("*** {message} ***");
    }

    fn normal(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn result(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn separator(&mut self, ch: char) {
        log::info!("{}", ch.to_string().repeat(LABEL_WIDTH + 14));
    }

    fn warning(&mut self, message: &str) {
        log::warn!("{message}");
    }
}

/// Derived timing figures of a finished solve.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceReport {
    pub total_time_s: f64,
    pub num_iterations: usize,
    pub num_tracks: usize,
    pub num_segments: usize,
    pub num_fsrs: usize,
    pub num_groups: usize,
    pub num_polar: usize,
}

impl PerformanceReport {
    pub fn new(
        total_time_s: f64,
        num_iterations: usize,
        num_tracks: usize,
        num_segments: usize,
        num_fsrs: usize,
        num_groups: usize,
        num_polar: usize,
    ) -> Self {
        PerformanceReport {
            total_time_s,
            num_iterations,
            num_tracks,
            num_segments,
            num_fsrs,
            num_groups,
            num_polar,
        }
    }

    /// Seconds per (region, group) unknown over the whole solve.
    pub fn time_per_unknown(&self) -> f64 {
        let unknowns = self.num_fsrs * self.num_groups;
        self.total_time_s / unknowns.max(1) as f64
    }

    pub fn time_per_iteration(&self) -> f64 {
        self.total_time_s / self.num_iterations.max(1) as f64
    }

    /// Segment integrations per iteration: both directions, every polar
    /// angle and group.
    pub fn integrations_per_iteration(&self) -> usize {
        2 * self.num_polar * self.num_groups * self.num_segments
    }

    pub fn time_per_integration(&self) -> f64 {
        let total = self.integrations_per_iteration() * self.num_iterations;
        self.total_time_s / total.max(1) as f64
    }

    pub fn lines(&self) -> Vec<String> {
        vec![
            dotted("Total time to solution", self.total_time_s),
            dotted("Solution time per unknown", self.time_per_unknown()),
            dotted("Solution time per iteration", self.time_per_iteration()),
            dotted(
                "Integration time per segment integration",
                self.time_per_integration(),
            ),
        ]
    }

    pub fn emit(&self, reporter: &mut dyn Reporter) {
        reporter.title("Timing Report");
        for line in self.lines() {
            reporter.result(&line);
        }
        reporter.separator('-');
        reporter.result(&format!(
            "{:>12}  {:>12}  {:>12}",
            "# tracks", "# segments", "# FSRs"
        ));
        reporter.separator('-');
        reporter.result(&format!(
            "{:>12}  {:>12}  {:>12}",
            self.num_tracks, self.num_segments, self.num_fsrs
        ));
        reporter.separator('-');
    }
}

fn dotted(label: &str, seconds: f64) -> String {
    format!("{label:.<width$}{seconds:.4E} sec", width = LABEL_WIDTH)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Keeps every message in memory.
    #[derive(Debug, Default)]
    pub(crate) struct Recorder {
        pub lines: Vec<(String, String)>,
    }

    impl Reporter for Recorder {
        fn title(&mut self, message: &str) {
            self.lines.push(("title".into(), message.into()));
        }
        fn normal(&mut self, message: &str) {
            self.lines.push(("normal".into(), message.into()));
        }
        fn result(&mut self, message: &str) {
            self.lines.push(("result".into(), message.into()));
        }
        fn separator(&mut self, ch: char) {
            self.lines.push(("separator".into(), ch.to_string()));
        }
        fn warning(&mut self, message: &str) {
            self.lines.push(("warning".into(), message.into()));
        }
    }

    #[test]
    fn test_derived_metrics() {
        let report = PerformanceReport::new(12.0, 10, 100, 1000, 50, 2, 3);
        assert!((report.time_per_iteration() - 1.2).abs() < 1e-15);
        assert!((report.time_per_unknown() - 0.12).abs() < 1e-15);
        assert_eq!(report.integrations_per_iteration(), 12_000);
        assert!((report.time_per_integration() - 12.0 / 120_000.0).abs() < 1e-18);
    }

    #[test]
    fn test_zero_iterations_do_not_divide_by_zero() {
        let report = PerformanceReport::new(0.5, 0, 4, 8, 2, 1, 1);
        assert!(report.time_per_iteration().is_finite());
        assert!(report.time_per_unknown().is_finite());
        assert!(report.time_per_integration().is_finite());
    }

    #[test]
    fn test_dotted_labels_align() {
        let report = PerformanceReport::new(1.0, 1, 1, 1, 1, 1, 1);
        let lines = report.lines();
        assert!(lines[0].starts_with("Total time to solution....."));
        for line in &lines {
            assert!(line.ends_with(" sec"));
        }
        assert!(lines.iter().all(|l| l.find(|c: char| c.is_ascii_digit()) == Some(LABEL_WIDTH)));
    }

    #[test]
    fn test_emit_contains_table() {
        let report = PerformanceReport::new(1.0, 3, 7, 21, 5, 1, 3);
        let mut rec = Recorder::default();
        report.emit(&mut rec);
        assert_eq!(rec.lines[0], ("title".to_string(), "Timing Report".to_string()));
        let table: Vec<&String> = rec
            .lines
            .iter()
            .filter(|(kind, _)| kind == "result")
            .map(|(_, msg)| msg)
            .collect();
        assert!(table.iter().any(|l| l.contains("# segments")));
        assert!(table.iter().any(|l| l.contains("21") && l.contains('7')));
    }
}
