// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Error
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FusionError {
    #[error("Solver diverged at iteration {iteration}: {message}")]
    SolverDiverged { iteration: usize, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(
        "No track segments were tallied inside flat source region {region}; \
         reduce the track spacing, increase the number of azimuthal angles, \
         or increase the size of the region"
    )]
    UncoveredRegion { region: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FusionError {
    /// True for violated preconditions the caller has to fix before retrying.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            FusionError::ConfigError(_) | FusionError::UncoveredRegion { .. }
        )
    }
}

pub type FusionResult<T> = Result<T, FusionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncovered_region_message_names_region() {
        let err = FusionError::UncoveredRegion { region: 17 };
        let msg = err.to_string();
        assert!(msg.contains("region 17"), "unexpected message: {msg}");
        assert!(err.is_configuration());
    }

    #[test]
    fn test_diverged_is_not_configuration() {
        let err = FusionError::SolverDiverged {
            iteration: 3,
            message: "NaN".to_string(),
        };
        assert!(!err.is_configuration());
        assert!(err.to_string().contains("iteration 3"));
    }
}
