//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into services. Request
//! handlers never read process-wide environment variables.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::DEFAULT_FHIR_TIMEOUT_SECS;
use crate::{MeldError, MeldResult};

/// What to do when a MELD input could not be fetched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissingLabPolicy {
    /// Report every missing input and do not calculate a score.
    #[default]
    Block,
    /// Feed missing labs to the validator as `0.0` and missing demographics as empty text, so
    /// the range checks decide.
    ZeroFill,
}

impl FromStr for MissingLabPolicy {
    type Err = MeldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "block" => Ok(MissingLabPolicy::Block),
            "zero-fill" | "zero_fill" | "zerofill" => Ok(MissingLabPolicy::ZeroFill),
            other => Err(MeldError::InvalidInput(format!(
                "unknown missing lab policy '{other}' (expected 'block' or 'zero-fill')"
            ))),
        }
    }
}

impl fmt::Display for MissingLabPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingLabPolicy::Block => f.write_str("block"),
            MissingLabPolicy::ZeroFill => f.write_str("zero-fill"),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    fhir_timeout: Duration,
    missing_lab_policy: MissingLabPolicy,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(fhir_timeout: Duration, missing_lab_policy: MissingLabPolicy) -> MeldResult<Self> {
        if fhir_timeout.is_zero() {
            return Err(MeldError::InvalidInput(
                "FHIR timeout must be greater than zero".into(),
            ));
        }

        Ok(Self {
            fhir_timeout,
            missing_lab_policy,
        })
    }

    pub fn fhir_timeout(&self) -> Duration {
        self.fhir_timeout
    }

    pub fn missing_lab_policy(&self) -> MissingLabPolicy {
        self.missing_lab_policy
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the FHIR request timeout (whole seconds) from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default timeout.
pub fn fhir_timeout_from_env_value(value: Option<String>) -> MeldResult<Duration> {
    let Some(value) = non_blank(value) else {
        return Ok(Duration::from_secs(DEFAULT_FHIR_TIMEOUT_SECS));
    };

    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(MeldError::InvalidInput(format!(
            "FHIR timeout must be a positive number of seconds, got '{value}'"
        ))),
    }
}

/// Parse the missing lab policy from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`MissingLabPolicy::Block`].
pub fn missing_lab_policy_from_env_value(value: Option<String>) -> MeldResult<MissingLabPolicy> {
    non_blank(value)
        .map(|v| v.parse())
        .transpose()
        .map(Option::unwrap_or_default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_defaults_when_unset_or_blank() {
        let default = Duration::from_secs(DEFAULT_FHIR_TIMEOUT_SECS);
        assert_eq!(fhir_timeout_from_env_value(None).unwrap(), default);
        assert_eq!(fhir_timeout_from_env_value(Some("  ".into())).unwrap(), default);
    }

    #[test]
    fn timeout_parses_seconds() {
        assert_eq!(
            fhir_timeout_from_env_value(Some(" 25 ".into())).unwrap(),
            Duration::from_secs(25)
        );
    }

    #[test]
    fn timeout_rejects_zero_and_garbage() {
        for bad in ["0", "-3", "ten", "1.5"] {
            assert!(
                fhir_timeout_from_env_value(Some(bad.into())).is_err(),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn policy_parses_known_values() {
        assert_eq!(
            missing_lab_policy_from_env_value(None).unwrap(),
            MissingLabPolicy::Block
        );
        assert_eq!(
            missing_lab_policy_from_env_value(Some("Zero-Fill".into())).unwrap(),
            MissingLabPolicy::ZeroFill
        );
        assert_eq!(
            missing_lab_policy_from_env_value(Some("block".into())).unwrap(),
            MissingLabPolicy::Block
        );
        assert!(missing_lab_policy_from_env_value(Some("ignore".into())).is_err());
    }

    #[test]
    fn config_rejects_zero_timeout() {
        assert!(CoreConfig::new(Duration::ZERO, MissingLabPolicy::Block).is_err());
        let cfg = CoreConfig::new(Duration::from_secs(3), MissingLabPolicy::ZeroFill).unwrap();
        assert_eq!(cfg.fhir_timeout(), Duration::from_secs(3));
        assert_eq!(cfg.missing_lab_policy(), MissingLabPolicy::ZeroFill);
    }
}
