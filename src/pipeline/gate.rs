// file: src/pipeline/gate.rs
// description: strictness policy applied to validator outcomes

use crate::validator::ValidationOutcome;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Import the record; `warnings` includes demoted errors in lenient mode.
    Accept { warnings: Vec<String> },
    Reject {
        errors: Vec<String>,
        warnings: Vec<String>,
    },
}

/// Only strict mode turns an invalid record into a rejection. Validator
/// warnings are forwarded in every case.
#[derive(Debug, Clone, Copy)]
pub struct ValidationGate {
    strict: bool,
}

impl ValidationGate {
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    pub fn decide(&self, outcome: ValidationOutcome) -> GateDecision {
        let ValidationOutcome {
            is_valid,
            errors,
            warnings,
        } = outcome;

        if is_valid {
            return GateDecision::Accept { warnings };
        }

        if self.strict {
            GateDecision::Reject { errors, warnings }
        } else {
            let mut demoted = errors;
            demoted.extend(warnings);
            GateDecision::Accept { warnings: demoted }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn invalid() -> ValidationOutcome {
        ValidationOutcome::from_findings(
            vec!["missing name".to_string()],
            vec!["no platforms found".to_string()],
        )
    }

    #[test]
    fn test_strict_rejects_invalid() {
        assert_eq!(
            ValidationGate::new(true).decide(invalid()),
            GateDecision::Reject {
                errors: vec!["missing name".to_string()],
                warnings: vec!["no platforms found".to_string()],
            }
        );
    }

    #[test]
    fn test_lenient_demotes_errors_to_warnings() {
        assert_eq!(
            ValidationGate::new(false).decide(invalid()),
            GateDecision::Accept {
                warnings: vec!["missing name".to_string(), "no platforms found".to_string()],
            }
        );
    }

    #[test]
    fn test_valid_warnings_forwarded_in_both_modes() {
        let outcome =
            ValidationOutcome::from_findings(vec![], vec!["no regulations found".to_string()]);
        for strict in [true, false] {
            assert_eq!(
                ValidationGate::new(strict).decide(outcome.clone()),
                GateDecision::Accept {
                    warnings: vec!["no regulations found".to_string()],
                }
            );
        }
    }
}
