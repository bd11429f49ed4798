mod expr;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Named parameters a formula spec may override. Absent values fall back to
/// the standing defaults (`a=2`, `b=1`, `c=3`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FormulaParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c: Option<f64>,
}

impl FormulaParameters {
    pub const DEFAULT_A: f64 = 2.0;
    pub const DEFAULT_B: f64 = 1.0;
    pub const DEFAULT_C: f64 = 3.0;

    fn bind(&self, variables: &mut BTreeMap<String, f64>) {
        variables.insert("a".to_string(), self.a.unwrap_or(Self::DEFAULT_A));
        variables.insert("b".to_string(), self.b.unwrap_or(Self::DEFAULT_B));
        variables.insert("c".to_string(), self.c.unwrap_or(Self::DEFAULT_C));
    }
}

/// One conditional override: when `when` evaluates true, `then` supplies the
/// final score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalFormula {
    pub when: String,
    pub then: String,
}

/// Stored scoring rule for one criterion: the main formula plus an ordered
/// list of conditional overrides. Pure configuration, immutable during a
/// scoring run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaSpec {
    pub main: String,
    #[serde(default)]
    pub parameters: FormulaParameters,
    #[serde(default)]
    pub conditions: Vec<ConditionalFormula>,
}

/// Counted inputs feeding the quantitative formulas, exposed to formula text
/// as the variables `N1`, `N2`, `N3`, and `NDTPS`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountedInputs {
    pub n1: f64,
    pub n2: f64,
    pub n3: f64,
    pub ndtps: f64,
}

impl CountedInputs {
    fn bind(&self, variables: &mut BTreeMap<String, f64>) {
        variables.insert("N1".to_string(), self.n1);
        variables.insert("N2".to_string(), self.n2);
        variables.insert("N3".to_string(), self.n3);
        variables.insert("NDTPS".to_string(), self.ndtps);
    }
}

/// Evaluates stored formula specs against counted inputs.
///
/// The main formula's right-hand side produces the raw score `RK`; the
/// conditions are then walked in listed order and the first one that holds
/// supplies the final score. With no matching condition the score is
/// `min(RK, 4)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreFormulaEngine;

impl ScoreFormulaEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(
        &self,
        spec: &FormulaSpec,
        inputs: &CountedInputs,
    ) -> Result<f64, FormulaError> {
        let mut variables = BTreeMap::new();
        spec.parameters.bind(&mut variables);
        inputs.bind(&mut variables);

        let rk = expr::evaluate(main_rhs(&spec.main), &variables)?;
        variables.insert("RK".to_string(), rk);

        for condition in &spec.conditions {
            if expr::evaluate_truth(&condition.when, &variables)? {
                return expr::evaluate(&condition.then, &variables);
            }
        }

        Ok(rk.min(4.0))
    }
}

/// Strip an optional `RK =` style assignment head so stored formulas may be
/// written either as a bare expression or as `NAME = expression`.
fn main_rhs(main: &str) -> &str {
    let bytes = main.as_bytes();
    for (idx, &b) in bytes.iter().enumerate() {
        if b != b'=' {
            continue;
        }
        // Skip comparison operators: ==, <=, >=, !=.
        if bytes.get(idx + 1) == Some(&b'=') {
            break;
        }
        if idx > 0 && matches!(bytes[idx - 1], b'<' | b'>' | b'!' | b'=') {
            break;
        }
        let head = main[..idx].trim();
        let is_identifier = !head.is_empty()
            && head
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !head.starts_with(|c: char| c.is_ascii_digit());
        if is_identifier {
            return &main[idx + 1..];
        }
        break;
    }
    main
}

/// Error raised when a stored formula cannot be evaluated. Always carries
/// the offending expression; callers must surface it, never coerce to zero.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormulaError {
    #[error("formula '{expression}' failed to parse: {reason}")]
    Parse { expression: String, reason: String },
    #[error("formula '{expression}' references unknown variable '{name}'")]
    UnknownVariable { expression: String, name: String },
    #[error("formula '{expression}' divides by zero")]
    DivideByZero { expression: String },
    #[error("formula '{expression}' produced a non-finite value")]
    NonFinite { expression: String },
}
