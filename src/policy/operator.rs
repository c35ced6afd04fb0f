//! Policy operators
//!
//! Pure predicate evaluation of a single extracted value against a policy
//! operand. Operator wire names match the policy API (`equal`, `notEqual`,
//! `startsWith`, ...). Regex operands are compiled and rejected at policy
//! creation time, so evaluation never fails on a bad pattern.

use crate::error::{Error, Result};
use crate::policy::path::coerce_to_string;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison operator for invocation and trusted-data policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "equal")]
    Equal,
    #[serde(rename = "notEqual")]
    NotEqual,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "notContains")]
    NotContains,
    #[serde(rename = "startsWith")]
    StartsWith,
    #[serde(rename = "endsWith")]
    EndsWith,
    #[serde(rename = "regex")]
    Regex,
}

impl Operator {
    /// Validate the policy operand for this operator.
    ///
    /// Only `regex` carries operand constraints; an invalid pattern is a
    /// configuration error surfaced at policy-creation time.
    pub fn validate_operand(&self, operand: &str) -> Result<()> {
        if let Operator::Regex = self {
            Regex::new(operand)
                .map_err(|e| Error::Configuration(format!("invalid regex '{}': {}", operand, e)))?;
        }
        Ok(())
    }

    /// Evaluate this operator against an extracted value.
    ///
    /// Comparison happens on the string coercion of the value so behavior
    /// is independent of the value's encoded type. Operands reaching this
    /// point have passed [`Operator::validate_operand`]; a regex that
    /// nevertheless fails to compile evaluates to a non-match.
    pub fn matches(&self, actual: &Value, operand: &str) -> bool {
        let actual = coerce_to_string(actual);
        match self {
            Operator::Equal => actual == operand,
            Operator::NotEqual => actual != operand,
            Operator::Contains => actual.contains(operand),
            Operator::NotContains => !actual.contains(operand),
            Operator::StartsWith => actual.starts_with(operand),
            Operator::EndsWith => actual.ends_with(operand),
            Operator::Regex => Regex::new(operand)
                .map(|re| re.is_match(&actual))
                .unwrap_or(false),
        }
    }
}
