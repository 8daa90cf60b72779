//! # Errors
//!
//! $$
//! \text{call}:\ \text{inputs}\to\text{output}\ \lor\ \text{PortfolioError}
//! $$
//!
//! Precondition and unknown-option failures are all-or-nothing. Numerical degeneracy
//! (zero volatility, non-convergent frontier points) is handled locally and never
//! surfaces here.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PortfolioError>;

/// Failures raised by the index builder and the portfolio optimizer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PortfolioError {
  /// A column required by the operation is absent from the panel.
  #[error("input data must contain a '{column}' column: {hint}")]
  MissingColumn {
    column: &'static str,
    hint: &'static str,
  },

  /// Value weighting was requested without a shares-outstanding table.
  #[error("value-weighted index requires a shares-outstanding table")]
  MissingSharesOutstanding,

  /// The shares-outstanding table does not cover every symbol in the panel.
  #[error("shares outstanding missing for symbols: {}", .symbols.join(", "))]
  MissingShares { symbols: Vec<String> },

  /// An unrecognized option name was supplied.
  #[error("unknown {kind} '{value}', valid options: {}", .valid.join(", "))]
  UnknownOption {
    kind: &'static str,
    value: String,
    valid: Vec<&'static str>,
  },

  /// No rows were supplied.
  #[error("return panel is empty")]
  EmptyPanel,

  /// Panel rows violate an ordering or uniqueness invariant.
  #[error("invalid return panel: {0}")]
  InvalidPanel(String),

  /// Not enough observations to estimate a required quantity.
  #[error("insufficient data: {0}")]
  InsufficientData(String),

  /// An argument or configuration value is out of range.
  #[error("invalid parameter: {0}")]
  InvalidParameter(String),
}

impl PortfolioError {
  pub(crate) fn unknown_option(
    kind: &'static str,
    value: impl Into<String>,
    valid: &[&'static str],
  ) -> Self {
    Self::UnknownOption {
      kind,
      value: value.into(),
      valid: valid.to_vec(),
    }
  }

  /// Whether this error is a missing-input precondition failure.
  pub fn is_precondition(&self) -> bool {
    matches!(
      self,
      Self::MissingColumn { .. } | Self::MissingSharesOutstanding | Self::MissingShares { .. }
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unknown_option_message_lists_choices() {
    let err = PortfolioError::unknown_option("index scheme", "momentum", &["equal", "price"]);
    assert_eq!(
      err.to_string(),
      "unknown index scheme 'momentum', valid options: equal, price"
    );
    assert!(!err.is_precondition());
  }

  #[test]
  fn missing_shares_is_precondition() {
    let err = PortfolioError::MissingShares {
      symbols: vec!["AAA".into(), "BBB".into()],
    };
    assert!(err.is_precondition());
    assert!(err.to_string().ends_with("AAA, BBB"));
  }
}
