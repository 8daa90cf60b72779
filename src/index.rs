//! # Index Builder
//!
//! $$
//! I_t = I_{t-1}\Big(1 + \sum_i w_{i,t}\, r_{i,t}\Big),\qquad I_{t_0} = I_0
//! $$
//!
//! Composite index construction under equal, price, value and risk-parity weighting.
//! Every series starts at the first date on which all symbols are observed.

use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveDate;
use ndarray::Array2;
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::PortfolioError;
use crate::error::Result;
use crate::metrics::AnnualizedMetrics;
use crate::panel::ReturnPanel;
use crate::panel::SharesOutstanding;

pub mod equal;
pub mod price;
pub mod risk_parity;
pub mod value;

/// Weighting scheme of a composite index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexScheme {
  /// Cross-sectional mean return, compounded.
  Equal,
  /// Average of rebased prices.
  Price,
  /// Market-capitalization weights, compounded.
  Value,
  /// Inverse rolling-volatility weights, compounded.
  RiskParity,
}

impl IndexScheme {
  pub const ALL: [IndexScheme; 4] = [
    IndexScheme::Equal,
    IndexScheme::Price,
    IndexScheme::Value,
    IndexScheme::RiskParity,
  ];

  const NAMES: [&'static str; 4] = ["equal", "price", "value", "risk_parity"];

  pub fn name(self) -> &'static str {
    match self {
      IndexScheme::Equal => Self::NAMES[0],
      IndexScheme::Price => Self::NAMES[1],
      IndexScheme::Value => Self::NAMES[2],
      IndexScheme::RiskParity => Self::NAMES[3],
    }
  }

  /// Column label used by reporting collaborators.
  pub fn label(self) -> &'static str {
    match self {
      IndexScheme::Equal => "Equal_Weighted_Index",
      IndexScheme::Price => "Price_Weighted_Index",
      IndexScheme::Value => "Value_Weighted_Index",
      IndexScheme::RiskParity => "Risk_Parity_Index",
    }
  }
}

impl FromStr for IndexScheme {
  type Err = PortfolioError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_lowercase().replace('-', "_").as_str() {
      "equal" => Ok(Self::Equal),
      "price" => Ok(Self::Price),
      "value" => Ok(Self::Value),
      "risk_parity" => Ok(Self::RiskParity),
      _ => Err(PortfolioError::unknown_option(
        "index scheme",
        s,
        &Self::NAMES,
      )),
    }
  }
}

impl Display for IndexScheme {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.name())
  }
}

/// Index level on one date.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IndexPoint {
  pub date: NaiveDate,
  pub value: f64,
}

/// Date-ordered index levels for one scheme.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexSeries {
  pub scheme: IndexScheme,
  pub points: Vec<IndexPoint>,
}

impl IndexSeries {
  fn new(scheme: IndexScheme, dates: &[NaiveDate], values: Vec<f64>) -> Self {
    let points = dates
      .iter()
      .zip(values)
      .map(|(&date, value)| IndexPoint { date, value })
      .collect();
    Self { scheme, points }
  }

  pub fn len(&self) -> usize {
    self.points.len()
  }

  pub fn is_empty(&self) -> bool {
    self.points.is_empty()
  }

  pub fn values(&self) -> Vec<f64> {
    self.points.iter().map(|p| p.value).collect()
  }

  pub fn last(&self) -> Option<&IndexPoint> {
    self.points.last()
  }

  /// Simple returns between consecutive levels.
  pub fn period_returns(&self) -> Vec<f64> {
    self
      .points
      .windows(2)
      .map(|w| w[1].value / w[0].value - 1.0)
      .collect()
  }

  pub fn annualized_metrics(&self, periods_per_year: usize) -> Result<AnnualizedMetrics> {
    AnnualizedMetrics::from_returns(&self.period_returns(), periods_per_year)
  }
}

/// Per-date weights of a dynamically weighted index.
#[derive(Clone, Debug)]
pub struct WeightSchedule {
  pub dates: Vec<NaiveDate>,
  pub symbols: Vec<String>,
  /// `dates.len() x symbols.len()`; each row sums to 1 or is all zeros.
  pub weights: Array2<f64>,
}

/// Builds composite indices from a borrowed [`ReturnPanel`].
#[derive(Clone, Debug)]
pub struct IndexBuilder<'a> {
  panel: &'a ReturnPanel,
  shares: Option<&'a SharesOutstanding>,
  base_value: f64,
  window: usize,
}

impl<'a> IndexBuilder<'a> {
  pub fn new(panel: &'a ReturnPanel) -> Self {
    let cfg = EngineConfig::default();
    Self {
      panel,
      shares: None,
      base_value: cfg.base_value,
      window: cfg.risk_parity_window,
    }
  }

  pub fn from_config(panel: &'a ReturnPanel, config: &EngineConfig) -> Result<Self> {
    config.validate()?;
    Ok(Self {
      panel,
      shares: None,
      base_value: config.base_value,
      window: config.risk_parity_window,
    })
  }

  /// Attach the shares-outstanding table used by value weighting.
  pub fn with_shares(mut self, shares: &'a SharesOutstanding) -> Self {
    self.shares = Some(shares);
    self
  }

  /// Starting level; must be finite and positive, checked when an index is built.
  pub fn with_base_value(mut self, base_value: f64) -> Self {
    self.base_value = base_value;
    self
  }

  /// Rolling window of the risk-parity volatility; must be non-zero, checked when the
  /// weights are built.
  pub fn with_window(mut self, window: usize) -> Self {
    self.window = window;
    self
  }

  pub fn equal_weighted(&self) -> Result<IndexSeries> {
    self.check_base_value()?;
    let returns = self.panel.returns()?;
    let start = self.start()?;
    let values = equal::equal_weighted_levels(returns, start, self.base_value);
    Ok(self.series(IndexScheme::Equal, start, values))
  }

  pub fn price_weighted(&self) -> Result<IndexSeries> {
    self.check_base_value()?;
    let normalized = self.panel.close_normalized()?;
    let start = self.start()?;
    let values = price::price_weighted_levels(normalized, start);
    Ok(self.series(IndexScheme::Price, start, values))
  }

  pub fn value_weighted(&self) -> Result<IndexSeries> {
    self.check_base_value()?;
    let shares = self
      .shares
      .ok_or(PortfolioError::MissingSharesOutstanding)?
      .aligned(self.panel.symbols())?;
    let close = self.panel.close()?;
    let returns = self.panel.returns()?;
    let start = self.start()?;
    let values = value::value_weighted_levels(returns, close, &shares, start, self.base_value);
    Ok(self.series(IndexScheme::Value, start, values))
  }

  pub fn risk_parity(&self) -> Result<IndexSeries> {
    self.check_base_value()?;
    let schedule = self.risk_parity_weights()?;
    let returns = self.panel.returns()?;
    let start = self.start()?;
    let values =
      risk_parity::risk_parity_levels(returns, &schedule.weights, start, self.base_value);
    Ok(self.series(IndexScheme::RiskParity, start, values))
  }

  /// Inverse-volatility weights for every panel date.
  pub fn risk_parity_weights(&self) -> Result<WeightSchedule> {
    if self.window == 0 {
      return Err(PortfolioError::InvalidParameter(
        "risk-parity window must be > 0".into(),
      ));
    }
    let returns = self.panel.returns()?;
    let weights = risk_parity::inverse_volatility_weights(returns, self.window);
    Ok(WeightSchedule {
      dates: self.panel.dates().to_vec(),
      symbols: self.panel.symbols().to_vec(),
      weights,
    })
  }

  pub fn build(&self, scheme: IndexScheme) -> Result<IndexSeries> {
    debug!(%scheme, base_value = self.base_value, "building index");
    match scheme {
      IndexScheme::Equal => self.equal_weighted(),
      IndexScheme::Price => self.price_weighted(),
      IndexScheme::Value => self.value_weighted(),
      IndexScheme::RiskParity => self.risk_parity(),
    }
  }

  /// Build by scheme name (`equal`, `price`, `value`, `risk_parity`).
  pub fn build_named(&self, name: &str) -> Result<IndexSeries> {
    self.build(name.parse()?)
  }

  /// Build several schemes; fails as a whole if any one fails.
  pub fn build_all(&self, schemes: &[IndexScheme]) -> Result<Vec<IndexSeries>> {
    schemes.iter().map(|&s| self.build(s)).collect()
  }

  fn check_base_value(&self) -> Result<()> {
    if !(self.base_value.is_finite() && self.base_value > 0.0) {
      return Err(PortfolioError::InvalidParameter(format!(
        "base_value must be positive and finite, got {}",
        self.base_value
      )));
    }
    Ok(())
  }

  fn start(&self) -> Result<usize> {
    self.panel.first_common_date_index().ok_or_else(|| {
      PortfolioError::InsufficientData("no date on which every symbol is observed".into())
    })
  }

  fn series(&self, scheme: IndexScheme, start: usize, values: Vec<f64>) -> IndexSeries {
    IndexSeries::new(scheme, &self.panel.dates()[start..], values)
  }
}

/// Level path starting at `base`, then multiplied by `1 + g` for each growth value.
pub(crate) fn compound(base: f64, growth: impl Iterator<Item = f64>) -> Vec<f64> {
  let mut level = base;
  let mut out = vec![base];
  for g in growth {
    level *= 1.0 + g;
    out.push(level);
  }
  out
}
