//! # Portfolio Optimizer
//!
//! $$
//! \mu^{\text{ann}} = P\,\bar r,\qquad \Sigma^{\text{ann}} = P\,\widehat{\operatorname{Cov}}(r)
//! $$
//!
//! Stateful entry point: moments are estimated once from the panel, then the Monte Carlo
//! cloud, efficient frontier, tangency portfolio and capital market line are derived from
//! them. The random generator belongs to the optimizer, so two instances with the same
//! seed produce the same cloud regardless of what else runs in the process.

use ndarray::Array1;
use ndarray::Array2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::cml;
use super::data::complete_rows;
use super::data::corr_from_cov;
use super::data::covariance_matrix;
use super::data::mean_returns;
use super::frontier;
use super::metrics::MetricInputs;
use super::metrics::batch_metrics;
use super::optimizers;
use super::sampling;
use super::types::CapitalMarketLine;
use super::types::FrontierPoint;
use super::types::MonteCarloResult;
use super::types::PortfolioCloud;
use super::types::PortfolioStats;
use super::types::ReturnMethod;
use crate::config::EngineConfig;
use crate::error::PortfolioError;
use crate::error::Result;
use crate::panel::ReturnPanel;

/// Moment estimates plus a seeded generator for one asset universe.
#[derive(Clone, Debug)]
pub struct PortfolioOptimizer {
  symbols: Vec<String>,
  /// Per-period mean return.
  mean_returns: Array1<f64>,
  /// Annualized mean return.
  mean_annual: Array1<f64>,
  /// Annualized covariance.
  cov: Array2<f64>,
  /// Dates on which every asset has a return.
  complete_returns: Array2<f64>,
  config: EngineConfig,
  rng: StdRng,
}

impl PortfolioOptimizer {
  /// Estimate moments from the panel's return column.
  ///
  /// Fails when the column is absent, an asset has no returns, or a pair of assets
  /// shares fewer than two observations.
  pub fn new(panel: &ReturnPanel, config: &EngineConfig) -> Result<Self> {
    config.validate()?;
    let returns = panel.returns()?;
    let symbols = panel.symbols().to_vec();
    if symbols.is_empty() {
      return Err(PortfolioError::EmptyPanel);
    }

    let mean_returns = mean_returns(returns);
    if let Some(i) = mean_returns.iter().position(|m| !m.is_finite()) {
      return Err(PortfolioError::InsufficientData(format!(
        "'{}' has no returns",
        symbols[i]
      )));
    }

    let periods = config.periods_per_year as f64;
    let cov = covariance_matrix(returns, periods);
    if let Some(((i, j), _)) = cov.indexed_iter().find(|(_, c)| !c.is_finite()) {
      return Err(PortfolioError::InsufficientData(format!(
        "'{}' and '{}' share fewer than two observations",
        symbols[i], symbols[j]
      )));
    }

    let complete_returns = complete_rows(returns);
    info!(
      assets = symbols.len(),
      dates = returns.nrows(),
      complete_dates = complete_returns.nrows(),
      seed = config.seed,
      "portfolio optimizer ready"
    );

    Ok(Self {
      symbols,
      mean_annual: &mean_returns * periods,
      mean_returns,
      cov,
      complete_returns,
      config: config.clone(),
      rng: StdRng::seed_from_u64(config.seed),
    })
  }

  pub fn symbols(&self) -> &[String] {
    &self.symbols
  }

  pub fn n_assets(&self) -> usize {
    self.symbols.len()
  }

  /// Per-period mean returns.
  pub fn mean_returns(&self) -> &Array1<f64> {
    &self.mean_returns
  }

  pub fn annual_mean_returns(&self) -> &Array1<f64> {
    &self.mean_annual
  }

  /// Annualized covariance matrix.
  pub fn covariance(&self) -> &Array2<f64> {
    &self.cov
  }

  /// Correlation matrix implied by the annualized covariance.
  pub fn correlation(&self) -> Array2<f64> {
    corr_from_cov(&self.cov)
  }

  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  /// Restart the random stream from `seed`.
  pub fn reseed(&mut self, seed: u64) {
    self.config.seed = seed;
    self.rng = StdRng::seed_from_u64(seed);
  }

  /// `iterations x assets` long-only weights drawn from the optimizer's stream.
  pub fn random_weights(&mut self) -> Array2<f64> {
    let m = self.n_assets();
    sampling::random_weights(&mut self.rng, self.config.iterations, m)
  }

  /// Return, volatility and Sharpe ratio for each row of `weights`.
  pub fn portfolio_metrics(
    &self,
    weights: &Array2<f64>,
    method: ReturnMethod,
  ) -> Result<PortfolioCloud> {
    if weights.ncols() != self.n_assets() {
      return Err(PortfolioError::InvalidParameter(format!(
        "weights have {} columns, expected {}",
        weights.ncols(),
        self.n_assets()
      )));
    }
    Ok(self.cloud(weights.clone(), method))
  }

  /// Sample the configured number of portfolios and pick the best Sharpe and the lowest
  /// volatility among them.
  pub fn monte_carlo(&mut self) -> MonteCarloResult {
    let weights = self.random_weights();
    let cloud = self.cloud(weights, self.config.return_method);

    let pick = |idx: Option<usize>| {
      idx
        .and_then(|i| cloud.get(i))
        .or_else(|| cloud.get(0))
        .unwrap_or_default()
    };
    let max_sharpe = pick(cloud.max_sharpe_index());
    let min_volatility = pick(cloud.min_volatility_index());

    info!(
      portfolios = cloud.len(),
      method = %self.config.return_method,
      max_sharpe = max_sharpe.sharpe,
      min_volatility = min_volatility.volatility,
      "monte carlo simulation complete"
    );

    MonteCarloResult {
      cloud,
      max_sharpe,
      min_volatility,
    }
  }

  /// Frontier over `n_points` targets spanning the cloud's return range.
  pub fn efficient_frontier(
    &self,
    cloud: &PortfolioCloud,
    n_points: usize,
  ) -> Vec<FrontierPoint> {
    match cloud.return_range() {
      Some((lo, hi)) => self.efficient_frontier_between(lo, hi, n_points),
      None => {
        warn!("portfolio cloud has no finite returns, frontier is empty");
        Vec::new()
      }
    }
  }

  /// Frontier over `n_points` evenly spaced annual targets in `[lo, hi]`.
  pub fn efficient_frontier_between(
    &self,
    lo: f64,
    hi: f64,
    n_points: usize,
  ) -> Vec<FrontierPoint> {
    let targets = frontier::target_returns(lo, hi, n_points);
    let points = frontier::efficient_frontier(&self.cov, &self.mean_annual, &targets);

    let dropped = targets.len() - points.len();
    if dropped > 0 {
      debug!(
        dropped,
        solved = points.len(),
        "frontier targets without a feasible solution"
      );
    }
    points
  }

  /// Exact long-only global minimum-variance portfolio.
  pub fn min_volatility_portfolio(&self) -> Option<PortfolioStats> {
    let weights = frontier::global_min_variance(&frontier::to_dmatrix(&self.cov))?;
    Some(optimizers::portfolio_stats(
      weights,
      &self.mean_annual.to_vec(),
      &self.cov,
      self.config.risk_free_rate,
    ))
  }

  /// Solver-refined tangency portfolio.
  pub fn max_sharpe_portfolio(&self) -> PortfolioStats {
    optimizers::max_sharpe(
      &self.mean_annual.to_vec(),
      &self.cov,
      self.config.risk_free_rate,
    )
  }

  /// Line from the risk-free rate through `tangency`, reaching past the cloud's widest
  /// volatility by the configured padding.
  pub fn capital_market_line(
    &self,
    tangency: &PortfolioStats,
    cloud: &PortfolioCloud,
  ) -> CapitalMarketLine {
    let max_volatility = cloud.max_volatility().unwrap_or(tangency.volatility);
    cml::capital_market_line(
      tangency,
      max_volatility,
      self.config.risk_free_rate,
      self.config.cml_padding,
    )
  }

  fn cloud(&self, weights: Array2<f64>, method: ReturnMethod) -> PortfolioCloud {
    let inputs = MetricInputs {
      mean_returns: &self.mean_returns,
      cov: &self.cov,
      complete_returns: &self.complete_returns,
      periods_per_year: self.config.periods_per_year as f64,
      risk_free: self.config.risk_free_rate,
    };
    let (returns, volatilities, sharpe) = batch_metrics(&weights, &inputs, method);
    PortfolioCloud {
      returns,
      volatilities,
      sharpe,
      weights,
    }
  }
}
