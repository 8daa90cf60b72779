//! # Capital Market Line
//!
//! $$
//! E[R] = r_f + S^\*\,\sigma,\qquad \sigma\in[0,\ \kappa\,\sigma_{\max}]
//! $$
//!
//! Line from the risk-free asset through the tangency portfolio, drawn out to a padded
//! multiple of the widest volatility in the sampled cloud.

use super::metrics::sharpe_ratio;
use super::types::CapitalMarketLine;
use super::types::PortfolioStats;

pub fn capital_market_line(
  tangency: &PortfolioStats,
  max_volatility: f64,
  risk_free: f64,
  padding: f64,
) -> CapitalMarketLine {
  let slope = sharpe_ratio(tangency.expected_return, tangency.volatility, risk_free);
  let x_end = max_volatility * padding;
  CapitalMarketLine {
    x: [0.0, x_end],
    y: [risk_free, risk_free + slope * x_end],
    slope,
  }
}
