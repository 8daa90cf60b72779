//! # Portfolio
//!
//! $$
//! \sigma_p^2 = \mathbf{w}^\top \Sigma \mathbf{w}
//! $$
//!
//! Monte Carlo portfolio sampling, the long-only efficient frontier, the tangency
//! portfolio and the capital market line.

pub mod cml;
pub mod data;
pub mod engine;
pub mod frontier;
pub mod metrics;
pub mod optimizers;
pub mod sampling;
pub mod types;

pub use cml::capital_market_line;
pub use data::corr_from_cov;
pub use data::covariance_matrix;
pub use data::mean_returns;
pub use engine::PortfolioOptimizer;
pub use frontier::efficient_frontier;
pub use frontier::global_min_variance;
pub use frontier::min_variance_for_target;
pub use metrics::batch_metrics;
pub use metrics::sharpe_ratio;
pub use optimizers::max_sharpe;
pub use sampling::random_weights;
pub use types::CapitalMarketLine;
pub use types::FrontierPoint;
pub use types::MonteCarloResult;
pub use types::PortfolioCloud;
pub use types::PortfolioStats;
pub use types::ReturnMethod;
