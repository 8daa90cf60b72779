//! # portfolio-engine
//!
//! $$
//! I_t = I_{t-1}\Big(1 + \sum_i w_{i,t} r_{i,t}\Big),\qquad
//! \max_{\mathbf{w}} \frac{\mathbf{w}^\top\mu - r_f}{\sqrt{\mathbf{w}^\top\Sigma\mathbf{w}}}
//! $$
//!
//! Composite index construction and mean-variance portfolio optimization over a panel of
//! per-asset returns.
//!
//! ```ignore
//! let panel = ReturnPanel::from_rows(&rows)?;
//! let index = IndexBuilder::new(&panel).build_named("risk_parity")?;
//!
//! let mut optimizer = PortfolioOptimizer::new(&panel, &EngineConfig::default())?;
//! let mc = optimizer.monte_carlo();
//! let frontier = optimizer.efficient_frontier(&mc.cloud, 100);
//! ```

pub mod config;
pub mod error;
pub mod index;
pub mod metrics;
pub mod panel;
pub mod portfolio;

pub use config::EngineConfig;
pub use error::PortfolioError;
pub use error::Result;
pub use index::IndexBuilder;
pub use index::IndexPoint;
pub use index::IndexScheme;
pub use index::IndexSeries;
pub use index::WeightSchedule;
pub use metrics::AnnualizedMetrics;
pub use panel::Column;
pub use panel::PanelRow;
pub use panel::ReturnPanel;
pub use panel::SharesOutstanding;
pub use portfolio::CapitalMarketLine;
pub use portfolio::FrontierPoint;
pub use portfolio::MonteCarloResult;
pub use portfolio::PortfolioCloud;
pub use portfolio::PortfolioOptimizer;
pub use portfolio::PortfolioStats;
pub use portfolio::ReturnMethod;
