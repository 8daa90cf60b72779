use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use chrono::Days;
use chrono::NaiveDate;
use portfolio_engine::EngineConfig;
use portfolio_engine::IndexBuilder;
use portfolio_engine::IndexScheme;
use portfolio_engine::PanelRow;
use portfolio_engine::PortfolioOptimizer;
use portfolio_engine::PortfolioStats;
use portfolio_engine::ReturnPanel;
use portfolio_engine::SharesOutstanding;
use prettytable::Cell;
use prettytable::Table;
use prettytable::row;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::Distribution;
use rand_distr::Normal;
use tracing::info;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const USAGE: &str = "usage: portfolio-engine [--seed N] [--iterations N] \
                     [--method arithmetic|geometric] (--demo | <returns.csv> [shares.csv])";

/// Input source and overrides taken from the command line.
struct Args {
  returns: Option<String>,
  shares: Option<String>,
  config: EngineConfig,
}

fn parse_args() -> Result<Args> {
  let mut config = EngineConfig::default();
  let mut positional = Vec::new();
  let mut demo = false;
  let mut args = std::env::args().skip(1);

  while let Some(arg) = args.next() {
    match arg.as_str() {
      "--demo" => demo = true,
      "--seed" => config.seed = next_value(&mut args, "--seed")?.parse()?,
      "--iterations" => config.iterations = next_value(&mut args, "--iterations")?.parse()?,
      "--method" => config.return_method = next_value(&mut args, "--method")?.parse()?,
      "-h" | "--help" => {
        println!("{USAGE}");
        std::process::exit(0);
      }
      _ if arg.starts_with("--") => bail!("unknown flag '{arg}'\n{USAGE}"),
      _ => positional.push(arg),
    }
  }

  if demo != positional.is_empty() {
    bail!("{USAGE}");
  }
  let mut positional = positional.into_iter();
  Ok(Args {
    returns: positional.next(),
    shares: positional.next(),
    config,
  })
}

fn next_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
  args.next().with_context(|| format!("{flag} needs a value"))
}

fn main() -> Result<()> {
  tracing_subscriber::registry()
    .with(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| "portfolio_engine=info".into()),
    )
    .with(tracing_subscriber::fmt::layer().with_target(false))
    .init();

  let args = parse_args()?;
  args.config.validate()?;

  let (rows, shares) = match &args.returns {
    Some(path) => {
      let rows = read_panel_rows(Path::new(path))?;
      let shares = args
        .shares
        .as_deref()
        .map(|p| read_shares(Path::new(p)))
        .transpose()?;
      (rows, shares)
    }
    None => demo_panel(args.config.seed)?,
  };
  info!(rows = rows.len(), "loaded panel rows");

  let panel = ReturnPanel::from_rows(&rows)?;
  print_indices(&panel, shares.as_ref(), &args.config)?;
  print_optimizer(&panel, &args.config)?;

  Ok(())
}

fn print_indices(
  panel: &ReturnPanel,
  shares: Option<&SharesOutstanding>,
  config: &EngineConfig,
) -> Result<()> {
  let mut builder = IndexBuilder::from_config(panel, config)?;
  if let Some(shares) = shares {
    builder = builder.with_shares(shares);
  }

  let mut table = Table::new();
  table.set_titles(row!["Index", "Start", "Final level", "Ann. return", "Ann. vol"]);
  for scheme in IndexScheme::ALL {
    let series = match builder.build(scheme) {
      Ok(series) => series,
      Err(err) if err.is_precondition() => {
        warn!(%scheme, %err, "skipping index");
        continue;
      }
      Err(err) => return Err(err.into()),
    };
    let (Some(first), Some(last)) = (series.points.first(), series.last()) else {
      continue;
    };
    let (ret, vol) = match series.annualized_metrics(config.periods_per_year) {
      Ok(m) => (pct(m.annualized_return), pct(m.annualized_volatility)),
      Err(_) => ("-".to_string(), "-".to_string()),
    };
    table.add_row(row![
      scheme.label(),
      first.date,
      format!("{:.4}", last.value),
      ret,
      vol
    ]);
  }
  table.printstd();
  Ok(())
}

fn print_optimizer(panel: &ReturnPanel, config: &EngineConfig) -> Result<()> {
  let mut optimizer = PortfolioOptimizer::new(panel, config)?;
  let mc = optimizer.monte_carlo();
  let tangency = optimizer.max_sharpe_portfolio();
  let gmv = optimizer.min_volatility_portfolio();
  let frontier = optimizer.efficient_frontier(&mc.cloud, config.frontier_points);
  let cml = optimizer.capital_market_line(&tangency, &mc.cloud);

  let mut table = Table::new();
  let mut titles = row!["Portfolio", "Return", "Volatility", "Sharpe"];
  for symbol in optimizer.symbols() {
    titles.add_cell(Cell::new(symbol));
  }
  table.set_titles(titles);
  let mut add = |name: &str, stats: &PortfolioStats| {
    let mut r = row![
      name,
      pct(stats.expected_return),
      pct(stats.volatility),
      format!("{:.3}", stats.sharpe)
    ];
    for w in &stats.weights {
      r.add_cell(Cell::new(&pct(*w)));
    }
    table.add_row(r);
  };
  add("Max Sharpe (sampled)", &mc.max_sharpe);
  add("Min volatility (sampled)", &mc.min_volatility);
  add("Tangency (optimized)", &tangency);
  if let Some(gmv) = &gmv {
    add("Global min variance", gmv);
  }
  table.printstd();

  let corr = optimizer.correlation();
  let mut corr_table = Table::new();
  let mut titles = row!["Correlation"];
  for symbol in optimizer.symbols() {
    titles.add_cell(Cell::new(symbol));
  }
  corr_table.set_titles(titles);
  for (symbol, values) in optimizer.symbols().iter().zip(corr.outer_iter()) {
    let mut r = row![symbol];
    for c in values {
      r.add_cell(Cell::new(&format!("{c:.3}")));
    }
    corr_table.add_row(r);
  }
  corr_table.printstd();

  println!(
    "Efficient frontier: {} of {} targets solved",
    frontier.len(),
    config.frontier_points
  );
  if let (Some(lo), Some(hi)) = (frontier.first(), frontier.last()) {
    println!(
      "  from {} at {} vol to {} at {} vol",
      pct(lo.target_return),
      pct(lo.volatility),
      pct(hi.target_return),
      pct(hi.volatility)
    );
  }
  println!(
    "Capital market line: ({:.4}, {:.4}) -> ({:.4}, {:.4}), slope {:.3}",
    cml.x[0], cml.y[0], cml.x[1], cml.y[1], cml.slope
  );
  Ok(())
}

fn pct(x: f64) -> String {
  format!("{:.2}%", x * 100.0)
}

fn optional_f64(field: Option<&str>) -> Result<Option<f64>> {
  match field.map(str::trim) {
    None | Some("") => Ok(None),
    Some(s) => Ok(Some(s.parse()?)),
  }
}

/// Rows of a `date,symbol,return[,close][,close_normalized]` file; empty cells are
/// missing values.
fn read_panel_rows(path: &Path) -> Result<Vec<PanelRow>> {
  let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
  let mut lines = BufReader::new(file).lines();

  let header = lines.next().context("returns file is empty")??;
  let columns: Vec<String> = header.split(',').map(|c| c.trim().to_lowercase()).collect();
  let position = |name: &str| columns.iter().position(|c| c == name);
  let (Some(date_col), Some(symbol_col)) = (position("date"), position("symbol")) else {
    bail!("{} needs 'date' and 'symbol' columns", path.display());
  };
  let ret_col = position("return");
  let close_col = position("close");
  let norm_col = position("close_normalized");

  let mut rows = Vec::new();
  for (n, line) in lines.enumerate() {
    let line = line?;
    if line.trim().is_empty() {
      continue;
    }
    let fields: Vec<&str> = line.split(',').collect();
    let field = |col: Option<usize>| col.and_then(|c| fields.get(c).copied());
    let line_no = n + 2;

    let date = field(Some(date_col))
      .map(str::trim)
      .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
      .with_context(|| format!("bad date on line {line_no}"))?;
    let symbol = field(Some(symbol_col))
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .with_context(|| format!("missing symbol on line {line_no}"))?;
    let ret = optional_f64(field(ret_col)).with_context(|| format!("line {line_no}"))?;

    let mut row = PanelRow::with_return(date, symbol, ret);
    if let Some(c) = optional_f64(field(close_col)).with_context(|| format!("line {line_no}"))? {
      row = row.close(c);
    }
    if let Some(c) = optional_f64(field(norm_col)).with_context(|| format!("line {line_no}"))? {
      row = row.close_normalized(c);
    }
    rows.push(row);
  }

  Ok(rows)
}

/// `symbol,shares` pairs, header optional.
fn read_shares(path: &Path) -> Result<SharesOutstanding> {
  let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
  let mut shares = SharesOutstanding::new();

  for (n, line) in BufReader::new(file).lines().enumerate() {
    let line = line?;
    let Some((symbol, value)) = line.split_once(',') else {
      continue;
    };
    let Ok(value) = value.trim().parse::<f64>() else {
      if n == 0 {
        continue;
      }
      bail!("bad share count on line {}", n + 1);
    };
    shares.insert(symbol.trim(), value)?;
  }

  Ok(shares)
}

/// Two years of seeded daily data for three assets with distinct drift and risk.
fn demo_panel(seed: u64) -> Result<(Vec<PanelRow>, Option<SharesOutstanding>)> {
  let start = NaiveDate::from_ymd_opt(2023, 1, 2).context("demo start date")?;
  let assets = [
    ("AAA", 0.0006, 0.012, 2.5e9),
    ("BBB", 0.0003, 0.008, 6.0e9),
    ("CCC", -0.0001, 0.015, 1.2e9),
  ];

  let mut rng = StdRng::seed_from_u64(seed);
  let mut rows = Vec::new();
  let mut shares = SharesOutstanding::new();

  for (symbol, drift, vol, count) in assets {
    let noise = Normal::new(drift, vol)?;
    let mut close = 100.0;
    for t in 0..504u64 {
      let date = start
        .checked_add_days(Days::new(t))
        .context("demo date overflow")?;
      let ret = if t == 0 {
        None
      } else {
        let r = noise.sample(&mut rng);
        close *= 1.0 + r;
        Some(r)
      };
      rows.push(
        PanelRow::with_return(date, symbol, ret)
          .close(close)
          .close_normalized(close / 100.0),
      );
    }
    shares.insert(symbol, count)?;
  }

  Ok((rows, Some(shares)))
}
