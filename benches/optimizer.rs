use std::hint::black_box;
use std::time::Duration;

use chrono::Days;
use chrono::NaiveDate;
use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::criterion_group;
use criterion::criterion_main;
use portfolio_engine::EngineConfig;
use portfolio_engine::IndexBuilder;
use portfolio_engine::PanelRow;
use portfolio_engine::PortfolioOptimizer;
use portfolio_engine::ReturnMethod;
use portfolio_engine::ReturnPanel;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::Distribution;
use rand_distr::Normal;

fn panel(assets: usize, dates: u64) -> ReturnPanel {
  let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
  let mut rng = StdRng::seed_from_u64(11);
  let mut rows = Vec::new();
  for i in 0..assets {
    let noise = Normal::new(0.0002 * i as f64, 0.01).unwrap();
    for t in 0..dates {
      let date = start.checked_add_days(Days::new(t)).unwrap();
      rows.push(PanelRow::with_return(
        date,
        format!("S{i:02}"),
        Some(noise.sample(&mut rng)),
      ));
    }
  }
  ReturnPanel::from_rows(&rows).unwrap()
}

fn bench_monte_carlo(c: &mut Criterion) {
  let mut group = c.benchmark_group("Optimizer/MonteCarlo");
  group.measurement_time(Duration::from_secs(3));
  group.warm_up_time(Duration::from_millis(500));
  let panel = panel(10, 504);

  for method in [ReturnMethod::Arithmetic, ReturnMethod::Geometric] {
    let config = EngineConfig {
      return_method: method,
      ..EngineConfig::default()
    };
    group.bench_with_input(BenchmarkId::new(method.to_string(), 10_000), &config, |b, cfg| {
      let mut opt = PortfolioOptimizer::new(&panel, cfg).unwrap();
      b.iter(|| black_box(opt.monte_carlo().max_sharpe.sharpe));
    });
  }

  group.finish();
}

fn bench_frontier(c: &mut Criterion) {
  let mut group = c.benchmark_group("Optimizer/Frontier");
  group.sample_size(10);
  let panel = panel(10, 504);
  let opt = PortfolioOptimizer::new(&panel, &EngineConfig::default()).unwrap();
  let mu = opt.annual_mean_returns();
  let lo = mu.iter().copied().fold(f64::INFINITY, f64::min);
  let hi = mu.iter().copied().fold(f64::NEG_INFINITY, f64::max);

  for n in [100usize, 1_000] {
    group.bench_with_input(BenchmarkId::new("targets", n), &n, |b, &n| {
      b.iter(|| black_box(opt.efficient_frontier_between(lo, hi, n).len()));
    });
  }

  group.bench_function("max_sharpe", |b| {
    b.iter(|| black_box(opt.max_sharpe_portfolio().sharpe));
  });

  group.finish();
}

fn bench_indices(c: &mut Criterion) {
  let panel = panel(50, 2_520);
  let builder = IndexBuilder::new(&panel);
  c.bench_function("Index/risk_parity", |b| {
    b.iter(|| black_box(builder.risk_parity().unwrap().len()));
  });
  c.bench_function("Index/equal", |b| {
    b.iter(|| black_box(builder.equal_weighted().unwrap().len()));
  });
}

criterion_group!(benches, bench_monte_carlo, bench_frontier, bench_indices);
criterion_main!(benches);
