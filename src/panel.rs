//! # Return Panel
//!
//! $$
//! R \in \mathbb{R}^{T \times M},\quad
//! R_{t,i} = \text{NaN} \ \text{if asset } i \text{ has no value at } t
//! $$
//!
//! Long `(date, symbol)` rows pivoted to dense date-by-symbol matrices, plus the optional
//! shares-outstanding table used by value weighting.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::HashMap;

use chrono::NaiveDate;
use ndarray::Array2;
use tracing::debug;

use crate::error::PortfolioError;
use crate::error::Result;

/// One observation of one asset.
#[derive(Clone, Debug, PartialEq)]
pub struct PanelRow {
  pub date: NaiveDate,
  pub symbol: String,
  /// Periodic fractional return (`0.012` is 1.2%).
  pub ret: Option<f64>,
  /// Close price.
  pub close: Option<f64>,
  /// Close price rebased by the data-processing step.
  pub close_normalized: Option<f64>,
}

impl PanelRow {
  /// Row carrying only a return.
  pub fn with_return(date: NaiveDate, symbol: impl Into<String>, ret: Option<f64>) -> Self {
    Self {
      date,
      symbol: symbol.into(),
      ret,
      close: None,
      close_normalized: None,
    }
  }

  pub fn close(mut self, close: f64) -> Self {
    self.close = Some(close);
    self
  }

  pub fn close_normalized(mut self, value: f64) -> Self {
    self.close_normalized = Some(value);
    self
  }
}

/// Panel columns that operations may require.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Column {
  Return,
  Close,
  CloseNormalized,
}

impl Column {
  pub fn name(self) -> &'static str {
    match self {
      Column::Return => "return",
      Column::Close => "close",
      Column::CloseNormalized => "close_normalized",
    }
  }

  fn hint(self) -> &'static str {
    match self {
      Column::Return | Column::CloseNormalized => {
        "run the data-processing step before building indices or optimizing"
      }
      Column::Close => "close prices are needed to compute market capitalization",
    }
  }
}

/// Dense date-by-symbol view of the input rows.
#[derive(Clone, Debug)]
pub struct ReturnPanel {
  symbols: Vec<String>,
  dates: Vec<NaiveDate>,
  present: Array2<bool>,
  returns: Option<Array2<f64>>,
  close: Option<Array2<f64>>,
  close_normalized: Option<Array2<f64>>,
}

impl ReturnPanel {
  /// Pivot long rows into the dense layout.
  ///
  /// Fails on an empty input and on any symbol whose dates are not strictly increasing.
  pub fn from_rows(rows: &[PanelRow]) -> Result<Self> {
    if rows.is_empty() {
      return Err(PortfolioError::EmptyPanel);
    }

    let mut last_seen: HashMap<&str, NaiveDate> = HashMap::new();
    for row in rows {
      if let Some(prev) = last_seen.insert(row.symbol.as_str(), row.date) {
        if row.date <= prev {
          return Err(PortfolioError::InvalidPanel(format!(
            "dates for '{}' must be strictly increasing ({} follows {})",
            row.symbol, row.date, prev
          )));
        }
      }
    }

    let symbols: Vec<String> = rows
      .iter()
      .map(|r| r.symbol.clone())
      .collect::<BTreeSet<_>>()
      .into_iter()
      .collect();
    let dates: Vec<NaiveDate> = rows
      .iter()
      .map(|r| r.date)
      .collect::<BTreeSet<_>>()
      .into_iter()
      .collect();

    let symbol_idx: HashMap<&str, usize> = symbols
      .iter()
      .enumerate()
      .map(|(i, s)| (s.as_str(), i))
      .collect();
    let date_idx: BTreeMap<NaiveDate, usize> =
      dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();

    let shape = (dates.len(), symbols.len());
    let mut present = Array2::from_elem(shape, false);
    let mut returns = Array2::from_elem(shape, f64::NAN);
    let mut close = Array2::from_elem(shape, f64::NAN);
    let mut close_normalized = Array2::from_elem(shape, f64::NAN);
    let (mut has_ret, mut has_close, mut has_norm) = (false, false, false);

    for row in rows {
      let t = date_idx[&row.date];
      let i = symbol_idx[row.symbol.as_str()];
      present[[t, i]] = true;
      if let Some(r) = row.ret {
        returns[[t, i]] = r;
        has_ret = true;
      }
      if let Some(c) = row.close {
        close[[t, i]] = c;
        has_close = true;
      }
      if let Some(c) = row.close_normalized {
        close_normalized[[t, i]] = c;
        has_norm = true;
      }
    }

    debug!(
      dates = dates.len(),
      symbols = symbols.len(),
      rows = rows.len(),
      "pivoted return panel"
    );

    Ok(Self {
      symbols,
      dates,
      present,
      returns: has_ret.then_some(returns),
      close: has_close.then_some(close),
      close_normalized: has_norm.then_some(close_normalized),
    })
  }

  pub fn symbols(&self) -> &[String] {
    &self.symbols
  }

  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  pub fn n_assets(&self) -> usize {
    self.symbols.len()
  }

  pub fn has_column(&self, column: Column) -> bool {
    self.column(column).is_some()
  }

  /// Borrow a column or fail with a precondition error naming it.
  pub fn require(&self, column: Column) -> Result<&Array2<f64>> {
    self.column(column).ok_or(PortfolioError::MissingColumn {
      column: column.name(),
      hint: column.hint(),
    })
  }

  pub fn returns(&self) -> Result<&Array2<f64>> {
    self.require(Column::Return)
  }

  pub fn close(&self) -> Result<&Array2<f64>> {
    self.require(Column::Close)
  }

  pub fn close_normalized(&self) -> Result<&Array2<f64>> {
    self.require(Column::CloseNormalized)
  }

  /// First date on which every symbol has a row. Index series start here.
  pub fn first_common_date_index(&self) -> Option<usize> {
    self
      .present
      .outer_iter()
      .position(|row| row.iter().all(|&p| p))
  }

  fn column(&self, column: Column) -> Option<&Array2<f64>> {
    match column {
      Column::Return => self.returns.as_ref(),
      Column::Close => self.close.as_ref(),
      Column::CloseNormalized => self.close_normalized.as_ref(),
    }
  }
}

/// Shares outstanding per symbol.
#[derive(Clone, Debug, Default)]
pub struct SharesOutstanding {
  shares: HashMap<String, f64>,
}

impl SharesOutstanding {
  pub fn new() -> Self {
    Self::default()
  }

  /// Bulk construction; every count goes through [`SharesOutstanding::insert`].
  pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
  where
    I: IntoIterator<Item = (S, f64)>,
    S: Into<String>,
  {
    let mut shares = Self::new();
    for (symbol, count) in pairs {
      shares.insert(symbol, count)?;
    }
    Ok(shares)
  }

  /// Insert or replace the share count of `symbol`.
  pub fn insert(&mut self, symbol: impl Into<String>, shares: f64) -> Result<()> {
    let symbol = symbol.into();
    if !(shares.is_finite() && shares > 0.0) {
      return Err(PortfolioError::InvalidParameter(format!(
        "shares outstanding for '{symbol}' must be positive, got {shares}"
      )));
    }
    self.shares.insert(symbol, shares);
    Ok(())
  }

  pub fn get(&self, symbol: &str) -> Option<f64> {
    self.shares.get(symbol).copied()
  }

  pub fn len(&self) -> usize {
    self.shares.len()
  }

  pub fn is_empty(&self) -> bool {
    self.shares.is_empty()
  }

  /// Share counts aligned to `symbols`, or the list of symbols with no entry.
  pub(crate) fn aligned(&self, symbols: &[String]) -> Result<Vec<f64>> {
    let missing: Vec<String> = symbols
      .iter()
      .filter(|s| !self.shares.contains_key(s.as_str()))
      .cloned()
      .collect();
    if !missing.is_empty() {
      return Err(PortfolioError::MissingShares { symbols: missing });
    }
    Ok(symbols.iter().map(|s| self.shares[s.as_str()]).collect())
  }
}

impl TryFrom<Vec<(String, f64)>> for SharesOutstanding {
  type Error = PortfolioError;

  fn try_from(pairs: Vec<(String, f64)>) -> Result<Self> {
    Self::from_pairs(pairs)
  }
}

#[cfg(test)]
pub(crate) mod fixtures {
  use chrono::Days;
  use chrono::NaiveDate;

  use super::PanelRow;

  pub fn day(offset: u64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1)
      .and_then(|d| d.checked_add_days(Days::new(offset)))
      .unwrap()
  }

  /// Dense rows from per-symbol return columns; `None` leaves the cell empty.
  pub fn rows_from_returns(series: &[(&str, Vec<Option<f64>>)]) -> Vec<PanelRow> {
    let mut rows = Vec::new();
    for (symbol, values) in series {
      for (t, r) in values.iter().enumerate() {
        rows.push(PanelRow::with_return(day(t as u64), *symbol, *r));
      }
    }
    rows
  }
}
