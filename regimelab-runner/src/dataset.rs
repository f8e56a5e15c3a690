//! Local CSV dataset adapter.
//!
//! Four inputs, all read with `csv` + `serde`:
//! 1. Macro series: a `date` column, any indicator columns by their camelCase
//!    key (`realRate`, `debtStress`, ...), and optional market proxy columns
//!    `equity_index`, `gold_price`, `bond_yield`. Empty cells are missing
//!    values; unknown columns are ignored.
//! 2. Fund map: `fund,asset_class[,expected_return]`.
//! 3. Fund returns (optional): long format `date,fund,return`, one row per
//!    fund per trading day.
//! 4. Benchmark (optional): `date,return`, one row per macro date.
//!
//! The dataset hash is BLAKE3 over the raw bytes of every file read, in a
//! fixed order.

use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use regimelab_core::allocation::ExpectedReturns;
use regimelab_core::domain::{AssetClass, FundId, FundMap, Indicator, IndicatorSnapshot};
use regimelab_core::engine::{FundReturns, MacroPoint, MarketProxies};

use crate::benchmark::BenchmarkReturns;
use crate::config::DataSection;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("macro file has no 'date' column")]
    MissingDateColumn,
    #[error("line {line}: invalid date '{value}'")]
    InvalidDate { line: u64, value: String },
    #[error("line {line}: invalid number '{value}' in column '{column}'")]
    InvalidNumber { line: u64, column: String, value: String },
    #[error("line {line}: duplicate macro date {date}")]
    DuplicateDate { line: u64, date: NaiveDate },
    #[error("fund '{fund}': unknown asset class '{value}'")]
    UnknownAssetClass { fund: FundId, value: String },
    #[error("{0} contains no rows")]
    Empty(&'static str),
}

/// Everything a backtest needs, loaded and validated.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Macro points in strictly increasing date order.
    pub points: Vec<MacroPoint>,
    pub fund_map: FundMap,
    pub fund_returns: FundReturns,
    /// Present when the fund map carries an `expected_return` column.
    pub expected_returns: Option<ExpectedReturns>,
    pub benchmark: Option<BenchmarkReturns>,
    pub dataset_hash: String,
}

impl Dataset {
    /// Load every file named in the `[data]` table.
    pub fn load(data: &DataSection) -> Result<Self, LoadError> {
        let mut hasher = blake3::Hasher::new();

        let macro_bytes = read_bytes(&data.macro_path)?;
        hasher.update(&macro_bytes);
        let points = read_macro(macro_bytes.as_slice())?;

        let map_bytes = read_bytes(&data.fund_map_path)?;
        hasher.update(&map_bytes);
        let (fund_map, expected_returns) = read_fund_map(map_bytes.as_slice())?;

        let fund_returns = match &data.fund_returns_path {
            Some(path) => {
                let bytes = read_bytes(path)?;
                hasher.update(&bytes);
                read_fund_returns(bytes.as_slice())?
            }
            None => FundReturns::new(),
        };

        let benchmark = match &data.benchmark_path {
            Some(path) => {
                let bytes = read_bytes(path)?;
                hasher.update(&bytes);
                Some(read_benchmark(bytes.as_slice())?)
            }
            None => None,
        };

        let dataset = Self {
            points,
            fund_map,
            fund_returns,
            expected_returns,
            benchmark,
            dataset_hash: hasher.finalize().to_hex().to_string(),
        };
        info!(
            points = dataset.points.len(),
            funds = dataset.fund_map.len(),
            funds_with_returns = dataset.fund_returns.len(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    /// Macro points whose date lies in `[start, end]`.
    pub fn points_between(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> &[MacroPoint] {
        let lo = match start {
            Some(s) => self.points.partition_point(|p| p.date < s),
            None => 0,
        };
        let hi = match end {
            Some(e) => self.points.partition_point(|p| p.date <= e),
            None => self.points.len(),
        };
        if lo >= hi {
            return &[];
        }
        &self.points[lo..hi]
    }
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, LoadError> {
    std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ─── Macro series ───────────────────────────────────────────────────

enum MacroColumn {
    Date,
    Indicator(Indicator),
    EquityIndex,
    GoldPrice,
    BondYield,
    Ignored,
}

impl MacroColumn {
    fn from_header(h: &str) -> Self {
        match h.trim() {
            "date" => MacroColumn::Date,
            "equity_index" => MacroColumn::EquityIndex,
            "gold_price" => MacroColumn::GoldPrice,
            "bond_yield" => MacroColumn::BondYield,
            other => Indicator::from_key(other).map_or(MacroColumn::Ignored, MacroColumn::Indicator),
        }
    }
}

/// Parse a macro CSV. Rows are sorted by date; duplicate dates are an error.
pub fn read_macro<R: std::io::Read>(reader: R) -> Result<Vec<MacroPoint>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let columns: Vec<MacroColumn> = headers.iter().map(MacroColumn::from_header).collect();
    if !columns.iter().any(|c| matches!(c, MacroColumn::Date)) {
        return Err(LoadError::MissingDateColumn);
    }

    let mut rows: Vec<(u64, MacroPoint)> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line());

        let mut date = None;
        let mut indicators = IndicatorSnapshot::new();
        let mut market = MarketProxies::default();
        for ((column, header), cell) in columns.iter().zip(headers.iter()).zip(record.iter()) {
            if cell.is_empty() {
                continue;
            }
            match column {
                MacroColumn::Date => date = Some(parse_date(cell, line)?),
                MacroColumn::Indicator(i) => indicators = indicators.with(*i, parse_number(cell, header, line)?),
                MacroColumn::EquityIndex => market.equity_index = Some(parse_number(cell, header, line)?),
                MacroColumn::GoldPrice => market.gold_price = Some(parse_number(cell, header, line)?),
                MacroColumn::BondYield => market.bond_yield = Some(parse_number(cell, header, line)?),
                MacroColumn::Ignored => {}
            }
        }
        let date = date.ok_or_else(|| LoadError::InvalidDate {
            line,
            value: String::new(),
        })?;
        rows.push((line, MacroPoint::new(date, indicators).with_market(market)));
    }

    if rows.is_empty() {
        return Err(LoadError::Empty("macro series"));
    }
    rows.sort_by_key(|(_, p)| p.date);
    for pair in rows.windows(2) {
        if pair[0].1.date == pair[1].1.date {
            return Err(LoadError::DuplicateDate {
                line: pair[1].0.max(pair[0].0),
                date: pair[1].1.date,
            });
        }
    }
    debug!(rows = rows.len(), "macro series parsed");
    Ok(rows.into_iter().map(|(_, p)| p).collect())
}

fn parse_date(cell: &str, line: u64) -> Result<NaiveDate, LoadError> {
    NaiveDate::parse_from_str(cell, "%Y-%m-%d").map_err(|_| LoadError::InvalidDate {
        line,
        value: cell.to_string(),
    })
}

fn parse_number(cell: &str, column: &str, line: u64) -> Result<f64, LoadError> {
    cell.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| LoadError::InvalidNumber {
            line,
            column: column.to_string(),
            value: cell.to_string(),
        })
}

// ─── Fund map ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct FundMapRow {
    fund: FundId,
    asset_class: String,
    #[serde(default)]
    expected_return: Option<f64>,
}

/// Parse a fund map. Expected returns are returned only when at least one
/// row carries one.
pub fn read_fund_map<R: std::io::Read>(reader: R) -> Result<(FundMap, Option<ExpectedReturns>), LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut fund_map = FundMap::new();
    let mut expected = ExpectedReturns::new();

    for row in rdr.deserialize::<FundMapRow>() {
        let row = row?;
        let class = AssetClass::parse(&row.asset_class).ok_or_else(|| LoadError::UnknownAssetClass {
            fund: row.fund.clone(),
            value: row.asset_class.clone(),
        })?;
        if let Some(er) = row.expected_return {
            expected.insert(row.fund.clone(), er);
        }
        fund_map.insert(row.fund, class);
    }

    if fund_map.is_empty() {
        return Err(LoadError::Empty("fund map"));
    }
    let expected = (!expected.is_empty()).then_some(expected);
    Ok((fund_map, expected))
}

// ─── Fund returns ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct FundReturnRow {
    date: NaiveDate,
    fund: FundId,
    #[serde(rename = "return")]
    value: f64,
}

/// Parse long-format daily fund returns. A later row for the same fund and
/// date replaces an earlier one.
pub fn read_fund_returns<R: std::io::Read>(reader: R) -> Result<FundReturns, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut out = FundReturns::new();
    for row in rdr.deserialize::<FundReturnRow>() {
        let row = row?;
        out.entry(row.fund).or_default().insert(row.date, row.value);
    }
    Ok(out)
}

// ─── Benchmark ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct BenchmarkRow {
    date: NaiveDate,
    #[serde(rename = "return")]
    value: f64,
}

pub fn read_benchmark<R: std::io::Read>(reader: R) -> Result<BenchmarkReturns, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut out = BTreeMap::new();
    for row in rdr.deserialize::<BenchmarkRow>() {
        let row = row?;
        out.insert(row.date, row.value);
    }
    Ok(out)
}
