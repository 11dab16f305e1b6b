//! Historical financial charts.
//!
//! Rows coming back from the model are loosely typed, so they are first
//! normalized into a [`FinancialTable`]. Chart plans are derived from the
//! table as plain data and only then drawn, which keeps scaling and
//! skipping rules testable without touching the filesystem.

use crate::error::SummarizerError;
use crate::schema::JsonRecord;
use crate::utils::{ensure_int_year, safe_num};
use log::{error, info};
use plotters::prelude::*;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const YEAR: &str = "Year";
pub const TOTAL_REVENUE: &str = "Total Revenue";
pub const NET_INCOME: &str = "Net Income";
pub const TOTAL_ASSETS: &str = "Total Assets";
pub const TOTAL_LIABILITIES: &str = "Total Liabilities";
pub const EQUITY: &str = "Equity";
pub const CASH_FLOW: &str = "Cash Flow";

const BAR_CHART_SIZE: (u32, u32) = (1500, 900);
const LINE_CHART_SIZE: (u32, u32) = (1500, 750);
const BAR_WIDTH: f64 = 0.35;

const REVENUE_COLOR: RGBColor = RGBColor(0x1f, 0x77, 0xb4);
const NET_INCOME_COLOR: RGBColor = RGBColor(0x2c, 0xa0, 0x2c);
const YOY_REVENUE_COLOR: RGBColor = RGBColor(0xff, 0x7f, 0x0e);
const YOY_NET_INCOME_COLOR: RGBColor = RGBColor(0xd6, 0x27, 0x28);

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinancialRow {
    pub year: Option<i32>,
    pub total_revenue: Option<f64>,
    pub net_income: Option<f64>,
    pub total_assets: Option<f64>,
    pub total_liabilities: Option<f64>,
    pub equity: Option<f64>,
    pub cash_flow: Option<f64>,
}

impl FinancialRow {
    fn from_record(record: &JsonRecord) -> Self {
        let num = |column: &str| lookup(record, column).and_then(safe_num);
        Self {
            year: lookup(record, YEAR).and_then(ensure_int_year),
            total_revenue: num(TOTAL_REVENUE),
            net_income: num(NET_INCOME),
            total_assets: num(TOTAL_ASSETS),
            total_liabilities: num(TOTAL_LIABILITIES),
            equity: num(EQUITY),
            cash_flow: num(CASH_FLOW),
        }
    }
}

/// Historical rows with every known column coerced, sorted by year.
/// Rows whose year cannot be read sort last.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinancialTable {
    rows: Vec<FinancialRow>,
}

impl FinancialTable {
    pub fn from_rows(records: &[JsonRecord]) -> Self {
        let mut rows: Vec<FinancialRow> = records.iter().map(FinancialRow::from_record).collect();
        rows.sort_by_key(|r| (r.year.is_none(), r.year));
        Self { rows }
    }

    pub fn rows(&self) -> &[FinancialRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn dated_rows(&self) -> impl Iterator<Item = (i32, &FinancialRow)> {
        self.rows.iter().filter_map(|r| r.year.map(|y| (y, r)))
    }
}

/// Exact column name first, then a relaxed match so `total_revenue` or
/// `total revenue` still land in "Total Revenue".
fn lookup<'a>(record: &'a JsonRecord, column: &str) -> Option<&'a Value> {
    record.get(column).or_else(|| {
        let wanted = column_key(column);
        record
            .iter()
            .find(|(k, _)| column_key(k) == wanted)
            .map(|(_, v)| v)
    })
}

fn column_key(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace(['_', '-'], " ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueScale {
    Units,
    Millions,
    Billions,
}

impl ValueScale {
    pub fn for_max(max_abs: f64) -> Self {
        if max_abs >= 1_000_000_000.0 {
            Self::Billions
        } else if max_abs >= 1_000_000.0 {
            Self::Millions
        } else {
            Self::Units
        }
    }

    pub fn divisor(self) -> f64 {
        match self {
            Self::Units => 1.0,
            Self::Millions => 1_000_000.0,
            Self::Billions => 1_000_000_000.0,
        }
    }

    pub fn axis_label(self) -> &'static str {
        match self {
            Self::Units => "USD",
            Self::Millions => "USD (millions)",
            Self::Billions => "USD (billions)",
        }
    }
}

/// Revenue and net income bars, already divided by `scale`.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChartPlan {
    pub years: Vec<i32>,
    pub revenue: Vec<Option<f64>>,
    pub net_income: Vec<Option<f64>>,
    pub scale: ValueScale,
}

pub fn plan_revenue_chart(table: &FinancialTable) -> Option<BarChartPlan> {
    let rows: Vec<(i32, &FinancialRow)> = table
        .dated_rows()
        .filter(|(_, r)| r.total_revenue.is_some() || r.net_income.is_some())
        .collect();

    if rows.is_empty() {
        return None;
    }

    let max_abs = rows
        .iter()
        .flat_map(|(_, r)| [r.total_revenue, r.net_income])
        .flatten()
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let scale = ValueScale::for_max(max_abs);
    let scaled = |v: Option<f64>| v.map(|v| v / scale.divisor());

    Some(BarChartPlan {
        years: rows.iter().map(|(y, _)| *y).collect(),
        revenue: rows.iter().map(|(_, r)| scaled(r.total_revenue)).collect(),
        net_income: rows.iter().map(|(_, r)| scaled(r.net_income)).collect(),
        scale,
    })
}

/// Year-over-year percentage changes.
#[derive(Debug, Clone, PartialEq)]
pub struct LineChartPlan {
    pub years: Vec<i32>,
    pub revenue_pct: Vec<Option<f64>>,
    pub net_income_pct: Vec<Option<f64>>,
}

pub fn plan_yoy_chart(table: &FinancialTable) -> Option<LineChartPlan> {
    let rows: Vec<(i32, &FinancialRow)> = table.dated_rows().collect();
    let revenue: Vec<Option<f64>> = rows.iter().map(|(_, r)| r.total_revenue).collect();
    let net_income: Vec<Option<f64>> = rows.iter().map(|(_, r)| r.net_income).collect();

    let plan = LineChartPlan {
        years: rows.iter().map(|(y, _)| *y).collect(),
        revenue_pct: pct_change(&revenue),
        net_income_pct: pct_change(&net_income),
    };

    let has_data = plan
        .revenue_pct
        .iter()
        .chain(&plan.net_income_pct)
        .any(Option::is_some);
    has_data.then_some(plan)
}

/// Percentage change against the most recent present value. Missing
/// entries stay missing, and a zero base yields no value.
pub fn pct_change(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut previous: Option<f64> = None;
    values
        .iter()
        .map(|current| {
            let change = match (previous, *current) {
                (Some(prev), Some(cur)) => Some((cur / prev - 1.0) * 100.0),
                _ => None,
            };
            if current.is_some() {
                previous = *current;
            }
            change.filter(|v| v.is_finite())
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartArtifacts {
    pub revenue_netincome: Option<PathBuf>,
    pub yoy_changes: Option<PathBuf>,
}

impl ChartArtifacts {
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.revenue_netincome.iter().chain(self.yoy_changes.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.paths().next().is_none()
    }
}

/// Draws the revenue/net income and year-over-year charts as PNG files in
/// `output_dir`. A chart that cannot be drawn is logged and left out.
pub fn generate_financial_charts(
    records: &[JsonRecord],
    company: &str,
    output_dir: &Path,
    timestamp: &str,
) -> ChartArtifacts {
    let table = FinancialTable::from_rows(records);
    let mut artifacts = ChartArtifacts::default();

    if let Err(e) = std::fs::create_dir_all(output_dir) {
        error!("Chart error: cannot create {}: {}", output_dir.display(), e);
        return artifacts;
    }

    if let Some(plan) = plan_revenue_chart(&table) {
        let path = output_dir.join(format!("{}_revenue_netincome_{}.png", company, timestamp));
        match draw_bar_chart(&path, &plan).map_err(chart_error) {
            Ok(()) => {
                info!("Saved revenue chart to {}", path.display());
                artifacts.revenue_netincome = Some(path);
            }
            Err(e) => {
                error!("{}", e);
                discard_partial(&path);
            }
        }
    }

    if let Some(plan) = plan_yoy_chart(&table) {
        let path = output_dir.join(format!("{}_yoy_changes_{}.png", company, timestamp));
        match draw_line_chart(&path, &plan).map_err(chart_error) {
            Ok(()) => {
                info!("Saved YoY chart to {}", path.display());
                artifacts.yoy_changes = Some(path);
            }
            Err(e) => {
                error!("{}", e);
                discard_partial(&path);
            }
        }
    }

    artifacts
}

// The bitmap backend flushes on drop, so a failed draw can still leave a file.
fn discard_partial(path: &Path) {
    if path.exists() {
        let _ = std::fs::remove_file(path);
    }
}

fn chart_error(e: Box<dyn std::error::Error>) -> SummarizerError {
    SummarizerError::Chart(e.to_string())
}

type DrawResult = std::result::Result<(), Box<dyn std::error::Error>>;

fn draw_bar_chart(path: &Path, plan: &BarChartPlan) -> DrawResult {
    let root = BitMapBackend::new(path, BAR_CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let (y_min, y_max) = padded_range(
        plan.revenue
            .iter()
            .chain(&plan.net_income)
            .flatten()
            .copied(),
    );
    let n = plan.years.len();
    let x_formatter = |x: &f64| year_label(&plan.years, *x);

    let mut chart = ChartBuilder::on(&root)
        .caption("Revenue & Net Income Over Years", ("sans-serif", 36).into_font())
        .margin(24)
        .x_label_area_size(60)
        .y_label_area_size(110)
        .build_cartesian_2d(-0.5_f64..(n as f64 - 0.5), y_min..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n + 1)
        .x_label_formatter(&x_formatter)
        .x_desc("Year")
        .y_desc(plan.scale.axis_label())
        .draw()?;

    let series = [
        (-BAR_WIDTH, &plan.revenue, REVENUE_COLOR, TOTAL_REVENUE),
        (0.0, &plan.net_income, NET_INCOME_COLOR, NET_INCOME),
    ];
    for (offset, values, color, label) in series {
        chart
            .draw_series(values.iter().enumerate().filter_map(|(i, v)| {
                v.map(|v| {
                    let x0 = i as f64 + offset;
                    Rectangle::new(
                        [(x0, v.max(0.0)), (x0 + BAR_WIDTH, v.min(0.0))],
                        color.filled(),
                    )
                })
            }))?
            .label(label)
            .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 14, y + 6)], color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE.mix(0.85))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

fn draw_line_chart(path: &Path, plan: &LineChartPlan) -> DrawResult {
    let root = BitMapBackend::new(path, LINE_CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let (y_min, y_max) = padded_range(
        plan.revenue_pct
            .iter()
            .chain(&plan.net_income_pct)
            .flatten()
            .copied(),
    );
    let n = plan.years.len();
    let x_formatter = |x: &f64| year_label(&plan.years, *x);

    let mut chart = ChartBuilder::on(&root)
        .caption("Year-over-Year % Change", ("sans-serif", 36).into_font())
        .margin(24)
        .x_label_area_size(60)
        .y_label_area_size(90)
        .build_cartesian_2d(-0.5_f64..(n as f64 - 0.5), y_min..y_max)?;

    chart
        .configure_mesh()
        .x_labels(n + 1)
        .x_label_formatter(&x_formatter)
        .x_desc("Year")
        .y_desc("Percent (%)")
        .draw()?;

    let series = [
        (&plan.revenue_pct, YOY_REVENUE_COLOR, TOTAL_REVENUE),
        (&plan.net_income_pct, YOY_NET_INCOME_COLOR, NET_INCOME),
    ];
    for (values, color, label) in series {
        let points: Vec<(f64, f64)> = values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (i as f64, v)))
            .collect();

        chart
            .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        chart.draw_series(points.into_iter().map(|p| Circle::new(p, 5, color.filled())))?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE.mix(0.85))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Value range that always contains zero, padded by 10% of its span.
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let span = hi - lo;
    let pad = if span > 0.0 { span * 0.1 } else { 1.0 };
    (if lo < 0.0 { lo - pad } else { lo }, hi + pad)
}

fn year_label(years: &[i32], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    years
        .get(idx as usize)
        .map(|y| y.to_string())
        .unwrap_or_default()
}
