//! Reporting and export — CSV, JSON and Markdown artifacts.
//!
//! Exports only format numbers that are already final. Nothing here
//! recomputes P&L or R:R.
//! - **CSV**: the journal table (every data cell quoted) and monthly buckets
//! - **JSON**: the full snapshot wrapped with a `schemaVersion`
//! - **Markdown**: a human-readable performance report

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tradelog_core::TradeRecord;

use crate::buckets::MonthlyBucket;
use crate::metrics::AnalyticsSnapshot;

/// Current version of the JSON snapshot envelope.
pub const SCHEMA_VERSION: u32 = 1;

/// Column headings of the journal CSV.
pub const TRADE_CSV_HEADERS: [&str; 12] = [
    "Date",
    "Symbol",
    "Strategy",
    "Type",
    "Quantity",
    "Entry Price",
    "Exit Price",
    "Stop Loss",
    "Risk Amount",
    "P/L",
    "R:R",
    "Notes",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no trades to export")]
    NothingToExport,

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to flush CSV writer: {0}")]
    Flush(#[from] std::io::Error),

    #[error("export output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported schema version {found} (max supported: {supported})")]
    UnsupportedSchema { found: u32, supported: u32 },
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Suggested download name for a journal export made on `date`.
pub fn trades_csv_filename(date: &str) -> String {
    format!("trades_{date}.csv")
}

fn money(value: f64) -> String {
    format!("{value:.2}")
}

/// Optional amounts render empty when absent or zero.
fn optional_money(value: Option<f64>) -> String {
    match value {
        Some(v) if v != 0.0 => money(v),
        _ => String::new(),
    }
}

/// Export the journal table. The header row is bare; every data cell is
/// quoted and embedded quotes are doubled.
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String, ExportError> {
    if trades.is_empty() {
        return Err(ExportError::NothingToExport);
    }

    let mut out = TRADE_CSV_HEADERS.join(",");
    out.push('\n');

    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(vec![]);

    for t in trades {
        let row: [String; 12] = [
            t.date.clone(),
            t.symbol.clone(),
            t.strategy_tag().to_string(),
            t.trade_type.as_str().to_string(),
            t.quantity.to_string(),
            money(t.entry_price),
            money(t.exit_price),
            optional_money(t.stop_loss),
            optional_money(t.risk_amount),
            money(t.profit_loss),
            optional_money(t.risk_reward_ratio),
            t.notes.clone().unwrap_or_default(),
        ];
        wtr.write_record(&row)?;
    }

    let data = wtr.into_inner().map_err(|e| e.into_error())?;
    out.push_str(&String::from_utf8(data)?);
    Ok(out)
}

/// Export monthly buckets as `month,trades,profit,loss,net_pl`.
pub fn export_monthly_csv(buckets: &[MonthlyBucket]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["month", "trades", "profit", "loss", "net_pl"])?;
    for b in buckets {
        wtr.write_record([
            b.month.clone(),
            b.trades.to_string(),
            money(b.profit),
            money(b.loss),
            money(b.net_pl),
        ])?;
    }
    let data = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(data)?)
}

// ─── JSON export ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDocument {
    pub schema_version: u32,
    pub snapshot: AnalyticsSnapshot,
}

/// Serialize a snapshot to pretty JSON inside a versioned envelope.
pub fn export_snapshot_json(snapshot: &AnalyticsSnapshot) -> Result<String, ExportError> {
    let doc = SnapshotDocument {
        schema_version: SCHEMA_VERSION,
        snapshot: snapshot.clone(),
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Read a snapshot back, rejecting envelopes from a newer schema.
pub fn import_snapshot_json(json: &str) -> Result<AnalyticsSnapshot, ExportError> {
    let doc: SnapshotDocument = serde_json::from_str(json)?;
    if doc.schema_version > SCHEMA_VERSION {
        return Err(ExportError::UnsupportedSchema {
            found: doc.schema_version,
            supported: SCHEMA_VERSION,
        });
    }
    Ok(doc.snapshot)
}

// ─── Markdown report ────────────────────────────────────────────────

/// Generate a Markdown performance report from a snapshot.
pub fn generate_report(snapshot: &AnalyticsSnapshot) -> String {
    let s = snapshot;
    let mut md = String::with_capacity(2048);

    md.push_str("# Trading Performance Report\n\n");

    md.push_str("## Performance Metrics\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Total Trades | {} |\n", s.total_trades));
    md.push_str(&format!("| Win Rate | {:.1}% |\n", s.win_rate));
    md.push_str(&format!("| Profit Factor | {} |\n", s.profit_factor));
    md.push_str(&format!("| Net P&L | ${:.2} |\n", s.net_pl));
    md.push_str(&format!("| Avg R:R | {:.2} |\n", s.avg_rr));
    md.push_str(&format!("| Max Drawdown | ${:.2} |\n", s.max_drawdown));
    md.push('\n');

    md.push_str("## P&L Breakdown\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Total Profit | ${:.2} |\n", s.total_profit));
    md.push_str(&format!("| Total Loss | ${:.2} |\n", s.total_loss));
    md.push_str(&format!("| Avg Win | ${:.2} |\n", s.avg_win));
    md.push_str(&format!("| Avg Loss | ${:.2} |\n", s.avg_loss));
    md.push_str(&format!("| Largest Win | ${:.2} |\n", s.largest_win));
    md.push_str(&format!("| Largest Loss | ${:.2} |\n", s.largest_loss));
    md.push('\n');

    md.push_str("## Trade Distribution\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Wins / Losses | {} / {} |\n", s.wins, s.losses));
    md.push_str(&format!("| Flat / Open | {} |\n", s.flat_trades));
    md.push_str(&format!(
        "| Long | {} ({:.1}% win) |\n",
        s.long_trades, s.long_win_rate
    ));
    md.push_str(&format!(
        "| Short | {} ({:.1}% win) |\n",
        s.short_trades, s.short_win_rate
    ));
    md.push_str(&format!(
        "| Max Consecutive Wins | {} |\n",
        s.max_consecutive_wins
    ));
    md.push_str(&format!(
        "| Max Consecutive Losses | {} |\n",
        s.max_consecutive_losses
    ));
    md.push('\n');

    if !s.monthly.is_empty() {
        md.push_str("## Monthly Performance\n\n");
        md.push_str("| Month | Trades | Profit | Loss | Net P&L |\n");
        md.push_str("| --- | ---: | ---: | ---: | ---: |\n");
        for m in &s.monthly {
            md.push_str(&format!(
                "| {} | {} | ${:.2} | ${:.2} | ${:.2} |\n",
                m.month, m.trades, m.profit, m.loss, m.net_pl
            ));
        }
        md.push('\n');
    }

    if !s.top_symbols.is_empty() {
        md.push_str("## Top Symbols\n\n");
        md.push_str("| Symbol | Trades | Win Rate | Net P&L |\n");
        md.push_str("| --- | ---: | ---: | ---: |\n");
        for b in &s.top_symbols {
            md.push_str(&format!(
                "| {} | {} | {:.1}% | ${:.2} |\n",
                b.symbol, b.trades, b.win_rate, b.net_pl
            ));
        }
        md.push('\n');
    }

    if !s.strategies.is_empty() {
        md.push_str("## Strategies\n\n");
        md.push_str("| Strategy | Trades | Win Rate | Avg R:R | Net P&L |\n");
        md.push_str("| --- | ---: | ---: | ---: | ---: |\n");
        for b in &s.strategies {
            md.push_str(&format!(
                "| {} | {} | {:.1}% | {} | ${:.2} |\n",
                b.strategy,
                b.trades,
                b.win_rate,
                b.avg_rr_display(),
                b.net_pl
            ));
        }
        md.push('\n');
    }

    md
}
