//! tradelog CLI — journal, open-position, analytics and export commands.
//!
//! Commands:
//! - `add` — book a trade (open unless `--exit` is given)
//! - `close` — close an open position at an exit price
//! - `edit` — change a trade's fields and re-derive its P&L and R:R
//! - `delete` — remove a trade
//! - `list` — filtered, sorted journal table
//! - `positions` — open positions marked to market
//! - `analytics` — Markdown report or JSON snapshot of the whole journal
//! - `export` — CSV of the filtered journal

mod logging;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tradelog_analytics::export::{export_snapshot_json, export_trades_csv, generate_report};
use tradelog_analytics::{AnalyticsEngine, JournalConfig, TradeFilter};
use tradelog_core::position::{close, parse_price, rebook};
use tradelog_core::quote::fetch_all;
use tradelog_core::sort::{SortDirection, SortIndex};
use tradelog_core::{
    FallbackQuoteChain, JsonFileRepository, NewTrade, PositionsSummary, StaticQuoteSource,
    TradeId, TradePatch, TradeRecord, TradeRepository, TradeType,
};

#[derive(Parser)]
#[command(name = "tradelog", about = "tradelog — trading journal with performance analytics")]
struct Cli {
    /// Path to the TOML config file. A missing file means defaults.
    #[arg(long, global = true, default_value = "tradelog.toml")]
    config: PathBuf,

    /// Journal file. Overrides `[journal] data_file`.
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Book a trade. Without --exit it is recorded as an open position.
    Add {
        /// Instrument symbol (e.g., AAPL).
        #[arg(long)]
        symbol: String,

        /// long or short.
        #[arg(long = "type", default_value = "long")]
        trade_type: TradeType,

        #[arg(long)]
        quantity: f64,

        /// Entry price; a leading `$` is accepted.
        #[arg(long)]
        entry: String,

        /// Exit price for a trade that is already closed.
        #[arg(long)]
        exit: Option<String>,

        #[arg(long)]
        stop: Option<f64>,

        /// Planned risk in currency units (informational).
        #[arg(long)]
        risk: Option<f64>,

        #[arg(long)]
        strategy: Option<String>,

        #[arg(long)]
        notes: Option<String>,

        /// Trade date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,
    },
    /// Close an open position.
    Close {
        id: String,

        /// Exit price; a leading `$` is accepted.
        #[arg(long)]
        exit: String,

        /// Exit date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,
    },
    /// Edit a trade. P/L and R:R are re-derived from the edited fields.
    Edit {
        id: String,

        #[command(flatten)]
        fields: EditArgs,
    },
    /// Delete a trade.
    Delete { id: String },
    /// Show the journal table.
    List {
        #[command(flatten)]
        filter: FilterArgs,

        /// Column to sort by (date, symbol, profitLoss, strategy, ...).
        #[arg(long, default_value = "date")]
        sort: String,

        /// Sort descending.
        #[arg(long, default_value_t = false)]
        desc: bool,
    },
    /// Open positions with unrealized P&L.
    Positions {
        /// Current price for a symbol, e.g. --price AAPL=191.20. Repeatable.
        #[arg(long = "price", value_parser = parse_price_arg)]
        prices: Vec<PriceArg>,
    },
    /// Performance analytics over the whole journal.
    Analytics {
        /// Emit the snapshot as JSON instead of a Markdown report.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Export the filtered journal as CSV.
    Export {
        /// Output file. Defaults to trades_<today>.csv.
        #[arg(long)]
        out: Option<PathBuf>,

        #[command(flatten)]
        filter: FilterArgs,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Case-insensitive match on symbol or notes.
    #[arg(long)]
    search: Option<String>,

    /// Exact strategy tag.
    #[arg(long)]
    strategy: Option<String>,

    /// Earliest date, inclusive (YYYY-MM-DD).
    #[arg(long)]
    from: Option<String>,

    /// Latest date, inclusive (YYYY-MM-DD).
    #[arg(long)]
    to: Option<String>,

    /// Include open positions.
    #[arg(long, default_value_t = false)]
    open: bool,
}

impl FilterArgs {
    fn to_filter(&self) -> TradeFilter {
        TradeFilter {
            search: self.search.clone(),
            strategy: self.strategy.clone(),
            start_date: self.from.clone(),
            end_date: self.to.clone(),
            include_open: self.open,
        }
    }
}

/// Fields of `edit`. Anything not given keeps its stored value.
#[derive(Args, Default)]
struct EditArgs {
    #[arg(long)]
    symbol: Option<String>,

    #[arg(long = "type")]
    trade_type: Option<TradeType>,

    #[arg(long)]
    quantity: Option<f64>,

    #[arg(long)]
    entry: Option<String>,

    #[arg(long)]
    exit: Option<String>,

    /// Drop the exit price, turning the trade back into an open position.
    #[arg(long, default_value_t = false, conflicts_with = "exit")]
    reopen: bool,

    #[arg(long)]
    stop: Option<f64>,

    /// Remove the stop-loss; R:R is cleared with it.
    #[arg(long, default_value_t = false, conflicts_with = "stop")]
    clear_stop: bool,

    #[arg(long)]
    risk: Option<f64>,

    #[arg(long)]
    strategy: Option<String>,

    #[arg(long)]
    notes: Option<String>,

    #[arg(long)]
    date: Option<String>,
}

impl EditArgs {
    /// Overlay the given flags on `input`, validating them like `add` does.
    fn apply(&self, mut input: NewTrade) -> Result<NewTrade> {
        if let Some(symbol) = &self.symbol {
            input.symbol = symbol.trim().to_string();
        }
        if let Some(trade_type) = self.trade_type {
            input.trade_type = trade_type;
        }
        if let Some(quantity) = self.quantity {
            if !(quantity.is_finite() && quantity > 0.0) {
                bail!("quantity must be a positive number");
            }
            input.quantity = quantity;
        }
        if let Some(entry) = &self.entry {
            input.entry_price =
                parse_price(entry).with_context(|| format!("invalid entry price '{entry}'"))?;
        }
        if let Some(exit) = &self.exit {
            let price =
                parse_price(exit).with_context(|| format!("invalid exit price '{exit}'"))?;
            input.exit_price = Some(price);
        }
        if self.reopen {
            input.exit_price = None;
        }
        if let Some(stop) = self.stop {
            input.stop_loss = Some(stop);
        }
        if self.clear_stop {
            input.stop_loss = None;
        }
        if let Some(risk) = self.risk {
            input.risk_amount = Some(risk);
        }
        if let Some(strategy) = &self.strategy {
            input.strategy = strategy.clone();
        }
        if let Some(notes) = &self.notes {
            input.notes = Some(notes.clone());
        }
        if let Some(date) = &self.date {
            input.date = resolve_date(Some(date))?;
        }
        Ok(input)
    }
}

#[derive(Debug, Clone)]
struct PriceArg {
    symbol: String,
    price: f64,
}

fn parse_price_arg(s: &str) -> Result<PriceArg, String> {
    let (symbol, price) = s
        .split_once('=')
        .ok_or_else(|| format!("expected SYMBOL=PRICE, got '{s}'"))?;
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(format!("missing symbol in '{s}'"));
    }
    let price = parse_price(price).ok_or_else(|| format!("invalid price in '{s}'"))?;
    Ok(PriceArg {
        symbol: symbol.to_string(),
        price,
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = JournalConfig::from_file(&cli.config)
        .with_context(|| format!("failed to load config {}", cli.config.display()))?;
    logging::init(&config.logging);

    let data_file = cli
        .data
        .clone()
        .unwrap_or_else(|| config.journal.data_file.clone());
    let mut repo = JsonFileRepository::open(data_file.clone())
        .with_context(|| format!("failed to open journal {}", data_file.display()))?;

    match cli.command {
        Commands::Add {
            symbol,
            trade_type,
            quantity,
            entry,
            exit,
            stop,
            risk,
            strategy,
            notes,
            date,
        } => {
            let entry_price =
                parse_price(&entry).with_context(|| format!("invalid entry price '{entry}'"))?;
            let exit_price = exit
                .as_deref()
                .map(|e| parse_price(e).with_context(|| format!("invalid exit price '{e}'")))
                .transpose()?;
            if !(quantity.is_finite() && quantity > 0.0) {
                bail!("quantity must be a positive number");
            }
            let input = NewTrade {
                date: resolve_date(date.as_deref())?,
                symbol: symbol.trim().to_string(),
                trade_type,
                quantity,
                entry_price,
                exit_price,
                stop_loss: stop,
                risk_amount: risk,
                strategy: strategy.unwrap_or_default(),
                notes,
            };
            run_add(&mut repo, input)
        }
        Commands::Close { id, exit, date } => {
            let exit_price =
                parse_price(&exit).with_context(|| format!("invalid exit price '{exit}'"))?;
            run_close(&mut repo, &TradeId::new(id), exit_price, &resolve_date(date.as_deref())?)
        }
        Commands::Edit { id, fields } => run_edit(&mut repo, &TradeId::new(id), &fields),
        Commands::Delete { id } => {
            let id = TradeId::new(id);
            repo.delete(&id)?;
            println!("Deleted {id}");
            Ok(())
        }
        Commands::List { filter, sort, desc } => {
            run_list(&repo, &filter.to_filter(), &sort, desc)
        }
        Commands::Positions { prices } => run_positions(&repo, &config, &prices),
        Commands::Analytics { json } => run_analytics(&repo, &config, json),
        Commands::Export { out, filter } => run_export(&repo, &filter.to_filter(), out),
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Validate a user-supplied date, defaulting to today.
fn resolve_date(date: Option<&str>) -> Result<String> {
    match date {
        Some(d) => {
            let parsed = NaiveDate::parse_from_str(d, "%Y-%m-%d")
                .with_context(|| format!("invalid date '{d}', expected YYYY-MM-DD"))?;
            Ok(parsed.format("%Y-%m-%d").to_string())
        }
        None => Ok(today().format("%Y-%m-%d").to_string()),
    }
}

fn run_add(repo: &mut impl TradeRepository, input: NewTrade) -> Result<()> {
    let record = repo.create(input)?;
    if record.is_open() {
        println!(
            "Opened {} {} {} @ {:.2} ({})",
            record.trade_type, record.quantity, record.symbol, record.entry_price, record.id
        );
    } else {
        println!(
            "Booked {} {} P/L {:.2} ({})",
            record.trade_type, record.symbol, record.profit_loss, record.id
        );
    }
    Ok(())
}

fn run_close(
    repo: &mut impl TradeRepository,
    id: &TradeId,
    exit_price: f64,
    exit_date: &str,
) -> Result<()> {
    let open = repo.get(id)?;
    let closed = close(&open, exit_price, exit_date)?;
    let saved = repo.update(id, &TradePatch::from_record(&closed))?;
    info!(id = %saved.id, pl = saved.profit_loss, "position closed");

    println!("Closed {} {} @ {:.2}", saved.symbol, saved.id, saved.exit_price);
    println!("P/L:            {:.2}", saved.profit_loss);
    match saved.risk_reward_ratio {
        Some(rr) => println!("R:R:            {rr:.2}"),
        None => println!("R:R:            -"),
    }
    Ok(())
}

fn run_edit(repo: &mut impl TradeRepository, id: &TradeId, fields: &EditArgs) -> Result<()> {
    let existing = repo.get(id)?;
    let input = fields.apply(NewTrade::from_record(&existing))?;
    let saved = repo.replace(rebook(&existing, input))?;
    info!(id = %saved.id, pl = saved.profit_loss, open = saved.is_open(), "trade edited");

    if saved.is_open() {
        println!(
            "Updated open {} {} {} @ {:.2} ({})",
            saved.trade_type, saved.quantity, saved.symbol, saved.entry_price, saved.id
        );
        return Ok(());
    }
    println!("Updated {} {} @ {:.2}", saved.symbol, saved.id, saved.exit_price);
    println!("P/L:            {:.2}", saved.profit_loss);
    match saved.risk_reward_ratio {
        Some(rr) => println!("R:R:            {rr:.2}"),
        None => println!("R:R:            -"),
    }
    Ok(())
}

fn run_list(
    repo: &impl TradeRepository,
    filter: &TradeFilter,
    sort: &str,
    desc: bool,
) -> Result<()> {
    let all = repo.list()?;
    let direction = if desc {
        SortDirection::Descending
    } else {
        SortDirection::Ascending
    };
    let rows = SortIndex::<TradeRecord>::new(sort, direction).sort(&filter.apply(&all));

    if rows.is_empty() {
        println!("No trades match your filters.");
        return Ok(());
    }

    println!(
        "{:<20} {:<10} {:<8} {:<5} {:>8} {:>10} {:>10} {:>10} {:>6}  {}",
        "ID", "Date", "Symbol", "Type", "Qty", "Entry", "Exit", "P/L", "R:R", "Strategy"
    );
    for t in &rows {
        let rr = t
            .risk_reward_ratio
            .map(|r| format!("{r:.2}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<20} {:<10} {:<8} {:<5} {:>8} {:>10.2} {:>10.2} {:>10.2} {:>6}  {}",
            t.id,
            t.date,
            t.symbol,
            t.trade_type,
            t.quantity,
            t.entry_price,
            t.exit_price,
            t.profit_loss,
            rr,
            t.strategy_tag()
        );
    }
    if filter.is_active() {
        println!();
        println!("Showing {} of {} trades", rows.len(), all.len());
    }
    Ok(())
}

fn run_positions(
    repo: &impl TradeRepository,
    config: &JournalConfig,
    prices: &[PriceArg],
) -> Result<()> {
    let trades = repo.list()?;
    let open: Vec<&TradeRecord> = trades.iter().filter(|t| t.is_open()).collect();
    if open.is_empty() {
        println!("No open positions.");
        return Ok(());
    }

    let cli_prices = StaticQuoteSource::from_prices(
        "command-line",
        prices.iter().map(|p| (p.symbol.clone(), p.price)),
    );
    let chain = FallbackQuoteChain::new()
        .push(cli_prices)
        .push(config.quotes.source());

    let symbols: Vec<&str> = open.iter().map(|t| t.symbol.as_str()).collect();
    let quotes = fetch_all(&chain, &symbols);
    for (symbol, result) in &quotes {
        if let Err(err) = result {
            warn!(symbol = %symbol, error = %err, "no quote, marking at entry price");
        }
    }

    let summary = PositionsSummary::compute(
        &trades,
        |t| {
            quotes
                .get(&t.symbol)
                .and_then(|r| r.as_ref().ok())
                .map(|q| q.price)
        },
        today(),
    );

    println!(
        "{:<20} {:<8} {:<5} {:>8} {:>10} {:>10} {:>12} {:>8} {:>6}",
        "ID", "Symbol", "Type", "Qty", "Entry", "Current", "Unrealized", "P/L %", "Days"
    );
    for p in &summary.positions {
        let days = p
            .days_held
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<20} {:<8} {:<5} {:>8} {:>10.2} {:>10.2} {:>12.2} {:>7.2}% {:>6}",
            p.id,
            p.symbol,
            p.trade_type,
            p.quantity,
            p.entry_price,
            p.current_price,
            p.unrealized_pl,
            p.pl_percent,
            days
        );
    }
    println!();
    println!("Total Unrealized P/L: {:.2}", summary.total_unrealized_pl);
    println!("Total Position Value: {:.2}", summary.total_position_value);
    Ok(())
}

fn run_analytics(repo: &impl TradeRepository, config: &JournalConfig, json: bool) -> Result<()> {
    let trades = repo.list()?;
    if trades.is_empty() {
        println!("No trades yet. Add trades to see analytics.");
        return Ok(());
    }

    let snapshot = AnalyticsEngine::new(config.analytics.top_symbols).compute(&trades)?;
    if json {
        println!("{}", export_snapshot_json(&snapshot)?);
    } else {
        print!("{}", generate_report(&snapshot));
    }
    Ok(())
}

fn run_export(
    repo: &impl TradeRepository,
    filter: &TradeFilter,
    out: Option<PathBuf>,
) -> Result<()> {
    let trades = filter.apply(&repo.list()?);
    if trades.is_empty() {
        bail!("no trades to export");
    }
    let csv = export_trades_csv(&trades)?;

    let out = out.unwrap_or_else(|| {
        PathBuf::from(tradelog_analytics::export::trades_csv_filename(
            &today().format("%Y-%m-%d").to_string(),
        ))
    });
    std::fs::write(&out, csv).with_context(|| format!("failed to write {}", out.display()))?;
    info!(path = %out.display(), trades = trades.len(), "journal exported");
    println!("Exported {} trades to {}", trades.len(), out.display());
    Ok(())
}
