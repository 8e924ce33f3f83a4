use std::{path::PathBuf, process::ExitCode, sync::Arc};

use clap::{Parser, Subcommand};
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

use usdrub_core::{
    aggregate::AggregateStats,
    branch::BranchRecord,
    config::Config,
    cursor::PageView,
    domain::{Region, Side},
    extract::{DocumentSource, Extractor, FileDocumentSource, HttpDocumentSource, SelectorRowParser},
    rank::{rank, PAGE_SIZE},
    store::{FetchFailure, RateSnapshot, RateStore},
};

#[derive(Parser)]
#[command(name = "usdrub-cli")]
#[command(about = "USD/RUB cash rates of bank branches", long_about = None)]
struct Cli {
    /// Region slug of the branch listing (default from CASH_REGION)
    #[arg(short, long)]
    region: Option<String>,

    /// Read a saved listing instead of fetching; `{region}` is substituted
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Min/max/average buy and sell rates
    Summary,
    /// Branches paying the most for dollars
    Buy {
        /// 1-based page number
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
    /// Branches selling dollars the cheapest
    Sell {
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
}

#[derive(Serialize)]
struct SummaryJson<'a> {
    region: &'a str,
    stats: AggregateStats,
    records: &'a [BranchRecord],
    last_error: Option<&'a FetchFailure>,
}

#[derive(Serialize)]
struct PageJson<'a> {
    region: &'a str,
    side: &'static str,
    page: usize,
    page_count: usize,
    records: Vec<&'a BranchRecord>,
    last_error: Option<&'a FetchFailure>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let cfg = Config::load()?;
    usdrub_core::logging::init("usdrub-cli", cli.debug || cfg.debug)?;

    let region = cli
        .region
        .as_deref()
        .map(Region::new)
        .unwrap_or_else(|| cfg.region.clone());

    let source: Arc<dyn DocumentSource> = match &cli.file {
        Some(path) => Arc::new(FileDocumentSource::new(path.clone())),
        None => Arc::new(HttpDocumentSource::new(cfg.source_url.clone(), cfg.fetch_timeout)?),
    };
    let extractor = Extractor::new(source, Arc::new(SelectorRowParser::banki()?))
        .with_max_age(cfg.rate_max_age);

    let store = RateStore::new(region, extractor);
    // A failed fetch is recorded in the snapshot and reported with the output.
    let _ = store.update().await;
    let snapshot = store.read().await;

    match cli.command {
        Commands::Summary => print_summary(&snapshot, store.region(), cli.json),
        Commands::Buy { page } => print_page(&snapshot, store.region(), Side::Buy, page, cli.json),
        Commands::Sell { page } => {
            print_page(&snapshot, store.region(), Side::Sell, page, cli.json)
        }
    }
}

fn print_summary(
    snapshot: &RateSnapshot,
    region: &Region,
    json: bool,
) -> anyhow::Result<ExitCode> {
    if json {
        let out = SummaryJson {
            region: region.as_str(),
            stats: snapshot.stats,
            records: &snapshot.records,
            last_error: snapshot.last_error.as_ref(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if snapshot.stats.is_available() {
        println!("{}", summary_table(&snapshot.stats));
    } else {
        eprintln!("{}", snapshot.summary_text());
    }

    Ok(exit_code(snapshot.stats.is_available()))
}

fn print_page(
    snapshot: &RateSnapshot,
    region: &Region,
    side: Side,
    page: usize,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let Some(view) = page_view(snapshot, side, page) else {
        let count = snapshot.pages(side).page_count();
        if count == 0 {
            eprintln!("{}", snapshot.summary_text());
        } else {
            eprintln!("page {page} is out of range, {} has {count} page(s)", side.as_str());
        }
        return Ok(ExitCode::FAILURE);
    };

    if json {
        let out = PageJson {
            region: region.as_str(),
            side: side.as_str(),
            page,
            page_count: view.page_count,
            records: page_records(snapshot, side, view.index),
            last_error: snapshot.last_error.as_ref(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}\n", side.title());
        for line in &view.lines {
            println!("{line}");
        }
        println!("\npage {}/{}", view.index + 1, view.page_count);
    }
    Ok(ExitCode::SUCCESS)
}

/// 1-based page lookup without touching any cursor.
fn page_view(snapshot: &RateSnapshot, side: Side, page: usize) -> Option<PageView> {
    let pages = snapshot.pages(side);
    let index = page.checked_sub(1)?;
    let lines = pages.page(index)?.to_vec();

    Some(PageView {
        lines,
        index,
        page_count: pages.page_count(),
        has_more: index + 1 < pages.page_count(),
    })
}

/// Ranked records behind one page of lines, best offer first.
fn page_records(snapshot: &RateSnapshot, side: Side, index: usize) -> Vec<&BranchRecord> {
    rank(&snapshot.records, side)
        .chunks(PAGE_SIZE)
        .nth(index)
        .map(<[&BranchRecord]>::to_vec)
        .unwrap_or_default()
}

fn summary_table(stats: &AggregateStats) -> String {
    let mut builder = Builder::default();
    builder.push_record(["", "Buy, RUB", "Sell, RUB"]);
    for (label, buy, sell) in [
        ("Min", stats.buy_min, stats.sell_min),
        ("Max", stats.buy_max, stats.sell_max),
        ("Avg", stats.buy_avg, stats.sell_avg),
    ] {
        builder.push_record([label.to_string(), format!("{buy:.2}"), format!("{sell:.2}")]);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
