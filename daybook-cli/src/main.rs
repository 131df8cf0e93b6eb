use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use daybook_core::{entries_on, monthly_report, stamp_now, DaybookError, LedgerStore};
use daybook_store::{export_csv, DEFAULT_EXPORT_NAME};
use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod auth;
mod config;
mod daybook;
mod llm;
mod render;
mod state;

use auth::Credential;
use config::Config;
use daybook::{dry_run_store, open_store, Daybook, Extractor, LlmExtractor};
use llm::LlmConfig;

#[derive(Parser, Debug)]
#[command(
    name = "daybook",
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("DAYBOOK_BUILD_SHA"), ")"),
    about = "AI-assisted expense daybook"
)]
struct Cli {
    /// Log debug output to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract expenses from a description, review them and save
    Log {
        /// e.g. "5000 to Ravi for plumbing, 40 for tea" (read from stdin if omitted)
        text: Option<String>,

        /// Save without asking for confirmation
        #[arg(short, long)]
        yes: bool,

        /// Show what would be saved without writing the ledger
        #[arg(long)]
        dry_run: bool,
    },

    /// Interactive entry: describe, review, confirm; blank line to quit
    Entry,

    /// Show the entries logged today (or on --date)
    Today {
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Monthly total, spending by category and daily trend
    Report {
        /// Month as YYYY-MM (default: current month)
        #[arg(long)]
        month: Option<String>,
    },

    /// Export the full history as CSV
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Manage ~/.daybook/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Store API credentials in ~/.daybook/auth.json
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    PasteGeminiKey,
    PasteOpenaiKey,
    PasteAnthropicKey,
    /// OAuth access token for the Google Sheets backend
    PasteSheetsToken,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Log { text, yes, dry_run } => {
            let text = match text {
                Some(t) => t,
                None => {
                    let mut s = String::new();
                    io::stdin().read_to_string(&mut s).context("read description from stdin")?;
                    s
                }
            };
            log_once(&text, yes, dry_run)?;
        }

        Command::Entry => run_entry()?,

        Command::Today { date } => {
            let cfg = config::load_config()?;
            let date = match date {
                Some(d) => d,
                None => stamp_now(cfg.timezone()?).date,
            };
            let store = open_store(&cfg, &auth::load_auth()?)?;
            print_day(store.as_ref(), date, &cfg.report.currency)?;
        }

        Command::Report { month } => {
            let cfg = config::load_config()?;
            let month = match month {
                Some(m) => validate_month(&m)?,
                None => stamp_now(cfg.timezone()?).month,
            };
            let store = open_store(&cfg, &auth::load_auth()?)?;
            let ledger = store.read_all().map_err(with_hint)?;
            let report = monthly_report(&ledger, &month);
            if report.is_empty() {
                println!("No data for {month} yet.");
            } else {
                print!("{}", render::monthly(&report, &cfg.report.currency));
            }
        }

        Command::Export { out } => {
            let cfg = config::load_config()?;
            let out = out.unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_NAME));
            let store = open_store(&cfg, &auth::load_auth()?)?;
            let ledger = store.read_all().map_err(with_hint)?;
            export_csv(&ledger, &out).map_err(with_hint)?;
            println!("Exported {} rows to {}", ledger.len(), out.display());
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let cfg = config::load_config()?;
                println!("# {}", config::config_path()?.display());
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },

        Command::Auth { command } => auth::paste(match command {
            AuthCommand::PasteGeminiKey => Credential::Gemini,
            AuthCommand::PasteOpenaiKey => Credential::OpenAI,
            AuthCommand::PasteAnthropicKey => Credential::Anthropic,
            AuthCommand::PasteSheetsToken => Credential::Sheets,
        })?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "daybook=debug,daybook_core=debug,daybook_ingest=debug,daybook_store=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn with_hint(e: DaybookError) -> anyhow::Error {
    anyhow::anyhow!("{e}\nhint: {}", e.retry_hint())
}

fn validate_month(m: &str) -> Result<String> {
    let m = m.trim();
    if NaiveDate::parse_from_str(&format!("{m}-01"), "%Y-%m-%d").is_err() || m.len() != 7 {
        bail!("month must look like YYYY-MM, got {m:?}");
    }
    Ok(m.to_string())
}

fn open_daybook(cfg: &Config, dry_run: bool) -> Result<Daybook<LlmExtractor, Box<dyn LedgerStore>>> {
    let auth = auth::load_auth()?;
    let store = open_store(cfg, &auth)?;
    let store: Box<dyn LedgerStore> = if dry_run {
        Box::new(dry_run_store(store.as_ref()).map_err(with_hint)?)
    } else {
        store
    };
    let extractor = LlmExtractor::new(LlmConfig::from_section(&cfg.llm)?, auth);
    Ok(Daybook::new(extractor, store))
}

fn log_once(text: &str, yes: bool, dry_run: bool) -> Result<()> {
    // Checked before extraction so a piped run without --yes costs no LLM call
    check_can_confirm(yes, io::stdin().is_terminal())?;

    let cfg = config::load_config()?;
    let tz = cfg.timezone()?;
    let currency = cfg.report.currency.clone();
    let mut book = open_daybook(&cfg, dry_run)?;

    let items = book.submit(text).map_err(with_hint)?;
    println!("Extracted {} item(s):\n", items.len());
    print!("{}", render::items_table(items, &currency));

    if !yes && !ask("\nConfirm & save to history?")? {
        book.discard();
        println!("Discarded.");
        return Ok(());
    }

    let stamp = stamp_now(tz);
    let saved = book.confirm(&stamp).map_err(with_hint)?;
    if dry_run {
        println!("\n(dry run) ledger would have {} rows; nothing written.", saved.len());
    } else {
        println!("\nSaved to {}", book.store().describe());
    }
    print_day_from(&saved, stamp.date, &currency);
    Ok(())
}

fn run_entry() -> Result<()> {
    let cfg = config::load_config()?;
    let tz = cfg.timezone()?;
    let currency = cfg.report.currency.clone();
    let mut book = open_daybook(&cfg, false)?;

    println!("Log for today: {}", stamp_now(tz).date);
    println!("Describe your expenses (e.g. 5000 to Ravi for plumbing). Blank line to quit.\n");

    loop {
        let Some(text) = read_line("> ")? else { break };
        if text.is_empty() {
            break;
        }
        entry_step(&mut book, &text, tz, &currency)?;
    }
    Ok(())
}

/// One describe/review/confirm round. Step failures are reported and the
/// loop continues; only I/O on the terminal itself is fatal.
fn entry_step<E: Extractor, S: LedgerStore>(
    book: &mut Daybook<E, S>,
    text: &str,
    tz: Option<chrono_tz::Tz>,
    currency: &str,
) -> Result<()> {
    match book.submit(text) {
        Ok(items) => print!("{}", render::items_table(items, currency)),
        Err(e) => {
            eprintln!("{e}\nhint: {}\n", e.retry_hint());
            return Ok(());
        }
    }

    if !ask("Confirm & save to history?")? {
        book.discard();
        println!("Discarded.\n");
        return Ok(());
    }

    loop {
        let stamp = stamp_now(tz);
        match book.confirm(&stamp) {
            Ok(saved) => {
                println!("Saved to {}", book.store().describe());
                print_day_from(&saved, stamp.date, currency);
                println!();
                return Ok(());
            }
            Err(e) => {
                eprintln!("{e}\nhint: {}", e.retry_hint());
                if !ask("Retry saving?")? {
                    book.discard();
                    println!("Discarded.\n");
                    return Ok(());
                }
            }
        }
    }
}

fn print_day(store: &dyn LedgerStore, date: NaiveDate, currency: &str) -> Result<()> {
    let ledger = store.read_all().map_err(with_hint)?;
    print_day_from(&ledger, date, currency);
    Ok(())
}

fn print_day_from(ledger: &[daybook_core::ExpenseRecord], date: NaiveDate, currency: &str) {
    let rows = entries_on(ledger, date);
    if rows.is_empty() {
        println!("No records for {date} yet.");
        return;
    }
    println!("\nEntries for {date}:");
    print!("{}", render::records_table(&rows, currency));
}

fn read_line(label: &str) -> Result<Option<String>> {
    print!("{label}");
    io::stdout().flush().ok();
    let mut s = String::new();
    if io::stdin().read_line(&mut s)? == 0 {
        return Ok(None);
    }
    Ok(Some(s.trim().to_string()))
}

fn check_can_confirm(yes: bool, interactive: bool) -> Result<()> {
    if !yes && !interactive {
        bail!("confirmation needs a terminal; pass --yes to save without asking");
    }
    Ok(())
}

fn ask(question: &str) -> Result<bool> {
    check_can_confirm(false, io::stdin().is_terminal())?;
    let answer = read_line(&format!("{question} [y/N] "))?.unwrap_or_default();
    Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_month() {
        assert_eq!(validate_month("2024-05").unwrap(), "2024-05");
        assert!(validate_month("2024-13").is_err());
        assert!(validate_month("2024-5").is_err());
        assert!(validate_month("May").is_err());
    }

    #[test]
    fn test_piped_input_needs_yes() {
        let err = check_can_confirm(false, false).unwrap_err();
        assert!(err.to_string().contains("--yes"));
        assert!(check_can_confirm(true, false).is_ok());
        assert!(check_can_confirm(false, true).is_ok());
    }
}
