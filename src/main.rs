mod config;
mod cycle;
mod db;
mod digest;
mod enrich;
mod error;
mod fallback;
mod http;
mod listing;
mod model;
mod notify;
mod parser;
mod probe;
mod server;
mod sync;

use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};

use config::Config;
use cycle::Pipeline;
use db::SqliteStore;
use http::HttpFetcher;
use model::CompanyRecord;
use notify::{LogNotifier, MailerSend, Notifier};
use sync::Store;

#[derive(Parser)]
#[command(name = "registry_digest", about = "Newly registered company digest from allabolag.se")]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema
    Init,
    /// Find how many listing pages currently hold real data for a code
    Probe {
        #[arg(short, long)]
        code: String,
    },
    /// Fetch and print the listing for a code
    Fetch {
        #[arg(short, long)]
        code: String,
        /// Single page to fetch
        #[arg(short, long, conflicts_with = "pages")]
        page: Option<u32>,
        /// Fetch pages 1..=N (default: probe)
        #[arg(long)]
        pages: Option<u32>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Run one digest cycle: probe, fetch, dedup, save, notify
    Digest,
    /// Serve the digest trigger endpoint
    Serve {
        #[arg(long, default_value = "0.0.0.0:3000")]
        addr: String,
    },
    /// Manage category codes
    Codes {
        #[command(subcommand)]
        action: CodeAction,
    },
    /// Manage digest recipients
    Recipients {
        #[command(subcommand)]
        action: RecipientAction,
    },
    /// List saved companies
    Saved {
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Show one saved company by organisation number
    Show { org: String },
    /// Show database statistics
    Stats,
}

#[derive(Subcommand)]
enum CodeAction {
    List,
    Add { code: String, name: String },
    Remove { code: String },
}

#[derive(Subcommand)]
enum RecipientAction {
    List,
    Add { email: String },
    Remove { email: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let Cli { config: cfg, command } = Cli::parse();

    let result = match command {
        Commands::Init => {
            SqliteStore::open(&cfg.db_path)?;
            println!("Database ready at {}", cfg.db_path.display());
            Ok(())
        }
        Commands::Probe { code } => {
            let fetcher = HttpFetcher::new()?;
            let max = probe::max_page(&fetcher, &cfg, &code).await;
            println!("Code {}: {} page(s) with real data", code, max);
            Ok(())
        }
        Commands::Fetch { code, page, pages, json } => {
            let fetcher = HttpFetcher::new()?;
            let listing = match (page, pages) {
                (Some(p), _) => listing::fetch_pages(&fetcher, &cfg, &code, &[p], cfg.enrich).await,
                (None, Some(n)) => listing::fetch_listing(&fetcher, &cfg, &code, n, cfg.enrich).await,
                (None, None) => {
                    let n = probe::max_page(&fetcher, &cfg, &code).await;
                    listing::fetch_listing(&fetcher, &cfg, &code, n, cfg.enrich).await
                }
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                print_companies(&listing.records);
                if listing.degraded {
                    println!("\nWARNING: upstream unavailable, sample data shown");
                }
            }
            Ok(())
        }
        Commands::Digest => {
            let pipeline = build_pipeline(cfg)?;
            let report = pipeline.run_cycle(true).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if report.success {
                Ok(())
            } else {
                Err(anyhow::anyhow!(report.message))
            }
        }
        Commands::Serve { addr } => {
            let state = Arc::new(server::AppState::new(build_pipeline(cfg)?));
            server::serve(&addr, state).await
        }
        Commands::Codes { action } => {
            let store = SqliteStore::open(&cfg.db_path)?;
            match action {
                CodeAction::List => {
                    let codes = store.category_codes()?;
                    if codes.is_empty() {
                        println!("No category codes. Add one with 'codes add <code> <name>'.");
                    }
                    for c in codes {
                        println!("{:>4} | {:<10} | {}", c.id, c.code, c.name);
                    }
                }
                CodeAction::Add { code, name } => {
                    if store.add_category_code(&code, &name)? {
                        println!("Added code {} ({})", code, name);
                    } else {
                        println!("Code {} already exists", code);
                    }
                }
                CodeAction::Remove { code } => {
                    if store.remove_category_code(&code)? {
                        println!("Removed code {}", code);
                    } else {
                        println!("No such code: {}", code);
                    }
                }
            }
            Ok(())
        }
        Commands::Recipients { action } => {
            let store = SqliteStore::open(&cfg.db_path)?;
            match action {
                RecipientAction::List => {
                    for email in store.recipients()? {
                        println!("{}", email);
                    }
                }
                RecipientAction::Add { email } => {
                    if store.add_recipient(&email)? {
                        println!("Added {}", email);
                    } else {
                        println!("{} is already a recipient", email);
                    }
                }
                RecipientAction::Remove { email } => {
                    if store.remove_recipient(&email)? {
                        println!("Removed {}", email);
                    } else {
                        println!("{} is not a recipient", email);
                    }
                }
            }
            Ok(())
        }
        Commands::Saved { limit } => {
            let store = SqliteStore::open(&cfg.db_path)?;
            let rows = store.fetch_saved(limit)?;
            if rows.is_empty() {
                println!("No saved companies. Run 'digest' first.");
                return Ok(());
            }
            print_companies(&rows);
            Ok(())
        }
        Commands::Show { org } => {
            let store = SqliteStore::open(&cfg.db_path)?;
            match store.find_company(&org)? {
                Some(c) => println!("{}", serde_json::to_string_pretty(&c)?),
                None => println!("No saved company with org # {}", org),
            }
            Ok(())
        }
        Commands::Stats => {
            let store = SqliteStore::open(&cfg.db_path)?;
            let s = store.get_stats()?;
            println!("Companies:  {}", s.companies);
            println!("Enriched:   {}", s.enriched);
            println!("Codes:      {}", s.codes);
            println!("Recipients: {}", s.recipients);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn build_pipeline(cfg: Config) -> anyhow::Result<Pipeline> {
    let store = SqliteStore::open(&cfg.db_path)?;
    let notifier: Arc<dyn Notifier> = match &cfg.mailersend_api_key {
        Some(key) => Arc::new(MailerSend::new(key, &cfg.from_email)),
        None => {
            tracing::warn!("MAILERSEND_API_KEY not set; digests will only be logged");
            Arc::new(LogNotifier)
        }
    };
    Ok(Pipeline {
        fetcher: Arc::new(HttpFetcher::new()?),
        store: Arc::new(store),
        notifier,
        cfg,
    })
}

fn print_companies(rows: &[CompanyRecord]) {
    println!(
        "{:>3} | {:<32} | {:<12} | {:<10} | {:<24} | {:<12}",
        "#", "Company", "Org #", "Founded", "Location", "Code"
    );
    println!("{}", "-".repeat(108));

    for (i, r) in rows.iter().enumerate() {
        println!(
            "{:>3} | {:<32} | {:<12} | {:<10} | {:<24} | {:<12}",
            i + 1,
            truncate(&r.name, 32),
            r.organization_id,
            r.founded_date,
            truncate(&r.location, 24),
            r.category_code.as_deref().unwrap_or("-"),
        );
    }

    // Enrichment details (separate section to keep the table narrow)
    let enriched: Vec<_> = rows
        .iter()
        .filter(|r| r.ceo.is_some() || r.classification_codes.is_some())
        .collect();
    if !enriched.is_empty() {
        println!("\n--- Details ---");
        for r in &enriched {
            println!(
                "  {}: CEO {} | SNI {}",
                truncate(&r.name, 32),
                r.ceo.as_deref().unwrap_or("-"),
                r.classification_codes.as_deref().unwrap_or("-")
            );
        }
    }

    println!("\n{} companies", rows.len());
}

/// Cut to `max` characters, marking the cut with `...`.
fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &s[..cut]),
        None => s.to_string(),
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    let (h, m, s) = (secs / 3600, secs / 60 % 60, secs % 60);
    match (h, m) {
        (0, 0) => format!("{:.1}s", d.as_secs_f64()),
        (0, _) => format!("{m}m {s}s"),
        _ => format!("{h}h {m}m {s}s"),
    }
}

// ── Tests ──
