use anyhow::Context;
use catalog_types::Row;
use clap::{Parser, Subcommand};
use dialoguer::MultiSelect;
use std::path::PathBuf;
use woo_import::config::{self, Config};
use woo_import::logging;
use woo_import::session::{ImportSession, UploadReport};
use woo_import::uploader::compose_name;
use woo_import::woocommerce::WooCommerceClient;

#[derive(Debug, Parser)]
#[command(version, about = "Upload a CSV product catalog to a WooCommerce store")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// List rows that still need uploading
    View {
        csv: PathBuf,
        /// Print every column as CSV
        #[arg(long)]
        full: bool,
    },
    /// List displayed rows with a cell containing the query
    Search { csv: PathBuf, query: String },
    /// Upload selected rows
    Upload {
        csv: PathBuf,
        #[arg(long = "code")]
        codes: Vec<String>,
        #[arg(long, conflicts_with = "codes")]
        all: bool,
    },
    /// Check the store credentials
    Check,
}

fn print_summary<'a>(rows: impl IntoIterator<Item = &'a Row>) {
    for row in rows {
        println!(
            "{:<16} {:<48} {:<32} {:>10}",
            row.code,
            compose_name(row),
            row.category,
            row.rrp
        );
    }
}

fn print_full(session: &ImportSession) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    wtr.write_record(Row::display_headers(session.image_columns()))?;
    for row in session.rows() {
        wtr.write_record(row.display_values())?;
    }
    wtr.flush()?;
    Ok(())
}

fn print_report(report: &UploadReport) {
    println!("Uploaded: {}", report.uploaded.len());
    for code in &report.skipped {
        println!("Skipped {code}: no image");
    }
    for code in &report.not_displayed {
        println!("Skipped {code}: not displayed");
    }
    for (code, reason) in &report.failed {
        println!("Failed {code}: {reason}");
    }
    for (code, reason) in &report.unrecorded {
        println!("Uploaded {code} but could not record it in the ledger: {reason}. Add it by hand before the next run.");
    }
}

fn select_rows(session: &ImportSession) -> anyhow::Result<Vec<String>> {
    let items: Vec<String> = session
        .rows()
        .iter()
        .map(|r| format!("{} {}", r.code, compose_name(r)))
        .collect();
    let picked = MultiSelect::new()
        .with_prompt("Select rows to upload")
        .items(&items)
        .interact()?;
    Ok(picked
        .into_iter()
        .map(|i| session.rows()[i].code.clone())
        .collect())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    config::load_dotenv()?;
    let config = Config::from_env()?;
    logging::init(&config.log_target)?;

    let api = WooCommerceClient::new(
        &config.site_url,
        config.consumer_key.clone(),
        config.consumer_secret.clone(),
        config.http_timeout,
    )?;
    let mut session = ImportSession::open(&config, Box::new(api))?;

    match cli.command {
        Command::View { csv, full } => {
            session.load_csv(&csv).with_context(|| format!("Unable to load {csv:?}"))?;
            if full {
                print_full(&session)?;
            } else {
                print_summary(session.rows());
            }
        }
        Command::Search { csv, query } => {
            session.load_csv(&csv).with_context(|| format!("Unable to load {csv:?}"))?;
            print_summary(session.search(&query));
        }
        Command::Upload { csv, codes, all } => {
            session.load_csv(&csv).with_context(|| format!("Unable to load {csv:?}"))?;
            let codes = if all {
                session.rows().iter().map(|r| r.code.clone()).collect()
            } else if codes.is_empty() {
                select_rows(&session)?
            } else {
                codes
            };
            if codes.is_empty() {
                println!("Please select rows to upload.");
                return Ok(());
            }
            session.load_categories(config.category_page_size).await;
            let report = session.upload_selected(&codes).await;
            print_report(&report);
        }
        Command::Check => match session.test_connection().await {
            Ok(()) => println!("Connected successfully!"),
            Err(err) => {
                log::error!("Connection check failed: {err}");
                println!("Failed to connect. {err}");
                std::process::exit(1);
            }
        },
    }
    Ok(())
}
