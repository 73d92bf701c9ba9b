//! Battery Health certificate tool - command line client
//!
//! Logs in to the certificate service, extracts certificates from the given
//! PDFs and optionally generates every valid certificate.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use battery_health_client::services::{DirectorySink, UploadFile};
use battery_health_client::{AlwaysConfirm, ApiClient, App, CertificateStore, Config, Session};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "bhc", version, about = "Battery health certificate batch tool")]
struct Cli {
    /// Service password
    #[arg(long, env = "BHC_PASSWORD", hide_env_values = true)]
    password: String,

    /// PDF test reports to extract certificates from
    pdfs: Vec<PathBuf>,

    /// Generate every valid certificate after extraction
    #[arg(long)]
    generate_all: bool,

    /// Directory generated certificates are saved to
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Answer yes to every confirmation
    #[arg(short, long)]
    yes: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bhc=info,battery_health_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::load()?;

    tracing::info!("Environment: {}", config.environment);
    tracing::info!("Certificate service: {}", config.api.base_url);

    let store = if cli.yes {
        CertificateStore::new(AlwaysConfirm)
    } else {
        CertificateStore::new(prompt_confirm)
    };
    let session = Session::with_expiry_hook(|| {
        eprintln!("Session expired. Please login again.");
    });
    let api = ApiClient::new(&config.api)?;
    let out_dir = cli
        .out_dir
        .clone()
        .unwrap_or_else(|| config.output.directory.clone());

    let mut app = App::new(Arc::new(config), Box::new(api), session, store);
    app.login(&cli.password).await?;

    let mut files = Vec::with_capacity(cli.pdfs.len());
    for path in &cli.pdfs {
        let file = UploadFile::from_path(path)
            .await
            .with_context(|| format!("Cannot open {}", path.display()))?;
        files.push(file);
    }

    if !files.is_empty() {
        let summary = app.ingest(files).await?;
        println!("{}\n", summary.message());
    }

    print_certificates(&app);

    if cli.generate_all {
        let sink = DirectorySink::new(out_dir);
        let summary = app.generate_all(&sink).await?;
        println!("\n{}", summary.message());
        println!("Saved to {}", sink.directory().display());
    }

    Ok(())
}

/// Ask on the terminal; anything but "y"/"yes" declines
fn prompt_confirm(message: &str) -> bool {
    print!("{message} [y/N] ");
    if std::io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn print_certificates(app: &App) {
    let store = &app.store;
    println!(
        "Certificates ({}): {} valid, {} invalid",
        store.len(),
        store.valid_count(),
        store.invalid_count()
    );

    for (index, cert) in store.records().iter().enumerate() {
        let title = if cert.make.is_empty() || cert.model.is_empty() {
            "Make/Model not set".to_string()
        } else {
            format!("{} {}", cert.make, cert.model)
        };
        let registration = if cert.registration.is_empty() {
            "No registration"
        } else {
            cert.registration.as_str()
        };
        let status = if cert.is_valid() {
            "Valid".to_string()
        } else {
            format!("{} error(s)", cert.validation_errors().len())
        };

        println!(
            "#{} {title} | {registration} | {}% {} | {status}",
            index + 1,
            cert.state_of_health_percent,
            cert.battery_status()
        );
        for error in cert.validation_errors() {
            println!("    - {error}");
        }
    }
}
