use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result, miette};
use printdesk::application::checkout::CheckoutService;
use printdesk::application::order_flow::OrderFlow;
use printdesk::application::verification::VerificationTimings;
use printdesk::domain::payment::ConfiguredPaymentRequests;
use printdesk::domain::pricing::PricingEngine;
use printdesk::infrastructure::http::HttpDocumentAnalyzer;
use printdesk::infrastructure::local::LocalOrderSink;
use printdesk::interfaces::config::ShopConfig;
use printdesk::interfaces::csv::receipt_writer::ReceiptWriter;
use printdesk::interfaces::request::OrderRequest;
use printdesk::logger::init_cli_logger;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Shop configuration file (TOML). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the price breakdown of an order request as CSV
    Quote {
        /// Order request (JSON)
        request: PathBuf,
    },
    /// Place an order: upload, configure, pay and confirm, then print the receipt as CSV
    Checkout {
        /// Order request (JSON)
        request: PathBuf,

        /// 12-digit bank reference of the payment
        #[arg(long)]
        reference: String,

        /// Skip the simulated bank delays
        #[arg(long)]
        fast: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_cli_logger(cli.verbose);

    let config = match &cli.config {
        Some(path) => ShopConfig::from_path(path).into_diagnostic()?,
        None => ShopConfig::default(),
    };

    match cli.command {
        Command::Quote { request } => quote(&config, &request),
        Command::Checkout {
            request,
            reference,
            fast,
        } => checkout(&config, &request, &reference, fast).await,
    }
}

fn quote(config: &ShopConfig, request: &Path) -> Result<()> {
    let engine = PricingEngine::new(config.rate_table().into_diagnostic()?);
    let request = OrderRequest::from_path(request).into_diagnostic()?;
    let breakdown = engine.breakdown(&request.settings.clamped());

    let stdout = io::stdout();
    ReceiptWriter::new(stdout.lock())
        .write_quote(&breakdown)
        .into_diagnostic()
}

async fn checkout(config: &ShopConfig, request: &Path, reference: &str, fast: bool) -> Result<()> {
    let engine = PricingEngine::new(config.rate_table().into_diagnostic()?);
    let request = OrderRequest::from_path(request).into_diagnostic()?;

    let timings = if fast {
        VerificationTimings::fast()
    } else {
        VerificationTimings::default()
    };
    let mut service = CheckoutService::new(
        Box::new(LocalOrderSink::new()),
        Arc::new(ConfiguredPaymentRequests::new(config.payment.clone())),
    )
    .with_timings(timings);
    if let Some(analysis) = &config.analysis {
        let analyzer =
            HttpDocumentAnalyzer::new(&analysis.endpoint, analysis.timeout()).into_diagnostic()?;
        service = service.with_analyzer(Arc::new(analyzer));
    }

    let mut flow = OrderFlow::new(engine);
    for file in request.load_files().into_diagnostic()? {
        flow.add_file(file.name, file.content_type, file.content);
    }
    service.analyze_files(&mut flow).await;

    if !flow.proceed_to_configure() {
        return Err(miette!("The order request does not list any files"));
    }
    flow.update_settings(request.settings);

    let mut process = service
        .start_payment(&mut flow)
        .ok_or_else(|| miette!("Order is not ready for payment"))?;
    info!(link = %process.snapshot().descriptor().to_uri(), "Payment requested");

    process.submit(reference).await.into_diagnostic()?;
    let record = service
        .complete_payment(&mut flow, &mut process)
        .await
        .into_diagnostic()?;

    let stdout = io::stdout();
    ReceiptWriter::new(stdout.lock())
        .write_receipt(&record)
        .into_diagnostic()
}
