use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sku_image_resolver::{
    config::Config,
    models::{ResolveOutcome, Sku},
    services::ImageResolutionService,
    utils::ReqwestTransport,
};

#[derive(Parser)]
#[command(name = "sku-image-resolver")]
#[command(version)]
#[command(about = "Find product images for SKUs on localized storefront pages")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path (defaults to $CONFIG_FILE or config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    /// Locale codes to try, in order (overrides config file)
    #[arg(long, value_name = "CODES", value_delimiter = ',')]
    locales: Option<Vec<String>>,

    /// Per-request timeout, e.g. "5s" (overrides config file)
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Longest image side in pixels, 0 disables downsampling (overrides config file)
    #[arg(long, value_name = "PX")]
    max_dimension: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve images for one or more SKUs
    Resolve {
        #[arg(required = true)]
        skus: Vec<String>,

        /// Write each resolved image to DIR/<sku>.<ext>
        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,
    },
    /// Resolve the own and OEM SKU of a review pair side by side
    Compare {
        own: String,
        oem: String,

        /// Write each resolved image to DIR/<sku>.<ext>
        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,
    },
    /// List the active locales in priority order
    Locales,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("sku_image_resolver={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting SKU image resolver v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::load()?,
    };

    // Override config with CLI arguments
    if let Some(locales) = cli.locales {
        config.resolver.locale_order = locales;
    }
    if let Some(timeout) = cli.timeout {
        config.resolver.request_timeout = timeout;
    }
    if let Some(max_dimension) = cli.max_dimension {
        config.resolver.max_image_dimension = max_dimension;
    }
    config.validate()?;

    info!(
        "Locale order: {} (timeout {:?}, max dimension {})",
        config.resolver.locale_order.join(", "),
        config.resolver.request_timeout,
        config.resolver.max_image_dimension
    );

    if let Command::Locales = cli.command {
        let registry = config.locale_registry()?;
        for code in &config.resolver.locale_order {
            if let Some(template) = registry.template_for(code) {
                println!("{code}\t{template}");
            }
        }
        return Ok(());
    }

    let transport = ReqwestTransport::new()?;
    let service = ImageResolutionService::from_config(&config, Arc::new(transport))?;

    match cli.command {
        Command::Resolve { skus, out } => {
            let skus: Vec<Sku> = skus.iter().map(Sku::new).collect();
            let outcomes =
                futures::future::join_all(skus.iter().map(|sku| service.resolve(sku))).await;

            for (sku, outcome) in skus.iter().zip(&outcomes) {
                report(sku, outcome, out.as_deref()).await?;
            }
        }
        Command::Compare { own, oem, out } => {
            let (own, oem) = (Sku::new(own), Sku::new(oem));
            let (own_outcome, oem_outcome) = service.resolve_pair(&own, &oem).await;

            report(&own, &own_outcome, out.as_deref()).await?;
            report(&oem, &oem_outcome, out.as_deref()).await?;
        }
        Command::Locales => {}
    }

    let stats = service.cache_stats().await;
    info!(
        "Done: {} resolution(s), {} cache hit(s)",
        stats.resolutions, stats.hits
    );

    Ok(())
}

/// Print one outcome line and optionally save the image
async fn report(sku: &Sku, outcome: &ResolveOutcome, out: Option<&Path>) -> Result<()> {
    let Some(image) = outcome.image() else {
        println!("{sku}\tunresolved");
        return Ok(());
    };

    println!(
        "{sku}\tresolved {}x{} {}",
        image.width,
        image.height,
        image.content_type()
    );

    if let Some(dir) = out {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

        let path = dir.join(format!("{}.{}", file_stem(sku), image.extension()));
        tokio::fs::write(&path, &image.bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote {} ({} bytes)", path.display(), image.bytes.len());
    }

    Ok(())
}

/// SKU as a safe file name
fn file_stem(sku: &Sku) -> String {
    sku.as_str()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
