use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use semrank::analysis::{Analysis, Recommender};
use semrank::catalog::Product;
use semrank::config::Config;
use semrank::embedder::download;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "semrank", version, about = "Semantic product ranking by category")]
struct Cli {
    /// Path to the JSON config file
    #[arg(short, long, global = true, default_value = "")]
    config: String,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List selectable categories
    Categories,
    /// Rank a category's products and sample trending items
    Analyze {
        /// Category label, matched exactly
        category: String,
    },
    /// Sample trending products from the whole catalog
    Trending {
        /// Number of products (defaults to trending_count from config)
        #[arg(short)]
        k: Option<usize>,
    },
    /// Fetch the pinned embedding model if it is not already on disk
    DownloadModel,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;
    config.validate().context("invalid configuration")?;

    match cli.command {
        Command::DownloadModel => {
            download::download_model_files(&config.model_dir())?;
        }
        Command::Categories => {
            let categories = Recommender::from_config(&config).get_categories()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&categories)?);
            } else {
                for c in categories {
                    println!("{c}");
                }
            }
        }
        Command::Trending { k } => {
            let k = k.unwrap_or(config.trending_count);
            let trending = Recommender::from_config(&config).trending(k, &mut rand::rng())?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&trending)?);
            } else {
                print_products(&trending);
            }
        }
        Command::Analyze { category } => {
            let recommender = Recommender::from_config(&config);
            recommender.warm_up()?;
            let analysis = recommender.run_analysis(&category)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else {
                print_analysis(&analysis);
            }
        }
    }

    Ok(())
}

fn print_products(products: &[Product]) {
    for p in products {
        println!("- {}", p.name);
    }
}

fn print_analysis(analysis: &Analysis) {
    for thought in &analysis.thoughts {
        println!("{thought}");
    }
    println!();
    println!("Recommended products:");
    for item in &analysis.ranking {
        println!(
            "  {:<32} {:>10.2} {:>8.4}",
            item.product.name, item.product.price, item.score
        );
    }
    println!();
    println!("Trending products:");
    print_products(&analysis.trending);
}
