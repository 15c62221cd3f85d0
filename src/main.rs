//! Synviz - CLI entry point
//!
//! Renders a neuron skeleton with its filtered synapse connections from a
//! neuPrint-style connectome server and prints the partner rankings.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use synviz::palette::Color;
use synviz::ranking::ConnectionRanking;
use synviz::viz::{VisualizeOptions, Visualizer};
use synviz::{Config, NeuprintClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "synviz")]
#[command(about = "Skeleton and synapse visualizer for neuPrint-style connectome servers")]
struct Cli {
    /// Path to a YAML config file (default: SYNVIZ_CONFIG or ./synviz.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a neuron skeleton with its synapse connections
    Visualize {
        /// Body id of the neuron to examine
        #[arg(long)]
        body_id: u64,

        /// Type prefix of upstream neurons (pre-synaptic branch)
        #[arg(long)]
        type_pre: Option<String>,

        /// Type prefix of downstream neurons (post-synaptic branch)
        #[arg(long)]
        type_post: Option<String>,

        /// Restrict pre-synaptic connections to these ROIs (repeatable)
        #[arg(long = "roi-pre")]
        rois_pre: Vec<String>,

        /// Restrict post-synaptic connections to these ROIs (repeatable)
        #[arg(long = "roi-post")]
        rois_post: Vec<String>,

        /// Only show the N partners with the most synapses
        #[arg(long)]
        top: Option<usize>,

        /// Include non-primary synapses
        #[arg(long)]
        all_synapses: bool,

        /// Skeleton color as #rrggbb
        #[arg(long)]
        skeleton_color: Option<String>,

        /// One color per partner for mid-sized partner sets instead of
        /// cycling an 11-color palette
        #[arg(long)]
        no_loop_colors: bool,

        /// Rendering dimensionality (2 or 3; only 2 is implemented)
        #[arg(long, default_value_t = 2)]
        dimensions: u8,

        /// Scatter marker radius in pixels
        #[arg(long)]
        synapse_size: Option<u32>,

        /// Page size for the paginated connection fetch; lower it on
        /// server timeouts
        #[arg(long)]
        batch_size: Option<usize>,

        /// Output SVG path (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,synviz=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env(cli.config.as_deref())?;

    match cli.command {
        Commands::Visualize {
            body_id,
            type_pre,
            type_post,
            rois_pre,
            rois_post,
            top,
            all_synapses,
            skeleton_color,
            no_loop_colors,
            dimensions,
            synapse_size,
            batch_size,
            output,
        } => {
            let mut opts = VisualizeOptions::new(body_id);
            opts.type_pre = type_pre;
            opts.type_post = type_post;
            opts.rois_pre = (!rois_pre.is_empty()).then_some(rois_pre);
            opts.rois_post = (!rois_post.is_empty()).then_some(rois_post);
            opts.top = top;
            opts.primary_only = !all_synapses;
            opts.loop_colors = !no_loop_colors;
            opts.dimensions = dimensions;
            opts.synapse_size = synapse_size;
            opts.batch_size = batch_size;
            opts.output = output.unwrap_or_else(|| PathBuf::from(&config.output_path));
            opts.figure_width = config.figure_width;
            opts.figure_height = config.figure_height;
            if let Some(hex) = skeleton_color {
                match Color::from_hex(&hex) {
                    Some(color) => opts.skeleton_color = color,
                    None => bail!("invalid skeleton color '{}', expected #rrggbb", hex),
                }
            }

            let client = NeuprintClient::new(&config)?;
            let viz = Visualizer::new(client);
            let (pre, post) = viz.visualize(&opts).await?;

            if let Some(pre) = pre {
                print_ranking("Pre-synaptic partners", &pre);
            }
            if let Some(post) = post {
                print_ranking("Post-synaptic partners", &post);
            }
            println!("figure written to {}", opts.output.display());
            Ok(())
        }
    }
}

fn print_ranking(title: &str, ranking: &ConnectionRanking) {
    println!("{} ({}):", title, ranking.len());
    for (rank, (name, count)) in ranking.iter().enumerate() {
        println!("  {:>3}. {:<32} {:>6}", rank + 1, name, count);
    }
}
