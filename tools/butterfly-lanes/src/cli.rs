//! CLI commands for butterfly-lanes

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::FlowConfig;
use crate::diagnostics::Diagnostics;
use crate::emit::{tables, write_all, OutputFormat};
use crate::pipeline::{analyze, analyze_topology};
use crate::snapshot::Snapshot;
use crate::store::EntityStore;
use crate::validate::validate_analysis;

#[derive(Parser)]
#[command(name = "butterfly-lanes")]
#[command(about = "Lane topology and flow-direction analysis for lane-level maps", long_about = None)]
pub struct Cli {
    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log JSON lines instead of text
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Full pass: lane groups, connectivity, flow geometry and all outputs
    Analyze {
        /// Entity snapshot (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory
        #[arg(short, long)]
        outdir: PathBuf,

        /// Flow configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output formats
        #[arg(short, long, value_enum, value_delimiter = ',', default_values_t = OutputFormat::ALL)]
        format: Vec<OutputFormat>,

        /// Arrow half-angle in degrees
        #[arg(long)]
        alpha: Option<f64>,

        /// Travelled distance between flow arrows
        #[arg(long)]
        gap: Option<f64>,

        /// Match connectivity on the rayon pool
        #[arg(long)]
        parallel: bool,
    },

    /// Connectivity only, written as CSV
    Links {
        /// Entity snapshot (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output CSV file (`-` or absent for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Match connectivity on the rayon pool
        #[arg(long)]
        parallel: bool,
    },

    /// Run the analysis and check its invariants
    Validate {
        /// Entity snapshot (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Flow configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn resolve_config(
    path: Option<&Path>,
    alpha: Option<f64>,
    gap: Option<f64>,
    parallel: bool,
) -> Result<FlowConfig> {
    let mut config = match path {
        Some(p) => FlowConfig::load(p).with_context(|| format!("loading config {}", p.display()))?,
        None => FlowConfig::default(),
    };
    if let Some(alpha) = alpha {
        config.alpha_deg = alpha;
    }
    if let Some(gap) = gap {
        config.arrow_gap = gap;
    }
    config.parallel |= parallel;
    config.validate().context("invalid flow configuration")?;
    Ok(config)
}

fn load_store(input: &Path, diag: &mut Diagnostics) -> Result<EntityStore> {
    let snapshot =
        Snapshot::load(input).with_context(|| format!("reading snapshot {}", input.display()))?;
    let store = snapshot
        .into_store(diag)
        .with_context(|| format!("decoding snapshot {}", input.display()))?;
    Ok(store)
}

fn print_issues(diag: &Diagnostics) {
    if diag.is_empty() {
        println!("  ✓ No issues");
        return;
    }
    for (kind, n) in diag.summary() {
        println!("  ⚠ {n} {}", kind.label());
    }
}

impl Cli {
    /// Install the tracing subscriber on stderr
    pub fn init_logging(&self) {
        let default = if self.verbose { "debug" } else { "info" };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr);
        if self.log_json {
            builder.json().init();
        } else {
            builder.init();
        }
    }

    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Analyze {
                input,
                outdir,
                config,
                format,
                alpha,
                gap,
                parallel,
            } => {
                let start = Instant::now();
                let config = resolve_config(config.as_deref(), alpha, gap, parallel)?;

                println!("📂 Loading {}", input.display());
                let mut diag = Diagnostics::new();
                let store = load_store(&input, &mut diag)?;
                println!(
                    "  ✓ {} nodes, {} ways, {} relations",
                    store.points().len(),
                    store.ways().len(),
                    store.relations().len()
                );

                println!("\n🛣  Analyzing lanes...");
                let analysis = analyze(&store, &config);
                println!("  ✓ {} lane groups", analysis.lane_groups.len());
                println!("  ✓ {} connectivity links", analysis.edges.len());
                println!("  ✓ {} geometry primitives", analysis.primitives.len());

                println!("\n💾 Writing outputs to {}", outdir.display());
                let written = write_all(&outdir, &store, &analysis, &config, &format)
                    .with_context(|| format!("writing outputs to {}", outdir.display()))?;
                for path in &written {
                    println!("  ✓ {}", path.display());
                }

                diag.extend(analysis.diagnostics);
                println!("\n⚠ Diagnostics");
                print_issues(&diag);

                println!("\n🎉 Done in {:.2?}", start.elapsed());
                Ok(())
            }
            Commands::Links {
                input,
                output,
                parallel,
            } => {
                let config = resolve_config(None, None, None, parallel)?;
                let mut diag = Diagnostics::new();
                let store = load_store(&input, &mut diag)?;
                let (_, _, edges) = analyze_topology(&store, &config, &mut diag);

                let rows = match output.as_deref() {
                    Some(path) if path != Path::new("-") => {
                        let file = std::fs::File::create(path)
                            .with_context(|| format!("creating {}", path.display()))?;
                        tables::write_links(std::io::BufWriter::new(file), &edges)?
                    }
                    _ => tables::write_links(std::io::stdout().lock(), &edges)?,
                };

                // stdout may carry the table, so the summary goes through tracing
                tracing::info!(links = rows, issues = diag.len(), "connectivity written");
                Ok(())
            }
            Commands::Validate { input, config } => {
                let config = resolve_config(config.as_deref(), None, None, false)?;
                let mut diag = Diagnostics::new();
                let store = load_store(&input, &mut diag)?;
                let analysis = analyze(&store, &config);

                let result = validate_analysis(&store, &analysis, &config);

                diag.extend(analysis.diagnostics);
                println!("\n⚠ Diagnostics");
                print_issues(&diag);

                if !result.passed {
                    bail!(
                        "{} of {} invariant checks failed",
                        result.checks_run - result.checks_passed,
                        result.checks_run
                    );
                }
                Ok(())
            }
        }
    }
}
