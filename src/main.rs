//! world-graph CLI: combine elements and inspect what has been discovered.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};

use world_graph::config::{Strategy, WorldConfig};
use world_graph::export;
use world_graph::oracle::OllamaOracle;
use world_graph::resolver::ResolutionSource;
use world_graph::store::TripleStore;

#[derive(Parser)]
#[command(name = "world-graph", version, about = "Combine elements, discover the world graph")]
struct Cli {
    /// Config file (TOML). Defaults to $XDG_CONFIG_HOME/world-graph/config.toml.
    #[arg(long, global = true, env = "WORLD_GRAPH_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for persistent storage.
    #[arg(long, global = true, env = "WORLD_GRAPH_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Keep everything in memory for this run.
    #[arg(long, global = true)]
    memory: bool,

    /// Log filter when RUST_LOG is unset (e.g. "info", "world_graph=debug").
    #[arg(long, global = true, env = "WORLD_GRAPH_LOG")]
    log_level: Option<String>,

    /// Ollama base URL.
    #[arg(long, global = true, env = "OLLAMA_URL")]
    ollama_url: Option<String>,

    /// Ollama model name.
    #[arg(long, global = true, env = "WORLD_GRAPH_MODEL")]
    model: Option<String>,

    /// Oracle strategy.
    #[arg(long, global = true, value_enum)]
    strategy: Option<Strategy>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Combine two elements.
    Combine {
        /// First element.
        a: String,
        /// Second element.
        b: String,
    },

    /// List every discovered combination as JSON.
    Explore,

    /// Export the derivation graph.
    Graph {
        #[arg(long, value_enum, default_value = "json")]
        format: GraphFormat,
    },

    /// Show the combinations that lead to an element.
    Lineage {
        /// Element name.
        element: String,

        /// Maximum number of steps back.
        #[arg(long, default_value = "8")]
        max_depth: usize,
    },

    /// List the starting elements.
    Seeds,

    /// Show store statistics and oracle reachability.
    Info,

    /// Print the effective configuration as TOML.
    Config,

    /// Delete every discovered combination.
    Reset {
        /// Confirm the reset.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum GraphFormat {
    Json,
    Dot,
}

impl Cli {
    fn effective_config(&self) -> Result<WorldConfig> {
        let mut config = WorldConfig::load_or_default(self.config.as_deref())?;
        if let Some(dir) = &self.data_dir {
            config.data_dir = Some(dir.clone());
        }
        if self.memory {
            config.memory_only = true;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(url) = &self.ollama_url {
            config.oracle.ollama.base_url = url.clone();
        }
        if let Some(model) = &self.model {
            config.oracle.ollama.model = model.clone();
        }
        if let Some(strategy) = self.strategy {
            config.oracle.strategy = strategy;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    let cli = Cli::parse();
    let config = cli.effective_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Combine { a, b } => {
            let resolver = config.build_resolver()?;
            let resolution = resolver.combine(&a, &b)?;
            match resolution.source {
                ResolutionSource::NonCombination => {
                    println!("{} + {} = nothing", resolution.a, resolution.b);
                }
                ResolutionSource::Discovered => {
                    println!(
                        "{} + {} = {} (new discovery)",
                        resolution.a, resolution.b, resolution.c
                    );
                }
                ResolutionSource::Stored => {
                    println!("{} + {} = {}", resolution.a, resolution.b, resolution.c);
                }
            }
        }

        Commands::Explore => {
            let store = config.open_store()?;
            let mut triples = store.all()?;
            triples.sort();
            let json = serde_json::to_string_pretty(&triples).into_diagnostic()?;
            println!("{json}");
        }

        Commands::Graph { format } => {
            let store = config.open_store()?;
            match format {
                GraphFormat::Json => {
                    let graph = export::export_graph(store.as_ref())?;
                    let json = serde_json::to_string_pretty(&graph).into_diagnostic()?;
                    println!("{json}");
                }
                GraphFormat::Dot => {
                    let mut triples = store.all()?;
                    triples.sort();
                    println!("{}", export::to_dot(&triples));
                }
            }
        }

        Commands::Lineage { element, max_depth } => {
            let store = config.open_store()?;
            let lineage = export::lineage(store.as_ref(), &element, max_depth)?;
            if lineage.triples.is_empty() {
                println!("\"{element}\" is not produced by any known combination.");
            } else {
                println!(
                    "\"{element}\" ({} step(s) back):",
                    lineage.depth_reached
                );
                for t in &lineage.triples {
                    println!("  {t}");
                }
            }
        }

        Commands::Seeds => {
            for seed in &config.seeds {
                println!("{seed}");
            }
        }

        Commands::Info => {
            let store = config.open_store()?;
            let oracle = OllamaOracle::new(config.oracle.ollama.clone());
            match config.resolved_data_dir()? {
                Some(dir) => println!("Data directory: {}", dir.display()),
                None => println!("Data directory: (memory only)"),
            }
            println!("Combinations:   {}", store.len()?);
            println!("Seeds:          {}", config.seeds.join(", "));
            println!(
                "Oracle:         {} at {} ({})",
                oracle.model(),
                config.oracle.ollama.base_url,
                if oracle.probe() { "reachable" } else { "unreachable" }
            );
            println!("Strategy:       {:?}", config.oracle.strategy);
        }

        Commands::Config => {
            print!("{}", config.to_toml()?);
        }

        Commands::Reset { yes } => {
            if !yes {
                miette::bail!("refusing to delete all combinations without --yes");
            }
            let store = config.open_store()?;
            let count = store.len()?;
            store.clear()?;
            println!("Removed {count} combination(s).");
        }
    }

    Ok(())
}
