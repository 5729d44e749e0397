mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result};
use tracing_subscriber::EnvFilter;
use trellis_core::config::PROJECT_CONFIG_FILE;
use trellis_core::query::build_path;
use trellis_core::spec::EvidenceSpec;
use trellis_core::{
    Config, EdgeFilter, EdgeKind, GraphError, GraphSnapshot, NodeId, Subject, SubjectType,
    SurrealBackend, TrellisGraph,
};

#[derive(Parser)]
#[command(name = "trellis")]
#[command(about = "Query a supply-chain knowledge graph", long_about = None)]
struct Cli {
    /// Load the graph from a JSON snapshot instead of the configured store
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Config file to use instead of the default search path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show everything known about a package, source or artifact
    Known {
        /// Subject type: package, source or artifact
        subject_type: SubjectType,
        /// purl, VCS URL or algorithm:digest
        subject: String,
    },
    /// List the evidence attached to a node
    Neighbors {
        id: String,
        /// Restrict to these evidence kinds
        #[arg(long = "kind")]
        kinds: Vec<EdgeKind>,
    },
    /// Find the shortest route between two nodes
    Path {
        from: String,
        to: String,
        #[arg(long)]
        max_length: Option<usize>,
        /// Only traverse these evidence kinds
        #[arg(long = "kind")]
        kinds: Vec<EdgeKind>,
    },
    /// Search evidence records
    Search {
        #[arg(long = "kind")]
        kinds: Vec<EdgeKind>,
        #[arg(long)]
        origin: Option<String>,
        #[arg(long)]
        collector: Option<String>,
        #[arg(long)]
        justification: Option<String>,
    },
    /// Import a JSON snapshot into the configured SurrealDB store
    Import { file: PathBuf },
    /// Write a default trellis.toml to the current directory
    InitConfig,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trellis=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}

#[tokio::main]
async fn main() {
    let _ = color_eyre::install();
    init_logging();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("Error: {:?}", err);
        std::process::exit(exit_code(&err));
    }
}

fn exit_code(err: &color_eyre::Report) -> i32 {
    match err.downcast_ref::<GraphError>() {
        Some(GraphError::MalformedIdentity { .. }) => 2,
        Some(GraphError::NotFound(_)) => 3,
        Some(GraphError::AmbiguousSubject { .. }) => 4,
        _ => 1,
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    Ok(match path {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    })
}

fn filter_from(kinds: Vec<EdgeKind>) -> EdgeFilter {
    if kinds.is_empty() {
        EdgeFilter::all()
    } else {
        EdgeFilter::only(kinds)
    }
}

async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::InitConfig => {
            if std::path::Path::new(PROJECT_CONFIG_FILE).exists() {
                return Err(eyre!("{} already exists", PROJECT_CONFIG_FILE));
            }
            std::fs::write(PROJECT_CONFIG_FILE, Config::default_config_string())?;
            println!("Wrote {}", PROJECT_CONFIG_FILE);
            return Ok(());
        }
        Commands::Import { file } => {
            let config = load_config(cli.config.as_ref())?;
            let snapshot = GraphSnapshot::from_file(file)?;
            let store = SurrealBackend::from_config(&config.backend).await?;
            let stats = store.import(&snapshot).await?;
            println!(
                "Imported {} entities and {} evidence records ({} already present)",
                stats.entities, stats.evidence, stats.skipped
            );
            return Ok(());
        }
        _ => {}
    }

    let config = load_config(cli.config.as_ref())?;
    let graph = TrellisGraph::open(&config, cli.snapshot.as_deref()).await?;
    let ctx = graph.context();
    let viz = &config.visualizer;

    match cli.command {
        Commands::Known {
            subject_type,
            subject,
        } => {
            let subject = Subject::parse(subject_type, &subject)?;
            let report = graph.known(&ctx, &subject).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_known(&report, viz);
            }
        }
        Commands::Neighbors { id, kinds } => {
            let id = NodeId::from(id);
            let neighbors = graph.neighbors(&ctx, &id, &filter_from(kinds)).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&neighbors)?);
            } else {
                output::print_neighbors(&neighbors);
                output::print_visualizer(viz, &build_path(&[id], &neighbors.path));
            }
        }
        Commands::Path {
            from,
            to,
            max_length,
            kinds,
        } => {
            let route = graph
                .find_route(
                    &ctx,
                    &NodeId::from(from),
                    &NodeId::from(to),
                    max_length,
                    &filter_from(kinds),
                )
                .await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&route)?);
            } else {
                output::print_nodes(&route);
                let ids: Vec<NodeId> = route.iter().filter_map(|n| n.leaf_id().cloned()).collect();
                output::print_visualizer(viz, &ids);
            }
        }
        Commands::Search {
            kinds,
            origin,
            collector,
            justification,
        } => {
            let spec = EvidenceSpec {
                kinds,
                origin,
                collector,
                justification,
                ..Default::default()
            };
            let found = graph.search(&ctx, &spec).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&found)?);
            } else {
                output::print_nodes(&found);
            }
        }
        Commands::Import { .. } | Commands::InitConfig => {}
    }
    Ok(())
}
