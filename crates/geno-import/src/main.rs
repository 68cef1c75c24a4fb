//! CLI entry point for the geno graph importer.
//!
//! Reads a graph export, derives identity from the target database's
//! constraints, and upserts every node and relationship.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use geno_core::adapter::PetgraphView;
use geno_core::{Constraints, GenoConfig, Graph, ImportReport, Importer, WriteMode};
use geno_graph::{GraphClient, GraphConfig};

#[derive(Parser, Debug)]
#[command(name = "geno")]
#[command(about = "Constraint-aware graph importer for Neo4j")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: geno).
    #[arg(short, long, default_value = "geno", global = true)]
    config: String,

    /// Target database.
    #[arg(short, long, global = true)]
    database: Option<String>,

    /// Neo4j server as host:port.
    #[arg(short, long, global = true)]
    server: Option<String>,

    /// Neo4j username.
    #[arg(short, long, global = true)]
    username: Option<String>,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a graph into the database.
    Import {
        #[command(subcommand)]
        source: ImportSource,
    },
    /// Print the constraint catalog used for the database.
    Constraints {
        /// Read constraints from the live database instead of configuration.
        #[arg(short = 'r', long)]
        refresh_constraints: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ImportSource {
    /// Import a JSON graph export ({"nodes": [...], "rels": [...]}).
    Json {
        /// Path to the export file.
        #[arg(short, long, alias = "filepath")]
        file: PathBuf,

        /// Read constraints from the live database instead of configuration.
        #[arg(short = 'r', long)]
        refresh_constraints: bool,

        /// CREATE every entity instead of merging on identity.
        #[arg(long)]
        create: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let mut config = GenoConfig::load(&cli.config)?;
    apply_overrides(&cli, &mut config);

    match &cli.command {
        Command::Import {
            source:
                ImportSource::Json {
                    file,
                    refresh_constraints,
                    create,
                },
        } => {
            let raw = tokio::fs::read(file).await?;
            let graph = Graph::from_slice(&raw)?;
            log_graph_summary(&graph);

            config.validate()?;
            let client = connect(&config).await?;
            let catalog = resolve_catalog(&client, &config, *refresh_constraints).await?;

            let mode = if *create {
                WriteMode::Create
            } else {
                WriteMode::Merge
            };
            let report = Importer::new(&client, &catalog, config.database.as_str())
                .with_mode(mode)
                .run(&graph)
                .await?;
            log_report(&report);
        }
        Command::Constraints {
            refresh_constraints,
        } => {
            let catalog = if *refresh_constraints {
                config.validate()?;
                let client = connect(&config).await?;
                resolve_catalog(&client, &config, true).await?
            } else {
                config.constraints_for(&config.database)
            };
            println!("{catalog}");
        }
    }

    Ok(())
}

/// Command-line flags take precedence over file and environment.
fn apply_overrides(cli: &Cli, config: &mut GenoConfig) {
    if let Some(database) = &cli.database {
        config.database = database.clone();
    }
    if let Some(server) = &cli.server {
        config.neo4j.server = server.clone();
    }
    if let Some(username) = &cli.username {
        config.neo4j.user = username.clone();
    }
}

async fn connect(config: &GenoConfig) -> anyhow::Result<GraphClient> {
    let graph_config = GraphConfig::from_settings(&config.neo4j, &config.database);
    Ok(GraphClient::connect(&graph_config).await?)
}

async fn resolve_catalog(
    client: &GraphClient,
    config: &GenoConfig,
    refresh: bool,
) -> anyhow::Result<Constraints> {
    if refresh {
        return Ok(client.fetch_constraints(&config.database).await?);
    }
    let catalog = config.constraints_for(&config.database);
    if catalog.is_empty() {
        tracing::warn!(
            database = %config.database,
            "No configured constraints; entities merge on labels only"
        );
    }
    Ok(catalog)
}

fn log_graph_summary(graph: &Graph) {
    let view = PetgraphView::new(graph);
    tracing::info!(
        nodes = view.node_count(),
        relationships = view.edge_count(),
        components = view.component_count(),
        "Loaded graph"
    );
}

fn log_report(report: &ImportReport) {
    for (label, tally) in &report.nodes {
        tracing::info!(
            label = %label,
            found = tally.found,
            created = tally.created,
            "Node report"
        );
    }
    for (rel_type, tally) in &report.relationships {
        tracing::info!(
            rel_type = %rel_type,
            found = tally.found,
            created = tally.created,
            "Relationship report"
        );
    }
    let elapsed_ms = report
        .finished_at
        .map(|end| (end - report.started_at).num_milliseconds())
        .unwrap_or_default();
    tracing::info!(
        run_id = %report.run_id,
        database = %report.database,
        nodes_created = report.totals.nodes_created,
        relationships_created = report.totals.relationships_created,
        elapsed_ms,
        "Import complete"
    );
}
