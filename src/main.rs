use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use interaction_graph::export::{to_dot, RenderDocument, LAYOUT_OPTIONS};
use interaction_graph::generate::{random_geometric_graph, random_interactions, sample_edges, sample_nodes};
use interaction_graph::graph::BETWEENNESS;
use interaction_graph::table::{read_records, write_records};
use interaction_graph::{Graph, Partition, Record, ViewConfig};

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Cytoscape,
    Dot,
}

#[derive(clap::Args)]
struct Input {
    /// Node table (CSV with at least an `id` column)
    #[clap(long)]
    nodes: PathBuf,
    /// Edge table (CSV with `source`, `target`, `weight`)
    #[clap(long)]
    edges: PathBuf,
    /// YAML view configuration
    #[clap(short, long)]
    config: Option<PathBuf>,
    /// Treat edges as directed, overriding the configuration
    #[clap(long, conflicts_with = "undirected")]
    directed: bool,
    /// Treat edges as undirected, overriding the configuration
    #[clap(long)]
    undirected: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build, annotate and filter a graph, then export it for a renderer
    Render {
        #[clap(flatten)]
        input: Input,
        #[clap(long)]
        min_weight: Option<f64>,
        #[clap(long)]
        min_total: Option<f64>,
        /// Restrict the output to this node and its neighbours
        #[clap(long)]
        focus: Option<String>,
        #[clap(long)]
        layout: Option<String>,
        #[clap(short, long, value_enum, default_value = "cytoscape")]
        format: Format,
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
    /// Print node, edge and community statistics
    Stats {
        #[clap(flatten)]
        input: Input,
        #[clap(long, default_value = "5")]
        top: usize,
    },
    /// Write the five-node sample dataset
    Sample {
        #[clap(short, long, default_value = ".")]
        dir: PathBuf,
    },
    /// Write a seeded random geometric graph
    Geometric {
        #[clap(short, long, default_value = ".")]
        dir: PathBuf,
        #[clap(short, long, default_value = "200")]
        nodes: usize,
        #[clap(short, long, default_value = "0.125")]
        radius: f64,
        #[clap(short, long, default_value = "42")]
        seed: u64,
    },
    /// Write a seeded random interaction log
    Interactions {
        #[clap(short, long, default_value = ".")]
        dir: PathBuf,
        #[clap(short, long, default_value = "140")]
        users: usize,
        #[clap(short, long, default_value = "500")]
        count: usize,
        #[clap(short, long, default_value = "42")]
        seed: u64,
    },
}

fn main() -> Result<()> {
    let args = Cli::parse();
    setup_logging(&args.log_level);

    match args.command {
        Commands::Render {
            input,
            min_weight,
            min_total,
            focus,
            layout,
            format,
            output,
        } => {
            let mut config = load_config(&input)?;
            if min_weight.is_some() {
                config.filters.min_edge_weight = min_weight;
            }
            if min_total.is_some() {
                config.filters.min_total_interactions = min_total;
            }
            if focus.is_some() {
                config.focus = focus;
            }
            if let Some(layout) = layout {
                config.layout = layout;
            }
            if !LAYOUT_OPTIONS.contains(&config.layout.as_str()) {
                anyhow::bail!(
                    "Unknown layout '{}', expected one of: {}",
                    config.layout,
                    LAYOUT_OPTIONS.join(", ")
                );
            }
            render(&input, &config, format, output.as_deref())
        }
        Commands::Stats { input, top } => {
            let config = load_config(&input)?;
            stats(&input, &config, top)
        }
        Commands::Sample { dir } => write_dataset(&dir, &sample_nodes(), &sample_edges()),
        Commands::Geometric {
            dir,
            nodes,
            radius,
            seed,
        } => {
            let (nodes, edges) = random_geometric_graph(nodes, radius, seed);
            write_dataset(&dir, &nodes, &edges)
        }
        Commands::Interactions {
            dir,
            users,
            count,
            seed,
        } => {
            let (nodes, edges) = random_interactions(users, count, seed);
            write_dataset(&dir, &nodes, &edges)
        }
    }
}

fn load_config(input: &Input) -> Result<ViewConfig> {
    let mut config = match &input.config {
        Some(path) => ViewConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ViewConfig::default(),
    };
    if input.directed {
        config.directed = true;
    } else if input.undirected {
        config.directed = false;
    }
    Ok(config)
}

fn load_graph(input: &Input, config: &ViewConfig) -> Result<(Graph, Partition)> {
    let nodes = read_records(&input.nodes)
        .with_context(|| format!("Failed to read nodes {}", input.nodes.display()))?;
    let edges = read_records(&input.edges)
        .with_context(|| format!("Failed to read edges {}", input.edges.display()))?;
    let builder = config.builder();
    let graph = builder.build(&nodes, &edges, config.directed)?;
    Ok(builder.annotate_all(graph))
}

fn render(input: &Input, config: &ViewConfig, format: Format, output: Option<&Path>) -> Result<()> {
    let (graph, partition) = load_graph(input, config)?;

    let view = match &config.focus {
        Some(focus) => graph.filter_by_neighborhood(focus)?,
        None => graph.apply_filters(&config.filters),
    };
    info!(
        "{} of {} nodes displayed after filtering",
        view.node_count(),
        graph.node_count()
    );
    if let Some(focus) = &config.focus {
        let summary = graph.neighborhood_summary(focus)?;
        info!(
            "{} interacts with {} nodes ({}%) of {}",
            summary.focus,
            summary.node_count,
            summary.share_percent,
            graph.node_count()
        );
    }

    let text = match format {
        Format::Cytoscape => {
            RenderDocument::new(&view, &partition, &config.layout, BETWEENNESS).to_json()?
        }
        Format::Dot => to_dot(&view),
    };

    match output {
        Some(path) => {
            fs::write(path, text)?;
            info!("Wrote {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn stats(input: &Input, config: &ViewConfig, top: usize) -> Result<()> {
    let (graph, partition) = load_graph(input, config)?;

    println!("{}", graph.stats());
    println!(
        "Detected {} communities (modularity {:.4}):",
        partition.len(),
        partition.modularity
    );
    for (id, members) in partition.iter().enumerate() {
        println!("Community {} ({} members)", id, members.len());
    }

    let mut ranked: Vec<_> = graph
        .nodes()
        .filter_map(|n| n.betweenness().map(|b| (n, b)))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    println!("Top {} by betweenness:", top);
    for (node, score) in ranked.into_iter().take(top) {
        println!(
            "  {} ({}): {:.4}, total interactions {}",
            node.label,
            node.id,
            score,
            node.total_interactions().unwrap_or(0.0)
        );
    }
    Ok(())
}

fn write_dataset(dir: &Path, nodes: &[Record], edges: &[Record]) -> Result<()> {
    fs::create_dir_all(dir)?;
    let nodes_path = dir.join("nodes.csv");
    let edges_path = dir.join("edges.csv");
    write_records(&nodes_path, nodes)?;
    write_records(&edges_path, edges)?;
    info!(
        "Wrote {} nodes to {} and {} edges to {}",
        nodes.len(),
        nodes_path.display(),
        edges.len(),
        edges_path.display()
    );
    Ok(())
}

fn setup_logging(log_level: &Option<String>) {
    let log_level = match log_level
        .as_ref()
        .unwrap_or(&"info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level.to_string()))
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input_with(config: &Path, flags: &[&str]) -> Input {
        let mut args = vec!["interaction-graph", "stats", "--nodes", "n.csv", "--edges", "e.csv"];
        let config = config.to_str().unwrap();
        args.extend(["--config", config]);
        args.extend(flags);
        match Cli::parse_from(args).command {
            Commands::Stats { input, .. } => input,
            _ => unreachable!(),
        }
    }

    #[test]
    fn direction_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("view.yaml");
        fs::write(&path, "directed: true\n").unwrap();

        assert!(load_config(&input_with(&path, &[])).unwrap().directed);
        assert!(!load_config(&input_with(&path, &["--undirected"])).unwrap().directed);

        fs::write(&path, "directed: false\n").unwrap();
        assert!(load_config(&input_with(&path, &["--directed"])).unwrap().directed);
    }

    #[test]
    fn direction_flags_conflict() {
        let args = [
            "interaction-graph", "stats", "--nodes", "n.csv", "--edges", "e.csv",
            "--directed", "--undirected",
        ];
        assert!(Cli::try_parse_from(args).is_err());
    }
}
