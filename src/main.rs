//! Orrery CLI - render and simulate schema-galaxy scenes.

use anyhow::{Context, Result};
use clap::Parser;
use orrery::config::OrreryConfig;
use orrery::layout;
use orrery::metrics::{ColumnValue, GraphSnapshot, SchemaGraph};
use orrery::render::SvgRenderer;
use orrery::scene::{Command, Scene};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "orrery")]
#[command(about = "Render a database schema graph as a living galaxy")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(long, default_value = "orrery.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Render one SVG snapshot of the galaxy
    Render {
        /// Graph snapshot JSON; sample data when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Seed for sample data
        #[arg(short = 'S', long, default_value = "42")]
        seed: u64,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Width of the output
        #[arg(long)]
        width: Option<u32>,

        /// Height of the output
        #[arg(long)]
        height: Option<u32>,

        /// Focus the camera on a table before rendering
        #[arg(long)]
        highlight: Option<String>,
    },

    /// Render a column drill-in from a JSON map of row id to value
    Drill {
        /// JSON object: {"row_id": value, ...}
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Step the animation loop and report what happened
    Simulate {
        /// Graph snapshot JSON; sample data when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Seed for sample data
        #[arg(short = 'S', long, default_value = "42")]
        seed: u64,

        /// Number of frames to step
        #[arg(short, long, default_value = "600")]
        frames: usize,

        /// Throughput (TPS) driving the particle flow
        #[arg(short, long, default_value = "50.0")]
        throughput: f64,

        /// Hover a table for the whole run
        #[arg(long)]
        hover: Option<String>,

        /// Write an SVG frame every N frames
        #[arg(long)]
        dump_every: Option<usize>,
    },

    /// Render one seed at several sizes for comparison
    Showcase {
        /// Output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Seed for consistent results
        #[arg(short = 'S', long, default_value = "42")]
        seed: u64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("orrery=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let config = OrreryConfig::load(Path::new(&cli.config))?;

    match cli.command {
        Commands::Render {
            input,
            seed,
            output,
            width,
            height,
            highlight,
        } => {
            let graph = load_graph(input.as_deref(), seed)?;
            let width = width.unwrap_or(config.output.width);
            let height = height.unwrap_or(config.output.height);
            println!(
                "Rendering {} tables, {} relationships...",
                graph.nodes.len(),
                graph.edges.len()
            );

            let output_dir = PathBuf::from(&config.output.directory);
            let mut scene = Scene::new(graph, config);
            if let Some(key) = highlight {
                scene.dispatch(Command::HighlightNode(key));
            }
            // settle highlight smoothing and finish any camera move
            for _ in 0..120 {
                scene.update(1.0 / 60.0);
            }

            let svg = SvgRenderer::new(width, height).render(&scene);
            fs::create_dir_all(&output_dir)?;
            let output_path =
                output.unwrap_or_else(|| output_dir.join(format!("orrery_{seed}.svg")));
            fs::write(&output_path, &svg)?;
            println!("Saved to {}", output_path.display());
        }

        Commands::Drill { input, output } => {
            let raw = fs::read_to_string(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            let values = parse_column(&raw)?;
            println!("Profiling {} column values...", values.len());

            let points = layout::radial_points(&values);
            let svg =
                SvgRenderer::new(config.output.width, config.output.height).render_drill(&points);

            let output_dir = PathBuf::from(&config.output.directory);
            fs::create_dir_all(&output_dir)?;
            let output_path = output.unwrap_or_else(|| output_dir.join("drill.svg"));
            fs::write(&output_path, &svg)?;
            println!("Saved to {}", output_path.display());
        }

        Commands::Simulate {
            input,
            seed,
            frames,
            throughput,
            hover,
            dump_every,
        } => {
            let graph = load_graph(input.as_deref(), seed)?;
            println!(
                "Simulating {} frames over {} tables...",
                frames,
                graph.nodes.len()
            );

            let output_dir = PathBuf::from(&config.output.directory);
            let (width, height) = (config.output.width, config.output.height);
            let mut scene = Scene::new(graph, config);
            scene.dispatch(Command::StartFlow);
            scene.dispatch(Command::SetThroughput(throughput));
            if let Some(key) = hover {
                scene.dispatch(Command::Hover(Some(key)));
            }

            let renderer = SvgRenderer::new(width, height);
            for frame in 0..frames {
                scene.update(1.0 / 60.0);

                if let Some(every) = dump_every {
                    if every > 0 && frame % every == 0 {
                        fs::create_dir_all(&output_dir)?;
                        let path = output_dir.join(format!("frame_{frame:05}.svg"));
                        fs::write(&path, renderer.render(&scene))?;
                    }
                }
            }

            let spawned = scene.spawn_tally();
            println!("\nFlow:");
            println!("  Normal particles:       {}", spawned[0]);
            println!("  High-traffic particles: {}", spawned[1]);
            println!("  Anomaly particles:      {}", spawned[2]);
            println!("  In flight at end:       {}", scene.particles.len());
            println!(
                "\nCamera at ({:.0}, {:.0}, {:.0}) after {:.1}s",
                scene.camera.position.x,
                scene.camera.position.y,
                scene.camera.position.z,
                scene.time()
            );
        }

        Commands::Showcase { output_dir, seed } => {
            let output_dir = output_dir
                .unwrap_or_else(|| PathBuf::from(&config.output.directory).join("showcase"));
            fs::create_dir_all(&output_dir)?;

            let graph = SchemaGraph::sample(seed);
            println!("Generating showcase with seed {seed}...");
            println!(
                "  {} tables, {} relationships",
                graph.nodes.len(),
                graph.edges.len()
            );

            let mut scene = Scene::new(graph, config);
            for _ in 0..120 {
                scene.update(1.0 / 60.0);
            }

            let sizes: [(u32, u32, &str); 3] =
                [(800, 600, "sm"), (1600, 1200, "lg"), (3200, 2400, "xl")];
            for (width, height, label) in sizes {
                let svg = SvgRenderer::new(width, height).render(&scene);
                let filename = format!("galaxy_{label}.svg");
                fs::write(output_dir.join(&filename), &svg)?;
                println!("  Created {filename}");
            }

            println!("Done! Showcase saved to {}", output_dir.display());
        }
    }

    Ok(())
}

fn load_graph(input: Option<&Path>, seed: u64) -> Result<SchemaGraph> {
    match input {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let snapshot = GraphSnapshot::from_json(&raw)?;
            Ok(SchemaGraph::from_snapshot(snapshot))
        }
        None => Ok(SchemaGraph::sample(seed)),
    }
}

fn parse_column(raw: &str) -> Result<Vec<(String, ColumnValue)>> {
    let map: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(raw).context("drill input must be a JSON object")?;

    let mut values = Vec::with_capacity(map.len());
    for (row_id, value) in map {
        let value = match value {
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => ColumnValue::Number(f),
                None => continue,
            },
            serde_json::Value::String(s) => ColumnValue::Text(s),
            serde_json::Value::Bool(b) => ColumnValue::Text(b.to_string()),
            _ => {
                tracing::warn!(%row_id, "skipping non-scalar column value");
                continue;
            }
        };
        values.push((row_id, value));
    }
    values.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(values)
}
