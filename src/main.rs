use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use evolvattention::config::ConfigManager;
use evolvattention::engines::generation::ConsoleProgressCallback;
use evolvattention::SessionController;
use log::info;

/// Command-line arguments for evolvattention
#[derive(Parser, Debug)]
#[command(name = "evolvattention")]
#[command(about = "Evolve text toward the semantic barycenter of target strings")]
#[command(version)]
struct Args {
    /// TOML or JSON configuration file
    #[arg(short, long, global = true, env = "EVOLVATTENTION_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run an evolution session and print the best strings found
    Evolve {
        #[arg(short, long = "target", required = true)]
        targets: Vec<String>,

        #[arg(short, long)]
        population: Option<usize>,

        /// Generations per step
        #[arg(short, long)]
        steps: Option<usize>,

        /// Number of steps to run
        #[arg(short, long, default_value = "5")]
        rounds: usize,

        #[arg(short, long)]
        output_length: Option<usize>,

        #[arg(long)]
        seed: Option<u64>,
    },
    /// Score each word of a text against the targets' barycenter
    Analyze {
        #[arg(short, long = "target", required = true)]
        targets: Vec<String>,

        #[arg(long)]
        text: String,
    },
    /// Similarity of each string to the targets' barycenter
    Similarities {
        #[arg(short, long = "target", required = true)]
        targets: Vec<String>,

        strings: Vec<String>,
    },
    /// Print the configuration manifests
    Manifest,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    let manager = ConfigManager::new();
    if let Some(path) = &args.config {
        manager
            .load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    }

    match args.command {
        Command::Evolve {
            targets,
            population,
            steps,
            rounds,
            output_length,
            seed,
        } => {
            if seed.is_some() {
                manager.update(|config| config.evolution.seed = seed)?;
            }
            let config = manager.get();
            let session = SessionController::with_hashing_embedder(&config)?;

            let snapshot = session
                .initialize_evolution(
                    targets,
                    population.unwrap_or(config.evolution.population_size),
                    steps.unwrap_or(config.evolution.step_generations),
                    output_length.unwrap_or(config.evolution.output_length),
                )
                .context("Failed to initialize evolution")?;
            info!(
                "Generation {} best fitness {:.6}",
                snapshot.generation, snapshot.best_fitness
            );

            let mut progress = ConsoleProgressCallback;
            for _ in 0..rounds {
                session.step_evolution_with(&mut progress)?;
                if session.status()?.is_complete {
                    break;
                }
            }

            let status = session.status()?;
            println!("{}", serde_json::to_string_pretty(&status)?);
            println!("{}", serde_json::to_string_pretty(&session.hall_of_fame()?)?);
        }
        Command::Analyze { targets, text } => {
            let session = SessionController::with_hashing_embedder(&manager.get())?;
            session.set_barycenter(targets)?;
            let report = session.analyze_attention(&text)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Similarities { targets, strings } => {
            let session = SessionController::with_hashing_embedder(&manager.get())?;
            session.set_barycenter(targets)?;
            for (text, score) in strings.iter().zip(session.similarities(&strings)?) {
                println!("{:.6}\t{}", score, text);
            }
        }
        Command::Manifest => {
            println!("{}", serde_json::to_string_pretty(&manager.manifests())?);
        }
    }

    Ok(())
}
