//! CLI utility for the navgraph engine

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use glam::Vec3;
use std::path::PathBuf;

use navgraph::{ClearTrace, NavEngine, Phase};

/// A CLI utility for navigation mesh inspection and pathfinding
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print header and area statistics for a mesh file
    Info {
        /// Input navigation mesh file
        #[clap(value_parser)]
        mesh: PathBuf,
    },

    /// Find a path between two positions on a mesh
    Path {
        /// Input navigation mesh file
        #[clap(value_parser)]
        mesh: PathBuf,

        /// Start position (x,y,z)
        #[clap(long, value_parser = parse_vector)]
        start: Vec3,

        /// Goal position (x,y,z)
        #[clap(long, value_parser = parse_vector)]
        goal: Vec3,

        /// Run cost annotation to completion before the query
        #[clap(long)]
        process: bool,
    },

    /// Run cost annotation to completion and print convergence stats
    Process {
        /// Input navigation mesh file
        #[clap(value_parser)]
        mesh: PathBuf,

        /// Abort after this many steps
        #[clap(long, default_value = "100000")]
        max_steps: usize,
    },
}

/// Parse a comma-separated vector
fn parse_vector(s: &str) -> Result<Vec3, String> {
    let parts: Vec<&str> = s.split(',').collect();

    if parts.len() != 3 {
        return Err(format!("Vector must have 3 components, got {}", parts.len()));
    }

    let x = parts[0].parse::<f32>().map_err(|e| e.to_string())?;
    let y = parts[1].parse::<f32>().map_err(|e| e.to_string())?;
    let z = parts[2].parse::<f32>().map_err(|e| e.to_string())?;

    Ok(Vec3::new(x, y, z))
}

fn load_engine(mesh: &PathBuf) -> Result<NavEngine> {
    let mut engine = NavEngine::with_defaults();
    engine
        .load_file(mesh)
        .with_context(|| format!("failed to load mesh {}", mesh.display()))?;
    Ok(engine)
}

/// Steps the processor with a permissive probe until it reaches idle
fn process_to_idle(engine: &mut NavEngine, max_steps: usize) -> Result<usize> {
    let probe = ClearTrace;
    let target = engine.profile().target_fps;
    let mut steps = 0;
    while engine.processing_phase() != Phase::Idle {
        engine.tick(target, &probe);
        steps += 1;
        if steps >= max_steps {
            return Err(anyhow!("processing did not converge within {max_steps} steps"));
        }
    }
    Ok(steps)
}

fn cmd_info(mesh: PathBuf) -> Result<()> {
    let engine = load_engine(&mesh)?;
    let graph = engine
        .graph()
        .ok_or_else(|| anyhow!("no graph published"))?;

    let mut connections = 0usize;
    let mut doors = 0usize;
    let mut boosts = 0usize;
    let mut drops = 0usize;
    for area in graph.iter() {
        for conn in area.all_connections() {
            connections += 1;
            if conn.door.is_some() {
                doors += 1;
            }
            if conn.needs_boost {
                boosts += 1;
            }
            if conn.one_way_drop {
                drops += 1;
            }
        }
    }

    println!("mesh:        {}", mesh.display());
    println!("areas:       {}", graph.len());
    println!("connections: {connections}");
    println!("doors:       {doors}");
    println!("boosts:      {boosts}");
    println!("drops:       {drops}");
    Ok(())
}

fn cmd_path(mesh: PathBuf, start: Vec3, goal: Vec3, process: bool) -> Result<()> {
    let mut engine = load_engine(&mesh)?;
    if process {
        process_to_idle(&mut engine, 100_000)?;
    }

    let path = engine
        .find_path(start, goal)
        .ok_or_else(|| anyhow!("no path between {start} and {goal}"))?;

    let areas: Vec<_> = path.areas().collect();
    println!("path through {} areas:", areas.len());
    for id in &areas {
        println!("  {id}");
    }
    Ok(())
}

fn cmd_process(mesh: PathBuf, max_steps: usize) -> Result<()> {
    let mut engine = load_engine(&mesh)?;
    let steps = process_to_idle(&mut engine, max_steps)?;
    let status = engine.processor_status();
    println!("converged in {steps} steps");
    println!("items processed: {}", status.processed);
    println!("final batch:     {}", status.batch);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Commands::Info { mesh } => cmd_info(mesh),
        Commands::Path {
            mesh,
            start,
            goal,
            process,
        } => cmd_path(mesh, start, goal, process),
        Commands::Process { mesh, max_steps } => cmd_process(mesh, max_steps),
    }
}
