//! Chisel CLI - batch front-end for the sculpting engine.
//!
//! Usage: chisel <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `chisel --help` for available commands. Set `RUST_LOG=debug` to see
//! per-tick and history events.

mod script;

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};

use chisel::config::SculptConfig;
use chisel::io;
use chisel::session::{DragLimits, Notice, Notifier, SculptSession};

use script::Script;

#[derive(Parser)]
#[command(name = "chisel")]
#[command(author, version, about = "Mesh sculpting CLI", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information and the derived drag limits
    Info {
        /// Input mesh file
        input: PathBuf,
    },

    /// Loop-subdivide a mesh
    Subdivide {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        /// Number of subdivision iterations (1 to 3)
        #[arg(short, long, default_value = "1")]
        iterations: usize,
    },

    /// Decimate (simplify) a mesh
    Decimate {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        /// Fraction of triangles to remove (0.05 to 0.90)
        #[arg(short, long, default_value = "0.5")]
        reduction: f64,
    },

    /// Replay a JSON gesture script against a mesh
    Replay {
        /// Input mesh file
        input: PathBuf,

        /// Gesture script
        script: PathBuf,

        /// Output mesh file
        output: PathBuf,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => SculptConfig::load(path)?,
        None => SculptConfig::default(),
    };

    match cli.command {
        Commands::Info { input } => cmd_info(&input)?,

        Commands::Subdivide {
            input,
            output,
            iterations,
        } => {
            let mut session = open_session(&input, config)?;
            println!("Applying Loop subdivision ({} iterations)...", iterations);
            let start = Instant::now();
            session.subdivide(iterations)?;
            finish(&session, &output, start)?;
        }

        Commands::Decimate {
            input,
            output,
            reduction,
        } => {
            let mut session = open_session(&input, config)?;
            println!("Decimating {:.0}% of faces...", reduction * 100.0);
            let start = Instant::now();
            session.decimate(reduction)?;
            finish(&session, &output, start)?;
        }

        Commands::Replay {
            input,
            script,
            output,
        } => {
            let script = Script::load(&script)?;
            let mut session = open_session(&input, config)?;
            println!("Replaying {} steps...", script.steps.len());
            let start = Instant::now();
            let summary = script.replay(&mut session, start)?;
            println!(
                "Applied {} ticks ({} steps failed)",
                summary.ticks, summary.failures
            );
            finish(&session, &output, start)?;
        }
    }

    Ok(())
}

fn open_session(input: &Path, config: SculptConfig) -> Result<SculptSession, Box<dyn std::error::Error>> {
    let mesh = io::load(input)?;
    let mut session = SculptSession::new(config).with_notifier(Notifier::new(|notice| {
        if let Notice::Status(text) = notice {
            println!("  {}", text);
        }
    }));
    session.load_mesh(mesh);
    Ok(session)
}

fn finish(session: &SculptSession, output: &Path, start: Instant) -> Result<(), Box<dyn std::error::Error>> {
    let elapsed = start.elapsed();
    let mesh = session.mesh().ok_or("no mesh loaded")?;
    println!("Result: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());
    io::save(mesh, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);
    Ok(())
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = io::load(input)?;

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Faces: {}", mesh.num_faces());
    println!("Half-edges: {}", mesh.num_halfedges());
    println!("Surface area: {:.6}", mesh.surface_area());

    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
        let size = max - min;
        println!("Dimensions: {:.3} x {:.3} x {:.3}", size.x, size.y, size.z);
    }

    let diagonal = mesh.bounding_diagonal();
    let limits = DragLimits::from_diagonal(diagonal);
    println!("Diagonal: {:.3}", diagonal);
    println!(
        "Drag limits: step {:.3}, inflate amount {:.3}",
        limits.max_step, limits.max_amount
    );

    let boundary = mesh
        .vertex_ids()
        .filter(|&v| mesh.is_boundary_vertex(v))
        .count();
    if boundary == 0 {
        println!("Topology: Closed (no boundary)");
    } else {
        println!("Topology: Open ({} boundary vertices)", boundary);
    }

    Ok(())
}
