//! Command line surface.

use crate::datastr::graph::NodeId;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "alt-routing", about = "Alternative routes on road network graphs via the penalty method with CH potentials")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Solve alternative route queries and write a JSON result log
    Run(RunArgs),
    /// Generate source/target query vectors
    Generate(GenerateArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Graph directory (first_out/head/weight, optionally a ch/ subdirectory)
    #[arg(short, long)]
    pub input: PathBuf,
    /// Output directory for the result log
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,
    /// Source node id
    #[arg(short, long)]
    pub source: Option<NodeId>,
    /// Target node id
    #[arg(short, long)]
    pub target: Option<NodeId>,
    /// Source vector file, overrides --source
    #[arg(long)]
    pub source_vector: Option<PathBuf>,
    /// Target vector file, overrides --target
    #[arg(long)]
    pub target_vector: Option<PathBuf>,
    /// Dijkstra rank vector matching the source/target vectors
    #[arg(long)]
    pub rank_vector: Option<PathBuf>,
    /// Rejoin penalty factor
    #[arg(long, default_value_t = 0.5)]
    pub alpha: f64,
    /// Accepted stretch in the penalty loop
    #[arg(long, default_value_t = 0.1)]
    pub eps: f64,
    /// Edge penalty factor
    #[arg(long, default_value_t = 0.04)]
    pub pen: f64,
    /// Name of the result log, without extension
    #[arg(long, default_value = "log")]
    pub logname: String,
    /// Evaluate stretch, sharing and local optimality per alternative (slow)
    #[arg(short, long)]
    pub quality: bool,
}

#[derive(Args)]
pub struct GenerateArgs {
    #[command(subcommand)]
    pub mode: GenerateMode,
}

#[derive(Subcommand)]
pub enum GenerateMode {
    /// Uniformly random source/target pairs
    Random {
        /// Graph directory
        #[arg(short, long)]
        input: PathBuf,
        /// Directory the vectors are written to
        #[arg(short, long)]
        output: PathBuf,
        /// Number of pairs
        #[arg(long)]
        limit: u32,
    },
    /// Dijkstra-rank sampled targets for one or more sources
    Rank {
        /// Graph directory
        #[arg(short, long)]
        input: PathBuf,
        /// Directory the vectors are written to
        #[arg(short, long)]
        output: PathBuf,
        /// Single source node id
        #[arg(short, long)]
        source: Option<NodeId>,
        /// Source vector file, overrides --source
        #[arg(long)]
        source_vector: Option<PathBuf>,
        /// Use at most this many sources from the vector
        #[arg(long)]
        limit: Option<u32>,
        /// Skip targets below this rank index
        #[arg(long, default_value_t = 0)]
        min_rank: u32,
    },
}
