use alt_routing::{
    algo::{
        contraction::{contract_bottom_up, ContractionHierarchy},
        penalty::{PenaltyService, PenaltySettings},
        xbdv::{XbdvService, DEFAULT_ALPHA, DEFAULT_EPS, DEFAULT_GAMMA},
    },
    cli::{Cli, Command, GenerateArgs, GenerateMode, RunArgs},
    datastr::graph::*,
    experiments,
    io::*,
    report::*,
};
use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run(args),
        Command::Generate(args) => generate(args),
    }
}

fn load_graph_and_ch(input: &std::path::Path) -> Result<(AdjacencyGraph, ContractionHierarchy)> {
    let graph = AdjacencyGraph::reconstruct_from(input).with_context(|| format!("loading graph from {}", input.display()))?;
    info!("graph: {} nodes, {} arcs", graph.num_nodes(), graph.num_arcs());

    let ch_dir = input.join("ch");
    let ch = if ch_dir.is_dir() {
        ContractionHierarchy::reconstruct_from(&ch_dir).with_context(|| format!("loading contraction hierarchy from {}", ch_dir.display()))?
    } else {
        info!("no ch/ subdirectory, contracting bottom-up by edge difference");
        let (ch, duration) = measure(|| contract_bottom_up(&graph));
        info!("contraction done after {}ms", duration.as_millis());
        ch
    };
    if ch.order.len() != graph.num_nodes() {
        bail!("contraction hierarchy does not match the graph size");
    }
    Ok((graph, ch))
}

fn run(args: RunArgs) -> Result<()> {
    let (graph, ch) = load_graph_and_ch(&args.input)?;

    let (sources, targets, ranks) = if let (Some(sv), Some(tv)) = (&args.source_vector, &args.target_vector) {
        let sources: Vec<NodeId> = Vec::load_from(sv).with_context(|| format!("loading {}", sv.display()))?;
        let targets: Vec<NodeId> = Vec::load_from(tv).with_context(|| format!("loading {}", tv.display()))?;
        if sources.len() != targets.len() {
            bail!("source and target vector are not of equal length");
        }
        let ranks: Vec<u32> = match &args.rank_vector {
            Some(rv) => Vec::load_from(rv).with_context(|| format!("loading {}", rv.display()))?,
            None => vec![0; sources.len()],
        };
        if sources.len() != ranks.len() {
            bail!("source and rank vector are not of equal length");
        }
        (sources, targets, ranks)
    } else if let (Some(source), Some(target)) = (args.source, args.target) {
        (vec![source], vec![target], vec![0])
    } else {
        bail!("need either --source and --target or --source-vector and --target-vector");
    };
    if let Some(&node) = sources.iter().chain(targets.iter()).find(|&&node| node as usize >= graph.num_nodes()) {
        bail!("node id {} out of range", node);
    }

    let settings = PenaltySettings {
        penalty_factor: args.pen,
        alpha: args.alpha,
        eps: args.eps,
        ..Default::default()
    };
    let mut penalty = PenaltyService::new(&graph, &ch, settings);

    let mut log = RunLog::default();
    for ((&source, &target), &rank) in sources.iter().zip(targets.iter()).zip(ranks.iter()) {
        info!("running query: source = {}, target = {}, rank = {}", source, target, rank);
        let mut case = CaseReport {
            source,
            target,
            rank,
            ..Default::default()
        };

        let total = Timer::new();
        penalty.run(source, target, &mut case);
        case.total_time = total.passed_ms();

        let extraction = Timer::new();
        let paths = XbdvService::new(penalty.alt_graph()).alternatives(source, target, false, DEFAULT_ALPHA, DEFAULT_EPS, DEFAULT_GAMMA);
        case.path_extraction_time = extraction.passed_ms();

        for path in &paths {
            case.alt_paths.push(if args.quality {
                experiments::path_quality(&graph, &ch, path)
            } else {
                AltPathReport {
                    length: path.length,
                    ..Default::default()
                }
            });
        }
        info!("found {} alternatives in {} iterations", paths.len(), case.iterations.len());

        penalty.reset();
        log.tests.cases.push(case);
    }

    let log_path = args.output.join(format!("{}.json", args.logname));
    let json = serde_json::to_string_pretty(&log)?;
    std::fs::write(&log_path, json).with_context(|| format!("writing {}", log_path.display()))?;
    info!("results written to {}", log_path.display());
    Ok(())
}

fn generate(args: GenerateArgs) -> Result<()> {
    match args.mode {
        GenerateMode::Random { input, output, limit } => {
            let graph = AdjacencyGraph::reconstruct_from(&input).with_context(|| format!("loading graph from {}", input.display()))?;
            let mut rng = rand::thread_rng();
            let (sources, targets) = experiments::random_pairs(&mut rng, limit, graph.num_nodes());
            sources.write_to(output.join("source")).context("writing source vector")?;
            targets.write_to(output.join("target")).context("writing target vector")?;
            info!("wrote {} random pairs to {}", limit, output.display());
        }
        GenerateMode::Rank {
            input,
            output,
            source,
            source_vector,
            limit,
            min_rank,
        } => {
            let graph = AdjacencyGraph::reconstruct_from(&input).with_context(|| format!("loading graph from {}", input.display()))?;
            let sources: Vec<NodeId> = match (source, &source_vector) {
                (_, Some(sv)) => {
                    let mut sources: Vec<NodeId> = Vec::load_from(sv).with_context(|| format!("loading {}", sv.display()))?;
                    if let Some(limit) = limit {
                        sources.truncate(limit as usize);
                    }
                    sources
                }
                (Some(source), None) => vec![source],
                (None, None) => bail!("need at least one source through --source or --source-vector"),
            };

            let mut out_sources = Vec::new();
            let mut out_targets = Vec::new();
            let mut out_ranks: Vec<u32> = Vec::new();
            for (i, &source) in sources.iter().enumerate() {
                info!("computing dijkstra rank targets for source {}/{}", i + 1, sources.len());
                let targets = experiments::dijkstra_rank_targets(&graph, source);
                for (rank, &target) in targets.iter().enumerate().skip(min_rank as usize) {
                    out_sources.push(source);
                    out_targets.push(target);
                    out_ranks.push(rank as u32);
                }
            }
            out_sources.write_to(output.join("source")).context("writing source vector")?;
            out_targets.write_to(output.join("target")).context("writing target vector")?;
            out_ranks.write_to(output.join("rank")).context("writing rank vector")?;
            info!("wrote {} rank queries to {}", out_ranks.len(), output.display());
        }
    }
    Ok(())
}
