//! Path kernel command line interface
//!
//! Computes path kernel matrices over sequence files, inspects and warms the
//! weight matrix cache, and suggests RBF bandwidths.

use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::{error, info, warn};
use pathkernel::core::{KernelError, KernelMatrix, PathKernelConfig, Result};
use pathkernel::utils::bandwidth::select_sigma;
use pathkernel::{
    Kernel, KernelReport, LabelSequences, NormalizedKernel, PathKernel, PathKernelBuilder,
    RbfKernel, SymbolKernel, VectorSequences, WeightStore,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "pathkernel")]
#[command(about = "Path kernel evaluation for symbol sequences")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// JSON configuration file (step costs, cache directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a path kernel matrix over sequence files
    Gram(GramArgs),
    /// Print the weight matrix for a pair of step costs
    Weights(WeightsArgs),
    /// Pre-compute a weight matrix and store it in the cache
    Warm(WarmArgs),
    /// Suggest an RBF bandwidth for vector sequences
    Sigma(SigmaArgs),
    /// Show the cache record for a pair of step costs
    Info(InfoArgs),
}

#[derive(Args, Clone, Debug, Default)]
struct CostArgs {
    /// Horizontal/vertical step cost
    #[arg(long)]
    chv: Option<f64>,

    /// Diagonal step cost
    #[arg(long)]
    cd: Option<f64>,
}

#[derive(Args)]
struct GramArgs {
    /// Sequence file (one sequence per line, symbols separated by ';')
    #[arg(long)]
    data: PathBuf,

    /// Second sequence file; computes the cross matrix instead of the Gram matrix
    #[arg(long)]
    against: Option<PathBuf>,

    /// RBF bandwidth for vector symbols
    #[arg(long, conflicts_with = "labels", required_unless_present = "labels")]
    sigma: Option<f64>,

    /// Number of labels for label symbols (identity label kernel)
    #[arg(long)]
    labels: Option<usize>,

    /// Normalize the kernel matrix
    #[arg(long)]
    normalize: bool,

    #[command(flatten)]
    costs: CostArgs,

    /// Weight cache directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Store the grown weight matrix in the cache directory
    #[arg(long)]
    writable: bool,

    /// Output report file (JSON); prints to stdout if not specified
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct WeightsArgs {
    /// Dimension of the printed matrix
    #[arg(long)]
    dim: usize,

    #[command(flatten)]
    costs: CostArgs,
}

#[derive(Args)]
struct WarmArgs {
    /// Dimension to grow the weight matrix to
    #[arg(long)]
    dim: usize,

    /// Weight cache directory
    #[arg(long)]
    cache_dir: PathBuf,

    #[command(flatten)]
    costs: CostArgs,
}

#[derive(Args)]
struct SigmaArgs {
    /// Vector sequence file
    #[arg(long)]
    data: PathBuf,

    /// Number of symbol pairs to draw (default: square root of the symbol count)
    #[arg(long)]
    samples: Option<usize>,

    /// Random seed for reproducible suggestions
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args)]
struct InfoArgs {
    /// Weight cache directory
    #[arg(long)]
    cache_dir: PathBuf,

    #[command(flatten)]
    costs: CostArgs,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Gram(args) => gram_command(config, args),
        Commands::Weights(args) => weights_command(config, args),
        Commands::Warm(args) => warm_command(config, args),
        Commands::Sigma(args) => sigma_command(args),
        Commands::Info(args) => info_command(config, args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

/// Configuration file (or defaults) with command line step costs on top
fn load_config(path: Option<&Path>, costs: &CostArgs) -> Result<PathKernelConfig> {
    let mut config = match path {
        Some(path) => {
            info!("Loading configuration from {path:?}");
            PathKernelConfig::from_file(path)?
        }
        None => PathKernelConfig::default(),
    };
    if let Some(chv) = costs.chv {
        config.chv = chv;
    }
    if let Some(cd) = costs.cd {
        config.cd = cd;
    }
    config.validate()?;
    Ok(config)
}

fn require_dimension(dim: usize) -> Result<()> {
    if dim == 0 {
        return Err(KernelError::InvalidParameter {
            name: "dim",
            reason: "dimension must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn gram_command(config_path: Option<&Path>, args: GramArgs) -> Result<()> {
    let mut config = load_config(config_path, &args.costs)?;
    if let Some(dir) = &args.cache_dir {
        config.cache_dir = Some(dir.clone());
    }
    if args.writable {
        config.writable = true;
    }
    if config.cache_dir.is_some() {
        config.preload = true;
    } else if config.writable {
        warn!("--writable has no effect without a cache directory");
    }
    info!("Step costs: CHV={}, CD={}", config.chv, config.cd);

    let builder = PathKernelBuilder::from_config(config);
    let (matrix, kernel_name, step_costs, dimension) = match (args.sigma, args.labels) {
        (Some(sigma), _) => {
            let data = VectorSequences::from_file(&args.data)?;
            let against = args
                .against
                .as_ref()
                .map(VectorSequences::from_file)
                .transpose()?;
            info!("Loaded {} vector sequences", data.len());

            let mut path = builder.build(RbfKernel::new(sigma)?)?;
            let matrix = evaluate(
                &mut path,
                data.sequences(),
                against.as_ref().map(|d| d.sequences()),
                args.normalize,
            )?;
            finish(&path);
            (
                matrix,
                format!("path(rbf sigma={sigma})"),
                path.step_costs(),
                path.dimension(),
            )
        }
        (None, Some(labels)) => {
            let data = LabelSequences::from_file(&args.data)?;
            let against = args
                .against
                .as_ref()
                .map(LabelSequences::from_file)
                .transpose()?;
            info!("Loaded {} label sequences", data.len());

            let mut path = builder.build(SymbolKernel::identity(labels)?)?;
            let matrix = evaluate(
                &mut path,
                data.sequences(),
                against.as_ref().map(|d| d.sequences()),
                args.normalize,
            )?;
            finish(&path);
            (
                matrix,
                format!("path(labels n={labels})"),
                path.step_costs(),
                path.dimension(),
            )
        }
        (None, None) => {
            return Err(KernelError::InvalidParameter {
                name: "kernel",
                reason: "one of --sigma or --labels is required".to_string(),
            })
        }
    };

    let kernel_name = if args.normalize {
        format!("normalized {kernel_name}")
    } else {
        kernel_name
    };
    let report = KernelReport::new(matrix, kernel_name, step_costs, dimension);

    if let Some(output) = args.output {
        report.save_to_file(&output)?;
        info!("Report saved to: {output:?}");
    } else {
        report.print();
    }

    Ok(())
}

fn evaluate<S, K: Kernel<S>>(
    path: &mut PathKernel<K>,
    data: &[Vec<S>],
    against: Option<&[Vec<S>]>,
    normalize: bool,
) -> Result<KernelMatrix<f64>> {
    match (against, normalize) {
        (None, false) => path.self_matrix(data),
        (Some(other), false) => path.pairwise_matrix(data, other),
        (None, true) => NormalizedKernel::new(path).compute_gram(data),
        (Some(other), true) => NormalizedKernel::new(path).compute_matrix(data, other),
    }
}

/// Persist the grown weight matrix when the cache allows it
fn finish<K>(path: &PathKernel<K>) {
    let stats = path.weight_stats();
    info!(
        "Weight matrix dimension {} after {} extensions ({} cells computed)",
        stats.dimension, stats.extensions, stats.cells_computed
    );
    if path.cache_dir().is_some() && path.save_weights() {
        info!("Weight matrix stored in cache");
    }
}

fn weights_command(config_path: Option<&Path>, args: WeightsArgs) -> Result<()> {
    require_dimension(args.dim)?;
    let config = load_config(config_path, &args.costs)?;

    let mut weights = pathkernel::WeightMatrix::new(config.chv, config.cd)?;
    weights.try_extend(args.dim)?;

    println!("# Weight matrix CHV={} CD={} dimension={}", config.chv, config.cd, args.dim);
    for i in 0..args.dim {
        let cells: Vec<String> = (0..args.dim)
            .map(|j| format!("{:.6e}", weights.get(i, j)))
            .collect();
        println!("{}", cells.join(" "));
    }
    Ok(())
}

fn warm_command(config_path: Option<&Path>, args: WarmArgs) -> Result<()> {
    require_dimension(args.dim)?;
    let config = load_config(config_path, &args.costs)?;

    let store = WeightStore::new(&args.cache_dir, true);
    let mut weights = pathkernel::WeightMatrix::new(config.chv, config.cd)?;
    if store.load(&mut weights) {
        info!("Starting from cached dimension {}", weights.dimension());
    }
    weights.try_extend(args.dim)?;

    if store.save(&weights) {
        println!(
            "Stored weight matrix of dimension {} in {:?}",
            weights.dimension(),
            store.record_path(config.chv, config.cd).unwrap_or_default()
        );
        return Ok(());
    }

    match store.stored_dimension(config.chv, config.cd) {
        Some(stored) if stored >= weights.dimension() => {
            println!("Cache already holds a weight matrix of dimension {stored}");
            Ok(())
        }
        _ => Err(KernelError::IoError(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("could not write weight cache in {:?}", args.cache_dir),
        ))),
    }
}

fn sigma_command(args: SigmaArgs) -> Result<()> {
    let data = VectorSequences::from_file(&args.data)?;
    info!(
        "Loaded {} sequences with {} symbols",
        data.len(),
        data.total_symbols()
    );

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let sigma = select_sigma(data.sequences(), args.samples, &mut rng)?;
    println!("{sigma}");
    Ok(())
}

fn info_command(config_path: Option<&Path>, args: InfoArgs) -> Result<()> {
    let config = load_config(config_path, &args.costs)?;
    let store = WeightStore::new(&args.cache_dir, false);

    println!("=== Weight Cache ===");
    println!("Step costs: CHV={}, CD={}", config.chv, config.cd);
    if let Some(record) = store.record_path(config.chv, config.cd) {
        println!("Record: {}", record.display());
    }
    match store.stored_dimension(config.chv, config.cd) {
        Some(dimension) => println!("Dimension: {dimension}"),
        None => println!("Dimension: none (no valid record)"),
    }
    Ok(())
}
