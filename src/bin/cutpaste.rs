use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing::Level;

use cutpaste::{
    AlphaMaskedSource, AssetSource, CancelToken, FpieCommand, GeneratorConfig,
    ParallelOrchestrator, SPLITS, SplitRequest, SplitSources, load_split_entries,
    merge_split_dir,
};

#[derive(Parser, Debug)]
#[command(name = "cutpaste", version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a dataset and merge the annotations of every split.
    Generate(GenerateArgs),
    /// Merge per-image annotation files of an existing dataset directory.
    Merge(MergeArgs),
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Split file listing object images (RGBA, alpha is the mask).
    #[arg(long)]
    objects: PathBuf,

    /// Split file listing distractor images.
    #[arg(long)]
    distractors: Option<PathBuf>,

    /// Split file listing background images.
    #[arg(long)]
    backgrounds: PathBuf,

    /// Output dataset directory.
    #[arg(long)]
    out: PathBuf,

    /// Generator configuration JSON; defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Images in the train split.
    #[arg(long, default_value_t = 0)]
    train: u64,

    /// Images in the validation split.
    #[arg(long, default_value_t = 0)]
    validation: u64,

    /// Images in the test split.
    #[arg(long, default_value_t = 0)]
    test: u64,

    /// Worker threads.
    #[arg(long)]
    workers: Option<usize>,

    /// Base seed for every job.
    #[arg(long)]
    seed: Option<u64>,

    /// Run jobs one after another on the main thread.
    #[arg(long)]
    sequential: bool,

    /// Reject placements overlapping earlier objects.
    #[arg(long)]
    avoid_occlusion: bool,

    /// Randomly rescale objects.
    #[arg(long)]
    scale: bool,

    /// Randomly rotate objects.
    #[arg(long)]
    rotation: bool,
}

#[derive(Parser, Debug)]
struct MergeArgs {
    /// Dataset directory containing one subdirectory per split.
    dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    match cli.cmd {
        Command::Generate(args) => cmd_generate(args),
        Command::Merge(args) => cmd_merge(args),
    }
}

fn load_config(args: &GenerateArgs) -> anyhow::Result<GeneratorConfig> {
    let mut cfg = match &args.config {
        Some(path) => GeneratorConfig::from_path(path)?,
        None => GeneratorConfig::default(),
    };
    if let Some(workers) = args.workers {
        cfg.workers = workers;
    }
    if args.seed.is_some() {
        cfg.seed = args.seed;
    }
    cfg.placement.avoid_occlusion |= args.avoid_occlusion;
    cfg.augment.scale |= args.scale;
    cfg.augment.rotation |= args.rotation;
    cfg.validate()?;
    Ok(cfg)
}

fn sources(
    split_file: &Path,
    split: &str,
    category_id: u32,
) -> anyhow::Result<Vec<Arc<dyn AssetSource>>> {
    let entries = load_split_entries(split_file, split)
        .with_context(|| format!("load split '{split}' from '{}'", split_file.display()))?;
    Ok(entries
        .into_iter()
        .map(|p| Arc::new(AlphaMaskedSource::new(p, category_id)) as Arc<dyn AssetSource>)
        .collect())
}

fn cmd_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args)?;
    let object_id = cfg.category_id(&cfg.object_category)?;
    let distractor_id = cfg.category_id(&cfg.distractor_category)?;

    let mut requests = Vec::with_capacity(SPLITS.len());
    for split in SPLITS {
        let count = match split {
            "train" => args.train,
            "validation" => args.validation,
            _ => args.test,
        };
        if count == 0 {
            requests.push(SplitRequest {
                name: split.to_string(),
                count,
                sources: SplitSources::default(),
            });
            continue;
        }
        let distractors = match &args.distractors {
            Some(path) => sources(path, split, distractor_id)?,
            None => Vec::new(),
        };
        requests.push(SplitRequest {
            name: split.to_string(),
            count,
            sources: SplitSources {
                objects: sources(&args.objects, split, object_id)?,
                distractors,
                backgrounds: load_split_entries(&args.backgrounds, split)?,
            },
        });
    }
    if requests.iter().all(|r| r.count == 0) {
        anyhow::bail!("no images requested; pass --train, --validation or --test");
    }

    let cancel = CancelToken::new();
    install_interrupt_handler(cancel.clone())?;

    let solver = Arc::new(FpieCommand::new(cfg.external_solver.clone()));
    let orchestrator = ParallelOrchestrator::new(&cfg, solver, args.sequential, cancel)?;
    let report = orchestrator.generate(&args.out, &requests)?;

    for split in &report.splits {
        eprintln!(
            "{}: {} written, {} abandoned, {} failed",
            split.name, split.succeeded, split.abandoned, split.failed
        );
        if let Some(path) = &split.merged {
            eprintln!("wrote {}", path.display());
        }
    }
    eprintln!("seed {}", report.seed);
    Ok(())
}

fn cmd_merge(args: MergeArgs) -> anyhow::Result<()> {
    for split in SPLITS {
        match merge_split_dir(&args.dir, split)? {
            Some(merged) => eprintln!(
                "{split}: {} images, {} annotations",
                merged.images.len(),
                merged.annotations.len()
            ),
            None => eprintln!("{split}: no annotation files"),
        }
    }
    Ok(())
}

/// First Ctrl-C requests cancellation; a second one exits immediately.
fn install_interrupt_handler(cancel: CancelToken) -> anyhow::Result<()> {
    let presses = AtomicU32::new(0);
    ctrlc::set_handler(move || {
        if presses.fetch_add(1, Ordering::SeqCst) == 0 {
            cancel.cancel();
            eprintln!("interrupt received, finishing running jobs (press again to abort)");
        } else {
            std::process::exit(130);
        }
    })
    .context("install Ctrl-C handler")
}
