extern crate chrono;
extern crate clap;
extern crate dirbench;
extern crate fern;
#[macro_use]
extern crate log;
extern crate nix;
extern crate tempdir;

use dirbench::*;
use std::fs::File;
use std::path::PathBuf;
use std::process;

const DEFAULT_CONFIG: &'static str = "dirbench_config.json";

fn main() {
    let matches = clap::App::new("Directory Benchmark")
        .version("0.1")
        .about("Creates, lists, verifies and deletes a directory of files, timing each phase")
        .arg(
            clap::Arg::with_name("CONFIG")
                .short("c")
                .long("config")
                .help("JSON configuration file (default = './dirbench_config.json')")
                .takes_value(true),
        )
        .arg(
            clap::Arg::with_name("NUM_FILES")
                .short("n")
                .long("num-files")
                .help("Number of files to create (default = 1000)")
                .takes_value(true),
        )
        .arg(
            clap::Arg::with_name("DIR_NAME")
                .short("d")
                .long("dir-name")
                .help("Name of the test directory (default = 'Test_Dir')")
                .takes_value(true),
        )
        .arg(
            clap::Arg::with_name("NAME_PREFIX")
                .short("p")
                .long("name-prefix")
                .help("Prefix for generated file names (default = none)")
                .takes_value(true),
        )
        .arg(
            clap::Arg::with_name("RUNS")
                .short("r")
                .long("runs")
                .help("Number of create/list/delete cycles (default = 1)")
                .takes_value(true),
        )
        .arg(
            clap::Arg::with_name("BACKEND")
                .short("b")
                .long("backend")
                .help("Filesystem to run against")
                .possible_values(&["memory", "host"])
                .takes_value(true),
        )
        .arg(
            clap::Arg::with_name("MOUNT_PATH")
                .short("m")
                .long("mount-path")
                .help("Directory the host backend works in (default = a temporary directory)")
                .takes_value(true),
        )
        .arg(
            clap::Arg::with_name("ORDER_POLICY")
                .long("order-policy")
                .help("How the listing is checked against the created names")
                .possible_values(&["positional", "unordered"])
                .takes_value(true),
        )
        .arg(
            clap::Arg::with_name("LISTING_ORDER")
                .long("listing-order")
                .help("Listing order of the memory backend")
                .possible_values(&["creation", "lexical", "shuffled"])
                .takes_value(true),
        )
        .arg(
            clap::Arg::with_name("SEED")
                .long("seed")
                .help("Seed for the shuffled listing order")
                .takes_value(true),
        )
        .arg(
            clap::Arg::with_name("DROP_CACHE")
                .long("drop-cache")
                .help("Sync and drop the page cache before listing (needs root)"),
        )
        .arg(
            clap::Arg::with_name("OUTPUT")
                .short("o")
                .long("output-directory")
                .help("Output directory (default = './output')")
                .takes_value(true),
        )
        .arg(
            clap::Arg::with_name("LOG_FILE")
                .short("l")
                .long("log-file")
                .help("Also write the log to this file")
                .takes_value(true),
        )
        .arg(
            clap::Arg::with_name("VERBOSE")
                .short("v")
                .long("verbose")
                .help("Log every created file"),
        )
        .get_matches();

    let config_path = matches.value_of("CONFIG");
    let mut config = match config_path {
        Some(path) => DirBenchConfig::load(path).unwrap_or_else(|e| {
            eprintln!("failed to load {}: {}", path, e);
            process::exit(2);
        }),
        None => DirBenchConfig::load(DEFAULT_CONFIG).unwrap_or(DirBenchConfig::default()),
    };

    if let Some(n) = matches.value_of("NUM_FILES") {
        config.num_files = n.parse().expect("Failed to parse number of files");
    }
    if let Some(name) = matches.value_of("DIR_NAME") {
        config.dir_name = name.to_owned();
    }
    if let Some(prefix) = matches.value_of("NAME_PREFIX") {
        config.name_prefix = prefix.to_owned();
    }
    if let Some(runs) = matches.value_of("RUNS") {
        config.runs = runs.parse().expect("Failed to parse number of runs");
    }
    if let Some(backend) = matches.value_of("BACKEND") {
        config.backend = backend.parse().expect("Failed to parse backend");
    }
    if let Some(path) = matches.value_of("MOUNT_PATH") {
        config.host_path = Some(PathBuf::from(path));
    }
    if let Some(policy) = matches.value_of("ORDER_POLICY") {
        config.order_policy = policy.parse().expect("Failed to parse order policy");
    }
    if let Some(order) = matches.value_of("LISTING_ORDER") {
        config.listing_order = order.parse().expect("Failed to parse listing order");
    }
    if let Some(seed) = matches.value_of("SEED") {
        config.seed = seed.parse().expect("Failed to parse seed");
    }
    if matches.is_present("DROP_CACHE") {
        config.drop_cache = true;
    }
    if let Some(output) = matches.value_of("OUTPUT") {
        config.output_dir = PathBuf::from(output);
    }
    if let Some(log) = matches.value_of("LOG_FILE") {
        config.log_path = Some(PathBuf::from(log));
    }

    let level = if matches.is_present("VERBOSE") {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    setup_logger(level, config.log_path.as_ref()).expect("failed to setup logger");

    // Keeps a temporary host directory alive until all runs are done
    let mut scratch = None;
    let mut fs: Box<dyn Filesystem> = match config.backend {
        Backend::Memory => {
            if config.drop_cache {
                warn!("--drop-cache has no effect on the memory backend");
            }
            Box::new(MemFs::with_order(config.listing_order, config.seed))
        }
        Backend::Host => {
            let path = match config.host_path {
                Some(ref path) => path.clone(),
                None => {
                    let dir = tempdir::TempDir::new("dirbench").expect("failed to create temporary directory");
                    let path = dir.path().to_owned();
                    scratch = Some(dir);
                    path
                }
            };
            if config.order_policy == OrderPolicy::Positional {
                warn!("host filesystems rarely list entries in creation order; consider --order-policy unordered");
            }
            if config.drop_cache && !nix::unistd::geteuid().is_root() {
                warn!("--drop-cache needs root");
            }
            match HostFs::new(&path) {
                Ok(fs) => Box::new(fs),
                Err(e) => {
                    error!("cannot use {:?}: {}", path, e);
                    process::exit(2);
                }
            }
        }
    };

    info!(
        "Running readdir benchmark on {} backend with {} files, {} run(s)",
        config.backend, config.num_files, config.runs
    );

    mkdir(&config.output_dir).expect("failed to create output directory");
    let mut summary = File::create(config.output_dir.join("summary.txt")).expect("failed to create summary file");
    let mut failed = 0;
    let mut completed = 0;
    for run in 1..config.runs + 1 {
        info!("Running readdir test {}/{}..", run, config.runs);
        match ReaddirBench::run(&mut *fs, &config) {
            Ok(bench) => {
                completed += 1;
                if !bench.passed() {
                    failed += 1;
                }
                bench
                    .export(config.output_dir.join(format!("run-{}", run)))
                    .expect("failed to export benchmark data");
                print_summary(&mut summary, format!("Readdir run {}", run), &bench).expect("failed to write to summary");
            }
            Err(e) => {
                // Residual entries may be left behind; later runs would collide with them
                error!("run {} aborted: {}", run, e);
                failed += 1;
                completed += 1;
                break;
            }
        }
    }

    print_tally(&mut summary, completed, failed).expect("failed to write to summary");
    print_tally(&mut std::io::stdout(), completed, failed).expect("failed to write to stdout");
    drop(scratch);
    if failed > 0 {
        process::exit(1);
    }
}

fn print_summary<S: ::std::fmt::Display, B: Benchmark, W: ::std::io::Write>(
    writer: &mut W,
    name: S,
    benchmark: &B,
) -> ::std::io::Result<()> {
    let total = benchmark.total();
    writeln!(
        writer,
        "{}: {}, Operations: {}, Operations/Second: {}",
        name,
        if benchmark.passed() { "passed" } else { "FAILED" },
        total.num_ops(),
        total.ops_per_second()
    )
}

fn print_tally<W: ::std::io::Write>(writer: &mut W, tests: usize, failed: usize) -> ::std::io::Result<()> {
    writeln!(writer, "tests: {}, failed: {}", tests, failed)
}

fn setup_logger(level: log::LevelFilter, log_path: Option<&PathBuf>) -> Result<(), fern::InitError> {
    use fern::colors::{Color, ColoredLevelConfig};
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            let colors = ColoredLevelConfig::new()
                .info(Color::Green)
                .warn(Color::Yellow);
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                colors.color(record.level()),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout());
    if let Some(path) = log_path {
        dispatch = dispatch.chain(fern::log_file(path)?);
    }
    dispatch.apply()?;
    Ok(())
}
