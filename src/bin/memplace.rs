//! memplace command driver
//!
//! Reads placement commands from a script file or stdin, one per line:
//!
//! ```text
//! alloc P1 20 first-fit
//! alloc P2 30            # uses the default strategy
//! free P1
//! show
//! suggest 10
//! ```

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use crossbeam::channel::Receiver;
use memplace::response::Response;
use memplace::{SimConfig, Simulator, StateChange, Strategy};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "memplace")]
#[command(about = "Placement strategy simulator over a fixed linear address space")]
struct Args {
    /// TOML config file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Address space size in units (overrides config)
    #[arg(short = 'n', long)]
    capacity: Option<u64>,

    /// Default strategy (first-fit, best-fit, worst-fit; overrides config)
    #[arg(short = 's', long)]
    strategy: Option<String>,

    /// Command script to run instead of reading stdin
    #[arg(short = 'f', long)]
    script: Option<PathBuf>,

    /// Print JSON response envelopes instead of text
    #[arg(long)]
    json: bool,

    /// Print every state change to stderr
    #[arg(long)]
    watch: bool,
}

#[derive(Debug, PartialEq)]
enum Command {
    Alloc {
        owner: String,
        size: i64,
        strategy: Option<String>,
    },
    Free(String),
    Show,
    Stats,
    Suggest(i64),
    History,
    Log(String),
    Csv(String),
    Reset,
    Help,
}

const HELP: &str = "\
commands:
  alloc <owner> <size> [strategy]   place a block (first-fit, best-fit, worst-fit)
  free <owner>                      release everything the owner holds
  show                              print the ledger
  stats                             usage and fragmentation
  suggest <size>                    strategy with the least waste
  history                           mutation history, most recent first
  log <owner>                       audit entries for one owner
  csv <owner>                       audit entries as CSV
  reset                             empty the ledger
  help                              this text";

/// Parse one input line; `None` for blank lines and comments
fn parse_line(line: &str) -> Result<Option<Command>> {
    let line = match line.split_once('#') {
        Some((before, _)) => before,
        None => line,
    };
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&name, rest)) = words.split_first() else {
        return Ok(None);
    };

    let command = match (name.to_ascii_lowercase().as_str(), rest) {
        ("alloc" | "allocate", [owner, size]) => Command::Alloc {
            owner: owner.to_string(),
            size: parse_size(size)?,
            strategy: None,
        },
        ("alloc" | "allocate", [owner, size, strategy @ ..]) => {
            Command::Alloc {
                owner: owner.to_string(),
                size: parse_size(size)?,
                // "best fit" arrives as two words
                strategy: Some(strategy.join(" ")),
            }
        }
        ("free" | "dealloc" | "deallocate", [owner]) => Command::Free(owner.to_string()),
        ("show" | "memory", []) => Command::Show,
        ("stats", []) => Command::Stats,
        ("suggest", [size]) => Command::Suggest(parse_size(size)?),
        ("history", []) => Command::History,
        ("log", [owner]) => Command::Log(owner.to_string()),
        ("csv", [owner]) => Command::Csv(owner.to_string()),
        ("reset", []) => Command::Reset,
        ("help", _) => Command::Help,
        _ => bail!("unrecognized command '{}' (try 'help')", line.trim()),
    };
    Ok(Some(command))
}

fn parse_size(word: &str) -> Result<i64> {
    word.parse()
        .with_context(|| format!("size '{}' is not an integer", word))
}

/// Advisor answer as printed and serialized; `"none"` when nothing fits
fn suggestion(result: memplace::Result<Option<Strategy>>) -> memplace::Result<&'static str> {
    result.map(|strategy| strategy.map_or("none", |strategy| strategy.as_str()))
}

/// One-line description of a state change, e.g. `[v3] Deallocated P1: [0-99] Free`
fn describe_change(change: &StateChange) -> String {
    let owner = change
        .owner_id
        .as_ref()
        .map(|id| id.as_str())
        .unwrap_or("-");
    format!(
        "[v{}] {:?} {}: {}",
        change.version(),
        change.kind,
        owner,
        change.snapshot.render().join(" ")
    )
}

/// Write every change to `out` until all senders are gone
///
/// Returns the number of changes written.
fn watch(events: Receiver<StateChange>, mut out: impl Write) -> io::Result<usize> {
    let mut written = 0;
    for change in events.iter() {
        writeln!(out, "{}", describe_change(&change))?;
        written += 1;
    }
    out.flush()?;
    Ok(written)
}

fn print_response<T: serde::Serialize>(response: &Response<T>) -> Result<()> {
    println!("{}", response.to_json()?);
    Ok(())
}

fn execute(sim: &Simulator, command: Command, json: bool) -> Result<()> {
    match command {
        Command::Alloc {
            owner,
            size,
            strategy,
        } => {
            let result = match strategy {
                Some(strategy) => sim.allocate(&owner, size, &strategy),
                None => sim.allocate_default(&owner, size),
            };
            if json {
                return print_response(&Response::from(result));
            }
            match result {
                Ok(allocation) => println!(
                    "allocated {} units to {} at {} ({})",
                    allocation.size, allocation.owner_id, allocation.range, allocation.strategy
                ),
                Err(err) => println!("failed: {}", err),
            }
        }
        Command::Free(owner) => {
            let result = sim.deallocate(&owner);
            if json {
                return print_response(&Response::from(result));
            }
            match result {
                Ok(release) => {
                    println!("released {} units from {}", release.size, release.owner_id);
                    for line in release.memory {
                        println!("  {}", line);
                    }
                }
                Err(err) => println!("failed: {}", err),
            }
        }
        Command::Show => {
            if json {
                return print_response(&Response::success(sim.snapshot()));
            }
            for block in &sim.snapshot().blocks {
                match block.owner() {
                    Some(owner) => println!("{} {}", block.range(), owner.tag()),
                    None => println!("{} Free", block.range()),
                }
            }
        }
        Command::Stats => {
            let stats = sim.stats();
            if json {
                return print_response(&Response::success(stats));
            }
            println!(
                "capacity {}  used {}  free {}  ({:.1}% utilized)",
                stats.capacity,
                stats.used,
                stats.free,
                stats.utilization() * 100.0
            );
            println!(
                "free blocks {}  owned blocks {}  largest free {}  fragmentation {:.3}",
                stats.free_blocks,
                stats.owned_blocks,
                stats.largest_free,
                stats.external_fragmentation
            );
        }
        Command::Suggest(size) => {
            let result = suggestion(sim.suggest_strategy(size));
            if json {
                return print_response(&Response::from(result));
            }
            match result {
                Ok(name) => println!("suggested strategy: {}", name),
                Err(err) => println!("failed: {}", err),
            }
        }
        Command::History => {
            let history = sim.history();
            if json {
                return print_response(&Response::success(history));
            }
            for entry in history {
                println!(
                    "#{} {} {:?} {} {} units ({})",
                    entry.sequence,
                    entry.timestamp.format("%H:%M:%S%.3f"),
                    entry.action,
                    entry.owner_id,
                    entry.size,
                    entry.strategy
                );
            }
        }
        Command::Log(owner) => {
            let entries = sim.log_for(&owner);
            if json {
                return print_response(&Response::success(entries));
            }
            if entries.is_empty() {
                println!("no entries for {}", owner);
            }
            for entry in entries {
                println!(
                    "{} {} {} units {} {}",
                    entry.timestamp.to_rfc3339(),
                    entry.range,
                    entry.size,
                    entry.strategy,
                    entry.status.as_str()
                );
            }
        }
        Command::Csv(owner) => {
            let csv = sim.audit_csv(&owner);
            if json {
                return print_response(&Response::success(csv));
            }
            print!("{}", csv);
        }
        Command::Reset => {
            sim.reset();
            if json {
                return print_response(&Response::success(sim.memory()));
            }
            println!("ledger reset");
        }
        Command::Help => println!("{}", HELP),
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<SimConfig> {
    let mut config = match &args.config {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SimConfig::default(),
    };

    if let Some(capacity) = args.capacity {
        config.capacity = capacity;
    }
    if let Some(strategy) = &args.strategy {
        config.default_strategy = strategy.parse::<Strategy>()?;
    }
    Ok(config)
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let sim = Simulator::with_config(config)?;

    let watcher = args.watch.then(|| {
        let events = sim.subscribe();
        std::thread::spawn(move || watch(events, io::stderr()))
    });

    let input: Box<dyn BufRead> = match &args.script {
        Some(path) => {
            info!("Running script {:?}", path);
            let file = File::open(path)
                .with_context(|| format!("opening script {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(io::stdin())),
    };

    for (number, line) in input.lines().enumerate() {
        let line = line.context("reading input")?;
        match parse_line(&line) {
            Ok(Some(command)) => execute(&sim, command, args.json)?,
            Ok(None) => {}
            Err(err) => eprintln!("line {}: {:#}", number + 1, err),
        }
    }

    // Dropping the last handle closes the bus and ends the watcher's loop
    drop(sim);
    if let Some(watcher) = watcher {
        let written = watcher
            .join()
            .map_err(|_| anyhow!("watch thread panicked"))?
            .context("writing state changes")?;
        debug!("Watched {} state change(s)", written);
    }

    Ok(())
}
