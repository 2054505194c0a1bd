//! Memory allocation simulator CLI
//!
//! Line-oriented front-end over the allocation engine. Stands in for the
//! original graphical panels: it only reads snapshots and never holds
//! allocation state of its own.

use anyhow::Context;
use clap::Parser;
use memsim::{MemoryManager, PlacementPolicy, SeedLayout};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "memsim")]
#[command(about = "Contiguous-memory allocation simulator")]
#[command(version)]
struct Args {
    /// Placement policy (first-fit, best-fit, worst-fit, next-fit)
    #[arg(short = 'a', long, default_value = "first-fit")]
    policy: String,

    /// TOML seed layout file (defaults to the built-in 1135 KB layout)
    #[arg(short = 'l', long)]
    layout: Option<PathBuf>,

    /// Print blocks and stats as JSON instead of tables
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let policy: PlacementPolicy = args
        .policy
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let mut memory = match &args.layout {
        Some(path) => {
            let layout = SeedLayout::load(path)
                .with_context(|| format!("failed to load layout {:?}", path))?;
            MemoryManager::with_layout(layout)?
        }
        None => MemoryManager::new(),
    };
    memory.set_policy(policy);

    println!(
        "memsim {} | {} KB total, {} policy | type 'help' for commands",
        memsim::VERSION,
        memory.total_memory(),
        policy
    );

    let stdin = io::stdin();
    let mut out = io::stdout();
    loop {
        print!("> ");
        out.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let fields: Vec<&str> = line.split_whitespace().collect();

        match fields.as_slice() {
            [] => {}
            ["quit"] | ["exit"] => break,
            ["help"] => print_help(),
            ["reset"] => {
                memory.reset();
                println!("Memory reset to initial state.");
            }
            ["blocks"] => print_blocks(&memory, args.json)?,
            ["stats"] => print_stats(&memory, args.json)?,
            ["policy", name] => match name.parse::<PlacementPolicy>() {
                Ok(policy) => {
                    memory.set_policy(policy);
                    println!("Policy set to {}.", policy);
                }
                Err(e) => println!("{}", e),
            },
            ["alloc", size, id] => match size.parse::<u64>() {
                Ok(size) => match memory.allocate(size, id) {
                    Ok(()) => println!("Allocated {} KB to '{}'.", size, id),
                    Err(e) => println!("Allocation failed: {}", e),
                },
                Err(_) => println!("Invalid size '{}': expected a positive integer.", size),
            },
            ["free", id] => match memory.deallocate(id) {
                Ok(released) => println!("Deallocated {} KB from '{}'.", released, id),
                Err(e) => println!("Deallocation failed: {}", e),
            },
            _ => println!("Unrecognized command; type 'help'."),
        }
    }

    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  alloc <size-kb> <id>   allocate memory to a process id");
    println!("  free <id>              release every block owned by id");
    println!("  policy <name>          switch placement policy");
    println!("  blocks                 show the current block ledger");
    println!("  stats                  show memory counters and fragmentation");
    println!("  reset                  restore the seed layout");
    println!("  quit                   exit");
}

fn print_blocks(memory: &MemoryManager, json: bool) -> anyhow::Result<()> {
    let snapshot = memory.snapshot();
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("{:>10}  {:>9}  {:<9}  {}", "Address", "Size (KB)", "Status", "Owner");
    for block in &snapshot {
        let status = if block.allocated { "allocated" } else { "free" };
        let owner = if block.allocated { block.owner_id.as_str() } else { "---" };
        println!(
            "{:>10}  {:>9}  {:<9}  {}",
            format!("{:06X}", block.start_address),
            block.size,
            status,
            owner
        );
    }
    Ok(())
}

fn print_stats(memory: &MemoryManager, json: bool) -> anyhow::Result<()> {
    let stats = memory.stats();
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    let used_pct = if stats.total > 0 {
        stats.used as f64 / stats.total as f64 * 100.0
    } else {
        0.0
    };
    println!(
        "Total: {} KB | Used: {} KB ({:.2}%) | Free: {} KB | Fragmentation: {:.2}%",
        stats.total, stats.used, used_pct, stats.free, stats.fragmentation
    );
    Ok(())
}
