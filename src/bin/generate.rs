use anyhow::bail;
use clap::Parser;
use tangle::instgen;

/// Generates a random schedulable requirement matrix and prints it as JSON.
#[derive(Parser)]
struct Cli {
    #[clap(long, short = 'n', default_value = "5")]
    tracks: usize,
    /// Maximum swap count of a single pair
    #[clap(long, short = 'm', default_value = "2")]
    max_count: u32,
    #[clap(long, default_value = "1")]
    min_total: u64,
    #[clap(long, default_value = "20")]
    max_total: u64,
    #[clap(long, short = 's')]
    seed: Option<u64>,
    #[clap(long, short = 'c', default_value_t = false)]
    compact: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    if args.min_total > args.max_total {
        bail!("min_total {} exceeds max_total {}", args.min_total, args.max_total);
    }
    let inst = instgen::random::generate(
        args.tracks,
        args.max_count,
        args.min_total,
        args.max_total,
        args.seed,
    );
    println!("{}", inst.to_json_string(!args.compact));
    Ok(())
}
