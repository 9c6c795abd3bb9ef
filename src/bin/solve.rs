use anyhow::{Context, ensure};
use clap::Parser;
use itertools::Itertools;

use tangle::instance::Instance;
use tangle::solve::{Solver, check_schedule};
use tangle::svg::RenderOptions;

/// Solves a tangle instance: reads a JSON requirement matrix and prints a
/// height-optimal schedule of adjacent swaps.
#[derive(Parser)]
struct Cli {
    /// Path to a JSON requirement matrix; reads stdin when omitted
    input: Option<String>,
    /// Only probe feasibility (single-swap rounds, not height-optimal)
    #[clap(long, default_value_t = false)]
    feasible: bool,
    /// Print the solution as JSON instead of the text listing
    #[clap(long, default_value_t = false)]
    json: bool,
    /// Write an SVG drawing of the schedule to this path
    #[clap(long)]
    svg: Option<String>,
    #[clap(long, default_value_t = 1.0)]
    scale: f64,
    /// Draw the closed template frame around the diagram
    #[clap(long, default_value_t = false)]
    entire: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let text = match &args.input {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?,
        None => std::io::read_to_string(std::io::stdin())?,
    };
    let inst = Instance::from_json_str(&text)?;

    let mut solver = Solver::new(&inst);
    let sol = if args.feasible {
        solver.solve_feasible()?
    } else {
        solver.solve_optimal()?
    };
    ensure!(check_schedule(&inst, &sol), "solver produced an invalid schedule");

    if args.json {
        println!("{}", serde_json::to_string(&sol)?);
    } else {
        println!("layers: {}", sol.height);
        println!("swaps:");
        for round in &sol.rounds {
            println!("{}", round.iter().map(|&(i, j)| format!("{}-{}", i, j)).join(" "));
        }
        println!("permutations:");
        let n = inst.n();
        let mut order = (0..n).collect_vec();
        let mut positions = (0..n).collect_vec();
        println!("{}", order.iter().join(" "));
        for round in &sol.rounds {
            for &(i, j) in round {
                order.swap(positions[i], positions[j]);
                positions.swap(i, j);
            }
            println!("{}", order.iter().join(" "));
        }
    }

    if let Some(path) = &args.svg {
        let opts = RenderOptions {
            scale: args.scale,
            white: false,
            entire: args.entire,
        };
        std::fs::write(path, tangle::svg::render(&inst, &sol, &opts))
            .with_context(|| format!("writing {}", path))?;
    }
    Ok(())
}
