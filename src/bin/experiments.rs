use anyhow::Context;
use clap::Parser;

use tangle::instance::Instance;
use tangle::solve::Solver;

/// Batch timing harness: solves every instance JSON under a directory and
/// writes per-run wall-clock seconds to a CSV.
#[derive(Parser)]
struct Cli {
    /// Directory containing instance JSON files
    #[clap(long, default_value = "instances")]
    dir: String,
    /// Only solve files whose name starts with this prefix
    #[clap(long, default_value = "")]
    prefix: String,
    /// Number of solve repetitions per instance
    #[clap(long, short = 'r', default_value = "5")]
    reps: usize,
    /// CSV output path
    #[clap(long, short = 'o', default_value = "experiments.csv")]
    out: String,
    /// Write an SVG of each solved instance into this directory
    #[clap(long)]
    drawings: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let mut files: Vec<_> = std::fs::read_dir(&args.dir)
        .with_context(|| format!("listing {}", args.dir))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|e| e == "json"))
        .filter(|p| {
            p.file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|s| s.starts_with(&args.prefix))
        })
        .collect();
    files.sort();

    let mut csv = String::from("Instance,Swaps,Group");
    for i in 1..=args.reps {
        csv.push_str(&format!(",Run_{}", i));
    }
    csv.push_str(",Avg\n");

    for path in &files {
        let name = path.file_stem().unwrap().to_string_lossy().into_owned();
        let text = std::fs::read_to_string(path)?;
        let inst = Instance::from_json_str(&text)
            .with_context(|| format!("loading {}", path.display()))?;
        if !inst.schedulable() {
            eprintln!("{}: unschedulable, skipped", name);
            continue;
        }
        csv.push_str(&format!("{},{},ours", name, inst.total_swaps()));
        let mut total = 0.0;
        let mut last = None;
        for _ in 0..args.reps {
            let stime = std::time::Instant::now();
            let mut solver = Solver::new(&inst);
            let result = solver.solve_optimal();
            let t = stime.elapsed().as_secs_f64();
            total += t;
            csv.push_str(&format!(",{}", t));
            last = result.ok();
        }
        let avg = total / args.reps as f64;
        csv.push_str(&format!(",{}\n", avg));
        match &last {
            Some(sol) => eprintln!("{}: height {}, {:.3}s avg", name, sol.height, avg),
            None => eprintln!("{}: no round decomposition, {:.3}s avg", name, avg),
        }
        if let (Some(dir), Some(sol)) = (&args.drawings, &last) {
            std::fs::create_dir_all(dir)?;
            let out = format!("{}/{}.svg", dir, name);
            std::fs::write(&out, tangle::svg::render(&inst, sol, &Default::default()))
                .with_context(|| format!("writing {}", out))?;
        }
    }

    std::fs::write(&args.out, csv).with_context(|| format!("writing {}", args.out))?;
    Ok(())
}
