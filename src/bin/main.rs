use std::fs;
use std::path::PathBuf;

use anstream::println;
use clap::Parser;
use indoc::indoc;
use owo_colors::OwoColorize;

use tile_search::algorithms::greedy::GreedySearch;
use tile_search::algorithms::greedy::Heuristic;
use tile_search::problems::tile_puzzle::TilePuzzle;

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Puzzle files: one `rows | columns : initial : target` line per puzzle,
    /// `//` comments allowed. Built-in examples run when no file is given.
    #[arg()]
    pub problems: Vec<PathBuf>,

    /// Bound on Select/Expand cycles per run (0 = unlimited).
    #[arg(long, env = "ITERATION_LIMIT", default_value_t = 0usize)]
    pub iteration_limit: usize,

    #[command(flatten)]
    color: colorchoice_clap::Color,
}

fn solve_line(number: usize, line: &str, iteration_limit: usize) {
    let puzzle = match TilePuzzle::try_from(line) {
        Ok(puzzle) => puzzle,
        Err(e) => {
            println!("{} {e}", "skipping:".red());
            return;
        }
    };

    println!("---------- {} ----------", format!("#{number}").yellow());
    println!("{puzzle}");

    let solver = GreedySearch::new(puzzle).set_iteration_limit(iteration_limit);
    for heuristic in [Heuristic::OutOfPlaceCount, Heuristic::TotalDistance] {
        let result = solver.solve(heuristic);
        println!("{} {result}", format!("{heuristic}:").green());

        if heuristic == Heuristic::OutOfPlaceCount {
            println!("{}", result.render_path());
        }
    }
}

fn solve_text(text: &str, iteration_limit: usize, number: &mut usize) {
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        *number += 1;
        solve_line(*number, line, iteration_limit);
    }
}

fn main() -> std::io::Result<()> {
    let args = Args::parse();
    args.color.write_global();

    let mut number = 0usize;

    if args.problems.is_empty() {
        let examples = indoc! {"
            // Built-in demo instances
            3 | 3 : 1|2|3|4|5|6|7|8|0 : 1|2|3|4|5|6|7|8|0 // already solved
            3 | 3 : 8|1|2|0|4|3|7|6|5 : 1|2|3|4|5|6|7|8|0
        "};
        solve_text(examples, args.iteration_limit, &mut number);
    }

    for path in &args.problems {
        println!("{} {:?}", "solving".cyan(), path);
        let text = fs::read_to_string(path)?;
        solve_text(&text, args.iteration_limit, &mut number);
    }

    Ok(())
}
