//! Maximum clique and graph coloring solvers (command line)


// #![warn(clippy::all, clippy::pedantic)]
// useful additional warnings if docs are missing, or crates imported but unused, etc.
#![warn(missing_debug_implementations)]
#![warn(missing_docs)]
#![warn(trivial_casts, trivial_numeric_casts)]
#![warn(unsafe_code)]
#![warn(unused_extern_crates)]
#![warn(variant_size_differences)]

use clap::{App, load_yaml};
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use bnp_color::color::{check_clique, check_coloring};
use bnp_color::error::BnpError;
use bnp_color::relaxation::LpOracle;
use bnp_color::search::clique_bnb::solve_clique;
use bnp_color::search::coloring_bnp::solve_coloring;
use bnp_color::search::mcq::solve_mcq;
use bnp_color::util::{clique_lines, coloring_lines, export_results, read_params};


/**
reads an instance, the time limit and the optional parameters, and solves the problem
given as a subcommand (clique, color, mcq).
*/
pub fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    if let Err(e) = run() {
        error!(error = %e, "aborting");
        std::process::exit(1);
    }
}

fn run() -> Result<(), BnpError> {
    // parse arguments
    let yaml = load_yaml!("main_args.yml");
    let main_args = App::from_yaml(yaml).get_matches();
    let params = read_params(&main_args)?;
    let graph = &params.graph;
    let (lines, objective, stats) = match main_args.subcommand_name() {
        Some("clique") => {
            let mut oracle = LpOracle::new();
            let res = solve_clique(graph, &mut oracle, &params.config);
            info!(size = res.size, check = ?check_clique(graph, &res.solution), "clique");
            (clique_lines(graph, &res.solution), res.size, serde_json::to_value(&res.stats)?)
        }
        Some("color") => {
            let mut oracle = LpOracle::new();
            let res = solve_coloring(graph, &mut oracle, &params.config);
            info!(nb_colors = res.size, check = ?check_coloring(graph, &res.solution), "coloring");
            (coloring_lines(graph, &res.solution), res.size, serde_json::to_value(&res.stats)?)
        }
        Some("mcq") => {
            let res = solve_mcq(graph, &params.config);
            info!(size = res.size, check = ?check_clique(graph, &res.solution), "clique");
            (clique_lines(graph, &res.solution), res.size, serde_json::to_value(&res.stats)?)
        }
        other => return Err(BnpError::config(format!("unknown subcommand {:?}", other))),
    };
    let perf = json!({
        "inst_name": params.inst_filename,
        "objective": objective,
        "search": stats,
    });
    export_results(&lines, &perf, params.perf_file.as_deref(), params.sol_file.as_deref())
}
