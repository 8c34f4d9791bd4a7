use std::fs::File;
use std::io::Write;

use clap::ArgMatches;
use serde_json::Value;
use tracing::info;

use crate::color::Coloring;
use crate::config::SearchConfig;
use crate::dimacs;
use crate::error::BnpError;
use crate::graph::{Graph, NodeLabel, VertexId};


/// parameters read from the command line
#[derive(Debug)]
pub struct Params {
    /// instance file
    pub inst_filename: String,
    /// graph read from the instance file
    pub graph: Graph,
    /// search parameters (config file, then command line overrides)
    pub config: SearchConfig,
    /// where to write the solution
    pub sol_file: Option<String>,
    /// where to write the statistics
    pub perf_file: Option<String>,
}

/** reads command line input: instance, time limit, config file, solution and perf files */
pub fn read_params(main_args:&ArgMatches) -> Result<Params, BnpError> {
    let inst_filename = main_args.value_of("instance")
        .ok_or_else(|| BnpError::config("missing instance file"))?;
    // read the config file (defaults otherwise)
    let mut config = match main_args.value_of("config") {
        None => SearchConfig::default(),
        Some(f) => {
            info!(file = f, "reading configuration");
            SearchConfig::from_file(f)?
        }
    };
    if let Some(t) = main_args.value_of("time") {
        let t:f64 = t.parse().map_err(|_| BnpError::config(format!("unable to parse the time given: {}", t)))?;
        config = config.with_time_limit(t);
    }
    config.validate()?;
    let sol_file = main_args.value_of("solution").map(|e| {
        info!(file = e, "printing solutions");
        e.to_string()
    });
    let perf_file = main_args.value_of("perf").map(|e| {
        info!(file = e, "printing perfs");
        e.to_string()
    });
    info!(file = inst_filename, "reading instance");
    let graph = dimacs::read_from_file(inst_filename)?;
    graph.display_statistics();
    Ok(Params {
        inst_filename: inst_filename.to_string(),
        graph,
        config,
        sol_file,
        perf_file,
    })
}

/// one line per color class (node labels)
pub fn coloring_lines(graph:&Graph, coloring:&Coloring) -> Vec<Vec<NodeLabel>> {
    coloring.to_labels(graph).into_iter().map(|(_,c)| c).collect()
}

/// a single line with the clique (node labels)
pub fn clique_lines(graph:&Graph, clique:&[VertexId]) -> Vec<Vec<NodeLabel>> {
    let mut labels = graph.labels_of(clique);
    labels.sort_unstable();
    vec![labels]
}

/// writes the solution lines (labels separated by spaces)
pub fn write_solution(filename:&str, lines:&[Vec<NodeLabel>]) -> Result<(), BnpError> {
    let mut file = File::create(filename)?;
    for l in lines {
        let line:Vec<String> = l.iter().map(|v| v.to_string()).collect();
        writeln!(file, "{}", line.join(" "))?;
    }
    Ok(())
}

/// exports search results to files
pub fn export_results(
    solution:&[Vec<NodeLabel>],
    stats:&Value,
    perf_file:Option<&str>,
    sol_file:Option<&str>,
) -> Result<(), BnpError> {
    // export statistics
    if let Some(filename) = perf_file {
        let mut file = File::create(filename)?;
        file.write_all(serde_json::to_string_pretty(stats)?.as_bytes())?;
    }
    // export solution
    if let Some(filename) = sol_file {
        write_solution(filename, solution)?;
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_lines_use_labels() {
        let g = Graph::from_edges(&[(10,20), (20,30)]);
        let sol = Coloring::from_classes(vec![vec![0,2], vec![1]]);
        assert_eq!(coloring_lines(&g, &sol), vec![vec![10,30], vec![20]]);
        assert_eq!(clique_lines(&g, &[1,0]), vec![vec![10,20]]);
    }

    #[test]
    fn test_export_results() {
        let dir = std::env::temp_dir();
        let sol = dir.join("bnp_color_test.sol");
        let perf = dir.join("bnp_color_test.json");
        let sol = sol.to_str().unwrap();
        let perf = perf.to_str().unwrap();
        let stats = json!({"nb_colors": 2, "inst_name": "c4"});
        export_results(&[vec![1,3], vec![2,4]], &stats, Some(perf), Some(sol)).unwrap();
        assert_eq!(std::fs::read_to_string(sol).unwrap(), "1 3\n2 4\n");
        let read:Value = serde_json::from_str(&std::fs::read_to_string(perf).unwrap()).unwrap();
        assert_eq!(read["nb_colors"], 2);
    }

    #[test]
    fn test_missing_solution_dir() {
        let res = write_solution("/nonexistent_dir/x.sol", &[vec![1]]);
        assert!(matches!(res, Err(BnpError::Io(_))));
    }
}
