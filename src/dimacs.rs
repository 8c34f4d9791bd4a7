use std::fs;

use nom::IResult;
use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{digit1, space0, space1};
use nom::combinator::map_res;
use nom::sequence::{preceded, separated_pair, tuple};

use crate::error::BnpError;
use crate::graph::{Graph, NodeLabel};


/** reads a graph from a DIMACS file.
 - `e u v` lines add an edge (ids start at 1)
 - a `p edge n m` (or `p col n m`) header declares vertices 1..n. Vertices that do not
   appear in any edge are appended after the others
 - every other line, including a malformed `p` line, is ignored
*/
pub fn read_from_file(filename:&str) -> Result<Graph, BnpError> {
    let content = fs::read_to_string(filename)?;
    read_from_str(&content)
}

/// reads a graph from the content of a DIMACS file
pub fn read_from_str(content:&str) -> Result<Graph, BnpError> {
    let mut graph = Graph::new();
    let mut nb_declared:Option<usize> = None;
    for (i, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim_end_matches('\r');
        if line.starts_with('e') {
            match read_edge(line) {
                Ok((_, (a,b))) => graph.add_edge(a, b),
                Err(_) => return Err(BnpError::parse(i+1, line)),
            }
        } else if line.starts_with('p') {
            // unreadable headers are ignored like any other line
            if let Ok((_, (n,_))) = read_header(line) {
                nb_declared = Some(n);
            }
        }
    }
    // isolated vertices declared by the header
    if let Some(n) = nb_declared {
        for label in 1..=n {
            graph.add_node(label);
        }
    }
    Ok(graph)
}

/// reads an unsigned integer
fn integer(s:&str) -> IResult<&str, usize> {
    map_res(digit1, |d:&str| d.parse::<usize>())(s)
}

/// reads two integers separated by spaces
fn read_two_integers(s:&str) -> IResult<&str, (usize,usize)> {
    separated_pair(integer, space1, integer)(s)
}

/// reads header containing (n,m)
pub fn read_header(s:&str) -> IResult<&str, (usize,usize)> {
    preceded(
        tuple((tag("p"), space1, alt((tag("edge"), tag("col"))), space1)),
        read_two_integers
    )(s)
}

/// reads edge line (WARNING: indices start at 1 in the DIMACS format)
pub fn read_edge(s:&str) -> IResult<&str, (NodeLabel,NodeLabel)> {
    let (remaining, res) = preceded(tuple((tag("e"), space1)), read_two_integers)(s)?;
    let (remaining, _) = space0(remaining)?;
    Ok((remaining, res))
}
