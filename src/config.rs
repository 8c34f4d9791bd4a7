use std::fs;
use std::time::{Duration, Instant};

use serde::{Serialize, Deserialize};

use crate::error::BnpError;


/** parameters shared by the tree searches.
Can be read from a JSON file; missing fields take their default value.
*/
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// absolute tolerance for integrality and bound comparisons
    pub epsilon: f64,
    /// time limit in seconds (None: no limit)
    pub time_limit: Option<f64>,
    /// maximum number of columns (or cuts) returned by one greedy pricing round
    pub max_pricing_sets: usize,
    /// if true, the exact pricing runs when the greedy pass finds nothing
    pub exact_pricing: bool,
    /// maximum number of nodes explored by one exact pricing call
    pub exact_pricing_node_limit: usize,
    /// clique model: add x_u + x_v <= 1 for every non-adjacent pair upfront
    pub eager_pair_constraints: bool,
    /// clique model: start from the greedy clique instead of an empty incumbent
    pub initial_clique_heuristic: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-4,
            time_limit: None,
            max_pricing_sets: 5,
            exact_pricing: true,
            exact_pricing_node_limit: 200_000,
            eager_pair_constraints: false,
            initial_clique_heuristic: true,
        }
    }
}

impl SearchConfig {
    /// reads a configuration from a JSON file
    pub fn from_file(filename:&str) -> Result<Self, BnpError> {
        let content = fs::read_to_string(filename)?;
        let res:Self = serde_json::from_str(&content)?;
        res.validate()?;
        Ok(res)
    }

    /// sets the time limit (in seconds)
    pub fn with_time_limit(mut self, seconds:f64) -> Self {
        self.time_limit = Some(seconds);
        self
    }

    /// checks parameter ranges
    pub fn validate(&self) -> Result<(), BnpError> {
        if !(self.epsilon > 0. && self.epsilon < 0.5) {
            return Err(BnpError::config(format!("epsilon must be in (0, 0.5), got {}", self.epsilon)));
        }
        if let Some(t) = self.time_limit {
            if !(t.is_finite() && t >= 0.) {
                return Err(BnpError::config(format!("invalid time limit {}", t)));
            }
        }
        if self.max_pricing_sets == 0 {
            return Err(BnpError::config("max_pricing_sets must be positive"));
        }
        Ok(())
    }

    /// instant at which the search must stop, if any.
    /// A limit too large to be represented means no deadline.
    pub fn deadline(&self, start:Instant) -> Option<Instant> {
        self.time_limit
            .and_then(|t| Duration::try_from_secs_f64(t).ok())
            .and_then(|d| start.checked_add(d))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json() {
        let conf:SearchConfig = serde_json::from_str(r#"{"epsilon": 0.001, "time_limit": 2.5}"#).unwrap();
        assert_eq!(conf.epsilon, 0.001);
        assert_eq!(conf.time_limit, Some(2.5));
        assert_eq!(conf.max_pricing_sets, SearchConfig::default().max_pricing_sets);
        assert!(conf.validate().is_ok());
    }

    #[test]
    fn test_invalid_epsilon() {
        let conf = SearchConfig { epsilon: 0.7, ..SearchConfig::default() };
        assert!(conf.validate().is_err());
    }

    #[test]
    fn test_deadline() {
        let start = Instant::now();
        assert_eq!(SearchConfig::default().deadline(start), None);
        let conf = SearchConfig::default().with_time_limit(1.);
        assert_eq!(conf.deadline(start), Some(start + Duration::from_secs(1)));
    }

    #[test]
    fn test_huge_time_limits() {
        let start = Instant::now();
        for t in &[f64::INFINITY, f64::NAN, -1.] {
            assert!(SearchConfig::default().with_time_limit(*t).validate().is_err());
            assert_eq!(SearchConfig::default().with_time_limit(*t).deadline(start), None);
        }
        let conf = SearchConfig::default().with_time_limit(1e20);
        assert!(conf.validate().is_ok());
        assert_eq!(conf.deadline(start), None);
    }
}
