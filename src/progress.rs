//! Observational instrumentation of the search: node and solution counts,
//! and periodic progress reports.
//!
//! The reporter treats the current path of the search tree as a number in
//! a mixed radix: the digit at level $k$ is the position of the chosen
//! option in the vertical list of the item chosen at that level, and the
//! radix is the length of that list. Reading the digits as a fraction gives
//! a rough estimate of the portion of the tree already explored. [See the
//! discussion of progress reports in Knuth, _TAOCP_ **4B** (2022), Part 2,
//! page 70.]

use crate::config::{Config, Stats};
use crate::indices::NodeIndex;
use crate::table::Table;
use std::fmt::Debug;
use tracing::{debug, info};

/// Counts the nodes of the search tree and decides when to report.
pub(crate) struct Progress {
    config: Config,
    /// The node count at which the next report is due.
    next_report: u64,
    stats: Stats,
}

impl Progress {
    pub fn new(config: Config) -> Self {
        Self {
            next_report: config.node_interval,
            config,
            stats: Stats::default(),
        }
    }

    /// Returns whether every step of the search should be traced.
    pub fn tracing(&self) -> bool {
        self.config.enable_debug_trace
    }

    /// Records that the search entered the given level, and returns whether
    /// a progress report is due.
    pub fn enter_level(&mut self, level: usize) -> bool {
        let stats = &mut self.stats;
        stats.nodes += 1;
        if stats.level_nodes.len() <= level {
            stats.level_nodes.resize(level + 1, 0);
        }
        stats.level_nodes[level] += 1;
        stats.max_level = stats.max_level.max(level);

        if self.config.enable_progress && stats.nodes >= self.next_report {
            self.next_report = stats.nodes + self.config.node_interval;
            true
        } else {
            false
        }
    }

    /// Records that a solution was passed to the visitor.
    pub fn record_solution(&mut self) {
        self.stats.solutions += 1;
    }

    /// Returns the number of solutions visited so far.
    pub fn solutions(&self) -> u64 {
        self.stats.solutions
    }

    /// Emits a progress report for the path given by one `(cursor, k, len)`
    /// triple per level above the current one, where the cursor is the
    /// option tried at that level and is the `k`th of the `len` options
    /// of the branch item. Levels that skip their item have no triple.
    pub fn report<'i, I, P>(&self, table: &Table<'i, I>, path: P)
    where
        I: Debug,
        P: IntoIterator<Item = (NodeIndex, usize, usize)>,
    {
        let mut digits = Vec::new();
        let mut option = Vec::new();
        for (ix, k, len) in path {
            if self.tracing() {
                table.option_of(ix, &mut option);
                debug!(level = digits.len(), ?option, k, len, "path");
            }
            digits.push((k, len));
        }
        info!(
            level = digits.len(),
            max_level = self.stats.max_level,
            nodes = self.stats.nodes,
            solutions = self.stats.solutions,
            estimate = estimate(digits),
            "search progress"
        );
    }

    /// Returns the statistics gathered so far.
    pub fn into_stats(self) -> Stats {
        self.stats
    }
}

/// Estimates the fraction of the search tree explored, given the
/// `(position, radix)` digits of the current path. Positions start at 1.
pub(crate) fn estimate<D>(digits: D) -> f64
where
    D: IntoIterator<Item = (usize, usize)>,
{
    let mut est = 0.0;
    let mut scale = 1.0;
    for (k, radix) in digits {
        scale *= radix as f64;
        est += (k - 1) as f64 / scale;
    }
    est + 1.0 / (2.0 * scale)
}


#[cfg(test)]
mod tests {
    use super::capture::{estimates, events};
    use super::*;
    use tracing::Level;

    #[test]
    fn estimate_reads_path_as_mixed_radix_fraction() {
        assert_eq!(estimate(Vec::new()), 0.5);
        // Second of two options, then first of four.
        assert_eq!(estimate([(2, 2), (1, 4)]), 0.5 + 1.0 / 16.0);
        // Last of three, then last of two.
        let est = estimate([(3, 3), (2, 2)]);
        assert!((est - (2.0 / 3.0 + 1.0 / 6.0 + 1.0 / 12.0)).abs() < 1e-12);
        assert!(est < 1.0);
    }

    #[test]
    fn reports_every_interval() {
        let mut progress = Progress::new(Config {
            enable_progress: true,
            node_interval: 3,
            enable_debug_trace: false,
        });
        let due: Vec<bool> = (0..7).map(|level| progress.enter_level(level % 2)).collect();
        assert_eq!(due, [false, false, true, false, false, true, false]);
        let stats = progress.into_stats();
        assert_eq!(stats.nodes, 7);
        assert_eq!(stats.level_nodes, [4, 3]);
        assert_eq!(stats.max_level, 1);
    }

    #[test]
    fn zero_interval_reports_every_node() {
        let mut progress = Progress::new(Config {
            enable_progress: true,
            node_interval: 0,
            enable_debug_trace: false,
        });
        assert!((0..5).all(|level| progress.enter_level(level)));
    }

    #[test]
    fn disabled_progress_never_reports() {
        let mut progress = Progress::new(Config {
            node_interval: 1,
            ..Config::default()
        });
        assert!((0..5).all(|_| !progress.enter_level(0)));
        progress.record_solution();
        assert_eq!(progress.solutions(), 1);
    }

    #[test]
    fn path_events_need_debug_trace() {
        let mut table = Table::new(&['a'], &[]).unwrap();
        table.add_option(&['a']).unwrap();
        table.add_option(&['a']).unwrap();
        // Headers 0 and 1, then a spacer; the first option is at node 3.
        let path = [(NodeIndex::new(3), 1, 2)];

        let mut config = Config {
            enable_progress: true,
            node_interval: 0,
            enable_debug_trace: false,
        };
        let quiet = events(|| Progress::new(config.clone()).report(&table, path));
        assert_eq!(quiet.len(), 1);
        assert_eq!(quiet[0].level, Level::INFO);
        assert_eq!(quiet[0].message, "search progress");
        assert_eq!(estimates(&quiet), [0.25]);

        config.enable_debug_trace = true;
        let traced = events(|| Progress::new(config).report(&table, path));
        let levels: Vec<Level> = traced.iter().map(|e| e.level).collect();
        assert_eq!(levels, [Level::DEBUG, Level::INFO]);
        assert_eq!(traced[0].message, "path");
        assert_eq!(estimates(&traced), [0.25]);
    }
}
