use crate::config::{Config, Stats};
use crate::error::Result;
use crate::indices::{ItemIndex, NodeIndex};
use crate::progress::Progress;
use crate::table::Table;
use crate::Solution;
use std::fmt::Debug;
use std::hash::Hash;
use std::ops::ControlFlow;
use tracing::{debug, trace};

/// A step of [Algorithm X](Solver). The search moves between these states
/// until it has visited the whole search tree or the visitor asks to stop.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Step {
    /// X2: Visit a solution if no primary item remains to be covered.
    EnterLevel,
    /// X3: Select a primary item $i$ that needs to be covered.
    ChooseItem,
    /// X4: Cover item $i$ and point the cursor at its first option.
    CoverItem(ItemIndex),
    /// X5: Cover the other items of the option at the cursor, if any.
    TryOption,
    /// X6: Undo the covering done by `TryOption`, and advance the cursor.
    TryAgain,
    /// X7: All options for $i$ were tried; uncover $i$.
    Backtrack,
    /// X8: Return to the level above, or terminate at level 0.
    LeaveLevel,
}

/// Visits all solutions to a given exact cover problem with primary and
/// secondary items by means of dancing links.
///
/// More precisely, this structure embodies an implementation of Algorithm X,
/// as presented by D. E. Knuth in Section 7.2.2.1 of [_TAOCP_ **4B**][taocp4b],
/// part 2, pages 67–70. Secondary items are covered by the options that
/// contain them, but they never need to be covered for a solution to be
/// visited; hence each of them appears in at most one option of a solution.
///
/// The recursion of Algorithm X is unrolled into a loop over [`Step`]s with
/// one cursor per level of the search tree.
///
/// [taocp4b]: https://www-cs-faculty.stanford.edu/~knuth/taocp.html#vol4
pub struct Solver<'i, I> {
    /// The items and options of the problem.
    table: Table<'i, I>,
    /// A stack of item instance pointers used for backtracking. The cursor
    /// at position $l$ refers to the option being tried at level $l$, or
    /// to the header of the item chosen at that level after all of its
    /// options have been tried; the current level is the length of the stack
    /// whenever a level is entered.
    pointers: Vec<NodeIndex>,
    config: Config,
}

impl<'i, I: Eq + Hash + Debug> Solver<'i, I> {
    /// Creates a solver for an exact cover problem on the given primary and
    /// secondary items.
    ///
    /// To specify the options to cover these items, use
    /// [`add_option`](crate::Solver::add_option).
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateItem`](crate::Error::DuplicateItem) if some
    /// item appears twice in the given lists.
    pub fn new(primary: &'i [I], secondary: &'i [I]) -> Result<Self> {
        Ok(Self {
            table: Table::new(primary, secondary)?,
            pointers: Vec::new(),
            config: Config::default(),
        })
    }
}

impl<'i, I> Solver<'i, I> {
    /// Given a node corresponding to the covering of a particular item $i$
    /// with some option $o$, covers all the items $\neq i$ in $o$,
    /// cyclically from left to right.
    fn cover_items_of(&mut self, ix: NodeIndex) {
        let mut cur_ix = self.table.next_in_option(ix);
        while cur_ix != ix {
            let item_ix = self.table.column_of(cur_ix);
            self.table.cover(item_ix);
            cur_ix = self.table.next_in_option(cur_ix);
        }
    }

    /// Undoes the updates made by [`Self::cover_items_of`], uncovering the
    /// items cyclically from right to left.
    fn uncover_items_of(&mut self, ix: NodeIndex) {
        let mut cur_ix = self.table.prev_in_option(ix);
        while cur_ix != ix {
            let item_ix = self.table.column_of(cur_ix);
            self.table.uncover(item_ix);
            cur_ix = self.table.prev_in_option(cur_ix);
        }
    }

    /// Returns the cursor of the deepest level in progress.
    fn cursor(&self) -> NodeIndex {
        *self
            .pointers
            .last()
            .unwrap_or_else(|| unreachable!("no level of the search is in progress"))
    }
}

impl<'i, I: Eq + Hash + Debug> crate::Solver<'i, I> for Solver<'i, I> {
    fn add_option<O>(&mut self, option: O) -> Result<()>
    where
        O: AsRef<[I]>,
    {
        self.table.add_option(option.as_ref())
    }

    fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    fn solve<F>(mut self, mut visit: F) -> Stats
    where
        F: FnMut(Solution<'_, 'i, I>) -> ControlFlow<()>,
    {
        let mut progress = Progress::new(self.config.clone());
        if progress.tracing() {
            self.table.log_rings();
        }
        let mut step = Step::EnterLevel;
        loop {
            if progress.tracing() {
                debug!(level = self.pointers.len(), ?step, "algorithm X");
            }
            step = match step {
                Step::EnterLevel => {
                    let level = self.pointers.len();
                    if progress.enter_level(level) {
                        let path = self.pointers.iter().filter_map(|&ix| {
                            let (k, len) = self.table.position_in_column(ix)?;
                            Some((ix, k, len))
                        });
                        progress.report(&self.table, path);
                    }
                    if self.table.primary_is_empty() {
                        // All primary items have been covered. Visit the
                        // solution given by the nodes in `self.pointers`.
                        progress.record_solution();
                        trace!(solution = progress.solutions(), level, "visiting solution");
                        let solution = Solution::new(&self.table, &self.pointers);
                        if visit(solution).is_break() {
                            if progress.tracing() {
                                debug!(solutions = progress.solutions(), "search stopped by visitor");
                            }
                            break;
                        }
                        Step::LeaveLevel
                    } else {
                        Step::ChooseItem
                    }
                }
                Step::ChooseItem => self
                    .table
                    .choose_item(|_, item| item.len())
                    .map_or(Step::LeaveLevel, Step::CoverItem),
                Step::CoverItem(item_ix) => {
                    if self.table.item(item_ix).len() == 0 {
                        // There are no options left to cover $i$. We only
                        // cover an item once we know that some active option
                        // contains it, so there is nothing to undo here.
                        Step::LeaveLevel
                    } else {
                        self.table.cover(item_ix);
                        self.pointers
                            .push(self.table.down(NodeIndex::from(item_ix)));
                        Step::TryOption
                    }
                }
                Step::TryOption => {
                    let cursor = self.cursor();
                    if self.table.is_header(cursor) {
                        Step::Backtrack
                    } else {
                        self.cover_items_of(cursor);
                        Step::EnterLevel
                    }
                }
                Step::TryAgain => {
                    let cursor = self.cursor();
                    self.uncover_items_of(cursor);
                    let next = self.table.down(cursor);
                    if let Some(top) = self.pointers.last_mut() {
                        *top = next;
                    }
                    Step::TryOption
                }
                Step::Backtrack => {
                    let cursor = self.cursor();
                    self.pointers.pop();
                    self.table.uncover(self.table.column_of(cursor));
                    Step::LeaveLevel
                }
                Step::LeaveLevel => {
                    if self.pointers.is_empty() {
                        break;
                    }
                    Step::TryAgain
                }
            };
        }
        progress.into_stats()
    }
}
