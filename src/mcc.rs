use crate::config::{Config, Stats};
use crate::error::{Error, Result};
use crate::indices::{ItemIndex, NodeIndex};
use crate::progress::Progress;
use crate::table::{Item, Table};
use crate::Solution;
use std::fmt::Debug;
use std::hash::Hash;
use std::ops::{ControlFlow, RangeInclusive};
use tracing::{debug, trace};

/// The multiplicity state of a primary item.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct Multiplicity {
    /// The number of options containing the item that may still be chosen,
    /// that is, $v_i$ minus the number of chosen options with the item.
    bound: usize,
    /// The difference $v_i-u_i$ between the upper and lower bounds.
    slack: usize,
}

impl Multiplicity {
    /// Returns the number of branches that the search explores when the
    /// item has `len` active options, namely $(\text{len}+1)\dotminus
    /// (\text{bound}\dotminus\text{slack})$. This number coincides with
    /// `len` if the multiplicity of the item is $[1\,.\,.\,1]$.
    fn branching_degree(&self, len: usize) -> usize {
        (len + 1).saturating_sub(self.bound.saturating_sub(self.slack))
    }

    /// Returns whether `len` options are too few to reach the lower bound,
    /// even if all of them were chosen.
    fn is_starved(&self, len: usize) -> bool {
        self.bound >= self.slack && len <= self.bound - self.slack
    }
}

/// The search state of one level of the tree.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct Frame {
    /// The option being tried at this level, or the header of the branch
    /// item if the level continues without any further option of that item.
    cursor: NodeIndex,
    /// The node that headed the vertical list of the branch item when the
    /// level was entered; tweaking starts there.
    first: NodeIndex,
    /// The length of that list when the level was entered.
    len: usize,
}

/// A step of [Algorithm M](Solver).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Step {
    /// M2: Visit a solution if no primary item remains in the active list.
    EnterLevel,
    /// M3: Select the primary item $i$ with the smallest branching degree.
    ChooseItem,
    /// M4: Use up one occurrence of $i$ and set the cursor to its first
    /// option.
    Prepare(ItemIndex),
    /// M5: Remove the option at the cursor from the list of $i$, or prune
    /// the level if the options left cannot meet the lower bound of $i$.
    Tweak,
    /// M6: Commit the other items of the option at the cursor, if any.
    TryOption,
    /// M7: Undo the work of `TryOption` and advance the cursor.
    TryAgain,
    /// M8: Put back every option tweaked at this level, and the occurrence
    /// of $i$ used up by `Prepare`.
    Restore,
    /// M9: Return to the level above, or terminate at level 0.
    LeaveLevel,
}

/// Visits all solutions to an exact cover problem with multiplicities, by
/// means of dancing links.
///
/// Each primary item $i$ has a multiplicity $[u_i\,.\,.\,v_i]$: a solution
/// is a set of options in which $i$ occurs at least $u_i$ and at most $v_i$
/// times. Secondary items occur at most once, as in [`DlSolver`]. When all
/// multiplicities are $[1\,.\,.\,1]$, this solver visits exactly the same
/// solutions as [`DlSolver`], in the same order.
///
/// This structure implements Algorithm M, as presented by D. E. Knuth in
/// Section 7.2.2.1 of [_TAOCP_ **4B**][taocp4b], part 2, pages 87–91.
/// The options chosen for an item at a given level are removed from its
/// vertical list ("tweaked") instead of being covered, so that the deeper
/// levels only combine them with options further down the list; hence
/// every multiset of options is visited exactly once, rather than once
/// per ordering.
///
/// Items whose upper bound is zero can never be covered, so the options
/// that contain them are discarded before the search starts.
///
/// [`DlSolver`]: crate::DlSolver
/// [taocp4b]: https://www-cs-faculty.stanford.edu/~knuth/taocp.html#vol4
pub struct Solver<'i, I> {
    table: Table<'i, I>,
    /// The multiplicity state of the primary item at [`ItemIndex`] $i$ is
    /// stored at position $i-1$.
    multiplicities: Vec<Multiplicity>,
    /// The state of every level in progress.
    frames: Vec<Frame>,
    /// The options of the current solution, gathered from `frames` when
    /// a solution is visited.
    chosen: Vec<NodeIndex>,
    config: Config,
}

impl<'i, I: Eq + Hash + Debug> Solver<'i, I> {
    /// Creates a solver for a covering problem on the given primary and
    /// secondary items. The multiplicity of the $k$th primary item is given
    /// by the $k$th range in `bounds`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateItem`] if some item is declared twice,
    /// [`Error::BoundsLength`] if the number of ranges differs from the
    /// number of primary items, and [`Error::InvalidBounds`] if some range
    /// is empty.
    pub fn new(
        primary: &'i [I],
        bounds: &[RangeInclusive<usize>],
        secondary: &'i [I],
    ) -> Result<Self> {
        let table = Table::new(primary, secondary)?;
        if bounds.len() != primary.len() {
            return Err(Error::BoundsLength {
                expected: primary.len(),
                actual: bounds.len(),
            });
        }
        let multiplicities = primary
            .iter()
            .zip(bounds)
            .map(|(label, range)| {
                let (min, max) = (*range.start(), *range.end());
                if min > max {
                    Err(Error::InvalidBounds {
                        label: format!("{label:?}"),
                        min,
                        max,
                    })
                } else {
                    Ok(Multiplicity {
                        bound: max,
                        slack: max - min,
                    })
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            table,
            multiplicities,
            frames: Vec::new(),
            chosen: Vec::new(),
            config: Config::default(),
        })
    }
}

impl<'i, I> Solver<'i, I> {
    fn multiplicity(&self, ix: ItemIndex) -> &Multiplicity {
        &self.multiplicities[ix.get() - 1]
    }

    fn multiplicity_mut(&mut self, ix: ItemIndex) -> &mut Multiplicity {
        &mut self.multiplicities[ix.get() - 1]
    }

    /// Returns the state of the deepest level in progress.
    fn frame(&self) -> Frame {
        *self
            .frames
            .last()
            .unwrap_or_else(|| unreachable!("no level of the search is in progress"))
    }

    /// Given a node corresponding to the choice of an option $o$ for a
    /// particular item $i$, uses up one occurrence of every primary item
    /// $\neq i$ in $o$ and covers its secondary items, cyclically from left
    /// to right. A primary item is covered once its bound drops to zero.
    fn commit_items_of(&mut self, ix: NodeIndex) {
        let mut cur_ix = self.table.next_in_option(ix);
        while cur_ix != ix {
            let item_ix = self.table.column_of(cur_ix);
            if self.table.is_primary(item_ix) {
                let m = self.multiplicity_mut(item_ix);
                m.bound -= 1;
                if m.bound == 0 {
                    self.table.cover(item_ix);
                }
            } else {
                self.table.cover(item_ix);
            }
            cur_ix = self.table.next_in_option(cur_ix);
        }
    }

    /// Undoes the updates made by [`Self::commit_items_of`], cyclically
    /// from right to left.
    fn uncommit_items_of(&mut self, ix: NodeIndex) {
        let mut cur_ix = self.table.prev_in_option(ix);
        while cur_ix != ix {
            let item_ix = self.table.column_of(cur_ix);
            if self.table.is_primary(item_ix) {
                let m = self.multiplicity_mut(item_ix);
                m.bound += 1;
                if m.bound == 1 {
                    self.table.uncover(item_ix);
                }
            } else {
                self.table.uncover(item_ix);
            }
            cur_ix = self.table.prev_in_option(cur_ix);
        }
    }

    /// Discards the options of the primary items that may not be covered
    /// at all.
    fn cover_forbidden_items(&mut self) {
        for prev_ix in 0..self.table.primary_count() {
            if self.multiplicities[prev_ix].bound == 0 {
                self.table.cover(ItemIndex::new(prev_ix + 1));
            }
        }
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
        self.cover_forbidden_items();
        if progress.tracing() {
            self.table.log_rings();
        }
        let mut step = Step::EnterLevel;
        loop {
            if progress.tracing() {
                debug!(level = self.frames.len(), ?step, "algorithm M");
            }
            step = match step {
                Step::EnterLevel => {
                    let level = self.frames.len();
                    if progress.enter_level(level) {
                        let path = self.frames.iter().filter_map(|f| {
                            let k = self.table.rank_below(f.first, f.cursor)?;
                            Some((f.cursor, k, f.len))
                        });
                        progress.report(&self.table, path);
                    }
                    if self.table.primary_is_empty() {
                        progress.record_solution();
                        trace!(solution = progress.solutions(), level, "visiting solution");
                        self.chosen.clear();
                        self.chosen.extend(
                            self.frames
                                .iter()
                                .map(|f| f.cursor)
                                .filter(|&ix| !self.table.is_header(ix)),
                        );
                        let solution = Solution::new(&self.table, &self.chosen);
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
                Step::ChooseItem => {
                    let theta = |ix: ItemIndex, item: &Item| {
                        self.multiplicity(ix).branching_degree(item.len())
                    };
                    match self.table.choose_item(theta) {
                        Some(ix) if theta(ix, self.table.item(ix)) > 0 => Step::Prepare(ix),
                        // Item $i$ cannot be covered often enough.
                        _ => Step::LeaveLevel,
                    }
                }
                Step::Prepare(item_ix) => {
                    let first = self.table.down(NodeIndex::from(item_ix));
                    let len = self.table.item(item_ix).len();
                    let m = self.multiplicity_mut(item_ix);
                    m.bound -= 1;
                    if m.bound == 0 {
                        self.table.cover(item_ix);
                    }
                    self.frames.push(Frame {
                        cursor: first,
                        first,
                        len,
                    });
                    Step::Tweak
                }
                Step::Tweak => {
                    let Frame { cursor, .. } = self.frame();
                    let item_ix = self.table.column_of(cursor);
                    let at_header = self.table.is_header(cursor);
                    let m = *self.multiplicity(item_ix);
                    if m.bound == 0 && m.slack == 0 {
                        // The item is covered, and this is the last time it
                        // can be chosen; plain Algorithm X applies.
                        if at_header {
                            Step::Restore
                        } else {
                            Step::TryOption
                        }
                    } else if m.is_starved(self.table.item(item_ix).len()) {
                        Step::Restore
                    } else if !at_header {
                        if m.bound == 0 {
                            self.table.detach(cursor);
                        } else {
                            self.table.tweak(cursor);
                        }
                        Step::TryOption
                    } else {
                        // Continue without further options of the item.
                        if m.bound != 0 {
                            self.table.deactivate(item_ix);
                        }
                        Step::TryOption
                    }
                }
                Step::TryOption => {
                    let Frame { cursor, .. } = self.frame();
                    if !self.table.is_header(cursor) {
                        self.commit_items_of(cursor);
                    }
                    Step::EnterLevel
                }
                Step::TryAgain => {
                    let Frame { cursor, .. } = self.frame();
                    self.uncommit_items_of(cursor);
                    let next = self.table.down(cursor);
                    if let Some(frame) = self.frames.last_mut() {
                        frame.cursor = next;
                    }
                    Step::Tweak
                }
                Step::Restore => {
                    let Frame { cursor, first, .. } = self.frame();
                    let item_ix = self.table.column_of(cursor);
                    let m = *self.multiplicity(item_ix);
                    if m.bound == 0 && m.slack == 0 {
                        self.table.uncover(item_ix);
                    } else if m.bound == 0 {
                        self.table.reattach(item_ix, first);
                        self.table.uncover(item_ix);
                    } else {
                        self.table.untweak(item_ix, first);
                    }
                    self.multiplicity_mut(item_ix).bound += 1;
                    self.frames.pop();
                    Step::LeaveLevel
                }
                Step::LeaveLevel => match self.frames.last() {
                    None => break,
                    Some(frame) if self.table.is_header(frame.cursor) => {
                        let item_ix = self.table.column_of(frame.cursor);
                        if self.multiplicity(item_ix).bound != 0 {
                            self.table.reactivate(item_ix);
                        }
                        Step::Restore
                    }
                    Some(_) => Step::TryAgain,
                },
            };
        }
        progress.into_stats()
    }
}
