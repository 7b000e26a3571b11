//! This crate provides implementations of D. E. Knuth's dancing links
//! algorithms for the exact cover problem and its generalization to
//! covering with multiplicities.
//!
//! Suppose we're given a collection $\mathcal{O}$ of _options_, each of which is
//! a set of _items_; the _exact cover_ problem is to find a subcollection
//! $\mathcal{O}^\star\subseteq\mathcal{O}$ of options such that each item occurs
//! in exactly one of $\mathcal{O}^\star$'s options. Knuth proposed a method that
//! achieves this goal in the paper "Dancing Links", [arXiv:cs/0011047][dl] [cs.DS]
//! (2000), whose title refers to a clever yet simple technique for deleting and
//! restoring the nodes of a doubly linked list. His backtracking scheme, called
//! _Algorithm X_, employs this "waltzing" of links to visit all exact covers
//! with options $\mathcal{O}$ in a depth-first manner. [For further
//! information, see Section 7.2.2.1 of [_The Art of Computer Programming_ **4B** (2022)][taocp4b],
//! Part 2, 65–70.]
//!
//! A slight modification of Algorithm X solves the more general problem in
//! which items fall into one of two categories: _primary_ and _secondary_.
//! Now the task is to find a subcollection of options that cover every primary
//! item _exactly_ once, while covering every secondary item _at most_ once.
//! Going further, we can assign to every primary item $i$ a _multiplicity_
//! $[u_i\,.\,.\,v_i]$ and ask for collections of options in which $i$ occurs
//! at least $u_i$ and at most $v_i$ times. Knuth's _Algorithm M_ solves this
//! problem by the same dancing links machinery, visiting every such multiset
//! of options exactly once. [See [_TAOCP_ **4B**][taocp4b], Part 2, 87–95.]
//!
//! The following structures are the most important pieces of this crate:
//! - [`DlSolver`] finds all solutions to an exact cover problem with primary
//!   and secondary items. It implements Algorithm X as an explicit state
//!   machine, so deep searches never exhaust the call stack.
//! - [`MccSolver`] adheres to the same input and output conventions as the
//!   previous structure, and additionally accepts the multiplicities of the
//!   primary items.
//!
//! Both solvers validate their input as it arrives (see [`Error`]), and accept
//! an optional [`Config`] that turns on progress reports and step-by-step
//! traces through the [`tracing`] crate. A search returns the [`Stats`] it
//! gathered along the way.
//!
//! [dl]: https://arxiv.org/pdf/cs/0011047.pdf
//! [taocp4b]: https://www-cs-faculty.stanford.edu/~knuth/taocp.html#vol4

mod config;
mod dl;
mod error;
mod indices;
mod mcc;
mod progress;
mod table;

pub use config::{Config, Stats};
pub use dl::Solver as DlSolver;
pub use error::{Error, Result};
pub use mcc::Solver as MccSolver;

use indices::NodeIndex;
use std::fmt::Debug;
use std::hash::Hash;
use std::ops::{ControlFlow, RangeInclusive};
use table::Table;

/// Visits all [solutions] to a covering problem with $N_1\ge0$ primary items
/// and $N_2\ge0$ secondary items.
///
/// See the [crate-level documentation](`crate`) for details.
///
/// This trait is sealed, meaning that it cannot be implemented outside of
/// this crate.
///
/// # Examples
///
/// Suppose we want to cover the primary items $a,b,c,d,e,f,g$ using some of
/// the following options:
/// \\[
/// \`c\\;e';\quad\`a\\;d\\;g';\quad\`b\\;c\\;f';\quad\`a\\;d\\;f';\quad\`b\\;g';\quad\`d\\;e\\;g'.
/// \\]
/// (D. E. Knuth posed this toy problem at the beginning of Section 7.2.2.1
/// in [_The Art of Computer Programming_ **4B** (2022)][taocp4b], Part 2, page 66.)
/// The following program uses a solver based on the dancing links method
/// to find the unique solution $\`a\\;d\\;f';\\;\`b\\;g';\\;\`c\\;e'$:
///
/// ```
/// use std::ops::ControlFlow;
/// use exact_cover_search::{DlSolver, Solver};
///
/// let items = ['a', 'b', 'c', 'd', 'e', 'f', 'g'];
/// let mut solver = DlSolver::new(&items, &[])?;
/// solver.add_option([          'c',      'e'         ])?;
/// solver.add_option(['a',           'd',          'g'])?;
/// solver.add_option([     'b', 'c',           'f'    ])?;
/// solver.add_option(['a',           'd',      'f'    ])?;
/// solver.add_option([     'b',                    'g'])?;
/// solver.add_option([               'd', 'e',     'g'])?;
///
/// // We use an auxiliary table to store the items of an option. The chief
/// // purpose of this reserved storage is to reduce heap allocations when
/// // constructing the solutions.
/// let mut option = Vec::new();
/// let stats = solver.solve(|mut solution| {
///     assert_eq!(solution.option_count(), 3);
///     assert!(solution.next(&mut option));
///     assert_eq!(option, [&'a', &'d', &'f']);
///     assert!(solution.next(&mut option));
///     assert_eq!(option, [&'b', &'g']);
///     assert!(solution.next(&mut option));
///     assert_eq!(option, [&'c', &'e']);
///     ControlFlow::Continue(())
/// });
/// assert_eq!(stats.solutions, 1);
/// # Ok::<(), exact_cover_search::Error>(())
/// ```
///
/// [solutions]: `Solution`
/// [taocp4b]: https://www-cs-faculty.stanford.edu/~knuth/taocp.html#vol4
pub trait Solver<'i, I>: private::Sealed {
    /// Appends an option to the problem.
    ///
    /// Every label in `option` must name an item declared when the solver
    /// was created, no label may be repeated, and at least one of them must
    /// be primary. Otherwise the option is rejected with an [`Error`] and
    /// the problem is left as it was.
    ///
    /// Once all options have been specified, use [`Self::solve`] to visit all
    /// solutions to the problem.
    fn add_option<O>(&mut self, option: O) -> Result<()>
    where
        O: AsRef<[I]>;

    /// Replaces the instrumentation settings of the search.
    fn with_config(self, config: Config) -> Self
    where
        Self: Sized;

    /// Calls a closure on each solution to the problem, and returns the
    /// statistics of the search.
    ///
    /// The solution process continues until the closure returns
    /// [`ControlFlow::Break`] or all solutions have been visited,
    /// whichever occurs first.
    fn solve<F>(self, visit: F) -> Stats
    where
        F: FnMut(Solution<'_, 'i, I>) -> ControlFlow<()>;
}

mod private {
    pub trait Sealed {}

    impl<I> Sealed for crate::DlSolver<'_, I> {}
    impl<I> Sealed for crate::MccSolver<'_, I> {}
}

/// An iterator over the options of a solution to a covering problem.
///
/// The options appear in the order in which the search chose them, and
/// every option lists its items in the order they were given to
/// [`Solver::add_option`]. A solution borrows the internal tables of the
/// solver, so it cannot outlive the call to the visitor.
pub struct Solution<'s, 'i, I> {
    /// The tables of the solver that found the covering.
    table: &'s Table<'i, I>,
    /// One item instance of every option in the solution.
    options: &'s [NodeIndex],
    /// The position in `options` of the next option to enumerate.
    level: usize,
}

impl<'s, 'i, I> Solution<'s, 'i, I> {
    pub(crate) fn new(table: &'s Table<'i, I>, options: &'s [NodeIndex]) -> Self {
        Self {
            table,
            options,
            level: 0,
        }
    }

    /// Places the items in the next option of the solution into `result`.
    ///
    /// Returns `false` and leaves the vector untouched if and only if
    /// all options have already been enumerated.
    pub fn next(&mut self, result: &mut Vec<&'i I>) -> bool {
        if let Some(&node_ix) = self.options.get(self.level) {
            self.level += 1;
            self.table.option_of(node_ix, result);
            true
        } else {
            false
        }
    }

    /// Returns the number of options in the solution.
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    /// Collects every option of the solution, regardless of how many have
    /// already been enumerated by [`Self::next`].
    pub fn to_vec(&self) -> Vec<Vec<&'i I>> {
        self.options
            .iter()
            .map(|&node_ix| {
                let mut option = Vec::new();
                self.table.option_of(node_ix, &mut option);
                option
            })
            .collect()
    }
}

/// Builds an exact cover problem from lists of items and options, and visits
/// all of its solutions with a [`DlSolver`].
///
/// All options are validated before the search starts, so an error means
/// that `visit` was never called.
///
/// # Examples
///
/// ```
/// use std::ops::ControlFlow;
/// use exact_cover_search::{exact_cover, Config};
///
/// let options = [vec!["a", "x"], vec!["b", "x"], vec!["a"], vec!["b"]];
/// let mut found = Vec::new();
/// let stats = exact_cover(&["a", "b"], &["x"], &options, Config::default(), |solution| {
///     found.push(solution.to_vec());
///     ControlFlow::Continue(())
/// })?;
/// assert_eq!(stats.solutions, 3);
/// assert_eq!(found[0], [vec![&"a", &"x"], vec![&"b"]]);
/// # Ok::<(), exact_cover_search::Error>(())
/// ```
pub fn exact_cover<'i, I, O, F>(
    primary: &'i [I],
    secondary: &'i [I],
    options: &[O],
    config: Config,
    visit: F,
) -> Result<Stats>
where
    I: Eq + Hash + Debug,
    O: AsRef<[I]>,
    F: FnMut(Solution<'_, 'i, I>) -> ControlFlow<()>,
{
    let mut solver = DlSolver::new(primary, secondary)?.with_config(config);
    for option in options {
        solver.add_option(option)?;
    }
    Ok(solver.solve(visit))
}

/// Builds a covering problem with multiplicities from lists of items, bounds
/// and options, and visits all of its solutions with an [`MccSolver`].
///
/// The bounds are aligned with `primary`. All input is validated before the
/// search starts, so an error means that `visit` was never called.
///
/// # Examples
///
/// ```
/// use std::ops::ControlFlow;
/// use exact_cover_search::{multiplicity_cover, Config};
///
/// // Choose two or three of the options, each at most once.
/// let options = [["n", "a"], ["n", "b"], ["n", "c"]];
/// let stats = multiplicity_cover(
///     &["n", "a", "b", "c"],
///     &[2..=3, 0..=1, 0..=1, 0..=1],
///     &[],
///     &options,
///     Config::default(),
///     |_| ControlFlow::Continue(()),
/// )?;
/// assert_eq!(stats.solutions, 4);
/// # Ok::<(), exact_cover_search::Error>(())
/// ```
pub fn multiplicity_cover<'i, I, O, F>(
    primary: &'i [I],
    bounds: &[RangeInclusive<usize>],
    secondary: &'i [I],
    options: &[O],
    config: Config,
    visit: F,
) -> Result<Stats>
where
    I: Eq + Hash + Debug,
    O: AsRef<[I]>,
    F: FnMut(Solution<'_, 'i, I>) -> ControlFlow<()>,
{
    let mut solver = MccSolver::new(primary, bounds, secondary)?.with_config(config);
    for option in options {
        solver.add_option(option)?;
    }
    Ok(solver.solve(visit))
}
