use crate::error::{Error, Result};
use crate::indices::{ItemIndex, NodeIndex};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use tracing::debug;

/// An item in a covering problem, as seen by the horizontal lists.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct Item {
    /// Possibly the previous item in a (horizontal) list of active items,
    /// in cyclic order. The contents of this variable are preserved when
    /// the item is removed from such linked list, so the item can be put
    /// back by a later [uncovering](`Table::uncover`).
    ///
    /// This field corresponds to the `LLINK` pointer in Knuth's data structure.
    left: ItemIndex,
    /// Possibly the next item in a (horizontal) list of active items,
    /// in cyclic order. (See `self.left` for details.)
    ///
    /// This field corresponds to the `RLINK` pointer in Knuth's data structure.
    right: ItemIndex,
    /// The number of item instances in the vertical list for this item.
    ///
    /// This field corresponds to the `LEN` member in Knuth's data structure.
    len: usize,
}

impl Item {
    /// Returns the number of active options that contain this item.
    pub fn len(&self) -> usize {
        self.len
    }
}

/// The position of the special item in the `items` table of a [`Table`]
/// that serves as the head of the list of active _primary_ items.
///
/// The list of active secondary items has its own header, namely the last
/// element in `items`. Its position depends on the number of items in the
/// problem, so this constant has no secondary counterpart.
pub(crate) const PRIMARY_HEADER: ItemIndex = ItemIndex::new(0);

/// The role of a record in the `nodes` table of a [`Table`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum Kind {
    /// The head of the vertical list of the item whose index equals the
    /// position of this record.
    Header,
    /// A separator between two consecutive options.
    Spacer,
    /// An instance of the given item in some option.
    ///
    /// The item corresponds to the `TOP` field in Knuth's data structure.
    Instance(ItemIndex),
}

/// A record in the sequential table of nodes.
///
/// The meaning of the links depends on the [kind](`Kind`) of record: for
/// headers and instances, `up` and `down` are the neighbors in a circular
/// vertical list. For a spacer, `up` is the first instance of the option
/// that precedes it and `down` is the last instance of the option that
/// follows it; these links let us traverse an option cyclically.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct Node {
    kind: Kind,
    /// This field corresponds to the `ULINK` pointer in Knuth's data structure.
    up: NodeIndex,
    /// This field corresponds to the `DLINK` pointer in Knuth's data structure.
    down: NodeIndex,
}

/// The quadruply linked tables shared by the solvers: two circular lists
/// of items (one for the primary and one for the secondary items), and one
/// circular vertical list per item holding the options that contain it.
///
/// All records live in two flat arenas addressed by index, so splicing a
/// record out of a list and back in again takes constant time.
pub(crate) struct Table<'i, I> {
    /// The labels of the $N$ items, in input order. The label of the item
    /// at [`ItemIndex`] $i$ is stored at position $i-1$.
    labels: Vec<&'i I>,
    /// Positions of the items by label.
    lookup: HashMap<&'i I, ItemIndex>,
    /// The number $N_1$ of primary items.
    primary_count: usize,
    /// The heads of the two horizontal lists and the $N=N_1+N_2$ items.
    items: Vec<Item>,
    /// The heads of the vertical lists, followed by the item instances of
    /// every option with [spacers](`Kind::Spacer`) between them.
    nodes: Vec<Node>,
    /// The spacer after the last option added so far.
    last_spacer: NodeIndex,
    /// The number of options added so far.
    option_count: usize,
}

impl<'i, I: Eq + Hash + Debug> Table<'i, I> {
    // Setup routines.

    /// Creates the tables for a problem on the given primary and secondary
    /// items, without any options.
    ///
    /// Returns [`Error::DuplicateItem`] if some label is declared twice.
    pub fn new(primary: &'i [I], secondary: &'i [I]) -> Result<Self> {
        let n_1 = primary.len();
        let n = n_1 + secondary.len();
        let mut lookup = HashMap::with_capacity(n);
        for (prev_ix, label) in primary.iter().chain(secondary).enumerate() {
            if lookup.insert(label, ItemIndex::new(prev_ix + 1)).is_some() {
                return Err(Error::DuplicateItem {
                    label: format!("{label:?}"),
                });
            }
        }

        // Construct the horizontal lists. Every item starts linked to its
        // neighbors in the table; then we close the two rings.
        let mut items: Vec<Item> = (0..=n + 1)
            .map(|ix| Item {
                left: ItemIndex::new(ix.saturating_sub(1)),
                right: ItemIndex::new(ix + 1),
                len: 0,
            })
            .collect();
        let secondary_head = ItemIndex::new(n + 1);
        if secondary.is_empty() {
            items[n + 1].left = secondary_head;
            items[n + 1].right = secondary_head;
        } else {
            items[n_1 + 1].left = secondary_head;
            items[n].right = secondary_head;
            items[n + 1].left = ItemIndex::new(n);
            items[n + 1].right = ItemIndex::new(n_1 + 1);
        }
        items[0].left = ItemIndex::new(n_1);
        items[n_1].right = PRIMARY_HEADER;

        // Every vertical list starts out empty, and the first spacer
        // comes right after the headers.
        let mut nodes: Vec<Node> = (0..=n)
            .map(|ix| Node {
                kind: Kind::Header,
                up: NodeIndex::new(ix),
                down: NodeIndex::new(ix),
            })
            .collect();
        let last_spacer = NodeIndex::new(n + 1);
        nodes.push(Node {
            kind: Kind::Spacer,
            up: last_spacer,
            down: last_spacer,
        });

        Ok(Self {
            labels: primary.iter().chain(secondary).collect(),
            lookup,
            primary_count: n_1,
            items,
            nodes,
            last_spacer,
            option_count: 0,
        })
    }

    /// Appends an option to the problem.
    ///
    /// The option is validated as a whole before any table is modified, so
    /// a rejected option leaves no trace.
    pub fn add_option(&mut self, option: &[I]) -> Result<()> {
        let option_ix = self.option_count;
        let mut item_ixs = Vec::with_capacity(option.len());
        for label in option {
            let item_ix = self.find_item(label).ok_or_else(|| Error::UnknownItem {
                option: option_ix,
                label: format!("{label:?}"),
            })?;
            if item_ixs.contains(&item_ix) {
                return Err(Error::RepeatedItem {
                    option: option_ix,
                    label: format!("{label:?}"),
                });
            }
            item_ixs.push(item_ix);
        }
        if !item_ixs.iter().any(|&ix| self.is_primary(ix)) {
            return Err(Error::NoPrimaryItem { option: option_ix });
        }

        // We will create one item instance per item and a trailing spacer.
        self.nodes.reserve(item_ixs.len() + 1);
        let first_ix = NodeIndex::new(self.nodes.len());
        for item_ix in item_ixs {
            self.append_inst(item_ix);
        }
        // Link the previous spacer to the last node in the option, and
        // create the next spacer pointing to the first node.
        let last_ix = NodeIndex::new(self.nodes.len() - 1);
        let prev_spacer = self.last_spacer;
        self.node_mut(prev_spacer).down = last_ix;
        self.last_spacer = NodeIndex::new(self.nodes.len());
        self.nodes.push(Node {
            kind: Kind::Spacer,
            up: first_ix,
            down: self.last_spacer,
        });
        self.option_count += 1;
        Ok(())
    }

    /// Appends a new node to the bottom of the vertical list of the
    /// specified item.
    fn append_inst(&mut self, item_ix: ItemIndex) {
        let ix = NodeIndex::new(self.nodes.len());
        let head = NodeIndex::from(item_ix);
        let tail = self.node(head).up;
        self.node_mut(tail).down = ix;
        self.node_mut(head).up = ix;
        self.item_mut(item_ix).len += 1;
        self.nodes.push(Node {
            kind: Kind::Instance(item_ix),
            up: tail,
            down: head,
        });
    }

    /// Emits a `debug` event for every active primary item, listing the
    /// options in its vertical list.
    pub fn log_rings(&self) {
        let mut option = Vec::new();
        let mut cur_ix = self.primary_head().right;
        while cur_ix != PRIMARY_HEADER {
            let head = NodeIndex::from(cur_ix);
            let mut options = Vec::with_capacity(self.item(cur_ix).len);
            let mut node_ix = self.node(head).down;
            while node_ix != head {
                self.option_of(node_ix, &mut option);
                options.push(option.clone());
                node_ix = self.node(node_ix).down;
            }
            debug!(
                item = ?self.label(cur_ix),
                len = self.item(cur_ix).len,
                ?options,
                "active primary item"
            );
            cur_ix = self.item(cur_ix).right;
        }
    }
}

impl<'i, I> Table<'i, I> {
    // Dancing links routines.

    /// Marks an item as covered by deleting it from the list of items remaining
    /// to be covered (the horizontal list), and by deleting all of the options
    /// that contain the item from the database of currently active options.
    pub fn cover(&mut self, ix: ItemIndex) {
        let item = self.item(ix);
        let (left_ix, right_ix) = (item.left, item.right);
        self.item_mut(left_ix).right = right_ix;
        self.item_mut(right_ix).left = left_ix;

        // Hide all options containing `item`, from top to bottom.
        let head = NodeIndex::from(ix);
        let mut node_ix = self.node(head).down;
        while node_ix != head {
            self.hide(node_ix);
            node_ix = self.node(node_ix).down;
        }
    }

    /// Hides an option that cannot appear in a solution for the items
    /// remaining in the horizontal list. This step traverses the siblings
    /// to the right of the node with index `ix`, cyclically, and deletes
    /// them from their corresponding vertical lists.
    pub fn hide(&mut self, ix: NodeIndex) {
        // The nodes of an option are stored contiguously in `self.nodes`, and
        // the spacer after them points back to the first one.
        let mut cur_ix = ix.increment();
        while cur_ix != ix {
            let Node { kind, up, down } = *self.node(cur_ix);
            cur_ix = match kind {
                Kind::Spacer => up,
                Kind::Instance(item) => {
                    self.node_mut(up).down = down;
                    self.node_mut(down).up = up;
                    self.item_mut(item).len -= 1;
                    cur_ix.increment()
                }
                Kind::Header => unreachable!("option at {ix:?} runs into the item header {cur_ix:?}"),
            };
        }
    }

    /// Undoes the updates made by the last [covering](`Self::cover`) operation
    /// of the item at index `ix`. The options are put back from bottom to
    /// top, and then the item returns to its horizontal list.
    pub fn uncover(&mut self, ix: ItemIndex) {
        let head = NodeIndex::from(ix);
        let mut node_ix = self.node(head).up;
        while node_ix != head {
            self.unhide(node_ix);
            node_ix = self.node(node_ix).up;
        }

        let item = self.item(ix);
        let (left_ix, right_ix) = (item.left, item.right);
        self.item_mut(left_ix).right = ix;
        self.item_mut(right_ix).left = ix;
    }

    /// Undoes the updates made by the last [hiding](`Self::hide`) operation.
    /// This step visits the siblings to the left of the node at index `ix`,
    /// cyclically, and puts them back into their vertical lists.
    pub fn unhide(&mut self, ix: NodeIndex) {
        let mut cur_ix = ix.decrement();
        while cur_ix != ix {
            let Node { kind, up, down } = *self.node(cur_ix);
            cur_ix = match kind {
                Kind::Spacer => down,
                Kind::Instance(item) => {
                    self.node_mut(up).down = cur_ix;
                    self.node_mut(down).up = cur_ix;
                    self.item_mut(item).len += 1;
                    cur_ix.decrement()
                }
                Kind::Header => unreachable!("option at {ix:?} runs into the item header {cur_ix:?}"),
            };
        }
    }

    /// Removes an active item from its horizontal list, without touching
    /// the options that contain it.
    pub fn deactivate(&mut self, ix: ItemIndex) {
        let item = self.item(ix);
        let (left_ix, right_ix) = (item.left, item.right);
        self.item_mut(left_ix).right = right_ix;
        self.item_mut(right_ix).left = left_ix;
    }

    /// Puts back an item removed by the last [deactivation](`Self::deactivate`).
    pub fn reactivate(&mut self, ix: ItemIndex) {
        let item = self.item(ix);
        let (left_ix, right_ix) = (item.left, item.right);
        self.item_mut(left_ix).right = ix;
        self.item_mut(right_ix).left = ix;
    }

    /// Hides the option at node `ix` and detaches that node from the top of
    /// its vertical list, so that neither the option nor the node take part
    /// in the search until the next [untweaking](`Self::untweak`).
    ///
    /// The node must be the first one in its vertical list.
    pub fn tweak(&mut self, ix: NodeIndex) {
        self.hide(ix);
        self.detach(ix);
    }

    /// Detaches the node `ix` from the top of its vertical list, whose item
    /// has already been covered and therefore hid the rest of the option.
    pub fn detach(&mut self, ix: NodeIndex) {
        let item_ix = self.column_of(ix);
        let head = NodeIndex::from(item_ix);
        debug_assert_eq!(
            self.node(head).down,
            ix,
            "only the first node of a vertical list can be detached"
        );
        let down = self.node(ix).down;
        self.node_mut(head).down = down;
        self.node_mut(down).up = head;
        self.item_mut(item_ix).len -= 1;
    }

    /// Undoes every [tweak](`Self::tweak`) applied to the vertical list of
    /// the given item since its top node was `first`.
    pub fn untweak(&mut self, ix: ItemIndex, first: NodeIndex) {
        self.reattach_from(ix, first, true);
    }

    /// Undoes every [detachment](`Self::detach`) applied to the vertical list
    /// of the given item since its top node was `first`.
    pub fn reattach(&mut self, ix: ItemIndex, first: NodeIndex) {
        self.reattach_from(ix, first, false);
    }

    /// The detached nodes still form a chain through their `down` links,
    /// starting at `first` and ending at the current top of the list.
    fn reattach_from(&mut self, ix: ItemIndex, first: NodeIndex, unhide: bool) {
        let head = NodeIndex::from(ix);
        let stop = self.node(head).down;
        self.node_mut(head).down = first;
        let (mut prev_ix, mut cur_ix) = (head, first);
        let mut count = 0;
        while cur_ix != stop {
            self.node_mut(cur_ix).up = prev_ix;
            count += 1;
            if unhide {
                self.unhide(cur_ix);
            }
            prev_ix = cur_ix;
            cur_ix = self.node(cur_ix).down;
        }
        self.node_mut(stop).up = prev_ix;
        self.item_mut(ix).len += count;
    }

    /// Finds an active primary item $i$ for which $h(i)$ is minimum, where
    /// $h$ is a heuristic function intended to reduce the amount of
    /// branching. In case of equality, ties are broken by the position of
    /// $i$ within the horizontal list of active primary items, so the item
    /// closest to the head wins.
    ///
    /// Returns `None` if all primary items have been covered.
    pub fn choose_item<H>(&self, heuristic: H) -> Option<ItemIndex>
    where
        H: Fn(ItemIndex, &Item) -> usize,
    {
        let mut min_h = usize::MAX;
        let mut min_ix = None;
        let mut cur_ix = self.primary_head().right;
        while cur_ix != PRIMARY_HEADER {
            let item = self.item(cur_ix);
            let h = heuristic(cur_ix, item);
            if h < min_h {
                // If $h(i)=0$, then $i$ is surely the result.
                if h == 0 {
                    return Some(cur_ix);
                }
                min_h = h;
                min_ix = Some(cur_ix);
            }
            cur_ix = item.right;
        }
        min_ix
    }

    // Traversal helpers.

    /// Returns whether every primary item has left the horizontal list.
    pub fn primary_is_empty(&self) -> bool {
        self.primary_head().right == PRIMARY_HEADER
    }

    /// Returns the item whose vertical list contains the given header or
    /// item instance.
    pub fn column_of(&self, ix: NodeIndex) -> ItemIndex {
        match self.node(ix).kind {
            Kind::Header => ItemIndex::new(ix.get()),
            Kind::Instance(item) => item,
            Kind::Spacer => unreachable!("spacer {ix:?} belongs to no vertical list"),
        }
    }

    /// Returns whether the node at `ix` is the head of a vertical list.
    pub fn is_header(&self, ix: NodeIndex) -> bool {
        self.node(ix).kind == Kind::Header
    }

    /// Returns the node below `ix` in its vertical list.
    pub fn down(&self, ix: NodeIndex) -> NodeIndex {
        self.node(ix).down
    }

    /// Returns the node to the right of the item instance `ix` in its
    /// option, in cyclic order.
    pub fn next_in_option(&self, ix: NodeIndex) -> NodeIndex {
        let next_ix = ix.increment();
        match self.node(next_ix).kind {
            Kind::Spacer => self.node(next_ix).up,
            Kind::Instance(_) => next_ix,
            Kind::Header => unreachable!("option at {ix:?} runs into the item header {next_ix:?}"),
        }
    }

    /// Returns the node to the left of the item instance `ix` in its
    /// option, in cyclic order.
    pub fn prev_in_option(&self, ix: NodeIndex) -> NodeIndex {
        let prev_ix = ix.decrement();
        match self.node(prev_ix).kind {
            Kind::Spacer => self.node(prev_ix).down,
            Kind::Instance(_) => prev_ix,
            Kind::Header => unreachable!("option at {ix:?} runs into the item header {prev_ix:?}"),
        }
    }

    /// Returns the 1-based position of the item instance `ix` within the
    /// vertical list of its item, together with the length of that list;
    /// or `None` if the node is not currently linked into the list.
    pub fn position_in_column(&self, ix: NodeIndex) -> Option<(usize, usize)> {
        let item_ix = self.column_of(ix);
        let head = NodeIndex::from(item_ix);
        let mut cur_ix = self.node(head).down;
        let mut k = 1;
        while cur_ix != head {
            if cur_ix == ix {
                return Some((k, self.item(item_ix).len));
            }
            cur_ix = self.node(cur_ix).down;
            k += 1;
        }
        None
    }

    /// Returns the 1-based position of the item instance `ix` in the chain
    /// of `down` links that starts at `first`, or `None` if the chain
    /// reaches a header before `ix`. A [detached](`Self::detach`) node keeps
    /// its `down` link, so the chain also runs through the options tweaked
    /// out of a vertical list.
    pub fn rank_below(&self, first: NodeIndex, ix: NodeIndex) -> Option<usize> {
        let mut cur_ix = first;
        let mut k = 1;
        while !self.is_header(cur_ix) {
            if cur_ix == ix {
                return Some(k);
            }
            cur_ix = self.node(cur_ix).down;
            k += 1;
        }
        None
    }

    /// Constructs the option containing the item instance $x$ at index
    /// `ix`, listing its items in their original order.
    ///
    /// The resulting sequence of items replaces the previous contents
    /// of `result`.
    pub fn option_of(&self, ix: NodeIndex, result: &mut Vec<&'i I>) {
        debug_assert!(
            matches!(self.node(ix).kind, Kind::Instance(_)),
            "node at index {ix:?} is not an item instance"
        );
        result.clear();
        // Find the spacer after the option; it points to the first node.
        let mut cur_ix = ix;
        while let Kind::Instance(_) = self.node(cur_ix).kind {
            cur_ix = cur_ix.increment();
        }
        cur_ix = self.node(cur_ix).up;
        while let Kind::Instance(item) = self.node(cur_ix).kind {
            result.push(self.label(item));
            cur_ix = cur_ix.increment();
        }
    }

    // Accessor methods.

    /// Returns whether the item at the given position is primary.
    pub fn is_primary(&self, ix: ItemIndex) -> bool {
        (1..=self.primary_count).contains(&ix.get())
    }

    /// Returns the number $N_1$ of primary items.
    pub fn primary_count(&self) -> usize {
        self.primary_count
    }

    /// Returns the label of the (nonheader) item at the given position.
    pub fn label(&self, ix: ItemIndex) -> &'i I {
        self.labels[ix.get() - 1]
    }

    /// Returns a reference to the item at the given position.
    ///
    /// # Panics
    ///
    /// This function panics if the index is out of bounds.
    pub fn item(&self, ix: ItemIndex) -> &Item {
        &self.items[ix.get()]
    }

    /// Returns a mutable reference to the item at the given position.
    fn item_mut(&mut self, ix: ItemIndex) -> &mut Item {
        &mut self.items[ix.get()]
    }

    /// Returns a reference to the head of the list of primary items
    /// that need to be covered.
    fn primary_head(&self) -> &Item {
        self.item(PRIMARY_HEADER)
    }

    /// Returns a reference to the node at the given position.
    fn node(&self, ix: NodeIndex) -> &Node {
        &self.nodes[ix.get()]
    }

    /// Returns a mutable reference to the node at the given position.
    fn node_mut(&mut self, ix: NodeIndex) -> &mut Node {
        &mut self.nodes[ix.get()]
    }
}

impl<'i, I: Eq + Hash> Table<'i, I> {
    /// Returns the position of the item with the given label, if any.
    pub fn find_item(&self, label: &I) -> Option<ItemIndex> {
        self.lookup.get(label).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_links<I>(table: &Table<'_, I>, ix: usize, left: usize, right: usize) {
        let item = table.item(ItemIndex::new(ix));
        assert_eq!(item.left, ItemIndex::new(left), "left link of item {ix}");
        assert_eq!(item.right, ItemIndex::new(right), "right link of item {ix}");
    }

    /// Returns a copy of the mutable state of the tables.
    fn snapshot<I>(table: &Table<'_, I>) -> (Vec<Item>, Vec<Node>) {
        (table.items.clone(), table.nodes.clone())
    }

    /// Returns the items in the horizontal list that starts at `head`.
    fn active<I>(table: &Table<'_, I>, head: ItemIndex) -> Vec<ItemIndex> {
        let mut result = Vec::new();
        let mut cur_ix = table.item(head).right;
        while cur_ix != head {
            result.push(cur_ix);
            cur_ix = table.item(cur_ix).right;
        }
        result
    }

    /// Returns the number of nodes linked into the vertical list of an item.
    fn column_len<I>(table: &Table<'_, I>, ix: ItemIndex) -> usize {
        let head = NodeIndex::from(ix);
        let mut len = 0;
        let mut cur_ix = table.down(head);
        while cur_ix != head {
            len += 1;
            cur_ix = table.down(cur_ix);
        }
        len
    }

    #[test]
    fn new_with_primary_only() {
        let table = Table::new(&[1, 2, 3], &[]).unwrap();
        assert_eq!(table.items.len(), 5); // 2 headers + 3 items
        assert_links(&table, 0, 3, 1);
        assert_links(&table, 1, 0, 2);
        assert_links(&table, 2, 1, 3);
        assert_links(&table, 3, 2, 0);
        // The secondary list is empty.
        assert_links(&table, 4, 4, 4);
        // Headers for the root and the three items, then the first spacer.
        assert_eq!(table.nodes.len(), 5);
        assert_eq!(table.nodes[4].kind, Kind::Spacer);
    }

    #[test]
    fn new_with_primary_and_secondary() {
        let table = Table::new(&['a', 'b', 'c'], &['d', 'e', 'f']).unwrap();
        assert_eq!(table.items.len(), 8); // 2 headers + 6 items

        // The primary list is closed at the last primary item.
        assert_links(&table, 0, 3, 1);
        assert_links(&table, 1, 0, 2);
        assert_links(&table, 3, 2, 0);
        // The secondary list has its head at position $N+1$.
        assert_links(&table, 4, 7, 5);
        assert_links(&table, 5, 4, 6);
        assert_links(&table, 6, 5, 7);
        assert_links(&table, 7, 6, 4);

        assert!(table.is_primary(ItemIndex::new(3)));
        assert!(!table.is_primary(ItemIndex::new(4)));
        assert_eq!(table.find_item(&'e'), Some(ItemIndex::new(5)));
        assert_eq!(table.find_item(&'z'), None);
    }

    #[test]
    fn new_without_primary() {
        let table = Table::new(&[], &['x', 'y']).unwrap();
        assert!(table.primary_is_empty());
        assert_links(&table, 0, 0, 0);
        assert_links(&table, 1, 3, 2);
        assert_links(&table, 3, 2, 1);
    }

    #[test]
    fn duplicate_items_are_rejected() {
        assert_eq!(
            Table::new(&['a', 'b', 'a'], &[]).err(),
            Some(Error::DuplicateItem {
                label: "'a'".to_string()
            })
        );
        assert_eq!(
            Table::new(&['a', 'b'], &['c', 'b']).err(),
            Some(Error::DuplicateItem {
                label: "'b'".to_string()
            })
        );
    }

    #[test]
    fn add_option_links_nodes() {
        let mut table = Table::new(&['a', 'b'], &['c']).unwrap();
        table.add_option(&['a', 'c']).unwrap();
        table.add_option(&['b', 'a']).unwrap();
        // Headers 0..=3, spacer 4, nodes 5 6, spacer 7, nodes 8 9, spacer 10.
        assert_eq!(table.nodes.len(), 11);
        assert_eq!(table.nodes[4].down, NodeIndex::new(6));
        assert_eq!(table.nodes[7].up, NodeIndex::new(5));
        assert_eq!(table.nodes[7].down, NodeIndex::new(9));
        assert_eq!(table.nodes[10].up, NodeIndex::new(8));

        // The vertical list of 'a' is 5, 9.
        let a = NodeIndex::new(1);
        assert_eq!(table.down(a), NodeIndex::new(5));
        assert_eq!(table.down(NodeIndex::new(5)), NodeIndex::new(9));
        assert_eq!(table.down(NodeIndex::new(9)), a);
        assert_eq!(table.item(ItemIndex::new(1)).len(), 2);

        // Cyclic traversal of the second option.
        assert_eq!(table.next_in_option(NodeIndex::new(9)), NodeIndex::new(8));
        assert_eq!(table.prev_in_option(NodeIndex::new(8)), NodeIndex::new(9));

        let mut option = Vec::new();
        table.option_of(NodeIndex::new(9), &mut option);
        assert_eq!(option, [&'b', &'a']);
        table.option_of(NodeIndex::new(6), &mut option);
        assert_eq!(option, [&'a', &'c']);
    }

    #[test]
    fn invalid_options_leave_tables_untouched() {
        let mut table = Table::new(&["p", "q"], &["s"]).unwrap();
        table.add_option(&["p"]).unwrap();
        let before = snapshot(&table);

        assert_eq!(
            table.add_option(&["q", "nope"]),
            Err(Error::UnknownItem {
                option: 1,
                label: "\"nope\"".to_string()
            })
        );
        assert_eq!(
            table.add_option(&["q", "s", "q"]),
            Err(Error::RepeatedItem {
                option: 1,
                label: "\"q\"".to_string()
            })
        );
        assert_eq!(
            table.add_option(&["s"]),
            Err(Error::NoPrimaryItem { option: 1 })
        );
        assert_eq!(table.add_option(&[]), Err(Error::NoPrimaryItem { option: 1 }));
        assert_eq!(snapshot(&table), before);
        assert_eq!(table.option_count, 1);
    }

    #[test]
    fn cover_hides_conflicting_options() {
        let mut table = Table::new(&['a', 'b', 'c'], &[]).unwrap();
        table.add_option(&['a', 'b']).unwrap();
        table.add_option(&['b', 'c']).unwrap();
        table.add_option(&['c']).unwrap();

        let b = ItemIndex::new(2);
        table.cover(b);
        assert_eq!(active(&table, PRIMARY_HEADER), [ItemIndex::new(1), ItemIndex::new(3)]);
        assert_eq!(table.item(ItemIndex::new(1)).len(), 0);
        assert_eq!(table.item(ItemIndex::new(3)).len(), 1);
        // The vertical list of the covered item itself is left intact.
        assert_eq!(table.item(b).len(), 2);
    }

    #[test]
    fn choose_item_breaks_ties_by_list_position() {
        let mut table = Table::new(&['a', 'b', 'c'], &[]).unwrap();
        table.add_option(&['c']).unwrap();
        table.add_option(&['a', 'c']).unwrap();
        table.add_option(&['b']).unwrap();
        table.add_option(&['a', 'b']).unwrap();
        table.add_option(&['c']).unwrap();
        // 'a' and 'b' have two options each, and 'c' has three.
        for _ in 0..10 {
            assert_eq!(table.choose_item(|_, i| i.len()), Some(ItemIndex::new(1)));
        }
        // A zero heuristic wins immediately.
        assert_eq!(
            table.choose_item(|ix, _| if ix.get() == 3 { 0 } else { 1 }),
            Some(ItemIndex::new(3))
        );
        table.cover(ItemIndex::new(1));
        table.cover(ItemIndex::new(2));
        table.cover(ItemIndex::new(3));
        assert_eq!(table.choose_item(|_, i| i.len()), None);
    }

    #[test]
    fn tweak_and_untweak() {
        let mut table = Table::new(&['a', 'b'], &[]).unwrap();
        table.add_option(&['a', 'b']).unwrap();
        table.add_option(&['a']).unwrap();
        table.add_option(&['b', 'a']).unwrap();
        let before = snapshot(&table);

        let a = ItemIndex::new(1);
        let head = NodeIndex::from(a);
        let first = table.down(head);
        table.tweak(first);
        assert_eq!(table.item(a).len(), 2);
        assert_eq!(table.item(ItemIndex::new(2)).len(), 1);
        let second = table.down(head);
        table.tweak(second);
        assert_eq!(table.item(a).len(), 1);
        assert_eq!(table.position_in_column(first), None);

        // Both tweaked nodes are still reachable from the first one.
        assert_eq!(table.rank_below(first, first), Some(1));
        assert_eq!(table.rank_below(first, second), Some(2));
        let third = table.down(head);
        assert_eq!(table.rank_below(first, third), Some(3));
        assert_eq!(table.rank_below(first, head), None);
        assert_eq!(table.rank_below(head, head), None);

        table.untweak(a, first);
        assert_eq!(snapshot(&table), before);

        // Detaching does not hide the rest of the option.
        table.cover(a);
        let covered = snapshot(&table);
        let first = table.down(head);
        table.detach(first);
        table.detach(table.down(head));
        assert_eq!(column_len(&table, a), 1);
        table.reattach(a, first);
        assert_eq!(snapshot(&table), covered);
        table.uncover(a);
        assert_eq!(snapshot(&table), before);
    }

    /// Generates a problem with at most four primary and two secondary
    /// items, as `(n_1, n_2, options)`, where the options refer to items
    /// by their position and always contain a primary item.
    fn problem() -> impl Strategy<Value = (usize, usize, Vec<Vec<usize>>)> {
        (1usize..5, 0usize..3).prop_flat_map(|(n_1, n_2)| {
            let n = n_1 + n_2;
            let option = (0..n_1, proptest::collection::btree_set(0..n, 0..n)).prop_map(
                |(p, mut rest)| {
                    rest.insert(p);
                    rest.into_iter().collect::<Vec<_>>()
                },
            );
            (
                Just(n_1),
                Just(n_2),
                proptest::collection::vec(option, 0..8),
            )
        })
    }

    proptest! {
        /// Covering a sequence of active items and uncovering them in the
        /// opposite order restores every link and length, and each
        /// intermediate state obeys the same law.
        #[test]
        fn cover_uncover_round_trip(
            (n_1, n_2, options) in problem(),
            picks in proptest::collection::vec(any::<usize>(), 0..6),
        ) {
            let labels: Vec<usize> = (0..n_1 + n_2).collect();
            let mut table = Table::new(&labels[..n_1], &labels[n_1..]).unwrap();
            for option in &options {
                let option: Vec<usize> = option.iter().map(|&ix| labels[ix]).collect();
                table.add_option(&option).unwrap();
            }

            let mut states = vec![snapshot(&table)];
            let mut covered = Vec::new();
            let secondary_head = ItemIndex::new(n_1 + n_2 + 1);
            for pick in picks {
                let mut candidates = active(&table, PRIMARY_HEADER);
                candidates.extend(active(&table, secondary_head));
                if candidates.is_empty() {
                    break;
                }
                let ix = candidates[pick % candidates.len()];

                // A lone cover/uncover pair is an identity.
                let before = snapshot(&table);
                table.cover(ix);
                table.uncover(ix);
                prop_assert_eq!(&snapshot(&table), &before);

                table.cover(ix);
                for item_ix in 1..=n_1 + n_2 {
                    let item_ix = ItemIndex::new(item_ix);
                    prop_assert_eq!(table.item(item_ix).len(), column_len(&table, item_ix));
                }
                covered.push(ix);
                states.push(snapshot(&table));
            }
            while let Some(ix) = covered.pop() {
                states.pop();
                table.uncover(ix);
                prop_assert_eq!(&snapshot(&table), states.last().unwrap());
            }
        }
    }
}
