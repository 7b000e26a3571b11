/// The position of an item in the `items` table of a [`Table`].
///
/// Position 0 is the head of the ring of active primary items, and position
/// $N+1$ is the head of the ring of active secondary items; the $N$ items
/// themselves occupy positions $1,\dots,N$ in input order.
///
/// [`Table`]: `crate::table::Table`
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
#[repr(transparent)]
pub struct ItemIndex(usize);

impl ItemIndex {
    /// Creates a new index.
    #[must_use]
    pub const fn new(ix: usize) -> Self {
        Self(ix)
    }

    /// Returns the index value as a primitive type.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }
}

/// The position of a record in the `nodes` table of a [`Table`].
///
/// The first $N+1$ records are the heads of the vertical lists, so the
/// header of the item at [`ItemIndex`] $i$ sits at `NodeIndex` $i$. Spacers
/// and item instances come afterwards.
///
/// [`Table`]: `crate::table::Table`
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
#[repr(transparent)]
pub struct NodeIndex(usize);

impl NodeIndex {
    /// Creates a new index.
    #[must_use]
    pub const fn new(ix: usize) -> Self {
        Self(ix)
    }

    /// Returns the index value as a primitive type.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }

    /// Returns the position of the previous record in the table.
    ///
    /// The result is meaningful only if `self` is positive, which is always
    /// the case for spacers and item instances.
    #[must_use]
    pub fn decrement(self) -> Self {
        Self(self.0 - 1)
    }

    /// Returns the position of the next record in the table.
    #[must_use]
    pub fn increment(self) -> Self {
        Self(self.0 + 1)
    }
}

impl From<ItemIndex> for NodeIndex {
    /// Returns the position of the head of the item's vertical list.
    fn from(ix: ItemIndex) -> Self {
        Self(ix.get())
    }
}
