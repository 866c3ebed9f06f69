use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};




/**
 * Identity tag of a box layout. Every layout gets a fresh tag when it is
 * constructed; clones of a layout share the tag. The zero tag is reserved
 * for null patch indexes.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayoutId(u64);

static NEXT_LAYOUT_ID: AtomicU64 = AtomicU64::new(1);

impl LayoutId {

    pub(crate) const NULL: LayoutId = LayoutId(0);

    pub(crate) fn fresh() -> Self {
        Self(NEXT_LAYOUT_ID.fetch_add(1, AtomicOrdering::Relaxed))
    }
}




/// Capability marker: the index addresses any patch in a layout.
#[derive(Debug)]
pub enum Global {}

/// Capability marker: the index addresses a patch owned by this process,
/// and carries its position in local storage.
#[derive(Debug)]
pub enum Local {}




/**
 * A cheap, comparable token identifying one patch within a box layout.
 * Indexes are minted only by `BoxLayout`, and are only meaningful against
 * the layout that minted them; containers assert this in debug builds.
 *
 * Equality, ordering and hashing consider only the patch position in the
 * layout's box sequence.
 */
pub struct PatchIndex<Scope> {
    position: usize,
    local: usize,
    layout: LayoutId,
    scope: PhantomData<Scope>,
}

/// Index of any patch in a layout.
pub type LayoutIndex = PatchIndex<Global>;

/// Index of a patch owned by the current process.
pub type DataIndex = PatchIndex<Local>;




// ============================================================================
impl<Scope> PatchIndex<Scope> {

    pub(crate) fn new(position: usize, local: usize, layout: LayoutId) -> Self {
        Self { position, local, layout, scope: PhantomData }
    }


    /**
     * Return the sentinel index, which refers to no patch.
     */
    pub fn null() -> Self {
        Self::new(usize::MAX, usize::MAX, LayoutId::NULL)
    }


    pub fn is_null(&self) -> bool {
        self.layout == LayoutId::NULL
    }


    /**
     * Return the identity of the layout that minted this index.
     */
    pub fn layout_id(&self) -> LayoutId {
        self.layout
    }


    /**
     * The raw position of this patch in the layout's box sequence.
     */
    pub(crate) fn int_code(&self) -> usize {
        self.position
    }
}

impl DataIndex {

    /**
     * Position of this patch in the local storage vector.
     */
    pub(crate) fn local(&self) -> usize {
        self.local
    }
}




// ============================================================================
impl<Scope> Clone for PatchIndex<Scope> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Scope> Copy for PatchIndex<Scope> {}

impl<Scope> Default for PatchIndex<Scope> {
    fn default() -> Self {
        Self::null()
    }
}

impl<Scope> PartialEq for PatchIndex<Scope> {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position
    }
}

impl<Scope> Eq for PatchIndex<Scope> {}

impl<Scope> PartialOrd for PatchIndex<Scope> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<Scope> Ord for PatchIndex<Scope> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.position.cmp(&other.position)
    }
}

impl<Scope> Hash for PatchIndex<Scope> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.position.hash(state)
    }
}

impl<Scope> fmt::Debug for PatchIndex<Scope> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(fmt, "PatchIndex(null)")
        } else {
            write!(fmt, "PatchIndex({} @ {:?})", self.position, self.layout)
        }
    }
}

impl From<DataIndex> for LayoutIndex {
    fn from(index: DataIndex) -> Self {
        Self::new(index.position, index.local, index.layout)
    }
}
