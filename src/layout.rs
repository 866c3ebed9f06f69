use core::ops::Index;
use std::sync::Arc;
use crate::index::{DataIndex, LayoutId, LayoutIndex, PatchIndex};
use crate::index_space::IndexSpace;




/**
 * The parallel ownership map for a collection of patches: an ordered
 * sequence of boxes, the rank of the process that owns each one, and the
 * rank of the current process. Layouts are cheap to clone; clones share
 * storage and identity, so indexes minted by one are valid on the others.
 */
#[derive(Clone)]
pub struct BoxLayout {
    inner: Arc<Inner>,
}

struct Inner {
    id: LayoutId,
    boxes: Vec<IndexSpace>,
    procs: Vec<usize>,
    rank: usize,
    local: Vec<usize>,
    local_of: Vec<Option<usize>>,
}




// ============================================================================
impl BoxLayout {


    /**
     * Create a layout from a sequence of boxes and the rank that owns each
     * box, as seen from the process with the given rank.
     */
    pub fn new(boxes: Vec<IndexSpace>, procs: Vec<usize>, rank: usize) -> Self {

        assert_eq!(
            boxes.len(),
            procs.len(),
            "every box in a layout needs an owning rank");

        let mut local = Vec::new();
        let mut local_of = vec![None; boxes.len()];

        for (position, &proc) in procs.iter().enumerate() {
            if proc == rank {
                local_of[position] = Some(local.len());
                local.push(position);
            }
        }

        Self {
            inner: Arc::new(Inner {
                id: LayoutId::fresh(),
                boxes,
                procs,
                rank,
                local,
                local_of,
            })
        }
    }


    /**
     * Create a layout where every box is owned by a single process.
     */
    pub fn serial(boxes: Vec<IndexSpace>) -> Self {
        let procs = vec![0; boxes.len()];
        Self::new(boxes, procs, 0)
    }


    pub fn id(&self) -> LayoutId {
        self.inner.id
    }


    /**
     * Determine whether two layouts are the same object (or clones of it).
     */
    pub fn same_as(&self, other: &Self) -> bool {
        self.id() == other.id()
    }


    /**
     * Return the total number of boxes, on all ranks.
     */
    pub fn len(&self) -> usize {
        self.inner.boxes.len()
    }


    pub fn is_empty(&self) -> bool {
        self.inner.boxes.is_empty()
    }


    /**
     * Return the number of boxes owned by the current process.
     */
    pub fn num_local(&self) -> usize {
        self.inner.local.len()
    }


    pub fn rank(&self) -> usize {
        self.inner.rank
    }


    pub fn boxes(&self) -> &[IndexSpace] {
        &self.inner.boxes
    }


    /**
     * Return the rank owning the given patch.
     */
    pub fn proc_id(&self, index: LayoutIndex) -> usize {
        self.check(&index);
        self.inner.procs[index.int_code()]
    }


    /**
     * Return an iterator over all the patches in the layout, on all ranks.
     */
    pub fn layout_iter(&self) -> impl Iterator<Item = LayoutIndex> + '_ {
        let id = self.id();
        (0..self.len()).map(move |position| {
            LayoutIndex::new(position, self.inner.local_of[position].unwrap_or(usize::MAX), id)
        })
    }


    /**
     * Return an iterator over the patches owned by the current process, in
     * local storage order.
     */
    pub fn data_iter(&self) -> impl Iterator<Item = DataIndex> + '_ {
        let id = self.id();
        self.inner.local.iter().enumerate().map(move |(local, &position)| {
            DataIndex::new(position, local, id)
        })
    }


    /**
     * Return the local index of the given patch, if it is owned by the
     * current process.
     */
    pub fn data_index(&self, index: LayoutIndex) -> Option<DataIndex> {
        self.check(&index);
        self.inner.local_of[index.int_code()].map(|local| DataIndex::new(index.int_code(), local, self.id()))
    }


    /**
     * Return the index of the patch at the given position in the box
     * sequence.
     */
    pub(crate) fn index_at(&self, position: usize) -> Option<LayoutIndex> {
        let local = *self.inner.local_of.get(position)?;
        Some(LayoutIndex::new(position, local.unwrap_or(usize::MAX), self.id()))
    }


    /**
     * Determine whether no two boxes in the layout overlap.
     */
    pub fn is_disjoint(&self) -> bool {
        let boxes = self.boxes();
        boxes.iter().enumerate().all(|(n, a)| boxes[n + 1..].iter().all(|b| !a.intersects(b)))
    }


    fn check<Scope>(&self, index: &PatchIndex<Scope>) {
        debug_assert!(!index.is_null(), "null patch index used on a layout");
        debug_assert_eq!(index.layout_id(), self.id(), "patch index minted by a different layout");
    }
}




// ============================================================================
impl<Scope> Index<PatchIndex<Scope>> for BoxLayout {
    type Output = IndexSpace;

    fn index(&self, index: PatchIndex<Scope>) -> &Self::Output {
        self.check(&index);
        &self.inner.boxes[index.int_code()]
    }
}
