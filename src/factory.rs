use core::ops::Range;
use std::sync::Mutex;
use crate::fab::{Fab, FabView};
use crate::index::{DataIndex, LayoutId};
use crate::index_space::{check_interval, IndexSpace};
use crate::layout_data::BoxLayoutData;




/**
 * Allocation policy for the payloads of a distributed container. The
 * container calls `create` once for every patch owned by the current
 * process, passing the patch's box, the number of components, and the
 * patch index.
 *
 * `create` must return a fully constructed payload; a factory that cannot
 * allocate should panic (allocation failure is not recoverable). If
 * `thread_safe` returns `false`, the container never calls `create`
 * concurrently and visits its patches sequentially. `call_delete` reports
 * whether the payloads own their memory; it is `false` for factories
 * whose payloads alias memory owned elsewhere.
 */
pub trait DataFactory<T>: Sync {

    fn create(&self, region: &IndexSpace, num_comps: usize, index: DataIndex) -> T;

    fn thread_safe(&self) -> bool {
        true
    }

    fn call_delete(&self) -> bool {
        true
    }
}




/**
 * Factory for owned dense arrays, optionally grown by a ghost-growth vector
 * around each patch box.
 */
#[derive(Clone, Copy, Debug, Default)]
pub struct FabFactory {
    ghost: (i64, i64),
}

impl FabFactory {

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ghost(ghost: (i64, i64)) -> Self {
        Self { ghost }
    }
}

impl DataFactory<Fab> for FabFactory {
    fn create(&self, region: &IndexSpace, num_comps: usize, _: DataIndex) -> Fab {
        Fab::new(region.grow(self.ghost), num_comps)
    }
}




/**
 * Factory for non-owning views onto a component interval of an existing
 * container of dense arrays. A container defined with this factory, on the
 * source container's layout, aliases the source's memory: writes through
 * the alias are visible in the source, and dropping the alias leaves the
 * source untouched. Each source patch can be aliased once.
 */
pub struct AliasFactory<'a> {
    layout: LayoutId,
    views: Mutex<Vec<Option<AliasedPatch<'a>>>>,
    num_comps: usize,
}

struct AliasedPatch<'a> {
    valid: IndexSpace,
    region: IndexSpace,
    data: &'a mut [f64],
}

impl<'a> AliasFactory<'a> {

    pub fn new(source: &'a mut BoxLayoutData<Fab>, comps: Range<usize>) -> Self {
        check_interval(&comps, source.num_comps());

        let num_comps = comps.len();
        let layout = source.layout().clone();
        let views = source
            .iter_mut()
            .map(|(index, fab)| {
                let valid = layout[index].clone();
                let region = fab.region().clone();
                let n = region.len();
                let data = &mut fab.as_mut_slice()[comps.start * n..comps.end * n];
                Some(AliasedPatch { valid, region, data })
            })
            .collect();

        Self { layout: layout.id(), views: Mutex::new(views), num_comps }
    }
}

impl<'a> DataFactory<FabView<'a>> for AliasFactory<'a> {

    fn create(&self, region: &IndexSpace, num_comps: usize, index: DataIndex) -> FabView<'a> {
        debug_assert_eq!(num_comps, self.num_comps, "alias must have as many components as its source interval");
        debug_assert_eq!(index.layout_id(), self.layout, "alias must be defined on the layout of its source");

        let view = self.views
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get_mut(index.local())
            .and_then(Option::take);

        match view {
            Some(patch) => {
                debug_assert_eq!(region, &patch.valid, "alias patch does not match its source patch");
                FabView::new(patch.region, num_comps, patch.data)
            }
            None => panic!("patch {:?} has no memory left to alias", index),
        }
    }

    fn call_delete(&self) -> bool {
        false
    }
}




/**
 * Factory that builds payloads from a closure. It is thread safe unless
 * marked `sequential`, in which case containers create (and later visit)
 * its payloads one patch at a time.
 */
pub struct FnFactory<F> {
    f: F,
    thread_safe: bool,
}

impl<F> FnFactory<F> {

    pub fn new(f: F) -> Self {
        Self { f, thread_safe: true }
    }

    pub fn sequential(self) -> Self {
        Self { thread_safe: false, ..self }
    }
}

impl<T, F> DataFactory<T> for FnFactory<F>
where
    F: Fn(&IndexSpace, usize, DataIndex) -> T + Sync
{
    fn create(&self, region: &IndexSpace, num_comps: usize, index: DataIndex) -> T {
        (self.f)(region, num_comps, index)
    }

    fn thread_safe(&self) -> bool {
        self.thread_safe
    }
}
