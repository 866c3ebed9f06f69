use core::ops::{Index, IndexMut, Range};
use log::{debug, info};
use rayon::prelude::*;
use crate::factory::DataFactory;
use crate::index::DataIndex;
use crate::index_space::{check_interval, IndexSpace};
use crate::layout::BoxLayout;
use crate::linear::Linearize;
use crate::options::DataOptions;




/**
 * Interface for the payload of one patch in a distributed container: a
 * multi-component data object covering (at least) a rectangular region,
 * which can copy a component interval from another payload of the same
 * type.
 */
pub trait PatchData {

    /// The region covered by the payload, including any ghost zones.
    fn region(&self) -> &IndexSpace;

    /// The number of components.
    fn num_comps(&self) -> usize;

    /// Copy `src_comps` of `src` into `dst_comps` of this payload, over the
    /// part of `region` where both payloads have data. The intervals must
    /// have the same length.
    fn copy_from(&mut self, region: &IndexSpace, dst_comps: Range<usize>, src: &Self, src_comps: Range<usize>);
}




/**
 * A distributed container holding one payload for each patch of a box
 * layout that is owned by the current process. Payloads are manufactured
 * by a `DataFactory` when the container is defined, and addressed by the
 * `DataIndex` handles the layout hands out.
 *
 * Operations that visit every patch (definition, `apply`, `set_vector`,
 * `copy_to`) run across patches in parallel when both the factory is
 * thread safe and the container's options allow it. A unit of parallel
 * work is always one whole patch.
 *
 * A container is undefined until `define` is called; re-defining it first
 * drops the previous payloads.
 */
pub struct BoxLayoutData<T> {
    layout: Option<BoxLayout>,
    num_comps: usize,
    data: Vec<T>,
    thread_safe: bool,
    owning: bool,
    options: DataOptions,
}




// ============================================================================
impl<T> BoxLayoutData<T> {


    pub fn new() -> Self {
        Self::with_options(DataOptions::default())
    }


    pub fn with_options(options: DataOptions) -> Self {
        Self {
            layout: None,
            num_comps: 0,
            data: Vec::new(),
            thread_safe: true,
            owning: true,
            options,
        }
    }


    /**
     * Allocate one payload per locally-owned patch of the layout, using the
     * given factory. Any previous payloads are dropped first.
     */
    pub fn define<F>(&mut self, layout: &BoxLayout, num_comps: usize, factory: &F)
    where
        F: DataFactory<T> + ?Sized,
        T: Send,
    {
        debug_assert!(num_comps > 0, "a container needs at least one component");

        self.clear();
        self.thread_safe = factory.thread_safe();
        self.owning = factory.call_delete();
        self.num_comps = num_comps;

        let patches: Vec<_> = layout.data_iter().map(|index| (index, &layout[index])).collect();

        self.data = if self.is_parallel() {
            patches.par_iter().map(|&(index, region)| factory.create(region, num_comps, index)).collect()
        } else {
            patches.iter().map(|&(index, region)| factory.create(region, num_comps, index)).collect()
        };
        self.layout = Some(layout.clone());

        self.log(format_args!(
            "defined {} of {} patches with {} components ({}, {})",
            self.data.len(),
            layout.len(),
            num_comps,
            if self.owning { "owning" } else { "aliasing" },
            if self.is_parallel() { "parallel" } else { "sequential" }));
    }


    /**
     * Drop all payloads and return to the undefined state. Payloads that
     * own their memory release it; payloads that alias memory owned
     * elsewhere leave it untouched.
     */
    pub fn clear(&mut self) {
        if self.layout.is_some() {
            debug!(
                "releasing {} {} payloads",
                self.data.len(),
                if self.owning { "owned" } else { "aliased" });
        }
        self.data.clear();
        self.layout = None;
        self.num_comps = 0;
    }


    pub fn is_defined(&self) -> bool {
        self.layout.is_some()
    }


    pub fn layout(&self) -> &BoxLayout {
        match &self.layout {
            Some(layout) => layout,
            None => panic!("container used before it was defined"),
        }
    }


    pub fn num_comps(&self) -> usize {
        self.num_comps
    }


    /**
     * Return the number of payloads held by this process.
     */
    pub fn len(&self) -> usize {
        self.data.len()
    }


    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }


    /**
     * Whether the payloads own their memory (as reported by the factory).
     */
    pub fn is_owning(&self) -> bool {
        self.owning
    }


    pub fn is_thread_safe(&self) -> bool {
        self.thread_safe
    }


    pub fn options(&self) -> DataOptions {
        self.options
    }


    pub fn get(&self, index: DataIndex) -> &T {
        self.check(&index);
        &self.data[index.local()]
    }


    pub fn get_mut(&mut self, index: DataIndex) -> &mut T {
        self.check(&index);
        &mut self.data[index.local()]
    }


    /**
     * Return an iterator over the local patches and their payloads.
     */
    pub fn iter(&self) -> impl Iterator<Item = (DataIndex, &T)> + '_ {
        self.layout().data_iter().zip(self.data.iter())
    }


    pub fn iter_mut(&mut self) -> impl Iterator<Item = (DataIndex, &mut T)> + '_ {
        let layout = match &self.layout {
            Some(layout) => layout,
            None => panic!("container used before it was defined"),
        };
        layout.data_iter().zip(self.data.iter_mut())
    }


    /**
     * Invoke a function once for every local patch, with the patch box (not
     * including ghost zones), the number of components, and the payload.
     */
    pub fn apply<F>(&mut self, f: F)
    where
        F: Fn(&IndexSpace, usize, &mut T) + Sync + Send,
        T: Send,
    {
        let layout = self.layout().clone();
        let num_comps = self.num_comps;
        let parallel = self.is_parallel();
        let boxes: Vec<&IndexSpace> = layout.data_iter().map(|index| &layout[index]).collect();

        if parallel {
            boxes.par_iter().zip(self.data.par_iter_mut()).for_each(|(region, item)| f(*region, num_comps, item))
        } else {
            boxes.iter().zip(self.data.iter_mut()).for_each(|(region, item)| f(*region, num_comps, item))
        }
    }


    fn is_parallel(&self) -> bool {
        self.thread_safe && self.options.parallel
    }


    fn check(&self, index: &DataIndex) {
        debug_assert!(!index.is_null(), "null patch index used on a container");
        debug_assert_eq!(
            Some(index.layout_id()),
            self.layout.as_ref().map(BoxLayout::id),
            "patch index minted by a different layout");
    }


    fn log(&self, message: core::fmt::Arguments) {
        if self.options.verbose {
            info!("{}", message)
        } else {
            debug!("{}", message)
        }
    }
}




// ============================================================================
impl<T: PatchData> BoxLayoutData<T> {


    /**
     * Define this container on the layout of `source`, with one component
     * for each component in `comps`, and copy those components of the
     * source into it.
     *
     * A container cannot be defined from itself; the borrow checker
     * rejects the attempt:
     *
     * ```compile_fail
     * use ebgrid::{range2d, BoxLayout, BoxLayoutData, FabFactory};
     *
     * let layout = BoxLayout::serial(vec![range2d(0..4, 0..4)]);
     * let mut level = BoxLayoutData::new();
     * level.define(&layout, 2, &FabFactory::new());
     * level.define_from(&level, 0..1, &FabFactory::new());
     * ```
     */
    pub fn define_from<F>(&mut self, source: &Self, comps: Range<usize>, factory: &F)
    where
        F: DataFactory<T> + ?Sized,
        T: Send + Sync,
    {
        check_interval(&comps, source.num_comps);
        self.define(source.layout(), comps.len(), factory);
        self.set_vector(source, comps.clone(), 0..comps.len());
    }


    /**
     * Copy `src_comps` of a container on the same layout into `dst_comps`
     * of this one, patch by patch, over the region where each pair of
     * payloads overlaps.
     */
    pub fn set_vector(&mut self, source: &Self, src_comps: Range<usize>, dst_comps: Range<usize>)
    where
        T: Send + Sync,
    {
        debug_assert!(self.layout().same_as(source.layout()), "set_vector requires containers on the same layout");
        check_interval(&src_comps, source.num_comps);
        check_interval(&dst_comps, self.num_comps);
        debug_assert_eq!(src_comps.len(), dst_comps.len(), "component intervals differ in length");

        let op = |dst: &mut T, src: &T| {
            let region = dst.region().intersect(src.region());

            if !region.is_empty() {
                dst.copy_from(&region, dst_comps.clone(), src, src_comps.clone())
            }
        };

        if self.is_parallel() {
            self.data.par_iter_mut().zip(source.data.par_iter()).for_each(|(dst, src)| op(dst, src))
        } else {
            self.data.iter_mut().zip(source.data.iter()).for_each(|(dst, src)| op(dst, src))
        }
    }


    /**
     * Copy `src_comps` of this container into `dst_comps` of a container on
     * any layout. Every destination payload receives data from each local
     * source patch whose box overlaps it. Overlaps with patches owned by
     * other processes are not visited here; those go through the
     * linearization protocol.
     */
    pub fn copy_to(&self, src_comps: Range<usize>, dest: &mut Self, dst_comps: Range<usize>)
    where
        T: Send + Sync,
    {
        check_interval(&src_comps, self.num_comps);
        check_interval(&dst_comps, dest.num_comps);
        debug_assert_eq!(src_comps.len(), dst_comps.len(), "component intervals differ in length");

        let layout = self.layout();
        let sources: Vec<(&IndexSpace, &T)> = self.iter().map(|(index, item)| (&layout[index], item)).collect();

        let op = |dst: &mut T| {
            for &(valid, src) in &sources {
                let region = valid.intersect(dst.region()).intersect(src.region());

                if !region.is_empty() {
                    dst.copy_from(&region, dst_comps.clone(), src, src_comps.clone())
                }
            }
        };

        if dest.is_parallel() {
            dest.data.par_iter_mut().for_each(op)
        } else {
            dest.data.iter_mut().for_each(op)
        }
    }
}




// ============================================================================
impl<T: Linearize> BoxLayoutData<T> {


    /**
     * Return the number of bytes needed to pack a region and component
     * interval of one patch.
     */
    pub fn size(&self, index: DataIndex, region: &IndexSpace, comps: Range<usize>) -> usize {
        check_interval(&comps, self.num_comps);
        self.get(index).linear_size(region, comps)
    }


    /**
     * Pack a region and component interval of one patch into the front of
     * the buffer, and return the number of bytes written.
     */
    pub fn pack(&self, index: DataIndex, region: &IndexSpace, comps: Range<usize>, buffer: &mut [u8]) -> usize {
        check_interval(&comps, self.num_comps);
        self.get(index).linear_out(buffer, region, comps)
    }


    /**
     * Unpack bytes written by `pack` (with the same region and component
     * interval) into one patch, and return the number of bytes read.
     */
    pub fn unpack(&mut self, index: DataIndex, region: &IndexSpace, comps: Range<usize>, buffer: &[u8]) -> usize {
        check_interval(&comps, self.num_comps);
        self.get_mut(index).linear_in(buffer, region, comps)
    }
}




// ============================================================================
impl<T> Default for BoxLayoutData<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<DataIndex> for BoxLayoutData<T> {
    type Output = T;

    fn index(&self, index: DataIndex) -> &T {
        self.get(index)
    }
}

impl<T> IndexMut<DataIndex> for BoxLayoutData<T> {
    fn index_mut(&mut self, index: DataIndex) -> &mut T {
        self.get_mut(index)
    }
}
