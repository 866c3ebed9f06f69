use core::mem::size_of;
use core::ops::{Index, IndexMut, Range};
use crate::index_space::{check_interval, IndexSpace};
use crate::layout_data::PatchData;
use crate::linear::{ByteReader, ByteWriter, Linearize};




/**
 * A dense, multi-component array of `f64` values covering a rectangular
 * index space. Storage is component-major: all the values of component 0
 * in row-major order, then component 1, and so on. A contiguous range of
 * components is therefore a contiguous slice of the buffer.
 *
 * The storage type decides ownership: a `Fab` owns its buffer, and a
 * `FabView` borrows a slice of memory that belongs to someone else.
 * Dropping a view never frees the memory it aliases.
 */
#[derive(Clone, Debug)]
pub struct BaseFab<S> {
    region: IndexSpace,
    num_comps: usize,
    data: S,
}

/// A dense array that owns its storage.
pub type Fab = BaseFab<Vec<f64>>;

/// A dense array over borrowed storage.
pub type FabView<'a> = BaseFab<&'a mut [f64]>;




// ============================================================================
impl Fab {


    /**
     * Create a zero-initialized array over the given region.
     */
    pub fn new(region: IndexSpace, num_comps: usize) -> Self {
        let data = vec![0.0; region.len() * num_comps];
        Self { region, num_comps, data }
    }


    /**
     * Generate an array over the given region, with values defined from a
     * closure of the index and component.
     */
    pub fn from_function<F>(region: IndexSpace, num_comps: usize, f: F) -> Self
    where
        F: Fn((i64, i64), usize) -> f64
    {
        let mut data = Vec::with_capacity(region.len() * num_comps);

        for c in 0..num_comps {
            data.extend(region.iter().map(|index| f(index, c)))
        }
        Self { region, num_comps, data }
    }


    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }
}

impl<'a> FabView<'a> {


    /**
     * Create a view over borrowed memory. The slice must hold exactly
     * `region.len() * num_comps` values.
     */
    pub fn new(region: IndexSpace, num_comps: usize, data: &'a mut [f64]) -> Self {
        assert_eq!(
            data.len(),
            region.len() * num_comps,
            "view storage does not match its region");
        Self { region, num_comps, data }
    }
}




// ============================================================================
impl<S: AsRef<[f64]>> BaseFab<S> {

    pub fn region(&self) -> &IndexSpace {
        &self.region
    }

    pub fn num_comps(&self) -> usize {
        self.num_comps
    }

    pub fn as_slice(&self) -> &[f64] {
        self.data.as_ref()
    }


    /**
     * Return the values of one component, in row-major order.
     */
    pub fn component(&self, comp: usize) -> &[f64] {
        let n = self.region.len();
        &self.data.as_ref()[comp * n..(comp + 1) * n]
    }


    /**
     * Return the sum of all values over a region and component interval.
     */
    pub fn sum(&self, region: &IndexSpace, comps: Range<usize>) -> f64 {
        let region = region.intersect(&self.region);

        if region.is_empty() {
            return 0.0
        }
        let selection = region.memory_region_in(&self.region);
        comps.map(|c| selection.iter_slice(self.component(c), 1).map(|x| x[0]).sum::<f64>()).sum()
    }


    fn offset(&self, index: (i64, i64), comp: usize) -> usize {
        debug_assert!(
            self.region.contains(index) && comp < self.num_comps,
            "index {:?} component {} out of range on array {:?}", index, comp, self.region);
        comp * self.region.len() + self.region.row_major_offset(index)
    }
}

impl<S: AsRef<[f64]> + AsMut<[f64]>> BaseFab<S> {

    pub fn component_mut(&mut self, comp: usize) -> &mut [f64] {
        let n = self.region.len();
        &mut self.data.as_mut()[comp * n..(comp + 1) * n]
    }

    pub fn set_val(&mut self, value: f64) {
        self.data.as_mut().iter_mut().for_each(|x| *x = value)
    }

    pub fn set_val_comp(&mut self, comp: usize, value: f64) {
        self.component_mut(comp).iter_mut().for_each(|x| *x = value)
    }


    /**
     * Copy a component interval of another array into this one, over the
     * part of `region` covered by both arrays.
     */
    pub fn copy_from<R: AsRef<[f64]>>(
        &mut self,
        region: &IndexSpace,
        dst_comps: Range<usize>,
        src: &BaseFab<R>,
        src_comps: Range<usize>)
    {
        check_interval(&src_comps, src.num_comps);
        check_interval(&dst_comps, self.num_comps);
        debug_assert_eq!(src_comps.len(), dst_comps.len(), "component intervals differ in length");

        let region = region.intersect(&self.region).intersect(&src.region);

        if region.is_empty() {
            return
        }
        let src_sel = region.memory_region_in(&src.region);
        let dst_sel = region.memory_region_in(&self.region);

        for (sc, dc) in src_comps.zip(dst_comps) {
            let s = src.component(sc);
            let d = self.component_mut(dc);

            for (a, b) in dst_sel.iter_slice_mut(d, 1).zip(src_sel.iter_slice(s, 1)) {
                a.copy_from_slice(b)
            }
        }
    }
}




// ============================================================================
impl<S: AsRef<[f64]>> Index<((i64, i64), usize)> for BaseFab<S> {
    type Output = f64;

    fn index(&self, (index, comp): ((i64, i64), usize)) -> &f64 {
        &self.data.as_ref()[self.offset(index, comp)]
    }
}

impl<S: AsRef<[f64]> + AsMut<[f64]>> IndexMut<((i64, i64), usize)> for BaseFab<S> {
    fn index_mut(&mut self, (index, comp): ((i64, i64), usize)) -> &mut f64 {
        let n = self.offset(index, comp);
        &mut self.data.as_mut()[n]
    }
}




// ============================================================================
impl<S: AsRef<[f64]> + AsMut<[f64]>> PatchData for BaseFab<S> {

    fn region(&self) -> &IndexSpace {
        &self.region
    }

    fn num_comps(&self) -> usize {
        self.num_comps
    }

    fn copy_from(&mut self, region: &IndexSpace, dst_comps: Range<usize>, src: &Self, src_comps: Range<usize>) {
        BaseFab::copy_from(self, region, dst_comps, src, src_comps)
    }
}

impl<S: AsRef<[f64]> + AsMut<[f64]>> Linearize for BaseFab<S> {

    fn linear_size(&self, region: &IndexSpace, comps: Range<usize>) -> usize {
        region.intersect(&self.region).len() * comps.len() * size_of::<f64>()
    }

    fn linear_out(&self, buffer: &mut [u8], region: &IndexSpace, comps: Range<usize>) -> usize {
        check_interval(&comps, self.num_comps);
        let region = region.intersect(&self.region);

        if region.is_empty() {
            return 0
        }
        let selection = region.memory_region_in(&self.region);
        let mut writer = ByteWriter::new(buffer);

        for c in comps {
            for row in selection.iter_slice(self.component(c), 1) {
                writer.put_slice(row)
            }
        }
        writer.position()
    }

    fn linear_in(&mut self, buffer: &[u8], region: &IndexSpace, comps: Range<usize>) -> usize {
        check_interval(&comps, self.num_comps);
        let region = region.intersect(&self.region);

        if region.is_empty() {
            return 0
        }
        let selection = region.memory_region_in(&self.region);
        let mut reader = ByteReader::new(buffer);

        for c in comps {
            for x in selection.iter_slice_mut(self.component_mut(c), 1) {
                x[0] = reader.get()
            }
        }
        reader.position()
    }
}
