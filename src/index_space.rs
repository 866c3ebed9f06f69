use core::ops::Range;
use serde::{Deserialize, Serialize};




/**
 * Identifier for a Cartesian axis
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Axis {
    I,
    J,
}




/**
 * Identifier for the low or high side of a cell, along some axis
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Lo,
    Hi,
}




// ============================================================================
impl Axis {

    /**
     * Return the index shifted by `delta` along this axis.
     */
    pub fn shift(self, index: (i64, i64), delta: i64) -> (i64, i64) {
        match self {
            Axis::I => (index.0 + delta, index.1),
            Axis::J => (index.0, index.1 + delta),
        }
    }


    /**
     * Return the component of the index along this axis.
     */
    pub fn component(self, index: (i64, i64)) -> i64 {
        match self {
            Axis::I => index.0,
            Axis::J => index.1,
        }
    }
}

impl Side {

    pub const BOTH: [Side; 2] = [Side::Lo, Side::Hi];

    pub fn sign(self) -> i64 {
        match self {
            Side::Lo => -1,
            Side::Hi => 1,
        }
    }
}




/**
 * Represents a rectangular region in a discrete index space. The region may
 * be empty, in which case it still has a well-defined (degenerate) start
 * index.
 */
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexSpace {
    di: Range<i64>,
    dj: Range<i64>,
}




/**
 * Describes a rectangular index space. The index type is signed 64-bit integer.
 */
impl IndexSpace {


    pub fn new(di: Range<i64>, dj: Range<i64>) -> Self {

        assert!(
            di.start <= di.end && dj.start <= dj.end,
            "index space has negative volume");

        Self { di, dj }
    }


    /**
     * Return the number of indexes on each axis.
     */
    pub fn dim(&self) -> (usize, usize) {
        ((self.di.end - self.di.start) as usize,
         (self.dj.end - self.dj.start) as usize)
    }


    /**
     * Return the number of elements in this index space.
     */
    pub fn len(&self) -> usize {
        let (l, m) = self.dim();
        l * m
    }


    /**
     * Determine whether this index space has no elements.
     */
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }


    /**
     * Return the minimum index (inclusive).
     */
    pub fn start(&self) -> (i64, i64) {
        (self.di.start, self.dj.start)
    }


    /**
     * Return the maximum index (exclusive).
     */
    pub fn end(&self) -> (i64, i64) {
        (self.di.end, self.dj.end)
    }


    /**
     * Return the index range on the given axis.
     */
    pub fn range(&self, axis: Axis) -> &Range<i64> {
        match axis {
            Axis::I => &self.di,
            Axis::J => &self.dj,
        }
    }


    /**
     * Return the index space as a rectangle reference (a tuple of `Range`
     * references).
     */
    pub fn as_rect_ref(&self) -> (&Range<i64>, &Range<i64>) {
        (&self.di, &self.dj)
    }


    /**
     * Determine whether this index space contains the given index.
     */
    pub fn contains(&self, index: (i64, i64)) -> bool {
        self.di.contains(&index.0) && self.dj.contains(&index.1)
    }


    /**
     * Determine whether another index space is a subset of this one. The
     * empty space is a subset of every space.
     */
    pub fn contains_space(&self, other: &Self) -> bool {
        other.is_empty() || (
        other.di.start >= self.di.start && other.di.end <= self.di.end &&
        other.dj.start >= self.dj.start && other.dj.end <= self.dj.end)
    }


    /**
     * Return the overlap of this index space with another one. Disjoint
     * spaces yield an empty space.
     */
    pub fn intersect(&self, other: &Self) -> Self {
        let i0 = self.di.start.max(other.di.start);
        let j0 = self.dj.start.max(other.dj.start);
        let i1 = self.di.end.min(other.di.end).max(i0);
        let j1 = self.dj.end.min(other.dj.end).max(j0);
        Self::new(i0..i1, j0..j1)
    }


    /**
     * Determine whether this index space has any elements in common with
     * another one.
     */
    pub fn intersects(&self, other: &Self) -> bool {
        !self.intersect(other).is_empty()
    }


    /**
     * Expand this index space by the given number of elements on each axis.
     */
    pub fn extend_all(&self, delta: i64) -> Self {
        self.grow((delta, delta))
    }


    /**
     * Expand this index space by a ghost-growth vector: `ghost.0` elements
     * on both sides of the I axis and `ghost.1` on both sides of the J axis.
     */
    pub fn grow(&self, ghost: (i64, i64)) -> Self {
        Self::new(
            self.di.start - ghost.0 .. self.di.end + ghost.0,
            self.dj.start - ghost.1 .. self.dj.end + ghost.1)
    }


    /**
     * Expand just the lower side of this index space along the given axis.
     */
    pub fn grow_lo(&self, axis: Axis, delta: i64) -> Self {
        match axis {
            Axis::I => Self::new(self.di.start - delta .. self.di.end, self.dj.clone()),
            Axis::J => Self::new(self.di.clone(), self.dj.start - delta .. self.dj.end),
        }
    }


    /**
     * Expand just the upper side of this index space along the given axis.
     */
    pub fn grow_hi(&self, axis: Axis, delta: i64) -> Self {
        match axis {
            Axis::I => Self::new(self.di.start .. self.di.end + delta, self.dj.clone()),
            Axis::J => Self::new(self.di.clone(), self.dj.start .. self.dj.end + delta),
        }
    }


    /**
     * Translate this index space by `delta` along the given axis.
     */
    pub fn shift(&self, axis: Axis, delta: i64) -> Self {
        match axis {
            Axis::I => Self::new(self.di.start + delta .. self.di.end + delta, self.dj.clone()),
            Axis::J => Self::new(self.di.clone(), self.dj.start + delta .. self.dj.end + delta),
        }
    }


    /**
     * Return the linear offset for the given index, in a row-major memory
     * buffer aligned with the start of this index space.
     */
    pub fn row_major_offset(&self, index: (i64, i64)) -> usize {
        let i = (index.0 - self.di.start) as usize;
        let j = (index.1 - self.dj.start) as usize;
        let m = (self.dj.end - self.dj.start) as usize;
        i * m + j
    }


    /**
     * Return a memory region object corresponding to the selection of this
     * index space in the buffer allocated for another one.
     */
    pub fn memory_region_in(&self, parent: &Self) -> MemoryRegion {
        debug_assert!(parent.contains_space(self), "{:?} is not inside {:?}", self, parent);
        let start = (
            (self.di.start - parent.di.start) as usize,
            (self.dj.start - parent.dj.start) as usize);
        let count = self.dim();
        let shape = parent.dim();
        MemoryRegion { start, count, shape }
    }


    /**
     * Return an iterator which traverses the index space in row-major order
     * (C-like; the final index increases fastest).
     */
    pub fn iter(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.di.clone().flat_map(move |i| self.dj.clone().map(move |j| (i, j)))
    }
}




// ============================================================================
impl From<(Range<i64>, Range<i64>)> for IndexSpace {
    fn from(range: (Range<i64>, Range<i64>)) -> Self {
        Self::new(range.0, range.1)
    }
}

impl<'a> From<(&'a Range<i64>, &'a Range<i64>)> for IndexSpace {
    fn from(range: (&'a Range<i64>, &'a Range<i64>)) -> Self {
        Self::new(range.0.clone(), range.1.clone())
    }
}

impl From<IndexSpace> for (Range<i64>, Range<i64>) {
    fn from(space: IndexSpace) -> Self {
        (space.di, space.dj)
    }
}




/**
 * Less imposing factory function to construct an IndexSpace object.
 */
pub fn range2d(di: Range<i64>, dj: Range<i64>) -> IndexSpace {
    IndexSpace::new(di, dj)
}




/**
 * Assert (in debug builds) that a component interval lies within
 * `0..num_comps`.
 */
pub(crate) fn check_interval(comps: &Range<usize>, num_comps: usize) {
    debug_assert!(
        comps.start <= comps.end && comps.end <= num_comps,
        "component interval {:?} outside 0..{}", comps, num_comps);
}




/**
 * A 2D memory region within a contiguous buffer.
 */
pub struct MemoryRegion {
    start: (usize, usize),
    count: (usize, usize),
    shape: (usize, usize),
}




// ============================================================================
impl MemoryRegion {

    pub fn iter_slice<'a, T>(&'a self, slice: &'a [T], chunk: usize) -> impl Iterator<Item = &'a [T]> {
        let start = &self.start;
        let shape = &self.shape;
        let count = &self.count;
        let r = chunk;
        let q = shape.1 * r;

        assert!(slice.len() == shape.0 * shape.1 * chunk);
        assert!(q > 0, "memory region has a degenerate parent");

        slice[start.0 * q .. (start.0 + count.0) * q]
        .chunks_exact(q).flat_map(move |j| j[start.1 * r .. (start.1 + count.1) * r]
        .chunks_exact(r))
    }

    pub fn iter_slice_mut<'a, T>(&'a self, slice: &'a mut [T], chunk: usize) -> impl Iterator<Item = &'a mut [T]> {
        let start = &self.start;
        let shape = &self.shape;
        let count = &self.count;
        let r = chunk;
        let q = shape.1 * r;

        assert!(slice.len() == shape.0 * shape.1 * chunk);
        assert!(q > 0, "memory region has a degenerate parent");

        slice[start.0 * q .. (start.0 + count.0) * q]
        .chunks_exact_mut(q).flat_map(move |j| j[start.1 * r .. (start.1 + count.1) * r]
        .chunks_exact_mut(r))
    }
}
