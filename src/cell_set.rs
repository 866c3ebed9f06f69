use core::iter::FromIterator;
use std::collections::BTreeSet;
use serde::{Deserialize, Serialize};
use crate::index_space::IndexSpace;




/**
 * An arbitrary (not necessarily rectangular) set of cells. Iteration is
 * always in row-major order, which gives every container built from a set
 * a deterministic storage and wire order.
 */
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSet {
    cells: BTreeSet<(i64, i64)>,
}




// ============================================================================
impl CellSet {

    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_space(space: &IndexSpace) -> Self {
        space.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, cell: (i64, i64)) -> bool {
        self.cells.contains(&cell)
    }

    pub fn insert(&mut self, cell: (i64, i64)) -> bool {
        self.cells.insert(cell)
    }

    pub fn remove(&mut self, cell: (i64, i64)) -> bool {
        self.cells.remove(&cell)
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.cells.iter().copied()
    }


    /**
     * Return an iterator over the cells of this set that lie in the given
     * region, in row-major order.
     */
    pub fn iter_in<'a>(&'a self, region: &'a IndexSpace) -> impl Iterator<Item = (i64, i64)> + 'a {
        let (di, dj) = region.as_rect_ref();
        let dj = dj.clone();
        di.clone().flat_map(move |i| self.cells.range((i, dj.start)..(i, dj.end)).copied())
    }


    /**
     * Return the smallest index space containing every cell of the set. The
     * bounding box of an empty set is empty.
     */
    pub fn bounding_box(&self) -> IndexSpace {
        let mut cells = self.cells.iter();

        let first = match cells.next() {
            Some(&cell) => cell,
            None => return IndexSpace::new(0..0, 0..0),
        };
        let (mut lo, mut hi) = (first, first);

        for &(i, j) in cells {
            lo = (lo.0.min(i), lo.1.min(j));
            hi = (hi.0.max(i), hi.1.max(j));
        }
        IndexSpace::new(lo.0..hi.0 + 1, lo.1..hi.1 + 1)
    }


    /**
     * Return the cells of this set that lie in the given region.
     */
    pub fn restrict(&self, region: &IndexSpace) -> Self {
        self.iter_in(region).collect()
    }
}




// ============================================================================
impl FromIterator<(i64, i64)> for CellSet {
    fn from_iter<I: IntoIterator<Item = (i64, i64)>>(iter: I) -> Self {
        Self { cells: iter.into_iter().collect() }
    }
}

impl Extend<(i64, i64)> for CellSet {
    fn extend<I: IntoIterator<Item = (i64, i64)>>(&mut self, iter: I) {
        self.cells.extend(iter)
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::CellSet;
    use crate::index_space::range2d;

    #[test]
    fn iteration_is_row_major() {
        let cells: CellSet = vec![(2, 0), (0, 3), (0, 1), (1, 5)].into_iter().collect();
        assert_eq!(cells.iter().collect::<Vec<_>>(), vec![(0, 1), (0, 3), (1, 5), (2, 0)]);
    }

    #[test]
    fn region_query_visits_only_contained_cells() {
        let cells: CellSet = vec![(0, 0), (0, 4), (1, 2), (3, 3), (2, 9)].into_iter().collect();
        let region = range2d(0..3, 1..5);
        assert_eq!(cells.iter_in(&region).collect::<Vec<_>>(), vec![(0, 4), (1, 2)]);
        assert_eq!(cells.restrict(&region).len(), 2);
    }

    #[test]
    fn bounding_box_is_tight() {
        let cells: CellSet = vec![(-1, 4), (2, 0), (0, 2)].into_iter().collect();
        assert_eq!(cells.bounding_box(), range2d(-1..3, 0..5));
        assert!(CellSet::new().bounding_box().is_empty());
        assert_eq!(CellSet::from_space(&range2d(0..2, 0..3)).len(), 6);
    }
}
