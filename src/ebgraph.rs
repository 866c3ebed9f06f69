use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use crate::cell_set::CellSet;
use crate::index_space::{Axis, IndexSpace, Side};




/**
 * A volume of fluid: one of the (possibly several) disconnected fluid
 * regions inside a cell. `slot` numbers the volumes of a cell from zero.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VolIndex {
    pub cell: (i64, i64),
    pub slot: usize,
}

impl VolIndex {
    pub fn new(cell: (i64, i64), slot: usize) -> Self {
        Self { cell, slot }
    }
}




/**
 * A face between two volumes, normal to `axis`. A face is identified by
 * its high adjoining cell and by the slots of the volumes on either side.
 * Faces on a non-periodic domain boundary have no volume on the outside,
 * so the corresponding slot is `None`.
 *
 * The derived ordering sorts faces by high cell (row-major), then slots;
 * containers use it as their storage order.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FaceIndex {
    pub hi_cell: (i64, i64),
    pub lo_slot: Option<usize>,
    pub hi_slot: Option<usize>,
    pub axis: Axis,
    pub boundary: bool,
}




// ============================================================================
impl FaceIndex {

    pub fn new(axis: Axis, hi_cell: (i64, i64), lo_slot: Option<usize>, hi_slot: Option<usize>, boundary: bool) -> Self {
        Self { hi_cell, lo_slot, hi_slot, axis, boundary }
    }


    /**
     * The face between two volumes that are neighbours along `axis`.
     */
    pub fn interior(axis: Axis, lo: VolIndex, hi: VolIndex) -> Self {
        debug_assert_eq!(axis.shift(lo.cell, 1), hi.cell, "volumes are not neighbours along {:?}", axis);
        Self::new(axis, hi.cell, Some(lo.slot), Some(hi.slot), false)
    }


    /**
     * The face on the given side of a volume that touches the domain
     * boundary.
     */
    pub fn boundary(axis: Axis, side: Side, vof: VolIndex) -> Self {
        match side {
            Side::Lo => Self::new(axis, vof.cell, None, Some(vof.slot), true),
            Side::Hi => Self::new(axis, axis.shift(vof.cell, 1), Some(vof.slot), None, true),
        }
    }

    pub fn lo_cell(&self) -> (i64, i64) {
        self.axis.shift(self.hi_cell, -1)
    }

    pub fn is_boundary(&self) -> bool {
        self.boundary
    }


    /**
     * Whether the slots agree with the boundary flag: a boundary face has
     * exactly one absent slot, and an interior face has none.
     */
    pub fn is_well_formed(&self) -> bool {
        let absent = self.lo_slot.is_none() as usize + self.hi_slot.is_none() as usize;
        if self.boundary { absent == 1 } else { absent == 0 }
    }
}




/**
 * Interface to the embedded-boundary geometry: how many volumes each cell
 * holds, which cells are irregular, and how volumes connect across faces.
 * Implementors only need to describe occupancy; the default `faces`
 * provides Cartesian connectivity (every volume of a cell touches every
 * volume of its neighbour) with wrapping on periodic axes.
 */
pub trait EbGraph: Sync {

    /// The problem domain.
    fn domain(&self) -> &IndexSpace;

    /// Whether the domain is periodic along the given axis.
    fn is_periodic(&self, axis: Axis) -> bool;

    /// The number of volumes in a cell: zero if covered, one if regular.
    fn num_vofs(&self, cell: (i64, i64)) -> usize;

    /// The cut (irregular) cells in a region.
    fn irregular_cells(&self, region: &IndexSpace) -> CellSet;


    /**
     * Return the volumes of a cell.
     */
    fn vofs(&self, cell: (i64, i64)) -> Vec<VolIndex> {
        (0..self.num_vofs(cell)).map(|slot| VolIndex::new(cell, slot)).collect()
    }


    /**
     * Return the faces on one side of a volume, along an axis.
     */
    fn faces(&self, vof: VolIndex, axis: Axis, side: Side) -> Vec<FaceIndex> {
        let neighbour = axis.shift(vof.cell, side.sign());
        let domain = self.domain();

        let occupied = if domain.contains(neighbour) {
            neighbour
        } else if self.is_periodic(axis) {
            wrap(domain, axis, neighbour)
        } else {
            return vec![FaceIndex::boundary(axis, side, vof)]
        };

        (0..self.num_vofs(occupied))
            .map(|slot| {
                let other = VolIndex::new(neighbour, slot);
                match side {
                    Side::Lo => FaceIndex::interior(axis, other, vof),
                    Side::Hi => FaceIndex::interior(axis, vof, other),
                }
            })
            .collect()
    }
}




/**
 * Return the image of a cell in the domain, under periodic wrapping along
 * the given axis.
 */
pub fn wrap(domain: &IndexSpace, axis: Axis, cell: (i64, i64)) -> (i64, i64) {
    let range = domain.range(axis);
    let len = range.end - range.start;
    let x = axis.component(cell);
    axis.shift(cell, range.start + (x - range.start).rem_euclid(len) - x)
}




/**
 * A geometry described explicitly: every cell in the domain is regular
 * unless marked cut (with some number of volumes) or covered.
 */
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeometryGraph {
    domain: IndexSpace,
    periodic: [bool; 2],
    marked: BTreeMap<(i64, i64), usize>,
}




// ============================================================================
impl GeometryGraph {

    pub fn regular(domain: IndexSpace) -> Self {
        Self { domain, periodic: [false; 2], marked: BTreeMap::new() }
    }

    pub fn with_periodic(mut self, axis: Axis) -> Self {
        self.periodic[axis as usize] = true;
        self
    }


    /**
     * Mark a cell as cut, holding the given number of volumes.
     */
    pub fn set_cut(&mut self, cell: (i64, i64), num_vofs: usize) {
        assert!(num_vofs > 0, "a cut cell must hold at least one volume; use set_covered");
        assert!(self.domain.contains(cell), "cell {:?} is outside the domain {:?}", cell, self.domain);
        self.marked.insert(cell, num_vofs);
    }

    pub fn set_covered(&mut self, cell: (i64, i64)) {
        self.marked.insert(cell, 0);
    }
}

impl EbGraph for GeometryGraph {

    fn domain(&self) -> &IndexSpace {
        &self.domain
    }

    fn is_periodic(&self, axis: Axis) -> bool {
        self.periodic[axis as usize]
    }

    fn num_vofs(&self, cell: (i64, i64)) -> usize {
        if !self.domain.contains(cell) {
            return 0
        }
        self.marked.get(&cell).copied().unwrap_or(1)
    }

    fn irregular_cells(&self, region: &IndexSpace) -> CellSet {
        self.marked
            .iter()
            .filter(|&(&cell, &n)| n > 0 && region.contains(cell))
            .map(|(&cell, _)| cell)
            .collect()
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::{wrap, EbGraph, FaceIndex, GeometryGraph, VolIndex};
    use crate::index_space::{range2d, Axis, Side};

    #[test]
    fn boundary_faces_have_no_outside_volume() {
        let graph = GeometryGraph::regular(range2d(0..4, 0..4));
        let lo = graph.faces(VolIndex::new((0, 2), 0), Axis::I, Side::Lo);
        let hi = graph.faces(VolIndex::new((3, 2), 0), Axis::I, Side::Hi);
        assert_eq!(lo, vec![FaceIndex::new(Axis::I, (0, 2), None, Some(0), true)]);
        assert_eq!(hi, vec![FaceIndex::new(Axis::I, (4, 2), Some(0), None, true)]);
        assert!(lo[0].is_well_formed() && hi[0].is_well_formed());
    }

    #[test]
    fn faces_connect_every_volume_of_a_multivalued_neighbour() {
        let mut graph = GeometryGraph::regular(range2d(0..4, 0..4));
        graph.set_cut((1, 1), 2);
        let faces = graph.faces(VolIndex::new((1, 0), 0), Axis::J, Side::Hi);
        assert_eq!(faces.len(), 2);
        assert!(faces.iter().all(|f| f.hi_cell == (1, 1) && f.lo_slot == Some(0) && !f.is_boundary()));
        assert_eq!(faces[1].lo_cell(), (1, 0));
    }

    #[test]
    fn periodic_faces_keep_the_unwrapped_key() {
        let mut graph = GeometryGraph::regular(range2d(0..4, 0..4)).with_periodic(Axis::J);
        graph.set_cut((2, 0), 2);
        assert_eq!(wrap(graph.domain(), Axis::J, (2, 4)), (2, 0));
        assert_eq!(wrap(graph.domain(), Axis::J, (2, -1)), (2, 3));

        let faces = graph.faces(VolIndex::new((2, 3), 0), Axis::J, Side::Hi);
        assert_eq!(faces.len(), 2);
        assert!(faces.iter().all(|f| f.hi_cell == (2, 4) && !f.is_boundary()));
    }

    #[test]
    fn covered_cells_have_no_faces_or_volumes() {
        let mut graph = GeometryGraph::regular(range2d(0..4, 0..4));
        graph.set_covered((2, 2));
        graph.set_cut((1, 1), 1);
        assert!(graph.vofs((2, 2)).is_empty());
        assert!(graph.faces(VolIndex::new((1, 2), 0), Axis::I, Side::Hi).is_empty());
        assert_eq!(graph.irregular_cells(&range2d(0..4, 0..4)).iter().collect::<Vec<_>>(), vec![(1, 1)]);
    }
}
