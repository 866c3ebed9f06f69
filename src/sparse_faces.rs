use core::mem::size_of;
use core::ops::{Index, IndexMut, Range};
use std::collections::BTreeSet;
use bytemuck::Pod;
use serde::{Deserialize, Serialize};
use crate::cell_set::CellSet;
use crate::ebgraph::{EbGraph, FaceIndex};
use crate::factory::DataFactory;
use crate::index::DataIndex;
use crate::index_space::{check_interval, Axis, IndexSpace, Side};
use crate::layout_data::PatchData;
use crate::linear::{decode_slot, encode_slot, ByteReader, ByteWriter, Linearize};




/**
 * Which faces belong to a region, for copying and linearization.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaceSemantic {
    /// A face belongs to the region containing its high cell. The faces of
    /// a container are partitioned among disjoint regions.
    HighCell,

    /// A face belongs to any region containing either adjoining cell.
    Surrounding,
}

impl FaceSemantic {
    pub fn includes(self, face: &FaceIndex, region: &IndexSpace) -> bool {
        match self {
            FaceSemantic::HighCell => region.contains(face.hi_cell),
            FaceSemantic::Surrounding => region.contains(face.hi_cell) || region.contains(face.lo_cell()),
        }
    }
}

impl Default for FaceSemantic {
    fn default() -> Self {
        FaceSemantic::Surrounding
    }
}




/**
 * Multi-component data on the faces (normal to one axis) of the volumes in
 * an irregular set of cells. Each face is stored once, keyed by its high
 * cell, even though it is reached from the volumes on both sides.
 *
 * Faces are stored in row-major order of their high cell, then by slots.
 * Storage is component-major, as in `SparseCells`.
 */
#[derive(Clone, Debug)]
pub struct SparseFaces<T> {
    axis: Axis,
    semantic: FaceSemantic,
    cells: CellSet,
    keys: IndexSpace,
    directory: Vec<Option<(usize, usize)>>,
    faces: Vec<FaceIndex>,
    num_comps: usize,
    data: Vec<T>,
}




// ============================================================================
impl<T: Pod> SparseFaces<T> {


    /**
     * Create a zero-initialized container on the faces normal to `axis` of
     * the volumes in the given cells, with connectivity taken from the
     * graph.
     *
     * Panics if the graph reports a face whose slots disagree with its
     * boundary flag.
     */
    pub fn new<G: EbGraph + ?Sized>(axis: Axis, cells: CellSet, graph: &G, num_comps: usize) -> Self {
        let keys = cells.bounding_box().grow_hi(axis, 1);
        let mut unique = BTreeSet::new();

        for cell in cells.iter() {
            for vof in graph.vofs(cell) {
                for side in Side::BOTH {
                    for face in graph.faces(vof, axis, side) {
                        assert!(
                            face.is_well_formed() && face.axis == axis,
                            "graph reported a malformed face {:?} on {:?}", face, vof);
                        unique.insert(face);
                    }
                }
            }
        }

        let faces: Vec<FaceIndex> = unique.into_iter().collect();
        let mut directory: Vec<Option<(usize, usize)>> = vec![None; keys.len()];

        for (k, face) in faces.iter().enumerate() {
            let n = keys.row_major_offset(face.hi_cell);

            directory[n] = match directory[n] {
                Some((start, count)) => Some((start, count + 1)),
                None => Some((k, 1)),
            };
        }
        let data = vec![T::zeroed(); faces.len() * num_comps];

        Self {
            axis,
            semantic: FaceSemantic::default(),
            cells,
            keys,
            directory,
            faces,
            num_comps,
            data,
        }
    }

    pub fn with_semantic(self, semantic: FaceSemantic) -> Self {
        Self { semantic, ..self }
    }

    pub fn semantic(&self) -> FaceSemantic {
        self.semantic
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn cells(&self) -> &CellSet {
        &self.cells
    }

    pub fn num_comps(&self) -> usize {
        self.num_comps
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn faces(&self) -> &[FaceIndex] {
        &self.faces
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn contains(&self, face: &FaceIndex) -> bool {
        self.find(face.hi_cell, face.lo_slot, face.hi_slot).is_some()
    }


    /**
     * Return the storage positions and faces that belong to a region under
     * this container's face semantic, in storage order. Copying and
     * linearization all traverse faces through this iterator.
     */
    pub fn faces_in<'a>(&'a self, region: &'a IndexSpace) -> impl Iterator<Item = (usize, FaceIndex)> + 'a {
        let candidates = region.grow_hi(self.axis, 1).intersect(&self.keys);

        candidates
            .iter()
            .collect::<Vec<_>>()
            .into_iter()
            .flat_map(move |cell| {
                let (start, count) = self.directory[self.keys.row_major_offset(cell)].unwrap_or((0, 0));
                (start..start + count).map(move |k| (k, self.faces[k]))
            })
            .filter(move |(_, face)| self.semantic.includes(face, region))
    }

    pub fn component(&self, comp: usize) -> &[T] {
        let n = self.faces.len();
        &self.data[comp * n..(comp + 1) * n]
    }

    pub fn component_mut(&mut self, comp: usize) -> &mut [T] {
        let n = self.faces.len();
        &mut self.data[comp * n..(comp + 1) * n]
    }

    pub fn set_val(&mut self, value: T) {
        self.data.iter_mut().for_each(|x| *x = value)
    }

    pub fn set_val_comp(&mut self, comp: usize, value: T) {
        self.component_mut(comp).iter_mut().for_each(|x| *x = value)
    }


    /**
     * Call a function with every (face, component) pair and a mutable
     * reference to its value.
     */
    pub fn for_each_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&FaceIndex, usize, &mut T)
    {
        let n = self.faces.len();

        for (k, x) in self.data.iter_mut().enumerate() {
            f(&self.faces[k % n], k / n, x)
        }
    }


    /**
     * Copy a component interval of another container into this one, at
     * the faces of the given region that both containers hold.
     */
    pub fn copy_from(&mut self, region: &IndexSpace, dst_comps: Range<usize>, src: &Self, src_comps: Range<usize>) {
        check_interval(&src_comps, src.num_comps);
        check_interval(&dst_comps, self.num_comps);
        debug_assert_eq!(src_comps.len(), dst_comps.len(), "component intervals differ in length");
        debug_assert_eq!(self.axis, src.axis, "face containers are normal to different axes");

        let shared: Vec<(usize, usize)> = self
            .faces_in(region)
            .filter_map(|(d, face)| src.find(face.hi_cell, face.lo_slot, face.hi_slot).map(|s| (d, s)))
            .collect();

        let (n, m) = (self.faces.len(), src.faces.len());

        for (sc, dc) in src_comps.zip(dst_comps) {
            for &(d, s) in &shared {
                self.data[d + dc * n] = src.data[s + sc * m]
            }
        }
    }

    fn find(&self, hi_cell: (i64, i64), lo_slot: Option<usize>, hi_slot: Option<usize>) -> Option<usize> {
        if !self.keys.contains(hi_cell) {
            return None
        }
        let (start, count) = self.directory[self.keys.row_major_offset(hi_cell)]?;

        (start..start + count).find(|&k| self.faces[k].lo_slot == lo_slot && self.faces[k].hi_slot == hi_slot)
    }

    fn offset(&self, face: &FaceIndex, comp: usize) -> usize {
        debug_assert!(comp < self.num_comps, "component {} out of range ({} components)", comp, self.num_comps);

        match self.find(face.hi_cell, face.lo_slot, face.hi_slot) {
            Some(n) => n + comp * self.faces.len(),
            None => panic!("face {:?} is not in this container", face),
        }
    }
}




// ============================================================================
impl<T: Pod> Index<(FaceIndex, usize)> for SparseFaces<T> {
    type Output = T;

    fn index(&self, (face, comp): (FaceIndex, usize)) -> &T {
        &self.data[self.offset(&face, comp)]
    }
}

impl<T: Pod> IndexMut<(FaceIndex, usize)> for SparseFaces<T> {
    fn index_mut(&mut self, (face, comp): (FaceIndex, usize)) -> &mut T {
        let n = self.offset(&face, comp);
        &mut self.data[n]
    }
}




// ============================================================================
impl<T: Pod> PatchData for SparseFaces<T> {

    /// The box of face keys: the cells' bounding box, grown by one on the
    /// high side of the axis. Every stored face belongs to it under either
    /// semantic.
    fn region(&self) -> &IndexSpace {
        &self.keys
    }

    fn num_comps(&self) -> usize {
        self.num_comps
    }

    fn copy_from(&mut self, region: &IndexSpace, dst_comps: Range<usize>, src: &Self, src_comps: Range<usize>) {
        SparseFaces::copy_from(self, region, dst_comps, src, src_comps)
    }
}

impl<T: Pod> Linearize for SparseFaces<T> {

    fn linear_size(&self, region: &IndexSpace, comps: Range<usize>) -> usize {
        let n = self.faces_in(region).count();
        size_of::<u64>() + n * 4 * size_of::<i64>() + n * comps.len() * size_of::<T>()
    }

    fn linear_out(&self, buffer: &mut [u8], region: &IndexSpace, comps: Range<usize>) -> usize {
        check_interval(&comps, self.num_comps);

        let entries: Vec<(usize, FaceIndex)> = self.faces_in(region).collect();
        let n = self.faces.len();
        let mut writer = ByteWriter::new(buffer);

        writer.put(entries.len() as u64);

        for (_, face) in &entries {
            writer.put(face.hi_cell.0);
            writer.put(face.hi_cell.1);
            writer.put(encode_slot(face.lo_slot));
            writer.put(encode_slot(face.hi_slot));
        }
        for &(k, _) in &entries {
            for c in comps.clone() {
                writer.put(self.data[k + c * n])
            }
        }
        writer.position()
    }

    fn linear_in(&mut self, buffer: &[u8], _region: &IndexSpace, comps: Range<usize>) -> usize {
        check_interval(&comps, self.num_comps);

        let mut reader = ByteReader::new(buffer);
        let count = reader.get::<u64>() as usize;

        let positions: Vec<usize> = (0..count)
            .map(|_| {
                let hi_cell = (reader.get::<i64>(), reader.get::<i64>());
                let lo_slot = decode_slot(reader.get());
                let hi_slot = decode_slot(reader.get());

                match self.find(hi_cell, lo_slot, hi_slot) {
                    Some(k) => k,
                    None => panic!("face at {:?} with slots {:?} is not in this container", hi_cell, (lo_slot, hi_slot)),
                }
            })
            .collect();

        let n = self.faces.len();

        for k in positions {
            for c in comps.clone() {
                self.data[k + c * n] = reader.get()
            }
        }
        reader.position()
    }
}




/**
 * Factory for sparse face data, normal to one axis, on the irregular cells
 * of each patch (grown by an optional ghost vector).
 */
pub struct SparseFaceFactory<'g, G: ?Sized> {
    graph: &'g G,
    axis: Axis,
    semantic: FaceSemantic,
    ghost: (i64, i64),
}

impl<'g, G: EbGraph + ?Sized> SparseFaceFactory<'g, G> {

    pub fn new(graph: &'g G, axis: Axis) -> Self {
        Self { graph, axis, semantic: FaceSemantic::default(), ghost: (0, 0) }
    }

    pub fn with_semantic(self, semantic: FaceSemantic) -> Self {
        Self { semantic, ..self }
    }

    pub fn with_ghost(self, ghost: (i64, i64)) -> Self {
        Self { ghost, ..self }
    }
}

impl<'g, T: Pod, G: EbGraph + ?Sized> DataFactory<SparseFaces<T>> for SparseFaceFactory<'g, G> {
    fn create(&self, region: &IndexSpace, num_comps: usize, _: DataIndex) -> SparseFaces<T> {
        let cells = self.graph.irregular_cells(&region.grow(self.ghost));
        SparseFaces::new(self.axis, cells, self.graph, num_comps).with_semantic(self.semantic)
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::{FaceSemantic, SparseFaceFactory, SparseFaces};
    use crate::cell_set::CellSet;
    use crate::ebgraph::{EbGraph, FaceIndex, GeometryGraph, VolIndex};
    use crate::index_space::{range2d, Axis, IndexSpace, Side};
    use crate::layout::BoxLayout;
    use crate::layout_data::BoxLayoutData;
    use crate::linear::{self, Linearize};

    fn strip(cells: std::ops::Range<i64>, j: i64) -> CellSet {
        cells.map(|i| (i, j)).collect()
    }

    #[test]
    fn strip_of_cells_has_one_more_face_than_cells() {
        let graph = GeometryGraph::regular(range2d(0..8, 0..8));
        let faces = SparseFaces::<f64>::new(Axis::I, strip(2..6, 3), &graph, 1);
        assert_eq!(faces.num_faces(), 5);
        assert!(faces.faces().iter().all(|f| !f.is_boundary()));

        let his: Vec<_> = faces.faces().iter().map(|f| f.hi_cell).collect();
        assert_eq!(his, vec![(2, 3), (3, 3), (4, 3), (5, 3), (6, 3)]);
    }

    #[test]
    fn domain_boundary_faces_are_stored_once() {
        let graph = GeometryGraph::regular(range2d(0..4, 0..1));
        let faces = SparseFaces::<f64>::new(Axis::I, strip(0..4, 0), &graph, 2);
        assert_eq!(faces.num_faces(), 5);
        assert_eq!(faces.faces()[0], FaceIndex::new(Axis::I, (0, 0), None, Some(0), true));
        assert_eq!(faces.faces()[4], FaceIndex::new(Axis::I, (4, 0), Some(0), None, true));
        assert_eq!(faces.as_slice().len(), 10);
    }

    #[test]
    fn periodic_sides_produce_interior_faces() {
        let graph = GeometryGraph::regular(range2d(0..4, 0..4)).with_periodic(Axis::I);
        let faces = SparseFaces::<f64>::new(Axis::I, strip(0..4, 1), &graph, 1);
        assert_eq!(faces.num_faces(), 5);
        assert!(faces.faces().iter().all(|f| !f.is_boundary()));
    }

    #[test]
    fn multivalued_cells_get_one_face_per_volume_pair() {
        let mut graph = GeometryGraph::regular(range2d(0..8, 0..8));
        graph.set_cut((1, 1), 2);
        let mut faces = SparseFaces::<f64>::new(Axis::I, strip(1..3, 1), &graph, 1);
        assert_eq!(faces.num_faces(), 5);

        let shared = FaceIndex::interior(Axis::I, VolIndex::new((1, 1), 1), VolIndex::new((2, 1), 0));
        faces[(shared, 0)] = 7.0;
        assert!(faces.contains(&shared));
        assert_eq!(faces.as_slice().iter().filter(|&&x| x == 7.0).count(), 1);
    }

    #[test]
    fn semantics_differ_at_region_edges() {
        let graph = GeometryGraph::regular(range2d(0..8, 0..8));
        let high = SparseFaces::<f64>::new(Axis::I, strip(2..6, 3), &graph, 1).with_semantic(FaceSemantic::HighCell);
        let surr = high.clone().with_semantic(FaceSemantic::Surrounding);
        let lower = range2d(0..4, 0..8);
        let upper = range2d(4..8, 0..8);

        assert_eq!(high.faces_in(&upper).count(), 3);
        assert_eq!(high.faces_in(&lower).count() + high.faces_in(&upper).count(), 5);
        assert_eq!(surr.faces_in(&lower).count(), 3);
        assert_eq!(surr.faces_in(&upper).count(), 3);
        assert_eq!(FaceSemantic::default(), FaceSemantic::Surrounding);
    }

    #[test]
    fn packed_region_unpacks_exactly() {
        let mut graph = GeometryGraph::regular(range2d(0..8, 0..8));
        graph.set_cut((3, 3), 2);
        let cells: CellSet = range2d(2..6, 2..5).iter().collect();

        let mut src = SparseFaces::<f64>::new(Axis::J, cells.clone(), &graph, 3);
        src.for_each_mut(|f, c, x| *x = (f.hi_cell.0 * 10 + f.hi_cell.1) as f64 + c as f64 * 0.5);

        let region = range2d(3..5, 3..4);
        let buffer = linear::pack(&src, &region, 1..3);

        let mut dst = SparseFaces::<f64>::new(Axis::J, cells, &graph, 3);
        linear::unpack(&mut dst, &buffer, &region, 1..3);

        for (k, face) in src.faces().iter().enumerate() {
            let inside = FaceSemantic::Surrounding.includes(face, &region);
            assert_eq!(dst.component(2)[k], if inside { src.component(2)[k] } else { 0.0 });
            assert_eq!(dst.component(0)[k], 0.0);
        }
    }

    #[test]
    fn size_matches_bytes_written() {
        let graph = GeometryGraph::regular(range2d(0..4, 0..4));
        let src = SparseFaces::<f32>::new(Axis::J, range2d(0..4, 0..4).iter().collect(), &graph, 2);
        let region = range2d(1..3, 0..2);
        let size = src.linear_size(&region, 0..2);
        let mut buffer = vec![0xAB; size + 1];
        assert_eq!(src.linear_out(&mut buffer, &region, 0..2), size);
        assert_eq!(buffer[size], 0xAB);
        assert_eq!(size, 8 + 6 * 32 + 6 * 2 * 4);
    }

    #[test]
    fn restricted_copy_uses_the_face_semantic() {
        let graph = GeometryGraph::regular(range2d(0..8, 0..8));
        let mut src = SparseFaces::<f64>::new(Axis::I, strip(2..6, 3), &graph, 1);
        src.set_val(1.0);

        let mut dst = src.clone().with_semantic(FaceSemantic::HighCell);
        dst.set_val(0.0);
        dst.copy_from(&range2d(4..8, 0..8), 0..1, &src, 0..1);
        assert_eq!(dst.component(0), &[0.0, 0.0, 1.0, 1.0, 1.0]);
    }

    struct Broken(IndexSpace);

    impl EbGraph for Broken {
        fn domain(&self) -> &IndexSpace { &self.0 }
        fn is_periodic(&self, _: Axis) -> bool { false }
        fn num_vofs(&self, _: (i64, i64)) -> usize { 1 }
        fn irregular_cells(&self, region: &IndexSpace) -> CellSet { region.iter().collect() }
        fn faces(&self, vof: VolIndex, axis: Axis, _: Side) -> Vec<FaceIndex> {
            vec![FaceIndex::new(axis, vof.cell, None, Some(vof.slot), false)]
        }
    }

    #[test]
    #[should_panic]
    fn malformed_topology_is_rejected() {
        let graph = Broken(range2d(0..2, 0..2));
        SparseFaces::<f64>::new(Axis::I, graph.irregular_cells(graph.domain()), &graph, 1);
    }

    #[test]
    fn factory_builds_faces_on_each_patch() {
        let mut graph = GeometryGraph::regular(range2d(0..8, 0..8));
        graph.set_cut((1, 1), 1);
        graph.set_cut((1, 2), 1);
        graph.set_cut((5, 5), 2);

        let layout = BoxLayout::serial(vec![range2d(0..4, 0..8), range2d(4..8, 0..8)]);
        let factory = SparseFaceFactory::new(&graph, Axis::J).with_semantic(FaceSemantic::HighCell);
        let mut level: BoxLayoutData<SparseFaces<f64>> = BoxLayoutData::new();
        level.define(&layout, 1, &factory);

        let counts: Vec<usize> = level.iter().map(|(_, faces)| faces.num_faces()).collect();
        assert_eq!(counts, vec![3, 4]);
        assert!(level.iter().all(|(_, faces)| faces.semantic() == FaceSemantic::HighCell));
    }
}
