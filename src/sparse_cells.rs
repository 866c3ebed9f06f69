use core::mem::size_of;
use core::ops::{Index, IndexMut, Range};
use bytemuck::Pod;
use crate::cell_set::CellSet;
use crate::ebgraph::{EbGraph, VolIndex};
use crate::factory::DataFactory;
use crate::index::DataIndex;
use crate::index_space::{check_interval, IndexSpace};
use crate::layout_data::PatchData;
use crate::linear::{ByteReader, ByteWriter, Linearize};




/**
 * Multi-component data on the volumes of an irregular set of cells. A cell
 * may hold several volumes (or none, if covered), so the storage is one
 * flat buffer indexed through a directory over the set's bounding box.
 *
 * Storage is component-major: with `n` volumes in total, the value of
 * (volume `v`, component `c`) lives at `v + c * n`, where volumes are
 * numbered in row-major cell order, then by slot.
 */
#[derive(Clone, Debug)]
pub struct SparseCells<T> {
    cells: CellSet,
    bounds: IndexSpace,
    directory: Vec<Option<(usize, usize)>>,
    vofs: Vec<VolIndex>,
    num_comps: usize,
    data: Vec<T>,
}




// ============================================================================
impl<T: Pod> SparseCells<T> {


    /**
     * Create a zero-initialized container on the volumes of the given
     * cells, with occupancy taken from the graph.
     */
    pub fn new<G: EbGraph + ?Sized>(cells: CellSet, graph: &G, num_comps: usize) -> Self {
        let bounds = cells.bounding_box();
        let mut directory = vec![None; bounds.len()];
        let mut vofs = Vec::new();

        for cell in cells.iter() {
            let count = graph.num_vofs(cell);
            directory[bounds.row_major_offset(cell)] = Some((vofs.len(), count));
            vofs.extend((0..count).map(|slot| VolIndex::new(cell, slot)));
        }
        let data = vec![T::zeroed(); vofs.len() * num_comps];

        Self { cells, bounds, directory, vofs, num_comps, data }
    }

    pub fn cells(&self) -> &CellSet {
        &self.cells
    }

    pub fn num_comps(&self) -> usize {
        self.num_comps
    }

    /// The total number of volumes, over all cells.
    pub fn num_vofs(&self) -> usize {
        self.vofs.len()
    }

    pub fn vofs(&self) -> &[VolIndex] {
        &self.vofs
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn contains(&self, vof: VolIndex) -> bool {
        matches!(self.slots(vof.cell), Some((_, count)) if vof.slot < count)
    }


    /**
     * Return an iterator over the volumes of the cells in a region, in
     * storage order.
     */
    pub fn vofs_in<'a>(&'a self, region: &'a IndexSpace) -> impl Iterator<Item = VolIndex> + 'a {
        self.cells
            .iter_in(region)
            .flat_map(move |cell| {
                let (start, count) = self.slots(cell).unwrap_or((0, 0));
                self.vofs[start..start + count].iter().copied()
            })
    }

    pub fn component(&self, comp: usize) -> &[T] {
        let n = self.vofs.len();
        &self.data[comp * n..(comp + 1) * n]
    }

    pub fn component_mut(&mut self, comp: usize) -> &mut [T] {
        let n = self.vofs.len();
        &mut self.data[comp * n..(comp + 1) * n]
    }

    pub fn set_val(&mut self, value: T) {
        self.data.iter_mut().for_each(|x| *x = value)
    }

    pub fn set_val_comp(&mut self, comp: usize, value: T) {
        self.component_mut(comp).iter_mut().for_each(|x| *x = value)
    }


    /**
     * Call a function with every (volume, component) pair and a mutable
     * reference to its value.
     */
    pub fn for_each_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(VolIndex, usize, &mut T)
    {
        let n = self.vofs.len();

        for (k, x) in self.data.iter_mut().enumerate() {
            f(self.vofs[k % n], k / n, x)
        }
    }


    /**
     * Copy a component interval of another container into this one, at
     * the volumes both containers hold in the given region.
     */
    pub fn copy_from(&mut self, region: &IndexSpace, dst_comps: Range<usize>, src: &Self, src_comps: Range<usize>) {
        check_interval(&src_comps, src.num_comps);
        check_interval(&dst_comps, self.num_comps);
        debug_assert_eq!(src_comps.len(), dst_comps.len(), "component intervals differ in length");

        let region = region.intersect(&self.bounds).intersect(&src.bounds);
        let shared: Vec<(usize, usize)> = self
            .vofs_in(&region)
            .filter_map(|vof| src.position(vof).map(|s| (self.offset(vof, 0), s)))
            .collect();

        let (n, m) = (self.vofs.len(), src.vofs.len());

        for (sc, dc) in src_comps.zip(dst_comps) {
            for &(d, s) in &shared {
                self.data[d + dc * n] = src.data[s + sc * m]
            }
        }
    }

    fn slots(&self, cell: (i64, i64)) -> Option<(usize, usize)> {
        if self.bounds.contains(cell) {
            self.directory[self.bounds.row_major_offset(cell)]
        } else {
            None
        }
    }

    fn position(&self, vof: VolIndex) -> Option<usize> {
        match self.slots(vof.cell) {
            Some((start, count)) if vof.slot < count => Some(start + vof.slot),
            _ => None,
        }
    }

    fn offset(&self, vof: VolIndex, comp: usize) -> usize {
        debug_assert!(comp < self.num_comps, "component {} out of range ({} components)", comp, self.num_comps);

        match self.position(vof) {
            Some(n) => n + comp * self.vofs.len(),
            None => panic!("volume {:?} is not in this container", vof),
        }
    }
}




// ============================================================================
impl<T: Pod> Index<(VolIndex, usize)> for SparseCells<T> {
    type Output = T;

    fn index(&self, (vof, comp): (VolIndex, usize)) -> &T {
        &self.data[self.offset(vof, comp)]
    }
}

impl<T: Pod> IndexMut<(VolIndex, usize)> for SparseCells<T> {
    fn index_mut(&mut self, (vof, comp): (VolIndex, usize)) -> &mut T {
        let n = self.offset(vof, comp);
        &mut self.data[n]
    }
}




// ============================================================================
impl<T: Pod> PatchData for SparseCells<T> {

    fn region(&self) -> &IndexSpace {
        &self.bounds
    }

    fn num_comps(&self) -> usize {
        self.num_comps
    }

    fn copy_from(&mut self, region: &IndexSpace, dst_comps: Range<usize>, src: &Self, src_comps: Range<usize>) {
        SparseCells::copy_from(self, region, dst_comps, src, src_comps)
    }
}

impl<T: Pod> Linearize for SparseCells<T> {

    fn linear_size(&self, region: &IndexSpace, comps: Range<usize>) -> usize {
        let n = self.vofs_in(region).count();
        size_of::<u64>() + n * 3 * size_of::<u64>() + n * comps.len() * size_of::<T>()
    }

    fn linear_out(&self, buffer: &mut [u8], region: &IndexSpace, comps: Range<usize>) -> usize {
        check_interval(&comps, self.num_comps);

        let vofs: Vec<VolIndex> = self.vofs_in(region).collect();
        let mut writer = ByteWriter::new(buffer);

        writer.put(vofs.len() as u64);

        for vof in &vofs {
            writer.put(vof.cell.0);
            writer.put(vof.cell.1);
            writer.put(vof.slot as u64);
        }
        for &vof in &vofs {
            for c in comps.clone() {
                writer.put(self[(vof, c)])
            }
        }
        writer.position()
    }

    fn linear_in(&mut self, buffer: &[u8], _region: &IndexSpace, comps: Range<usize>) -> usize {
        check_interval(&comps, self.num_comps);

        let mut reader = ByteReader::new(buffer);
        let count = reader.get::<u64>() as usize;

        let vofs: Vec<VolIndex> = (0..count)
            .map(|_| {
                let i = reader.get::<i64>();
                let j = reader.get::<i64>();
                let slot = reader.get::<u64>() as usize;
                VolIndex::new((i, j), slot)
            })
            .collect();

        for vof in vofs {
            for c in comps.clone() {
                self[(vof, c)] = reader.get()
            }
        }
        reader.position()
    }
}




/**
 * Factory for sparse cell data on the irregular cells of each patch (grown
 * by an optional ghost vector), as reported by a geometry.
 */
pub struct SparseCellFactory<'g, G: ?Sized> {
    graph: &'g G,
    ghost: (i64, i64),
}

impl<'g, G: EbGraph + ?Sized> SparseCellFactory<'g, G> {

    pub fn new(graph: &'g G) -> Self {
        Self { graph, ghost: (0, 0) }
    }

    pub fn with_ghost(self, ghost: (i64, i64)) -> Self {
        Self { ghost, ..self }
    }
}

impl<'g, T: Pod, G: EbGraph + ?Sized> DataFactory<SparseCells<T>> for SparseCellFactory<'g, G> {
    fn create(&self, region: &IndexSpace, num_comps: usize, _: DataIndex) -> SparseCells<T> {
        let cells = self.graph.irregular_cells(&region.grow(self.ghost));
        SparseCells::new(cells, self.graph, num_comps)
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::{SparseCellFactory, SparseCells};
    use crate::cell_set::CellSet;
    use crate::ebgraph::{EbGraph, GeometryGraph, VolIndex};
    use crate::index_space::range2d;
    use crate::layout::BoxLayout;
    use crate::layout_data::BoxLayoutData;
    use crate::linear::{self, Linearize};

    fn geometry() -> GeometryGraph {
        let mut graph = GeometryGraph::regular(range2d(0..8, 0..8));
        graph.set_cut((1, 1), 2);
        graph.set_cut((1, 2), 2);
        graph.set_cut((3, 5), 1);
        graph.set_cut((6, 2), 3);
        graph
    }

    #[test]
    fn multivalued_cells_get_one_entry_per_volume() {
        let graph = geometry();
        let cells: CellSet = vec![(1, 1), (1, 2)].into_iter().collect();
        let mut data = SparseCells::<f64>::new(cells, &graph, 3);
        assert_eq!(data.num_vofs(), 4);
        assert_eq!(data.as_slice().len(), 12);

        data.for_each_mut(|vof, c, x| *x = (vof.cell.1 * 100) as f64 + (vof.slot * 10) as f64 + c as f64);
        assert_eq!(data[(VolIndex::new((1, 1), 0), 0)], 100.0);
        assert_eq!(data[(VolIndex::new((1, 1), 1), 2)], 112.0);
        assert_eq!(data[(VolIndex::new((1, 2), 1), 1)], 211.0);
        assert_eq!(data.component(1), &[101.0, 111.0, 201.0, 211.0]);
    }

    #[test]
    fn copy_is_restricted_to_shared_volumes_in_region() {
        let graph = geometry();
        let all = graph.irregular_cells(graph.domain());
        let mut src = SparseCells::<f64>::new(all.clone(), &graph, 2);
        src.set_val_comp(0, 1.0);
        src.set_val_comp(1, 2.0);

        let mut dst = SparseCells::<f64>::new(all, &graph, 1);
        dst.copy_from(&range2d(0..4, 0..8), 0..1, &src, 1..2);
        assert_eq!(dst[(VolIndex::new((1, 2), 1), 0)], 2.0);
        assert_eq!(dst[(VolIndex::new((3, 5), 0), 0)], 2.0);
        assert_eq!(dst[(VolIndex::new((6, 2), 2), 0)], 0.0);
    }

    #[test]
    fn packed_region_unpacks_exactly() {
        let graph = geometry();
        let all = graph.irregular_cells(graph.domain());
        let mut src = SparseCells::<f64>::new(all.clone(), &graph, 2);
        src.for_each_mut(|vof, c, x| *x = (vof.cell.0 + vof.cell.1) as f64 + vof.slot as f64 * 0.25 + c as f64);

        let region = range2d(1..7, 2..6);
        let buffer = linear::pack(&src, &region, 0..2);
        assert_eq!(buffer.len(), 8 + 6 * 24 + 6 * 2 * 8);

        let mut dst = SparseCells::<f64>::new(all, &graph, 2);
        linear::unpack(&mut dst, &buffer, &region, 0..2);

        for vof in src.vofs() {
            let expected = if region.contains(vof.cell) { src[(*vof, 1)] } else { 0.0 };
            assert_eq!(dst[(*vof, 1)], expected);
        }
    }

    #[test]
    fn size_matches_bytes_written() {
        let graph = geometry();
        let src = SparseCells::<f32>::new(graph.irregular_cells(graph.domain()), &graph, 3);
        let region = range2d(0..2, 0..8);
        let size = src.linear_size(&region, 1..3);
        let mut buffer = vec![0xAB; size + 1];
        assert_eq!(src.linear_out(&mut buffer, &region, 1..3), size);
        assert_eq!(buffer[size], 0xAB);
        assert_eq!(src.linear_size(&range2d(4..5, 0..1), 0..3), 8);
    }

    #[test]
    #[should_panic]
    fn volume_outside_the_set_is_rejected() {
        let graph = geometry();
        let data = SparseCells::<f64>::new(graph.irregular_cells(graph.domain()), &graph, 1);
        let _ = data[(VolIndex::new((1, 1), 2), 0)];
    }

    #[test]
    fn factory_builds_payloads_from_irregular_cells_of_each_patch() {
        let graph = geometry();
        let layout = BoxLayout::serial(vec![range2d(0..4, 0..8), range2d(4..8, 0..8)]);
        let mut level: BoxLayoutData<SparseCells<f64>> = BoxLayoutData::new();
        level.define(&layout, 1, &SparseCellFactory::new(&graph));

        let counts: Vec<usize> = level.iter().map(|(_, data)| data.num_vofs()).collect();
        assert_eq!(counts, vec![5, 3]);

        let mut grown: BoxLayoutData<SparseCells<f64>> = BoxLayoutData::new();
        grown.define(&layout, 1, &SparseCellFactory::new(&graph).with_ghost((2, 0)));
        let counts: Vec<usize> = grown.iter().map(|(_, data)| data.num_vofs()).collect();
        assert_eq!(counts, vec![5, 4]);
    }
}
