use ebgrid::linear::{self, Linearize};
use ebgrid::{range2d, Axis, EbGraph, Fab, FaceSemantic, GeometryGraph, IndexSpace, SparseCells, SparseFaces};
use proptest::prelude::*;




fn arb_region() -> impl Strategy<Value = IndexSpace> {
    (-2i64..10, 0i64..6, -2i64..10, 0i64..6).prop_map(|(i0, di, j0, dj)| range2d(i0..i0 + di, j0..j0 + dj))
}

fn arb_geometry() -> impl Strategy<Value = GeometryGraph> {
    prop::collection::vec((0i64..8, 0i64..8, 1usize..4), 0..16).prop_map(|cuts| {
        let mut graph = GeometryGraph::regular(range2d(0..8, 0..8));
        for (i, j, n) in cuts {
            graph.set_cut((i, j), n);
        }
        graph
    })
}

fn arb_axis() -> impl Strategy<Value = Axis> {
    prop_oneof![Just(Axis::I), Just(Axis::J)]
}

fn arb_semantic() -> impl Strategy<Value = FaceSemantic> {
    prop_oneof![Just(FaceSemantic::HighCell), Just(FaceSemantic::Surrounding)]
}




proptest! {
    #[test]
    fn fab_size_is_exact_and_unpack_restores_the_region(region in arb_region(), lo in 0usize..3, len in 1usize..3) {
        let space = range2d(0..8, 0..8);
        let comps = lo..(lo + len).min(3);
        let src = Fab::from_function(space.clone(), 3, |(i, j), c| (i * 31 + j * 7) as f64 + c as f64);

        let size = src.linear_size(&region, comps.clone());
        let mut buffer = vec![0xCD; size + 1];
        prop_assert_eq!(src.linear_out(&mut buffer, &region, comps.clone()), size);
        prop_assert_eq!(buffer[size], 0xCD);

        let mut dst = Fab::new(space.clone(), 3);
        prop_assert_eq!(dst.linear_in(&buffer[..size], &region, comps.clone()), size);

        let inside = region.intersect(&space);
        prop_assert_eq!(dst.sum(&inside, comps.clone()), src.sum(&inside, comps));
    }

    #[test]
    fn sparse_cells_round_trip(graph in arb_geometry(), region in arb_region()) {
        let cells = graph.irregular_cells(graph.domain());
        let mut src = SparseCells::<f64>::new(cells.clone(), &graph, 2);
        src.for_each_mut(|vof, c, x| *x = 1.0 + (vof.cell.0 * 8 + vof.cell.1) as f64 + vof.slot as f64 * 0.125 + c as f64 * 100.0);

        let buffer = linear::pack(&src, &region, 0..2);
        let mut dst = SparseCells::<f64>::new(cells, &graph, 2);
        linear::unpack(&mut dst, &buffer, &region, 0..2);

        for &vof in src.vofs() {
            for c in 0..2 {
                let expected = if region.contains(vof.cell) { src[(vof, c)] } else { 0.0 };
                prop_assert_eq!(dst[(vof, c)], expected);
            }
        }
    }

    #[test]
    fn sparse_faces_size_is_exact(graph in arb_geometry(), region in arb_region(), axis in arb_axis(), semantic in arb_semantic()) {
        let cells = graph.irregular_cells(graph.domain());
        let mut src = SparseFaces::<f64>::new(axis, cells.clone(), &graph, 1).with_semantic(semantic);
        src.for_each_mut(|face, _, x| *x = 1.0 + (face.hi_cell.0 * 8 + face.hi_cell.1) as f64);

        let size = src.linear_size(&region, 0..1);
        let mut buffer = vec![0xCD; size + 1];
        prop_assert_eq!(src.linear_out(&mut buffer, &region, 0..1), size);
        prop_assert_eq!(buffer[size], 0xCD);

        let mut dst = SparseFaces::<f64>::new(axis, cells, &graph, 1).with_semantic(semantic);
        prop_assert_eq!(dst.linear_in(&buffer[..size], &region, 0..1), size);

        for (k, face) in src.faces().iter().enumerate() {
            let expected = if semantic.includes(face, &region) { src.component(0)[k] } else { 0.0 };
            prop_assert_eq!(dst.component(0)[k], expected);
        }
    }

    #[test]
    fn high_cell_faces_partition_among_disjoint_regions(graph in arb_geometry(), axis in arb_axis(), split in 0i64..8) {
        let cells = graph.irregular_cells(graph.domain());
        let faces = SparseFaces::<f64>::new(axis, cells, &graph, 1).with_semantic(FaceSemantic::HighCell);
        let lower = range2d(-1..split, -1..10);
        let upper = range2d(split..10, -1..10);
        prop_assert_eq!(faces.faces_in(&lower).count() + faces.faces_in(&upper).count(), faces.num_faces());
    }
}
