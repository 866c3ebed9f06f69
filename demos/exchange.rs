use clap::Parser;
use log::{error, info, warn, LevelFilter};
use simple_logger::SimpleLogger;
use ebgrid::checkpoint;
use ebgrid::{
    range2d, Axis, BoxLayout, BoxLayoutData, DataOptions, EbGraph, Error, Fab, FabFactory, FaceSemantic,
    GeometryGraph, IndexSpace, Linearize, PatchData, SparseCellFactory, SparseCells, SparseFaceFactory, SparseFaces,
};




/**
 * Decomposes a square level with a circular embedded boundary among a
 * number of simulated processes, then gathers every process's patches into
 * a single-process copy of the level by packing and unpacking them, the
 * way a message-passing transport would.
 */
#[derive(Debug, Parser)]
#[clap(version = "0.1", about = "Pack/unpack exchange of embedded-boundary patch data")]
struct Opts {
    #[clap(short = 't', long, default_value = "1")]
    num_threads: usize,

    #[clap(short = 'n', long, default_value = "64")]
    num_zones: i64,

    #[clap(short = 'b', long, default_value = "16")]
    block_size: i64,

    #[clap(short = 'r', long, default_value = "4")]
    num_ranks: usize,

    #[clap(short = 'o', long, default_value = "level.cbor")]
    output: String,

    #[clap(long)]
    sequential: bool,

    #[clap(short = 'v', long)]
    verbose: bool,
}




// ============================================================================
fn geometry(n: i64) -> GeometryGraph {
    let mut graph = GeometryGraph::regular(range2d(0..n, 0..n)).with_periodic(Axis::J);
    let (c, r) = (n as f64 / 2.0, n as f64 / 4.0);

    for (i, j) in range2d(0..n, 0..n).iter() {
        let d = ((i as f64 + 0.5 - c).powi(2) + (j as f64 + 0.5 - c).powi(2)).sqrt();

        if d < r - 0.5 {
            graph.set_covered((i, j))
        } else if d < r + 0.5 {
            graph.set_cut((i, j), if (i + j) % 7 == 0 { 2 } else { 1 })
        }
    }
    graph
}

fn blocks(n: i64, b: i64) -> Vec<IndexSpace> {
    let m = (n + b - 1) / b;
    range2d(0..m, 0..m)
        .iter()
        .map(|(p, q)| range2d(p * b..(p * b + b).min(n), q * b..(q * b + b).min(n)))
        .collect()
}

fn value(cell: (i64, i64), slot: usize, comp: usize) -> f64 {
    (cell.0 * 1000 + cell.1) as f64 + slot as f64 * 0.25 + comp as f64 * 1e6
}




/**
 * The data one process holds: dense values with a ghost layer, values on
 * cut-cell volumes, and values on the faces of cut cells normal to I.
 */
struct Level {
    dense: BoxLayoutData<Fab>,
    cells: BoxLayoutData<SparseCells<f64>>,
    faces: BoxLayoutData<SparseFaces<f64>>,
}

impl Level {
    fn new(layout: &BoxLayout, graph: &GeometryGraph, options: DataOptions) -> Self {
        let mut dense = BoxLayoutData::with_options(options);
        let mut cells = BoxLayoutData::with_options(options);
        let mut faces = BoxLayoutData::with_options(options);

        dense.define(layout, 2, &FabFactory::with_ghost((1, 1)));
        cells.define(layout, 2, &SparseCellFactory::new(graph));
        faces.define(layout, 1, &SparseFaceFactory::new(graph, Axis::I).with_semantic(FaceSemantic::HighCell));

        Self { dense, cells, faces }
    }

    fn fill(&mut self) {
        self.dense.apply(|_, _, fab| {
            let region = fab.region().clone();
            for c in 0..2 {
                for index in region.iter() {
                    fab[(index, c)] = value(index, 0, c)
                }
            }
        });
        self.cells.apply(|_, _, data| data.for_each_mut(|vof, c, x| *x = value(vof.cell, vof.slot, c)));
        self.faces.apply(|_, _, data| {
            data.for_each_mut(|face, c, x| *x = value(face.hi_cell, face.hi_slot.unwrap_or(0), c))
        });
    }
}




// ============================================================================
fn run(opts: Opts) -> Result<(), Error> {
    let graph = geometry(opts.num_zones);
    let boxes = blocks(opts.num_zones, opts.block_size);
    let procs: Vec<usize> = (0..boxes.len()).map(|n| n % opts.num_ranks).collect();
    let options = DataOptions {
        parallel: !opts.sequential,
        verbose: opts.verbose,
    };

    info!(
        "{} boxes, {} cut cells, {} simulated ranks",
        boxes.len(),
        graph.irregular_cells(graph.domain()).len(),
        opts.num_ranks);

    let serial = BoxLayout::serial(boxes.clone());
    let mut gathered = Level::new(&serial, &graph, options);
    let mut bytes_moved = 0;

    for rank in 0..opts.num_ranks {
        let layout = BoxLayout::new(boxes.clone(), procs.clone(), rank);
        let mut level = Level::new(&layout, &graph, options);
        level.fill();

        for (src, dst) in layout.layout_iter().zip(serial.layout_iter()) {
            let (src, dst) = match (layout.data_index(src), serial.data_index(dst)) {
                (Some(src), Some(dst)) => (src, dst),
                _ => continue,
            };
            let region = &layout[src];
            let cell_keys = level.cells[src].region().clone();
            let face_keys = level.faces[src].region().clone();

            let mut buffer = vec![0; level.dense.size(src, region, 0..2)];
            level.dense.pack(src, region, 0..2, &mut buffer);
            gathered.dense.unpack(dst, region, 0..2, &buffer);
            bytes_moved += buffer.len();

            let mut buffer = vec![0; level.cells.size(src, &cell_keys, 0..2)];
            level.cells.pack(src, &cell_keys, 0..2, &mut buffer);
            gathered.cells.unpack(dst, &cell_keys, 0..2, &buffer);
            bytes_moved += buffer.len();

            let mut buffer = vec![0; level.faces.size(src, &face_keys, 0..1)];
            level.faces.pack(src, &face_keys, 0..1, &mut buffer);
            gathered.faces.unpack(dst, &face_keys, 0..1, &buffer);
            bytes_moved += buffer.len();
        }
        info!("rank {} sent {} of {} patches", rank, layout.num_local(), layout.len());
    }

    let mut expected = Level::new(&serial, &graph, options);
    expected.fill();

    let mismatched_cells = gathered
        .cells
        .iter()
        .zip(expected.cells.iter())
        .filter(|((_, a), (_, b))| a.as_slice() != b.as_slice())
        .count();
    let mismatched_faces = gathered
        .faces
        .iter()
        .zip(expected.faces.iter())
        .filter(|((_, a), (_, b))| a.as_slice() != b.as_slice())
        .count();

    if mismatched_cells > 0 {
        warn!("{} patches of cut-cell data differ after the exchange", mismatched_cells);
    }
    if mismatched_faces > 0 {
        warn!("{} patches of cut-face data differ after the exchange", mismatched_faces);
    }

    let checksum: f64 = gathered
        .dense
        .iter()
        .map(|(index, fab)| fab.sum(&serial[index], 0..2))
        .sum();

    let interior_faces: usize = gathered.faces.iter().map(|(_, faces)| faces.num_faces()).sum();
    let face_bytes: usize = gathered
        .faces
        .iter()
        .map(|(_, faces)| faces.linear_size(faces.region(), 0..1))
        .sum();

    info!("moved {} bytes; dense checksum {:.6e}", bytes_moved, checksum);
    info!("{} stored faces, {} bytes when packed", interior_faces, face_bytes);

    let file = std::fs::File::create(&opts.output)?;
    checkpoint::write_level(&gathered.dense, std::io::BufWriter::new(file))?;
    info!("wrote {}", opts.output);

    Ok(())
}




// ============================================================================
fn main() {
    let opts = Opts::parse();
    let level = if opts.verbose { LevelFilter::Debug } else { LevelFilter::Info };

    SimpleLogger::new().with_level(level).init().unwrap();

    if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(opts.num_threads).build_global() {
        warn!("could not configure the thread pool: {}", e)
    }

    if let Err(e) = run(opts) {
        error!("{}", e);
        std::process::exit(1)
    }
}
