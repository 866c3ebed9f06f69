//! Ebgrid is the distributed patch-data layer of a block-structured adaptive
//! mesh refinement (AMR) code with embedded boundaries. A level of the mesh
//! is a sequence of rectangular boxes, each owned by one process. This crate
//! stores one payload per locally-owned box: dense multi-component arrays
//! for regular data, and sparse containers for data living only on the
//! irregular (cut) cells of the embedded boundary, or on their faces.
//!
//! Payloads are manufactured by allocation policies (`DataFactory`),
//! addressed by typed handles (`LayoutIndex` / `DataIndex`) minted by a
//! `BoxLayout`, and can be written to and read from flat byte buffers
//! through the linearization protocol (`Linearize`), which is what a
//! message-passing transport or a checkpoint writer needs.

pub mod cell_set;
pub mod checkpoint;
pub mod ebgraph;
pub mod error;
pub mod fab;
pub mod factory;
pub mod index;
pub mod index_space;
pub mod layout;
pub mod layout_data;
pub mod linear;
pub mod options;
pub mod sparse_cells;
pub mod sparse_faces;

pub use cell_set::CellSet;
pub use ebgraph::{EbGraph, FaceIndex, GeometryGraph, VolIndex};
pub use error::Error;
pub use fab::{BaseFab, Fab, FabView};
pub use factory::{AliasFactory, DataFactory, FabFactory, FnFactory};
pub use index::{DataIndex, LayoutIndex};
pub use index_space::{range2d, Axis, IndexSpace, Side};
pub use layout::BoxLayout;
pub use layout_data::{BoxLayoutData, PatchData};
pub use linear::Linearize;
pub use options::DataOptions;
pub use sparse_cells::{SparseCellFactory, SparseCells};
pub use sparse_faces::{FaceSemantic, SparseFaceFactory, SparseFaces};
