//! odbpost core - post-processing of finite element result archives
//!
//! Turns the flat field-value stream of a result archive into tables of
//! per-entity, per-sample values tagged with their deformed coordinates:
//! - Centroid and integration point tables for solid element families
//! - Isoparametric shape functions to locate samples in physical space
//! - Deformed node and sample coordinates, from a native coordinate field
//!   or from displacements
//! - Reconciliation of unmarked record runs into an instance-grouped,
//!   zero-padded table
//! - History output as `(time, value)` pairs
//!
//! # Architecture
//!
//! - [`ResultArchive`] trait: everything read from the archive
//! - [`ElementFamily`]: element type names resolved once, with their
//!   [`ShapeFunctions`]
//! - [`resolve`]: deformed coordinates of nodes and sample points
//! - [`reconcile()`]: two-pass run sizing and table fill
//! - [`ReconciledTable`]: dense output with per-instance views
//!
//! # Example
//!
//! ```
//! use odbpost_core::{
//!     extract_element_field, ElementConnectivity, EntitySet, ExtractOptions, FieldPosition,
//!     FieldRecord, FieldRequest, MemoryArchive, Point3, Region,
//! };
//!
//! let mut archive = MemoryArchive::new();
//! archive.add_nodes(
//!     "Part-1",
//!     [
//!         (1, Point3::new(0.0, 0.0, 0.0)),
//!         (2, Point3::new(1.0, 0.0, 0.0)),
//!         (3, Point3::new(0.0, 1.0, 0.0)),
//!         (4, Point3::new(0.0, 0.0, 1.0)),
//!     ],
//! );
//! archive.add_element("Part-1", 1, ElementConnectivity::new("C3D4", "Part-1", vec![1, 2, 3, 4]));
//! archive.add_element_set("ALL", EntitySet::single("Part-1", vec![1]));
//!
//! let step = archive.add_step("Step-1");
//! let frame = archive.add_frame(step, 1.0).unwrap();
//! let u = (1..=4).map(|n| FieldRecord::new("Part-1", n, 1, vec![0.0; 3])).collect();
//! archive.add_field(frame, "U", FieldPosition::Nodal, u).unwrap();
//! archive
//!     .add_field(
//!         frame,
//!         "S",
//!         FieldPosition::Centroid,
//!         vec![FieldRecord::new("Part-1", 1, 1, vec![100.0])],
//!     )
//!     .unwrap();
//!
//! let request = FieldRequest::new("S", FieldPosition::Centroid, Region::Named("ALL".into()));
//! let table = extract_element_field(&archive, &request, &ExtractOptions::default()).unwrap();
//! let row = table.instance("Part-1").unwrap().entity(0).unwrap().sample(0).unwrap().to_vec();
//! assert_eq!(row, vec![1.0, 0.25, 0.25, 0.25, 100.0]);
//! ```

pub mod archive;
pub mod element;
pub mod error;
pub mod extract;
pub mod interpolate;
pub mod mesh;
pub mod options;
pub mod reconcile;
pub mod resolve;
pub mod table;
pub mod types;

pub use archive::{
    EntitySet, FieldPosition, FrameKey, FrameRef, LabelGroup, MemoryArchive, Region,
    ResultArchive, StepKey,
};
pub use element::{ElementFamily, ShapeFunctions};
pub use error::{Error, Result};
pub use extract::{
    extract_deformed_nodes, extract_element_field, extract_history, extract_node_field,
    FieldRequest,
};
pub use interpolate::{evaluate, SampledPoints};
pub use mesh::{ElementCatalog, ElementConnectivity, ShapeHints};
pub use options::ExtractOptions;
pub use reconcile::{reconcile, EntityRun};
pub use resolve::{deformed_node_coordinates, CoordinateStrategy, InstanceNodes, SampleLocator};
pub use table::{EntityView, FlatRow, InstanceView, ReconciledTable, TableSink};
pub use types::{
    EntityKey, FieldRecord, NodalCoordinate, Point3, Precision, SamplePoint, SamplePosition,
};
