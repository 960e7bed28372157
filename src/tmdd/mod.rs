//! TMDD network documents: typed model, correction, all-or-nothing directory
//! correction, file I/O, CSV export and construction from extracted simulation records.

pub mod batch;
pub mod builder;
pub mod correct;
pub mod export;
pub mod io;
pub mod model;

pub use batch::{CorrectedNetwork, correct_directory};
pub use builder::{
    DummyIdAllocator, ExportSettings, JunctionRecord, NetworkSnapshot, SectionRecord,
    UpdateTime, build_document,
};
pub use correct::{CorrectionSummary, correct_document};
pub use export::{GeometryRow, link_geometry_rows, write_geometry_csv};
pub use io::{
    NetworkFile, Selection, corrected_file_name, discover_networks, read_document,
    write_document,
};
pub use model::{
    GeoLocation, LinkInventory, LinkInventoryElement, NodeInventory, NodeInventoryElement,
    TmddDocument,
};
