//! Open Packaging Conventions (OPC) support.
//!
//! The subset of OPC a WordprocessingML package needs: part names,
//! relationship and content-type constants, and ZIP-backed reading and
//! writing of parts.
//!
//! # Performance Features
//!
//! - Uses `zip` with Deflate for the physical container
//! - Uses `quick-xml` for relationship lookups without building a DOM
pub mod constants;
pub mod error;
pub mod packuri;
pub mod phys_pkg;
pub mod pkgwriter;
pub mod rel;

// Re-export commonly used types
pub use packuri::PackURI;
pub use phys_pkg::{PhysPkgReader, PhysPkgWriter};
pub use pkgwriter::PackageWriter;
