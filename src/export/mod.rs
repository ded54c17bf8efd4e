//! OTU/BIOM export of the ID × sample matrix.
//!
//! - **otu**: the OTU table with its synthetic taxonomy column
//! - **convert**: the external converter that turns it into a BIOM artifact

pub mod convert;
pub mod otu;

pub use convert::{BiomConvert, TableConverter};
pub use otu::{build_otu_table, OtuTable, OTU_COMMENT, OTU_ID_HEADER, TAXONOMY_HEADER};
