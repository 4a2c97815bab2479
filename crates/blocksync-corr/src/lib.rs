//! Correspondence store for blocksync.
//!
//! A [`Correspondence`] records that a set of block-domain elements and a
//! set of component-domain elements represent the same concept. The
//! [`CorrespondenceStore`] answers kind-filtered queries from either side
//! and supports cascading removal. [`CorrespondenceFile`] persists a store
//! as a checksummed binary file.

pub mod error;
pub mod serialize;
pub mod store;

pub use error::CorrespondenceError;
pub use serialize::CorrespondenceFile;
pub use store::{Correspondence, CorrespondenceId, CorrespondenceStore};
