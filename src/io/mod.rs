//! I/O layer for inspecting image volumes.
//! Provides the `nifti` header reader used to describe inputs and outputs
//! in run reports; voxel data is never read.
pub mod nifti;
pub use nifti::{NiftiError, NiftiHeader, VolumeInfo};
