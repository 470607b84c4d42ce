//! Core building blocks shared by the task wrappers. Currently the
//! serializable task parameters consumed by `task` and the `api` helpers.
pub mod params;
