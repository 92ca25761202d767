//! Project bootstrap steps that run after template files are written

pub mod git;
