mod tracker_errors;

pub use tracker_errors::*;
