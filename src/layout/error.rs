use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
    /// The probe budget or the bounded canvas ran out before a free spot
    /// turned up.
    #[error("no free position for label {label:?} after {attempts} probes (radius {radius:.1})")]
    CapacityExceeded {
        label: String,
        attempts: usize,
        radius: f32,
    },
    #[error("label {label:?} measured to an unusable extent {width}x{height}")]
    InvalidExtent {
        label: String,
        width: f32,
        height: f32,
    },
    #[error("packer failed: {0}")]
    Packer(#[from] PackError),
}

/// Failure of a whole packer batch. There are no partial results.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PackError {
    #[error("{unplaced} of {total} words did not fit on the packing canvas")]
    Incomplete { unplaced: usize, total: usize },
    #[error("{0}")]
    Failed(String),
}
