//! Arena-specific error types.

use std::error::Error;
use std::fmt;

use crate::region::RegionKind;

/// Errors that can occur during arena operations.
///
/// Every variant except the soft store fallbacks (which never reach this
/// enum) describes a condition the original design treated as fatal. The
/// arena reports them as values and leaves the terminate-or-not decision
/// to the top-level caller; it still aborts itself where continuing would
/// risk silent corruption.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The buffer allocation itself failed.
    OutOfMemory {
        /// Number of bytes the arena tried to reserve.
        requested: usize,
    },
    /// A region's bump cursor would pass its capacity.
    CapacityExceeded {
        /// The exhausted region.
        region: RegionKind,
        /// Cursor position the allocation would have required.
        requested: usize,
        /// The region's usable capacity.
        capacity: usize,
    },
    /// A region's canary words were overwritten — some consumer of the
    /// region wrote past its bound.
    CorruptionDetected {
        /// The region whose canary failed.
        region: RegionKind,
    },
    /// Handle arithmetic or indexing left the handle's span, or an
    /// access fell outside the live buffer.
    BoundsViolation {
        /// Bytes the operation tried to move or access.
        requested: usize,
        /// Bytes that were actually available in that direction.
        bound: usize,
    },
    /// A dynamic-region operation was handed a handle that does not
    /// point into the dynamic region.
    OutsideRegion {
        /// The region the operation is defined for.
        region: RegionKind,
        /// The handle's offset from the arena base.
        offset: usize,
    },
    /// A resize would shrink the arena below its committed layout.
    ResizeTooSmall {
        /// Requested total size in bytes.
        requested: usize,
        /// Smallest total the current layout permits.
        minimum: usize,
    },
    /// The arena has been aborted; no further operation can succeed.
    Aborted,
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory { requested } => {
                write!(f, "failed to allocate arena buffer of {requested} bytes")
            }
            Self::CapacityExceeded {
                region,
                requested,
                capacity,
            } => {
                write!(
                    f,
                    "{region} region: tried to alloc {requested} when only {capacity} is allocated"
                )
            }
            Self::CorruptionDetected { region } => {
                write!(f, "{region} region wrote out of bounds")
            }
            Self::BoundsViolation { requested, bound } => {
                write!(
                    f,
                    "pointer access out of bounds: {requested} bytes against a span of {bound}"
                )
            }
            Self::OutsideRegion { region, offset } => {
                write!(
                    f,
                    "pointer at offset {offset} is not inside the {region} region"
                )
            }
            Self::ResizeTooSmall { requested, minimum } => {
                write!(
                    f,
                    "resize to {requested} bytes would shrink the arena below {minimum}"
                )
            }
            Self::Aborted => write!(f, "arena has been aborted"),
        }
    }
}

impl Error for ArenaError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_message_matches_diagnostic_shape() {
        let e = ArenaError::CapacityExceeded {
            region: RegionKind::Static,
            requested: 201,
            capacity: 200,
        };
        assert_eq!(
            e.to_string(),
            "static region: tried to alloc 201 when only 200 is allocated"
        );
    }

    #[test]
    fn corruption_names_the_region() {
        let e = ArenaError::CorruptionDetected {
            region: RegionKind::Dynamic,
        };
        assert!(e.to_string().contains("dynamic"));
    }
}
