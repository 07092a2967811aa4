//! Error types
//!
//! Geometric no-ops (off-canvas pixels, empty rectangles) are never errors.
//! Only configuration faults and transport failures surface here.

use std::error::Error as StdError;

/// Failure reported by a panel driver
#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    /// The bus or controller rejected the transfer
    #[error("panel transport failed: {0}")]
    Transport(#[source] Box<dyn StdError + Send + Sync>),

    /// The rectangle does not fit the panel or violates its alignment
    #[error("region {width}x{height} at ({x}, {y}) is invalid for this panel")]
    InvalidRegion {
        /// Panel-native x
        x: u32,
        /// Panel-native y
        y: u32,
        /// Region width
        width: u32,
        /// Region height
        height: u32,
    },

    /// The driver was already closed
    #[error("panel is closed")]
    Closed,
}

impl PanelError {
    /// Wrap any transport-level error
    pub fn transport(error: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::Transport(error.into())
    }
}

/// Failure reported by the compositor
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    /// Indexed bitmaps need 1, 2, 4, 8, 16 or 32 bits per index
    #[error("{0} bits per index is not a power of two up to 32")]
    InvalidIndexBits(u32),

    /// A source buffer is shorter than the region it describes
    #[error("source holds {actual} entries but {needed} are required")]
    SourceTooShort {
        /// Entries the call would read
        needed: usize,
        /// Entries available
        actual: usize,
    },

    /// An index decoded from a bitmap has no palette entry
    #[error("palette index {index} out of range for {palette_len} entries")]
    PaletteIndex {
        /// Decoded index
        index: u32,
        /// Palette length
        palette_len: usize,
    },

    /// A single panel row does not fit in one transfer
    #[error("panel row needs {row_bytes} bytes, transfer limit is {limit}")]
    RowExceedsTransfer {
        /// Bytes of one aligned panel row
        row_bytes: usize,
        /// Configured transfer bound
        limit: usize,
    },

    /// A driver failed while receiving pixels
    #[error(transparent)]
    Transport(#[from] PanelError),

    /// One or more panels failed to close; the first failure is attached
    #[error("{failures} panel(s) failed to close")]
    Close {
        /// Number of panels whose close failed
        failures: usize,
        /// First failure
        source: PanelError,
    },

    /// The display was closed; no further panels can be attached
    #[error("display is closed")]
    Closed,

    /// The background flush worker could not be started
    #[error("failed to start flush scheduler")]
    Scheduler(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_wraps_source() {
        let err = DisplayError::from(PanelError::transport("bus stalled"));
        assert_eq!(err.to_string(), "panel transport failed: bus stalled");
    }

    #[test]
    fn test_close_exposes_first_failure() {
        let err = DisplayError::Close {
            failures: 2,
            source: PanelError::Closed,
        };
        assert_eq!(err.to_string(), "2 panel(s) failed to close");
        let source = StdError::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("panel is closed"));
    }
}
