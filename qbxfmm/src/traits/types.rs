//! Utility types for trait definitions.
use std::time::Duration;

/// Type to handle FMM related errors
#[derive(thiserror::Error, Debug)]
pub enum FmmError {
    /// Failure to run some business logic
    #[error("Failed: {0}")]
    Failed(String),

    /// Array lengths, coefficient counts, dimensions or adjacency data inconsistent with the
    /// requested operation.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Expansion, kernel or result channel configuration that is not supported.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Operator requested in an order forbidden by the expansion lifecycle.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Enumeration of the operators timed by the QBX driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FmmOperatorType {
    /// Particle to QBX local, from a CSR source box list
    P2QBXL,

    /// Box multipole to QBX local (level)
    M2QBXL(u64),

    /// Box local to QBX local (level)
    L2QBXL(u64),

    /// QBX local to particle
    QBXL2P,
}

/// Timing of a single operator application
#[derive(Debug, Clone, Copy)]
pub struct FmmOperatorTime {
    /// Operator name
    pub operator: FmmOperatorType,

    /// Time in milliseconds
    pub time: u64,
}

impl FmmOperatorTime {
    /// Constructor from a measured duration
    pub fn from_duration(operator: FmmOperatorType, duration: Duration) -> Self {
        Self {
            operator,
            time: duration.as_millis() as u64,
        }
    }
}

impl std::fmt::Display for FmmOperatorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FmmOperatorType::P2QBXL => write!(f, "P2QBXL"),
            FmmOperatorType::M2QBXL(level) => write!(f, "M2QBXL({level})"),
            FmmOperatorType::L2QBXL(level) => write!(f, "L2QBXL({level})"),
            FmmOperatorType::QBXL2P => write!(f, "QBXL2P"),
        }
    }
}
