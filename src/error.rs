use thiserror::Error;

use crate::frames::Frame;

pub type Result<T> = std::result::Result<T, StructuralError>;

/// Failures that abort an analysis pass.
///
/// Station-level variants carry the offending station index and the name of
/// the quantity that failed so the calling layer can attribute the failure
/// to a design variable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructuralError {
    #[error("geometry error at station {station}: {quantity} {reason}")]
    Geometry {
        station: usize,
        quantity: String,
        reason: String,
    },

    #[error("interpolation domain error at station {station}: {quantity} = {value} outside [{min}, {max}]")]
    InterpolationDomain {
        station: usize,
        quantity: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("numerical fit error for {quantity}: {reason}")]
    NumericalFit { quantity: String, reason: String },

    #[error("singular stiffness at station {station}: {quantity} = {value}")]
    SingularStiffness {
        station: usize,
        quantity: String,
        value: f64,
    },

    #[error("frame mismatch: expected {expected:?}, found {found:?}")]
    FrameMismatch { expected: Frame, found: Frame },

    #[error("no transform from {from:?} to {to:?}")]
    NoTransform { from: Frame, to: Frame },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to read '{path}': {reason}")]
    Io { path: String, reason: String },
}

impl StructuralError {
    pub fn geometry(station: usize, quantity: &str, reason: impl Into<String>) -> Self {
        Self::Geometry {
            station,
            quantity: quantity.to_string(),
            reason: reason.into(),
        }
    }

    pub fn singular(station: usize, quantity: &str, value: f64) -> Self {
        Self::SingularStiffness {
            station,
            quantity: quantity.to_string(),
            value,
        }
    }

    pub fn fit(quantity: &str, reason: impl Into<String>) -> Self {
        Self::NumericalFit {
            quantity: quantity.to_string(),
            reason: reason.into(),
        }
    }

    /// Reattaches a station-level error to `station`.
    pub fn at_station(self, station: usize) -> Self {
        match self {
            Self::Geometry { quantity, reason, .. } => Self::Geometry {
                station,
                quantity,
                reason,
            },
            Self::InterpolationDomain {
                quantity,
                value,
                min,
                max,
                ..
            } => Self::InterpolationDomain {
                station,
                quantity,
                value,
                min,
                max,
            },
            Self::SingularStiffness { quantity, value, .. } => Self::SingularStiffness {
                station,
                quantity,
                value,
            },
            other => other,
        }
    }

    /// Station index the error is attached to, if any.
    pub fn station(&self) -> Option<usize> {
        match self {
            Self::Geometry { station, .. }
            | Self::InterpolationDomain { station, .. }
            | Self::SingularStiffness { station, .. } => Some(*station),
            _ => None,
        }
    }
}

impl From<serde_yaml::Error> for StructuralError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config(err.to_string())
    }
}
