//! Errors raised while building grids and validating solver parameters
//!
//! The pipeline itself never fails: toroidal wrap makes every coordinate valid
//! and numerical hazards are floored where they occur. The only failures are
//! degenerate construction parameters, which are rejected up front.

/// Errors that can occur when constructing or configuring a fluid solver
#[derive(Debug, Clone, PartialEq)]
pub enum FluidError {
    /// A grid axis was given an extent of zero cells
    ZeroExtent {
        /// Axis index (0 = x, 1 = y, 2 = z)
        axis: usize,
    },
    /// The solver only supports two and three dimensional grids
    UnsupportedDimension(usize),
    /// The pressure solve needs at least one relaxation pass
    ZeroIterations,
    /// A floating point parameter was non-finite or outside its valid range
    InvalidParameter {
        /// Parameter name as it appears in the configuration
        name: &'static str,
        /// Offending value
        value: f32,
    },
    /// The impulse block would cover an axis more than once
    ImpulseRadiusTooLarge {
        /// Configured half-width in cells
        radius: usize,
        /// Smallest grid extent
        extent: usize,
    },
}

impl std::fmt::Display for FluidError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FluidError::ZeroExtent { axis } => {
                write!(f, "Grid extent along axis {axis} must be at least one cell")
            }
            FluidError::UnsupportedDimension(dimension) => {
                write!(f, "Unsupported grid dimension {dimension} (expected 2 or 3)")
            }
            FluidError::ZeroIterations => {
                write!(f, "Pressure solve iteration count must be positive")
            }
            FluidError::InvalidParameter { name, value } => {
                write!(f, "Invalid value for {name}: {value}")
            }
            FluidError::ImpulseRadiusTooLarge { radius, extent } => {
                write!(
                    f,
                    "Impulse radius {radius} must be smaller than the smallest grid extent {extent}"
                )
            }
        }
    }
}

impl std::error::Error for FluidError {}
