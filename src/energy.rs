//! Energy distribution
//!
//! Spreads a caller-supplied total energy across laps in proportion to each
//! lap's average intensity.

use crate::error::ConvertError;
use crate::types::{AllocatedSegment, WeightedSegment};

/// Relative tolerance between the allocated sum and the requested total
pub const ENERGY_RELATIVE_TOLERANCE: f64 = 1e-6;

/// Allocates total energy over weighted segments
pub struct EnergyDistributor;

impl EnergyDistributor {
    /// Distribute `total_energy` over `segments`.
    ///
    /// With no total, segments pass through with no energy. With a total, every
    /// segment receives `total * intensity / sum(intensity)`; a zero intensity
    /// sum cannot be apportioned and fails.
    pub fn distribute(
        segments: Vec<WeightedSegment>,
        total_energy: Option<f64>,
    ) -> Result<Vec<AllocatedSegment>, ConvertError> {
        let Some(total) = total_energy else {
            return Ok(segments
                .into_iter()
                .map(|weighted| AllocatedSegment {
                    weighted,
                    total_energy: None,
                })
                .collect());
        };

        if !total.is_finite() || total < 0.0 {
            return Err(ConvertError::InvalidParameter(format!(
                "total energy must be a non-negative number, got {total}"
            )));
        }

        let intensity_sum: f64 = segments.iter().map(|s| s.average_intensity).sum();
        if intensity_sum == 0.0 {
            return Err(ConvertError::ArithmeticError(format!(
                "cannot distribute {total} kcal: total intensity across {} segments is zero",
                segments.len()
            )));
        }

        let allocated: Vec<AllocatedSegment> = segments
            .into_iter()
            .map(|weighted| {
                let share = total * (weighted.average_intensity / intensity_sum);
                AllocatedSegment {
                    weighted,
                    total_energy: Some(share),
                }
            })
            .collect();

        log::debug!(
            "Distributed {} kcal over {} segments",
            total,
            allocated.len()
        );

        Ok(allocated)
    }
}

/// Whether `allocated` matches `total` within [`ENERGY_RELATIVE_TOLERANCE`]
pub fn within_tolerance(allocated: f64, total: f64) -> bool {
    if total == 0.0 {
        return allocated.abs() <= ENERGY_RELATIVE_TOLERANCE;
    }
    ((allocated - total) / total).abs() <= ENERGY_RELATIVE_TOLERANCE
}
