//! Capture grid planning
//!
//! Splits the viewing sphere into elevation bands and each band into evenly
//! spaced azimuth slots. Bands are a fixed table, denser near the equator
//! and coarser toward the poles, since a pole is covered by a few wide shots.

pub mod queue;

pub use queue::CaptureQueue;

use crate::config::{AzimuthSpacing, GridConfig};
use crate::errors::PanoramaError;
use crate::types::CaptureSlot;

/// Smallest azimuth step the planner will ever use
pub const MIN_AZIMUTH_STEP_DEG: f64 = 1.0;

/// Upper bound on a field-of-view derived azimuth step
pub const MAX_DERIVED_AZIMUTH_STEP_DEG: f64 = 90.0;

/// One ring of slots at a fixed elevation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevationBand {
    pub elevation_deg: f64,
    /// Azimuth increment used with [`AzimuthSpacing::BandTable`]
    pub azimuth_increment_deg: f64,
}

/// Equator first, then alternating bands toward each pole.
pub const ELEVATION_BANDS: [ElevationBand; 7] = [
    ElevationBand {
        elevation_deg: 0.0,
        azimuth_increment_deg: 30.0,
    },
    ElevationBand {
        elevation_deg: 30.0,
        azimuth_increment_deg: 45.0,
    },
    ElevationBand {
        elevation_deg: -30.0,
        azimuth_increment_deg: 45.0,
    },
    ElevationBand {
        elevation_deg: 60.0,
        azimuth_increment_deg: 60.0,
    },
    ElevationBand {
        elevation_deg: -60.0,
        azimuth_increment_deg: 60.0,
    },
    ElevationBand {
        elevation_deg: 90.0,
        azimuth_increment_deg: 90.0,
    },
    ElevationBand {
        elevation_deg: -90.0,
        azimuth_increment_deg: 90.0,
    },
];

/// Plan the capture queue with the default band table spacing.
///
/// With [`AzimuthSpacing::BandTable`] the azimuth steps come from
/// [`ELEVATION_BANDS`] alone: `hfov_deg`, `vfov_deg` and `overlap_factor` are
/// validated but do not change the plan, so every valid camera gets the same
/// 48 slots. Use [`plan_grid_with`] and [`AzimuthSpacing::FieldOfView`] to
/// size the steps to a narrow or wide lens.
pub fn plan_grid(
    hfov_deg: f64,
    vfov_deg: f64,
    overlap_factor: f64,
) -> Result<CaptureQueue, PanoramaError> {
    plan_grid_with(&GridConfig {
        hfov_deg,
        vfov_deg,
        overlap_factor,
        azimuth_spacing: AzimuthSpacing::BandTable,
    })
}

/// Plan the capture queue from a full grid configuration.
///
/// The configuration is validated first, so an invalid field of view never
/// produces a partial queue.
pub fn plan_grid_with(config: &GridConfig) -> Result<CaptureQueue, PanoramaError> {
    config.validate()?;

    let mut slots = Vec::new();
    for band in ELEVATION_BANDS.iter() {
        let step = azimuth_step(band, config);
        let count = slots_in_band(step);
        log::debug!(
            "Band {:+.0}°: step {:.2}°, {} slots",
            band.elevation_deg,
            step,
            count
        );
        slots.extend(
            (0..count).map(|i| CaptureSlot::new(i as f64 * step, band.elevation_deg)),
        );
    }

    log::info!(
        "Planned {} capture slots (hfov {}°, vfov {}°, overlap {}, {:?})",
        slots.len(),
        config.hfov_deg,
        config.vfov_deg,
        config.overlap_factor,
        config.azimuth_spacing
    );
    Ok(CaptureQueue::new(slots))
}

/// Azimuth step for a band, never below [`MIN_AZIMUTH_STEP_DEG`].
pub fn azimuth_step(band: &ElevationBand, config: &GridConfig) -> f64 {
    let raw = match config.azimuth_spacing {
        AzimuthSpacing::BandTable => band.azimuth_increment_deg,
        AzimuthSpacing::FieldOfView => {
            let cos_el = band.elevation_deg.to_radians().cos();
            // Rings shrink toward the poles; a patch spans more azimuth there.
            if cos_el < 1e-6 {
                MAX_DERIVED_AZIMUTH_STEP_DEG
            } else {
                let width = config.hfov_deg * config.overlap_factor / cos_el;
                width.min(MAX_DERIVED_AZIMUTH_STEP_DEG)
            }
        }
    };

    if raw.is_finite() && raw >= MIN_AZIMUTH_STEP_DEG {
        raw
    } else {
        MIN_AZIMUTH_STEP_DEG
    }
}

fn slots_in_band(step: f64) -> usize {
    let mut count = ((360.0 / step).ceil() as usize).max(1);
    // Rounding in the division can add a slot that lands on 360°
    while count > 1 && (count - 1) as f64 * step >= 360.0 {
        count -= 1;
    }
    count
}

/// Total slot count without materialising the queue.
pub fn total_slots(config: &GridConfig) -> Result<usize, PanoramaError> {
    config.validate()?;
    Ok(ELEVATION_BANDS
        .iter()
        .map(|band| slots_in_band(azimuth_step(band, config)))
        .sum())
}
