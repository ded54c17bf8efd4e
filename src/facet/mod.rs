//! Faceted breakdown: per-category aggregation within a coarse level.

use crate::aggregate::aggregate_level;
use crate::data::{CountMatrix, Level};
use crate::error::{ProfileError, Result};
use crate::join::JoinedTable;
use crate::normalize::norm_percent;
use log::warn;

/// Result for one facet value.
#[derive(Debug, Clone)]
pub enum FacetOutcome {
    /// The facet produced a non-empty matrix.
    Built { value: String, matrix: CountMatrix },
    /// The facet had nothing to show; this is a notice, not a failure.
    Skipped { value: String, reason: String },
}

impl FacetOutcome {
    /// Facet value this outcome belongs to.
    pub fn value(&self) -> &str {
        match self {
            Self::Built { value, .. } | Self::Skipped { value, .. } => value,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

/// Aggregate `level` separately within each distinct `facet_level` value.
///
/// Facets are visited in order of first appearance of their value. Each facet
/// is pivoted on its own subset of rows and, when `normalized` is set, scaled
/// to percent of the facet's own total, not the global one. A facet whose
/// pivot comes out empty, or whose counts are all zero, is reported as
/// [`FacetOutcome::Skipped`].
pub fn facet_breakdown(
    table: &JoinedTable<'_>,
    facet_level: Level,
    level: Level,
    normalized: bool,
) -> Result<Vec<FacetOutcome>> {
    let mut outcomes = Vec::new();

    for value in table.distinct_levels(facet_level) {
        let subset = table.filter_level(facet_level, value);
        let matrix = aggregate_level(&subset, level)?;

        if matrix.is_empty() {
            let reason = format!("No data for {} with {}={}", level, facet_level, value);
            warn!("{}. Skipping heatmap.", reason);
            outcomes.push(FacetOutcome::Skipped {
                value: value.to_string(),
                reason,
            });
            continue;
        }

        let matrix = if normalized {
            match norm_percent(&matrix) {
                Ok(norm) => norm,
                Err(ProfileError::Numerical(msg)) => {
                    let reason = format!("{} with {}={}: {}", level, facet_level, value, msg);
                    warn!("{}. Skipping heatmap.", reason);
                    outcomes.push(FacetOutcome::Skipped {
                        value: value.to_string(),
                        reason,
                    });
                    continue;
                }
                Err(e) => return Err(e),
            }
        } else {
            matrix
        };

        outcomes.push(FacetOutcome::Built {
            value: value.to_string(),
            matrix,
        });
    }

    Ok(outcomes)
}
