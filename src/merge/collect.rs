//! Collection of raw per-sample search outputs into one hit table.

use crate::data::AnnotationHits;
use crate::error::Result;
use log::info;
use std::path::Path;

/// Read every search output in `paths` and concatenate the hits, in order.
pub fn collect_hits<P: AsRef<Path>>(paths: &[P]) -> Result<AnnotationHits> {
    let mut collected = AnnotationHits::default();
    for path in paths {
        let hits = AnnotationHits::from_diamond(path)?;
        info!("Read {} hits from {:?}", hits.len(), path.as_ref());
        collected.extend(hits);
    }
    Ok(collected)
}
