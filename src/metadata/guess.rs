//! Heuristic identification from filename and path conventions.
//!
//! Guessing fails closed: a record is only produced when the filename yields a
//! plausible brand and model shape *and* some path segment names a known
//! device category. Downstream UIs mark guessed records and ask the user to
//! confirm, so a confident-looking wrong guess is worse than none.

use crate::metadata::vocab;
use crate::types::MetadataRecord;

/// Infer a metadata record from `filename` and the path segments of its
/// containing directory, root to leaf.
///
/// The caller is responsible for the reserved-namespace gate: files below an
/// `IRDB` segment must never reach this function (see the scanner).
pub fn guess_metadata(filename: &str, path_segments: &[String]) -> Option<MetadataRecord> {
    let stem = filename.strip_suffix(".ir").unwrap_or(filename);
    let parts: Vec<&str> = stem.split('_').collect();
    // A bare brand with no model token cannot be classified.
    if parts.len() < 2 {
        return None;
    }

    // Outermost recognized category wins; a file under .../TVS/Samsung/... is
    // a TV even if a deeper segment also happens to be a token.
    let device_type = path_segments.iter().find_map(|seg| vocab::device_type_for(seg))?;

    let brand = parts[0].to_uppercase();
    if !vocab::BRAND_PATTERN.is_match(&brand) {
        return None;
    }

    let model = parts[1..].join("_").to_uppercase();
    if !vocab::is_valid_model(&model) {
        return None;
    }

    Some(MetadataRecord {
        brand,
        model,
        device_type: device_type.to_string(),
        protocol: None,
        is_guessed: true,
    })
}
