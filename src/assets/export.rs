use std::collections::HashSet;

use crate::{
    assets::decode::encode_png,
    assets::store::{MaterialId, MaterialStore},
    foundation::error::GifloomResult,
};

const MAX_STEM_CHARS: usize = 64;
const FALLBACK_STEM: &str = "material";

/// Encode materials as PNG files named after their origin.
///
/// All ids are resolved before anything is encoded; a missing id fails the whole call.
/// Names are sanitized with [`sanitize_file_stem`] and de-duplicated case-insensitively by
/// suffixing `_1`, `_2`, ...
#[tracing::instrument(skip(store, ids), fields(count = ids.len()))]
pub fn export_png(store: &MaterialStore, ids: &[MaterialId]) -> GifloomResult<Vec<(String, Vec<u8>)>> {
    let materials = ids
        .iter()
        .map(|&id| store.get(id))
        .collect::<GifloomResult<Vec<_>>>()?;

    let mut used = HashSet::new();
    let mut out = Vec::with_capacity(materials.len());
    for material in materials {
        let stem = sanitize_file_stem(&material.origin().display_name());
        let file_name = unique_name(&stem, "png", &mut used);
        out.push((file_name, encode_png(material.raster())?));
    }
    Ok(out)
}

/// Reduce an arbitrary label to a safe file stem.
///
/// Control characters and path separators are dropped, anything outside `[A-Za-z0-9._-]`
/// becomes `_`, leading dots are removed and the result is capped at 64 characters.
pub fn sanitize_file_stem(raw: &str) -> String {
    let mut stem: String = raw
        .chars()
        .filter(|c| !c.is_control() && *c != '/' && *c != '\\')
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = stem.trim_start_matches('.').len();
    stem.drain(..stem.len() - trimmed);
    stem.truncate(MAX_STEM_CHARS);

    if stem.chars().all(|c| c == '_' || c == '.') {
        return FALLBACK_STEM.to_string();
    }
    stem
}

pub(crate) fn unique_name(stem: &str, ext: &str, used: &mut HashSet<String>) -> String {
    let mut candidate = format!("{stem}.{ext}");
    let mut n = 1usize;
    while !used.insert(candidate.to_ascii_lowercase()) {
        candidate = format!("{stem}_{n}.{ext}");
        n += 1;
    }
    candidate
}

#[cfg(test)]
#[path = "../../tests/unit/assets/export.rs"]
mod tests;
