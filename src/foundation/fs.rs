use std::{io::Write, path::Path};

use anyhow::Context;

use crate::foundation::error::GifloomResult;

/// Write `bytes` to `path` through a sibling temp file, so readers see either the old file or
/// the complete new one.
pub(crate) fn write_atomically(path: &Path, bytes: &[u8]) -> GifloomResult<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("create temp file in {}", dir.display()))?;
    tmp.write_all(bytes)
        .with_context(|| format!("write {}", tmp.path().display()))?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("persist {}", path.display()))?;
    Ok(())
}
