//! Writing the final permutation.

use itertools::Itertools;
use log::info;
use std::{
    io::{BufWriter, Write},
    path::Path,
};
use tempfile::NamedTempFile;

use crate::{
    graph::{GraphError, VertexIndex},
    Error,
};

/// Space separated images in source order with the offset added back.
/// Fails on the first image that has no identifier in `i64`.
pub fn format_permutation(
    permutation: &[VertexIndex],
    offset: i64,
) -> Result<String, GraphError> {
    let identifiers = permutation
        .iter()
        .map(|image| {
            i64::try_from(*image)
                .ok()
                .and_then(|image| image.checked_add(offset))
                .ok_or(GraphError(*image as i64))
        })
        .collect::<Result<Vec<i64>, GraphError>>()?;

    Ok(identifiers.iter().join(" "))
}

/// Write the permutation to `path` at once. The content goes to a
/// temporary file next to `path` first which then replaces it, so
/// readers never see a partial file.
pub fn write_permutation<P: AsRef<Path>>(
    path: P,
    permutation: &[VertexIndex],
    offset: i64,
) -> Result<(), Error> {
    let path = path.as_ref();
    let line = format_permutation(permutation, offset)?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(directory)?;
    {
        let mut writer = BufWriter::new(&mut file);
        writeln!(writer, "{}", line)?;
        writer.flush()?;
    }
    file.persist(path)?;

    info!(
        "Wrote permutation of {} vertices to {}",
        permutation.len(),
        path.display()
    );
    Ok(())
}
