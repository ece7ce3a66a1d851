// used for packing generated artifacts
use std::io::{Cursor, Write};
use std::path::{Component, Path};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::engine::{slug, Artifact};
use crate::error::{LangforgeError, Result};
use crate::protocol::{archive_name, Archive};

/// Packs `artifacts` into `<language_name>.zip`, every entry placed under a
/// `<slug>/` root directory.
pub fn pack(language_name: &str, artifacts: &[Artifact]) -> Result<Archive> {
    if artifacts.is_empty() {
        return Err(LangforgeError::EmptyArchive(language_name.to_string()));
    }
    let root = slug(language_name);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for artifact in artifacts {
        if !is_relative_entry(&artifact.path) {
            return Err(LangforgeError::Generation(format!(
                "artifact path '{}' would escape the archive root",
                artifact.path
            )));
        }
        writer.start_file(format!("{root}/{}", artifact.path), options)?;
        writer.write_all(&artifact.contents)?;
    }
    let bytes = writer.finish()?.into_inner();
    Ok(Archive {
        file_name: archive_name(language_name),
        bytes,
    })
}

// Only plain names joined by '/'. No roots, no '.' or '..', no backslashes.
fn is_relative_entry(path: &str) -> bool {
    !path.contains('\\')
        && path
            .split('/')
            .all(|part| !part.is_empty() && part != "." && part != "..")
        && Path::new(path)
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}
