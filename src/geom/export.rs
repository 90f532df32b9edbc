//! Wavefront OBJ polyline export.
//!
//! Vertices are written as `v x y z` lines and every index run as one `l` line with
//! 1-based indices. Colors and texture coordinates are not exported.

use std::ffi::OsString;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::mesh::Mesh;

/// File name used when the caller does not supply one.
pub const DEFAULT_EXPORT_FILE_NAME: &str = "model.obj";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("export I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
}

/// Writes `mesh` as OBJ polylines, splitting its index buffer on `restart`.
pub fn write_polyline_obj<W: Write>(mesh: &Mesh, restart: u32, writer: W) -> Result<(), ExportError> {
    let text = polyline_obj_string(mesh, restart)?;
    let mut w = BufWriter::new(writer);
    w.write_all(text.as_bytes())?;
    w.flush()?;
    Ok(())
}

/// Renders `mesh` as OBJ polyline text.
pub fn polyline_obj_string(mesh: &Mesh, restart: u32) -> Result<String, ExportError> {
    let vertex_count = mesh.vertex_count();
    let runs = mesh.index_runs(restart);
    if let Some(&index) = runs.iter().flatten().find(|&&i| i as usize >= vertex_count) {
        return Err(ExportError::IndexOutOfRange { index, vertex_count });
    }

    let mut out = String::new();
    for vertex in &mesh.vertices {
        let p = vertex.position;
        let _ = writeln!(out, "v {} {} {}", p.x, p.y, p.z);
    }

    for (run_idx, run) in runs.iter().enumerate() {
        if run_idx > 0 {
            out.push('\n');
        }
        out.push('l');
        for &index in run {
            let _ = write!(out, " {}", u64::from(index) + 1);
        }
        out.push('\n');
    }

    Ok(out)
}

/// Writes `mesh` to `path`, appending `.obj` unless the file name already ends in it.
/// See [`with_obj_extension`].
///
/// Returns the path actually written.
pub fn save_polyline_obj(mesh: &Mesh, restart: u32, path: impl AsRef<Path>) -> Result<PathBuf, ExportError> {
    let path = with_obj_extension(path.as_ref());
    let file = File::create(&path)?;
    write_polyline_obj(mesh, restart, file)?;
    log::debug!("wrote {} polyline vertices to {}", mesh.vertex_count(), path.display());
    Ok(path)
}

/// `path` unchanged if its extension is `obj` (any case), otherwise with `.obj` appended.
///
/// Other extensions are kept rather than replaced: `fibers.txt` becomes
/// `fibers.txt.obj`, so the written file is always recognizable as OBJ.
#[must_use]
pub fn with_obj_extension(path: &Path) -> PathBuf {
    let has_obj = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("obj"));
    if has_obj {
        return path.to_path_buf();
    }
    let mut name = OsString::from(path.as_os_str());
    name.push(".obj");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obj_extension_is_appended_not_replaced() {
        assert_eq!(with_obj_extension(Path::new("model.obj")), PathBuf::from("model.obj"));
        assert_eq!(with_obj_extension(Path::new("fibers")), PathBuf::from("fibers.obj"));
        assert_eq!(with_obj_extension(Path::new("fibers.txt")), PathBuf::from("fibers.txt.obj"));
        assert_eq!(with_obj_extension(Path::new("MODEL.OBJ")), PathBuf::from("MODEL.OBJ"));
    }
}
