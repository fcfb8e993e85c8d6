/*! Locating and parsing model artifacts on disk.

A model directory holds one of `model.onnx`, `model.nnef.tar` or an
unpacked NNEF graph (`graph.nnef`). A descriptor may also point
straight at an ONNX file or NNEF archive.

If you're going to load NNEF files on a thread; the first load on each
thread pays for setting up the NNEF framework.
*/

use anyhow::{bail, Result};
use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};
use tract_hir::prelude::InferenceModel;
use tract_nnef::{framework::Nnef, prelude::*};
use tract_onnx::WithOnnx;

thread_local!(
    /// Creating the NNEF framework is noticeably expensive, so it only happens once per thread.
    static NNEF: Nnef = tract_nnef::nnef().with_tract_core().with_onnx()
);

/// The file formats a classifier can be loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// An ONNX protobuf file.
    Onnx(PathBuf),

    /// An NNEF archive or unpacked NNEF directory.
    Nnef(PathBuf),
}

impl Artifact {
    pub fn path(&self) -> &Path {
        match self {
            Artifact::Onnx(path) | Artifact::Nnef(path) => path,
        }
    }
}

/// Utility function to check if a file name is `.nnef.tar`.
pub fn is_nnef_tar(path: &Path) -> bool {
    if let Some(ext) = path.extension().and_then(OsStr::to_str) {
        if ext != "tar" {
            return false;
        }

        let stem = match path.file_stem().and_then(OsStr::to_str).map(PathBuf::from) {
            Some(p) => p,
            None => return false,
        };

        if let Some(ext) = stem.extension().and_then(OsStr::to_str) {
            return ext == "nnef";
        }
    }

    false
}

/// Find the model artifact at `path`.
pub fn locate(path: &Path) -> Result<Artifact> {
    if path.is_file() {
        if is_nnef_tar(path) {
            return Ok(Artifact::Nnef(path.to_owned()));
        }

        return match path.extension().and_then(OsStr::to_str) {
            Some("onnx") => Ok(Artifact::Onnx(path.to_owned())),
            Some(other) => bail!("unknown file type {:?}", other),
            None => bail!("missing file extension {:?}", path),
        };
    }

    if !path.is_dir() {
        bail!("no model found at {:?}", path);
    }

    let onnx = path.join("model.onnx");
    if onnx.is_file() {
        return Ok(Artifact::Onnx(onnx));
    }

    let tar = path.join("model.nnef.tar");
    if tar.is_file() {
        return Ok(Artifact::Nnef(tar));
    }

    if path.join("graph.nnef").is_file() {
        return Ok(Artifact::Nnef(path.to_owned()));
    }

    bail!(
        "expected model.onnx, model.nnef.tar or graph.nnef in {:?}",
        path
    )
}

pub(crate) fn read_onnx(path: &Path) -> Result<InferenceModel> {
    tract_onnx::onnx().model_for_path(path)
}

pub(crate) fn read_nnef(path: &Path) -> Result<TypedModel> {
    NNEF.with(|nnef| nnef.model_for_path(path))
}
