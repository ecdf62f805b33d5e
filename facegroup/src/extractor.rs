use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};

use crate::embedding::Embedding;
use crate::error::{FaceGroupError, Result};

/// Pixel bounding box of a detected face.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceRegion {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

/// One detected face within a photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceObservation {
    #[serde(default)]
    pub region: FaceRegion,
    pub embedding: Embedding,
}

/// Detects faces in an image and computes one embedding per face.
///
/// An empty result means the image has no usable face. Implementations
/// must be deterministic for centroid recomputation to reproduce the
/// embeddings seen at clustering time.
pub trait FaceExtractor: Send + Sync {
    fn extract(&self, image: &Path) -> Result<Vec<FaceObservation>>;
}

/// Parses the extractor wire format: a JSON array of face observations.
pub fn parse_faces(data: &[u8]) -> Result<Vec<FaceObservation>> {
    let faces: Vec<FaceObservation> = serde_json::from_slice(data)?;
    Ok(faces)
}

/// Runs an external program per image.
///
/// The image path is appended as the last argument. The program must exit 0
/// and print a JSON array of `{"region": {...}, "embedding": [...]}` to stdout.
/// A program that cannot be started is [`FaceGroupError::ExtractorUnavailable`];
/// a run that fails on one image is [`FaceGroupError::Extractor`].
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandExtractor {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Sets arguments placed before the image path.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl FaceExtractor for CommandExtractor {
    fn extract(&self, image: &Path) -> Result<Vec<FaceObservation>> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(image)
            .output()
            .map_err(|source| FaceGroupError::ExtractorUnavailable {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FaceGroupError::Extractor(format!(
                "{} exited with {} on {}: {}",
                self.program.display(),
                output.status,
                image.display(),
                stderr.trim()
            )));
        }

        parse_faces(&output.stdout).map_err(|e| {
            FaceGroupError::Extractor(format!(
                "bad output from {} on {}: {e}",
                self.program.display(),
                image.display()
            ))
        })
    }
}
