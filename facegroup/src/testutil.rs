use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::embedding::Embedding;
use crate::error::{FaceGroupError, Result};
use crate::extractor::{FaceExtractor, FaceObservation, FaceRegion};
use crate::intake::{file_name, Intake};

/// Looks faces up by filename; unknown files fail extraction.
pub(crate) struct StubExtractor(HashMap<String, Vec<Embedding>>);

impl StubExtractor {
    pub(crate) fn new(entries: &[(&str, Vec<Embedding>)]) -> Self {
        Self(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }
}

impl FaceExtractor for StubExtractor {
    fn extract(&self, image: &Path) -> Result<Vec<FaceObservation>> {
        let faces = self
            .0
            .get(&file_name(image))
            .ok_or_else(|| FaceGroupError::Extractor("unreadable image".into()))?;
        Ok(faces
            .iter()
            .map(|e| FaceObservation {
                region: FaceRegion::default(),
                embedding: e.clone(),
            })
            .collect())
    }
}

/// Creates one small file per name and returns an intake over `dir`.
pub(crate) fn intake_with(dir: &Path, names: &[&str]) -> Intake {
    for n in names {
        fs::write(dir.join(n), n).unwrap();
    }
    Intake::new(dir)
}
