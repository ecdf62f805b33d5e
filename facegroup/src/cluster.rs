use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::dbscan::Dbscan;
use crate::embedding::{Embedding, Metric};
use crate::error::{FaceGroupError, Result};
use crate::extractor::{FaceExtractor, FaceRegion};
use crate::intake::{file_name, Intake};
use crate::room::RoomId;
use crate::store::ClusterStore;

/// Default DBSCAN radius in cosine distance.
pub const DEFAULT_EPS: f32 = 0.06;

/// Default neighborhood size for a core point.
pub const DEFAULT_MIN_SAMPLES: usize = 1;

/// Controls the clustering run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterParams {
    /// Maximum distance between two faces of the same identity.
    /// Default: 0.06.
    pub eps: f32,

    /// Neighborhood size (self included) for a core point.
    /// 1 gives every face a cluster; larger values drop noise faces.
    /// Default: 1.
    pub min_samples: usize,

    /// Distance used for neighborhoods. Default: cosine.
    pub metric: Metric,

    /// Neighborhood worker threads; 0 uses all cores.
    pub workers: usize,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            eps: DEFAULT_EPS,
            min_samples: DEFAULT_MIN_SAMPLES,
            metric: Metric::Cosine,
            workers: 0,
        }
    }
}

impl ClusterParams {
    /// Replaces zero values with defaults.
    pub fn with_defaults(mut self) -> Self {
        if self.eps == 0.0 {
            self.eps = DEFAULT_EPS;
        }
        if self.min_samples == 0 {
            self.min_samples = DEFAULT_MIN_SAMPLES;
        }
        self
    }

    fn dbscan(&self) -> Dbscan {
        Dbscan::new(self.eps, self.min_samples)
            .with_metric(self.metric)
            .with_workers(self.workers)
    }
}

/// Directory name of a cluster label.
pub fn cluster_label_name(label: usize) -> String {
    format!("cluster_{label}")
}

/// One face found in an intake photo.
#[derive(Debug, Clone)]
pub struct FaceRecord {
    pub photo: PathBuf,
    /// Index of the face within its photo, in extractor order.
    pub face: usize,
    pub region: FaceRegion,
    pub embedding: Embedding,
}

/// Label given to one face.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaceAssignment {
    pub photo: String,
    pub face: usize,
    pub region: FaceRegion,
    /// `None` when the face is noise (only possible with `min_samples > 1`).
    pub label: Option<usize>,
}

/// Outcome of [`run_clustering`].
#[derive(Debug, Clone, Serialize)]
pub struct ClusterReport {
    pub room: String,
    pub assignments: Vec<FaceAssignment>,
    /// Photos with no usable face.
    pub skipped: Vec<String>,
    /// Number of clusters written.
    pub clusters: usize,
}

impl ClusterReport {
    pub fn faces(&self) -> usize {
        self.assignments.len()
    }
}

/// Extracts every face from the intake photos, in filename order.
///
/// Photos without a face, or whose extraction fails, are skipped with a
/// warning and returned in the second list. An extractor that cannot run
/// at all fails the whole batch.
pub fn collect_faces(
    intake: &Intake,
    extractor: &dyn FaceExtractor,
) -> Result<(Vec<FaceRecord>, Vec<String>)> {
    let mut faces = Vec::new();
    let mut skipped = Vec::new();

    for photo in intake.photos()? {
        let name = file_name(&photo);
        let observed = match extractor.extract(&photo) {
            Ok(observed) => observed,
            Err(e @ FaceGroupError::ExtractorUnavailable { .. }) => return Err(e),
            Err(e) => {
                warn!(photo = %name, error = %e, "face extraction failed, skipping photo");
                skipped.push(name);
                continue;
            }
        };
        if observed.is_empty() {
            warn!(photo = %name, "no faces in photo");
            skipped.push(name);
            continue;
        }
        debug!(photo = %name, faces = observed.len(), "extracted faces");
        for (face, obs) in observed.into_iter().enumerate() {
            faces.push(FaceRecord {
                photo: photo.clone(),
                face,
                region: obs.region,
                embedding: obs.embedding,
            });
        }
    }

    Ok((faces, skipped))
}

/// Runs DBSCAN over the faces, one label per face.
pub fn assign_labels(faces: &[FaceRecord], params: &ClusterParams) -> Result<Vec<Option<usize>>> {
    let points: Vec<Embedding> = faces.iter().map(|f| f.embedding.clone()).collect();
    params.dbscan().fit_predict(&points)
}

/// Clusters every intake photo into the room, then clears the intake.
///
/// Fails with [`FaceGroupError::NoFaces`] before touching the store or
/// the intake when no photo yields a face. On success the room's previous
/// clusters are replaced, not merged.
pub fn run_clustering(
    intake: &Intake,
    extractor: &dyn FaceExtractor,
    store: &dyn ClusterStore,
    room: &RoomId,
    params: &ClusterParams,
) -> Result<ClusterReport> {
    let (faces, skipped) = collect_faces(intake, extractor)?;
    if faces.is_empty() {
        return Err(FaceGroupError::NoFaces);
    }

    let labels = assign_labels(&faces, params)?;

    let mut writer = store.rewrite_room(room)?;
    let mut written = BTreeSet::new();
    let mut assignments = Vec::with_capacity(faces.len());
    for (rec, label) in faces.iter().zip(labels) {
        let photo = file_name(&rec.photo);
        match label {
            Some(label) => {
                writer.add_member(&cluster_label_name(label), &rec.photo)?;
                written.insert(label);
            }
            None => warn!(photo = %photo, face = rec.face, "face is noise, not clustered"),
        }
        assignments.push(FaceAssignment {
            photo,
            face: rec.face,
            region: rec.region,
            label,
        });
    }
    writer.commit()?;

    let cleared = intake.clear()?;
    info!(
        room = %room,
        faces = assignments.len(),
        clusters = written.len(),
        skipped = skipped.len(),
        cleared,
        "clustering complete"
    );

    Ok(ClusterReport {
        room: room.to_string(),
        assignments,
        skipped,
        clusters: written.len(),
    })
}
