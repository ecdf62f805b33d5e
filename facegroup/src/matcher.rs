use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::embedding::{mean, Embedding, Metric};
use crate::error::{FaceGroupError, Result};
use crate::extractor::FaceExtractor;
use crate::intake::{file_name, Intake};
use crate::room::RoomId;
use crate::store::ClusterStore;

/// Controls the search run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchParams {
    /// Distance from the query to a centroid. Default: euclidean.
    pub metric: Metric,
}

impl Default for MatchParams {
    fn default() -> Self {
        Self {
            metric: Metric::Euclidean,
        }
    }
}

/// Nearest cluster for a query, or no match.
///
/// Serializes as `{"cluster": <name or null>, "images": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub cluster: Option<String>,
    pub images: Vec<String>,
    /// Distance from the query to the winning centroid.
    #[serde(skip)]
    pub distance: Option<f64>,
}

impl MatchResult {
    pub fn no_match() -> Self {
        Self {
            cluster: None,
            images: Vec::new(),
            distance: None,
        }
    }

    pub fn is_match(&self) -> bool {
        self.cluster.is_some()
    }
}

/// Mean embedding of a cluster's recoverable images.
#[derive(Debug, Clone)]
pub struct Centroid {
    pub cluster: String,
    pub centroid: Embedding,
    /// Images that yielded an embedding.
    pub recovered: usize,
}

/// Extracts the query embedding from the first photo (by name) in the
/// search intake. Uses the first face when the photo holds several.
pub fn extract_query(intake: &Intake, extractor: &dyn FaceExtractor) -> Result<Embedding> {
    let photo = intake.first()?.ok_or_else(|| FaceGroupError::NoQueryImage {
        dir: intake.dir().to_path_buf(),
    })?;
    let name = file_name(&photo);
    let mut faces = extractor.extract(&photo)?;
    if faces.len() > 1 {
        debug!(photo = %name, faces = faces.len(), "query has several faces, using the first");
    }
    if faces.is_empty() {
        return Err(FaceGroupError::NoQueryFace { file: name });
    }
    Ok(faces.swap_remove(0).embedding)
}

/// Recomputes one centroid per cluster by re-extracting every stored image.
///
/// Only the first face of each image counts. Images without a face, or of
/// a dimension other than `dim`, are skipped; a cluster with no recoverable
/// image is skipped with a warning. Order follows the store listing.
pub fn cluster_centroids(
    store: &dyn ClusterStore,
    room: &RoomId,
    extractor: &dyn FaceExtractor,
    dim: usize,
) -> Result<Vec<Centroid>> {
    let mut centroids = Vec::new();

    for cluster in store.clusters(room)? {
        let mut embeddings: Vec<Embedding> = Vec::new();
        for member in store.members(room, &cluster)? {
            let path = store.member_path(room, &cluster, &member)?;
            let face = match extractor.extract(&path) {
                Ok(faces) => faces.into_iter().next(),
                Err(e @ FaceGroupError::ExtractorUnavailable { .. }) => return Err(e),
                Err(e) => {
                    debug!(cluster = %cluster, image = %member, error = %e, "extraction failed");
                    None
                }
            };
            let Some(face) = face else {
                debug!(cluster = %cluster, image = %member, "no face in stored image");
                continue;
            };
            if face.embedding.len() != dim {
                warn!(
                    cluster = %cluster,
                    image = %member,
                    expected = dim,
                    got = face.embedding.len(),
                    "embedding dimension differs from query, skipping image"
                );
                continue;
            }
            embeddings.push(face.embedding);
        }

        match mean(&embeddings)? {
            Some(centroid) => centroids.push(Centroid {
                cluster,
                centroid,
                recovered: embeddings.len(),
            }),
            None => warn!(cluster = %cluster, "no recoverable images, skipping cluster"),
        }
    }

    Ok(centroids)
}

/// Index and distance of the nearest centroid.
///
/// Ties keep the earlier centroid. This tie-break follows listing order
/// and says nothing about which cluster is the better match.
pub fn nearest(query: &[f32], centroids: &[Centroid], metric: Metric) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, c) in centroids.iter().enumerate() {
        let d = metric.distance(query, &c.centroid);
        debug!(cluster = %c.cluster, distance = d, recovered = c.recovered, "centroid distance");
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((i, d)),
        }
    }
    best
}

/// Finds the room's cluster whose centroid is nearest to `query`.
///
/// Fails with [`FaceGroupError::RoomNotFound`] for an unknown room. A room
/// without any recoverable cluster yields [`MatchResult::no_match`].
pub fn run_search(
    store: &dyn ClusterStore,
    room: &RoomId,
    query: &[f32],
    extractor: &dyn FaceExtractor,
    params: &MatchParams,
) -> Result<MatchResult> {
    if !store.contains_room(room)? {
        return Err(FaceGroupError::RoomNotFound(room.to_string()));
    }

    let centroids = cluster_centroids(store, room, extractor, query.len())?;
    let Some((idx, distance)) = nearest(query, &centroids, params.metric) else {
        info!(room = %room, "no cluster to match against");
        return Ok(MatchResult::no_match());
    };

    let cluster = centroids[idx].cluster.clone();
    let images = store.members(room, &cluster)?;
    info!(room = %room, cluster = %cluster, distance, metric = %params.metric, "matched cluster");

    Ok(MatchResult {
        cluster: Some(cluster),
        images,
        distance: Some(distance),
    })
}
