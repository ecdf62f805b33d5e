//! Per-room face grouping: offline DBSCAN clustering of face embeddings and
//! nearest-centroid matching of a query face.
//!
//! # Pipeline
//!
//! 1. [`FaceExtractor::extract`]: image -> zero or more faces, each with an embedding
//! 2. [`run_clustering`]: all intake photos -> DBSCAN labels -> `cluster_<label>` copies
//!    in the room's [`ClusterStore`], then the intake is cleared
//! 3. [`run_search`]: query embedding -> per-cluster centroids (recomputed from the
//!    stored images) -> nearest cluster, or no match
//!
//! # Usage
//!
//! ```no_run
//! use facegroup::{
//!     extract_query, run_clustering, run_search, ClusterParams, CommandExtractor,
//!     DirStore, Intake, MatchParams, RoomId,
//! };
//!
//! let extractor = CommandExtractor::new("face-embed");
//! let store = DirStore::new("clusters");
//! let room = RoomId::new("514409")?;
//!
//! let report = run_clustering(
//!     &Intake::new("uploads/all_photos"),
//!     &extractor,
//!     &store,
//!     &room,
//!     &ClusterParams::default(),
//! )?;
//! println!("{} clusters", report.clusters);
//!
//! let query = extract_query(&Intake::new("uploads/search_photo"), &extractor)?;
//! let found = run_search(&store, &room, &query, &extractor, &MatchParams::default())?;
//! println!("{}", serde_json::to_string(&found)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Metrics
//!
//! Clustering compares faces by cosine distance; matching compares the query
//! to centroids by Euclidean distance. Both are configurable independently
//! through [`ClusterParams::metric`] and [`MatchParams::metric`].

mod cluster;
mod dbscan;
mod embedding;
mod error;
mod extractor;
mod intake;
mod matcher;
mod room;
mod store;

#[cfg(test)]
mod testutil;

pub use cluster::{
    assign_labels, cluster_label_name, collect_faces, run_clustering, ClusterParams,
    ClusterReport, FaceAssignment, FaceRecord, DEFAULT_EPS, DEFAULT_MIN_SAMPLES,
};
pub use dbscan::Dbscan;
pub use embedding::{cosine_distance, cosine_sim, euclidean, mean, Embedding, Metric};
pub use error::{FaceGroupError, Result};
pub use extractor::{parse_faces, CommandExtractor, FaceExtractor, FaceObservation, FaceRegion};
pub use intake::Intake;
pub use matcher::{
    cluster_centroids, extract_query, nearest, run_search, Centroid, MatchParams, MatchResult,
};
pub use room::RoomId;
pub use store::{ClusterStore, DirStore, MemoryStore, RoomWriter};
