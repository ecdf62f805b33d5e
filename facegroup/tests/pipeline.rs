//! End-to-end cluster/search runs against an on-disk store.
//!
//! Test photos hold their own extractor output as JSON, so a plain file
//! read stands in for face detection.

use std::fs;
use std::path::Path;

use facegroup::{
    assign_labels, cluster_centroids, collect_faces, extract_query, parse_faces, run_clustering,
    run_search, ClusterParams, ClusterStore, DirStore, FaceExtractor, FaceGroupError,
    FaceObservation, Intake, MatchParams, MatchResult, RoomId,
};

struct JsonFileExtractor;

impl FaceExtractor for JsonFileExtractor {
    fn extract(&self, image: &Path) -> facegroup::Result<Vec<FaceObservation>> {
        let data = fs::read(image).map_err(|e| FaceGroupError::Extractor(e.to_string()))?;
        parse_faces(&data)
    }
}

struct Env {
    _tmp: tempfile::TempDir,
    intake: Intake,
    search: Intake,
    store: DirStore,
}

impl Env {
    fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let intake_dir = tmp.path().join("uploads/all_photos");
        let search_dir = tmp.path().join("uploads/search_photo");
        fs::create_dir_all(&intake_dir).unwrap();
        fs::create_dir_all(&search_dir).unwrap();
        Self {
            intake: Intake::new(&intake_dir),
            search: Intake::new(&search_dir),
            store: DirStore::new(tmp.path().join("clusters")),
            _tmp: tmp,
        }
    }

    fn add_photo(&self, name: &str, faces: &[&[f32]]) {
        write_faces(&self.intake.dir().join(name), faces);
    }

    fn add_query(&self, name: &str, faces: &[&[f32]]) {
        write_faces(&self.search.dir().join(name), faces);
    }

    fn cluster(&self, room: &RoomId) -> facegroup::Result<facegroup::ClusterReport> {
        run_clustering(
            &self.intake,
            &JsonFileExtractor,
            &self.store,
            room,
            &ClusterParams::default(),
        )
    }

    fn search(&self, room: &RoomId) -> facegroup::Result<MatchResult> {
        let query = extract_query(&self.search, &JsonFileExtractor)?;
        run_search(
            &self.store,
            room,
            &query,
            &JsonFileExtractor,
            &MatchParams::default(),
        )
    }
}

fn write_faces(path: &Path, faces: &[&[f32]]) {
    let body: Vec<serde_json::Value> = faces
        .iter()
        .map(|e| serde_json::json!({ "region": { "top": 0, "right": 96, "bottom": 96, "left": 0 }, "embedding": e }))
        .collect();
    fs::write(path, serde_json::to_vec(&body).unwrap()).unwrap();
}

fn room(id: &str) -> RoomId {
    RoomId::new(id).unwrap()
}

const A1: &[f32] = &[1.0, 0.0, 0.0];
const A2: &[f32] = &[0.99, 0.1, 0.0];
const A_QUERY: &[f32] = &[0.98, 0.15, 0.0];
const B: &[f32] = &[0.0, 1.0, 0.0];

#[test]
fn two_people_three_photos() {
    let env = Env::new();
    let r1 = room("r1");
    env.add_photo("a1.jpg", &[A1]);
    env.add_photo("a2.jpg", &[A2]);
    env.add_photo("b.jpg", &[B]);

    let report = env.cluster(&r1).unwrap();
    assert_eq!(report.clusters, 2);
    assert_eq!(report.faces(), 3);
    assert!(report.skipped.is_empty());

    let clusters = env.store.clusters(&r1).unwrap();
    assert_eq!(clusters, vec!["cluster_0", "cluster_1"]);
    assert_eq!(
        env.store.members(&r1, "cluster_0").unwrap(),
        vec!["a1.jpg", "a2.jpg"]
    );
    assert_eq!(env.store.members(&r1, "cluster_1").unwrap(), vec!["b.jpg"]);
    assert!(env.intake.photos().unwrap().is_empty(), "intake is cleared");

    env.add_query("query.jpg", &[A_QUERY]);
    let result = env.search(&r1).unwrap();
    assert_eq!(
        serde_json::to_string(&result).unwrap(),
        r#"{"cluster":"cluster_0","images":["a1.jpg","a2.jpg"]}"#
    );
}

#[test]
fn single_photo_single_cluster() {
    let env = Env::new();
    let r = room("solo");
    env.add_photo("me.jpg", &[A1]);

    let report = env.cluster(&r).unwrap();
    assert_eq!(report.clusters, 1);
    assert_eq!(env.store.clusters(&r).unwrap(), vec!["cluster_0"]);
    assert_eq!(env.store.members(&r, "cluster_0").unwrap(), vec!["me.jpg"]);
}

#[test]
fn no_faces_anywhere_is_fatal_and_harmless() {
    let env = Env::new();
    let r1 = room("r1");
    env.add_photo("landscape.jpg", &[]);
    fs::write(env.intake.dir().join("corrupt.jpg"), b"\xff\xd8 not json").unwrap();

    let err = env.cluster(&r1).unwrap_err();
    assert!(matches!(err, FaceGroupError::NoFaces));
    assert_eq!(env.intake.photos().unwrap().len(), 2, "intake untouched");
    assert!(!env.store.contains_room(&r1).unwrap(), "store untouched");
    assert!(env.store.rooms().unwrap().is_empty());
}

#[test]
fn every_face_labeled_and_dirs_match_labels() {
    let env = Env::new();
    let r1 = room("r1");
    env.add_photo("group.jpg", &[A1, B]);
    env.add_photo("a2.jpg", &[A2]);
    env.add_photo("c.jpg", &[&[0.0, 0.0, 1.0]]);

    let report = env.cluster(&r1).unwrap();
    assert_eq!(report.faces(), 4);
    assert!(report.assignments.iter().all(|a| a.label.is_some()));

    let mut labels: Vec<usize> = report.assignments.iter().filter_map(|a| a.label).collect();
    labels.sort();
    labels.dedup();
    assert_eq!(env.store.clusters(&r1).unwrap().len(), labels.len());
}

#[test]
fn reclustering_replaces_previous_clusters() {
    let env = Env::new();
    let r1 = room("r1");
    env.add_photo("a.jpg", &[A1]);
    env.add_photo("b.jpg", &[B]);
    env.add_photo("c.jpg", &[&[0.0, 0.0, 1.0]]);
    env.cluster(&r1).unwrap();
    assert_eq!(env.store.clusters(&r1).unwrap().len(), 3);

    env.add_photo("a2.jpg", &[A2]);
    env.cluster(&r1).unwrap();
    assert_eq!(env.store.clusters(&r1).unwrap(), vec!["cluster_0"]);
    assert_eq!(env.store.members(&r1, "cluster_0").unwrap(), vec!["a2.jpg"]);
}

#[test]
fn rooms_are_isolated() {
    let env = Env::new();
    env.add_photo("a.jpg", &[A1]);
    env.cluster(&room("one")).unwrap();
    env.add_photo("b.jpg", &[B]);
    env.cluster(&room("two")).unwrap();

    assert_eq!(env.store.rooms().unwrap(), vec![room("one"), room("two")]);

    env.add_query("q.jpg", &[A_QUERY]);
    let result = env.search(&room("two")).unwrap();
    assert_eq!(result.images, vec!["b.jpg"], "only room two is searched");
}

#[test]
fn search_unknown_room() {
    let env = Env::new();
    env.add_query("q.jpg", &[A1]);
    let err = env.search(&room("ghost")).unwrap_err();
    assert!(matches!(err, FaceGroupError::RoomNotFound(r) if r == "ghost"));
}

#[test]
fn search_without_recoverable_images_is_no_match() {
    let env = Env::new();
    let r1 = room("r1");
    env.add_photo("a.jpg", &[A1]);
    env.cluster(&r1).unwrap();

    let stored = env.store.member_path(&r1, "cluster_0", "a.jpg").unwrap();
    fs::write(&stored, b"[]").unwrap();

    env.add_query("q.jpg", &[A1]);
    let result = env.search(&r1).unwrap();
    assert_eq!(
        serde_json::to_string(&result).unwrap(),
        r#"{"cluster":null,"images":[]}"#
    );
}

#[test]
fn search_without_query_photo_or_face() {
    let env = Env::new();
    let r1 = room("r1");
    env.add_photo("a.jpg", &[A1]);
    env.cluster(&r1).unwrap();

    assert!(matches!(
        env.search(&r1),
        Err(FaceGroupError::NoQueryImage { .. })
    ));

    env.add_query("empty.jpg", &[]);
    assert!(matches!(
        env.search(&r1),
        Err(FaceGroupError::NoQueryFace { .. })
    ));
}

#[test]
fn recomputed_embedding_matches_original() {
    let env = Env::new();
    let r1 = room("r1");
    env.add_photo("a.jpg", &[A1]);
    env.cluster(&r1).unwrap();

    let centroids = cluster_centroids(&env.store, &r1, &JsonFileExtractor, A1.len()).unwrap();
    assert_eq!(centroids.len(), 1);
    assert_eq!(centroids[0].centroid, A1.to_vec());
}

#[test]
fn labels_are_deterministic() {
    let env = Env::new();
    for i in 0..40 {
        let angle = i as f32 * 0.05;
        env.add_photo(&format!("p{i:02}.jpg"), &[&[angle.cos(), angle.sin(), 0.1]]);
    }

    let (faces, _) = collect_faces(&env.intake, &JsonFileExtractor).unwrap();
    let serial = ClusterParams {
        workers: 1,
        ..Default::default()
    };
    let parallel = ClusterParams {
        workers: 6,
        ..Default::default()
    };
    let first = assign_labels(&faces, &serial).unwrap();
    assert_eq!(first, assign_labels(&faces, &serial).unwrap());
    assert_eq!(first, assign_labels(&faces, &parallel).unwrap());
}
