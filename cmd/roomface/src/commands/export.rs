//! Export command.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Args;
use facegroup::{ClusterStore, DirStore, RoomId};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::get_config;
use crate::Cli;

/// Package one cluster's photos into a zip archive.
#[derive(Args)]
pub struct ExportCommand {
    /// Room identifier
    room: RoomId,

    /// Cluster name, e.g. cluster_0
    cluster: String,

    /// Output file (default: <cluster>.zip in the current directory)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

impl ExportCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let store = DirStore::new(cfg.layout().clusters_dir);
        let out = self
            .out
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.zip", self.cluster)));

        let count = write_cluster_zip(&store, &self.room, &self.cluster, &out)?;
        println!("Exported {count} photos to {}", out.display());
        Ok(())
    }
}

/// Writes every member of `room/cluster` into a flat zip at `out`.
///
/// Nothing is created when the cluster does not exist. A partially written
/// archive is removed on failure.
pub(crate) fn write_cluster_zip(
    store: &dyn ClusterStore,
    room: &RoomId,
    cluster: &str,
    out: &Path,
) -> anyhow::Result<usize> {
    if !store.clusters(room)?.iter().any(|c| c == cluster) {
        anyhow::bail!("cluster not found: {room}/{cluster}");
    }
    let members = store.members(room, cluster)?;

    let result = write_members(store, room, cluster, &members, out);
    if result.is_err() {
        let _ = fs::remove_file(out);
    }
    result?;

    tracing::info!(room = %room, cluster, photos = members.len(), out = %out.display(), "cluster exported");
    Ok(members.len())
}

fn write_members(
    store: &dyn ClusterStore,
    room: &RoomId,
    cluster: &str,
    members: &[String],
    out: &Path,
) -> anyhow::Result<()> {
    let file = File::create(out).with_context(|| format!("failed to create {}", out.display()))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for member in members {
        let path = store.member_path(room, cluster, member)?;
        let data = fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
        zip.start_file(member.as_str(), options)?;
        zip.write_all(&data)?;
    }
    zip.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use facegroup::{MemoryStore, RoomWriter};

    use super::*;

    fn room() -> RoomId {
        RoomId::new("r1").unwrap()
    }

    #[test]
    fn zip_holds_every_member() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        fs::write(src.path().join("a.jpg"), "AAA").unwrap();
        fs::write(src.path().join("b.jpg"), "BB").unwrap();

        let store = MemoryStore::new();
        let mut w = store.rewrite_room(&room()).unwrap();
        w.add_member("cluster_0", &src.path().join("a.jpg")).unwrap();
        w.add_member("cluster_0", &src.path().join("b.jpg")).unwrap();
        w.add_member("cluster_1", &src.path().join("b.jpg")).unwrap();
        w.commit().unwrap();

        let zip_path = out.path().join("cluster_0.zip");
        assert_eq!(write_cluster_zip(&store, &room(), "cluster_0", &zip_path).unwrap(), 2);

        let mut archive = zip::ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);
        let mut body = String::new();
        archive.by_name("a.jpg").unwrap().read_to_string(&mut body).unwrap();
        assert_eq!(body, "AAA");
    }

    #[test]
    fn unknown_cluster_writes_nothing() {
        let out = tempfile::tempdir().unwrap();
        let store = MemoryStore::new();
        store.rewrite_room(&room()).unwrap().commit().unwrap();

        let zip_path = out.path().join("x.zip");
        let err = write_cluster_zip(&store, &room(), "cluster_7", &zip_path).unwrap_err();
        assert!(err.to_string().contains("cluster not found"), "{err}");
        assert!(!zip_path.exists());
    }

    #[test]
    fn unknown_room_fails() {
        let out = tempfile::tempdir().unwrap();
        let store = MemoryStore::new();
        let zip_path = out.path().join("x.zip");
        assert!(write_cluster_zip(&store, &room(), "cluster_0", &zip_path).is_err());
        assert!(!zip_path.exists());
    }
}
