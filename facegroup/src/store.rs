use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

use crate::error::{FaceGroupError, Result};
use crate::intake::file_name;
use crate::room::RoomId;

/// Per-room partition of photos into named clusters.
///
/// A room is either absent or holds zero or more clusters. Clusters are
/// only ever written through a [`RoomWriter`], which replaces the whole
/// room on commit. Listings are sorted by name.
pub trait ClusterStore: Send + Sync {
    /// Returns every room that has been written.
    fn rooms(&self) -> Result<Vec<RoomId>>;

    /// Reports whether the room has been written.
    fn contains_room(&self, room: &RoomId) -> Result<bool>;

    /// Returns the cluster names of a room. Fails with `RoomNotFound` if absent.
    fn clusters(&self, room: &RoomId) -> Result<Vec<String>>;

    /// Returns the photo filenames stored in a cluster.
    fn members(&self, room: &RoomId, cluster: &str) -> Result<Vec<String>>;

    /// Resolves a stored photo to a path the extractor can read.
    fn member_path(&self, room: &RoomId, cluster: &str, member: &str) -> Result<PathBuf>;

    /// Starts a full rewrite of the room. Nothing is visible until commit.
    fn rewrite_room<'a>(&'a self, room: &RoomId) -> Result<Box<dyn RoomWriter + 'a>>;
}

/// Builds the new contents of a room.
///
/// Dropping a writer without calling [`RoomWriter::commit`] discards its
/// work and leaves the previous clusters untouched.
pub trait RoomWriter {
    /// Creates an empty cluster if absent.
    fn create_cluster(&mut self, cluster: &str) -> Result<()>;

    /// Copies a photo into a cluster, creating the cluster if absent.
    /// The copy keeps the photo's filename; a later copy with the same name wins.
    fn add_member(&mut self, cluster: &str, photo: &Path) -> Result<()>;

    /// Replaces the room's previous clusters with the written ones.
    fn commit(self: Box<Self>) -> Result<()>;
}

fn check_component(cluster: &str) -> Result<()> {
    if cluster.is_empty()
        || cluster.starts_with('.')
        || cluster.contains(['/', '\\'])
        || cluster.chars().any(char::is_control)
    {
        return Err(FaceGroupError::InvalidParameter {
            name: "cluster",
            message: "must be a plain, non-hidden directory name",
        });
    }
    Ok(())
}

fn member_name(photo: &Path) -> Result<String> {
    let name = file_name(photo);
    if name.is_empty() {
        return Err(FaceGroupError::io(
            photo,
            io::Error::new(io::ErrorKind::InvalidInput, "photo path has no file name"),
        ));
    }
    Ok(name)
}

/// On-disk store: `<root>/<room>/<cluster>/<photo>`.
///
/// Writers stage into `<root>/.<room>.staging`. Commit moves the live room
/// aside to `<root>/.<room>.old`, renames staging into place, then deletes
/// the old tree. A crash while copying leaves the live room intact; a crash
/// between the two renames leaves the previous room under `.<room>.old`.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn room_dir(&self, room: &RoomId) -> PathBuf {
        self.root.join(room.as_str())
    }

    fn staging_dir(&self, room: &RoomId) -> PathBuf {
        self.root.join(format!(".{room}.staging"))
    }

    fn old_dir(&self, room: &RoomId) -> PathBuf {
        self.root.join(format!(".{room}.old"))
    }
}

/// Sorted, non-hidden entry names of `dir` matching `want_dir`.
fn list_entries(dir: &Path, want_dir: bool) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| FaceGroupError::io(dir, e))? {
        let entry = entry.map_err(|e| FaceGroupError::io(dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let file_type = entry
            .file_type()
            .map_err(|e| FaceGroupError::io(entry.path(), e))?;
        if (want_dir && file_type.is_dir()) || (!want_dir && file_type.is_file()) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

impl ClusterStore for DirStore {
    fn rooms(&self) -> Result<Vec<RoomId>> {
        let names = match list_entries(&self.root, true) {
            Ok(names) => names,
            Err(FaceGroupError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };
        // Directories that are not valid room ids were not written by us.
        Ok(names.into_iter().filter_map(|n| RoomId::new(n).ok()).collect())
    }

    fn contains_room(&self, room: &RoomId) -> Result<bool> {
        Ok(self.room_dir(room).is_dir())
    }

    fn clusters(&self, room: &RoomId) -> Result<Vec<String>> {
        let dir = self.room_dir(room);
        if !dir.is_dir() {
            return Err(FaceGroupError::RoomNotFound(room.to_string()));
        }
        list_entries(&dir, true)
    }

    fn members(&self, room: &RoomId, cluster: &str) -> Result<Vec<String>> {
        check_component(cluster)?;
        list_entries(&self.room_dir(room).join(cluster), false)
    }

    fn member_path(&self, room: &RoomId, cluster: &str, member: &str) -> Result<PathBuf> {
        check_component(cluster)?;
        Ok(self.room_dir(room).join(cluster).join(member))
    }

    fn rewrite_room<'a>(&'a self, room: &RoomId) -> Result<Box<dyn RoomWriter + 'a>> {
        let staging = self.staging_dir(room);
        if staging.exists() {
            warn!(path = %staging.display(), "removing leftover staging directory");
            fs::remove_dir_all(&staging).map_err(|e| FaceGroupError::io(&staging, e))?;
        }
        fs::create_dir_all(&staging).map_err(|e| FaceGroupError::io(&staging, e))?;
        Ok(Box::new(DirRoomWriter {
            store: self,
            room: room.clone(),
            staging,
            committed: false,
        }))
    }
}

struct DirRoomWriter<'a> {
    store: &'a DirStore,
    room: RoomId,
    staging: PathBuf,
    committed: bool,
}

impl RoomWriter for DirRoomWriter<'_> {
    fn create_cluster(&mut self, cluster: &str) -> Result<()> {
        check_component(cluster)?;
        let dir = self.staging.join(cluster);
        fs::create_dir_all(&dir).map_err(|e| FaceGroupError::io(&dir, e))
    }

    fn add_member(&mut self, cluster: &str, photo: &Path) -> Result<()> {
        self.create_cluster(cluster)?;
        let dst = self.staging.join(cluster).join(member_name(photo)?);
        fs::copy(photo, &dst).map_err(|e| FaceGroupError::io(photo, e))?;
        Ok(())
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        let live = self.store.room_dir(&self.room);
        let old = self.store.old_dir(&self.room);

        if old.exists() {
            fs::remove_dir_all(&old).map_err(|e| FaceGroupError::io(&old, e))?;
        }
        let had_live = live.exists();
        if had_live {
            fs::rename(&live, &old).map_err(|e| FaceGroupError::io(&live, e))?;
        }
        if let Err(e) = fs::rename(&self.staging, &live) {
            // Put the previous clusters back before reporting.
            if had_live {
                if let Err(restore) = fs::rename(&old, &live) {
                    warn!(
                        path = %old.display(),
                        error = %restore,
                        "failed to restore previous clusters"
                    );
                }
            }
            return Err(FaceGroupError::io(&self.staging, e));
        }
        self.committed = true;

        if old.exists() {
            if let Err(e) = fs::remove_dir_all(&old) {
                warn!(path = %old.display(), error = %e, "failed to remove previous clusters");
            }
        }
        Ok(())
    }
}

impl Drop for DirRoomWriter<'_> {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_dir_all(&self.staging);
        }
    }
}

type Clusters = BTreeMap<String, BTreeMap<String, PathBuf>>;

/// In-memory [`ClusterStore`].
///
/// Members resolve to the path of the photo that was added, so the source
/// files must outlive the store. Suitable for tests and embedding.
pub struct MemoryStore {
    rooms: Mutex<BTreeMap<RoomId, Clusters>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(BTreeMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn cluster_not_found(cluster: &str) -> FaceGroupError {
    FaceGroupError::io(
        cluster,
        io::Error::new(io::ErrorKind::NotFound, "cluster not found"),
    )
}

impl ClusterStore for MemoryStore {
    fn rooms(&self) -> Result<Vec<RoomId>> {
        let rooms = self.rooms.lock().unwrap();
        Ok(rooms.keys().cloned().collect())
    }

    fn contains_room(&self, room: &RoomId) -> Result<bool> {
        let rooms = self.rooms.lock().unwrap();
        Ok(rooms.contains_key(room))
    }

    fn clusters(&self, room: &RoomId) -> Result<Vec<String>> {
        let rooms = self.rooms.lock().unwrap();
        rooms
            .get(room)
            .map(|c| c.keys().cloned().collect())
            .ok_or_else(|| FaceGroupError::RoomNotFound(room.to_string()))
    }

    fn members(&self, room: &RoomId, cluster: &str) -> Result<Vec<String>> {
        let rooms = self.rooms.lock().unwrap();
        let clusters = rooms
            .get(room)
            .ok_or_else(|| FaceGroupError::RoomNotFound(room.to_string()))?;
        clusters
            .get(cluster)
            .map(|m| m.keys().cloned().collect())
            .ok_or_else(|| cluster_not_found(cluster))
    }

    fn member_path(&self, room: &RoomId, cluster: &str, member: &str) -> Result<PathBuf> {
        let rooms = self.rooms.lock().unwrap();
        rooms
            .get(room)
            .and_then(|c| c.get(cluster))
            .and_then(|m| m.get(member))
            .cloned()
            .ok_or_else(|| cluster_not_found(cluster))
    }

    fn rewrite_room<'a>(&'a self, room: &RoomId) -> Result<Box<dyn RoomWriter + 'a>> {
        Ok(Box::new(MemoryRoomWriter {
            store: self,
            room: room.clone(),
            staged: Clusters::new(),
        }))
    }
}

struct MemoryRoomWriter<'a> {
    store: &'a MemoryStore,
    room: RoomId,
    staged: Clusters,
}

impl RoomWriter for MemoryRoomWriter<'_> {
    fn create_cluster(&mut self, cluster: &str) -> Result<()> {
        check_component(cluster)?;
        self.staged.entry(cluster.to_string()).or_default();
        Ok(())
    }

    fn add_member(&mut self, cluster: &str, photo: &Path) -> Result<()> {
        check_component(cluster)?;
        let name = member_name(photo)?;
        self.staged
            .entry(cluster.to_string())
            .or_default()
            .insert(name, photo.to_path_buf());
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<()> {
        let this = *self;
        let mut rooms = this.store.rooms.lock().unwrap();
        rooms.insert(this.room, this.staged);
        Ok(())
    }
}
