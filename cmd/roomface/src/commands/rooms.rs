//! Room listing commands.

use clap::Args;
use facegroup::{ClusterStore, DirStore, RoomId};
use serde::Serialize;

use super::{get_config, print_json_line};
use crate::Cli;

/// List rooms that have a cluster store, one per line.
#[derive(Args)]
pub struct RoomsCommand {}

impl RoomsCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let store = DirStore::new(cfg.layout().clusters_dir);
        for room in store.rooms()? {
            println!("{room}");
        }
        Ok(())
    }
}

/// Print a room's clusters and their photos as one JSON line.
#[derive(Args)]
pub struct ShowCommand {
    /// Room identifier
    room: RoomId,
}

#[derive(Debug, Serialize)]
struct RoomView {
    room: String,
    clusters: Vec<ClusterView>,
}

#[derive(Debug, Serialize)]
struct ClusterView {
    name: String,
    images: Vec<String>,
}

impl ShowCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let store = DirStore::new(cfg.layout().clusters_dir);
        print_json_line(&room_view(&store, &self.room)?)
    }
}

fn room_view(store: &dyn ClusterStore, room: &RoomId) -> anyhow::Result<RoomView> {
    let mut clusters = Vec::new();
    for name in store.clusters(room)? {
        let images = store.members(room, &name)?;
        clusters.push(ClusterView { name, images });
    }
    Ok(RoomView {
        room: room.to_string(),
        clusters,
    })
}
