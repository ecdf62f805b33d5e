//! Cluster command.

use clap::Args;
use facegroup::{run_clustering, DirStore, Intake, RoomId};

use super::{get_config, print_json_line};
use crate::Cli;

/// Cluster every photo in the intake directory into a room.
///
/// Replaces the room's previous clusters and clears the intake directory.
#[derive(Args)]
pub struct ClusterCommand {
    /// Room identifier
    room: RoomId,

    /// Print the full assignment report as JSON instead of a summary line
    #[arg(long)]
    json: bool,
}

impl ClusterCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let layout = cfg.layout();
        let extractor = cfg.extractor()?;
        let store = DirStore::new(&layout.clusters_dir);
        let intake = Intake::new(&layout.intake_dir);

        let report = run_clustering(&intake, &extractor, &store, &self.room, &cfg.clustering)?;

        if self.json {
            return print_json_line(&report);
        }
        println!(
            "Clustering complete: {} faces in {} clusters ({} photos skipped). Check {}",
            report.faces(),
            report.clusters,
            report.skipped.len(),
            store.room_dir(&self.room).display()
        );
        Ok(())
    }
}
