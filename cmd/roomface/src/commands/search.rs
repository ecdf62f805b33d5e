//! Search command.

use clap::Args;
use facegroup::{extract_query, run_search, ClusterStore, DirStore, FaceGroupError, Intake, RoomId};

use super::{get_config, print_json_line};
use crate::Cli;

/// Match the photo in the search directory against a room's clusters.
///
/// Prints exactly one JSON line: `{"cluster": <name or null>, "images": [...]}`.
#[derive(Args)]
pub struct SearchCommand {
    /// Room identifier
    room: RoomId,
}

impl SearchCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let layout = cfg.layout();
        let store = DirStore::new(&layout.clusters_dir);

        // Unknown rooms fail before the query photo is touched.
        if !store.contains_room(&self.room)? {
            return Err(FaceGroupError::RoomNotFound(self.room.to_string()).into());
        }

        let extractor = cfg.extractor()?;
        let query = extract_query(&Intake::new(&layout.search_dir), &extractor)?;
        let result = run_search(&store, &self.room, &query, &extractor, &cfg.matching)?;
        print_json_line(&result)
    }
}
