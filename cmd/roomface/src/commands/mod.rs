//! CLI commands module.

mod cluster;
mod export;
mod rooms;
mod search;
mod util;

pub use cluster::ClusterCommand;
pub use export::ExportCommand;
pub use rooms::{RoomsCommand, ShowCommand};
pub use search::SearchCommand;

pub(crate) use util::*;
