//! Panel self-update: staged artifacts, marker files, and the detached
//! apply procedure.

pub mod applier;
pub mod stager;
pub mod state;

pub use applier::{generate_apply_script, PanelApplier};
pub use stager::PanelStager;
pub use state::{
    read_panel_current_version, read_valid_pending_update, PendingUpdate, VersionMarker,
};

#[cfg(test)]
mod tests;
