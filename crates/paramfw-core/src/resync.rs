//! Sweeps over composed subsystems for pending resynchronization.

use crate::error::InfoLog;
use crate::subsystem::{Subsystem, SyncerSet};

/// Collect the syncers of every subsystem needing a resync, consuming the flags.
///
/// Returns the number of subsystems that needed a resync.
pub fn collect_needing_resync(
    subsystems: &mut [Box<dyn Subsystem>],
    syncer_set: &mut SyncerSet,
    infos: &mut InfoLog,
) -> usize {
    let mut count = 0;

    for subsystem in subsystems.iter_mut() {
        if subsystem.need_resync(true) {
            infos.push(format!("Resynchronizing subsystem: {}", subsystem.name()));
            subsystem.fill_syncer_set(syncer_set);
            count += 1;
        }
    }

    if count > 0 {
        tracing::debug!(count, syncers = syncer_set.len(), "Subsystems need resync");
    }
    count
}

/// Consume every subsystem's resync flag without collecting anything.
pub fn clear_all_resync_flags(subsystems: &mut [Box<dyn Subsystem>]) {
    for subsystem in subsystems.iter_mut() {
        subsystem.need_resync(true);
    }
}
