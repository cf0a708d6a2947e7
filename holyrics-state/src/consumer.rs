//! Downstream hooks notified after each snapshot swap

use crate::lifecycle::InstanceStatus;
use crate::snapshot::StateSnapshot;

/// Receives the published snapshot once per tick
///
/// `publish_variables` is always called before `check_feedbacks`, and both
/// run after the new snapshot is visible through
/// [`PollingEngine::snapshot`](crate::PollingEngine::snapshot).
pub trait StateConsumer: Send + Sync {
    /// Push the whole snapshot to host variables
    fn publish_variables(&self, snapshot: &StateSnapshot);

    /// Re-evaluate feedback predicates; `changed` lists the keys that differ
    /// from the previous tick and may be empty
    fn check_feedbacks(&self, _snapshot: &StateSnapshot, _changed: &[&'static str]) {}

    /// Connection status reported by the coordinator
    fn status_changed(&self, _status: &InstanceStatus) {}
}
