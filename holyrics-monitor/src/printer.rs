//! Console consumer that prints published state

use chrono::Local;
use holyrics_state::{Feedback, FunctionKey, InstanceStatus, StateConsumer, StateSnapshot};
use parking_lot::Mutex;

/// Feedbacks the monitor reports when they flip
fn watched_feedbacks() -> Vec<Feedback> {
    vec![
        Feedback::AlertShown,
        Feedback::FunctionKeyActive(FunctionKey::F8),
        Feedback::FunctionKeyActive(FunctionKey::F9),
        Feedback::FunctionKeyActive(FunctionKey::F10),
        Feedback::CountdownRunning,
    ]
}

pub struct ChangePrinter {
    all_ticks: bool,
    json: bool,
    previous: Mutex<StateSnapshot>,
    feedbacks: Mutex<Vec<(Feedback, bool)>>,
}

impl ChangePrinter {
    pub fn new(all_ticks: bool, json: bool) -> Self {
        Self {
            all_ticks,
            json,
            previous: Mutex::new(StateSnapshot::default()),
            feedbacks: Mutex::new(
                watched_feedbacks()
                    .into_iter()
                    .map(|feedback| (feedback, false))
                    .collect(),
            ),
        }
    }

    fn render(&self, snapshot: &StateSnapshot, changed: &[&'static str]) -> Option<String> {
        if changed.is_empty() && !self.all_ticks {
            return None;
        }

        if self.json {
            return serde_json::to_string(snapshot).ok();
        }

        let lines: Vec<String> = snapshot
            .to_variables()
            .into_iter()
            .filter(|(name, _)| self.all_ticks || changed.contains(name))
            .map(|(name, value)| format!("  {:<13} = {}", name, value))
            .collect();

        Some(lines.join("\n"))
    }

    /// Re-evaluate the feedbacks `changed` can affect; returns the ones that flipped
    fn flipped_feedbacks(
        &self,
        snapshot: &StateSnapshot,
        changed: &[&str],
    ) -> Vec<(Feedback, bool)> {
        let mut feedbacks = self.feedbacks.lock();

        feedbacks
            .iter_mut()
            .filter(|(feedback, _)| feedback.affected_by(changed))
            .filter_map(|(feedback, active)| {
                let now = feedback.evaluate(snapshot);
                if now == *active {
                    return None;
                }
                *active = now;
                Some((feedback.clone(), now))
            })
            .collect()
    }
}

impl StateConsumer for ChangePrinter {
    fn publish_variables(&self, snapshot: &StateSnapshot) {
        let changed = {
            let mut previous = self.previous.lock();
            let changed = previous.changed_keys(snapshot);
            *previous = snapshot.clone();
            changed
        };

        if let Some(output) = self.render(snapshot, &changed) {
            println!("[{}]", Local::now().format("%H:%M:%S%.3f"));
            println!("{}", output);
        }
    }

    fn check_feedbacks(&self, snapshot: &StateSnapshot, changed: &[&'static str]) {
        for (feedback, active) in self.flipped_feedbacks(snapshot, changed) {
            let state = if active { "on" } else { "off" };
            println!("  feedback {:?} ({}) -> {}", feedback, feedback.source_key(), state);
        }
    }

    fn status_changed(&self, status: &InstanceStatus) {
        println!("status: {:?}", status);
    }
}
