//! Milestone announcements. Delivery is fire-and-forget: the streak engine
//! never waits on or inspects the result.

use std::cell::RefCell;
use std::rc::Rc;

use crate::models::Milestone;

pub trait Notifier {
    fn announce(&self, milestone: &Milestone);
}

/// Writes milestones to the log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn announce(&self, milestone: &Milestone) {
        log::info!(
            "{} streak reached {} days",
            milestone.streak_type,
            milestone.days
        );
    }
}

/// Keeps every milestone it is given; clones share the same list.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    seen: Rc<RefCell<Vec<Milestone>>>,
}

impl RecordingNotifier {
    pub fn seen(&self) -> Vec<Milestone> {
        self.seen.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn announce(&self, milestone: &Milestone) {
        self.seen.borrow_mut().push(*milestone);
    }
}
