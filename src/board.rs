//! Client-side view of the tracker.
//!
//! A [`Board`] holds the tasks and buttons loaded at startup, times every
//! task with [`ActivityTimers`], and keeps a feed of recent done events that
//! is kept current by folding in [`DoneEventChange`]s.

use std::collections::VecDeque;
use std::time::Duration;

use tracing::{debug, info};

use crate::activity::{ActivityChange, ActivityTimers};
use crate::client::{ClientError, TrackerClient};
use crate::config::BoardConfig;
use crate::model::{DButton, DoneEvent, NewDoneEvent, RecordId, Task};
use crate::notifier::{ChangeKind, DoneEventChange};

pub struct Board {
    client: TrackerClient,
    tasks: Vec<Task>,
    buttons: Vec<DButton>,
    timers: ActivityTimers,
    feed: VecDeque<DoneEvent>,
    feed_limit: usize,
}

impl Board {
    /// Fetch tasks and buttons, then start a timer for every task.
    ///
    /// Tasks and buttons are loaded once; later server-side edits are not
    /// picked up.
    pub async fn load(client: TrackerClient, config: &BoardConfig) -> Result<Self, ClientError> {
        let (tasks, buttons) = tokio::try_join!(client.list_tasks(), client.list_dbuttons())?;

        let timers = ActivityTimers::new(Duration::from_millis(config.active_dwell_ms));
        let timed = timers.start_all(&tasks);
        info!(
            tasks = tasks.len(),
            buttons = buttons.len(),
            timed,
            "board loaded"
        );

        Ok(Self {
            client,
            tasks,
            buttons,
            timers,
            feed: VecDeque::new(),
            feed_limit: config.feed_limit.max(1),
        })
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn buttons(&self) -> &[DButton] {
        &self.buttons
    }

    pub fn task(&self, id: &RecordId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    /// Buttons bound to `task_id`.
    pub fn buttons_for<'a>(&'a self, task_id: &'a RecordId) -> impl Iterator<Item = &'a DButton> {
        self.buttons
            .iter()
            .filter(move |b| b.task_id.as_ref() == Some(task_id))
    }

    pub fn is_active(&self, task_id: &RecordId) -> bool {
        self.timers.is_active(task_id)
    }

    pub fn timers(&self) -> &ActivityTimers {
        &self.timers
    }

    /// Subscribe to task activity flips.
    pub fn activity_changes(&self) -> tokio::sync::broadcast::Receiver<ActivityChange> {
        self.timers.subscribe()
    }

    /// Recent done events, newest first.
    pub fn feed(&self) -> impl Iterator<Item = &DoneEvent> {
        self.feed.iter()
    }

    /// Mark `task_id` done, optionally through `button_id`.
    pub async fn press(
        &self,
        task_id: &RecordId,
        button_id: Option<&RecordId>,
    ) -> Result<DoneEvent, ClientError> {
        let body = match button_id {
            Some(button) => NewDoneEvent::via_button(task_id.clone(), button.clone()),
            None => NewDoneEvent::for_task(task_id.clone()),
        };
        let event = self.client.create_done_event(&body).await?;
        debug!(task_id = %event.task_id, id = %event.id, "task marked done");
        Ok(event)
    }

    /// Fold a change from the server into the feed.
    pub fn apply_change(&mut self, change: DoneEventChange) {
        match change.kind {
            ChangeKind::Save => {
                self.feed.retain(|e| e.id != change.doc.id);
                self.feed.push_front(change.doc);
                self.feed.truncate(self.feed_limit);
            }
            ChangeKind::Remove => self.feed.retain(|e| e.id != change.doc.id),
        }
    }

    /// Stop every timer. The board stays readable.
    pub fn teardown(&self) {
        self.timers.stop_all();
        info!("board torn down");
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    fn board(feed_limit: usize) -> Board {
        Board {
            client: TrackerClient::new("http://127.0.0.1:1"),
            tasks: Vec::new(),
            buttons: Vec::new(),
            timers: ActivityTimers::default(),
            feed: VecDeque::new(),
            feed_limit,
        }
    }

    fn event(name: &str) -> DoneEvent {
        DoneEvent {
            id: RecordId::generate(),
            task_id: RecordId::generate(),
            task_name: name.to_owned(),
            d_button_id: None,
            time: chrono::Utc::now(),
        }
    }

    fn change(kind: ChangeKind, doc: &DoneEvent) -> DoneEventChange {
        DoneEventChange {
            kind,
            doc: doc.clone(),
        }
    }

    #[test]
    fn saves_prepend_and_removes_delete() {
        let mut board = board(10);
        let first = event("first");
        let second = event("second");
        board.apply_change(change(ChangeKind::Save, &first));
        board.apply_change(change(ChangeKind::Save, &second));
        let names: Vec<&str> = board.feed().map(|e| e.task_name.as_str()).collect();
        assert_eq!(names, ["second", "first"]);

        board.apply_change(change(ChangeKind::Remove, &first));
        assert_eq!(board.feed().count(), 1);
    }

    #[test]
    fn repeated_save_does_not_duplicate() {
        let mut board = board(10);
        let e = event("again");
        board.apply_change(change(ChangeKind::Save, &e));
        board.apply_change(change(ChangeKind::Save, &e));
        assert_eq!(board.feed().count(), 1);
    }

    #[test]
    fn feed_is_bounded() {
        let mut board = board(2);
        for i in 0..5 {
            board.apply_change(change(ChangeKind::Save, &event(&format!("e{i}"))));
        }
        let names: Vec<&str> = board.feed().map(|e| e.task_name.as_str()).collect();
        assert_eq!(names, ["e4", "e3"]);
    }
}
