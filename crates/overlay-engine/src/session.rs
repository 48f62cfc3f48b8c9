//! One overlay view's state, and the task that drives it.
//!
//! [`OverlaySession`] holds everything a view owns: the last good refresh, the
//! queue with its seen set, and the display controller. It can be stepped by
//! hand with explicit instants, or moved onto a task with
//! [`OverlaySession::spawn`], where a single `select!` loop serializes feed
//! documents, renderer reports and timer deadlines.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use alert_core::display::{expires_in, format_expires_time, state_line};
use alert_core::palette::light_color;
use alert_core::{
    apply_filters, group_alerts, Category, FeedDocument, GroupedAlerts, OverlayParams,
};
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::EngineError;
use crate::presenter::{DisplayFrame, FrameAlert, Presenter, ScrollMeasurement};
use crate::queue::{PresentationQueue, QueueManager};
use crate::timing::{DisplayController, DisplayEvent};

/// Commands accepted by a running session.
#[derive(Debug)]
pub enum SessionCommand {
    Measure(ScrollMeasurement),
    SetParams(OverlayParams),
    Shutdown,
}

/// Overlay state for one view.
pub struct OverlaySession {
    config: SessionConfig,
    params: OverlayParams,
    queue: QueueManager,
    controller: DisplayController,
    /// Last successful refresh, before filtering.
    latest: Option<GroupedAlerts>,
    counts: BTreeMap<Category, usize>,
    signal_seq: u64,
    presenter: Option<Box<dyn Presenter>>,
    /// Alert key and area text last handed to the presenter.
    rendered: Option<(String, String)>,
    pending: VecDeque<ScrollMeasurement>,
}

impl OverlaySession {
    pub fn new(config: SessionConfig, params: OverlayParams) -> Self {
        let controller = DisplayController::new(config.timing.clone());
        Self {
            config,
            params,
            queue: QueueManager::new(),
            controller,
            latest: None,
            counts: Category::ALL.into_iter().map(|c| (c, 0)).collect(),
            signal_seq: 0,
            presenter: None,
            rendered: None,
            pending: VecDeque::new(),
        }
    }

    /// Render in-process; measurements feed back on the next step.
    pub fn with_presenter(mut self, presenter: impl Presenter + 'static) -> Self {
        self.presenter = Some(Box::new(presenter));
        self
    }

    pub fn params(&self) -> &OverlayParams {
        &self.params
    }

    pub fn queue(&self) -> &PresentationQueue {
        self.queue.queue()
    }

    pub fn controller(&self) -> &DisplayController {
        &self.controller
    }

    pub fn signal_seq(&self) -> u64 {
        self.signal_seq
    }

    /// Per-category counts from the last refresh, before filtering.
    pub fn counts(&self) -> &BTreeMap<Category, usize> {
        &self.counts
    }

    /// Replace the alert set with a freshly fetched document.
    pub fn ingest(&mut self, doc: &FeedDocument, now: Instant) -> Vec<DisplayEvent> {
        let grouped = group_alerts(doc);
        self.counts = grouped.counts();
        self.latest = Some(grouped);
        self.refresh(now)
    }

    /// Swap the filter specification. The index and all timers start over.
    pub fn set_params(&mut self, params: OverlayParams, now: Instant) -> Vec<DisplayEvent> {
        info!(filter = ?params.filter, passive = params.passive, "Overlay parameters changed");
        self.params = params;
        self.controller.reset();
        self.rendered = None;
        self.pending.clear();
        self.refresh(now)
    }

    fn refresh(&mut self, now: Instant) -> Vec<DisplayEvent> {
        let Some(latest) = self.latest.as_ref() else {
            return Vec::new();
        };
        let filtered = apply_filters(latest, &self.params.filter);
        let current = self.controller.current_key().cloned();
        let index = self.controller.index();
        let queue = self
            .queue
            .rebuild(&filtered, &self.params.palette, current.as_ref(), index);
        debug!(count = queue.len(), "Presentation queue rebuilt");

        let events = self.controller.sync_queue(self.queue.queue(), now);
        self.handle_events(&events);
        events
    }

    /// Apply a renderer's overflow report.
    pub fn measure(&mut self, measurement: ScrollMeasurement) -> bool {
        let len = self.queue.queue().len();
        self.controller.apply_measurement(measurement, len)
    }

    /// Fire every timer due at `now`.
    pub fn fire_due(&mut self, now: Instant) -> Vec<DisplayEvent> {
        let events = self.controller.fire_due(self.queue.queue(), now);
        self.handle_events(&events);
        events
    }

    fn handle_events(&mut self, events: &[DisplayEvent]) {
        for event in events {
            match event {
                DisplayEvent::MarkSeen { key } => {
                    self.queue.mark_seen(key);
                }
                DisplayEvent::NewAlert { key } => {
                    self.signal_seq += 1;
                    info!(key = %key, sound = !self.params.passive, "New alert");
                }
                DisplayEvent::Cleared => {
                    self.rendered = None;
                    info!("No active alerts");
                }
                DisplayEvent::Shown { .. } | DisplayEvent::TransitionStarted { .. } => {}
            }
        }
    }

    /// When the session next needs to run: a timer deadline or a scroll frame.
    pub fn next_wakeup(&self, now: Instant) -> Option<Instant> {
        let frame = self.controller.next_frame_at(now, self.config.frame_interval);
        match (self.controller.next_deadline(), frame) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Snapshot for the renderer.
    pub fn frame(&self, now: Instant, wall: DateTime<Utc>) -> DisplayFrame {
        let durations = self.controller.durations();
        let alert = self.controller.current_entry().map(|entry| {
            let a = &entry.alert;
            FrameAlert {
                key: entry.key.to_string(),
                category: a.category.key().to_string(),
                label: a.label.clone(),
                light_color: light_color(&a.color),
                color: a.color.clone(),
                headline: a.headline.clone(),
                area: a.area.clone(),
                area_text: self.controller.current_text().unwrap_or_default().to_string(),
                states: state_line(a),
                expires_in: a.expires.map(|e| expires_in(e, wall)),
                expires_at: a.expires.map(|e| format_expires_time(e, &a.headline)),
                ugc: a.ugc().to_vec(),
                is_new: entry.is_new,
            }
        });

        DisplayFrame {
            phase: self.controller.phase(),
            is_transitioning: self.controller.is_transitioning(),
            alert,
            index: self.controller.index(),
            queue_len: self.queue.queue().len(),
            scroll_offset: self.controller.scroll_offset(now),
            scroll_duration_ms: durations.scroll.as_millis() as u64,
            display_duration_ms: durations.display.as_millis() as u64,
            signal_seq: self.signal_seq,
            play_sound: !self.params.passive,
            counts: self
                .counts
                .iter()
                .map(|(c, n)| (c.key().to_string(), *n))
                .collect(),
            version: crate::version().to_string(),
        }
    }

    /// Hand the frame to the presenter when its alert or text changed.
    fn present(&mut self, frame: &DisplayFrame) {
        let Some(presenter) = self.presenter.as_mut() else {
            return;
        };
        let Some(alert) = frame.alert.as_ref() else {
            return;
        };
        let marker = (alert.key.clone(), alert.area_text.clone());
        if self.rendered.as_ref() == Some(&marker) {
            return;
        }
        self.rendered = Some(marker);
        if let Some(measurement) = presenter.render(frame) {
            self.pending.push_back(measurement);
        }
    }

    /// Cancel every deadline; later steps change nothing.
    pub fn teardown(&mut self) {
        self.controller.teardown();
        self.pending.clear();
        self.presenter = None;
    }

    /// Run on a task, consuming documents from `feed`.
    pub fn spawn(self, feed: mpsc::Receiver<FeedDocument>) -> (SessionHandle, JoinHandle<()>) {
        let (commands_tx, commands_rx) = mpsc::channel(32);
        let (frames_tx, frames_rx) = watch::channel(DisplayFrame::default());
        let task = tokio::spawn(self.run(feed, commands_rx, frames_tx));
        let handle = SessionHandle {
            commands: commands_tx,
            frames: frames_rx,
        };
        (handle, task)
    }

    async fn run(
        mut self,
        mut feed: mpsc::Receiver<FeedDocument>,
        mut commands: mpsc::Receiver<SessionCommand>,
        frames: watch::Sender<DisplayFrame>,
    ) {
        info!("Overlay session started");
        let mut feed_open = true;

        loop {
            let now = Instant::now();
            while let Some(measurement) = self.pending.pop_front() {
                self.measure(measurement);
            }
            self.fire_due(now);

            let frame = self.frame(now, Utc::now());
            self.present(&frame);
            frames.send_replace(frame);
            if !self.pending.is_empty() {
                continue;
            }

            let wake = self.next_wakeup(now);
            tokio::select! {
                doc = feed.recv(), if feed_open => match doc {
                    Some(doc) => {
                        self.ingest(&doc, Instant::now());
                    }
                    None => {
                        warn!("Feed channel closed, keeping last alerts");
                        feed_open = false;
                    }
                },
                command = commands.recv() => match command {
                    Some(SessionCommand::Measure(m)) => {
                        self.measure(m);
                    }
                    Some(SessionCommand::SetParams(params)) => {
                        self.set_params(params, Instant::now());
                    }
                    Some(SessionCommand::Shutdown) | None => break,
                },
                _ = sleep_until_opt(wake) => {}
            }
        }

        self.teardown();
        frames.send_replace(self.frame(Instant::now(), Utc::now()));
        info!("Overlay session stopped");
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Cloneable handle to a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    frames: watch::Receiver<DisplayFrame>,
}

impl SessionHandle {
    /// Latest published frame.
    pub fn frame(&self) -> DisplayFrame {
        self.frames.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DisplayFrame> {
        self.frames.clone()
    }

    pub async fn measure(&self, measurement: ScrollMeasurement) -> Result<(), EngineError> {
        self.send(SessionCommand::Measure(measurement)).await
    }

    pub async fn set_params(&self, params: OverlayParams) -> Result<(), EngineError> {
        self.send(SessionCommand::SetParams(params)).await
    }

    pub async fn shutdown(&self) -> Result<(), EngineError> {
        self.send(SessionCommand::Shutdown).await
    }

    /// Wait for the next published frame that satisfies `pred`.
    pub async fn wait_for<F>(&self, timeout: Duration, pred: F) -> Result<DisplayFrame, EngineError>
    where
        F: FnMut(&DisplayFrame) -> bool,
    {
        let mut rx = self.frames.clone();
        let result = match tokio::time::timeout(timeout, rx.wait_for(pred)).await {
            Ok(Ok(frame)) => Ok(frame.clone()),
            Ok(Err(_)) => Err(EngineError::SessionClosed),
            Err(_) => Err(EngineError::Timeout),
        };
        result
    }

    async fn send(&self, command: SessionCommand) -> Result<(), EngineError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| EngineError::SessionClosed)
    }
}
