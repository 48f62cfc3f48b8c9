//! Display timing: which alert is on screen, for how long, and how far its
//! area text has scrolled.
//!
//! [`DisplayController`] is a plain state machine. Every method takes `now`;
//! the driver asks [`DisplayController::next_deadline`] when to call back and
//! then calls [`DisplayController::fire_due`]. The controller owns no timers of
//! its own, so re-arming replaces a deadline instead of stacking a second one.

use std::collections::HashSet;
use std::time::Duration;

use alert_core::display::area_bar_text;
use alert_core::AlertKey;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::config::TimingConfig;
use crate::presenter::ScrollMeasurement;
use crate::queue::{PresentationQueue, QueueEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayPhase {
    /// Queue is empty.
    Idle,
    Showing,
    /// Exit/enter animation before the index advances.
    Transitioning,
}

/// Display and scroll durations for the current entry.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Durations {
    pub display: Duration,
    pub scroll: Duration,
    pub scroll_distance: f64,
}

impl Durations {
    /// Overflowing text displays for its scroll time plus a buffer on each
    /// side; everything else gets the static duration.
    pub fn compute(measurement: Option<&ScrollMeasurement>, config: &TimingConfig) -> Self {
        match measurement {
            Some(m) if m.needs_scroll && m.scroll_distance > 0.0 => {
                let scroll_ms = (m.scroll_distance / config.reading_speed * 1000.0).round() as u64;
                let scroll = Duration::from_millis(scroll_ms);
                Self {
                    display: scroll + config.buffer * 2,
                    scroll,
                    scroll_distance: m.scroll_distance,
                }
            }
            _ => Self {
                display: config.static_display,
                scroll: Duration::ZERO,
                scroll_distance: 0.0,
            },
        }
    }
}

/// State changes the driver must act on.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayEvent {
    Shown { key: AlertKey, index: usize },
    /// One-shot signal for a newly observed alert.
    NewAlert { key: AlertKey },
    TransitionStarted { key: AlertKey },
    /// A new entry has been on screen for a full window.
    MarkSeen { key: AlertKey },
    Cleared,
}

#[derive(Debug, Clone)]
struct Current {
    entry: QueueEntry,
    key_str: String,
    content: String,
    /// Start of the display window; moves when the area text changes.
    started_at: Instant,
    measurement: Option<ScrollMeasurement>,
    durations: Durations,
    advance_at: Option<Instant>,
    seen_at: Option<Instant>,
    transition_end_at: Option<Instant>,
}

impl Current {
    fn new(entry: &QueueEntry, durations: Durations, now: Instant) -> Self {
        Self {
            key_str: entry.key.to_string(),
            content: area_bar_text(&entry.alert),
            entry: entry.clone(),
            started_at: now,
            measurement: None,
            durations,
            advance_at: None,
            seen_at: None,
            transition_end_at: None,
        }
    }

    /// Re-arm the advance and seen deadlines from the current durations.
    fn arm(&mut self, queue_len: usize) {
        let deadline = self.started_at + self.durations.display;
        self.advance_at = (queue_len > 1).then_some(deadline);
        self.seen_at = self.entry.is_new.then_some(deadline);
    }
}

#[derive(Debug, Clone, Copy)]
enum Timer {
    Seen,
    Advance,
    TransitionEnd,
}

/// Drives the current index through Idle, Showing and Transitioning.
#[derive(Debug)]
pub struct DisplayController {
    config: TimingConfig,
    phase: DisplayPhase,
    index: usize,
    current: Option<Current>,
    signaled: HashSet<AlertKey>,
    torn_down: bool,
}

impl DisplayController {
    pub fn new(config: TimingConfig) -> Self {
        Self {
            config,
            phase: DisplayPhase::Idle,
            index: 0,
            current: None,
            signaled: HashSet::new(),
            torn_down: false,
        }
    }

    pub fn config(&self) -> &TimingConfig {
        &self.config
    }

    pub fn phase(&self) -> DisplayPhase {
        self.phase
    }

    pub fn is_transitioning(&self) -> bool {
        self.phase == DisplayPhase::Transitioning
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current_key(&self) -> Option<&AlertKey> {
        self.current.as_ref().map(|c| &c.entry.key)
    }

    /// The entry on screen. During a transition this may no longer be queued.
    pub fn current_entry(&self) -> Option<&QueueEntry> {
        self.current.as_ref().map(|c| &c.entry)
    }

    pub fn current_text(&self) -> Option<&str> {
        self.current.as_ref().map(|c| c.content.as_str())
    }

    pub fn durations(&self) -> Durations {
        self.current.as_ref().map(|c| c.durations).unwrap_or_default()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Reconcile with a rebuilt queue.
    ///
    /// The current alert keeps its place when its key survives the rebuild. A
    /// transition in progress always runs to completion; the new queue is only
    /// consulted on the next advance.
    pub fn sync_queue(&mut self, queue: &PresentationQueue, now: Instant) -> Vec<DisplayEvent> {
        let mut events = Vec::new();
        if self.torn_down {
            return events;
        }

        if queue.is_empty() {
            if self.phase != DisplayPhase::Idle {
                debug!("Queue emptied, going idle");
                self.clear();
                events.push(DisplayEvent::Cleared);
            }
            return events;
        }

        let found = self
            .current
            .as_ref()
            .and_then(|c| queue.position(&c.entry.key));

        match (self.phase, found) {
            (DisplayPhase::Transitioning, found) => {
                if let Some(i) = found {
                    self.index = i;
                }
            }
            (DisplayPhase::Showing, Some(i)) => {
                self.index = i;
                if let Some(entry) = queue.get(i) {
                    self.refresh_current(entry, queue.len(), now);
                }
            }
            _ => self.show(0, queue, now, &mut events),
        }
        events
    }

    fn refresh_current(&mut self, entry: &QueueEntry, queue_len: usize, now: Instant) {
        let Some(cur) = self.current.as_mut() else {
            return;
        };

        let content = area_bar_text(&entry.alert);
        if content != cur.content {
            debug!(key = %entry.key, "Area text changed, restarting scroll");
            cur.content = content;
            cur.started_at = now;
            cur.measurement = None;
            cur.durations = Durations::compute(None, &self.config);
        }

        let still_new = cur.entry.is_new && entry.is_new;
        cur.entry = entry.clone();
        cur.entry.is_new = still_new;
        cur.arm(queue_len);
    }

    fn show(
        &mut self,
        index: usize,
        queue: &PresentationQueue,
        now: Instant,
        events: &mut Vec<DisplayEvent>,
    ) {
        let Some(entry) = queue.get(index) else {
            self.clear();
            events.push(DisplayEvent::Cleared);
            return;
        };

        let mut cur = Current::new(entry, Durations::compute(None, &self.config), now);
        cur.arm(queue.len());
        self.index = index;
        self.phase = DisplayPhase::Showing;

        debug!(index, key = %entry.key, is_new = entry.is_new, "Showing alert");
        events.push(DisplayEvent::Shown {
            key: entry.key.clone(),
            index,
        });
        if entry.is_new && self.signaled.insert(entry.key.clone()) {
            events.push(DisplayEvent::NewAlert {
                key: entry.key.clone(),
            });
        }
        self.current = Some(cur);
    }

    /// Apply a measurement reported by the renderer.
    ///
    /// Reports for an alert that is no longer current, and repeats of the last
    /// report, change nothing. Returns whether the durations were updated.
    pub fn apply_measurement(&mut self, measurement: ScrollMeasurement, queue_len: usize) -> bool {
        if self.torn_down {
            return false;
        }
        let Some(cur) = self.current.as_mut() else {
            return false;
        };
        if measurement.key != cur.key_str {
            debug!(key = %measurement.key, "Ignoring measurement for stale alert");
            return false;
        }
        if cur.measurement.as_ref() == Some(&measurement) {
            return false;
        }

        cur.durations = Durations::compute(Some(&measurement), &self.config);
        cur.measurement = Some(measurement);
        if self.phase == DisplayPhase::Showing {
            cur.arm(queue_len);
        }
        trace!(
            display_ms = cur.durations.display.as_millis() as u64,
            scroll_ms = cur.durations.scroll.as_millis() as u64,
            "Applied scroll measurement"
        );
        true
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        let cur = self.current.as_ref()?;
        [cur.seen_at, cur.advance_at, cur.transition_end_at]
            .into_iter()
            .flatten()
            .min()
    }

    fn due_timer(&self, now: Instant) -> Option<Timer> {
        let cur = self.current.as_ref()?;
        [
            (cur.seen_at, Timer::Seen),
            (cur.advance_at, Timer::Advance),
            (cur.transition_end_at, Timer::TransitionEnd),
        ]
        .into_iter()
        .filter_map(|(at, timer)| at.filter(|at| *at <= now).map(|at| (at, timer)))
        .min_by_key(|(at, _)| *at)
        .map(|(_, timer)| timer)
    }

    /// Fire every deadline at or before `now`, in deadline order.
    pub fn fire_due(&mut self, queue: &PresentationQueue, now: Instant) -> Vec<DisplayEvent> {
        let mut events = Vec::new();
        if self.torn_down {
            return events;
        }

        while let Some(timer) = self.due_timer(now) {
            let Some(cur) = self.current.as_mut() else {
                break;
            };
            match timer {
                Timer::Seen => {
                    cur.seen_at = None;
                    cur.entry.is_new = false;
                    events.push(DisplayEvent::MarkSeen {
                        key: cur.entry.key.clone(),
                    });
                }
                Timer::Advance => {
                    cur.advance_at = None;
                    cur.transition_end_at = Some(now + self.config.transition);
                    self.phase = DisplayPhase::Transitioning;
                    trace!(key = %cur.entry.key, "Transition started");
                    events.push(DisplayEvent::TransitionStarted {
                        key: cur.entry.key.clone(),
                    });
                }
                Timer::TransitionEnd => {
                    cur.transition_end_at = None;
                    if queue.is_empty() {
                        self.clear();
                        events.push(DisplayEvent::Cleared);
                        break;
                    }
                    let next = queue
                        .position(&cur.entry.key)
                        .map(|i| (i + 1) % queue.len())
                        .unwrap_or(0);
                    self.show(next, queue, now, &mut events);
                }
            }
        }
        events
    }

    /// Scroll position of the area text, in pixels.
    ///
    /// Holds at 0 for the buffer time, then moves linearly to the full
    /// distance over the scroll duration.
    pub fn scroll_offset(&self, now: Instant) -> f64 {
        let Some(cur) = self.current.as_ref() else {
            return 0.0;
        };
        let d = cur.durations;
        if d.scroll_distance <= 0.0 || d.scroll.is_zero() {
            return 0.0;
        }
        let start = cur.started_at + self.config.buffer;
        if now <= start {
            return 0.0;
        }
        let progress = (now - start).as_secs_f64() / d.scroll.as_secs_f64();
        progress.min(1.0) * d.scroll_distance
    }

    /// When the next animation frame is needed, if the text is scrolling.
    pub fn next_frame_at(&self, now: Instant, frame_interval: Duration) -> Option<Instant> {
        if self.phase != DisplayPhase::Showing {
            return None;
        }
        let cur = self.current.as_ref()?;
        if cur.durations.scroll_distance <= 0.0 {
            return None;
        }
        let start = cur.started_at + self.config.buffer;
        let end = start + cur.durations.scroll;
        if now < start {
            Some(start)
        } else if now < end {
            Some((now + frame_interval).min(end))
        } else {
            None
        }
    }

    fn clear(&mut self) {
        self.phase = DisplayPhase::Idle;
        self.index = 0;
        self.current = None;
    }

    /// Drop the current alert and every pending deadline.
    pub fn reset(&mut self) {
        debug!("Resetting display timers");
        self.clear();
    }

    /// Stop for good; later calls change nothing.
    pub fn teardown(&mut self) {
        self.clear();
        self.signaled.clear();
        self.torn_down = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::QueueManager;
    use alert_core::{
        AlertParameters, Category, ClassifiedAlert, Escalation, Geocode, GroupedAlerts, Palette,
    };

    fn alert(headline: &str, area: &str) -> ClassifiedAlert {
        ClassifiedAlert {
            category: Category::Svr,
            label: Category::Svr.label().to_string(),
            escalation: Escalation::default(),
            event: String::new(),
            headline: headline.to_string(),
            area: area.to_string(),
            description: String::new(),
            expires: None,
            geocode: Geocode::default(),
            parameters: AlertParameters::default(),
            color: String::new(),
        }
    }

    fn grouped(headlines: &[&str]) -> GroupedAlerts {
        headlines.iter().map(|h| alert(h, "Smith, TX")).collect()
    }

    fn seeded(headlines: &[&str]) -> QueueManager {
        let mut manager = QueueManager::new();
        manager.rebuild(&grouped(headlines), &Palette::new(), None, 0);
        manager
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn measurement_for(controller: &DisplayController, distance: f64) -> ScrollMeasurement {
        ScrollMeasurement {
            key: controller.current_key().unwrap().to_string(),
            scroll_distance: distance,
            needs_scroll: distance > 0.0,
        }
    }

    #[test]
    fn test_scroll_durations() {
        let config = TimingConfig::default();
        let m = ScrollMeasurement {
            key: String::new(),
            scroll_distance: 800.0,
            needs_scroll: true,
        };
        let d = Durations::compute(Some(&m), &config);
        assert_eq!(d.scroll, ms(10000));
        assert_eq!(d.display, ms(14000));

        let fits = ScrollMeasurement {
            needs_scroll: false,
            ..m
        };
        assert_eq!(Durations::compute(Some(&fits), &config).display, ms(10000));
        assert_eq!(Durations::compute(None, &config).scroll, Duration::ZERO);
    }

    #[test]
    fn test_idle_to_showing_and_cycle() {
        let manager = seeded(&["a", "b"]);
        let queue = manager.queue();
        let mut c = DisplayController::new(TimingConfig::default());
        let t0 = Instant::now();

        assert_eq!(c.phase(), DisplayPhase::Idle);
        let events = c.sync_queue(queue, t0);
        assert!(matches!(events[0], DisplayEvent::Shown { index: 0, .. }));
        assert_eq!(c.next_deadline(), Some(t0 + ms(10000)));

        assert!(c.fire_due(queue, t0 + ms(9999)).is_empty());
        let events = c.fire_due(queue, t0 + ms(10000));
        assert!(matches!(events[0], DisplayEvent::TransitionStarted { .. }));
        assert!(c.is_transitioning());
        assert_eq!(c.index(), 0);

        let events = c.fire_due(queue, t0 + ms(10300));
        assert!(matches!(events[0], DisplayEvent::Shown { index: 1, .. }));
        assert_eq!(c.phase(), DisplayPhase::Showing);

        c.fire_due(queue, t0 + ms(20300));
        c.fire_due(queue, t0 + ms(20600));
        assert_eq!(c.index(), 0);
    }

    #[test]
    fn test_single_entry_does_not_cycle() {
        let manager = seeded(&["only"]);
        let mut c = DisplayController::new(TimingConfig::default());
        c.sync_queue(manager.queue(), Instant::now());
        assert_eq!(c.phase(), DisplayPhase::Showing);
        assert_eq!(c.next_deadline(), None);
    }

    #[test]
    fn test_late_measurement_extends_current_window() {
        let manager = seeded(&["a", "b"]);
        let queue = manager.queue();
        let mut c = DisplayController::new(TimingConfig::default());
        let t0 = Instant::now();
        c.sync_queue(queue, t0);

        let m = measurement_for(&c, 800.0);
        assert!(c.apply_measurement(m.clone(), queue.len()));
        assert_eq!(c.next_deadline(), Some(t0 + ms(14000)));
        assert!(!c.apply_measurement(m, queue.len()));

        let stale = ScrollMeasurement {
            key: "gone|x|".to_string(),
            scroll_distance: 10.0,
            needs_scroll: true,
        };
        assert!(!c.apply_measurement(stale, queue.len()));
        assert_eq!(c.durations().display, ms(14000));
    }

    #[test]
    fn test_measurement_during_transition_keeps_transition_deadline() {
        let manager = seeded(&["a", "b"]);
        let queue = manager.queue();
        let mut c = DisplayController::new(TimingConfig::default());
        let t0 = Instant::now();
        c.sync_queue(queue, t0);
        c.fire_due(queue, t0 + ms(10000));
        assert!(c.is_transitioning());

        let m = measurement_for(&c, 800.0);
        assert!(c.apply_measurement(m, queue.len()));
        assert_eq!(c.durations().display, ms(14000));
        assert_eq!(c.next_deadline(), Some(t0 + ms(10300)));

        let events = c.fire_due(queue, t0 + ms(10300));
        assert!(matches!(events[0], DisplayEvent::Shown { index: 1, .. }));
        assert_eq!(c.next_deadline(), Some(t0 + ms(20300)));
    }

    #[test]
    fn test_refresh_during_transition_does_not_interrupt() {
        let mut manager = seeded(&["a", "b", "c"]);
        let mut c = DisplayController::new(TimingConfig::default());
        let t0 = Instant::now();
        c.sync_queue(manager.queue(), t0);
        c.fire_due(manager.queue(), t0 + ms(10000));
        assert!(c.is_transitioning());

        // "a" vanishes from the feed mid-transition.
        let key = c.current_key().cloned();
        manager.rebuild(&grouped(&["b", "c"]), &Palette::new(), key.as_ref(), 0);
        let events = c.sync_queue(manager.queue(), t0 + ms(10100));
        assert!(events.is_empty());
        assert!(c.is_transitioning());
        assert_eq!(c.next_deadline(), Some(t0 + ms(10300)));

        c.fire_due(manager.queue(), t0 + ms(10300));
        assert_eq!(c.index(), 0);
        assert_eq!(c.current_entry().unwrap().alert.headline, "b");
    }

    #[test]
    fn test_refresh_keeps_current_position() {
        let mut manager = seeded(&["a", "b", "c"]);
        let mut c = DisplayController::new(TimingConfig::default());
        let t0 = Instant::now();
        c.sync_queue(manager.queue(), t0);
        c.fire_due(manager.queue(), t0 + ms(10000));
        c.fire_due(manager.queue(), t0 + ms(10300));
        assert_eq!(c.current_entry().unwrap().alert.headline, "b");

        let key = c.current_key().cloned();
        manager.rebuild(&grouped(&["x", "a", "b", "c"]), &Palette::new(), key.as_ref(), 1);
        let events = c.sync_queue(manager.queue(), t0 + ms(11000));
        assert!(events.is_empty());
        assert_eq!(c.index(), 1);
        assert_eq!(c.next_deadline(), Some(t0 + ms(20300)));
    }

    #[test]
    fn test_new_entry_signals_once_and_marks_seen() {
        let mut manager = seeded(&["a"]);
        let mut c = DisplayController::new(TimingConfig::default());
        let t0 = Instant::now();
        c.sync_queue(manager.queue(), t0);

        let key = c.current_key().cloned();
        manager.rebuild(&grouped(&["a", "n"]), &Palette::new(), key.as_ref(), 0);
        c.sync_queue(manager.queue(), t0 + ms(1000));
        c.fire_due(manager.queue(), t0 + ms(10000));
        let events = c.fire_due(manager.queue(), t0 + ms(10300));
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], DisplayEvent::Shown { index: 1, .. }));
        assert!(matches!(events[1], DisplayEvent::NewAlert { .. }));

        let events = c.fire_due(manager.queue(), t0 + ms(20300));
        assert!(matches!(events[0], DisplayEvent::MarkSeen { .. }));
        assert!(matches!(events[1], DisplayEvent::TransitionStarted { .. }));
    }

    #[test]
    fn test_new_single_entry_marked_seen_without_cycling() {
        let mut manager = seeded(&["a"]);
        manager.rebuild(&grouped(&["n"]), &Palette::new(), None, 0);
        let mut c = DisplayController::new(TimingConfig::default());
        let t0 = Instant::now();
        let events = c.sync_queue(manager.queue(), t0);
        assert!(matches!(events[1], DisplayEvent::NewAlert { .. }));

        let events = c.fire_due(manager.queue(), t0 + ms(10000));
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], DisplayEvent::MarkSeen { .. }));
        assert_eq!(c.next_deadline(), None);
    }

    #[test]
    fn test_scroll_offset_linear_and_resets_on_text_change() {
        let mut manager = seeded(&["a", "b"]);
        let mut c = DisplayController::new(TimingConfig::default());
        let t0 = Instant::now();
        c.sync_queue(manager.queue(), t0);
        let m = measurement_for(&c, 800.0);
        c.apply_measurement(m, 2);

        assert_eq!(c.scroll_offset(t0 + ms(1000)), 0.0);
        assert_eq!(c.scroll_offset(t0 + ms(7000)), 400.0);
        assert_eq!(c.scroll_offset(t0 + ms(13000)), 800.0);
        assert_eq!(c.next_frame_at(t0, ms(16)), Some(t0 + ms(2000)));
        assert_eq!(c.next_frame_at(t0 + ms(3000), ms(16)), Some(t0 + ms(3016)));
        assert_eq!(c.next_frame_at(t0 + ms(12000), ms(16)), None);

        // Same key, but the wind gust now shows in the area bar.
        let key = c.current_key().cloned().unwrap();
        let mut a = alert("a", "Smith, TX");
        a.parameters.max_wind_gust = vec!["70 MPH".to_string()];
        let refreshed: GroupedAlerts = [a, alert("b", "Smith, TX")].into_iter().collect();
        manager.rebuild(&refreshed, &Palette::new(), Some(&key), 0);
        c.sync_queue(manager.queue(), t0 + ms(7000));

        assert_eq!(c.scroll_offset(t0 + ms(7000)), 0.0);
        assert_eq!(c.durations().display, ms(10000));
        assert_eq!(c.next_deadline(), Some(t0 + ms(17000)));
    }

    #[test]
    fn test_empty_queue_goes_idle() {
        let mut manager = seeded(&["a", "b"]);
        let mut c = DisplayController::new(TimingConfig::default());
        let t0 = Instant::now();
        c.sync_queue(manager.queue(), t0);
        manager.rebuild(&GroupedAlerts::new(), &Palette::new(), None, 0);
        let events = c.sync_queue(manager.queue(), t0 + ms(500));
        assert_eq!(events, vec![DisplayEvent::Cleared]);
        assert_eq!(c.phase(), DisplayPhase::Idle);
        assert_eq!(c.next_deadline(), None);
    }

    #[test]
    fn test_reset_and_teardown() {
        let manager = seeded(&["a", "b"]);
        let mut c = DisplayController::new(TimingConfig::default());
        let t0 = Instant::now();
        c.sync_queue(manager.queue(), t0);
        c.reset();
        assert_eq!(c.phase(), DisplayPhase::Idle);
        assert_eq!(c.next_deadline(), None);

        c.sync_queue(manager.queue(), t0 + ms(100));
        assert!(!c.is_torn_down());
        c.teardown();
        assert!(c.is_torn_down());
        assert!(c.sync_queue(manager.queue(), t0 + ms(200)).is_empty());
        assert!(c.fire_due(manager.queue(), t0 + ms(60000)).is_empty());
        assert_eq!(c.phase(), DisplayPhase::Idle);
    }
}
