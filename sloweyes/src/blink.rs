//! Blink scheduling
//!
//! Manual mode has no timers and blinks only on the keybinding. Synced mode
//! runs one repeating timer for all eyes. Unsynced mode gives every eye its
//! own one-shot timer, re-armed with a fresh random delay each time it
//! fires. Restarting timers after a settings change never blinks by itself.

use crate::settings::{BlinkMode, BlinkRange, EyeSettings, SettingKey};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use slowcore::timer::TimerSet;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkEvent {
    /// Every eye blinks.
    All,
    /// Only the eye at this index blinks.
    Eye(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlinkTimer {
    Synced,
    Eye(usize),
}

fn seconds(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
}

pub struct BlinkScheduler<R: Rng = StdRng> {
    mode: BlinkMode,
    interval: f64,
    range: BlinkRange,
    eye_count: usize,
    rng: R,
    timers: TimerSet<BlinkTimer>,
}

impl BlinkScheduler<StdRng> {
    pub fn new(settings: &EyeSettings, now: Instant) -> Self {
        Self::with_rng(settings, StdRng::from_entropy(), now)
    }
}

impl<R: Rng> BlinkScheduler<R> {
    /// Build a scheduler drawing unsynced delays from `rng`, and start the
    /// timers of the configured mode.
    pub fn with_rng(settings: &EyeSettings, rng: R, now: Instant) -> Self {
        let mut scheduler = Self {
            mode: settings.eye_blink_mode,
            interval: settings.eye_blink_interval,
            range: settings.eye_blink_interval_range,
            eye_count: settings.eye_count as usize,
            rng,
            timers: TimerSet::new(),
        };
        scheduler.start(now);
        scheduler
    }

    pub fn mode(&self) -> BlinkMode {
        self.mode
    }

    pub fn eye_count(&self) -> usize {
        self.eye_count
    }

    pub fn active_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.timers.next_due()
    }

    fn random_delay(&mut self) -> Duration {
        seconds(self.rng.gen_range(self.range.min()..=self.range.max()))
    }

    fn start(&mut self, now: Instant) {
        match self.mode {
            BlinkMode::Manual => {}
            BlinkMode::Synced => {
                self.timers.every(BlinkTimer::Synced, seconds(self.interval), now);
            }
            BlinkMode::Unsynced => {
                for eye in 0..self.eye_count {
                    let delay = self.random_delay();
                    self.timers.once(BlinkTimer::Eye(eye), delay, now);
                }
            }
        }
        log::debug!("blink mode {} with {} timer(s)", self.mode.name(), self.timers.len());
    }

    fn restart(&mut self, now: Instant) {
        self.timers.clear();
        self.start(now);
    }

    pub fn set_mode(&mut self, mode: BlinkMode, now: Instant) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        self.restart(now);
    }

    /// Synced period in seconds.
    pub fn set_interval(&mut self, interval: f64, now: Instant) {
        if interval == self.interval {
            return;
        }
        self.interval = interval;
        if self.mode == BlinkMode::Synced {
            self.restart(now);
        }
    }

    pub fn set_range(&mut self, range: BlinkRange, now: Instant) {
        if range == self.range {
            return;
        }
        self.range = range;
        if self.mode == BlinkMode::Unsynced {
            self.restart(now);
        }
    }

    pub fn set_eye_count(&mut self, count: usize, now: Instant) {
        if count == self.eye_count {
            return;
        }
        self.eye_count = count;
        self.eyes_changed(now);
    }

    /// The set of eyes was rebuilt (moved, reordered, added or removed).
    pub fn eyes_changed(&mut self, now: Instant) {
        if self.mode == BlinkMode::Unsynced {
            self.restart(now);
        }
    }

    /// The blink keybinding was pressed. Only blinks in manual mode.
    pub fn trigger_manual(&self) -> Option<BlinkEvent> {
        (self.mode == BlinkMode::Manual).then_some(BlinkEvent::All)
    }

    /// Blinks that came due at `now`.
    pub fn poll(&mut self, now: Instant) -> Vec<BlinkEvent> {
        let mut events = Vec::new();
        for (_, timer) in self.timers.poll(now) {
            match timer {
                BlinkTimer::Synced => events.push(BlinkEvent::All),
                BlinkTimer::Eye(eye) => {
                    events.push(BlinkEvent::Eye(eye));
                    let delay = self.random_delay();
                    self.timers.once(BlinkTimer::Eye(eye), delay, now);
                }
            }
        }
        events
    }

    /// React to a changed setting.
    pub fn on_settings_changed(&mut self, key: SettingKey, settings: &EyeSettings, now: Instant) {
        match key {
            SettingKey::EyeBlinkMode => self.set_mode(settings.eye_blink_mode, now),
            SettingKey::EyeBlinkInterval => self.set_interval(settings.eye_blink_interval, now),
            SettingKey::EyeBlinkIntervalRange => self.set_range(settings.eye_blink_interval_range, now),
            SettingKey::EyeCount => self.set_eye_count(settings.eye_count as usize, now),
            SettingKey::EyePosition | SettingKey::EyeIndex => self.eyes_changed(now),
            _ => {}
        }
    }

    /// Cancel every timer. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        let cancelled = self.timers.clear();
        if cancelled > 0 {
            log::debug!("blink scheduler stopped {} timer(s)", cancelled);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn settings(mode: BlinkMode) -> EyeSettings {
        EyeSettings {
            eye_blink_mode: mode,
            eye_blink_interval: 1.0,
            eye_blink_interval_range: BlinkRange::new(0.5, 1.0).unwrap(),
            eye_count: 3,
            ..EyeSettings::default()
        }
    }

    fn scheduler(mode: BlinkMode, t0: Instant) -> BlinkScheduler<StdRng> {
        BlinkScheduler::with_rng(&settings(mode), StdRng::seed_from_u64(7), t0)
    }

    /// Poll every 10 ms over `(from, to]`, collecting events.
    fn run(s: &mut BlinkScheduler<StdRng>, t0: Instant, from: u64, to: u64) -> Vec<BlinkEvent> {
        let mut events = Vec::new();
        let mut t = from + 10;
        while t <= to {
            events.extend(s.poll(t0 + ms(t)));
            t += 10;
        }
        events
    }

    #[test]
    fn test_synced_cadence() {
        let t0 = Instant::now();
        let mut s = scheduler(BlinkMode::Synced, t0);
        let events = run(&mut s, t0, 0, 5000);
        assert_eq!(events, vec![BlinkEvent::All; 5]);
    }

    #[test]
    fn test_unsynced_delays_within_range() {
        let t0 = Instant::now();
        let mut s = scheduler(BlinkMode::Unsynced, t0);
        assert_eq!(s.active_timers(), 3);

        let mut last = [0u64; 3];
        let mut fired = [0usize; 3];
        for t in 1..=20_000u64 {
            for event in s.poll(t0 + ms(t)) {
                let BlinkEvent::Eye(eye) = event else {
                    panic!("unsynced mode blinked all eyes");
                };
                let gap = t - last[eye];
                assert!((500..=1001).contains(&gap), "eye {eye} gap {gap}");
                last[eye] = t;
                fired[eye] += 1;
            }
        }
        for count in fired {
            assert!(count >= 19, "{count}");
        }
    }

    #[test]
    fn test_unsynced_eyes_fire_out_of_step() {
        let t0 = Instant::now();
        let mut s = scheduler(BlinkMode::Unsynced, t0);
        let mut first: [Option<u64>; 3] = [None; 3];
        for t in 1..=1001u64 {
            for event in s.poll(t0 + ms(t)) {
                if let BlinkEvent::Eye(eye) = event {
                    first[eye].get_or_insert(t);
                }
            }
        }
        let first: Vec<u64> = first.into_iter().map(|t| t.expect("every eye fires once")).collect();
        assert!(first.iter().any(|&t| t != first[0]), "all eyes first blinked at {}", first[0]);
    }

    #[test]
    fn test_synced_to_unsynced_uses_one_timer_per_eye() {
        let t0 = Instant::now();
        let mut s = scheduler(BlinkMode::Synced, t0);
        assert_eq!(s.active_timers(), 1);

        let switch = 1500;
        s.set_mode(BlinkMode::Unsynced, t0 + ms(switch));
        assert_eq!(s.active_timers(), 3);
        assert!(s.next_due().unwrap() >= t0 + ms(switch + 500));

        let mut fired = [0usize; 3];
        for t in switch + 1..=switch + 10_000 {
            for event in s.poll(t0 + ms(t)) {
                match event {
                    BlinkEvent::Eye(eye) => fired[eye] += 1,
                    BlinkEvent::All => panic!("shared blink after leaving synced mode"),
                }
            }
            assert_eq!(s.active_timers(), 3);
        }
        assert!(fired.iter().all(|&n| n >= 9), "{fired:?}");
    }

    #[test]
    fn test_switch_to_manual_stops_timers() {
        let t0 = Instant::now();
        let mut s = scheduler(BlinkMode::Synced, t0);
        assert_eq!(run(&mut s, t0, 0, 2500).len(), 2);
        assert_eq!(s.trigger_manual(), None);

        s.set_mode(BlinkMode::Manual, t0 + ms(2500));
        assert_eq!(s.active_timers(), 0);
        assert!(run(&mut s, t0, 2500, 10_000).is_empty());
        assert_eq!(s.trigger_manual(), Some(BlinkEvent::All));
    }

    #[test]
    fn test_interval_change_restarts_without_blinking() {
        let t0 = Instant::now();
        let mut s = scheduler(BlinkMode::Synced, t0);

        s.set_interval(2.0, t0 + ms(900));
        assert!(run(&mut s, t0, 900, 2800).is_empty());
        assert_eq!(s.poll(t0 + ms(2900)), vec![BlinkEvent::All]);
    }

    #[test]
    fn test_range_ignored_outside_unsynced() {
        let t0 = Instant::now();
        let mut s = scheduler(BlinkMode::Synced, t0);
        let due = s.next_due();
        s.set_range(BlinkRange::new(2.0, 3.0).unwrap(), t0 + ms(500));
        assert_eq!(s.next_due(), due);
    }

    #[test]
    fn test_eye_count_change_reschedules() {
        let t0 = Instant::now();
        let mut s = scheduler(BlinkMode::Unsynced, t0);
        let mut next = settings(BlinkMode::Unsynced);
        next.eye_count = 5;
        s.on_settings_changed(SettingKey::EyeCount, &next, t0 + ms(100));
        assert_eq!(s.eye_count(), 5);
        assert_eq!(s.active_timers(), 5);

        // moving the eyes keeps the count but re-arms every eye
        s.on_settings_changed(SettingKey::EyePosition, &next, t0 + ms(200));
        assert_eq!(s.active_timers(), 5);
        assert!(s.next_due().unwrap() >= t0 + ms(700));
    }

    #[test]
    fn test_mode_change_from_settings() {
        let t0 = Instant::now();
        let mut s = scheduler(BlinkMode::Manual, t0);
        assert_eq!(s.active_timers(), 0);

        let next = settings(BlinkMode::Unsynced);
        s.on_settings_changed(SettingKey::EyeBlinkMode, &next, t0);
        assert_eq!(s.mode(), BlinkMode::Unsynced);
        assert_eq!(s.active_timers(), 3);

        // unrelated keys do nothing
        s.on_settings_changed(SettingKey::TrackerColor, &settings(BlinkMode::Synced), t0);
        assert_eq!(s.mode(), BlinkMode::Unsynced);
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let t0 = Instant::now();
        let mut s = scheduler(BlinkMode::Unsynced, t0);
        s.teardown();
        s.teardown();
        assert_eq!(s.active_timers(), 0);
        assert!(run(&mut s, t0, 0, 5000).is_empty());
    }
}
