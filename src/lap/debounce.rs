use std::collections::HashMap;

use super::{Buzzer, LapEventSink};

/// Shortest physically possible lap. Repeated triggers inside this window
/// come from a single pass over the loop.
pub const MIN_LAP_TIME_MS: u64 = 1000;

pub const BUZZER_ACTIVE_TIME_MS: u64 = 100;

/// What a single scan turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    FirstScan,
    Lap { delta_ms: u64 },
    Bounce,
}

/// Per-token debounce state and lap emission.
pub struct LapDebouncer {
    sensored_times: HashMap<String, u64>,
    sink: Box<dyn LapEventSink>,
    buzzer: Box<dyn Buzzer>,
}

impl LapDebouncer {
    pub fn new(sink: Box<dyn LapEventSink>, buzzer: Box<dyn Buzzer>) -> Self {
        Self {
            sensored_times: HashMap::new(),
            sink,
            buzzer,
        }
    }

    /// Handle an accepted scan of `token` at decoder time `timestamp_ms`.
    pub fn record_scan(&mut self, token: &str, timestamp_ms: u64) -> ScanOutcome {
        self.sink.on_token_scanned(token);

        // A stored zero counts as unseen.
        let last = match self.sensored_times.get(token) {
            Some(&last) if last != 0 => last,
            _ => {
                self.sensored_times.insert(token.to_string(), timestamp_ms);
                log::debug!("first scan token={}, ms={}", token, timestamp_ms);
                return ScanOutcome::FirstScan;
            }
        };

        if last.saturating_add(MIN_LAP_TIME_MS) < timestamp_ms {
            let delta_ms = timestamp_ms - last;
            self.buzzer.activate(BUZZER_ACTIVE_TIME_MS);
            log::debug!("emitting token={}, delta_time={} (ms={})", token, delta_ms, timestamp_ms);
            self.sink.on_lap_event(token, delta_ms);
            self.sensored_times.insert(token.to_string(), timestamp_ms);
            ScanOutcome::Lap { delta_ms }
        } else {
            log::debug!("bounce token={}, ms={} (last={})", token, timestamp_ms, last);
            ScanOutcome::Bounce
        }
    }

    /// Last accepted timestamp for `token`.
    pub fn last_seen(&self, token: &str) -> Option<u64> {
        self.sensored_times.get(token).copied()
    }

    pub fn tracked_tokens(&self) -> usize {
        self.sensored_times.len()
    }

    /// Forget every token.
    pub fn clear(&mut self) {
        self.sensored_times.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Calls {
        scanned: Vec<String>,
        laps: Vec<(String, u64)>,
        buzzes: Vec<u64>,
    }

    struct Recorder(Rc<RefCell<Calls>>);

    impl LapEventSink for Recorder {
        fn on_token_scanned(&mut self, token: &str) {
            self.0.borrow_mut().scanned.push(token.to_string());
        }
        fn on_lap_event(&mut self, token: &str, delta_ms: u64) {
            self.0.borrow_mut().laps.push((token.to_string(), delta_ms));
        }
    }

    impl Buzzer for Recorder {
        fn activate(&mut self, duration_ms: u64) {
            self.0.borrow_mut().buzzes.push(duration_ms);
        }
    }

    fn debouncer() -> (LapDebouncer, Rc<RefCell<Calls>>) {
        let calls = Rc::new(RefCell::new(Calls::default()));
        let d = LapDebouncer::new(Box::new(Recorder(calls.clone())), Box::new(Recorder(calls.clone())));
        (d, calls)
    }

    #[test]
    fn test_first_scan_stores_without_lap() {
        let (mut d, calls) = debouncer();
        assert_eq!(d.record_scan("T", 5000), ScanOutcome::FirstScan);
        assert_eq!(d.last_seen("T"), Some(5000));
        assert!(calls.borrow().laps.is_empty());
        assert_eq!(calls.borrow().scanned, vec!["T"]);
    }

    #[test]
    fn test_bounce_is_suppressed() {
        let (mut d, calls) = debouncer();
        d.record_scan("T", 5000);
        assert_eq!(d.record_scan("T", 5500), ScanOutcome::Bounce);
        assert_eq!(d.last_seen("T"), Some(5000));
        assert!(calls.borrow().laps.is_empty());
        assert_eq!(calls.borrow().scanned.len(), 2);
    }

    #[test]
    fn test_valid_lap_emits_delta() {
        let (mut d, calls) = debouncer();
        d.record_scan("T", 5000);
        assert_eq!(d.record_scan("T", 6200), ScanOutcome::Lap { delta_ms: 1200 });
        assert_eq!(d.last_seen("T"), Some(6200));
        assert_eq!(calls.borrow().laps, vec![("T".to_string(), 1200)]);
        assert_eq!(calls.borrow().buzzes, vec![BUZZER_ACTIVE_TIME_MS]);
    }

    #[test]
    fn test_exact_threshold_is_not_a_lap() {
        let (mut d, calls) = debouncer();
        d.record_scan("T", 5000);
        assert_eq!(d.record_scan("T", 6000), ScanOutcome::Bounce);
        assert_eq!(d.record_scan("T", 6001), ScanOutcome::Lap { delta_ms: 1001 });
        assert_eq!(calls.borrow().laps.len(), 1);
    }

    #[test]
    fn test_bounces_do_not_extend_window() {
        let (mut d, _calls) = debouncer();
        d.record_scan("T", 5000);
        d.record_scan("T", 5900);
        assert_eq!(d.record_scan("T", 6100), ScanOutcome::Lap { delta_ms: 1100 });
    }

    #[test]
    fn test_tokens_are_independent() {
        let (mut d, calls) = debouncer();
        d.record_scan("A", 5000);
        d.record_scan("B", 5200);
        assert_eq!(d.record_scan("A", 6500), ScanOutcome::Lap { delta_ms: 1500 });
        assert_eq!(d.record_scan("B", 5800), ScanOutcome::Bounce);
        assert_eq!(calls.borrow().laps, vec![("A".to_string(), 1500)]);
    }

    #[test]
    fn test_zero_timestamp_counts_as_unseen() {
        let (mut d, _calls) = debouncer();
        assert_eq!(d.record_scan("T", 0), ScanOutcome::FirstScan);
        assert_eq!(d.record_scan("T", 3000), ScanOutcome::FirstScan);
        assert_eq!(d.last_seen("T"), Some(3000));
    }

    #[test]
    fn test_clock_going_backwards_is_a_bounce() {
        let (mut d, _calls) = debouncer();
        d.record_scan("T", 9000);
        assert_eq!(d.record_scan("T", 2000), ScanOutcome::Bounce);
        assert_eq!(d.last_seen("T"), Some(9000));
    }

    #[test]
    fn test_clear_forgets_history() {
        let (mut d, calls) = debouncer();
        d.record_scan("T", 5000);
        d.clear();
        assert_eq!(d.tracked_tokens(), 0);
        assert_eq!(d.record_scan("T", 7000), ScanOutcome::FirstScan);
        assert!(calls.borrow().laps.is_empty());
    }
}
