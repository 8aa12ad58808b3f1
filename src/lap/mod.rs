pub mod debounce;
pub mod sink;

pub use debounce::{LapDebouncer, ScanOutcome, BUZZER_ACTIVE_TIME_MS, MIN_LAP_TIME_MS};
pub use sink::{Buzzer, JsonLinesSink, LapEvent, LapEventSink, LogBuzzer, SinkRecord};
