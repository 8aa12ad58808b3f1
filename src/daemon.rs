use std::sync::Arc;
use std::time::Duration;

use crate::clock::MonotonicClock;
use crate::config::DaemonConfig;
use crate::lap::{JsonLinesSink, LogBuzzer};
use crate::reader::LapReader;
use crate::serial::{SerialBackend, SystemSerialBackend};

/// Build a reader wired to the system serial ports, stdout and the log.
pub fn build_reader(config: &DaemonConfig) -> LapReader {
    let backend: Arc<dyn SerialBackend> = Arc::new(SystemSerialBackend::new());
    let mut reader = LapReader::new(
        backend,
        config.serial_device.clone(),
        Box::new(MonotonicClock::new()),
        Box::new(JsonLinesSink::new(std::io::stdout())),
        Box::new(LogBuzzer),
    );
    reader.set_debug(config.debug);
    reader
}

/// Drive `reader` until Ctrl-C. SIGUSR1 starts a new race.
///
/// Must run on a current-thread runtime: the reader is not `Send`.
pub async fn run(mut reader: LapReader, tick_interval: Duration) -> std::io::Result<()> {
    let mut ticker = tokio::time::interval(tick_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    #[cfg(unix)]
    let mut reset_signal =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::user_defined1())?;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        #[cfg(unix)]
        {
            tokio::select! {
                _ = ticker.tick() => reader.tick(),
                _ = reset_signal.recv() => {
                    log::info!("reset requested");
                    reader.reset();
                }
                res = &mut shutdown => {
                    res?;
                    break;
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::select! {
                _ = ticker.tick() => reader.tick(),
                res = &mut shutdown => {
                    res?;
                    break;
                }
            }
        }
    }

    log::info!("shutting down, stats: {:?}", reader.stats());
    reader.close();
    Ok(())
}
