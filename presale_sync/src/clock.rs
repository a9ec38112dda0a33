use std::time::Duration;

use chrono::Utc;
use tokio::{sync::watch, task::JoinHandle, time::interval};

/// Wall clock ticking once per second. It only drives the status and
/// countdown display; contract state is never touched from here.
pub struct Clock {
    now: watch::Receiver<i64>,
    ticker: JoinHandle<()>,
}

impl Clock {
    pub fn start() -> Self {
        let (tx, rx) = watch::channel(Utc::now().timestamp());
        let ticker = tokio::spawn(async move {
            let mut ticks = interval(Duration::from_secs(1));
            loop {
                ticks.tick().await;
                if tx.send(Utc::now().timestamp()).is_err() {
                    break;
                }
            }
        });
        Self { now: rx, ticker }
    }

    pub fn now(&self) -> i64 {
        *self.now.borrow()
    }

    pub fn stop(&self) {
        self.ticker.abort();
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        self.ticker.abort();
    }
}
