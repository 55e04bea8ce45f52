//! Zeros every upstream's daily counter at local midnight (§4.5).

use crate::registry::Registry;
use chrono::{Duration as ChronoDuration, Local};
use log::info;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Duration;

/// How long to sleep until the next local midnight.
fn duration_until_next_midnight() -> Duration {
    let now = Local::now();
    let tomorrow = (now + ChronoDuration::days(1))
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time");
    let tomorrow_local = tomorrow.and_local_timezone(Local).single().unwrap_or(now);
    let delta = tomorrow_local - now;
    Duration::from_secs_f64(delta.num_milliseconds().max(0) as f64 / 1000.0)
}

/// Sleeps until the next local midnight, zeros every upstream's counter —
/// re-reading the registry each cycle so upstreams registered after startup
/// via the admin surface are included — sleeps one extra second to avoid
/// re-entry within the same wall-clock second, then repeats. Exits at the
/// next wake-up once shutdown is signalled, without performing a reset.
pub async fn run(registry: Arc<Registry>, mut shutdown: watch::Receiver<bool>) {
    loop {
        let wait = duration_until_next_midnight();
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return;
                }
            }
        }

        if *shutdown.borrow() {
            return;
        }

        let upstreams = registry.snapshot();
        info!("midnight reset: zeroing {} upstream counters", upstreams.len());
        for upstream in &upstreams {
            upstream.reset_counter();
        }

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(1)) => {}
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_until_midnight_is_within_a_day() {
        let d = duration_until_next_midnight();
        assert!(d.as_secs() <= 24 * 3600);
    }
}
