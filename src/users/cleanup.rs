use crate::users::manager::UserManager;
use chrono::{DateTime, Local, NaiveTime, TimeZone};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// First local midnight strictly after `now`.
///
/// When a DST transition swallows midnight the first valid instant of that
/// day is used instead.
pub fn next_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    let tz = now.timezone();
    let fallback = now.clone() + chrono::Duration::days(1);

    let Some(day) = now.date_naive().succ_opt() else {
        return fallback;
    };
    let midnight = day.and_time(NaiveTime::MIN);

    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + chrono::Duration::hours(1))).earliest())
        .unwrap_or(fallback)
}

pub fn delay_until_next_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> Duration {
    next_midnight(now)
        .signed_duration_since(now.clone())
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// Spawn the daily allowance sweep.
///
/// The delay is recomputed from the manager's clock after every run, so the
/// sweep stays aligned to local midnight.
pub fn spawn_cleanup_task(manager: Arc<UserManager>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = manager.clock().now_utc().with_timezone(&Local);
            let delay = delay_until_next_midnight(&now);

            debug!(
                next_run = %next_midnight(&now).to_rfc3339(),
                delay_seconds = delay.as_secs(),
                "Scheduled connection cleanup"
            );

            tokio::time::sleep(delay).await;

            match manager.clean_connections().await {
                Ok(report) => {
                    info!(
                        users = report.users,
                        removed_connections = report.removed,
                        "Cleaned users connections"
                    );
                }
                Err(e) => {
                    error!(error = %e, "Connection cleanup was not fully persisted");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::permission::PermLevel;
    use crate::models::user::CONNECTION_TTL_MILLIS;
    use crate::stores::memory_store::MemoryUserStore;
    use crate::users::hasher::PasswordHasher;
    use crate::utils::time::{Clock, ManualClock};
    use chrono::FixedOffset;

    const NOW: i64 = 1_700_000_000_000;

    fn at(rfc3339: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap()
    }

    #[test]
    fn test_next_midnight_same_offset() {
        let now = at("2024-03-10T15:30:00+02:00");
        assert_eq!(next_midnight(&now), at("2024-03-11T00:00:00+02:00"));
        assert_eq!(delay_until_next_midnight(&now), Duration::from_secs(8 * 3600 + 30 * 60));
    }

    #[test]
    fn test_exactly_midnight_waits_a_full_day() {
        let now = at("2024-03-10T00:00:00-05:00");
        assert_eq!(next_midnight(&now), at("2024-03-11T00:00:00-05:00"));
        assert_eq!(delay_until_next_midnight(&now), Duration::from_secs(86_400));
    }

    #[test]
    fn test_just_before_midnight() {
        let now = at("2024-12-31T23:59:59.500+00:00");
        assert_eq!(next_midnight(&now), at("2025-01-01T00:00:00+00:00"));
        assert_eq!(delay_until_next_midnight(&now), Duration::from_millis(500));
    }

    #[test]
    fn test_month_rollover() {
        let now = at("2024-02-29T12:00:00+09:00");
        assert_eq!(next_midnight(&now), at("2024-03-01T00:00:00+09:00"));
    }

    #[test]
    fn test_local_timezone_delay_is_within_a_day() {
        let delay = delay_until_next_midnight(&Local::now());
        assert!(delay > Duration::ZERO);
        assert!(delay <= Duration::from_secs(25 * 3600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_sweeps_at_midnight_and_reschedules() {
        let store = Arc::new(MemoryUserStore::new());
        let clock = Arc::new(ManualClock::new(NOW));
        let manager = Arc::new(UserManager::new(store.clone(), PasswordHasher::default(), clock.clone()));
        let user = manager.create_user("a", "p", PermLevel::Mod).await.unwrap().unwrap();

        clock.set(NOW - CONNECTION_TTL_MILLIS);
        manager.allow(&user.id, "first").await.unwrap();
        clock.set(NOW);

        let delay = delay_until_next_midnight(&clock.now_utc().with_timezone(&Local));
        let handle = spawn_cleanup_task(Arc::clone(&manager));

        tokio::time::sleep(delay - Duration::from_secs(1)).await;
        assert!(manager.get_user(&user.id).unwrap().is_allowed("first"));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!manager.get_user(&user.id).unwrap().is_allowed("first"));
        assert!(store.get(&user.id).unwrap().allowed_on.is_empty());

        clock.set(NOW - CONNECTION_TTL_MILLIS);
        manager.allow(&user.id, "second").await.unwrap();
        clock.set(NOW);

        tokio::time::sleep(Duration::from_secs(26 * 3600)).await;
        assert!(!manager.get_user(&user.id).unwrap().is_allowed("second"));
        assert!(store.get(&user.id).unwrap().allowed_on.is_empty());

        handle.abort();
    }
}
