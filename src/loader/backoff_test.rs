use super::*;

fn config(max_retries: u32, window_ms: u64) -> BackoffConfig {
    BackoffConfig { max_retries, initial_delay_ms: 100, multiplier: 2.0, max_delay_ms: 500, window_ms }
}

#[test]
fn delays_double_until_capped() {
    let mut backoff = Backoff::new(config(10, 100_000));
    let delays = std::iter::from_fn(|| backoff.next_delay())
        .take(5)
        .map(|d| d.as_millis())
        .collect::<Vec<_>>();
    assert_eq!(delays, vec![100, 200, 400, 500, 500]);
}

#[test]
fn stops_after_max_retries() {
    let mut backoff = Backoff::new(config(2, 100_000));
    assert!(backoff.next_delay().is_some());
    assert!(backoff.next_delay().is_some());
    assert!(backoff.next_delay().is_none());
    assert_eq!(backoff.retries(), 2);
}

#[test]
fn stops_when_window_would_be_exceeded() {
    // 100 + 200 = 300 fits; the next 400 would not.
    let mut backoff = Backoff::new(config(10, 500));
    assert!(backoff.next_delay().is_some());
    assert!(backoff.next_delay().is_some());
    assert!(backoff.next_delay().is_none());
    assert_eq!(backoff.elapsed_ms(), 300);
}

#[test]
fn zero_retries_never_schedules() {
    let mut backoff = Backoff::new(config(0, 10_000));
    assert!(backoff.next_delay().is_none());
}

#[test]
fn multiplier_of_one_is_constant() {
    let mut backoff = Backoff::new(BackoffConfig { multiplier: 1.0, ..config(3, 10_000) });
    let delays = std::iter::from_fn(|| backoff.next_delay()).map(|d| d.as_millis()).collect::<Vec<_>>();
    assert_eq!(delays, vec![100, 100, 100]);
}
