use super::*;
use crate::time::format_iso;

#[test]
fn fake_clock_advances() {
    let clock = FakeClock::at("2026-03-01T12:00:00");
    clock.advance_secs(90);
    assert_eq!(format_iso(clock.now()), "2026-03-01T12:01:30");
}

#[test]
fn fake_clock_set_overrides() {
    let clock = FakeClock::at("2026-03-01T12:00:00");
    let later = crate::time::parse_iso("2026-04-01T00:00:00").unwrap();
    clock.set(later);
    assert_eq!(clock.now(), later);
}

#[test]
fn system_clock_is_monotonic_enough() {
    let clock = SystemClock;
    let a = clock.now();
    let b = clock.now();
    assert!(b >= a);
}
