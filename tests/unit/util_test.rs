//! Tests for date conversion and telemetry helpers

use coral::util::{add_hours, init_tracing, parse_datetime, start_offset_hours, whole_day_delay_hours};

#[test]
fn test_start_offsets_and_annotation_agree() {
    let reference = parse_datetime("2025-04-01").unwrap();
    let start = parse_datetime("2025-04-03 07:15").unwrap();

    let offset = start_offset_hours(reference, start);
    assert_eq!(offset, 56.0);
    assert_eq!(add_hours(reference, offset), parse_datetime("2025-04-03 08:00").unwrap());
}

#[test]
fn test_future_delay_ignores_time_of_day() {
    let reference = parse_datetime("2025-04-01 00:00").unwrap();
    let morning = parse_datetime("2025-04-05 01:00").unwrap();
    let evening = parse_datetime("2025-04-05 23:00").unwrap();
    assert_eq!(whole_day_delay_hours(reference, morning), 96.0);
    assert_eq!(whole_day_delay_hours(reference, evening), 96.0);
}

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
    tracing::info!("tracing initialized twice without panicking");
}
