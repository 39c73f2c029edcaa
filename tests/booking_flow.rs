//! Full booking flow against a live engine: derived fields, conflict
//! reporting, boundary touches, and the slot uniqueness constraint.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use ulid::Ulid;

use agendo::engine::{BookingRequest, ClientDraft, EngineError, ServiceDraft};
use agendo::model::BookingStatus;
use agendo::Engine;

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

#[test]
fn booking_day_end_to_end() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let engine = Engine::new();
    let owner = Ulid::new();
    let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

    let client = engine
        .create_client(
            owner,
            ClientDraft {
                name: "Carla Mendes".into(),
                email: "carla@example.com".into(),
                phone: "(11) 98888-7777".into(),
                national_id: "123.456.789-09".into(),
                birth_date: NaiveDate::from_ymd_opt(1988, 2, 29).unwrap(),
                address: Some("Rua das Flores, 100".into()),
                notes: None,
                active: true,
            },
            today,
        )
        .unwrap();

    let service = engine
        .create_service(
            owner,
            ServiceDraft {
                name: "Consultation".into(),
                description: Some("Standard 30-minute slot".into()),
                duration_hours: 0,
                duration_minutes: 30,
                price: Decimal::new(5000, 2),
                active: true,
            },
        )
        .unwrap();
    assert_eq!(service.duration_label(), "0h30min");

    let request = |start: NaiveTime| BookingRequest {
        client: client.id,
        service: service.id,
        date,
        start,
        end: None,
        charged: None,
        notes: None,
    };

    // No explicit end or charge: both derive from the service.
    let first = engine.book_appointment(owner, request(t(14, 0)), today).unwrap();
    assert_eq!(first.window.end, t(14, 30));
    assert_eq!(first.charged, Decimal::new(5000, 2));
    assert_eq!(first.status, BookingStatus::Scheduled);

    // Overlapping request: rejected, naming the blocking client and window.
    let err = engine.book_appointment(owner, request(t(14, 15)), today).unwrap_err();
    let rendered = err.to_string();
    assert!(matches!(err, EngineError::Conflict(_)));
    assert!(rendered.contains("Carla Mendes"));
    assert!(rendered.contains("14:00–14:30"));

    // Touching the boundary exactly: legal.
    let second = engine.book_appointment(owner, request(t(14, 30)), today).unwrap();
    assert_eq!(second.window.end, t(15, 0));

    // Identical start on the same day: the uniqueness constraint, not the
    // overlap scan, reports it.
    let dup = engine.book_appointment(owner, request(t(14, 30)), today).unwrap_err();
    assert!(matches!(dup, EngineError::SlotTaken { .. }));

    // Run the first booking to completion and account for the day.
    engine.change_status(owner, first.id, BookingStatus::Confirmed).unwrap();
    engine.change_status(owner, first.id, BookingStatus::InProgress).unwrap();
    engine.change_status(owner, first.id, BookingStatus::Completed).unwrap();
    engine.cancel_appointment(owner, second.id).unwrap();

    let summary = engine.period_summary(owner, date, date);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.completed, 1);
    assert_eq!(summary.canceled, 1);
    assert_eq!(summary.revenue, Decimal::new(5000, 2));
}
