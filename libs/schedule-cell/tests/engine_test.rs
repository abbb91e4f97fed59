use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use uuid::Uuid;

use schedule_cell::models::{CreateBlockRequest, ScheduleError, UpdateBlockRequest};
use schedule_cell::services::engine::SchedulingEngine;
use shared_database::{AppointmentRepository, DirectoryRepository, HospitalStore, InMemoryStore};
use shared_models::directory::{Department, Doctor};
use shared_models::scheduling::{Appointment, AppointmentStatus, DayOfWeek};

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

// 2024-01-01 was a Monday
fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn at(date: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
    date.and_time(time(h, m))
}

fn block_request(doctor_id: Uuid, day: DayOfWeek, start: NaiveTime, end: NaiveTime) -> CreateBlockRequest {
    CreateBlockRequest {
        doctor_id,
        day_of_week: day,
        start_time: start,
        end_time: end,
        max_patients: None,
    }
}

fn setup() -> (Arc<InMemoryStore>, SchedulingEngine) {
    let store = Arc::new(InMemoryStore::new());
    let engine = SchedulingEngine::new(store.clone() as Arc<dyn HospitalStore>);
    (store, engine)
}

async fn book(store: &InMemoryStore, doctor_id: Uuid, when: NaiveDateTime, status: AppointmentStatus) {
    store
        .insert_appointment(Appointment {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            doctor_id,
            appointment_time: when,
            status,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn valid_block_yields_four_half_hour_slots() {
    let (_, engine) = setup();
    let doctor_id = Uuid::new_v4();

    let block = engine
        .create_block(block_request(doctor_id, DayOfWeek::Monday, time(9, 0), time(11, 0)))
        .await
        .unwrap();
    assert_eq!(block.max_patients, 10);

    let slots = engine.slots_for_date(doctor_id, monday()).await.unwrap();
    assert_eq!(slots.len(), 4);
    assert_eq!(slots[0].start_time, at(monday(), 9, 0));
    assert_eq!(slots[3].end_time, at(monday(), 11, 0));
    for slot in &slots {
        assert_eq!((slot.end_time - slot.start_time).num_minutes(), 30);
        assert!(slot.is_working_time);
        assert!(slot.available);
        assert_eq!(slot.current_patients, 0);
    }
}

#[tokio::test]
async fn block_length_must_be_exactly_two_hours() {
    let (_, engine) = setup();
    let doctor_id = Uuid::new_v4();

    let short = engine
        .create_block(block_request(doctor_id, DayOfWeek::Monday, time(9, 0), time(10, 59)))
        .await;
    assert_matches!(short, Err(ScheduleError::Validation(_)));

    let long = engine
        .create_block(block_request(doctor_id, DayOfWeek::Monday, time(9, 0), time(11, 1)))
        .await;
    assert_matches!(long, Err(ScheduleError::Validation(_)));

    let inverted = engine
        .create_block(block_request(doctor_id, DayOfWeek::Monday, time(11, 0), time(9, 0)))
        .await;
    assert_matches!(inverted, Err(ScheduleError::Validation(msg)) if msg.contains("later than"));

    let zero_capacity = engine
        .create_block(CreateBlockRequest {
            max_patients: Some(0),
            ..block_request(doctor_id, DayOfWeek::Monday, time(9, 0), time(11, 0))
        })
        .await;
    assert_matches!(zero_capacity, Err(ScheduleError::Validation(_)));
}

#[tokio::test]
async fn duplicate_block_is_rejected() {
    let (_, engine) = setup();
    let doctor_id = Uuid::new_v4();
    let request = block_request(doctor_id, DayOfWeek::Tuesday, time(14, 0), time(16, 0));

    engine.create_block(request.clone()).await.unwrap();
    let duplicate = engine.create_block(request).await;
    assert_matches!(duplicate, Err(ScheduleError::Validation(msg)) if msg.contains("already exists"));

    // another doctor may hold the same block
    engine
        .create_block(block_request(Uuid::new_v4(), DayOfWeek::Tuesday, time(14, 0), time(16, 0)))
        .await
        .unwrap();
}

#[tokio::test]
async fn no_blocks_means_no_slots() {
    let (_, engine) = setup();
    let doctor_id = Uuid::new_v4();

    engine
        .create_block(block_request(doctor_id, DayOfWeek::Wednesday, time(9, 0), time(11, 0)))
        .await
        .unwrap();

    assert!(engine.slots_for_date(doctor_id, monday()).await.unwrap().is_empty());
}

#[tokio::test]
async fn occupancy_is_shared_by_every_slot_of_a_block() {
    let (store, engine) = setup();
    let doctor_id = Uuid::new_v4();

    engine
        .create_block(CreateBlockRequest {
            max_patients: Some(2),
            ..block_request(doctor_id, DayOfWeek::Monday, time(9, 0), time(11, 0))
        })
        .await
        .unwrap();

    book(&store, doctor_id, at(monday(), 9, 0), AppointmentStatus::Pending).await;
    book(&store, doctor_id, at(monday(), 10, 30), AppointmentStatus::Cancelled).await;

    let slots = engine.slots_for_date(doctor_id, monday()).await.unwrap();
    assert!(slots.iter().all(|s| s.current_patients == 1 && s.available));
    assert!(!engine.is_slot_full(doctor_id, at(monday(), 10, 0)).await.unwrap());

    book(&store, doctor_id, at(monday(), 10, 45), AppointmentStatus::Completed).await;

    let slots = engine.slots_for_date(doctor_id, monday()).await.unwrap();
    assert!(slots.iter().all(|s| s.current_patients == 2 && !s.available));
    assert!(engine.is_slot_full(doctor_id, at(monday(), 9, 15)).await.unwrap());
    assert_eq!(engine.current_occupancy(doctor_id, at(monday(), 9, 15)).await.unwrap(), 2);

    // the same weekday a week later is untouched
    let next_monday = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
    assert_eq!(engine.current_occupancy(doctor_id, at(next_monday, 9, 15)).await.unwrap(), 0);
}

#[tokio::test]
async fn working_hours_are_half_open() {
    let (_, engine) = setup();
    let doctor_id = Uuid::new_v4();

    engine
        .create_block(block_request(doctor_id, DayOfWeek::Monday, time(9, 0), time(11, 0)))
        .await
        .unwrap();

    assert!(engine.is_within_working_hours(doctor_id, at(monday(), 9, 0)).await.unwrap());
    assert!(engine.is_within_working_hours(doctor_id, at(monday(), 10, 59)).await.unwrap());
    assert!(!engine.is_within_working_hours(doctor_id, at(monday(), 11, 0)).await.unwrap());
    assert!(!engine.is_slot_full(doctor_id, at(monday(), 12, 0)).await.unwrap());
    assert_eq!(engine.current_occupancy(doctor_id, at(monday(), 12, 0)).await.unwrap(), 0);
}

#[tokio::test]
async fn update_skips_length_and_duplicate_checks() {
    let (_, engine) = setup();
    let doctor_id = Uuid::new_v4();

    engine
        .create_block(block_request(doctor_id, DayOfWeek::Monday, time(14, 0), time(16, 0)))
        .await
        .unwrap();
    let block = engine
        .create_block(block_request(doctor_id, DayOfWeek::Monday, time(9, 0), time(11, 0)))
        .await
        .unwrap();

    let updated = engine
        .update_block(
            block.id,
            UpdateBlockRequest {
                day_of_week: DayOfWeek::Monday,
                start_time: time(14, 0),
                end_time: time(15, 0),
                max_patients: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.end_time, time(15, 0));
    assert_eq!(updated.max_patients, 10);

    let missing = engine
        .update_block(
            Uuid::new_v4(),
            UpdateBlockRequest {
                day_of_week: DayOfWeek::Monday,
                start_time: time(9, 0),
                end_time: time(11, 0),
                max_patients: Some(3),
            },
        )
        .await;
    assert_matches!(missing, Err(ScheduleError::NotFound(_)));
}

#[tokio::test]
async fn delete_and_cascade() {
    let (_, engine) = setup();
    let doctor_id = Uuid::new_v4();

    let first = engine
        .create_block(block_request(doctor_id, DayOfWeek::Monday, time(9, 0), time(11, 0)))
        .await
        .unwrap();
    engine
        .create_block(block_request(doctor_id, DayOfWeek::Friday, time(9, 0), time(11, 0)))
        .await
        .unwrap();
    engine
        .create_block(block_request(doctor_id, DayOfWeek::Friday, time(13, 0), time(15, 0)))
        .await
        .unwrap();

    assert!(engine.has_minimum_weekly_coverage(doctor_id).await.unwrap());

    engine.delete_block(first.id).await.unwrap();
    assert_matches!(engine.delete_block(first.id).await, Err(ScheduleError::NotFound(_)));

    assert_eq!(engine.remove_doctor_schedule(doctor_id).await.unwrap(), 2);
    assert!(!engine.has_minimum_weekly_coverage(doctor_id).await.unwrap());
}

#[tokio::test]
async fn weekly_schedule_is_ordered_and_named() {
    let (store, engine) = setup();
    let doctor_id = Uuid::new_v4();

    store
        .insert_doctor(Doctor {
            id: doctor_id,
            name: "Dr. Lin".to_string(),
            phone: None,
            title: None,
            department_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
        .await
        .unwrap();

    engine
        .create_block(block_request(doctor_id, DayOfWeek::Friday, time(8, 0), time(10, 0)))
        .await
        .unwrap();
    engine
        .create_block(block_request(doctor_id, DayOfWeek::Monday, time(14, 0), time(16, 0)))
        .await
        .unwrap();
    engine
        .create_block(block_request(doctor_id, DayOfWeek::Monday, time(9, 0), time(11, 0)))
        .await
        .unwrap();

    let week = engine.weekly_schedule(doctor_id).await.unwrap();
    let order: Vec<_> = week.iter().map(|v| (v.block.day_of_week, v.block.start_time)).collect();
    assert_eq!(
        order,
        vec![
            (DayOfWeek::Monday, time(9, 0)),
            (DayOfWeek::Monday, time(14, 0)),
            (DayOfWeek::Friday, time(8, 0)),
        ]
    );
    assert!(week.iter().all(|v| v.doctor_name == "Dr. Lin"));

    let unknown = engine.weekly_schedule(Uuid::new_v4()).await.unwrap();
    assert!(unknown.is_empty());
}

#[tokio::test]
async fn available_dates_follow_capacity() {
    let (store, engine) = setup();
    let department_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();

    store
        .insert_department(Department {
            id: department_id,
            name: "Cardiology".to_string(),
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
        .await
        .unwrap();
    store
        .insert_doctor(Doctor {
            id: doctor_id,
            name: "Dr. Chen".to_string(),
            phone: None,
            title: None,
            department_id: Some(department_id),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
        .await
        .unwrap();

    engine
        .create_block(CreateBlockRequest {
            max_patients: Some(1),
            ..block_request(doctor_id, DayOfWeek::Monday, time(9, 0), time(11, 0))
        })
        .await
        .unwrap();
    engine
        .create_block(block_request(doctor_id, DayOfWeek::Wednesday, time(9, 0), time(11, 0)))
        .await
        .unwrap();

    let start = monday();
    let end = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();

    let dates = engine.available_dates(department_id, None, start, end).await.unwrap();
    assert_eq!(dates, vec![monday(), NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()]);

    book(&store, doctor_id, at(monday(), 9, 30), AppointmentStatus::Confirmed).await;

    let dates = engine
        .available_dates(department_id, Some(doctor_id), start, end)
        .await
        .unwrap();
    assert_eq!(dates, vec![NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()]);

    let empty_department = engine
        .available_dates(Uuid::new_v4(), None, start, end)
        .await
        .unwrap();
    assert!(empty_department.is_empty());

    let inverted = engine.available_dates(department_id, None, end, start).await;
    assert_matches!(inverted, Err(ScheduleError::Validation(_)));
}

#[tokio::test]
async fn available_dates_range_is_capped_at_a_year() {
    let (_, engine) = setup();
    let doctor_id = Uuid::new_v4();
    engine
        .create_block(block_request(doctor_id, DayOfWeek::Monday, time(9, 0), time(11, 0)))
        .await
        .unwrap();

    // 2024 is a leap year: 366 inclusive days end on 2024-12-31
    let year_end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
    let dates = engine
        .available_dates(Uuid::new_v4(), Some(doctor_id), monday(), year_end)
        .await
        .unwrap();
    assert_eq!(dates.len(), 53);

    let too_long = engine
        .available_dates(
            Uuid::new_v4(),
            Some(doctor_id),
            NaiveDate::from_ymd_opt(1, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(9999, 12, 31).unwrap(),
        )
        .await;
    assert_matches!(too_long, Err(ScheduleError::Validation(msg)) if msg == "Date range cannot exceed 366 days");

    let one_day_over = engine
        .available_dates(
            Uuid::new_v4(),
            Some(doctor_id),
            monday(),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        )
        .await;
    assert_matches!(one_day_over, Err(ScheduleError::Validation(_)));
}
