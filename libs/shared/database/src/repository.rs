use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use uuid::Uuid;

use shared_models::directory::{Department, Doctor, Patient};
use shared_models::scheduling::{
    AdjustmentRequest, Appointment, AppointmentStatus, DayOfWeek, ScheduleBlock,
};

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn insert_block(&self, block: ScheduleBlock) -> Result<ScheduleBlock>;

    async fn find_block(&self, id: Uuid) -> Result<Option<ScheduleBlock>>;

    /// Overwrites an existing block. Errors when the id is unknown.
    async fn save_block(&self, block: ScheduleBlock) -> Result<ScheduleBlock>;

    /// Returns whether a row was removed.
    async fn delete_block(&self, id: Uuid) -> Result<bool>;

    /// All blocks of a doctor ordered by weekday, then start time.
    async fn blocks_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<ScheduleBlock>>;

    /// Blocks of a doctor on one weekday ordered by start time.
    async fn blocks_for_doctor_on(&self, doctor_id: Uuid, day: DayOfWeek) -> Result<Vec<ScheduleBlock>>;

    async fn delete_blocks_for_doctor(&self, doctor_id: Uuid) -> Result<usize>;
}

#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn insert_appointment(&self, appointment: Appointment) -> Result<Appointment>;

    async fn find_appointment(&self, id: Uuid) -> Result<Option<Appointment>>;

    async fn save_appointment(&self, appointment: Appointment) -> Result<Appointment>;

    /// Ordered by appointment time.
    async fn appointments_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<Appointment>>;

    /// Ordered by appointment time.
    async fn appointments_for_patient(&self, patient_id: Uuid) -> Result<Vec<Appointment>>;

    /// Appointments of a doctor with `start <= time < end`, any status.
    async fn appointments_for_doctor_between(
        &self,
        doctor_id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Appointment>>;

    /// Appointments of every doctor with `start <= time < end`, any status.
    async fn appointments_between(&self, start: NaiveDateTime, end: NaiveDateTime) -> Result<Vec<Appointment>>;

    async fn count_appointments_with_status(&self, status: AppointmentStatus) -> Result<u64>;
}

#[async_trait]
pub trait AdjustmentRepository: Send + Sync {
    async fn insert_request(&self, request: AdjustmentRequest) -> Result<AdjustmentRequest>;

    async fn find_request(&self, id: Uuid) -> Result<Option<AdjustmentRequest>>;

    async fn save_request(&self, request: AdjustmentRequest) -> Result<AdjustmentRequest>;

    /// Newest first.
    async fn requests_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<AdjustmentRequest>>;

    /// Newest first.
    async fn all_requests(&self) -> Result<Vec<AdjustmentRequest>>;
}

#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    async fn insert_department(&self, department: Department) -> Result<Department>;

    async fn find_department(&self, id: Uuid) -> Result<Option<Department>>;

    async fn departments(&self) -> Result<Vec<Department>>;

    async fn department_name_taken(&self, name: &str) -> Result<bool>;

    async fn insert_doctor(&self, doctor: Doctor) -> Result<Doctor>;

    async fn find_doctor(&self, id: Uuid) -> Result<Option<Doctor>>;

    async fn doctors(&self) -> Result<Vec<Doctor>>;

    async fn doctors_in_department(&self, department_id: Uuid) -> Result<Vec<Doctor>>;

    async fn delete_doctor(&self, id: Uuid) -> Result<bool>;

    async fn find_patient(&self, id: Uuid) -> Result<Option<Patient>>;

    /// Inserts or replaces a patient row.
    async fn save_patient(&self, patient: Patient) -> Result<Patient>;

    async fn count_patients(&self) -> Result<u64>;
}

/// Everything a cell may ask of the relational store.
pub trait HospitalStore:
    ScheduleRepository + AppointmentRepository + AdjustmentRepository + DirectoryRepository
{
}

impl<T> HospitalStore for T where
    T: ScheduleRepository + AppointmentRepository + AdjustmentRepository + DirectoryRepository
{
}
