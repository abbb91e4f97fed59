use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::directory::{Department, Doctor, Patient};
use shared_models::scheduling::{
    AdjustmentRequest, Appointment, AppointmentStatus, DayOfWeek, ScheduleBlock,
};

use crate::repository::{
    AdjustmentRepository, AppointmentRepository, DirectoryRepository, ScheduleRepository,
};
use crate::supabase::SupabaseClient;

const SCHEDULES: &str = "/rest/v1/schedules";
const APPOINTMENTS: &str = "/rest/v1/appointments";
const ADJUSTMENTS: &str = "/rest/v1/schedule_adjustment_requests";
const DEPARTMENTS: &str = "/rest/v1/departments";
const DOCTORS: &str = "/rest/v1/doctors";
const PATIENTS: &str = "/rest/v1/patients";

fn timestamp(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Store backed by Supabase tables through PostgREST.
///
/// Each call is its own statement; there is no cross-request transaction.
pub struct SupabaseStore {
    client: SupabaseClient,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        Self { client: SupabaseClient::new(config) }
    }

    pub fn from_client(client: SupabaseClient) -> Self {
        Self { client }
    }

    async fn select<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let rows: Vec<Value> = self.client.request(Method::GET, path, None).await?;
        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(Into::into))
            .collect()
    }

    async fn select_one<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        Ok(self.select::<T>(path).await?.into_iter().next())
    }

    async fn insert<T: Serialize + DeserializeOwned>(&self, table: &str, row: &T) -> Result<T> {
        let rows: Vec<Value> = self
            .client
            .request_returning(Method::POST, table, Some(serde_json::to_value(row)?))
            .await?;
        let first = rows
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Insert into {} returned no rows", table))?;
        Ok(serde_json::from_value(first)?)
    }

    async fn update<T: Serialize + DeserializeOwned>(&self, table: &str, id: Uuid, row: &T) -> Result<T> {
        let path = format!("{}?id=eq.{}", table, id);
        let rows: Vec<Value> = self
            .client
            .request_returning(Method::PATCH, &path, Some(serde_json::to_value(row)?))
            .await?;
        let first = rows
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Row {} not found in {}", id, table))?;
        Ok(serde_json::from_value(first)?)
    }

    async fn delete_where(&self, table: &str, filter: &str) -> Result<usize> {
        let path = format!("{}?{}", table, filter);
        let rows: Vec<Value> = self
            .client
            .request_returning(Method::DELETE, &path, None)
            .await?;
        Ok(rows.len())
    }
}

#[async_trait]
impl ScheduleRepository for SupabaseStore {
    async fn insert_block(&self, block: ScheduleBlock) -> Result<ScheduleBlock> {
        debug!("Persisting schedule block {} for doctor {}", block.id, block.doctor_id);
        self.insert(SCHEDULES, &block).await
    }

    async fn find_block(&self, id: Uuid) -> Result<Option<ScheduleBlock>> {
        self.select_one(&format!("{}?id=eq.{}", SCHEDULES, id)).await
    }

    async fn save_block(&self, block: ScheduleBlock) -> Result<ScheduleBlock> {
        self.update(SCHEDULES, block.id, &block).await
    }

    async fn delete_block(&self, id: Uuid) -> Result<bool> {
        Ok(self.delete_where(SCHEDULES, &format!("id=eq.{}", id)).await? > 0)
    }

    async fn blocks_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<ScheduleBlock>> {
        let mut blocks: Vec<ScheduleBlock> = self
            .select(&format!("{}?doctor_id=eq.{}&order=start_time.asc", SCHEDULES, doctor_id))
            .await?;
        // weekday names do not sort chronologically in SQL
        blocks.sort_by(|a, b| {
            a.day_of_week
                .cmp(&b.day_of_week)
                .then(a.start_time.cmp(&b.start_time))
        });
        Ok(blocks)
    }

    async fn blocks_for_doctor_on(&self, doctor_id: Uuid, day: DayOfWeek) -> Result<Vec<ScheduleBlock>> {
        self.select(&format!(
            "{}?doctor_id=eq.{}&day_of_week=eq.{}&order=start_time.asc",
            SCHEDULES, doctor_id, day
        ))
        .await
    }

    async fn delete_blocks_for_doctor(&self, doctor_id: Uuid) -> Result<usize> {
        self.delete_where(SCHEDULES, &format!("doctor_id=eq.{}", doctor_id)).await
    }
}

#[async_trait]
impl AppointmentRepository for SupabaseStore {
    async fn insert_appointment(&self, appointment: Appointment) -> Result<Appointment> {
        self.insert(APPOINTMENTS, &appointment).await
    }

    async fn find_appointment(&self, id: Uuid) -> Result<Option<Appointment>> {
        self.select_one(&format!("{}?id=eq.{}", APPOINTMENTS, id)).await
    }

    async fn save_appointment(&self, appointment: Appointment) -> Result<Appointment> {
        self.update(APPOINTMENTS, appointment.id, &appointment).await
    }

    async fn appointments_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<Appointment>> {
        self.select(&format!(
            "{}?doctor_id=eq.{}&order=appointment_time.asc",
            APPOINTMENTS, doctor_id
        ))
        .await
    }

    async fn appointments_for_patient(&self, patient_id: Uuid) -> Result<Vec<Appointment>> {
        self.select(&format!(
            "{}?patient_id=eq.{}&order=appointment_time.asc",
            APPOINTMENTS, patient_id
        ))
        .await
    }

    async fn appointments_for_doctor_between(
        &self,
        doctor_id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Appointment>> {
        self.select(&format!(
            "{}?doctor_id=eq.{}&appointment_time=gte.{}&appointment_time=lt.{}&order=appointment_time.asc",
            APPOINTMENTS,
            doctor_id,
            timestamp(start),
            timestamp(end)
        ))
        .await
    }

    async fn appointments_between(&self, start: NaiveDateTime, end: NaiveDateTime) -> Result<Vec<Appointment>> {
        self.select(&format!(
            "{}?appointment_time=gte.{}&appointment_time=lt.{}&order=appointment_time.asc",
            APPOINTMENTS,
            timestamp(start),
            timestamp(end)
        ))
        .await
    }

    async fn count_appointments_with_status(&self, status: AppointmentStatus) -> Result<u64> {
        let rows: Vec<Value> = self
            .client
            .request(
                Method::GET,
                &format!("{}?status=eq.{}&select=id", APPOINTMENTS, status),
                None,
            )
            .await?;
        Ok(rows.len() as u64)
    }
}

#[async_trait]
impl AdjustmentRepository for SupabaseStore {
    async fn insert_request(&self, request: AdjustmentRequest) -> Result<AdjustmentRequest> {
        self.insert(ADJUSTMENTS, &request).await
    }

    async fn find_request(&self, id: Uuid) -> Result<Option<AdjustmentRequest>> {
        self.select_one(&format!("{}?id=eq.{}", ADJUSTMENTS, id)).await
    }

    async fn save_request(&self, request: AdjustmentRequest) -> Result<AdjustmentRequest> {
        self.update(ADJUSTMENTS, request.id, &request).await
    }

    async fn requests_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<AdjustmentRequest>> {
        self.select(&format!(
            "{}?doctor_id=eq.{}&order=created_at.desc",
            ADJUSTMENTS, doctor_id
        ))
        .await
    }

    async fn all_requests(&self) -> Result<Vec<AdjustmentRequest>> {
        self.select(&format!("{}?order=created_at.desc", ADJUSTMENTS)).await
    }
}

#[async_trait]
impl DirectoryRepository for SupabaseStore {
    async fn insert_department(&self, department: Department) -> Result<Department> {
        self.insert(DEPARTMENTS, &department).await
    }

    async fn find_department(&self, id: Uuid) -> Result<Option<Department>> {
        self.select_one(&format!("{}?id=eq.{}", DEPARTMENTS, id)).await
    }

    async fn departments(&self) -> Result<Vec<Department>> {
        self.select(&format!("{}?order=name.asc", DEPARTMENTS)).await
    }

    async fn department_name_taken(&self, name: &str) -> Result<bool> {
        let rows: Vec<Value> = self
            .client
            .request(
                Method::GET,
                &format!("{}?name=ilike.{}&select=id", DEPARTMENTS, name.trim()),
                None,
            )
            .await?;
        Ok(!rows.is_empty())
    }

    async fn insert_doctor(&self, doctor: Doctor) -> Result<Doctor> {
        self.insert(DOCTORS, &doctor).await
    }

    async fn find_doctor(&self, id: Uuid) -> Result<Option<Doctor>> {
        self.select_one(&format!("{}?id=eq.{}", DOCTORS, id)).await
    }

    async fn doctors(&self) -> Result<Vec<Doctor>> {
        self.select(&format!("{}?order=name.asc", DOCTORS)).await
    }

    async fn doctors_in_department(&self, department_id: Uuid) -> Result<Vec<Doctor>> {
        self.select(&format!(
            "{}?department_id=eq.{}&order=name.asc",
            DOCTORS, department_id
        ))
        .await
    }

    async fn delete_doctor(&self, id: Uuid) -> Result<bool> {
        Ok(self.delete_where(DOCTORS, &format!("id=eq.{}", id)).await? > 0)
    }

    async fn find_patient(&self, id: Uuid) -> Result<Option<Patient>> {
        self.select_one(&format!("{}?id=eq.{}", PATIENTS, id)).await
    }

    async fn save_patient(&self, patient: Patient) -> Result<Patient> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation,resolution=merge-duplicates"),
        );
        let rows: Vec<Value> = self
            .client
            .request_with_headers(
                Method::POST,
                PATIENTS,
                Some(serde_json::to_value(&patient)?),
                Some(headers),
            )
            .await?;
        let first = rows
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Upsert into patients returned no rows"))?;
        Ok(serde_json::from_value(first)?)
    }

    async fn count_patients(&self) -> Result<u64> {
        let rows: Vec<Value> = self
            .client
            .request(Method::GET, &format!("{}?select=id", PATIENTS), None)
            .await?;
        Ok(rows.len() as u64)
    }
}
