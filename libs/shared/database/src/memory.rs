use std::collections::HashMap;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_models::directory::{Department, Doctor, Patient};
use shared_models::scheduling::{
    AdjustmentRequest, Appointment, AppointmentStatus, DayOfWeek, ScheduleBlock,
};

use crate::repository::{
    AdjustmentRepository, AppointmentRepository, DirectoryRepository, ScheduleRepository,
};

/// Process-local relational store. Each table sits behind its own
/// `RwLock`; reads return owned copies.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    blocks: RwLock<HashMap<Uuid, ScheduleBlock>>,
    appointments: RwLock<HashMap<Uuid, Appointment>>,
    requests: RwLock<HashMap<Uuid, AdjustmentRequest>>,
    departments: RwLock<HashMap<Uuid, Department>>,
    doctors: RwLock<HashMap<Uuid, Doctor>>,
    patients: RwLock<HashMap<Uuid, Patient>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_blocks(mut blocks: Vec<ScheduleBlock>) -> Vec<ScheduleBlock> {
    blocks.sort_by(|a, b| {
        a.day_of_week
            .cmp(&b.day_of_week)
            .then(a.start_time.cmp(&b.start_time))
    });
    blocks
}

fn sort_appointments(mut appointments: Vec<Appointment>) -> Vec<Appointment> {
    appointments.sort_by(|a, b| {
        a.appointment_time
            .cmp(&b.appointment_time)
            .then(a.created_at.cmp(&b.created_at))
    });
    appointments
}

fn newest_first(mut requests: Vec<AdjustmentRequest>) -> Vec<AdjustmentRequest> {
    requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    requests
}

#[async_trait]
impl ScheduleRepository for InMemoryStore {
    async fn insert_block(&self, block: ScheduleBlock) -> Result<ScheduleBlock> {
        let mut blocks = self.blocks.write().await;
        if blocks.contains_key(&block.id) {
            return Err(anyhow!("Schedule block {} already exists", block.id));
        }
        debug!("Inserting schedule block {}", block.id);
        blocks.insert(block.id, block.clone());
        Ok(block)
    }

    async fn find_block(&self, id: Uuid) -> Result<Option<ScheduleBlock>> {
        Ok(self.blocks.read().await.get(&id).cloned())
    }

    async fn save_block(&self, block: ScheduleBlock) -> Result<ScheduleBlock> {
        let mut blocks = self.blocks.write().await;
        match blocks.get_mut(&block.id) {
            Some(existing) => {
                *existing = block.clone();
                Ok(block)
            }
            None => Err(anyhow!("Schedule block {} does not exist", block.id)),
        }
    }

    async fn delete_block(&self, id: Uuid) -> Result<bool> {
        Ok(self.blocks.write().await.remove(&id).is_some())
    }

    async fn blocks_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<ScheduleBlock>> {
        let blocks = self.blocks.read().await;
        Ok(sort_blocks(
            blocks.values().filter(|b| b.doctor_id == doctor_id).cloned().collect(),
        ))
    }

    async fn blocks_for_doctor_on(&self, doctor_id: Uuid, day: DayOfWeek) -> Result<Vec<ScheduleBlock>> {
        let blocks = self.blocks.read().await;
        Ok(sort_blocks(
            blocks
                .values()
                .filter(|b| b.doctor_id == doctor_id && b.day_of_week == day)
                .cloned()
                .collect(),
        ))
    }

    async fn delete_blocks_for_doctor(&self, doctor_id: Uuid) -> Result<usize> {
        let mut blocks = self.blocks.write().await;
        let before = blocks.len();
        blocks.retain(|_, b| b.doctor_id != doctor_id);
        Ok(before - blocks.len())
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryStore {
    async fn insert_appointment(&self, appointment: Appointment) -> Result<Appointment> {
        let mut appointments = self.appointments.write().await;
        if appointments.contains_key(&appointment.id) {
            return Err(anyhow!("Appointment {} already exists", appointment.id));
        }
        appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn find_appointment(&self, id: Uuid) -> Result<Option<Appointment>> {
        Ok(self.appointments.read().await.get(&id).cloned())
    }

    async fn save_appointment(&self, appointment: Appointment) -> Result<Appointment> {
        let mut appointments = self.appointments.write().await;
        match appointments.get_mut(&appointment.id) {
            Some(existing) => {
                *existing = appointment.clone();
                Ok(appointment)
            }
            None => Err(anyhow!("Appointment {} does not exist", appointment.id)),
        }
    }

    async fn appointments_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<Appointment>> {
        let appointments = self.appointments.read().await;
        Ok(sort_appointments(
            appointments.values().filter(|a| a.doctor_id == doctor_id).cloned().collect(),
        ))
    }

    async fn appointments_for_patient(&self, patient_id: Uuid) -> Result<Vec<Appointment>> {
        let appointments = self.appointments.read().await;
        Ok(sort_appointments(
            appointments.values().filter(|a| a.patient_id == patient_id).cloned().collect(),
        ))
    }

    async fn appointments_for_doctor_between(
        &self,
        doctor_id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Appointment>> {
        let appointments = self.appointments.read().await;
        Ok(sort_appointments(
            appointments
                .values()
                .filter(|a| {
                    a.doctor_id == doctor_id
                        && a.appointment_time >= start
                        && a.appointment_time < end
                })
                .cloned()
                .collect(),
        ))
    }

    async fn appointments_between(&self, start: NaiveDateTime, end: NaiveDateTime) -> Result<Vec<Appointment>> {
        let appointments = self.appointments.read().await;
        Ok(sort_appointments(
            appointments
                .values()
                .filter(|a| a.appointment_time >= start && a.appointment_time < end)
                .cloned()
                .collect(),
        ))
    }

    async fn count_appointments_with_status(&self, status: AppointmentStatus) -> Result<u64> {
        let appointments = self.appointments.read().await;
        Ok(appointments.values().filter(|a| a.status == status).count() as u64)
    }
}

#[async_trait]
impl AdjustmentRepository for InMemoryStore {
    async fn insert_request(&self, request: AdjustmentRequest) -> Result<AdjustmentRequest> {
        let mut requests = self.requests.write().await;
        if requests.contains_key(&request.id) {
            return Err(anyhow!("Adjustment request {} already exists", request.id));
        }
        requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn find_request(&self, id: Uuid) -> Result<Option<AdjustmentRequest>> {
        Ok(self.requests.read().await.get(&id).cloned())
    }

    async fn save_request(&self, request: AdjustmentRequest) -> Result<AdjustmentRequest> {
        let mut requests = self.requests.write().await;
        match requests.get_mut(&request.id) {
            Some(existing) => {
                *existing = request.clone();
                Ok(request)
            }
            None => Err(anyhow!("Adjustment request {} does not exist", request.id)),
        }
    }

    async fn requests_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<AdjustmentRequest>> {
        let requests = self.requests.read().await;
        Ok(newest_first(
            requests.values().filter(|r| r.doctor_id == doctor_id).cloned().collect(),
        ))
    }

    async fn all_requests(&self) -> Result<Vec<AdjustmentRequest>> {
        Ok(newest_first(self.requests.read().await.values().cloned().collect()))
    }
}

#[async_trait]
impl DirectoryRepository for InMemoryStore {
    async fn insert_department(&self, department: Department) -> Result<Department> {
        let mut departments = self.departments.write().await;
        if departments.values().any(|d| d.name.eq_ignore_ascii_case(&department.name)) {
            return Err(anyhow!("Department name '{}' already exists", department.name));
        }
        departments.insert(department.id, department.clone());
        Ok(department)
    }

    async fn find_department(&self, id: Uuid) -> Result<Option<Department>> {
        Ok(self.departments.read().await.get(&id).cloned())
    }

    async fn departments(&self) -> Result<Vec<Department>> {
        let mut departments: Vec<Department> =
            self.departments.read().await.values().cloned().collect();
        departments.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(departments)
    }

    async fn department_name_taken(&self, name: &str) -> Result<bool> {
        let departments = self.departments.read().await;
        Ok(departments.values().any(|d| d.name.eq_ignore_ascii_case(name.trim())))
    }

    async fn insert_doctor(&self, doctor: Doctor) -> Result<Doctor> {
        self.doctors.write().await.insert(doctor.id, doctor.clone());
        Ok(doctor)
    }

    async fn find_doctor(&self, id: Uuid) -> Result<Option<Doctor>> {
        Ok(self.doctors.read().await.get(&id).cloned())
    }

    async fn doctors(&self) -> Result<Vec<Doctor>> {
        let mut doctors: Vec<Doctor> = self.doctors.read().await.values().cloned().collect();
        doctors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(doctors)
    }

    async fn doctors_in_department(&self, department_id: Uuid) -> Result<Vec<Doctor>> {
        let mut doctors: Vec<Doctor> = self
            .doctors
            .read()
            .await
            .values()
            .filter(|d| d.department_id == Some(department_id))
            .cloned()
            .collect();
        doctors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(doctors)
    }

    async fn delete_doctor(&self, id: Uuid) -> Result<bool> {
        Ok(self.doctors.write().await.remove(&id).is_some())
    }

    async fn find_patient(&self, id: Uuid) -> Result<Option<Patient>> {
        Ok(self.patients.read().await.get(&id).cloned())
    }

    async fn save_patient(&self, patient: Patient) -> Result<Patient> {
        self.patients.write().await.insert(patient.id, patient.clone());
        Ok(patient)
    }

    async fn count_patients(&self) -> Result<u64> {
        Ok(self.patients.read().await.len() as u64)
    }
}
