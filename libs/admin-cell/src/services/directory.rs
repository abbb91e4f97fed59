// libs/admin-cell/src/services/directory.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use schedule_cell::services::engine::SchedulingEngine;
use shared_database::HospitalStore;
use shared_models::directory::{Department, Doctor};

use crate::models::{AdminError, CreateDepartmentRequest, CreateDoctorRequest};

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Department and doctor directory maintained by administrators.
pub struct DirectoryService {
    store: Arc<dyn HospitalStore>,
    engine: SchedulingEngine,
}

impl DirectoryService {
    pub fn new(store: Arc<dyn HospitalStore>) -> Self {
        Self {
            engine: SchedulingEngine::new(store.clone()),
            store,
        }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_department(&self, request: CreateDepartmentRequest) -> Result<Department, AdminError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(AdminError::Validation("Department name is required".to_string()));
        }
        if self.store.department_name_taken(name).await? {
            return Err(AdminError::Validation("Department name already exists".to_string()));
        }

        let now = Utc::now();
        let department = self
            .store
            .insert_department(Department {
                id: Uuid::new_v4(),
                name: name.to_string(),
                description: non_blank(request.description),
                created_at: now,
                updated_at: now,
            })
            .await?;

        info!("Created department {}", department.id);
        Ok(department)
    }

    pub async fn departments(&self) -> Result<Vec<Department>, AdminError> {
        Ok(self.store.departments().await?)
    }

    pub async fn doctors_in_department(&self, department_id: Uuid) -> Result<Vec<Doctor>, AdminError> {
        self.require_department(department_id).await?;
        Ok(self.store.doctors_in_department(department_id).await?)
    }

    #[instrument(skip(self, request), fields(department_id = %request.department_id))]
    pub async fn create_doctor(&self, request: CreateDoctorRequest) -> Result<Doctor, AdminError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(AdminError::Validation("Doctor name is required".to_string()));
        }
        self.require_department(request.department_id).await?;

        let now = Utc::now();
        let doctor = self
            .store
            .insert_doctor(Doctor {
                id: Uuid::new_v4(),
                name: name.to_string(),
                phone: non_blank(request.phone),
                title: non_blank(request.title),
                department_id: Some(request.department_id),
                created_at: now,
                updated_at: now,
            })
            .await?;

        info!("Created doctor {}", doctor.id);
        Ok(doctor)
    }

    pub async fn doctors(&self) -> Result<Vec<Doctor>, AdminError> {
        Ok(self.store.doctors().await?)
    }

    /// Removes a doctor together with every schedule block they own.
    /// Appointments stay untouched.
    #[instrument(skip(self))]
    pub async fn delete_doctor(&self, doctor_id: Uuid) -> Result<(), AdminError> {
        if self.store.find_doctor(doctor_id).await?.is_none() {
            return Err(AdminError::NotFound("Doctor not found".to_string()));
        }

        let removed = self.engine.remove_doctor_schedule(doctor_id).await?;
        self.store.delete_doctor(doctor_id).await?;

        info!("Deleted doctor {} and {} schedule blocks", doctor_id, removed);
        Ok(())
    }

    async fn require_department(&self, department_id: Uuid) -> Result<Department, AdminError> {
        self.store
            .find_department(department_id)
            .await?
            .ok_or_else(|| AdminError::NotFound("Department not found".to_string()))
    }
}
