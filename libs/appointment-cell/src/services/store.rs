use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_database::{DocumentStoreClient, StoreError};

use crate::models::{Appointment, AppointmentError, CancelledBy, DoctorProfile};

/// Storage contract for the slot allocator.
///
/// `reserve_slot` is the concurrency hardening: the (doctor, date, time)
/// key is inserted conditionally, so two overlapping bookings for the
/// same slot cannot both pass the check-then-insert sequence.
#[async_trait]
pub trait SchedulingStore: Send + Sync {
    async fn find_doctor(&self, doctor_id: &str) -> Result<Option<DoctorProfile>, AppointmentError>;

    async fn appointments_for_day(
        &self,
        doctor_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, AppointmentError>;

    /// Conditional insert of the slot key; fails with `SlotTaken` when a
    /// concurrent booking already holds it.
    async fn reserve_slot(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        time: &str,
    ) -> Result<(), AppointmentError>;

    async fn release_slot(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        time: &str,
    ) -> Result<(), AppointmentError>;

    async fn insert_appointment(&self, appointment: &Appointment) -> Result<(), AppointmentError>;

    async fn find_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Option<Appointment>, AppointmentError>;

    async fn mark_cancelled(
        &self,
        appointment_id: Uuid,
        reason: &str,
        cancelled_by: CancelledBy,
        cancelled_at: DateTime<Utc>,
    ) -> Result<(), AppointmentError>;
}

fn store_unavailable(e: StoreError) -> AppointmentError {
    AppointmentError::StoreUnavailable(e.to_string())
}

fn slot_key(doctor_id: &str, date: NaiveDate, time: &str) -> String {
    format!("{}:{}:{}", doctor_id, date, time)
}

pub struct DocumentSchedulingStore {
    store: Arc<DocumentStoreClient>,
}

impl DocumentSchedulingStore {
    pub fn new(store: Arc<DocumentStoreClient>) -> Self {
        Self { store }
    }

    fn representation_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }
}

#[async_trait]
impl SchedulingStore for DocumentSchedulingStore {
    async fn find_doctor(&self, doctor_id: &str) -> Result<Option<DoctorProfile>, AppointmentError> {
        let path = format!("/rest/v1/doctors?doctorId=eq.{}&limit=1", doctor_id);
        let result: Vec<DoctorProfile> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(store_unavailable)?;

        Ok(result.into_iter().next())
    }

    async fn appointments_for_day(
        &self,
        doctor_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?doctorId=eq.{}&date=eq.{}",
            doctor_id, date
        );
        self.store
            .request(Method::GET, &path, None)
            .await
            .map_err(store_unavailable)
    }

    async fn reserve_slot(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        time: &str,
    ) -> Result<(), AppointmentError> {
        let body = json!({
            "slotKey": slot_key(doctor_id, date, time),
            "doctorId": doctor_id,
            "date": date,
            "time": time,
            "reservedAt": Utc::now().to_rfc3339(),
        });

        let result: Result<Vec<Value>, StoreError> = self
            .store
            .request_with_headers(
                Method::POST,
                "/rest/v1/slot_reservations",
                Some(body),
                Some(Self::representation_headers()),
            )
            .await;

        match result {
            Ok(_) => {
                debug!("Reserved slot {} for doctor {}", time, doctor_id);
                Ok(())
            }
            // The unique key on slotKey turns a lost race into a conflict.
            Err(e) if e.is_conflict() => Err(AppointmentError::SlotTaken),
            Err(e) => Err(store_unavailable(e)),
        }
    }

    async fn release_slot(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        time: &str,
    ) -> Result<(), AppointmentError> {
        let path = format!(
            "/rest/v1/slot_reservations?slotKey=eq.{}",
            slot_key(doctor_id, date, time)
        );

        let _: Vec<Value> = self
            .store
            .request_with_headers(
                Method::DELETE,
                &path,
                None,
                Some(Self::representation_headers()),
            )
            .await
            .map_err(store_unavailable)?;

        Ok(())
    }

    async fn insert_appointment(&self, appointment: &Appointment) -> Result<(), AppointmentError> {
        let _: Vec<Value> = self
            .store
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(json!(appointment)),
                Some(Self::representation_headers()),
            )
            .await
            .map_err(store_unavailable)?;

        Ok(())
    }

    async fn find_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Option<Appointment>, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}&limit=1", appointment_id);
        let result: Vec<Appointment> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(store_unavailable)?;

        Ok(result.into_iter().next())
    }

    async fn mark_cancelled(
        &self,
        appointment_id: Uuid,
        reason: &str,
        cancelled_by: CancelledBy,
        cancelled_at: DateTime<Utc>,
    ) -> Result<(), AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let body = json!({
            "status": "cancelled",
            "cancellationReason": reason,
            "cancelledBy": cancelled_by,
            "cancelledAt": cancelled_at.to_rfc3339(),
        });

        let result: Vec<Value> = self
            .store
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(body),
                Some(Self::representation_headers()),
            )
            .await
            .map_err(store_unavailable)?;

        if result.is_empty() {
            return Err(AppointmentError::NotFound);
        }

        Ok(())
    }
}
