// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::DocumentStoreClient;

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, BookSlotRequest, CancelSlotRequest,
    DAILY_SLOTS, MAX_DAILY_APPOINTMENTS,
};
use crate::services::store::{DocumentSchedulingStore, SchedulingStore};

/// Enforces the per-day capacity and per-slot uniqueness invariants when
/// creating appointments.
pub struct SlotBookingService {
    store: Arc<dyn SchedulingStore>,
}

impl SlotBookingService {
    pub fn new(store: Arc<dyn SchedulingStore>) -> Self {
        Self { store }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let client = Arc::new(DocumentStoreClient::new(config));
        Self::new(Arc::new(DocumentSchedulingStore::new(client)))
    }

    pub async fn book_slot(
        &self,
        request: BookSlotRequest,
    ) -> Result<Appointment, AppointmentError> {
        if request.patient_id.trim().is_empty()
            || request.doctor_id.trim().is_empty()
            || request.time.trim().is_empty()
            || request.reason.trim().is_empty()
        {
            return Err(AppointmentError::ValidationError(
                "Missing required appointment fields".to_string(),
            ));
        }

        match self.store.find_doctor(&request.doctor_id).await? {
            Some(doctor) if doctor.is_approved => {}
            _ => return Err(AppointmentError::DoctorNotFound),
        }

        let booked: Vec<Appointment> = self
            .store
            .appointments_for_day(&request.doctor_id, request.date)
            .await?
            .into_iter()
            .filter(|appointment| !appointment.is_cancelled())
            .collect();

        // Capacity is checked before the slot itself so a full day reads
        // as fully booked whatever time was asked for.
        if booked.len() >= MAX_DAILY_APPOINTMENTS {
            return Err(AppointmentError::DoctorFullyBooked);
        }

        if !DAILY_SLOTS.contains(&request.time.as_str()) {
            return Err(AppointmentError::ValidationError(format!(
                "time must be one of {:?}",
                DAILY_SLOTS
            )));
        }

        if booked.iter().any(|appointment| appointment.time == request.time) {
            return Err(AppointmentError::SlotTaken);
        }

        // Conditional reservation closes the race between two concurrent
        // bookings that both passed the checks above.
        self.store
            .reserve_slot(&request.doctor_id, request.date, &request.time)
            .await?;

        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: request.patient_id,
            doctor_id: request.doctor_id,
            date: request.date,
            time: request.time,
            reason: request.reason,
            status: AppointmentStatus::Confirmed,
            created_at: Utc::now(),
            cancellation_reason: None,
            cancelled_by: None,
            cancelled_at: None,
        };

        if let Err(e) = self.store.insert_appointment(&appointment).await {
            if let Err(release_err) = self
                .store
                .release_slot(&appointment.doctor_id, appointment.date, &appointment.time)
                .await
            {
                warn!(
                    "Failed to release reservation {}/{}/{} after insert failure: {}",
                    appointment.doctor_id, appointment.date, appointment.time, release_err
                );
            }
            return Err(e);
        }

        info!(
            "Appointment {} booked with doctor {} on {} at {}",
            appointment.id, appointment.doctor_id, appointment.date, appointment.time
        );
        Ok(appointment)
    }

    pub async fn cancel_slot(
        &self,
        appointment_id: Uuid,
        request: CancelSlotRequest,
    ) -> Result<Appointment, AppointmentError> {
        if request.reason.trim().is_empty() {
            return Err(AppointmentError::ValidationError(
                "reason is required".to_string(),
            ));
        }

        let appointment = self
            .store
            .find_appointment(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        // A replayed cancellation is a no-op.
        if appointment.is_cancelled() {
            return Ok(appointment);
        }

        let cancelled_at = Utc::now();
        self.store
            .mark_cancelled(appointment_id, &request.reason, request.cancelled_by, cancelled_at)
            .await?;

        if let Err(e) = self
            .store
            .release_slot(&appointment.doctor_id, appointment.date, &appointment.time)
            .await
        {
            warn!(
                "Failed to release reservation for cancelled appointment {}: {}",
                appointment_id, e
            );
        }

        info!(
            "Appointment {} cancelled by {}",
            appointment_id, request.cancelled_by
        );

        let mut cancelled = appointment;
        cancelled.status = AppointmentStatus::Cancelled;
        cancelled.cancellation_reason = Some(request.reason);
        cancelled.cancelled_by = Some(request.cancelled_by);
        cancelled.cancelled_at = Some(cancelled_at);
        Ok(cancelled)
    }

    /// Fixed slot set minus booked non-cancelled times, order preserved.
    pub async fn available_slots(
        &self,
        doctor_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<String>, AppointmentError> {
        let booked: Vec<String> = self
            .store
            .appointments_for_day(doctor_id, date)
            .await?
            .into_iter()
            .filter(|appointment| !appointment.is_cancelled())
            .map(|appointment| appointment.time)
            .collect();

        Ok(DAILY_SLOTS
            .iter()
            .filter(|slot| !booked.iter().any(|b| b == *slot))
            .map(|slot| slot.to_string())
            .collect())
    }
}
