use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{AppointmentError, AvailableSlotsQuery, BookSlotRequest, CancelSlotRequest};
use crate::services::booking::SlotBookingService;

fn map_appointment_error(e: AppointmentError) -> AppError {
    let message = e.to_string();
    match e {
        AppointmentError::NotFound | AppointmentError::DoctorNotFound => {
            AppError::NotFound(message)
        }
        AppointmentError::DoctorFullyBooked | AppointmentError::SlotTaken => {
            AppError::Conflict(message)
        }
        AppointmentError::ValidationError(_) => AppError::Validation(message),
        AppointmentError::StoreUnavailable(_) => AppError::StoreUnavailable(message),
    }
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<BookSlotRequest>,
) -> Result<Json<Value>, AppError> {
    let booking_service = SlotBookingService::from_config(&config);

    let appointment = booking_service
        .book_slot(request)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "status": 201,
        "message": "Appointment booked successfully",
        "appointmentId": appointment.id,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(config): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<CancelSlotRequest>,
) -> Result<Json<Value>, AppError> {
    let booking_service = SlotBookingService::from_config(&config);

    let appointment = booking_service
        .cancel_slot(appointment_id, request)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "status": 200,
        "message": "Appointment cancelled successfully",
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn get_available_slots(
    State(config): State<Arc<AppConfig>>,
    Query(query): Query<AvailableSlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let booking_service = SlotBookingService::from_config(&config);

    let slots = booking_service
        .available_slots(&query.doctor_id, query.date)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "status": 200,
        "doctorId": query.doctor_id,
        "date": query.date,
        "availableSlots": slots
    })))
}
