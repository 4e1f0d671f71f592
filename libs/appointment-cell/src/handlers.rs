// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;

use shared_database::AppState;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    validate_date_format, AppointmentStatus, BookingError, CreateAppointmentRequest, DateQuery,
    UpdateStatusRequest,
};
use crate::services::booking::BookingService;

/// Map service errors onto HTTP kinds at the boundary; the service itself
/// stays HTTP-free.
fn map_booking_error(err: BookingError) -> AppError {
    match err {
        BookingError::InvalidSlotTime(msg) => AppError::BadRequest(msg),
        BookingError::PastDate
        | BookingError::BeyondBookingHorizon
        | BookingError::InvalidStateTransition
        | BookingError::InvalidStatus => AppError::BadRequest(err.to_string()),
        BookingError::DuplicateBooking | BookingError::SlotTaken => {
            AppError::Conflict(err.to_string())
        }
        BookingError::NoAppointmentsFound | BookingError::NotFound => {
            AppError::NotFound(err.to_string())
        }
        BookingError::Forbidden => AppError::Forbidden(err.to_string()),
        BookingError::Store(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate().map_err(AppError::BadRequest)?;

    let booking_service = BookingService::new(Arc::clone(&state.store));

    let appointment = booking_service
        .create_appointment(user.id, &request.date, &request.time)
        .await
        .map_err(map_booking_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "ok": true,
            "status": 201,
            "message": "Appointment booked successfully",
            "data": appointment,
        })),
    ))
}

#[axum::debug_handler]
pub async fn get_user_appointments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, AppError> {
    let booking_service = BookingService::new(Arc::clone(&state.store));

    let appointments = booking_service
        .list_for_user(user.id)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "ok": true,
        "status": 200,
        "message": "User appointments retrieved successfully",
        "data": appointments,
    })))
}

#[axum::debug_handler]
pub async fn get_appointments_by_date(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Query(query): Query<DateQuery>,
) -> Result<impl IntoResponse, AppError> {
    validate_date_format(&query.date).map_err(AppError::BadRequest)?;

    let booking_service = BookingService::new(Arc::clone(&state.store));

    let listing = booking_service
        .list_by_date(&query.date, user.is_admin)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "ok": true,
        "status": 200,
        "message": "Appointments retrieved successfully",
        "data": listing,
    })))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let status = AppointmentStatus::parse(&request.status)
        .ok_or_else(|| map_booking_error(BookingError::InvalidStatus))?;

    let booking_service = BookingService::new(Arc::clone(&state.store));

    let appointment = booking_service
        .update_status(appointment_id, user.id, user.is_admin, status)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "ok": true,
        "status": 200,
        "message": "Appointment updated successfully",
        "data": appointment,
    })))
}
