use axum::{
    extract::{FromRequest, State},
    http::StatusCode,
    response::Json,
    Extension,
};

use crate::auth;
use crate::booking;
use crate::catalog;
use crate::dtos::{
    BookingRequest, BookingResponse, LoginRequest, MessageResponse, RegisterRequest,
    SearchRoomsRequest, SearchRoomsResult, UpdateRoomStatusRequest,
};
use crate::error::ApiError;
use crate::middleware::Caller;
use crate::models::{NewProperty, NewRoom, NewUser};
use crate::state::AppState;
use crate::users;

/// `axum::Json` with body rejections reported as `400 Invalid request body`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

type Created = (StatusCode, Json<MessageResponse>);

pub async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<Created, ApiError> {
    if request.name.trim().is_empty()
        || request.email.trim().is_empty()
        || request.password.is_empty()
    {
        return Err(ApiError::BadRequest(
            "name, email and password are required".to_owned(),
        ));
    }

    let role = request.role;
    let user_id = state
        .with_conn(move |conn| {
            let password_hash = auth::hash_password(&request.password)
                .map_err(|_| ApiError::Internal("Error hashing password".to_owned()))?;
            let new_user = NewUser {
                name: request.name,
                email: request.email,
                password_hash,
                phone_number: request.phone_number,
                role: request.role,
            };
            users::insert_user(conn, &new_user)
                .map_err(|err| ApiError::Internal(format!("Error registering user: {err}")))
        })
        .await?;

    tracing::info!(user_id, %role, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered successfully").with_id(user_id)),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = state
        .with_conn(move |conn| {
            let user = users::find_by_email(conn, &request.email)
                .map_err(|_| ApiError::Internal("Error logging in".to_owned()))?;
            Ok(user.filter(|user| auth::verify_password(&request.password, &user.password_hash)))
        })
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_owned()))?;

    let token = state.tokens.issue(&user.email).map_err(|err| {
        tracing::error!(error = %err, "could not sign token");
        ApiError::Internal("Could not create JWT token".to_owned())
    })?;

    tracing::info!(user_id = user.id, "user logged in");
    Ok(Json(
        MessageResponse::new(format!(
            "Login successful. Welcome, {} (Role: {})",
            user.name, user.role
        ))
        .with_token(token),
    ))
}

pub async fn add_property(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    JsonBody(property): JsonBody<NewProperty>,
) -> Result<Created, ApiError> {
    let property_id = state
        .with_conn(move |conn| {
            catalog::insert_property(conn, &property)
                .map_err(|err| ApiError::Internal(format!("Error adding property: {err}")))
        })
        .await?;

    tracing::info!(property_id, by = %caller.email, "property added");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Property added successfully").with_id(property_id)),
    ))
}

pub async fn add_room(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    JsonBody(room): JsonBody<NewRoom>,
) -> Result<Created, ApiError> {
    if room.property_id <= 0 {
        return Err(ApiError::BadRequest(
            "property_id must be a positive integer".to_owned(),
        ));
    }
    if !room.price_per_night.is_finite() || room.price_per_night < 0.0 {
        return Err(ApiError::BadRequest(
            "price_per_night cannot be negative".to_owned(),
        ));
    }

    let room_id = state
        .with_conn(move |conn| {
            catalog::insert_room(conn, &room)
                .map_err(|err| ApiError::Internal(format!("Error adding room: {err}")))
        })
        .await?;

    tracing::info!(room_id, by = %caller.email, "room added");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Room added successfully").with_id(room_id)),
    ))
}

pub async fn update_room_status(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    JsonBody(request): JsonBody<UpdateRoomStatusRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let UpdateRoomStatusRequest { room_id, status } = request;
    let updated = state
        .with_conn(move |conn| {
            catalog::set_room_status(conn, room_id, status)
                .map_err(|err| ApiError::Internal(format!("Error updating room status: {err}")))
        })
        .await?;

    if updated == 0 {
        return Err(ApiError::NotFound(format!("Room with id {room_id} not found")));
    }

    tracing::info!(room_id, %status, by = %caller.email, "room status updated");
    Ok(Json(MessageResponse::new("Room status updated successfully")))
}

pub async fn search_rooms(
    State(state): State<AppState>,
    JsonBody(filter): JsonBody<SearchRoomsRequest>,
) -> Result<Json<SearchRoomsResult>, ApiError> {
    filter.validate()?;

    let rooms = state
        .with_conn(move |conn| Ok(catalog::search_rooms(conn, &filter)?))
        .await?;

    tracing::debug!(matches = rooms.len(), "room search");
    if rooms.is_empty() {
        return Ok(Json(SearchRoomsResult::Empty(MessageResponse::new(
            "No rooms found",
        ))));
    }
    Ok(Json(SearchRoomsResult::Rooms(rooms)))
}

pub async fn create_booking(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    JsonBody(request): JsonBody<BookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), ApiError> {
    let customer_id = request.customer_id;
    let receipt = state
        .with_conn(move |conn| Ok(booking::book_rooms(conn, &request)?))
        .await?;

    tracing::info!(
        customer_id,
        by = %caller.email,
        bookings = receipt.booking_ids.len(),
        total_price = receipt.total_price,
        "booking created"
    );
    Ok((
        StatusCode::CREATED,
        Json(BookingResponse {
            message: "Booking created successfully".to_owned(),
            booking_ids: receipt.booking_ids,
            total_price: receipt.total_price,
        }),
    ))
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
