//! The multi-room booking transaction.
//!
//! A request is validated up front, then every line item is priced and
//! written inside one SQLite transaction together with the payment rows.
//! Any error drops the whole transaction, so a request either leaves all of
//! its bookings and payments behind or none of them.

use chrono::{NaiveDate, Utc};
use diesel::prelude::*;

use crate::dtos::BookingRequest;
use crate::models::{NewBooking, NewPayment};
use crate::schema::{bookings, payments, rooms};

pub const PAYMENT_COMPLETED: &str = "completed";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{0}")]
    Invalid(String),
    #[error("Room with id {0} not found")]
    RoomNotFound(i32),
    #[error("Error creating booking: {0}")]
    Database(#[from] diesel::result::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookingReceipt {
    pub booking_ids: Vec<i32>,
    pub total_price: f64,
}

/// The validated stay: both dates and the whole nights between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stay {
    check_in: NaiveDate,
    check_out: NaiveDate,
    nights: i64,
}

fn validate(request: &BookingRequest) -> Result<Stay, BookingError> {
    if request.customer_id <= 0 {
        return Err(BookingError::Invalid("customer_id must be a positive integer".into()));
    }
    if request.booking_details.is_empty() {
        return Err(BookingError::Invalid("booking_details cannot be empty".into()));
    }
    if request.check_in_date.trim().is_empty() || request.check_out_date.trim().is_empty() {
        return Err(BookingError::Invalid(
            "check_in_date and check_out_date are required".into(),
        ));
    }
    if request.payment_details.total_amount <= 0.0 {
        return Err(BookingError::Invalid("total_amount must be greater than zero".into()));
    }
    if let Some(item) = request.booking_details.iter().find(|item| item.quantity <= 0) {
        return Err(BookingError::Invalid(format!(
            "quantity for room {} must be greater than zero",
            item.room_id
        )));
    }

    let check_in = parse_date("check_in_date", &request.check_in_date)?;
    let check_out = parse_date("check_out_date", &request.check_out_date)?;
    if check_out <= check_in {
        return Err(BookingError::Invalid(
            "check_out_date must be after check_in_date".into(),
        ));
    }
    let nights = (check_out - check_in).num_hours() / 24;

    Ok(Stay {
        check_in,
        check_out,
        nights,
    })
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, BookingError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| BookingError::Invalid(format!("{field} must be a date in YYYY-MM-DD format")))
}

/// Books every line item of `request` for its customer and records one
/// payment per booking row.
///
/// Each payment row carries the accumulated total of the whole request. The
/// caller-declared `total_amount` is only checked for positivity.
pub fn book_rooms(
    conn: &mut SqliteConnection,
    request: &BookingRequest,
) -> Result<BookingReceipt, BookingError> {
    let stay = validate(request)?;

    // Takes the write lock before the first price read.
    let receipt = conn.immediate_transaction::<_, BookingError, _>(|conn| {
        let mut total_price = 0.0;
        let mut booking_ids = Vec::with_capacity(request.booking_details.len());

        for item in &request.booking_details {
            let price_per_night: f64 = rooms::table
                .find(item.room_id)
                .select(rooms::price_per_night)
                .first(conn)
                .optional()?
                .ok_or(BookingError::RoomNotFound(item.room_id))?;

            let line_price = f64::from(item.quantity) * price_per_night * stay.nights as f64;
            total_price += line_price;

            let booking_id = diesel::insert_into(bookings::table)
                .values(NewBooking {
                    user_id: request.customer_id,
                    room_id: item.room_id,
                    check_in_date: stay.check_in,
                    check_out_date: stay.check_out,
                    total_price: line_price,
                })
                .returning(bookings::id)
                .get_result::<i32>(conn)?;
            booking_ids.push(booking_id);
        }

        let paid_at = Utc::now().naive_utc();
        let new_payments: Vec<NewPayment> = booking_ids
            .iter()
            .map(|&booking_id| NewPayment {
                booking_id,
                payment_method: request.payment_details.payment_method.clone(),
                payment_status: PAYMENT_COMPLETED.to_owned(),
                payment_date: paid_at,
                amount: total_price,
            })
            .collect();
        diesel::insert_into(payments::table)
            .values(&new_payments)
            .execute(conn)?;

        Ok(BookingReceipt {
            booking_ids,
            total_price,
        })
    })?;

    let declared = request.payment_details.total_amount;
    if (declared - receipt.total_price).abs() > f64::EPSILON {
        tracing::warn!(
            customer_id = request.customer_id,
            declared,
            computed = receipt.total_price,
            "declared payment total differs from the computed total"
        );
    }

    Ok(receipt)
}
