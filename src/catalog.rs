//! Properties, rooms, and the room search query.

use diesel::prelude::*;

use crate::dtos::SearchRoomsRequest;
use crate::models::{NewProperty, NewRoom, RoomListing, RoomStatus};
use crate::schema::{properties, rooms};

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("min_price ({min}) cannot be greater than max_price ({max})")]
    InvalidPriceRange { min: f64, max: f64 },
    #[error("Error searching rooms: {0}")]
    Database(#[from] diesel::result::Error),
}

pub fn insert_property(conn: &mut SqliteConnection, property: &NewProperty) -> QueryResult<i32> {
    diesel::insert_into(properties::table)
        .values(property)
        .returning(properties::id)
        .get_result(conn)
}

pub fn insert_room(conn: &mut SqliteConnection, room: &NewRoom) -> QueryResult<i32> {
    diesel::insert_into(rooms::table)
        .values(room)
        .returning(rooms::id)
        .get_result(conn)
}

/// Returns the number of rooms updated (zero when the id is unknown).
pub fn set_room_status(
    conn: &mut SqliteConnection,
    room_id: i32,
    status: RoomStatus,
) -> QueryResult<usize> {
    diesel::update(rooms::table.find(room_id))
        .set(rooms::status.eq(status))
        .execute(conn)
}

impl SearchRoomsRequest {
    pub fn validate(&self) -> Result<(), SearchError> {
        match (self.min_price, self.max_price) {
            (Some(min), Some(max)) if min > max => Err(SearchError::InvalidPriceRange { min, max }),
            _ => Ok(()),
        }
    }
}

pub fn search_rooms(
    conn: &mut SqliteConnection,
    filter: &SearchRoomsRequest,
) -> Result<Vec<RoomListing>, SearchError> {
    filter.validate()?;

    let mut query = rooms::table
        .inner_join(properties::table)
        .select((
            rooms::id,
            properties::name,
            rooms::room_name,
            rooms::room_type,
            rooms::price_per_night,
            rooms::status,
        ))
        .order(rooms::id.asc())
        .into_boxed();

    if let Some(name) = non_empty(&filter.property_name) {
        query = query.filter(properties::name.like(contains_pattern(name)).escape('\\'));
    }
    if let Some(room_type) = non_empty(&filter.room_type) {
        query = query.filter(rooms::room_type.like(contains_pattern(room_type)).escape('\\'));
    }
    if let Some(min) = filter.min_price {
        query = query.filter(rooms::price_per_night.ge(min));
    }
    if let Some(max) = filter.max_price {
        query = query.filter(rooms::price_per_night.le(max));
    }

    Ok(query.load::<RoomListing>(conn)?)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// `%needle%` with LIKE wildcards in the needle escaped.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
