use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::Sqlite;
use serde::{Deserialize, Serialize};

/// Returned when a stored or submitted label does not name a known variant.
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

/// Maps a fieldless enum onto a lowercase `TEXT` column.
macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(UnknownVariant {
                        kind: $kind,
                        value: value.to_owned(),
                    }),
                }
            }
        }

        impl ToSql<Text, Sqlite> for $name {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
                out.set_value(self.as_str());
                Ok(IsNull::No)
            }
        }

        impl FromSql<Text, Sqlite> for $name {
            fn from_sql(bytes: <Sqlite as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
                let value = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
                Ok(value.parse()?)
            }
        }
    };
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
    Customer,
}

text_enum!(Role, "role", {
    Admin => "admin",
    Staff => "staff",
    Customer => "customer",
});

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    AsExpression,
    FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    #[default]
    Available,
    Booked,
    UnderMaintenance,
}

text_enum!(RoomStatus, "room status", {
    Available => "available",
    Booked => "booked",
    UnderMaintenance => "under_maintenance",
});

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone_number: String,
    pub role: Role,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone_number: String,
    pub role: Role,
}

#[derive(serde::Serialize, Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = crate::schema::properties)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Property {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub description: String,
    pub contact_number: String,
}

#[derive(serde::Deserialize, Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::properties)]
pub struct NewProperty {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub contact_number: String,
}

#[derive(serde::Serialize, Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = crate::schema::rooms)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Room {
    pub id: i32,
    pub property_id: i32,
    pub room_name: String,
    pub room_type: String,
    pub price_per_night: f64,
    pub status: RoomStatus,
}

#[derive(serde::Deserialize, Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::rooms)]
pub struct NewRoom {
    pub property_id: i32,
    pub room_name: String,
    pub room_type: String,
    pub price_per_night: f64,
    #[serde(default)]
    pub status: RoomStatus,
}

/// One row of a room search: the room joined with its property's name.
#[derive(serde::Serialize, Debug, Clone, PartialEq, Queryable)]
pub struct RoomListing {
    pub room_id: i32,
    pub property_name: String,
    pub room_name: String,
    pub room_type: String,
    pub price_per_night: f64,
    pub status: RoomStatus,
}

#[derive(serde::Serialize, Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = crate::schema::bookings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Booking {
    pub id: i32,
    pub user_id: i32,
    pub room_id: i32,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub total_price: f64,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::bookings)]
pub struct NewBooking {
    pub user_id: i32,
    pub room_id: i32,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub total_price: f64,
}

#[derive(serde::Serialize, Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = crate::schema::payments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Payment {
    pub id: i32,
    pub booking_id: i32,
    pub payment_method: String,
    pub payment_status: String,
    pub payment_date: NaiveDateTime,
    pub amount: f64,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::payments)]
pub struct NewPayment {
    pub booking_id: i32,
    pub payment_method: String,
    pub payment_status: String,
    pub payment_date: NaiveDateTime,
    pub amount: f64,
}
