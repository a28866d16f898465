use crate::models::{Role, RoomListing, RoomStatus};

#[derive(serde::Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone_number: String,
    pub role: Role,
}

#[derive(serde::Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(serde::Deserialize)]
pub struct UpdateRoomStatusRequest {
    pub room_id: i32,
    pub status: RoomStatus,
}

/// Room search filters. Absent or empty text filters match everything.
#[derive(serde::Deserialize, Debug, Clone, Default)]
pub struct SearchRoomsRequest {
    #[serde(default)]
    pub property_name: Option<String>,
    #[serde(default)]
    pub room_type: Option<String>,
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct LineItem {
    pub room_id: i32,
    pub quantity: i32,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct PaymentDetails {
    pub payment_method: String,
    pub total_amount: f64,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct BookingRequest {
    pub customer_id: i32,
    #[serde(default)]
    pub check_in_date: String,
    #[serde(default)]
    pub check_out_date: String,
    #[serde(default)]
    pub booking_details: Vec<LineItem>,
    pub payment_details: PaymentDetails,
}

#[derive(serde::Serialize, Debug)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            token: None,
            id: None,
        }
    }

    pub fn with_id(mut self, id: i32) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_token(mut self, token: String) -> Self {
        self.token = Some(token);
        self
    }
}

#[derive(serde::Serialize)]
#[serde(untagged)]
pub enum SearchRoomsResult {
    Rooms(Vec<RoomListing>),
    Empty(MessageResponse),
}

#[derive(serde::Serialize, Debug)]
pub struct BookingResponse {
    pub message: String,
    pub booking_ids: Vec<i32>,
    pub total_price: f64,
}
