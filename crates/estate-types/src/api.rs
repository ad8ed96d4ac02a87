use serde::{Deserialize, Serialize};

use crate::models::{Activity, Buyer, ChatMessage, Property, Role, Seller, UserProfile};

// -- JWT Claims --

/// Identity carried by every bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub role: Role,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

// -- Profile --

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct ProfileUpdateResponse {
    pub message: String,
    pub user: UserProfile,
}

// -- Leads --

/// Body of add/update buyer. Every field is optional on the wire so the
/// handler can name the missing one instead of failing deserialization.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BuyerRequest {
    pub name: Option<String>,
    pub budget: Option<String>,
    pub location: Option<String>,
    pub property_type: Option<String>,
    pub contact: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SellerRequest {
    pub name: Option<String>,
    pub property_type: Option<String>,
    pub location: Option<String>,
    pub price: Option<String>,
    pub contact: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BuyerListResponse {
    pub buyers: Vec<Buyer>,
}

#[derive(Debug, Serialize)]
pub struct BuyerResponse {
    pub success: bool,
    pub buyer: Buyer,
}

#[derive(Debug, Serialize)]
pub struct SellerListResponse {
    pub sellers: Vec<Seller>,
}

#[derive(Debug, Serialize)]
pub struct SellerResponse {
    pub success: bool,
    pub seller: Seller,
}

#[derive(Debug, Serialize)]
pub struct PropertyListResponse {
    pub properties: Vec<Property>,
}

#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub activity: Vec<Activity>,
}

// -- Chat --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub session_id: String,
    pub reply: String,
    pub intent: String,
    pub automation: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistoryQuery {
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatHistoryResponse {
    pub messages: Vec<ChatMessage>,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
