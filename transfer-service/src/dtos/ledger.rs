use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccountRequest {
    #[serde(rename = "nationalID")]
    #[validate(length(min = 12, message = "National ID must be at least 12 characters"))]
    pub national_id: String,
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    #[serde(rename = "senderID")]
    pub sender_id: i64,
    #[serde(rename = "receiverID")]
    pub receiver_id: i64,
    pub amount: i64,
}

#[derive(Debug, Deserialize)]
pub struct IncrementRequest {
    #[serde(rename = "accountID")]
    pub account_id: i64,
    pub amount: i64,
}
