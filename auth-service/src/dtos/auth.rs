use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "PascalCase")]
pub struct SignupRequest {
    #[validate(
        email(message = "Invalid email format"),
        length(min = 5, message = "Email must be at least 5 characters")
    )]
    pub email: String,

    #[validate(length(min = 5, message = "Password must be at least 5 characters"))]
    pub password: String,

    #[validate(length(min = 2, message = "First name must be at least 2 characters"))]
    pub first_name: String,

    #[validate(length(min = 2, message = "Last name must be at least 2 characters"))]
    pub last_name: String,

    #[serde(rename = "IIN")]
    #[validate(length(min = 12, message = "National ID must be at least 12 characters"))]
    pub national_id: String,

    #[validate(length(min = 11, message = "Phone must be at least 11 characters"))]
    pub phone: String,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub id: i64,
    pub message: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "PascalCase")]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup() -> SignupRequest {
        SignupRequest {
            email: "ada@example.com".to_string(),
            password: "s3cret".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            national_id: "901231123456".to_string(),
            phone: "77011234567".to_string(),
        }
    }

    #[test]
    fn test_valid_signup() {
        assert!(signup().validate().is_ok());
    }

    #[test]
    fn test_signup_field_minimums() {
        let mut req = signup();
        req.first_name = "A".to_string();
        assert!(req.validate().is_err());

        let mut req = signup();
        req.last_name = "L".to_string();
        assert!(req.validate().is_err());

        let mut req = signup();
        req.password = "1234".to_string();
        assert!(req.validate().is_err());

        let mut req = signup();
        req.national_id = "12345678901".to_string();
        assert!(req.validate().is_err());

        let mut req = signup();
        req.phone = "7701123456".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_signup_rejects_bad_email() {
        let mut req = signup();
        req.email = "not-an-email".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_signup_uses_wire_field_names() {
        let req: SignupRequest = serde_json::from_value(serde_json::json!({
            "Email": "ada@example.com",
            "Password": "s3cret",
            "FirstName": "Ada",
            "LastName": "Lovelace",
            "IIN": "901231123456",
            "Phone": "77011234567"
        }))
        .unwrap();

        assert_eq!(req.national_id, "901231123456");
        assert!(req.validate().is_ok());
    }
}
