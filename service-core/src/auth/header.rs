use super::AuthError;

/// Pulls the token out of an `Authorization: Bearer <token>` value.
pub fn extract_bearer(header: &str) -> Result<&str, AuthError> {
    if header.is_empty() {
        return Err(AuthError::MissingCredential);
    }

    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::MalformedHeader),
    }
}
