//! JSON body extractor that also runs `validator` rules.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::util::error::HandlerError;

/// Rejects malformed bodies and failed validation with a 400 in the usual error envelope.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HandlerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| HandlerError::bad_request(e.body_text()))?;

        value
            .validate()
            .map_err(|e| HandlerError::bad_request(format_validation_errors(&e)))?;

        Ok(ValidatedJson(value))
    }
}

/// Joins the per-field messages, falling back to `<field> is invalid`.
pub fn format_validation_errors(errors: &validator::ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect();
    messages.sort();
    messages.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Credentials {
        #[validate(email(message = "Please enter a valid email"))]
        email: String,
        #[validate(length(min = 8))]
        password: String,
    }

    #[test]
    fn test_format_validation_errors() {
        let credentials = Credentials { email: "nope".into(), password: "short".into() };
        let errors = credentials.validate().unwrap_err();
        assert_eq!(
            format_validation_errors(&errors),
            "Please enter a valid email, password is invalid"
        );
    }
}
