//! Uniform response envelope: `{success, message?, data?, code?}`.

use serde::Serialize;
use taskhive_core::FieldErrors;

#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T = ()> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Machine-readable discriminator for errors clients must branch on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            code: None,
        }
    }

    /// Successful response that carries only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
            code: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            code: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_data<U>(self, data: U) -> ApiResponse<U> {
        ApiResponse {
            success: self.success,
            message: self.message,
            data: Some(data),
            code: self.code,
        }
    }
}

/// `data` payload of a validation failure.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationDetails {
    pub field_errors: FieldErrors,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_fields_are_omitted() {
        let body = serde_json::to_value(ApiResponse::<()>::message("Logged out successfully")).unwrap();
        assert_eq!(body, json!({ "success": true, "message": "Logged out successfully" }));
    }

    #[test]
    fn failure_carries_code_and_details() {
        let mut fields = FieldErrors::new();
        fields.add("email", "Invalid email");
        let body = ApiResponse::<()>::failure("Invalid input")
            .with_code("X")
            .with_data(ValidationDetails {
                field_errors: fields,
            });
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({
                "success": false,
                "message": "Invalid input",
                "code": "X",
                "data": { "fieldErrors": { "email": ["Invalid email"] } }
            })
        );
    }
}
