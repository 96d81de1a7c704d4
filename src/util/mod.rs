pub mod email;
pub mod error;
pub mod jwt;
pub mod logger;
pub mod password;
pub mod password_reset;
pub mod query_params;
pub mod validated_json;
