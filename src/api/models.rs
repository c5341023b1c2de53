//! Request and response bodies of the queue endpoints.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::queue::{MAX_POLL_INTERVAL_SECS, MIN_POLL_INTERVAL_SECS};

/// Queue names are non-empty and limited to ASCII letters, digits, `_` and `-`.
pub fn validate_queue_name(queue_name: &str) -> Result<()> {
    if queue_name.is_empty() {
        return Err(AppError::Validation("queue_name is required".to_string()));
    }

    let valid = queue_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        return Err(AppError::Validation(format!(
            "queue_name {:?} may only contain letters, digits, '_' and '-'",
            queue_name
        )));
    }

    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct EnqueueRequest {
    #[serde(default)]
    pub queue_name: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub priority: i64,
}

impl EnqueueRequest {
    pub fn validate(&self) -> Result<()> {
        validate_queue_name(&self.queue_name)?;
        if self.message.is_empty() {
            return Err(AppError::Validation("message is required".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct DequeueRequest {
    #[serde(default)]
    pub queue_name: String,
    /// Seconds; `0` or absent selects the engine default.
    #[serde(default)]
    pub visibility_timeout: i64,
    /// Seconds between attempts; `0` or absent selects the configured default.
    #[serde(default)]
    pub database_poll_interval: u64,
}

impl DequeueRequest {
    pub fn validate(&self) -> Result<()> {
        validate_queue_name(&self.queue_name)?;

        let interval = self.database_poll_interval;
        if interval != 0 && !(MIN_POLL_INTERVAL_SECS..=MAX_POLL_INTERVAL_SECS).contains(&interval)
        {
            return Err(AppError::Validation(format!(
                "database_poll_interval must be between {} and {}",
                MIN_POLL_INTERVAL_SECS, MAX_POLL_INTERVAL_SECS
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    #[serde(default)]
    pub delete_token: String,
}

impl DeleteRequest {
    pub fn validate(&self) -> Result<()> {
        if self.delete_token.is_empty() {
            return Err(AppError::Validation("delete_token is required".to_string()));
        }

        match Uuid::parse_str(&self.delete_token) {
            Ok(token) if token.get_version_num() == 4 => Ok(()),
            _ => Err(AppError::Validation(
                "delete_token must be a version 4 UUID".to_string(),
            )),
        }
    }
}

/// Body shared by `/queue_length` and `/delete_all`.
#[derive(Debug, Deserialize)]
pub struct QueueNameRequest {
    #[serde(default)]
    pub queue_name: String,
}

impl QueueNameRequest {
    pub fn validate(&self) -> Result<()> {
        validate_queue_name(&self.queue_name)
    }
}

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub deleted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_name_rules() {
        assert!(validate_queue_name("orders").is_ok());
        assert!(validate_queue_name("orders_eu-1").is_ok());
        assert!(validate_queue_name("").is_err());
        assert!(validate_queue_name("orders eu").is_err());
        assert!(validate_queue_name("orders/eu").is_err());
        assert!(validate_queue_name("zamówienia").is_err());
    }

    #[test]
    fn test_enqueue_request_defaults_priority() {
        let req: EnqueueRequest =
            serde_json::from_str(r#"{"queue_name":"orders","message":"hi"}"#).unwrap();
        assert_eq!(req.priority, 0);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_enqueue_request_requires_message() {
        let req: EnqueueRequest = serde_json::from_str(r#"{"queue_name":"orders"}"#).unwrap();
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_dequeue_request_poll_interval_bounds() {
        let parse = |body: &str| serde_json::from_str::<DequeueRequest>(body).unwrap();

        assert!(parse(r#"{"queue_name":"q"}"#).validate().is_ok());
        assert!(parse(r#"{"queue_name":"q","database_poll_interval":1}"#)
            .validate()
            .is_ok());
        assert!(parse(r#"{"queue_name":"q","database_poll_interval":5}"#)
            .validate()
            .is_ok());
        assert!(parse(r#"{"queue_name":"q","database_poll_interval":6}"#)
            .validate()
            .is_err());
    }

    #[test]
    fn test_delete_request_requires_uuid_v4() {
        let ok = DeleteRequest {
            delete_token: Uuid::new_v4().to_string(),
        };
        assert!(ok.validate().is_ok());

        let nil = DeleteRequest {
            delete_token: Uuid::nil().to_string(),
        };
        assert!(nil.validate().is_err());

        let garbage = DeleteRequest {
            delete_token: "not-a-token".to_string(),
        };
        assert!(garbage.validate().is_err());
    }
}
