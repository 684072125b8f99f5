//! The uniform `{ ok: true, ...data }` / `{ ok: false, error }` result shape.
//!
//! Every ConfigStore and ObjectStorageClient operation hands one of these back
//! instead of a `Result`, so the CLI and HTTP layers only ever render data.

use std::fmt;

use serde::ser::{Serialize, Serializer};

/// Outcome of a storage or config operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T> {
    Ok(T),
    Failed(String),
}

impl<T> Envelope<T> {
    pub fn failure(message: impl Into<String>) -> Self {
        Envelope::Failed(message.into())
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Envelope::Ok(_))
    }

    /// The failure message, if any.
    pub fn error(&self) -> Option<&str> {
        match self {
            Envelope::Ok(_) => None,
            Envelope::Failed(msg) => Some(msg),
        }
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Envelope::Ok(data) => Some(data),
            Envelope::Failed(_) => None,
        }
    }

    pub fn into_result(self) -> std::result::Result<T, String> {
        match self {
            Envelope::Ok(data) => Ok(data),
            Envelope::Failed(msg) => Err(msg),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        match self {
            Envelope::Ok(data) => Envelope::Ok(f(data)),
            Envelope::Failed(msg) => Envelope::Failed(msg),
        }
    }
}

impl<T, E: fmt::Display> From<std::result::Result<T, E>> for Envelope<T> {
    fn from(result: std::result::Result<T, E>) -> Self {
        match result {
            Ok(data) => Envelope::Ok(data),
            Err(e) => Envelope::Failed(e.to_string()),
        }
    }
}

impl<T: Serialize> Serialize for Envelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(serde::Serialize)]
        struct Success<'a, T> {
            ok: bool,
            #[serde(flatten)]
            data: &'a T,
        }

        #[derive(serde::Serialize)]
        struct Failure<'a> {
            ok: bool,
            error: &'a str,
        }

        match self {
            Envelope::Ok(data) => Success { ok: true, data }.serialize(serializer),
            Envelope::Failed(error) => Failure { ok: false, error }.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(serde::Serialize)]
    struct Url {
        url: String,
    }

    #[test]
    fn success_flattens_payload_next_to_flag() {
        let env = Envelope::Ok(Url {
            url: "https://example.com/a.txt".into(),
        });
        assert_eq!(
            serde_json::to_value(&env).unwrap(),
            json!({ "ok": true, "url": "https://example.com/a.txt" })
        );
    }

    #[test]
    fn unit_success_is_just_the_flag() {
        let env: Envelope<()> = Envelope::Ok(());
        assert_eq!(serde_json::to_value(&env).unwrap(), json!({ "ok": true }));
    }

    #[test]
    fn failure_carries_only_the_message() {
        let env: Envelope<Url> = Envelope::failure("access denied");
        assert_eq!(
            serde_json::to_value(&env).unwrap(),
            json!({ "ok": false, "error": "access denied" })
        );
        assert_eq!(env.error(), Some("access denied"));
    }

    #[test]
    fn from_result_uses_display_of_error() {
        let res: std::result::Result<u32, crate::CosError> =
            Err(crate::CosError::InvalidArgument("limit must be positive".into()));
        let env = Envelope::from(res);
        assert_eq!(env.error(), Some("Invalid argument: limit must be positive"));
    }
}
