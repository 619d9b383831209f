//! Audit records capturing one request/response cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::AuthUser;

/// User label stored when no caller is attached to the request.
pub const ANONYMOUS: &str = "anonymous";

/// Severity of an audited request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Level {
    /// Request still in flight.
    Debug = 1,
    /// Completed below 400.
    Info = 2,
    /// Completed with a 4xx status.
    Warning = 3,
    /// Completed with a 5xx status.
    Error = 4,
}

impl Level {
    /// Derive the level from the status sent to the client.
    ///
    /// # Examples
    /// ```
    /// use account_service::domain::Level;
    ///
    /// assert_eq!(Level::for_status(503), Level::Error);
    /// assert_eq!(Level::for_status(404), Level::Warning);
    /// assert_eq!(Level::for_status(204), Level::Info);
    /// ```
    pub const fn for_status(status: u16) -> Self {
        if status >= 500 {
            Self::Error
        } else if status >= 400 {
            Self::Warning
        } else {
            Self::Info
        }
    }

    /// Stored numeric code.
    pub const fn code(self) -> i16 {
        self as i16
    }

    /// Parse a stored numeric code.
    pub const fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(Self::Debug),
            2 => Some(Self::Info),
            3 => Some(Self::Warning),
            4 => Some(Self::Error),
            _ => None,
        }
    }

    /// Whether the request ended in a client or server failure.
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Warning | Self::Error)
    }
}

/// Caller side of the connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSnapshot {
    /// Client address, honouring forwarding headers.
    pub ip: String,
}

/// Server side of the connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSnapshot {
    /// Host the request was addressed to.
    pub host: String,
}

/// Request half of the record, written before the handler runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestSnapshot {
    /// Request path.
    pub path: String,
    /// Request body; non-JSON bodies are stored as a string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Correlation id shared with the logs and the error body.
    pub request_id: String,
}

/// Response half of the record, written once the response is final.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    /// Status sent to the client.
    pub status_code: u16,
    /// Body sent to the client; non-JSON bodies are stored as a string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// What the audit layer knows about a request before dispatch.
#[derive(Debug, Clone, Copy)]
pub struct RequestFacts<'a> {
    /// Operation identifier of the audited route.
    pub operation: &'a str,
    /// Client address.
    pub client_ip: &'a str,
    /// Addressed host.
    pub host: &'a str,
    /// Request path.
    pub path: &'a str,
    /// Raw request body.
    pub body: &'a [u8],
    /// Correlation id.
    pub request_id: &'a str,
    /// Caller attached by the authentication layer.
    pub user: Option<&'a AuthUser>,
}

/// Audit row for one request/response cycle.
///
/// Written twice: [`ActionRecord::begin`] fills the request half and
/// [`ActionRecord::finish`] the response half, level and detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Row identifier, `None` until the first insert succeeds.
    pub id: Option<i64>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last write time.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Caller side.
    pub client: ClientSnapshot,
    /// Server side.
    pub server: ServerSnapshot,
    /// Request half.
    pub request: RequestSnapshot,
    /// Response half, `None` while the request is in flight.
    pub response: Option<ResponseSnapshot>,
    /// Operation identifier of the audited route.
    pub operation: String,
    /// Free text; failures append `error: <message>`.
    pub detail: String,
    /// Severity.
    pub level: Level,
    /// Application-defined marker.
    pub tag: i32,
    /// Caller label.
    pub user: String,
}

impl ActionRecord {
    /// Build the request half of a record.
    pub fn begin(facts: &RequestFacts<'_>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            client: ClientSnapshot {
                ip: facts.client_ip.to_owned(),
            },
            server: ServerSnapshot {
                host: facts.host.to_owned(),
            },
            request: RequestSnapshot {
                path: facts.path.to_owned(),
                data: payload_json(facts.body),
                request_id: facts.request_id.to_owned(),
            },
            response: None,
            operation: facts.operation.to_owned(),
            detail: String::new(),
            level: Level::Debug,
            tag: 0,
            user: facts
                .user
                .map_or_else(|| ANONYMOUS.to_owned(), AuthUser::audit_label),
        }
    }

    /// Fill the response half from the status and body sent to the client.
    ///
    /// For 4xx and 5xx responses the `message` field of a JSON body is
    /// appended to [`ActionRecord::detail`].
    pub fn finish(&mut self, status: u16, body: &[u8]) {
        self.updated_at = Utc::now();
        self.level = Level::for_status(status);
        self.response = Some(ResponseSnapshot {
            status_code: status,
            data: payload_json(body),
        });
        if self.level.is_failure() {
            if let Some(message) = error_message(body) {
                self.append_detail(&format!("error: {message}"));
            }
        }
    }

    /// Append `text` to the detail, separated by a space.
    pub fn append_detail(&mut self, text: &str) {
        if !self.detail.is_empty() {
            self.detail.push(' ');
        }
        self.detail.push_str(text);
    }
}

/// Interpret a body as JSON, falling back to a lossy string.
pub fn payload_json(body: &[u8]) -> Option<Value> {
    if body.is_empty() {
        return None;
    }
    Some(
        serde_json::from_slice(body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned())),
    )
}

fn error_message(body: &[u8]) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorFields {
        message: String,
    }

    serde_json::from_slice::<ErrorFields>(body)
        .ok()
        .map(|fields| fields.message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn record() -> ActionRecord {
        ActionRecord::begin(&RequestFacts {
            operation: "AddAccount",
            client_ip: "10.0.0.8",
            host: "accounts.local",
            path: "/v1/accounts",
            body: br#"{"app_id":"billing"}"#,
            request_id: "req-1",
            user: None,
        })
    }

    #[rstest]
    fn begin_captures_request_half(record: ActionRecord) {
        assert_eq!(record.id, None);
        assert_eq!(record.client.ip, "10.0.0.8");
        assert_eq!(record.server.host, "accounts.local");
        assert_eq!(
            record.request.data,
            Some(serde_json::json!({"app_id": "billing"}))
        );
        assert_eq!(record.user, ANONYMOUS);
        assert_eq!(record.level, Level::Debug);
        assert!(record.response.is_none());
    }

    #[rstest]
    fn finish_records_failure_message(mut record: ActionRecord) {
        record.detail = "namespace billing".into();
        record.finish(400, br#"{"code":400,"message":"bad body","req_id":"req-1"}"#);

        assert_eq!(record.level, Level::Warning);
        assert_eq!(record.detail, "namespace billing error: bad body");
        assert_eq!(
            record.response.as_ref().map(|response| response.status_code),
            Some(400)
        );
    }

    #[rstest]
    fn finish_leaves_detail_alone_on_success(mut record: ActionRecord) {
        record.finish(200, b"{}");
        assert_eq!(record.level, Level::Info);
        assert!(record.detail.is_empty());
    }

    #[rstest]
    fn finish_tolerates_non_json_failure_bodies(mut record: ActionRecord) {
        record.finish(502, b"upstream down");
        assert_eq!(record.level, Level::Error);
        assert!(record.detail.is_empty());
        assert_eq!(
            record.response.and_then(|response| response.data),
            Some(Value::String("upstream down".into()))
        );
    }

    #[test]
    fn user_label_uses_display_name_and_email() {
        let user = AuthUser {
            username: "ada".into(),
            display_name: "Ada".into(),
            email: "ada@example.com".into(),
        };
        let record = ActionRecord::begin(&RequestFacts {
            operation: "AddAccount",
            client_ip: "",
            host: "",
            path: "/",
            body: b"",
            request_id: "r",
            user: Some(&user),
        });
        assert_eq!(record.user, "Ada ada@example.com");
        assert_eq!(record.request.data, None);
    }

    #[rstest]
    #[case(1, Some(Level::Debug))]
    #[case(4, Some(Level::Error))]
    #[case(9, None)]
    fn level_codes_round_trip(#[case] code: i16, #[case] expected: Option<Level>) {
        assert_eq!(Level::from_code(code), expected);
        if let Some(level) = expected {
            assert_eq!(level.code(), code);
        }
    }
}
