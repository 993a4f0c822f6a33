use serde::{Deserialize, Serialize};

/// Stable error code sent when a frame's `type` is absent, unknown, or its
/// required fields are missing.
pub const UNKNOWN_MESSAGE_TYPE: &str = "UNKNOWN_MESSAGE_TYPE";

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPosition {
    pub line: u32,
    pub column: u32,
}

/// Inbound frames from client to server
///
/// Closed set: anything that fails to parse into one of these variants is
/// answered with an `error` frame and the connection stays open.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientFrame {
    #[serde(rename = "code_update", rename_all = "camelCase")]
    CodeUpdate {
        problem_id: i64,
        code: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cursor_position: Option<CursorPosition>,
    },

    #[serde(rename = "problem_change", rename_all = "camelCase")]
    ProblemChange { problem_id: i64 },

    /// Execution request. This service does not run code; the router answers
    /// with a failed `code_result` and never broadcasts the request.
    #[serde(rename = "run_code", rename_all = "camelCase")]
    RunCode { problem_id: i64, code: String },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

/// Outbound frames from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerFrame {
    #[serde(rename = "code_update", rename_all = "camelCase")]
    CodeUpdate {
        problem_id: i64,
        code: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cursor_position: Option<CursorPosition>,
    },

    #[serde(rename = "problem_change", rename_all = "camelCase")]
    ProblemChange { problem_id: i64 },

    #[serde(rename = "user_joined", rename_all = "camelCase")]
    UserJoined { user_name: String, role: String },

    #[serde(rename = "user_left", rename_all = "camelCase")]
    UserLeft { user_name: String, role: String },

    /// Sent once to a connection right after it registers, carrying the room
    /// occupancy at that instant. Not re-pushed on later joins or leaves.
    #[serde(rename = "connection_status", rename_all = "camelCase")]
    ConnectionStatus {
        status: ConnectionState,
        session_id: String,
        active_users: usize,
    },

    #[serde(rename = "error", rename_all = "camelCase")]
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },

    #[serde(rename = "code_result", rename_all = "camelCase")]
    CodeResult {
        problem_id: i64,
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        test_results: Option<Vec<serde_json::Value>>,
    },
}

impl ServerFrame {
    /// Serialize for the wire. These enums have no fallible shapes; a failure
    /// here is a bug, so it is logged and the frame is dropped.
    pub fn encode(&self) -> Option<String> {
        match serde_json::to_string(self) {
            Ok(json) => Some(json),
            Err(e) => {
                tracing::error!(error = %e, "failed to encode outbound frame");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_code_update_with_camel_case_fields() {
        let frame: ClientFrame = serde_json::from_str(
            r#"{"type":"code_update","problemId":7,"code":"print(1)","cursorPosition":{"line":2,"column":5}}"#,
        )
        .unwrap();

        match frame {
            ClientFrame::CodeUpdate {
                problem_id,
                code,
                cursor_position,
            } => {
                assert_eq!(problem_id, 7);
                assert_eq!(code, "print(1)");
                let cursor = cursor_position.unwrap();
                assert_eq!((cursor.line, cursor.column), (2, 5));
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn cursor_position_is_optional() {
        let frame: ClientFrame =
            serde_json::from_str(r#"{"type":"code_update","problemId":1,"code":""}"#).unwrap();
        assert!(matches!(
            frame,
            ClientFrame::CodeUpdate {
                cursor_position: None,
                ..
            }
        ));
    }

    #[test]
    fn unknown_extra_fields_are_ignored() {
        let frame: ClientFrame = serde_json::from_str(
            r#"{"type":"problem_change","problemId":3,"somethingElse":true}"#,
        )
        .unwrap();
        assert!(matches!(
            frame,
            ClientFrame::ProblemChange { problem_id: 3 }
        ));
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(serde_json::from_str::<ClientFrame>(r#"{"type":"shout","volume":11}"#).is_err());
        assert!(serde_json::from_str::<ClientFrame>(r#"{"problemId":1}"#).is_err());
    }

    #[test]
    fn missing_required_field_is_rejected() {
        assert!(serde_json::from_str::<ClientFrame>(r#"{"type":"code_update","code":"x"}"#).is_err());
    }

    #[test]
    fn connection_status_wire_shape() {
        let frame = ServerFrame::ConnectionStatus {
            status: ConnectionState::Connected,
            session_id: "sess_ab12cd34".into(),
            active_users: 2,
        };
        let value: serde_json::Value =
            serde_json::from_str(&frame.encode().unwrap()).unwrap();

        assert_eq!(value["type"], "connection_status");
        assert_eq!(value["status"], "connected");
        assert_eq!(value["sessionId"], "sess_ab12cd34");
        assert_eq!(value["activeUsers"], 2);
    }

    #[test]
    fn error_frame_omits_absent_code() {
        let frame = ServerFrame::Error {
            message: "boom".into(),
            code: None,
        };
        let value: serde_json::Value =
            serde_json::from_str(&frame.encode().unwrap()).unwrap();
        assert!(value.get("code").is_none());
    }
}
