use serde::{Deserialize, Serialize};

use crate::types::ResponseCode;

/// Body of `POST /publish` and `POST /play`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRequest {
    #[serde(rename = "roomID")]
    pub room_id: String,
    /// Base64-encoded JSON session description (the offer)
    pub sdp: String,
}

/// Response to a signaling request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalResponse {
    pub code: ResponseCode,
    #[serde(default)]
    pub message: String,
    /// Base64-encoded JSON session description (the answer); empty on failure
    #[serde(default)]
    pub sdp: String,
}

impl SignalResponse {
    /// Successful negotiation carrying the encoded answer
    pub fn answer(sdp: String) -> Self {
        Self {
            code: ResponseCode::Ok,
            message: String::new(),
            sdp,
        }
    }

    /// Failed request with a human readable reason
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            code: ResponseCode::Fail,
            message: message.into(),
            sdp: String::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == ResponseCode::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_uses_camel_case_room_key() {
        let req: SignalRequest =
            serde_json::from_value(json!({ "roomID": "lobby", "sdp": "abc" })).unwrap();
        assert_eq!(req.room_id, "lobby");
        assert_eq!(req.sdp, "abc");

        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["roomID"], "lobby");
    }

    #[test]
    fn response_codes_are_integers() {
        let ok = serde_json::to_value(SignalResponse::answer("c2Rw".into())).unwrap();
        assert_eq!(ok, json!({ "code": 0, "message": "", "sdp": "c2Rw" }));

        let fail = serde_json::to_value(SignalResponse::failure("room lobby does not exist")).unwrap();
        assert_eq!(fail["code"], 1);
        assert_eq!(fail["message"], "room lobby does not exist");
        assert_eq!(fail["sdp"], "");
    }

    #[test]
    fn unknown_code_is_rejected() {
        let parsed = serde_json::from_value::<SignalResponse>(json!({ "code": 7 }));
        assert!(parsed.is_err());

        let parsed: SignalResponse = serde_json::from_value(json!({ "code": 1 })).unwrap();
        assert!(!parsed.is_ok());
    }
}
