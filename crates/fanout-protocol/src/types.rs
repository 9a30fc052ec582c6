use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Outcome code carried in every signaling response.
///
/// Serialized as a bare integer: `0` for success, `1` for failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ResponseCode {
    #[default]
    Ok,
    Fail,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown response code {0}")]
pub struct UnknownResponseCode(pub u8);

impl From<ResponseCode> for u8 {
    fn from(code: ResponseCode) -> Self {
        match code {
            ResponseCode::Ok => 0,
            ResponseCode::Fail => 1,
        }
    }
}

impl TryFrom<u8> for ResponseCode {
    type Error = UnknownResponseCode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ResponseCode::Ok),
            1 => Ok(ResponseCode::Fail),
            other => Err(UnknownResponseCode(other)),
        }
    }
}
