use serde::{Deserialize, Serialize};

/// RTCIceParameters holds the username fragment and password of one side of
/// the ICE session.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RTCIceParameters {
    pub username_fragment: String,
    pub password: String,
}
