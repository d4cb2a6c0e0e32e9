use crate::peer_connection::configuration::offer_answer_options::RTCOfferOptions;

pub const MEDIA_CONSTRAINT_OFFER_TO_RECEIVE_AUDIO: &str = "OfferToReceiveAudio";
pub const MEDIA_CONSTRAINT_OFFER_TO_RECEIVE_VIDEO: &str = "OfferToReceiveVideo";
pub const MEDIA_CONSTRAINT_ICE_RESTART: &str = "IceRestart";

/// A single key/value constraint.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct MediaConstraint {
    pub key: String,
    pub value: String,
}

impl MediaConstraint {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_owned(),
            value: value.to_owned(),
        }
    }
}

/// Legacy offer constraints, a list of mandatory and optional key/value pairs.
/// Mandatory keys win over optional ones; unknown keys are ignored.
///
/// ```
/// use rtc::peer_connection::configuration::media_constraints::{MediaConstraint, MediaConstraints};
///
/// let constraints = MediaConstraints::new(
///     vec![
///         MediaConstraint::new("OfferToReceiveAudio", "true"),
///         MediaConstraint::new("OfferToReceiveVideo", "true"),
///     ],
///     vec![],
/// );
/// let options = constraints.to_offer_options();
/// assert!(options.offer_to_receive_audio);
/// assert!(options.offer_to_receive_video);
/// ```
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct MediaConstraints {
    pub mandatory: Vec<MediaConstraint>,
    pub optional: Vec<MediaConstraint>,
}

impl MediaConstraints {
    pub fn new(mandatory: Vec<MediaConstraint>, optional: Vec<MediaConstraint>) -> Self {
        Self {
            mandatory,
            optional,
        }
    }

    /// Returns the value of `key`, looking at mandatory constraints first.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.mandatory
            .iter()
            .chain(self.optional.iter())
            .find(|c| c.key == key)
            .map(|c| c.value.as_str())
    }

    fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    pub fn to_offer_options(&self) -> RTCOfferOptions {
        RTCOfferOptions {
            ice_restart: self.get_bool(MEDIA_CONSTRAINT_ICE_RESTART),
            offer_to_receive_audio: self.get_bool(MEDIA_CONSTRAINT_OFFER_TO_RECEIVE_AUDIO),
            offer_to_receive_video: self.get_bool(MEDIA_CONSTRAINT_OFFER_TO_RECEIVE_VIDEO),
        }
    }
}

impl From<&MediaConstraints> for RTCOfferOptions {
    fn from(constraints: &MediaConstraints) -> Self {
        constraints.to_offer_options()
    }
}
