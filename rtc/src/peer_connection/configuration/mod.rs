pub mod ice_transport_policy;
pub mod media_constraints;
pub mod offer_answer_options;
pub mod setting_engine;

pub use ice_transport_policy::RTCIceTransportPolicy;
pub use media_constraints::{MediaConstraint, MediaConstraints};
pub use offer_answer_options::{RTCAnswerOptions, RTCOfferOptions};
pub use setting_engine::SettingEngine;

use crate::peer_connection::transport::ice::server::RTCIceServer;
use ice::agent::agent_config::AgentConfig;
use ice::url::Url;
use shared::error::Result;

pub(crate) const UNSPECIFIED_STR: &str = "Unspecified";

/// A Configuration defines how peer-to-peer communication via PeerConnection
/// is established or re-established.
///
/// ## Specifications
///
/// * [W3C]
///
/// [W3C]: https://w3c.github.io/webrtc-pc/#rtcconfiguration-dictionary
#[derive(Default, Debug, Clone)]
pub struct RTCConfiguration {
    /// ice_servers defines a slice describing servers available to be used by
    /// ICE, such as STUN and TURN servers.
    pub(crate) ice_servers: Vec<RTCIceServer>,

    /// ice_transport_policy indicates which candidates the ICEAgent is allowed
    /// to use.
    pub(crate) ice_transport_policy: RTCIceTransportPolicy,

    pub(crate) setting_engine: SettingEngine,
}

impl RTCConfiguration {
    pub fn ice_servers(&self) -> &[RTCIceServer] {
        &self.ice_servers
    }

    pub fn ice_transport_policy(&self) -> RTCIceTransportPolicy {
        self.ice_transport_policy
    }

    pub fn setting_engine(&self) -> &SettingEngine {
        &self.setting_engine
    }

    /// get_iceservers side-steps the strict parsing mode of the ice package
    /// (as defined in https://tools.ietf.org/html/rfc7064) by copying and then
    /// stripping any erroneous queries from "stun(s):" URLs before parsing.
    pub(crate) fn get_ice_servers(&self) -> Vec<RTCIceServer> {
        let mut ice_servers = self.ice_servers.clone();

        for ice_server in &mut ice_servers {
            for raw_url in &mut ice_server.urls {
                if raw_url.starts_with("stun")
                    && let Some((stripped, _query)) = raw_url.split_once('?')
                {
                    *raw_url = stripped.to_owned();
                }
            }
        }

        ice_servers
    }

    /// Validates every configured server url.
    pub(crate) fn ice_urls(&self) -> Result<Vec<Url>> {
        let mut urls = vec![];
        for ice_server in self.get_ice_servers() {
            urls.extend(ice_server.urls()?);
        }
        Ok(urls)
    }

    pub(crate) fn agent_config(&self) -> Result<AgentConfig> {
        let mut config = AgentConfig {
            urls: self.ice_urls()?,
            candidate_types: self.ice_transport_policy.candidate_types(),
            ..Default::default()
        };
        self.setting_engine.apply_to_agent_config(&mut config);
        Ok(config)
    }
}

#[derive(Default)]
pub struct RTCConfigurationBuilder {
    ice_servers: Vec<RTCIceServer>,
    ice_transport_policy: RTCIceTransportPolicy,
    setting_engine: SettingEngine,
}

impl RTCConfigurationBuilder {
    pub fn new() -> Self {
        RTCConfigurationBuilder::default()
    }

    pub fn with_ice_servers(mut self, ice_servers: Vec<RTCIceServer>) -> Self {
        self.ice_servers = ice_servers;
        self
    }

    pub fn with_ice_transport_policy(
        mut self,
        ice_transport_policy: RTCIceTransportPolicy,
    ) -> Self {
        self.ice_transport_policy = ice_transport_policy;
        self
    }

    pub fn with_setting_engine(mut self, setting_engine: SettingEngine) -> Self {
        self.setting_engine = setting_engine;
        self
    }

    pub fn build(self) -> RTCConfiguration {
        RTCConfiguration {
            ice_servers: self.ice_servers,
            ice_transport_policy: self.ice_transport_policy,
            setting_engine: self.setting_engine,
        }
    }
}
