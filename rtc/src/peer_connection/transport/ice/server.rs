use ice::url::{SchemeType, Url};
use serde::{Deserialize, Serialize};
use shared::error::{Error, Result};

/// Describes a single STUN or TURN server the ICE agent may use.
///
/// ## Specifications
///
/// * [W3C](https://w3c.github.io/webrtc-pc/#rtciceserver-dictionary)
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RTCIceServer {
    pub urls: Vec<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub credential: String,
}

impl RTCIceServer {
    /// Parses every url of the server. TURN urls take the server's username
    /// and credential and are rejected when either is missing.
    pub(crate) fn urls(&self) -> Result<Vec<Url>> {
        let mut urls = vec![];

        for raw_url in &self.urls {
            let mut url = Url::parse_url(raw_url)?;
            match url.scheme {
                SchemeType::Turn | SchemeType::Turns => {
                    if self.username.is_empty() || self.credential.is_empty() {
                        return Err(Error::ErrNoTurnCredentials);
                    }
                    url.username.clone_from(&self.username);
                    url.password.clone_from(&self.credential);
                }
                SchemeType::Stun | SchemeType::Stuns => {}
                SchemeType::Unknown => return Err(Error::ErrInvalidIceServerUrl),
            }
            urls.push(url);
        }

        Ok(urls)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ice::url::ProtoType;

    #[test]
    fn test_ice_server_urls() -> Result<()> {
        let server = RTCIceServer {
            urls: vec![
                "stun:stun.l.google.com:19302".to_owned(),
                "turn:turn.example.org:3478?transport=tcp".to_owned(),
            ],
            username: "user".to_owned(),
            credential: "pass".to_owned(),
        };

        let urls = server.urls()?;
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0].scheme, SchemeType::Stun);
        assert_eq!(urls[0].port, 19302);
        assert_eq!(urls[1].scheme, SchemeType::Turn);
        assert_eq!(urls[1].proto, ProtoType::Tcp);
        assert_eq!(urls[1].username, "user");
        assert_eq!(urls[1].password, "pass");

        Ok(())
    }

    #[test]
    fn test_ice_server_turn_without_credentials() {
        let server = RTCIceServer {
            urls: vec!["turn:turn.example.org".to_owned()],
            ..Default::default()
        };
        assert_eq!(server.urls(), Err(Error::ErrNoTurnCredentials));
    }

    #[test]
    fn test_ice_server_json() -> Result<()> {
        let server: RTCIceServer = serde_json::from_str(
            r#"{"urls":["turn:turn.example.org"],"username":"jch","credential":"topsecret"}"#,
        )
        .map_err(|err| Error::Other(err.to_string()))?;
        assert_eq!(server.username, "jch");
        assert_eq!(server.credential, "topsecret");
        Ok(())
    }
}
