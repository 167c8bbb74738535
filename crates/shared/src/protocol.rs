use serde::{Deserialize, Serialize};

use crate::{domain::VideoChatProvider, error::CallSetupError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VideoChatProviderInfo {
    pub name: String,
    pub id: i64,
}

/// Providers the server advertises for the realm. Only `disabled` and
/// `jitsi_meet` are always present; the rest depend on server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailableVideoChatProviders {
    pub disabled: VideoChatProviderInfo,
    pub jitsi_meet: VideoChatProviderInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<VideoChatProviderInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom_server_to_server: Option<VideoChatProviderInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub big_blue_button: Option<VideoChatProviderInfo>,
}

impl AvailableVideoChatProviders {
    fn entries(&self) -> [(VideoChatProvider, Option<&VideoChatProviderInfo>); 5] {
        [
            (VideoChatProvider::Disabled, Some(&self.disabled)),
            (VideoChatProvider::JitsiMeet, Some(&self.jitsi_meet)),
            (VideoChatProvider::Zoom, self.zoom.as_ref()),
            (
                VideoChatProvider::ZoomServerToServer,
                self.zoom_server_to_server.as_ref(),
            ),
            (VideoChatProvider::BigBlueButton, self.big_blue_button.as_ref()),
        ]
    }

    pub fn id_of(&self, provider: VideoChatProvider) -> Option<i64> {
        self.entries()
            .into_iter()
            .find(|(kind, _)| *kind == provider)
            .and_then(|(_, info)| info.map(|info| info.id))
    }

    pub fn provider_for_id(&self, id: i64) -> Option<VideoChatProvider> {
        self.entries()
            .into_iter()
            .find(|(_, info)| info.is_some_and(|info| info.id == id))
            .map(|(kind, _)| kind)
    }
}

/// Call-related slice of the realm state delivered to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RealmCallSettings {
    pub video_chat_provider: i64,
    pub available_video_chat_providers: AvailableVideoChatProviders,
    #[serde(default)]
    pub realm_jitsi_server_url: Option<String>,
    #[serde(default)]
    pub server_jitsi_server_url: Option<String>,
}

impl RealmCallSettings {
    pub fn is_provider(&self, provider: VideoChatProvider) -> bool {
        self.available_video_chat_providers.id_of(provider) == Some(self.video_chat_provider)
    }

    pub fn resolve_video_chat_provider(&self) -> Result<VideoChatProvider, CallSetupError> {
        self.available_video_chat_providers
            .provider_for_id(self.video_chat_provider)
            .ok_or(CallSetupError::UnavailableVideoChatProvider(
                self.video_chat_provider,
            ))
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
