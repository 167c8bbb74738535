use shared::{
    domain::{OAuthCallProvider, VideoChatProvider},
    error::CallSetupError,
    protocol::RealmCallSettings,
};
use url::Url;
use uuid::Uuid;

pub fn current_oauth_call_provider(settings: &RealmCallSettings) -> Option<OAuthCallProvider> {
    if settings.is_provider(VideoChatProvider::Zoom)
        || settings.is_provider(VideoChatProvider::ZoomServerToServer)
    {
        return Some(OAuthCallProvider::Zoom);
    }
    None
}

/// Realm-level Jitsi server, falling back to the server-wide default only when
/// the realm sets none. An empty URL means no server. With a `video_call_id`
/// the URL points at that room.
pub fn jitsi_server_url(
    settings: &RealmCallSettings,
    video_call_id: Option<&str>,
) -> Result<Option<Url>, CallSetupError> {
    let Some(base_url) = settings
        .realm_jitsi_server_url
        .as_deref()
        .or(settings.server_jitsi_server_url.as_deref())
        .filter(|url| !url.is_empty())
    else {
        return Ok(None);
    };

    let mut url = Url::parse(base_url).map_err(|source| CallSetupError::InvalidJitsiUrl {
        url: base_url.to_string(),
        source,
    })?;
    if let Some(video_call_id) = video_call_id {
        url.set_path(&format!("/{video_call_id}"));
    }
    Ok(Some(url))
}

fn has_jitsi_server(settings: &RealmCallSettings) -> bool {
    matches!(jitsi_server_url(settings, None), Ok(Some(_)))
}

pub fn show_video_chat_button(settings: &RealmCallSettings) -> bool {
    if settings.is_provider(VideoChatProvider::Disabled) {
        return false;
    }

    if settings.is_provider(VideoChatProvider::JitsiMeet) && !has_jitsi_server(settings) {
        return false;
    }

    true
}

pub fn show_audio_chat_button(settings: &RealmCallSettings) -> bool {
    (settings.is_provider(VideoChatProvider::JitsiMeet) && has_jitsi_server(settings))
        || settings.is_provider(VideoChatProvider::Zoom)
        || settings.is_provider(VideoChatProvider::BigBlueButton)
        || settings.is_provider(VideoChatProvider::ZoomServerToServer)
}

pub fn generate_video_call_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
#[path = "tests/call_providers_tests.rs"]
mod tests;
