//! Release server protocol
//!
//! Every request is a plain GET against a mirror's base URL. Package requests
//! carry `action`, `package`, `release` and a fixed `version=0`; every request
//! additionally carries the caller's `server_name` and the `frame_key`
//! placeholder credential. A mirror's root document identifies it as part of
//! the fleet.

use sprout_core::types::PackageReference;
use url::form_urlencoded;

/// Substring a mirror's root document must contain (case-insensitive)
pub const IDENTITY_MARKER: &str = "osWFrame Release Server";

/// Inclusive byte-length bounds of a valid root document
pub const IDENTITY_MIN_LEN: usize = 26;
pub const IDENTITY_MAX_LEN: usize = 128;

/// Placeholder credential sent with every request
pub const CREDENTIAL_PARAM: &str = "frame_key";
pub const CREDENTIAL_PLACEHOLDER: &str = "unset";

/// Package actions understood by a mirror
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Published SHA-1 of the package archive
    GetChecksum,
    /// Package archive bytes
    GetContent,
}

impl Action {
    /// Wire name of the action
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::GetChecksum => "get_checksum",
            Action::GetContent => "get_content",
        }
    }
}

/// Append `key=value` verbatim using `?` or `&` depending on the URL so far
fn append_raw(url: &mut String, key: &str, value: &str) {
    url.push(if url.contains('?') { '&' } else { '?' });
    url.push_str(key);
    url.push('=');
    url.push_str(value);
}

/// Append `key=value` with the value form-urlencoded
fn append_param(url: &mut String, key: &str, value: &str) {
    let encoded: String = form_urlencoded::byte_serialize(value.as_bytes()).collect();
    append_raw(url, key, &encoded);
}

/// Build the URL of a package action on a mirror
///
/// Package and release names go out as they are; mirrors expect the raw
/// names and only the caller's server name is encoded.
pub fn action_url(base_url: &str, action: Action, reference: &PackageReference) -> String {
    let mut url = base_url.to_string();
    append_raw(&mut url, "action", action.as_str());
    append_raw(&mut url, "package", &reference.package);
    append_raw(&mut url, "release", &reference.release);
    append_raw(&mut url, "version", "0");
    url
}

/// Append the parameters every transport adds before dispatch
pub fn with_transport_params(url: &str, server_name: &str) -> String {
    let mut url = url.to_string();
    append_param(&mut url, "server_name", server_name);
    append_param(&mut url, CREDENTIAL_PARAM, CREDENTIAL_PLACEHOLDER);
    url
}

/// Check whether a root document identifies a fleet mirror
pub fn is_identity_response(body: &[u8]) -> bool {
    if !(IDENTITY_MIN_LEN..=IDENTITY_MAX_LEN).contains(&body.len()) {
        return false;
    }

    String::from_utf8_lossy(body)
        .to_lowercase()
        .contains(&IDENTITY_MARKER.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> PackageReference {
        PackageReference::new("tools.main", "stable", "oswframe2k20")
    }

    #[test]
    fn test_action_urls() {
        let base = "https://mirror.example/oswsource2k20/index.php";

        assert_eq!(
            action_url(base, Action::GetChecksum, &reference()),
            "https://mirror.example/oswsource2k20/index.php?action=get_checksum&package=tools.main&release=stable&version=0"
        );
        assert_eq!(
            action_url(base, Action::GetContent, &reference()),
            "https://mirror.example/oswsource2k20/index.php?action=get_content&package=tools.main&release=stable&version=0"
        );
    }

    #[test]
    fn test_action_url_sends_names_verbatim() {
        let reference = PackageReference::new("tools.main", "1.0+beta", "oswframe2k20");
        assert_eq!(
            action_url("http://m/index.php", Action::GetChecksum, &reference),
            "http://m/index.php?action=get_checksum&package=tools.main&release=1.0+beta&version=0"
        );
    }

    #[test]
    fn test_action_url_on_base_with_query() {
        let url = action_url("http://m/index.php?site=a", Action::GetContent, &reference());
        assert!(url.starts_with("http://m/index.php?site=a&action=get_content&"));
    }

    #[test]
    fn test_transport_params() {
        assert_eq!(
            with_transport_params("http://m/index.php", ""),
            "http://m/index.php?server_name=&frame_key=unset"
        );
        assert_eq!(
            with_transport_params("http://m/index.php?action=get_checksum", "www.example.com"),
            "http://m/index.php?action=get_checksum&server_name=www.example.com&frame_key=unset"
        );
        assert_eq!(
            with_transport_params("http://m/", "my site"),
            "http://m/?server_name=my+site&frame_key=unset"
        );
    }

    #[test]
    fn test_identity_response_bounds() {
        let exact_min = "osWFrame Release Server #1";
        assert_eq!(exact_min.len(), IDENTITY_MIN_LEN);
        assert!(is_identity_response(exact_min.as_bytes()));

        assert!(!is_identity_response(b"osWFrame Release Server"));

        let at_max = format!("{:<128}", "osWFrame Release Server");
        assert!(is_identity_response(at_max.as_bytes()));

        let too_long = format!("{:<129}", "osWFrame Release Server");
        assert!(!is_identity_response(too_long.as_bytes()));
    }

    #[test]
    fn test_identity_response_is_case_insensitive() {
        assert!(is_identity_response(b"OSWFRAME RELEASE SERVER (mirror 3)"));
        assert!(!is_identity_response(b"Some other server answering here"));
        assert!(!is_identity_response(b""));
    }
}
