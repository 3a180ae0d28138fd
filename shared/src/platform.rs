//! Platform detection for mapping-line gating.

use serde::{Deserialize, Serialize};

/// The platform a mapping line targets.
///
/// Derived from the compile target. `Unknown` (e.g. browsers) disables all
/// platform-gated mappings; such targets rely on backends that speak the
/// standard layout natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Windows,
    MacOs,
    Unix,
    Android,
    Ios,
    Unknown,
}

impl Platform {
    /// The platform of the running process.
    pub const fn current() -> Platform {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "ios") {
            Platform::Ios
        } else if cfg!(target_os = "android") {
            Platform::Android
        } else if cfg!(unix) {
            Platform::Unix
        } else {
            Platform::Unknown
        }
    }

    /// Parses the value of a `platform:` mapping field. Returns `None` for
    /// platform names the database does not recognize.
    pub fn from_mapping_name(name: &str) -> Option<Platform> {
        match name {
            "Windows" => Some(Platform::Windows),
            "Mac OS X" => Some(Platform::MacOs),
            "Linux" => Some(Platform::Unix),
            "Android" => Some(Platform::Android),
            "iOS" => Some(Platform::Ios),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_names() {
        assert_eq!(Platform::from_mapping_name("Windows"), Some(Platform::Windows));
        assert_eq!(Platform::from_mapping_name("Mac OS X"), Some(Platform::MacOs));
        assert_eq!(Platform::from_mapping_name("Linux"), Some(Platform::Unix));
        assert_eq!(Platform::from_mapping_name("Android"), Some(Platform::Android));
        assert_eq!(Platform::from_mapping_name("iOS"), Some(Platform::Ios));
        assert_eq!(Platform::from_mapping_name("BeOS"), None);
    }
}
