use serde::{Deserialize, Serialize};

pub const DEFAULT_STORE_NAME: &str = "our store";

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoreId(pub String);

impl std::fmt::Display for StoreId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Voice the assistant answers in, chosen per store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    #[default]
    Friendly,
    Professional,
    Casual,
    Energetic,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Friendly => "friendly",
            Self::Professional => "professional",
            Self::Casual => "casual",
            Self::Energetic => "energetic",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "friendly" => Some(Self::Friendly),
            "professional" => Some(Self::Professional),
            "casual" => Some(Self::Casual),
            "energetic" => Some(Self::Energetic),
            _ => None,
        }
    }

    /// Unknown or missing settings fall back to [`Tone::Friendly`].
    pub fn from_setting(value: Option<&str>) -> Self {
        value.and_then(Self::parse).unwrap_or_default()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreProfile {
    pub id: StoreId,
    pub display_name: String,
    pub tone: Tone,
}

impl StoreProfile {
    pub fn new(id: StoreId, display_name: Option<String>, tone: Tone) -> Self {
        let display_name = display_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_STORE_NAME.to_string());
        Self { id, display_name, tone }
    }
}

#[cfg(test)]
mod tests {
    use super::{StoreId, StoreProfile, Tone, DEFAULT_STORE_NAME};

    #[test]
    fn unknown_tone_setting_falls_back_to_friendly() {
        assert_eq!(Tone::from_setting(Some("sarcastic")), Tone::Friendly);
        assert_eq!(Tone::from_setting(None), Tone::Friendly);
        assert_eq!(Tone::from_setting(Some(" Energetic ")), Tone::Energetic);
    }

    #[test]
    fn blank_display_name_uses_default_store_name() {
        let profile = StoreProfile::new(StoreId("S1".to_string()), Some("  ".to_string()), Tone::Casual);
        assert_eq!(profile.display_name, DEFAULT_STORE_NAME);

        let named =
            StoreProfile::new(StoreId("S2".to_string()), Some("Gadget Barn".to_string()), Tone::Casual);
        assert_eq!(named.display_name, "Gadget Barn");
    }
}
