use unicode_segmentation::UnicodeSegmentation;

const MAX_GRAPHEMES: usize = 256;
const FORBIDDEN_CHARS: [char; 9] = ['/', '{', '}', '"', '>', '<', '\\', '(', ')'];

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SubscriberName(String);

impl SubscriberName {
    pub fn parse(name: String) -> Result<SubscriberName, String> {
        let name = name.trim();

        if name.is_empty() {
            return Err(String::from("subscriber name is blank"));
        }
        if name.graphemes(true).count() > MAX_GRAPHEMES {
            return Err(format!("subscriber name is longer than {} characters", MAX_GRAPHEMES));
        }
        if let Some(forbidden) = name.chars().find(|char| FORBIDDEN_CHARS.contains(char)) {
            return Err(format!("{} contains the forbidden character {}", name, forbidden));
        }

        Ok(Self(name.to_string()))
    }

    /// Signup names are optional, a blank one counts as missing.
    pub fn parse_optional(name: Option<String>) -> Result<Option<SubscriberName>, String> {
        match name {
            Some(name) if !name.trim().is_empty() => Self::parse(name).map(Some),
            _ => Ok(None),
        }
    }
}

impl AsRef<str> for SubscriberName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
