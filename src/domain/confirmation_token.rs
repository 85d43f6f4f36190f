use rand::Rng;

// 43 alphanumeric characters carry ~256 bits of entropy
const TOKEN_LENGTH: usize = 43;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ConfirmationToken(String);

impl ConfirmationToken {
    pub fn generate() -> ConfirmationToken {
        let mut rng = rand::thread_rng();

        let token = std::iter::repeat_with(|| rng.sample(rand::distributions::Alphanumeric))
            .map(char::from)
            .take(TOKEN_LENGTH)
            .collect();

        Self(token)
    }

    pub fn parse(token: String) -> Result<ConfirmationToken, String> {
        let token = token.trim().to_string();

        if token.is_empty() || !token.chars().all(|char| char.is_ascii_alphanumeric()) {
            return Err(format!("{} is not a valid confirmation token", token));
        }

        Ok(Self(token))
    }
}

impl AsRef<str> for ConfirmationToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConfirmationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
