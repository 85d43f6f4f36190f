use validator::validate_email;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    pub fn parse(email: String) -> Result<SubscriberEmail, String> {
        let email = email.trim().to_string();
        // validator accepts dotless domains ("a@localhost"), a newsletter address needs one
        let has_dotted_domain = email
            .rsplit_once('@')
            .map(|(local, domain)| {
                !local.is_empty()
                    && domain
                        .split_once('.')
                        .map_or(false, |(head, tail)| !head.is_empty() && !tail.is_empty())
            })
            .unwrap_or(false);

        if !has_dotted_domain || !validate_email(&email) {
            return Err(format!("{} email is not valid", email));
        }

        Ok(Self(email))
    }
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubscriberEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
