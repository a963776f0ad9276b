//! Option aliases
//!
//! Maps the option names users type to the keys found in a stack's `.env`
//! file. Keys within one group are expected to carry the same value; the first
//! key is the one read.

/// Known option names and the `.env` keys behind them
pub const ENV_ALIASES: &[(&str, &[&str])] = &[
    ("postgres_password", &["POSTGRES_PASSWORD"]),
    ("jwt_secret", &["JWT_SECRET"]),
    ("anon_jwt", &["ANON_KEY"]),
    ("service_jwt", &["SERVICE_ROLE_KEY"]),
    ("public_url", &["SITE_URL"]),
    ("site_url", &["SITE_URL"]),
    ("api_url", &["SUPABASE_PUBLIC_URL", "API_EXTERNAL_URL"]),
    ("postgres_port", &["POSTGRES_PORT"]),
    ("public_port", &["STUDIO_PORT"]),
    ("api_port", &["KONG_HTTP_PORT"]),
    ("organization", &["STUDIO_DEFAULT_ORGANIZATION"]),
    ("project", &["STUDIO_DEFAULT_PROJECT"]),
    ("smtp_mail", &["SMTP_ADMIN_EMAIL"]),
    ("smtp_host", &["SMTP_HOST"]),
    ("smtp_port", &["SMTP_PORT"]),
    ("smtp_user", &["SMTP_USER"]),
    ("smtp_password", &["SMTP_PASS"]),
    ("smtp_name", &["SMTP_SENDER_NAME"]),
];

/// Look up the key group of a known option name
pub fn lookup(name: &str) -> Option<&'static [&'static str]> {
    ENV_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, keys)| *keys)
}

/// Resolve an option name to its `.env` keys.
///
/// Unknown names pass through unchanged, so raw keys such as `SMTP_HOST`
/// can be used directly.
pub fn resolve(name: &str) -> Vec<&str> {
    match lookup(name) {
        Some(keys) => keys.to_vec(),
        None => vec![name],
    }
}

/// All known aliases in declaration order
pub fn aliases() -> impl Iterator<Item = (&'static str, &'static [&'static str])> {
    ENV_ALIASES.iter().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_alias() {
        assert_eq!(
            resolve("api_url"),
            vec!["SUPABASE_PUBLIC_URL", "API_EXTERNAL_URL"]
        );
        assert_eq!(resolve("smtp_password"), vec!["SMTP_PASS"]);
    }

    #[test]
    fn test_resolve_passes_unknown_names_through() {
        assert_eq!(resolve("DASHBOARD_USERNAME"), vec!["DASHBOARD_USERNAME"]);
        // Lookup is case-sensitive
        assert_eq!(resolve("API_URL"), vec!["API_URL"]);
    }

    #[test]
    fn test_every_group_is_non_empty() {
        for (alias, keys) in aliases() {
            assert!(!keys.is_empty(), "Alias '{}' has no keys", alias);
        }
        assert_eq!(aliases().count(), 18);
    }

    #[test]
    fn test_url_aliases_share_a_key() {
        assert_eq!(lookup("public_url"), lookup("site_url"));
    }
}
