use anyhow::{Result, bail};

/// Validate a resource name as a DNS-1123 subdomain.
/// Rules: lowercase `[a-z0-9.-]`, max 253 chars, alphanumeric first and last character.
pub fn validate_name(name: &str) -> Result<()> {
    check("name", name, 253, true)
}

/// Validate a namespace name as a DNS-1123 label.
/// Rules: lowercase `[a-z0-9-]`, max 63 chars, alphanumeric first and last character.
pub fn validate_namespace(namespace: &str) -> Result<()> {
    check("namespace", namespace, 63, false)
}

fn check(what: &str, value: &str, max: usize, allow_dots: bool) -> Result<()> {
    if value.is_empty() {
        bail!("{} must not be empty", what);
    }
    if value.len() > max {
        bail!(
            "{} '{}' exceeds {} characters (got {})",
            what,
            value,
            max,
            value.len()
        );
    }
    let alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    if !value.starts_with(alnum) || !value.ends_with(alnum) {
        bail!(
            "{} '{}' must start and end with a lowercase letter or digit",
            what,
            value
        );
    }
    if !value
        .chars()
        .all(|c| alnum(c) || c == '-' || (allow_dots && c == '.'))
    {
        let allowed = if allow_dots { "[a-z0-9.-]" } else { "[a-z0-9-]" };
        bail!("{} '{}' must contain only {}", what, value, allowed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        assert!(validate_name("deployer").is_ok());
        assert!(validate_name("my-app").is_ok());
        assert!(validate_name("app-123").is_ok());
        assert!(validate_name("a").is_ok());
        assert!(validate_name("system.reader").is_ok());
        assert!(validate_name(&"a".repeat(253)).is_ok());
    }

    #[test]
    fn invalid_names() {
        assert!(validate_name("").is_err());
        assert!(validate_name("My-App").is_err());
        assert!(validate_name("my_app").is_err());
        assert!(validate_name("-leading").is_err());
        assert!(validate_name("trailing-").is_err());
        assert!(validate_name(".dot").is_err());
        assert!(validate_name("special!char").is_err());
        assert!(validate_name(&"a".repeat(254)).is_err());
    }

    #[test]
    fn namespaces_are_labels() {
        assert!(validate_namespace("team-a").is_ok());
        assert!(validate_namespace("kube-system").is_ok());
        assert!(validate_namespace("team.a").is_err());
        assert!(validate_namespace(&"n".repeat(64)).is_err());
        assert!(validate_namespace("").is_err());
    }
}
