//! Redaction of secrets (tokens, keys, webhook URLs) before they reach logs or stdout.

/// Keep the first and last four characters of a secret; mask anything of eight chars or less.
pub fn redact_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "********".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Keep scheme, host and port of a URL; the path, query and credentials often carry tokens.
///
/// Unparseable input is treated as an opaque secret.
pub fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(u) => {
            let host = u.host_str().unwrap_or("");
            let port = u.port().map(|p| format!(":{}", p)).unwrap_or_default();
            let hidden = if u.path() != "/" || u.query().is_some() {
                "..."
            } else {
                ""
            };
            format!("{}://{}{}/{}", u.scheme(), host, port, hidden)
        }
        Err(_) => redact_secret(raw),
    }
}
