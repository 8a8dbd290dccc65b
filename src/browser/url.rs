use crate::error::{AxviewError, Result};

/// Turn what the user typed into the location bar into a navigable URL.
///
/// Anything without a scheme gets `https://`. `host:port` is not mistaken for
/// a scheme.
pub fn normalize_url(raw: &str) -> Result<String> {
    let input = raw.trim();
    if input.is_empty() {
        return Err(AxviewError::InvalidUrl("empty input".to_string()));
    }

    if let Some(rest) = input.strip_prefix("//") {
        return Ok(format!("https://{}", rest));
    }

    if has_scheme(input) {
        Ok(input.to_string())
    } else {
        Ok(format!("https://{}", input))
    }
}

fn has_scheme(input: &str) -> bool {
    let Some((scheme, rest)) = input.split_once(':') else {
        return false;
    };

    let valid = scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !valid {
        return false;
    }
    if rest.starts_with("//") {
        return true;
    }

    // localhost:3000/path
    let port_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let port = &rest[..port_end];
    port.is_empty() || !port.chars().all(|c| c.is_ascii_digit())
}
