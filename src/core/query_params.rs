use std::collections::HashMap;

use serde::Deserialize;

/// `?page=` as sent by the pagination links. Kept as a string so that garbage
/// values fall back to the first page instead of rejecting the request.
#[derive(Deserialize, Debug, Default)]
pub struct PageParams {
    pub page: Option<String>,
}

impl PageParams {
    pub fn requested(&self) -> Option<i64> {
        self.page.as_ref().and_then(|s| s.trim().parse::<i64>().ok())
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct NextParams {
    pub next: Option<String>,
}

/// Parse an `application/x-www-form-urlencoded` body.
///
/// `+` decodes to a space and percent escapes are decoded. Multiple values for
/// the same key are not supported (only the last is kept).
///
/// # Example
/// ```
/// use gazette::core::query_params::parse_form_pairs;
/// let params = parse_form_pairs("text=hello+world&group=2");
/// assert_eq!(params.get("text"), Some(&"hello world".to_string()));
/// assert_eq!(params.get("group"), Some(&"2".to_string()));
/// ```
pub fn parse_form_pairs(body: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    for param in body.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = match param.find('=') {
            Some(eq_idx) => (&param[..eq_idx], &param[eq_idx + 1..]),
            None => (param, ""),
        };
        params.insert(decode_component(key), decode_component(value));
    }

    params
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_plus_and_percent_escapes() {
        let params = parse_form_pairs("text=caf%C3%A9+au+lait&group=");
        assert_eq!(params["text"], "café au lait");
        assert_eq!(params["group"], "");
    }

    #[test]
    fn flag_without_value_is_empty() {
        let params = parse_form_pairs("remember&x=1");
        assert_eq!(params["remember"], "");
        assert_eq!(params["x"], "1");
        assert!(!params.contains_key("missing"));
    }

    #[test]
    fn page_param_ignores_garbage() {
        let p = PageParams { page: Some("abc".into()) };
        assert_eq!(p.requested(), None);
        let p = PageParams { page: Some(" 3 ".into()) };
        assert_eq!(p.requested(), Some(3));
        assert_eq!(PageParams::default().requested(), None);
    }
}
