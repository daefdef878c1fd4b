//! Share targets for a finished summary.

use url::Url;

const CHAT_SHARE_BASE: &str = "https://wa.me/";

/// Chat share link carrying the (emphasized) summary as prefilled text.
pub fn chat_share_url(text: &str) -> Result<Url, url::ParseError> {
    Url::parse_with_params(CHAT_SHARE_BASE, &[("text", text)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_url_round_trips_text() {
        let text = "*סיכום משמרת NOC - בוקר*\nבקרים: דנה ו- עומר\n\n1. אתר 12 (צפון)";
        let url = chat_share_url(text).unwrap();

        assert_eq!(url.host_str(), Some("wa.me"));
        let (key, value) = url.query_pairs().next().unwrap();
        assert_eq!(key, "text");
        assert_eq!(value, text);
    }

    #[test]
    fn share_url_is_fully_encoded() {
        let url = chat_share_url("a&b=c\n#d").unwrap();
        let query = url.query().unwrap();
        assert!(!query.contains('\n'));
        assert!(!query.contains('#'));
        assert_eq!(query.matches('&').count(), 0);
    }
}
