/// A JSON `POST` ready to send.
#[derive(Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub json_body: String,
}

impl std::fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redacted_headers: Vec<(String, String)> = self
            .headers
            .iter()
            .map(|(k, v)| {
                let sensitive = k.eq_ignore_ascii_case("authorization")
                    || k.to_ascii_lowercase().contains("api-key");
                let v = if sensitive { "[REDACTED]".into() } else { v.clone() };
                (k.clone(), v)
            })
            .collect();

        // Frame payloads are large and may carry an api_key field; only show the size.
        f.debug_struct("HttpRequest")
            .field("url", &self.url)
            .field("headers", &redacted_headers)
            .field("json_body", &format!("len={}", self.json_body.len()))
            .finish()
    }
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = HttpRequest {
            url: "http://127.0.0.1:5000/process_frame".into(),
            headers: vec![("Accept".into(), "application/json".into())],
            json_body: "{}".into(),
        };
        assert_eq!(req.header("accept"), Some("application/json"));
        assert_eq!(req.header("content-type"), None);
    }

    #[test]
    fn debug_hides_json_body_and_keys() {
        let req = HttpRequest {
            url: "http://127.0.0.1:5000/process_frame".into(),
            headers: vec![
                ("X-Api-Key".into(), "x-789".into()),
                ("Content-Type".into(), "application/json".into()),
            ],
            json_body: r#"{"api_key":"sk-test-123"}"#.into(),
        };

        let s = format!("{req:?}");
        assert!(!s.contains("sk-test-123"));
        assert!(!s.contains("x-789"));
        assert!(s.contains("len=25"));
        assert!(s.contains("[REDACTED]"));
    }
}
