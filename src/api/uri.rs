use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::Regex;

const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// A fixed path template with `{placeholder}` segments, e.g.
/// `/gdc/projects/{projectId}/model/diff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UriTemplate(&'static str);

impl UriTemplate {
    /// Wrap a template string.
    pub const fn new(template: &'static str) -> Self {
        Self(template)
    }

    /// The raw template.
    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Fill the placeholders in order. Values are percent-encoded as path
    /// segments.
    pub fn expand(&self, values: &[&str]) -> String {
        let mut out = String::with_capacity(self.0.len());
        let mut values = values.iter();
        let mut rest = self.0;

        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start..].find('}') else {
                break;
            };

            out.push_str(&rest[..start]);
            match values.next() {
                Some(v) => out.extend(utf8_percent_encode(v, SEGMENT)),
                None => out.push_str(&rest[start..start + len + 1]),
            }
            rest = &rest[start + len + 1..];
        }

        debug_assert!(values.next().is_none(), "too many values for {}", self.0);
        out.push_str(rest);
        out
    }

    /// Match a path or absolute URI against the template, returning the
    /// placeholder values in order. A trailing query string is ignored.
    pub fn match_uri(&self, uri: &str) -> Option<Vec<String>> {
        let path = match uri.parse::<http::Uri>() {
            Ok(parsed) if parsed.scheme().is_some() => parsed.path().to_owned(),
            _ => uri.split('?').next().unwrap_or(uri).to_owned(),
        };

        let regex = Regex::new(&self.pattern()).ok()?;
        let caps = regex.captures(&path)?;

        caps.iter()
            .skip(1)
            .map(|m| {
                let raw = m?.as_str();
                Some(
                    percent_encoding::percent_decode_str(raw)
                        .decode_utf8_lossy()
                        .into_owned(),
                )
            })
            .collect()
    }

    /// Whether `uri` matches the template.
    pub fn matches(&self, uri: &str) -> bool {
        self.match_uri(uri).is_some()
    }

    fn pattern(&self) -> String {
        let mut pattern = String::from(r"\A");
        let mut rest = self.0;

        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start..].find('}') else {
                break;
            };

            pattern.push_str(&regex::escape(&rest[..start]));
            pattern.push_str("([^/]+)");
            rest = &rest[start + len + 1..];
        }

        pattern.push_str(&regex::escape(rest));
        pattern.push_str(r"\z");
        pattern
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}
