//! Request line parsing.
//!
//! A request line is the single textual input of the harness:
//!
//! ```text
//! GET api/with_querystring_params_and_pathparams/ppvalue?qs1=qsval1
//! └┬┘ └──────────────────────┬─────────────────────────┘ └───┬────┘
//! method                    path                            query
//! ```

use url::Url;

use crate::error::{RouterError, RouterResult};
use crate::params::Params;

/// Placeholder origin used to resolve request targets into URLs.
const PLACEHOLDER_ORIGIN: &str = "https://fakehost.com/";

/// A parsed `METHOD target` request line.
///
/// # Example
///
/// ```
/// use hermes_router::RequestLine;
///
/// let line = RequestLine::parse("GET api/hello%20world?greeting=hi").unwrap();
/// assert_eq!(line.method(), "GET");
/// assert_eq!(line.target(), "api/hello%20world?greeting=hi");
/// assert_eq!(line.path(), "/api/hello world");
/// assert_eq!(line.query().unwrap().get("greeting"), Some("hi"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine<'a> {
    raw: &'a str,
    method: &'a str,
    target: &'a str,
}

impl<'a> RequestLine<'a> {
    /// Splits a request line into its method token and target.
    pub fn parse(raw: &'a str) -> RouterResult<Self> {
        let trimmed = raw.trim();
        let (method, target) = trimmed
            .split_once(char::is_whitespace)
            .ok_or_else(|| {
                RouterError::malformed_request(
                    raw,
                    "expected a method separated by a space and then the request path",
                )
            })?;

        Ok(Self {
            raw,
            method,
            target: target.trim_start(),
        })
    }

    /// The literal request line.
    #[must_use]
    pub fn as_str(&self) -> &'a str {
        self.raw
    }

    /// The method token, verbatim.
    #[must_use]
    pub fn method(&self) -> &'a str {
        self.method
    }

    /// Everything after the method: path plus optional query.
    #[must_use]
    pub fn target(&self) -> &'a str {
        self.target
    }

    /// The percent-decoded path, always starting with `/`, query stripped.
    #[must_use]
    pub fn path(&self) -> String {
        let raw_path = match Url::parse(PLACEHOLDER_ORIGIN)
            .and_then(|origin| origin.join(self.target.trim_start_matches('/')))
        {
            Ok(url) => url.path().to_string(),
            Err(_) => {
                let path = strip_query(self.target);
                format!("/{}", path.trim_start_matches('/'))
            }
        };
        String::from_utf8_lossy(&urlencoding::decode_binary(raw_path.as_bytes())).into_owned()
    }

    /// The decoded query parameters (empty when there is no query).
    pub fn query(&self) -> RouterResult<Params> {
        parse_query(self.raw)
    }
}

/// Parses the query portion of a request line into ordered parameters.
///
/// Standard form decoding applies: `&`-separated pairs, `=`-separated key and
/// value, percent-decoding, `+` as space. A key without `=` maps to `""`.
/// When a key repeats, the last value wins and the key keeps its first
/// position. Returns an empty map when no `?` is present.
///
/// # Example
///
/// ```
/// use hermes_router::parse_query;
///
/// let params = parse_query("GET x?p1=val1&p2=val%202&flag").unwrap();
/// assert_eq!(params.get("p1"), Some("val1"));
/// assert_eq!(params.get("p2"), Some("val 2"));
/// assert_eq!(params.get("flag"), Some(""));
///
/// assert!(parse_query("GET x").unwrap().is_empty());
/// ```
pub fn parse_query(request_line: &str) -> RouterResult<Params> {
    let Some((_, query)) = without_fragment(request_line).split_once('?') else {
        return Ok(Params::new());
    };

    let pairs: Vec<(String, String)> =
        serde_urlencoded::from_str(query).map_err(|e| RouterError::InvalidQuery {
            request: request_line.to_string(),
            reason: e.to_string(),
        })?;

    Ok(pairs.into_iter().collect())
}

fn without_fragment(s: &str) -> &str {
    s.split_once('#').map_or(s, |(before, _)| before)
}

fn strip_query(s: &str) -> &str {
    let s = without_fragment(s);
    s.split_once('?').map_or(s, |(before, _)| before)
}
