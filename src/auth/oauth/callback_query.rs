//! Query parameters of an installation callback.

use std::collections::BTreeMap;

/// The full parameter set of an installation callback request.
///
/// The platform signs every parameter it sends, including ones this crate
/// does not otherwise use (`host`, `timestamp`, and any added later), so the
/// complete set is kept in arrival order rather than as a fixed struct.
/// Repeated names are allowed.
///
/// # Example
///
/// ```rust
/// use cart_guardian::auth::oauth::CallbackParams;
///
/// let params = CallbackParams::from_query_string(
///     "shop=demo.example&code=abc123&timestamp=1700000000&hmac=deadbeef",
/// );
/// assert_eq!(params.get("code"), Some("abc123"));
/// assert_eq!(params.signable_string(), "code=abc123&shop=demo.example&timestamp=1700000000");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pairs: Vec<(String, String)>,
}

impl CallbackParams {
    /// Name of the parameter that carries the signature.
    pub const SIGNATURE_PARAM: &'static str = "hmac";

    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parameter set from already-decoded pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parses a raw query string (with or without a leading `?`).
    ///
    /// Names and values are form-decoded (`+` is a space, `%XX` escapes are
    /// resolved). Malformed escapes are kept verbatim.
    #[must_use]
    pub fn from_query_string(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self::from_pairs(query.split('&').filter(|s| !s.is_empty()).map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            (form_decode(name), form_decode(value))
        }))
    }

    /// Appends a parameter.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    /// Returns the first value of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns every value of `name` in arrival order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over all parameters in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Builds the message the platform signed.
    ///
    /// Every parameter except `hmac`, grouped by name and sorted by name in
    /// byte order, rendered as `name=value` and joined with `&`. A name that
    /// occurs more than once renders its values joined by `", "`.
    #[must_use]
    pub fn signable_string(&self) -> String {
        let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (name, value) in self.iter() {
            if name != Self::SIGNATURE_PARAM {
                grouped.entry(name).or_default().push(value);
            }
        }

        grouped
            .into_iter()
            .map(|(name, values)| format!("{name}={}", values.join(", ")))
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn form_decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).map_or(spaced.clone(), |decoded| decoded.into_owned())
}
