//! Endpoint families described as data.
//!
//! A [`NetworkConfiguration`] names a base URL, the headers every request to
//! that service must carry, a resource path and a query. The provided
//! [`NetworkConfiguration::make_request`] turns those pieces into an
//! [`HttpRequest`].

use url::Url;

use crate::error::RequestError;
use crate::types::{HttpRequest, Method, QueryItem};

/// Describes one endpoint of a remote service.
///
/// # Example
///
/// ```ignore
/// struct Titles { base: Url, page: u32 }
///
/// impl NetworkConfiguration for Titles {
///     fn base_url(&self) -> &Url { &self.base }
///     fn path(&self) -> &str { "titles" }
///     fn query_items(&self) -> Vec<QueryItem> {
///         vec![QueryItem::new("page", self.page.to_string())]
///     }
/// }
///
/// let request = Titles { base, page: 1 }.make_request(Method::GET)?;
/// // GET https://api.example.com/titles?page=1
/// ```
pub trait NetworkConfiguration {
    /// Absolute URL of the service.
    fn base_url(&self) -> &Url;

    /// Headers applied, in order, to every request built from this
    /// configuration.
    ///
    /// Names are case-insensitive: when two entries name the same header the
    /// later one wins.
    fn required_headers(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Resource path appended to the base URL.
    fn path(&self) -> &str;

    /// Query items, in order. They replace any query on the base URL.
    fn query_items(&self) -> Vec<QueryItem> {
        Vec::new()
    }

    /// Build a request for this endpoint.
    fn make_request(&self, method: Method) -> Result<HttpRequest, RequestError> {
        let url = compose_url(self.base_url(), self.path(), &self.query_items())?;
        let mut request = HttpRequest::new(method, url);
        for (name, value) in self.required_headers() {
            request.set_header(&name, &value)?;
        }
        Ok(request)
    }
}

/// Append `path` to `base` and replace its query with `query`.
pub fn compose_url(base: &Url, path: &str, query: &[QueryItem]) -> Result<Url, RequestError> {
    if base.cannot_be_a_base() {
        return Err(RequestError::InvalidUrl {
            message: format!("'{}' cannot carry a path", base),
        });
    }

    let mut url = base.clone();
    let path = path.trim_start_matches('/');
    if !path.is_empty() {
        let joined = format!("{}/{}", url.path().trim_end_matches('/'), path);
        url.set_path(&joined);
    }

    url.set_query(None);
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for item in query {
            match &item.value {
                Some(value) => pairs.append_pair(&item.name, value),
                None => pairs.append_key_only(&item.name),
            };
        }
    }

    Ok(url)
}
