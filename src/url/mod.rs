//! Search URL construction
//!
//! Every request is the configured base URL, followed by the fixed
//! parameter set, followed by `query` and `pageNr`. Escaping is left to
//! the `url` crate's form-urlencoded serializer.

use crate::config::ApiConfig;
use crate::model::PageRequest;
use url::Url;

/// Builds request URLs for a single search endpoint
#[derive(Debug, Clone)]
pub struct SearchUrl {
    base: Url,
    fixed_params: Vec<(String, String)>,
}

impl SearchUrl {
    /// Parses the configured base URL once
    ///
    /// # Returns
    ///
    /// * `Ok(SearchUrl)` - Builder ready to produce page URLs
    /// * `Err(url::ParseError)` - The base URL is malformed
    pub fn new(api: &ApiConfig) -> Result<Self, url::ParseError> {
        let base = Url::parse(&api.base_url)?;
        Ok(Self {
            base,
            fixed_params: api.fixed_params.clone(),
        })
    }

    /// Returns the URL for one page of one term
    ///
    /// # Examples
    ///
    /// ```
    /// use staff_harvest::config::ApiConfig;
    /// use staff_harvest::model::PageRequest;
    /// use staff_harvest::url::SearchUrl;
    ///
    /// let api = ApiConfig {
    ///     base_url: "https://example.edu/search".to_string(),
    ///     fixed_params: vec![("category".to_string(), "employee".to_string())],
    ///     ..ApiConfig::default()
    /// };
    /// let urls = SearchUrl::new(&api).unwrap();
    /// let url = urls.page_url(&PageRequest::new("a b", 2));
    /// assert_eq!(
    ///     url.as_str(),
    ///     "https://example.edu/search?category=employee&query=a+b&pageNr=2"
    /// );
    /// ```
    pub fn page_url(&self, request: &PageRequest) -> Url {
        let mut url = self.base.clone();
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.fixed_params {
                pairs.append_pair(key, value);
            }
            pairs
                .append_pair("query", &request.term)
                .append_pair("pageNr", &request.page.to_string());
        }
        url
    }
}
