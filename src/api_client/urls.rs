//! URL and dedup key building for provider endpoints

use url::form_urlencoded;

use crate::error::AppError;

/// Joins the base URL and an endpoint path.
///
/// # Example
/// ```
/// use fixture_dispatch::api_client::build_endpoint_url;
///
/// let url = build_endpoint_url("https://v3.football.api-sports.io/", "fixtures/events");
/// assert_eq!(url, "https://v3.football.api-sports.io/fixtures/events");
/// ```
pub fn build_endpoint_url(base_url: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

/// Builds the dedup key for one logical remote call.
///
/// The key depends only on the endpoint and the parameter set, never on the
/// order the parameters were given in, so identical requests from different
/// callers coalesce.
///
/// # Example
/// ```
/// use fixture_dispatch::api_client::request_key;
///
/// let a = request_key("/fixtures", &[("season", "2024"), ("league", "39")]);
/// let b = request_key("fixtures", &[("league", "39"), ("season", "2024")]);
/// assert_eq!(a, "/fixtures?league=39&season=2024");
/// assert_eq!(a, b);
/// ```
pub fn request_key<K, V>(endpoint: &str, params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let endpoint = format!("/{}", endpoint.trim_start_matches('/'));
    if params.is_empty() {
        return endpoint;
    }

    let mut pairs: Vec<(&str, &str)> = params
        .iter()
        .map(|(k, v)| (k.as_ref(), v.as_ref()))
        .collect();
    pairs.sort_unstable();

    // Encoded like the real query string, so `&` or `=` inside a value
    // cannot make two different requests share a key
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    format!("{endpoint}?{query}")
}

/// Parses a request given as `/endpoint?name=value&name2=value2`.
///
/// # Returns
/// * `Ok((endpoint, params))` - Endpoint path and parameters in given order
/// * `Err(AppError::Config)` - Empty endpoint or a parameter without `=`
pub fn parse_request(spec: &str) -> Result<(String, Vec<(String, String)>), AppError> {
    let (path, query) = spec.trim().split_once('?').unwrap_or((spec.trim(), ""));
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return Err(AppError::config_error(format!(
            "Request '{spec}' has no endpoint"
        )));
    }

    let params = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| {
                    AppError::config_error(format!(
                        "Parameter '{pair}' in request '{spec}' is missing '='"
                    ))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok((format!("/{path}"), params))
}
