/*
 * Responsibility
 * - Path prefix → backend service mapping (Route Dispatch)
 * - Parsing of the GATEWAY_ROUTES configuration value
 * - Building the upstream URL for a request target
 */
use std::fmt;

use axum::http::Uri;
use url::Url;

pub const DEFAULT_ROUTES: &str = "\
admin-service=/admin=http://localhost:8081,\
user-service=/user=http://localhost:8082,\
notification-service=/noti=http://localhost:8083,\
dashboard-service=/home=http://localhost:8084,\
sensors-service=/sensors=http://localhost:8085,\
report-service=/reports=http://localhost:8086,\
chatbot-service=/chatbot=http://localhost:8087";

#[derive(Debug, PartialEq, Eq)]
pub enum RouteTableError {
    MalformedEntry(String),
    InvalidPrefix(String),
    InvalidUri(String),
    DuplicateId(String),
}

impl fmt::Display for RouteTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedEntry(e) => write!(f, "route entry must be id=prefix=uri: {}", e),
            Self::InvalidPrefix(p) => write!(f, "route prefix must start with '/': {}", p),
            Self::InvalidUri(u) => write!(f, "route uri must be an absolute http(s) url: {}", u),
            Self::DuplicateId(id) => write!(f, "duplicate route id: {}", id),
        }
    }
}

impl std::error::Error for RouteTableError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub id: String,
    pub prefix: String,
    pub uri: Url,
}

impl Route {
    /// `Path=/prefix/**` semantics: the prefix itself or anything below it.
    pub fn matches(&self, path: &str) -> bool {
        path_has_prefix(path, &self.prefix)
    }

    /// Backend URL for `target`: backend scheme/authority + original path and query.
    pub fn upstream_url(&self, target: &Uri) -> Url {
        let mut url = self.uri.clone();
        url.set_path(target.path());
        url.set_query(target.query());
        url
    }
}

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Parse comma-separated `id=prefix=uri` entries.
    pub fn parse(raw: &str) -> Result<Self, RouteTableError> {
        let mut routes: Vec<Route> = Vec::new();

        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let mut fields = entry.splitn(3, '=').map(str::trim);
            let (Some(id), Some(prefix), Some(uri)) = (fields.next(), fields.next(), fields.next())
            else {
                return Err(RouteTableError::MalformedEntry(entry.to_string()));
            };
            if id.is_empty() {
                return Err(RouteTableError::MalformedEntry(entry.to_string()));
            }
            if !prefix.starts_with('/') {
                return Err(RouteTableError::InvalidPrefix(prefix.to_string()));
            }

            let uri = Url::parse(uri).map_err(|_| RouteTableError::InvalidUri(uri.to_string()))?;
            if !matches!(uri.scheme(), "http" | "https") || uri.host().is_none() {
                return Err(RouteTableError::InvalidUri(uri.to_string()));
            }

            if routes.iter().any(|r| r.id == id) {
                return Err(RouteTableError::DuplicateId(id.to_string()));
            }

            routes.push(Route {
                id: id.to_string(),
                prefix: normalize_prefix(prefix),
                uri,
            });
        }

        Ok(Self { routes })
    }

    /// Longest matching prefix wins.
    pub fn resolve(&self, path: &str) -> Option<&Route> {
        self.routes
            .iter()
            .filter(|r| r.matches(path))
            .max_by_key(|r| r.prefix.len())
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Segment-aware prefix test: `/admin` covers `/admin` and `/admin/x`, not `/administrator`.
pub fn path_has_prefix(path: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_parses() {
        let table = RouteTable::parse(DEFAULT_ROUTES).unwrap();
        assert_eq!(table.routes().len(), 7);
        assert_eq!(table.resolve("/admin/users").unwrap().id, "admin-service");
        assert_eq!(table.resolve("/user/profile").unwrap().id, "user-service");
        assert_eq!(table.resolve("/noti/alerts").unwrap().id, "notification-service");
        assert_eq!(table.resolve("/home/overview").unwrap().id, "dashboard-service");
        assert_eq!(table.resolve("/sensors/data").unwrap().id, "sensors-service");
        assert_eq!(table.resolve("/reports/monthly").unwrap().id, "report-service");
        assert_eq!(table.resolve("/chatbot/message").unwrap().id, "chatbot-service");
    }

    #[test]
    fn unknown_path_has_no_route() {
        let table = RouteTable::parse(DEFAULT_ROUTES).unwrap();
        assert!(table.resolve("/nonexistent/path").is_none());
        assert!(table.resolve("/administrator").is_none());
        assert!(table.resolve("/").is_none());
    }

    #[test]
    fn prefix_itself_matches() {
        let table = RouteTable::parse("a=/admin=http://localhost:1").unwrap();
        assert!(table.resolve("/admin").is_some());
        assert!(table.resolve("/admin/").is_some());
    }

    #[test]
    fn longest_prefix_wins() {
        let table = RouteTable::parse(
            "api=/api=http://localhost:1, reports=/api/reports/=http://localhost:2",
        )
        .unwrap();
        assert_eq!(table.resolve("/api/reports/7").unwrap().id, "reports");
        assert_eq!(table.resolve("/api/users").unwrap().id, "api");
    }

    #[test]
    fn upstream_url_keeps_path_and_query() {
        let table = RouteTable::parse("a=/admin=http://backend:8081/ignored").unwrap();
        let route = table.resolve("/admin/users").unwrap();
        let target: Uri = "/admin/users?page=2&size=10".parse().unwrap();

        assert_eq!(
            route.upstream_url(&target).as_str(),
            "http://backend:8081/admin/users?page=2&size=10"
        );
    }

    #[test]
    fn rejects_bad_entries() {
        assert_eq!(
            RouteTable::parse("admin=/admin").unwrap_err(),
            RouteTableError::MalformedEntry("admin=/admin".to_string())
        );
        assert!(matches!(
            RouteTable::parse("admin=admin=http://localhost:1"),
            Err(RouteTableError::InvalidPrefix(_))
        ));
        assert!(matches!(
            RouteTable::parse("admin=/admin=localhost:1"),
            Err(RouteTableError::InvalidUri(_))
        ));
        assert!(matches!(
            RouteTable::parse("a=/x=http://h:1,a=/y=http://h:2"),
            Err(RouteTableError::DuplicateId(_))
        ));
    }

    #[test]
    fn empty_config_is_an_empty_table() {
        assert!(RouteTable::parse(" , ").unwrap().routes().is_empty());
    }
}
