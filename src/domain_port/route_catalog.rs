/// Route sensitivity, maintained outside the code (the API document).
pub trait RouteCatalog: Send + Sync {
    /// The operation declares a security requirement.
    fn is_protected(&self, path: &str, method: &str) -> Result<bool, RouteCatalogError>;

    /// The operation is documented, so its response depends on who is asking
    /// and a browser navigation to it has to be replayed with credentials.
    fn requires_authentication(&self, path: &str, method: &str)
    -> Result<bool, RouteCatalogError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RouteCatalogError {
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),
    #[error("route catalog unavailable: {0}")]
    Unavailable(String),
}
