use crate::domain_port::*;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct ApiDocument {
    #[serde(default)]
    paths: HashMap<String, PathItem>,
}

#[derive(Debug, Default, Deserialize)]
struct PathItem {
    get: Option<Operation>,
    post: Option<Operation>,
    put: Option<Operation>,
    delete: Option<Operation>,
    patch: Option<Operation>,
}

#[derive(Debug, Deserialize)]
struct Operation {
    #[serde(default)]
    security: Vec<serde_json::Value>,
}

impl PathItem {
    fn operation(&self, method: &str) -> Result<Option<&Operation>, RouteCatalogError> {
        let op = match method.to_ascii_uppercase().as_str() {
            "GET" => &self.get,
            "POST" => &self.post,
            "PUT" => &self.put,
            "DELETE" => &self.delete,
            "PATCH" => &self.patch,
            other => return Err(RouteCatalogError::UnsupportedMethod(other.to_string())),
        };
        Ok(op.as_ref())
    }
}

/// Route sensitivity read from a Swagger/OpenAPI JSON document: an operation
/// with a non-empty `security` list is protected.
#[derive(Debug)]
pub struct OpenApiRouteCatalog {
    paths: HashMap<String, PathItem>,
}

impl OpenApiRouteCatalog {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RouteCatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            RouteCatalogError::Unavailable(format!("{}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, RouteCatalogError> {
        let doc: ApiDocument =
            serde_json::from_str(raw).map_err(|e| RouteCatalogError::Unavailable(e.to_string()))?;
        Ok(OpenApiRouteCatalog { paths: doc.paths })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    fn operation(&self, path: &str, method: &str) -> Result<Option<&Operation>, RouteCatalogError> {
        match self.paths.get(path) {
            Some(item) => item.operation(method),
            None => Ok(None),
        }
    }
}

impl RouteCatalog for OpenApiRouteCatalog {
    fn is_protected(&self, path: &str, method: &str) -> Result<bool, RouteCatalogError> {
        Ok(self
            .operation(path, method)?
            .is_some_and(|op| !op.security.is_empty()))
    }

    fn requires_authentication(
        &self,
        path: &str,
        method: &str,
    ) -> Result<bool, RouteCatalogError> {
        Ok(self.operation(path, method)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DOC: &str = r#"{
        "swagger": "2.0",
        "paths": {
            "/": { "get": { "responses": {} } },
            "/private": {
                "get": { "security": [{ "JWT": [] }] },
                "post": { "security": [] }
            }
        }
    }"#;

    #[test]
    fn security_list_marks_protection() {
        let catalog = OpenApiRouteCatalog::from_json(DOC).unwrap();
        assert!(catalog.is_protected("/private", "GET").unwrap());
        assert!(catalog.is_protected("/private", "get").unwrap());
        assert!(!catalog.is_protected("/private", "POST").unwrap());
        assert!(!catalog.is_protected("/", "GET").unwrap());
    }

    #[test]
    fn documented_operations_require_authentication() {
        let catalog = OpenApiRouteCatalog::from_json(DOC).unwrap();
        assert!(catalog.requires_authentication("/", "GET").unwrap());
        assert!(!catalog.requires_authentication("/", "DELETE").unwrap());
        assert!(!catalog.requires_authentication("/missing", "GET").unwrap());
    }

    #[test]
    fn unsupported_method_is_an_error() {
        let catalog = OpenApiRouteCatalog::from_json(DOC).unwrap();
        assert!(matches!(
            catalog.is_protected("/private", "OPTIONS"),
            Err(RouteCatalogError::UnsupportedMethod(_))
        ));
    }

    #[test]
    fn loads_from_file_and_fails_fast() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(DOC.as_bytes()).unwrap();
        let catalog = OpenApiRouteCatalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 2);

        assert!(matches!(
            OpenApiRouteCatalog::load("no/such/swagger.json"),
            Err(RouteCatalogError::Unavailable(_))
        ));
        assert!(OpenApiRouteCatalog::from_json("{ not json").is_err());
    }
}
