use super::RequestFacade;

/// In-memory request used by unit tests.
#[derive(Debug, Default)]
pub(crate) struct FakeRequest {
    query: Vec<(String, String)>,
    path: Vec<(String, String)>,
    headers: Vec<(String, String)>,
}

impl FakeRequest {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub(crate) fn path(mut self, key: &str, value: &str) -> Self {
        self.path.push((key.to_string(), value.to_string()));
        self
    }

    pub(crate) fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }
}

impl RequestFacade for FakeRequest {
    fn query_values(&self, name: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    fn path_param(&self, name: &str) -> Option<&str> {
        self.path
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
