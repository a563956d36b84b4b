//! Filter arguments for the listing endpoints.

/// One or more names, accepted wherever the catalog takes a comma-separated list.
///
/// Converts from a single string or any list of strings; the order given is
/// the order sent. An empty single string means "no names".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Names(Vec<String>);

impl Names {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub(crate) fn joined(&self) -> String {
        self.0.join(",")
    }
}

impl From<&str> for Names {
    fn from(s: &str) -> Self {
        Names::from(s.to_string())
    }
}

impl From<String> for Names {
    fn from(s: String) -> Self {
        if s.is_empty() { Names(Vec::new()) } else { Names(vec![s]) }
    }
}

impl From<&String> for Names {
    fn from(s: &String) -> Self {
        Names::from(s.clone())
    }
}

impl From<Vec<String>> for Names {
    fn from(v: Vec<String>) -> Self {
        Names(v)
    }
}

impl From<Vec<&str>> for Names {
    fn from(v: Vec<&str>) -> Self {
        Names(v.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Names {
    fn from(v: &[&str]) -> Self {
        Names(v.iter().map(|s| s.to_string()).collect())
    }
}

impl From<&[String]> for Names {
    fn from(v: &[String]) -> Self {
        Names(v.to_vec())
    }
}

impl<const N: usize> From<[&str; N]> for Names {
    fn from(v: [&str; N]) -> Self {
        Names(v.iter().map(|s| s.to_string()).collect())
    }
}

/// Filters for [`Client::datacollections`](crate::Client::datacollections).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatacollectionFilter {
    tasks: Names,
    domains: Names,
    time_limits: Option<(i64, i64)>,
    limit: usize,
}

impl DatacollectionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Task number names, e.g. `"Electromagnetic / 2.1"`.
    pub fn tasks(mut self, tasks: impl Into<Names>) -> Self {
        self.tasks = tasks.into();
        self
    }

    pub fn domains(mut self, domains: impl Into<Names>) -> Self {
        self.domains = domains.into();
        self
    }

    /// Restricts to datacollections within `[start, end]` (Unix timestamps).
    pub fn time_limits(mut self, start: i64, end: i64) -> Self {
        self.time_limits = Some((start, end));
        self
    }

    /// Maximum number of datacollections; 0 means no limit.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub(crate) fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if !self.tasks.is_empty() {
            params.push(("tasks", self.tasks.joined()));
        }
        if !self.domains.is_empty() {
            params.push(("domains", self.domains.joined()));
        }
        if let Some((start, end)) = self.time_limits {
            params.push(("time_limits", format!("{},{}", start, end)));
        }
        if self.limit > 0 {
            params.push(("limit", self.limit.to_string()));
        }
        params
    }
}

/// Filters for [`Client::files`](crate::Client::files).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileFilter {
    datacollections: Names,
    extensions: Names,
    limit: usize,
}

impl FileFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn datacollections(mut self, datacollections: impl Into<Names>) -> Self {
        self.datacollections = datacollections.into();
        self
    }

    /// Desired extensions, either as a list or already comma-separated (`"json,txt"`).
    pub fn extensions(mut self, extensions: impl Into<Names>) -> Self {
        self.extensions = extensions.into();
        self
    }

    /// Maximum number of datacollections returned; 0 means no limit.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub(crate) fn params(&self) -> Vec<(&'static str, String)> {
        // The files endpoint always receives a limit, even 0.
        let mut params = vec![("limit", self.limit.to_string())];
        if !self.datacollections.is_empty() {
            params.push(("datacollections", self.datacollections.joined()));
        }
        if !self.extensions.is_empty() {
            params.push(("extensions", self.extensions.joined()));
        }
        params
    }
}
