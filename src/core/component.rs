//! Component descriptors.

use std::fmt;

/// Where a component's install output lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallScope {
    /// Usable regardless of the configured target (`{destdir}/generic`).
    Generic,
    /// Specific to the configured target triple (`{destdir}/{triple}`).
    Target,
}

impl InstallScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallScope::Generic => "generic",
            InstallScope::Target => "target",
        }
    }
}

impl fmt::Display for InstallScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Static descriptor of one external toolchain dependency.
///
/// The version string is the only input to staleness: bumping it produces
/// a different marker path, so the old marker is simply ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentSpec {
    pub name: String,
    pub version: String,
    pub scope: InstallScope,
    /// Source URLs, fetched and unpacked in order.
    pub sources: Vec<String>,
}

impl ComponentSpec {
    /// Create a descriptor with no sources.
    pub fn new(name: impl Into<String>, version: impl Into<String>, scope: InstallScope) -> Self {
        ComponentSpec {
            name: name.into(),
            version: version.into(),
            scope,
            sources: Vec::new(),
        }
    }

    /// Add a source URL.
    pub fn source(mut self, url: impl Into<String>) -> Self {
        self.sources.push(url.into());
        self
    }

    /// File name of the installed marker, `.{name}-{version}-installed`.
    pub fn marker_name(&self) -> String {
        format!(".{}-{}-installed", self.name, self.version)
    }

    /// Name of the unpacked source tree for tarballs following the
    /// `{name}-{version}` convention.
    pub fn source_dir_name(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }
}

impl fmt::Display for ComponentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_name() {
        let spec = ComponentSpec::new("binutils", "2.28.1", InstallScope::Generic);
        assert_eq!(spec.marker_name(), ".binutils-2.28.1-installed");
        assert_eq!(spec.source_dir_name(), "binutils-2.28.1");
        assert_eq!(spec.to_string(), "binutils@2.28.1");
    }

    #[test]
    fn test_version_bump_changes_marker() {
        let old = ComponentSpec::new("binutils", "2.28.1", InstallScope::Generic);
        let new = ComponentSpec::new("binutils", "2.29", InstallScope::Generic);
        assert_ne!(old.marker_name(), new.marker_name());
    }
}
