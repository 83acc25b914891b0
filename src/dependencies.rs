//! Readiness check for the external tools the harness shells out to
//!
//! Each required tool is located (explicit path from config, else `PATH` via
//! the `which` crate) and asked for its version. Version extraction is best
//! effort: a tool that is present but prints nothing recognizable still
//! counts as found.

use crate::config::ToolsConfig;
use crate::console::{Console, Tone};
use crate::process::{ToolOutcome, run_with_timeout};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

/// An external tool the pipeline cannot run without
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredTool {
    /// Executable name
    pub name: &'static str,
    /// Where to get it
    pub install_hint: &'static str,
    /// Arguments that make the tool print its version
    pub version_args: &'static [&'static str],
    /// Pattern whose first capture group is the version
    pub version_pattern: &'static str,
}

/// Tools needed to list, fetch and validate HRRR files
pub const REQUIRED_TOOLS: [RequiredTool; 3] = [
    RequiredTool {
        name: "gsutil",
        install_hint: "Google Cloud SDK - https://cloud.google.com/sdk/docs/install",
        version_args: &["version"],
        version_pattern: r"(\d+\.\d+)",
    },
    RequiredTool {
        name: "wgrib2",
        install_hint: "wgrib2 - http://www.cpc.ncep.noaa.gov/products/wesley/wgrib2/",
        version_args: &["-version"],
        version_pattern: r"v(\d+\.\d+\.\d+[^ ]*)",
    },
    RequiredTool {
        name: "go",
        install_hint: "Go - https://golang.org/doc/install",
        version_args: &["version"],
        version_pattern: r"go(\d+\.\d+(?:\.\d+)?)",
    },
];

/// Resolves a tool name to an executable path
pub trait ToolLocator: Send + Sync {
    /// Path of the executable, or None if it cannot be found
    fn locate(&self, name: &str) -> Option<PathBuf>;
}

/// Locator honoring explicit config paths, then searching `PATH`
#[derive(Debug, Clone, Default)]
pub struct PathLocator {
    tools: ToolsConfig,
}

impl PathLocator {
    /// Locator for the given tool configuration
    pub fn new(tools: ToolsConfig) -> Self {
        Self { tools }
    }
}

impl ToolLocator for PathLocator {
    fn locate(&self, name: &str) -> Option<PathBuf> {
        if let Some(explicit) = self.tools.explicit_path(name) {
            // An explicit path still has to point at something executable.
            return which::which(explicit).ok();
        }
        if self.tools.search_path {
            which::which(name).ok()
        } else {
            None
        }
    }
}

/// What the probe learned about one tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolStatus {
    /// Executable name
    pub name: String,
    /// Resolved executable, None if missing
    pub path: Option<PathBuf>,
    /// Version string, if one could be extracted
    pub version: Option<String>,
    /// Where to get the tool
    pub install_hint: String,
}

impl ToolStatus {
    /// Whether the tool was found
    pub fn is_found(&self) -> bool {
        self.path.is_some()
    }
}

/// Result of probing every required tool
#[derive(Debug, Clone, Default)]
pub struct DependencyReport {
    /// One entry per required tool, in probe order
    pub tools: Vec<ToolStatus>,
}

impl DependencyReport {
    /// True when every required tool was found
    pub fn is_ready(&self) -> bool {
        self.tools.iter().all(ToolStatus::is_found)
    }

    /// Names of tools that could not be found
    pub fn missing(&self) -> Vec<String> {
        self.tools
            .iter()
            .filter(|tool| !tool.is_found())
            .map(|tool| tool.name.clone())
            .collect()
    }

    /// Print one line per tool plus a verdict
    pub fn print(&self, console: &Console) {
        for tool in &self.tools {
            if tool.is_found() {
                let version = tool
                    .version
                    .as_ref()
                    .map(|v| format!(" ({})", v))
                    .unwrap_or_default();
                console.raw(&format!(
                    "{}{}",
                    console.paint(Tone::Success, &format!("✓ {} found", tool.name)),
                    version
                ));
            } else {
                console.line(Tone::Error, &format!("✗ {} not found", tool.name));
                console.raw(&format!("  Install: {}", tool.install_hint));
            }
        }

        let missing = self.missing();
        if missing.is_empty() {
            console.line(Tone::Success, "All dependencies found.");
        } else {
            console.blank();
            console.line(
                Tone::Error,
                &format!("Missing dependencies: {}", missing.join(", ")),
            );
        }
        console.blank();
    }
}

/// Checks that every required tool is callable
pub struct DependencyProbe {
    locator: Box<dyn ToolLocator>,
    tools: Vec<RequiredTool>,
    version_timeout: Duration,
}

impl DependencyProbe {
    /// Probe for the stock tool set
    pub fn new(locator: Box<dyn ToolLocator>, version_timeout: Duration) -> Self {
        Self::with_tools(locator, REQUIRED_TOOLS.to_vec(), version_timeout)
    }

    /// Probe for a custom tool set
    pub fn with_tools(
        locator: Box<dyn ToolLocator>,
        tools: Vec<RequiredTool>,
        version_timeout: Duration,
    ) -> Self {
        Self {
            locator,
            tools,
            version_timeout,
        }
    }

    /// Probe configured from [`ToolsConfig`]
    pub fn from_config(tools: &ToolsConfig) -> Self {
        Self::new(
            Box::new(PathLocator::new(tools.clone())),
            tools.version_timeout,
        )
    }

    /// Locate every tool and read its version
    ///
    /// Never fails: missing tools are reported in the returned
    /// [`DependencyReport`], and version probes that fail or time out just
    /// leave the version empty.
    pub async fn probe(&self) -> DependencyReport {
        let mut report = DependencyReport::default();

        for tool in &self.tools {
            let path = self.locator.locate(tool.name);
            let version = match &path {
                Some(path) => self.read_version(tool, path).await,
                None => None,
            };

            tracing::debug!(tool = tool.name, ?path, ?version, "probed dependency");

            report.tools.push(ToolStatus {
                name: tool.name.to_string(),
                path,
                version,
                install_hint: tool.install_hint.to_string(),
            });
        }

        if !report.is_ready() {
            tracing::warn!(missing = ?report.missing(), "required tools missing");
        }

        report
    }

    async fn read_version(&self, tool: &RequiredTool, path: &Path) -> Option<String> {
        let mut command = Command::new(path);
        command.args(tool.version_args);

        match run_with_timeout(command, self.version_timeout).await {
            ToolOutcome::Completed(output) => extract_version(tool.version_pattern, &output.stdout)
                .or_else(|| extract_version(tool.version_pattern, &output.stderr)),
            _ => None,
        }
    }
}

/// First capture group of `pattern` in `text`, if any
///
/// An invalid pattern is treated like a non-match.
pub fn extract_version(pattern: &str, text: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::NoColor;
    use std::collections::HashMap;
    use std::sync::Arc;

    struct MapLocator(HashMap<&'static str, PathBuf>);

    impl ToolLocator for MapLocator {
        fn locate(&self, name: &str) -> Option<PathBuf> {
            self.0.get(name).cloned()
        }
    }

    fn tool(name: &'static str, version_args: &'static [&'static str]) -> RequiredTool {
        RequiredTool {
            name,
            install_hint: "install it",
            version_args,
            version_pattern: r"v(\d+\.\d+\.\d+[^ ]*)",
        }
    }

    #[test]
    fn test_extract_version_patterns_from_real_outputs() {
        assert_eq!(
            extract_version(REQUIRED_TOOLS[1].version_pattern, "v3.1.3 12/2023  Wesley Ebisuzaki"),
            Some("3.1.3".to_string())
        );
        assert_eq!(
            extract_version(
                REQUIRED_TOOLS[2].version_pattern,
                "go version go1.22.3 linux/amd64"
            ),
            Some("1.22.3".to_string())
        );
        assert_eq!(
            extract_version(REQUIRED_TOOLS[0].version_pattern, "gsutil version: 5.27"),
            Some("5.27".to_string())
        );
    }

    #[test]
    fn test_extract_version_absent_is_none() {
        assert_eq!(extract_version(r"go(\d+\.\d+)", "command not recognized"), None);
        assert_eq!(extract_version(r"(unclosed", "anything"), None);
    }

    #[tokio::test]
    async fn test_probe_reports_missing_tool() {
        let locator = MapLocator(HashMap::from([("present", PathBuf::from("/nonexistent/present"))]));
        let probe = DependencyProbe::with_tools(
            Box::new(locator),
            vec![tool("present", &[]), tool("absent", &[])],
            Duration::from_secs(1),
        );

        let report = probe.probe().await;
        assert!(!report.is_ready());
        assert_eq!(report.missing(), vec!["absent".to_string()]);
        // Found but version probe failed to spawn: still found, no version
        assert!(report.tools[0].is_found());
        assert_eq!(report.tools[0].version, None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_probe_extracts_version_from_tool_output() {
        let echo = which::which("echo").unwrap();
        let locator = MapLocator(HashMap::from([("echo", echo)]));
        let probe = DependencyProbe::with_tools(
            Box::new(locator),
            vec![tool("echo", &["v3.1.2-beta", "build"])],
            Duration::from_secs(5),
        );

        let report = probe.probe().await;
        assert!(report.is_ready());
        assert_eq!(report.tools[0].version.as_deref(), Some("3.1.2-beta"));
    }

    #[test]
    fn test_report_print_lists_install_hint_for_missing() {
        let report = DependencyReport {
            tools: vec![
                ToolStatus {
                    name: "gsutil".into(),
                    path: Some(PathBuf::from("/usr/bin/gsutil")),
                    version: Some("5.27".into()),
                    install_hint: "sdk".into(),
                },
                ToolStatus {
                    name: "wgrib2".into(),
                    path: None,
                    version: None,
                    install_hint: "grab wgrib2".into(),
                },
            ],
        };
        let (console, buffer) = Console::buffered(Arc::new(NoColor));
        report.print(&console);

        let out = buffer.contents();
        assert!(out.contains("✓ gsutil found (5.27)"));
        assert!(out.contains("✗ wgrib2 not found"));
        assert!(out.contains("Install: grab wgrib2"));
        assert!(out.contains("Missing dependencies: wgrib2"));
    }

    #[test]
    fn test_path_locator_without_search_finds_nothing() {
        let tools = ToolsConfig {
            search_path: false,
            ..Default::default()
        };
        assert_eq!(PathLocator::new(tools).locate("sh"), None);
    }
}
