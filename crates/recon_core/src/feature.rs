use std::fmt;
use std::time::Duration;

use crate::compat::Metric;
use crate::form::SUBDOMAIN_OPTION;

/// Dashboard feature modules. Each one talks to its own backend prefix and
/// owns one poller while it is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
    ApiDiscovery,
    BugBountyWorkflow,
    ContentDiscovery,
    DynamicEndpoints,
    Osint,
    PortScanning,
    TechnologyDetection,
    VulnerabilityScanning,
}

impl Feature {
    pub const ALL: [Feature; 8] = [
        Feature::ApiDiscovery,
        Feature::BugBountyWorkflow,
        Feature::ContentDiscovery,
        Feature::DynamicEndpoints,
        Feature::Osint,
        Feature::PortScanning,
        Feature::TechnologyDetection,
        Feature::VulnerabilityScanning,
    ];

    /// Backend URL prefix.
    pub fn slug(self) -> &'static str {
        match self {
            Feature::ApiDiscovery => "advanced-api-discovery",
            Feature::BugBountyWorkflow => "enhanced-bugbounty",
            Feature::ContentDiscovery => "content-discovery",
            Feature::DynamicEndpoints => "dynamic-endpoints",
            Feature::Osint => "osint",
            Feature::PortScanning => "port-scanning",
            Feature::TechnologyDetection => "technology-detection",
            Feature::VulnerabilityScanning => "vulnerability-scanning",
        }
    }

    /// Short name used on the command line and in file names.
    pub fn key(self) -> &'static str {
        match self {
            Feature::ApiDiscovery => "api",
            Feature::BugBountyWorkflow => "bugbounty",
            Feature::ContentDiscovery => "content",
            Feature::DynamicEndpoints => "endpoints",
            Feature::Osint => "osint",
            Feature::PortScanning => "ports",
            Feature::TechnologyDetection => "tech",
            Feature::VulnerabilityScanning => "vulns",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Feature::ApiDiscovery => "API Discovery",
            Feature::BugBountyWorkflow => "Bug Bounty Workflow",
            Feature::ContentDiscovery => "Content Discovery",
            Feature::DynamicEndpoints => "Dynamic Endpoints",
            Feature::Osint => "OSINT",
            Feature::PortScanning => "Port Scanning",
            Feature::TechnologyDetection => "Technology Detection",
            Feature::VulnerabilityScanning => "Vulnerability Scanning",
        }
    }

    /// Noun used in status lines ("2 scans running").
    pub fn job_noun(self) -> &'static str {
        match self {
            Feature::Osint => "operation",
            Feature::BugBountyWorkflow => "assessment",
            _ => "scan",
        }
    }

    /// Path segment of the job list endpoint.
    pub fn list_path(self) -> &'static str {
        match self {
            Feature::Osint => "operations",
            Feature::BugBountyWorkflow => "assessments",
            _ => "scans",
        }
    }

    pub fn default_interval(self) -> Duration {
        match self {
            Feature::PortScanning | Feature::BugBountyWorkflow => Duration::from_secs(3),
            Feature::Osint => Duration::from_secs(10),
            _ => Duration::from_secs(5),
        }
    }

    /// Form options and their default values.
    pub fn default_options(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Feature::PortScanning => &[
                ("subdomain_id", ""),
                ("port_profile", "top-1000"),
                ("custom_ports", ""),
                ("scan_technique", "syn"),
                ("service_detection", "version"),
                ("timing_template", "T4"),
                ("max_parallel", "3"),
                ("live_hosts_only", "true"),
            ],
            Feature::Osint => &[("intelligence_type", "comprehensive")],
            Feature::BugBountyWorkflow => &[("assessment_type", "comprehensive")],
            Feature::TechnologyDetection => &[("subdomain_id", ""), ("scan_depth", "standard")],
            Feature::ApiDiscovery => &[
                ("subdomain_id", ""),
                ("scan_depth", "standard"),
                ("include_graphql", "true"),
            ],
            Feature::ContentDiscovery => &[
                ("subdomain_id", ""),
                ("scan_depth", "standard"),
                ("max_depth", "3"),
            ],
            Feature::DynamicEndpoints => &[("subdomain_id", ""), ("max_depth", "3")],
            Feature::VulnerabilityScanning => &[
                ("subdomain_id", ""),
                ("severity_threshold", "medium"),
            ],
        }
    }

    /// Whether the start form can narrow a job to one subdomain of the target.
    pub fn uses_subdomains(self) -> bool {
        self.default_options()
            .iter()
            .any(|(key, _)| *key == SUBDOMAIN_OPTION)
    }

    /// Result metrics summarised on cards and in exports, primary first.
    pub fn metrics(self) -> &'static [Metric] {
        match self {
            Feature::PortScanning => &[Metric::OpenPorts],
            Feature::TechnologyDetection => &[Metric::Technologies],
            Feature::ApiDiscovery => &[Metric::Apis, Metric::Endpoints],
            Feature::ContentDiscovery => &[Metric::Endpoints],
            Feature::DynamicEndpoints => &[Metric::Endpoints],
            Feature::Osint => &[
                Metric::Emails,
                Metric::Breaches,
                Metric::Employees,
                Metric::Technologies,
            ],
            Feature::BugBountyWorkflow => &[
                Metric::Vulnerabilities,
                Metric::CriticalVulnerabilities,
                Metric::HighValueTargets,
                Metric::AttackChains,
            ],
            Feature::VulnerabilityScanning => {
                &[Metric::Vulnerabilities, Metric::CriticalVulnerabilities]
            }
        }
    }

    /// Accepts the short key, the backend slug or the title (case-insensitive).
    pub fn parse(raw: &str) -> Option<Self> {
        let wanted = raw.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|feature| {
            wanted == feature.key()
                || wanted == feature.slug()
                || wanted == feature.title().to_ascii_lowercase()
        })
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}
