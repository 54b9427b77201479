//! Deployment platform classification
//!
//! The platform is detected outside this operator (install-time inspection
//! of the infrastructure) and handed in as an opaque, already-resolved
//! value. This module models the classification and the predicates that
//! gate platform-conditional child resources.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Cloud Platform
// =============================================================================

/// Resolved identity of the deployment environment.
///
/// The classification is immutable for the lifetime of a reconciliation:
/// it is resolved once and never re-read mid-pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CloudPlatform {
    /// Amazon Web Services
    Aws,
    /// Google Compute Engine
    Gce,
    /// Microsoft Azure
    Azure,
    /// Detection ran but produced no identity
    Unknown,
    /// Anything else: bare metal, on-prem virt, or an unrecognized string.
    /// Treated as non-cloud by every predicate.
    Other(String),
}

/// The closed set of recognized cloud platforms. `Unknown` and `Other`
/// are deliberately excluded.
pub const VALID_CLOUD_PLATFORMS: [CloudPlatform; 3] = [
    CloudPlatform::Aws,
    CloudPlatform::Gce,
    CloudPlatform::Azure,
];

impl CloudPlatform {
    /// True iff this platform is a member of the recognized cloud set
    pub fn is_known_cloud(&self) -> bool {
        matches!(
            self,
            CloudPlatform::Aws | CloudPlatform::Gce | CloudPlatform::Azure
        )
    }

    /// Resolve a classification from an externally detected value.
    /// Absent means detection never ran, which classifies as unknown.
    pub fn resolve(detected: Option<&str>) -> Self {
        match detected {
            None => CloudPlatform::Unknown,
            // FromStr is infallible
            Some(s) => s.parse().unwrap_or(CloudPlatform::Unknown),
        }
    }
}

impl FromStr for CloudPlatform {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "aws" => CloudPlatform::Aws,
            "gce" => CloudPlatform::Gce,
            "azure" => CloudPlatform::Azure,
            "" | "unknown" => CloudPlatform::Unknown,
            other => CloudPlatform::Other(other.to_string()),
        })
    }
}

impl fmt::Display for CloudPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloudPlatform::Aws => write!(f, "aws"),
            CloudPlatform::Gce => write!(f, "gce"),
            CloudPlatform::Azure => write!(f, "azure"),
            CloudPlatform::Unknown => write!(f, "unknown"),
            CloudPlatform::Other(name) => write!(f, "{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_cloud_membership() {
        for platform in VALID_CLOUD_PLATFORMS {
            assert!(platform.is_known_cloud(), "{} should be cloud", platform);
        }
        assert!(!CloudPlatform::Unknown.is_known_cloud());
        assert!(!CloudPlatform::Other("NonCloudPlatform".into()).is_known_cloud());
    }

    #[test]
    fn test_parse_recognized_platforms() {
        assert_eq!("aws".parse::<CloudPlatform>().unwrap(), CloudPlatform::Aws);
        assert_eq!("GCE".parse::<CloudPlatform>().unwrap(), CloudPlatform::Gce);
        assert_eq!(
            "azure".parse::<CloudPlatform>().unwrap(),
            CloudPlatform::Azure
        );
        assert_eq!(
            "unknown".parse::<CloudPlatform>().unwrap(),
            CloudPlatform::Unknown
        );
    }

    #[test]
    fn test_parse_unrecognized_is_other() {
        let platform: CloudPlatform = "harvester".parse().unwrap();
        assert_eq!(platform, CloudPlatform::Other("harvester".into()));
        assert!(!platform.is_known_cloud());
    }

    #[test]
    fn test_resolve_absent_is_unknown() {
        assert_eq!(CloudPlatform::resolve(None), CloudPlatform::Unknown);
        assert_eq!(CloudPlatform::resolve(Some("aws")), CloudPlatform::Aws);
    }

    #[test]
    fn test_display_round_trip() {
        for platform in [
            CloudPlatform::Aws,
            CloudPlatform::Gce,
            CloudPlatform::Azure,
            CloudPlatform::Unknown,
            CloudPlatform::Other("metal".into()),
        ] {
            let parsed: CloudPlatform = platform.to_string().parse().unwrap();
            assert_eq!(parsed, platform);
        }
    }
}
