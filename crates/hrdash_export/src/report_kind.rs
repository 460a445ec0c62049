use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Report type tag. Only used to pick a display title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Employees,
    Leaves,
    Payroll,
    Performance,
    Dashboard,
    #[serde(untagged)]
    Other(String),
}

impl ReportKind {
    /// Fixed document title for this kind of report.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Employees => "Employee List Report",
            Self::Leaves => "Leave Status Report",
            Self::Payroll => "Payroll Report",
            Self::Performance => "Performance Evaluation Report",
            Self::Dashboard => "General Status Report",
            Self::Other(_) => "System Report",
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Employees => "employees",
            Self::Leaves => "leaves",
            Self::Payroll => "payroll",
            Self::Performance => "performance",
            Self::Dashboard => "dashboard",
            Self::Other(tag) => tag,
        }
    }

    /// The known kinds, in display order.
    pub fn known() -> [ReportKind; 5] {
        [
            Self::Employees,
            Self::Leaves,
            Self::Payroll,
            Self::Performance,
            Self::Dashboard,
        ]
    }
}

/// Parsing never fails: unrecognized tags become [`ReportKind::Other`].
impl FromStr for ReportKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "employees" => Self::Employees,
            "leaves" => Self::Leaves,
            "payroll" => Self::Payroll,
            "performance" => Self::Performance,
            "dashboard" => Self::Dashboard,
            other => Self::Other(other.to_string()),
        })
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(s: &str) -> ReportKind {
        s.parse().unwrap()
    }

    #[test]
    fn test_title_table() {
        assert_eq!(kind("employees").title(), "Employee List Report");
        assert_eq!(kind("leaves").title(), "Leave Status Report");
        assert_eq!(kind("payroll").title(), "Payroll Report");
        assert_eq!(kind("performance").title(), "Performance Evaluation Report");
        assert_eq!(kind("dashboard").title(), "General Status Report");
    }

    #[test]
    fn test_unknown_kind_uses_generic_title() {
        let other = kind("interviews");
        assert_eq!(other, ReportKind::Other("interviews".into()));
        assert_eq!(other.title(), "System Report");
        assert_eq!(kind("").title(), "System Report");
    }

    #[test]
    fn test_display_round_trips_tag() {
        assert_eq!(ReportKind::Payroll.to_string(), "payroll");
        assert_eq!(kind("jobs").to_string(), "jobs");
    }

    #[test]
    fn test_serde_lowercase_and_untagged_other() {
        let payroll: ReportKind = serde_json::from_str("\"payroll\"").unwrap();
        assert_eq!(payroll, ReportKind::Payroll);
        let other: ReportKind = serde_json::from_str("\"companies\"").unwrap();
        assert_eq!(other, ReportKind::Other("companies".into()));
    }
}
