//! Project records as the backend serializes them.
#![allow(missing_docs)] // field names mirror the backend serializers

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Primary key of a project. Assigned by the organisation, not the database.
pub type ProjectId = i64;

/// A monetary value.
///
/// Decimal fields arrive as strings (`"1500.00"`), aggregates may arrive as plain numbers, both are accepted.
/// Always serialized back as a two decimal place string.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Amount(pub f64);

impl Amount {
    /// The value as a float.
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        let value = match Raw::deserialize(deserializer)? {
            Raw::Number(value) => Some(value),
            Raw::Text(text) => text.trim().parse::<f64>().ok(),
        };
        match value {
            // "NaN" and "inf" parse as floats but aren't amounts:
            Some(value) if value.is_finite() => Ok(Amount(value)),
            _ => Err(serde::de::Error::custom("invalid amount, expected a finite decimal")),
        }
    }
}

/// A project as shown in list views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub project_id: ProjectId,
    pub project_title: String,
    #[serde(default)]
    pub paas_code: Option<String>,
    pub approval_status: i64,
    pub approval_status_name: String,
    pub fund: i64,
    pub fund_code: String,
    #[serde(default)]
    pub pag_value: Option<Amount>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub country: i64,
    pub country_name: String,
    #[serde(default)]
    pub lead_org_unit: Option<i64>,
    #[serde(default)]
    pub lead_org_unit_name: Option<String>,
    #[serde(default)]
    pub theme: Option<i64>,
    #[serde(default)]
    pub theme_name: Option<String>,
    #[serde(default)]
    pub total_expenditure: Option<Amount>,
    #[serde(default)]
    pub total_contribution: Option<Amount>,
    #[serde(default)]
    pub total_psc: Option<Amount>,
}

impl ProjectSummary {
    /// Approved projects get highlighted differently in the list.
    pub fn is_approved(&self) -> bool {
        self.approval_status_name == "Approved"
    }
}

/// A donor funding a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donor {
    pub id: i64,
    pub donor_name: String,
}

/// A project with everything the detail view needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub summary: ProjectSummary,
    #[serde(default)]
    pub donors: Vec<Donor>,
}

/// The writable fields of a project, sent on create and update.
///
/// Classifications are referenced by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectDraft {
    pub project_id: ProjectId,
    pub project_title: String,
    pub paas_code: Option<String>,
    pub approval_status: i64,
    pub fund: i64,
    pub pag_value: Option<Amount>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub country: i64,
    pub lead_org_unit: Option<i64>,
    pub theme: Option<i64>,
    pub total_expenditure: Option<Amount>,
    pub total_contribution: Option<Amount>,
    pub total_psc: Option<Amount>,
}

impl From<&ProjectSummary> for ProjectDraft {
    fn from(project: &ProjectSummary) -> Self {
        Self {
            project_id: project.project_id,
            project_title: project.project_title.clone(),
            paas_code: project.paas_code.clone(),
            approval_status: project.approval_status,
            fund: project.fund,
            pag_value: project.pag_value,
            start_date: project.start_date,
            end_date: project.end_date,
            country: project.country,
            lead_org_unit: project.lead_org_unit,
            theme: project.theme,
            total_expenditure: project.total_expenditure,
            total_contribution: project.total_contribution,
            total_psc: project.total_psc,
        }
    }
}

/// One aggregated group on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardGroup {
    /// The group label, missing for projects without the classification.
    pub name: Option<String>,
    pub count: u64,
    pub total_value: Option<Amount>,
}

macro_rules! define_group_row {
    ($row:ident, $field:literal) => {
        #[derive(Deserialize)]
        struct $row {
            #[serde(rename = $field)]
            name: Option<String>,
            count: u64,
            #[serde(default)]
            total_value: Option<Amount>,
        }

        impl From<$row> for DashboardGroup {
            fn from(row: $row) -> Self {
                DashboardGroup {
                    name: row.name,
                    count: row.count,
                    total_value: row.total_value,
                }
            }
        }
    };
}

define_group_row!(CountryRow, "country__country_name");
define_group_row!(OrgUnitRow, "lead_org_unit__org_unit_name");
define_group_row!(ThemeRow, "theme__theme_name");

#[derive(Deserialize)]
struct RawDashboard {
    by_country: Vec<CountryRow>,
    by_org_unit: Vec<OrgUnitRow>,
    by_theme: Vec<ThemeRow>,
}

/// Project counts and values grouped by country, lead org unit and theme, ordered by count descending.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dashboard {
    pub by_country: Vec<DashboardGroup>,
    pub by_org_unit: Vec<DashboardGroup>,
    pub by_theme: Vec<DashboardGroup>,
}

impl<'de> Deserialize<'de> for Dashboard {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawDashboard::deserialize(deserializer)?;
        Ok(Dashboard {
            by_country: raw.by_country.into_iter().map(Into::into).collect(),
            by_org_unit: raw.by_org_unit.into_iter().map(Into::into).collect(),
            by_theme: raw.by_theme.into_iter().map(Into::into).collect(),
        })
    }
}

/// The headline numbers shown above the dashboard charts.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DashboardSummary {
    pub total_projects: u64,
    pub total_value: f64,
    pub countries: usize,
}

impl Dashboard {
    /// Derived from the per-country groups, missing values count as zero.
    pub fn summary(&self) -> DashboardSummary {
        DashboardSummary {
            total_projects: self.by_country.iter().map(|group| group.count).sum(),
            total_value: self
                .by_country
                .iter()
                .map(|group| group.total_value.unwrap_or_default().value())
                .sum(),
            countries: self.by_country.len(),
        }
    }
}
