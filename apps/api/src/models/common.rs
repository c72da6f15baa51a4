#![allow(dead_code)]

use serde::{Deserialize, Serialize};

/// Lifecycle state of a processing run.
///
/// A run is created `Pending` and mutated in place until it reaches a terminal
/// state. There is deliberately no in-progress value: a run that a worker is
/// actively processing still reads `pending` in the store, and a poller can
/// only distinguish it from a fresh run by the age of `updated_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }
}

/// Month-resolution date as reported by the extraction model.
///
/// A `year` of 0 means "present"; duration calculations substitute the
/// current year/month at computation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlexibleDate {
    pub month: u32,
    pub year: i32,
}

impl FlexibleDate {
    pub fn new(year: i32, month: u32) -> Self {
        Self { month, year }
    }

    pub fn is_present(&self) -> bool {
        self.year == 0
    }

    /// Resolves against the given "now", returning (year, month).
    pub fn resolve(&self, now_year: i32, now_month: u32) -> (i32, u32) {
        if self.is_present() {
            (now_year, now_month)
        } else {
            (self.year, self.month)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub city: Option<String>,
    /// ISO 3166-1 alpha-2 code.
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmploymentType {
    Contract,
    FullTime,
    Internship,
    PartTime,
    Volunteer,
}

/// Seniority level of a candidate or role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Level {
    EntryLevel,
    Junior,
    MidLevel,
    Senior,
    Executive,
}

/// Working format of a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoleMode {
    Hybrid,
    OnSite,
    Remote,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactDetails {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Award {
    #[serde(default)]
    pub date: Option<FlexibleDate>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// One employment record from a résumé.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Employment {
    #[serde(default)]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub end_date: FlexibleDate,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub start_date: FlexibleDate,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, rename = "type")]
    pub employment_type: Option<EmploymentType>,
}

/// One education record from a résumé.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Education {
    #[serde(default)]
    pub certification: Certification,
    #[serde(default)]
    pub end_date: FlexibleDate,
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub start_date: FlexibleDate,
}
