use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::BigDecimal;
use sqlx::{FromRow, PgPool};

use crate::database::manager::DatabaseError;
use crate::filter::filter_where::escape_like;
use crate::schema::{Table, TypedValue};

#[derive(Debug, thiserror::Error)]
pub enum OverviewError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Project not found: {0}")]
    ProjectNotFound(i32),
}

impl From<sqlx::Error> for OverviewError {
    fn from(err: sqlx::Error) -> Self {
        OverviewError::Database(err.into())
    }
}

/// Whitelisted orderings for the employee overview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmployeeSort {
    #[default]
    NameAsc,
    NameDesc,
    HoursAsc,
    HoursDesc,
}

impl EmployeeSort {
    fn order_by(&self) -> &'static str {
        match self {
            EmployeeSort::NameAsc => "e.lname ASC, e.fname ASC, e.ssn ASC",
            EmployeeSort::NameDesc => "e.lname DESC, e.fname DESC, e.ssn ASC",
            EmployeeSort::HoursAsc => "total_hours ASC, e.ssn ASC",
            EmployeeSort::HoursDesc => "total_hours DESC, e.ssn ASC",
        }
    }
}

impl FromStr for EmployeeSort {
    type Err = OverviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "name_asc" => Ok(EmployeeSort::NameAsc),
            "name_desc" => Ok(EmployeeSort::NameDesc),
            "hours_asc" => Ok(EmployeeSort::HoursAsc),
            "hours_desc" => Ok(EmployeeSort::HoursDesc),
            other => Err(OverviewError::InvalidParameter(format!("unknown sort '{}'", other))),
        }
    }
}

/// Query string of `GET /api/overview/employees`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeOverviewQuery {
    pub search: Option<String>,
    pub dept: Option<String>,
    pub sort: Option<String>,
}

impl EmployeeOverviewQuery {
    fn search(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    fn dept(&self) -> Result<Option<i32>, OverviewError> {
        match self.dept.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(d) => d
                .parse()
                .map(Some)
                .map_err(|_| OverviewError::InvalidParameter(format!("dept must be a department number, got '{}'", d))),
        }
    }

    fn sort(&self) -> Result<EmployeeSort, OverviewError> {
        self.sort.as_deref().map(str::trim).unwrap_or_default().parse()
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EmployeeSummary {
    pub ssn: String,
    pub full_name: String,
    pub department_name: Option<String>,
    pub dependent_count: i64,
    pub project_count: i64,
    pub total_hours: f64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DepartmentOption {
    pub dnumber: i32,
    pub dname: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmployeeOverview {
    pub employees: Vec<EmployeeSummary>,
    pub departments: Vec<DepartmentOption>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProjectSummary {
    pub pnumber: i32,
    pub pname: String,
    pub plocation: Option<String>,
    pub department_name: Option<String>,
    pub headcount: i64,
    pub total_hours: f64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Assignment {
    pub essn: String,
    pub full_name: Option<String>,
    pub hours: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetail {
    pub project: ProjectSummary,
    pub assignments: Vec<Assignment>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ManagerSummary {
    pub dnumber: i32,
    pub dname: String,
    pub mgr_ssn: String,
    pub manager_name: Option<String>,
    pub mgr_start_date: Option<NaiveDate>,
    pub employee_count: i64,
    pub total_salary: f64,
}

/// Body of `POST /api/projects/:pnumber/assignments`
#[derive(Debug, Clone, Deserialize)]
pub struct AssignmentInput {
    pub essn: Value,
    #[serde(default)]
    pub hours: Value,
}

const FULL_NAME: &str = "e.fname || ' ' || COALESCE(e.minit || ' ', '') || e.lname";

const PROJECT_SUMMARY: &str = r#"
    SELECT p.pnumber, p.pname, p.plocation, d.dname AS department_name,
           COALESCE(w.headcount, 0) AS headcount,
           COALESCE(w.total_hours, 0)::float8 AS total_hours
    FROM project p
    LEFT JOIN department d ON d.dnumber = p.dnum
    LEFT JOIN (
        SELECT pno, COUNT(*) AS headcount, SUM(hours) AS total_hours
        FROM works_on
        GROUP BY pno
    ) w ON w.pno = p.pnumber
"#;

pub struct OverviewService;

impl OverviewService {
    /// Employees with department, dependent and project counts and total
    /// hours, plus the department list for the filter picker.
    pub async fn employees(pool: &PgPool, query: &EmployeeOverviewQuery) -> Result<EmployeeOverview, OverviewError> {
        let dept = query.dept()?;
        let sort = query.sort()?;
        let pattern = query.search().map(|s| format!("%{}%", escape_like(s)));

        let sql = format!(
            r#"
            SELECT e.ssn,
                   {full_name} AS full_name,
                   d.dname AS department_name,
                   COALESCE(dep.dependent_count, 0) AS dependent_count,
                   COALESCE(w.project_count, 0) AS project_count,
                   COALESCE(w.total_hours, 0)::float8 AS total_hours
            FROM employee e
            LEFT JOIN department d ON e.dno = d.dnumber
            LEFT JOIN (
                SELECT essn, COUNT(*) AS dependent_count FROM dependent GROUP BY essn
            ) dep ON dep.essn = e.ssn
            LEFT JOIN (
                SELECT essn, COUNT(*) AS project_count, SUM(hours) AS total_hours FROM works_on GROUP BY essn
            ) w ON w.essn = e.ssn
            WHERE ($1::text IS NULL OR (e.fname || ' ' || e.lname) ILIKE $1)
              AND ($2::integer IS NULL OR e.dno = $2)
            ORDER BY {order}
            "#,
            full_name = FULL_NAME,
            order = sort.order_by()
        );

        let employees = sqlx::query_as::<_, EmployeeSummary>(&sql)
            .bind(pattern)
            .bind(dept)
            .fetch_all(pool)
            .await?;

        let departments = sqlx::query_as::<_, DepartmentOption>("SELECT dnumber, dname FROM department ORDER BY dname")
            .fetch_all(pool)
            .await?;

        Ok(EmployeeOverview { employees, departments })
    }

    pub async fn projects(pool: &PgPool) -> Result<Vec<ProjectSummary>, OverviewError> {
        let sql = format!("{} ORDER BY p.pname, p.pnumber", PROJECT_SUMMARY);
        Ok(sqlx::query_as::<_, ProjectSummary>(&sql).fetch_all(pool).await?)
    }

    pub async fn project(pool: &PgPool, pnumber: i32) -> Result<ProjectDetail, OverviewError> {
        let sql = format!("{} WHERE p.pnumber = $1", PROJECT_SUMMARY);
        let project = sqlx::query_as::<_, ProjectSummary>(&sql)
            .bind(pnumber)
            .fetch_optional(pool)
            .await?
            .ok_or(OverviewError::ProjectNotFound(pnumber))?;

        let assignments = sqlx::query_as::<_, Assignment>(&format!(
            r#"
            SELECT w.essn, {} AS full_name, w.hours::float8 AS hours
            FROM works_on w
            LEFT JOIN employee e ON e.ssn = w.essn
            WHERE w.pno = $1
            ORDER BY e.lname, e.fname, w.essn
            "#,
            FULL_NAME
        ))
        .bind(pnumber)
        .fetch_all(pool)
        .await?;

        Ok(ProjectDetail { project, assignments })
    }

    /// Insert the assignment, or replace its hours when it already exists.
    pub async fn upsert_assignment(
        pool: &PgPool,
        pnumber: i32,
        input: &AssignmentInput,
    ) -> Result<Assignment, OverviewError> {
        let (essn, hours) = Self::coerce_assignment(input)?;

        let exists: Option<i32> = sqlx::query_scalar("SELECT pnumber FROM project WHERE pnumber = $1")
            .bind(pnumber)
            .fetch_optional(pool)
            .await?;
        if exists.is_none() {
            return Err(OverviewError::ProjectNotFound(pnumber));
        }

        let assignment = sqlx::query_as::<_, Assignment>(&format!(
            r#"
            WITH upserted AS (
                INSERT INTO works_on (essn, pno, hours) VALUES ($1, $2, $3)
                ON CONFLICT (essn, pno) DO UPDATE SET hours = EXCLUDED.hours
                RETURNING essn, hours
            )
            SELECT u.essn, {} AS full_name, u.hours::float8 AS hours
            FROM upserted u
            LEFT JOIN employee e ON e.ssn = u.essn
            "#,
            FULL_NAME
        ))
        .bind(&essn)
        .bind(pnumber)
        .bind(hours)
        .fetch_one(pool)
        .await?;

        tracing::info!("Assignment {} on project {} set to {:?} hours", assignment.essn, pnumber, assignment.hours);
        Ok(assignment)
    }

    /// Departments with their manager and payroll.
    pub async fn managers(pool: &PgPool) -> Result<Vec<ManagerSummary>, OverviewError> {
        let sql = format!(
            r#"
            SELECT d.dnumber, d.dname, d.mgr_ssn,
                   {} AS manager_name,
                   d.mgr_start_date,
                   COALESCE(s.employee_count, 0) AS employee_count,
                   COALESCE(s.total_salary, 0)::float8 AS total_salary
            FROM department d
            LEFT JOIN employee e ON e.ssn = d.mgr_ssn
            LEFT JOIN (
                SELECT dno, COUNT(*) AS employee_count, SUM(salary) AS total_salary FROM employee GROUP BY dno
            ) s ON s.dno = d.dnumber
            ORDER BY d.dname, d.dnumber
            "#,
            FULL_NAME
        );
        Ok(sqlx::query_as::<_, ManagerSummary>(&sql).fetch_all(pool).await?)
    }

    fn coerce_assignment(input: &AssignmentInput) -> Result<(String, Option<BigDecimal>), OverviewError> {
        let essn_column = Table::WorksOn.column("essn").map_err(|e| OverviewError::InvalidParameter(e.to_string()))?;
        let hours_column = Table::WorksOn.column("hours").map_err(|e| OverviewError::InvalidParameter(e.to_string()))?;

        let essn = match TypedValue::coerce(essn_column, &input.essn).map_err(OverviewError::InvalidParameter)? {
            TypedValue::Text(Some(essn)) => essn,
            _ => return Err(OverviewError::InvalidParameter("essn is required".to_string())),
        };
        let hours = match TypedValue::coerce(hours_column, &input.hours).map_err(OverviewError::InvalidParameter)? {
            TypedValue::Decimal(hours) => hours,
            other => return Err(OverviewError::InvalidParameter(format!("hours must be a number, got {}", other.to_field()))),
        };
        Ok((essn, hours))
    }
}
