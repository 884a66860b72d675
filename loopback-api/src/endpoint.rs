//! The endpoint table.
//!
//! Routes are registered as `(method, template, RouteKey)`. After a match,
//! [`Endpoint::bind`] reads the captured path parameters once and turns them
//! into typed ids; handlers only ever see an [`Endpoint`].

use http::Method;
use loopback_core::{ApiError, PathParams};
use loopback_store::Collection;
use serde_json::{json, Value};

/// Resources served by the generic list/create/get/update/delete handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Employees,
    Departments,
    Leaves,
    LeavePolicies,
    Attendance,
    Projects,
    Tasks,
    Expenses,
    Jobs,
    Candidates,
    Reviews,
    Goals,
    Assets,
    Tickets,
}

impl Resource {
    pub const ALL: [Resource; 14] = [
        Resource::Employees,
        Resource::Departments,
        Resource::Leaves,
        Resource::LeavePolicies,
        Resource::Attendance,
        Resource::Projects,
        Resource::Tasks,
        Resource::Expenses,
        Resource::Jobs,
        Resource::Candidates,
        Resource::Reviews,
        Resource::Goals,
        Resource::Assets,
        Resource::Tickets,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Resource::Employees => "/hr/employees",
            Resource::Departments => "/hr/departments",
            Resource::Leaves => "/hr/leaves",
            Resource::LeavePolicies => "/hr/leave-policies",
            Resource::Attendance => "/hr/attendance",
            Resource::Projects => "/projects",
            Resource::Tasks => "/tasks",
            Resource::Expenses => "/finance/expenses",
            Resource::Jobs => "/recruitment/jobs",
            Resource::Candidates => "/recruitment/candidates",
            Resource::Reviews => "/performance/reviews",
            Resource::Goals => "/performance/goals",
            Resource::Assets => "/assets",
            Resource::Tickets => "/helpdesk/tickets",
        }
    }

    pub fn collection(&self) -> Collection {
        match self {
            Resource::Employees => Collection::Employees,
            Resource::Departments => Collection::Departments,
            Resource::Leaves => Collection::Leaves,
            Resource::LeavePolicies => Collection::LeavePolicies,
            Resource::Attendance => Collection::Attendance,
            Resource::Projects => Collection::Projects,
            Resource::Tasks => Collection::Tasks,
            Resource::Expenses => Collection::Expenses,
            Resource::Jobs => Collection::JobPostings,
            Resource::Candidates => Collection::Candidates,
            Resource::Reviews => Collection::Reviews,
            Resource::Goals => Collection::Goals,
            Resource::Assets => Collection::Assets,
            Resource::Tickets => Collection::Tickets,
        }
    }

    /// Key of the array in list payloads.
    pub fn list_key(&self) -> &'static str {
        match self {
            Resource::Employees => "employees",
            Resource::Departments => "departments",
            Resource::Leaves => "leaves",
            Resource::LeavePolicies => "policies",
            Resource::Attendance => "attendance",
            Resource::Projects => "projects",
            Resource::Tasks => "tasks",
            Resource::Expenses => "expenses",
            Resource::Jobs => "jobs",
            Resource::Candidates => "candidates",
            Resource::Reviews => "reviews",
            Resource::Goals => "goals",
            Resource::Assets => "assets",
            Resource::Tickets => "tickets",
        }
    }

    /// Human label used in "<Label> not found" messages.
    pub fn label(&self) -> &'static str {
        match self {
            Resource::Employees => "Employee",
            Resource::Departments => "Department",
            Resource::Leaves => "Leave request",
            Resource::LeavePolicies => "Leave policy",
            Resource::Attendance => "Attendance record",
            Resource::Projects => "Project",
            Resource::Tasks => "Task",
            Resource::Expenses => "Expense",
            Resource::Jobs => "Job posting",
            Resource::Candidates => "Candidate",
            Resource::Reviews => "Review",
            Resource::Goals => "Goal",
            Resource::Assets => "Asset",
            Resource::Tickets => "Ticket",
        }
    }

    /// Query-string keys matched for equality against record fields.
    pub fn filters(&self) -> &'static [&'static str] {
        match self {
            Resource::Employees => &["department_id", "status", "position"],
            Resource::Departments => &["status"],
            Resource::Leaves => &["status", "employee_id", "leave_type"],
            Resource::LeavePolicies => &["leave_type", "status"],
            Resource::Attendance => &["employee_id", "date", "status"],
            Resource::Projects => &["status", "priority", "manager_id"],
            Resource::Tasks => &["project_id", "status", "assignee_id", "priority"],
            Resource::Expenses => &["status", "category", "employee_id"],
            Resource::Jobs => &["status", "department", "employment_type"],
            Resource::Candidates => &["job_id", "stage"],
            Resource::Reviews => &["status", "employee_id", "period"],
            Resource::Goals => &["status", "employee_id"],
            Resource::Assets => &["status", "category", "assigned_to"],
            Resource::Tickets => &["status", "priority", "category", "assignee_id"],
        }
    }

    /// Fields searched by `?search=`.
    pub fn search_fields(&self) -> &'static [&'static str] {
        match self {
            Resource::Employees => &["first_name", "last_name", "email", "employee_id", "position"],
            Resource::Departments => &["name", "description"],
            Resource::Leaves => &["employee_name", "reason"],
            Resource::LeavePolicies => &["name"],
            Resource::Attendance => &["employee_name"],
            Resource::Projects => &["name", "description"],
            Resource::Tasks => &["title", "description"],
            Resource::Expenses => &["employee_name", "description"],
            Resource::Jobs => &["title", "department", "location"],
            Resource::Candidates => &["first_name", "last_name", "email"],
            Resource::Reviews => &["employee_name", "period"],
            Resource::Goals => &["title", "description"],
            Resource::Assets => &["name", "asset_tag", "serial_number"],
            Resource::Tickets => &["subject", "description"],
        }
    }

    /// Field values filled in on create when the caller leaves them out.
    pub fn defaults(&self) -> Value {
        match self {
            Resource::Employees | Resource::Departments | Resource::LeavePolicies => {
                json!({"status": "active"})
            }
            Resource::Leaves | Resource::Expenses => json!({"status": "pending"}),
            Resource::Attendance => json!({"status": "present"}),
            Resource::Projects => json!({"status": "planning", "progress": 0}),
            Resource::Tasks => json!({"status": "todo", "priority": "medium"}),
            Resource::Jobs => json!({"status": "open"}),
            Resource::Candidates => json!({"stage": "applied", "rating": 0}),
            Resource::Reviews => json!({"status": "draft"}),
            Resource::Goals => json!({"status": "not_started", "progress": 0}),
            Resource::Assets => json!({"status": "available", "assigned_to": null}),
            Resource::Tickets => json!({"status": "open", "priority": "medium", "comments": []}),
        }
    }

    /// Newest-first collections get new records at the front.
    pub fn prepends(&self) -> bool {
        matches!(
            self,
            Resource::Leaves | Resource::Expenses | Resource::Candidates | Resource::Tickets
        )
    }
}

/// Lifecycle transitions exposed as `PATCH <resource>/:id/<action>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    ApproveLeave,
    RejectLeave,
    ApproveExpense,
    RejectExpense,
    SubmitReview,
    ResolveTicket,
    CloseTicket,
    ReturnAsset,
}

impl Transition {
    pub const ALL: [Transition; 8] = [
        Transition::ApproveLeave,
        Transition::RejectLeave,
        Transition::ApproveExpense,
        Transition::RejectExpense,
        Transition::SubmitReview,
        Transition::ResolveTicket,
        Transition::CloseTicket,
        Transition::ReturnAsset,
    ];

    pub fn resource(&self) -> Resource {
        match self {
            Transition::ApproveLeave | Transition::RejectLeave => Resource::Leaves,
            Transition::ApproveExpense | Transition::RejectExpense => Resource::Expenses,
            Transition::SubmitReview => Resource::Reviews,
            Transition::ResolveTicket | Transition::CloseTicket => Resource::Tickets,
            Transition::ReturnAsset => Resource::Assets,
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            Transition::ApproveLeave | Transition::ApproveExpense => "approve",
            Transition::RejectLeave | Transition::RejectExpense => "reject",
            Transition::SubmitReview => "submit",
            Transition::ResolveTicket => "resolve",
            Transition::CloseTicket => "close",
            Transition::ReturnAsset => "return",
        }
    }

    /// Status the record ends up in.
    pub fn target_status(&self) -> &'static str {
        match self {
            Transition::ApproveLeave | Transition::ApproveExpense => "approved",
            Transition::RejectLeave | Transition::RejectExpense => "rejected",
            Transition::SubmitReview => "submitted",
            Transition::ResolveTicket => "resolved",
            Transition::CloseTicket => "closed",
            Transition::ReturnAsset => "available",
        }
    }

    /// Statuses the transition may start from; `None` means any.
    pub fn allowed_from(&self) -> Option<&'static [&'static str]> {
        match self {
            Transition::ApproveLeave
            | Transition::RejectLeave
            | Transition::ApproveExpense
            | Transition::RejectExpense => Some(&["pending"]),
            Transition::SubmitReview => Some(&["draft"]),
            Transition::ResolveTicket => Some(&["open", "in_progress"]),
            Transition::CloseTicket => Some(&["open", "in_progress", "resolved"]),
            Transition::ReturnAsset => Some(&["assigned"]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionOp {
    List,
    Create,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberOp {
    Get,
    Update,
    Delete,
}

/// What the router stores per registered template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteKey {
    Login,
    Register,
    Refresh,
    Me,
    Logout,
    UpdateProfile,
    ChangePassword,
    ListUsers,
    UpdateUserRole,
    UpdateUserModules,
    Collection(Resource, CollectionOp),
    Member(Resource, MemberOp),
    Transition(Transition),
    CheckIn,
    CheckOut,
    ProjectTasks,
    TaskStatus,
    JobCandidates,
    CandidateStage,
    AssignAsset,
    TicketComment,
    DashboardStats,
    Notifications,
    ReadAllNotifications,
    ReadNotification,
    CompanySettings,
    UpdateCompanySettings,
    ModuleSettings,
}

/// A matched route with its path parameters already parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Login,
    Register,
    Refresh,
    Me,
    Logout,
    UpdateProfile,
    ChangePassword,
    ListUsers,
    UpdateUserRole { user_id: i64 },
    UpdateUserModules { user_id: i64 },
    List(Resource),
    Create(Resource),
    Get(Resource, i64),
    Update(Resource, i64),
    Delete(Resource, i64),
    Transition(Transition, i64),
    CheckIn,
    CheckOut,
    ProjectTasks { project_id: i64 },
    TaskStatus { task_id: i64 },
    JobCandidates { job_id: i64 },
    CandidateStage { candidate_id: i64 },
    AssignAsset { asset_id: i64 },
    TicketComment { ticket_id: i64 },
    DashboardStats,
    Notifications,
    ReadAllNotifications,
    ReadNotification { notification_id: i64 },
    CompanySettings,
    UpdateCompanySettings,
    ModuleSettings,
}

/// Parse the `:id` capture. A non-numeric id can never name a record.
fn id(params: &PathParams, label: &str) -> Result<i64, ApiError> {
    let raw = params
        .require("id")
        .map_err(|e| ApiError::general_error(e.to_string()))?;
    raw.parse()
        .map_err(|_| ApiError::not_found(format!("{label} not found")))
}

impl Endpoint {
    pub fn bind(key: RouteKey, params: &PathParams) -> Result<Endpoint, ApiError> {
        let endpoint = match key {
            RouteKey::Login => Endpoint::Login,
            RouteKey::Register => Endpoint::Register,
            RouteKey::Refresh => Endpoint::Refresh,
            RouteKey::Me => Endpoint::Me,
            RouteKey::Logout => Endpoint::Logout,
            RouteKey::UpdateProfile => Endpoint::UpdateProfile,
            RouteKey::ChangePassword => Endpoint::ChangePassword,
            RouteKey::ListUsers => Endpoint::ListUsers,
            RouteKey::UpdateUserRole => Endpoint::UpdateUserRole {
                user_id: id(params, "User")?,
            },
            RouteKey::UpdateUserModules => Endpoint::UpdateUserModules {
                user_id: id(params, "User")?,
            },
            RouteKey::Collection(r, CollectionOp::List) => Endpoint::List(r),
            RouteKey::Collection(r, CollectionOp::Create) => Endpoint::Create(r),
            RouteKey::Member(r, op) => {
                let id = id(params, r.label())?;
                match op {
                    MemberOp::Get => Endpoint::Get(r, id),
                    MemberOp::Update => Endpoint::Update(r, id),
                    MemberOp::Delete => Endpoint::Delete(r, id),
                }
            }
            RouteKey::Transition(t) => Endpoint::Transition(t, id(params, t.resource().label())?),
            RouteKey::CheckIn => Endpoint::CheckIn,
            RouteKey::CheckOut => Endpoint::CheckOut,
            RouteKey::ProjectTasks => Endpoint::ProjectTasks {
                project_id: id(params, "Project")?,
            },
            RouteKey::TaskStatus => Endpoint::TaskStatus {
                task_id: id(params, "Task")?,
            },
            RouteKey::JobCandidates => Endpoint::JobCandidates {
                job_id: id(params, "Job posting")?,
            },
            RouteKey::CandidateStage => Endpoint::CandidateStage {
                candidate_id: id(params, "Candidate")?,
            },
            RouteKey::AssignAsset => Endpoint::AssignAsset {
                asset_id: id(params, "Asset")?,
            },
            RouteKey::TicketComment => Endpoint::TicketComment {
                ticket_id: id(params, "Ticket")?,
            },
            RouteKey::DashboardStats => Endpoint::DashboardStats,
            RouteKey::Notifications => Endpoint::Notifications,
            RouteKey::ReadAllNotifications => Endpoint::ReadAllNotifications,
            RouteKey::ReadNotification => Endpoint::ReadNotification {
                notification_id: id(params, "Notification")?,
            },
            RouteKey::CompanySettings => Endpoint::CompanySettings,
            RouteKey::UpdateCompanySettings => Endpoint::UpdateCompanySettings,
            RouteKey::ModuleSettings => Endpoint::ModuleSettings,
        };
        Ok(endpoint)
    }

    /// Endpoints that change state or reveal the caller's own identity.
    /// Anonymous calls to these are refused with 401.
    pub fn requires_identity(&self) -> bool {
        !matches!(
            self,
            Endpoint::Login
                | Endpoint::Register
                | Endpoint::Refresh
                | Endpoint::Logout
                | Endpoint::ListUsers
                | Endpoint::List(_)
                | Endpoint::Get(..)
                | Endpoint::ProjectTasks { .. }
                | Endpoint::JobCandidates { .. }
                | Endpoint::DashboardStats
                | Endpoint::Notifications
                | Endpoint::CompanySettings
                | Endpoint::ModuleSettings
        )
    }
}

/// Every route served, in registration order.
pub fn route_table() -> Vec<(Method, String, RouteKey)> {
    let mut routes: Vec<(Method, String, RouteKey)> = Vec::new();
    let mut add = |method: Method, template: &str, key: RouteKey| {
        routes.push((method, template.to_string(), key));
    };

    add(Method::POST, "/auth/login", RouteKey::Login);
    add(Method::POST, "/auth/register", RouteKey::Register);
    add(Method::POST, "/auth/refresh", RouteKey::Refresh);
    add(Method::GET, "/auth/me", RouteKey::Me);
    add(Method::POST, "/auth/logout", RouteKey::Logout);
    add(Method::PUT, "/auth/profile", RouteKey::UpdateProfile);
    add(Method::POST, "/auth/change-password", RouteKey::ChangePassword);

    add(Method::GET, "/users", RouteKey::ListUsers);
    add(Method::PUT, "/users/:id/role", RouteKey::UpdateUserRole);
    add(Method::PUT, "/users/:id/modules", RouteKey::UpdateUserModules);

    // literal custom routes sharing a prefix with a resource
    add(Method::POST, "/hr/attendance/check-in", RouteKey::CheckIn);
    add(Method::POST, "/hr/attendance/check-out", RouteKey::CheckOut);

    for r in Resource::ALL {
        let base = r.path();
        let member = format!("{base}/:id");
        add(Method::GET, base, RouteKey::Collection(r, CollectionOp::List));
        add(Method::POST, base, RouteKey::Collection(r, CollectionOp::Create));
        add(Method::GET, &member, RouteKey::Member(r, MemberOp::Get));
        add(Method::PUT, &member, RouteKey::Member(r, MemberOp::Update));
        add(Method::DELETE, &member, RouteKey::Member(r, MemberOp::Delete));
    }

    for t in Transition::ALL {
        let template = format!("{}/:id/{}", t.resource().path(), t.action());
        add(Method::PATCH, &template, RouteKey::Transition(t));
    }

    add(Method::GET, "/projects/:id/tasks", RouteKey::ProjectTasks);
    add(Method::PATCH, "/tasks/:id/status", RouteKey::TaskStatus);
    add(Method::GET, "/recruitment/jobs/:id/candidates", RouteKey::JobCandidates);
    add(Method::PATCH, "/recruitment/candidates/:id/stage", RouteKey::CandidateStage);
    add(Method::PATCH, "/assets/:id/assign", RouteKey::AssignAsset);
    add(Method::POST, "/helpdesk/tickets/:id/comments", RouteKey::TicketComment);

    add(Method::GET, "/dashboard/stats", RouteKey::DashboardStats);
    add(Method::GET, "/dashboard/notifications", RouteKey::Notifications);
    add(Method::PATCH, "/dashboard/notifications/:id", RouteKey::ReadNotification);
    add(Method::PATCH, "/dashboard/notifications/read-all", RouteKey::ReadAllNotifications);

    add(Method::GET, "/settings/company", RouteKey::CompanySettings);
    add(Method::PUT, "/settings/company", RouteKey::UpdateCompanySettings);
    add(Method::GET, "/settings/modules", RouteKey::ModuleSettings);

    routes
}

#[cfg(test)]
mod tests {
    use super::*;
    use loopback_core::{Pattern, Router};

    fn concrete(template: &str) -> String {
        template
            .split('/')
            .map(|seg| if seg.starts_with(':') { "7" } else { seg })
            .collect::<Vec<_>>()
            .join("/")
    }

    #[test]
    fn every_registered_template_binds() {
        for (method, template, key) in route_table() {
            let pattern = Pattern::compile(&template).unwrap();
            let params = pattern.matches(&concrete(&template)).unwrap();
            let endpoint = Endpoint::bind(key, &params)
                .unwrap_or_else(|e| panic!("{method} {template}: {e}"));
            if !pattern.is_literal() {
                let bound = format!("{endpoint:?}");
                assert!(bound.contains('7'), "{method} {template} lost its id: {bound}");
            }
        }
    }

    #[test]
    fn templates_are_unique_per_method() {
        let mut seen = std::collections::HashSet::new();
        for (method, template, _) in route_table() {
            assert!(seen.insert((method.clone(), template.clone())), "{method} {template}");
        }
    }

    #[test]
    fn read_all_wins_over_notification_template() {
        let mut router = Router::new();
        for (method, template, key) in route_table() {
            router.add(method, &template, key).unwrap();
        }
        let (key, _) = router
            .resolve(&Method::PATCH, "/dashboard/notifications/read-all")
            .unwrap();
        assert_eq!(*key, RouteKey::ReadAllNotifications);

        let (key, params) = router
            .resolve(&Method::PATCH, "/dashboard/notifications/3")
            .unwrap();
        assert_eq!(*key, RouteKey::ReadNotification);
        assert_eq!(params.get("id"), Some("3"));
    }

    #[test]
    fn non_numeric_ids_bind_to_not_found() {
        let pattern = Pattern::compile("/hr/leaves/:id/approve").unwrap();
        let params = pattern.matches("/hr/leaves/abc/approve").unwrap();
        let err = Endpoint::bind(RouteKey::Transition(Transition::ApproveLeave), &params).unwrap_err();
        assert_eq!(err.code(), 404);
        assert_eq!(err.message, "Leave request not found");
    }
}
