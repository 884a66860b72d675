//! Default dataset loaded on first use, after a corrupt copy, and on reset.
//!
//! Two tenants: Acme Corp (101) and Globex Ltd (202). Everything here is
//! deterministic so that two resets produce identical snapshots.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::collection::Collection;
use crate::snapshot::{StoreSnapshot, STORE_VERSION};
use crate::Record;

pub const ACME: i64 = 101;
pub const GLOBEX: i64 = 202;

/// Timestamp stamped on every seeded record.
pub const SEEDED_AT: &str = "2024-06-01T09:00:00+00:00";

/// Feature modules a user can be granted.
pub const MODULES: [&str; 9] = [
    "dashboard",
    "hr",
    "projects",
    "finance",
    "recruitment",
    "performance",
    "assets",
    "helpdesk",
    "settings",
];

/// Password given to every seeded account.
pub const DEMO_PASSWORD: &str = "password123";

pub fn dataset() -> StoreSnapshot {
    let mut collections = BTreeMap::new();
    let mut put = |c: Collection, records: Vec<Record>| {
        collections.insert(c.name().to_string(), records);
    };
    put(Collection::Companies, companies());
    put(Collection::Users, users());
    put(Collection::Employees, employees());
    put(Collection::Departments, departments());
    put(Collection::Leaves, leaves());
    put(Collection::LeavePolicies, leave_policies());
    put(Collection::Attendance, attendance());
    put(Collection::Projects, projects());
    put(Collection::Tasks, tasks());
    put(Collection::Expenses, expenses());
    put(Collection::JobPostings, job_postings());
    put(Collection::Candidates, candidates());
    put(Collection::Reviews, reviews());
    put(Collection::Goals, goals());
    put(Collection::Assets, assets());
    put(Collection::Tickets, tickets());
    put(Collection::Notifications, notifications());

    let settings = BTreeMap::from([
        (
            ACME.to_string(),
            company_settings("Acme Corp", "America/New_York", "USD", &MODULES),
        ),
        (
            GLOBEX.to_string(),
            company_settings(
                "Globex Ltd",
                "Europe/London",
                "GBP",
                &["dashboard", "hr", "projects", "finance", "assets", "helpdesk", "settings"],
            ),
        ),
    ]);

    StoreSnapshot {
        version: STORE_VERSION,
        collections,
        dashboard: dashboard(),
        settings,
    }
}

/// Settings document for a tenant; `enabled` lists the switched-on modules.
pub fn company_settings(name: &str, timezone: &str, currency: &str, enabled: &[&str]) -> Value {
    let modules: serde_json::Map<String, Value> = MODULES
        .iter()
        .map(|m| (m.to_string(), Value::Bool(enabled.contains(m))))
        .collect();
    json!({
        "company_name": name,
        "timezone": timezone,
        "currency": currency,
        "date_format": "YYYY-MM-DD",
        "working_days": ["Mon", "Tue", "Wed", "Thu", "Fri"],
        "fiscal_year_start": "01-01",
        "modules": modules,
    })
}

fn companies() -> Vec<Record> {
    vec![
        json!({"id": ACME, "company_id": ACME, "name": "Acme Corp", "industry": "Technology",
               "size": "51-200", "email": "contact@acme.com", "created_at": SEEDED_AT}),
        json!({"id": GLOBEX, "company_id": GLOBEX, "name": "Globex Ltd", "industry": "Manufacturing",
               "size": "11-50", "email": "hello@globex.com", "created_at": SEEDED_AT}),
    ]
}

fn users() -> Vec<Record> {
    let rows: [(i64, &str, &str, &str, i64, &str, Option<i64>, &[&str]); 6] = [
        (1, "admin@acme.com", "Alex", "Morgan", ACME, "admin", None, &MODULES),
        (2, "hr@acme.com", "Sarah", "Johnson", ACME, "hr_manager", Some(2),
            &["dashboard", "hr", "recruitment", "performance", "helpdesk"]),
        (3, "manager@acme.com", "Michael", "Brown", ACME, "manager", Some(3),
            &["dashboard", "hr", "projects", "finance", "performance", "helpdesk"]),
        (4, "employee@acme.com", "John", "Smith", ACME, "employee", Some(1),
            &["dashboard", "hr", "projects", "helpdesk"]),
        (5, "admin@globex.com", "Liam", "Thomas", GLOBEX, "admin", Some(9), &MODULES),
        (6, "employee@globex.com", "Ava", "Jackson", GLOBEX, "employee", Some(10),
            &["dashboard", "hr", "helpdesk"]),
    ];
    rows.iter()
        .map(|(id, email, first, last, company, role, employee, modules)| {
            json!({
                "id": id, "email": email, "password": DEMO_PASSWORD,
                "first_name": first, "last_name": last, "company_id": company,
                "role": role, "employee_id": employee, "modules": modules,
                "created_at": SEEDED_AT,
            })
        })
        .collect()
}

fn departments() -> Vec<Record> {
    let rows = [
        (1, ACME, "Engineering", "Product and platform development", Some(1)),
        (2, ACME, "Human Resources", "People operations", Some(2)),
        (3, ACME, "Sales", "New business and accounts", Some(3)),
        (4, ACME, "Finance", "Accounting and payroll", Some(4)),
        (5, ACME, "Operations", "Facilities and logistics", None),
        (6, GLOBEX, "Engineering", "Plant systems", Some(9)),
        (7, GLOBEX, "Marketing", "Brand and campaigns", Some(10)),
        (8, GLOBEX, "Support", "Customer support", Some(11)),
    ];
    rows.iter()
        .map(|(id, company, name, description, manager)| {
            json!({"id": id, "company_id": company, "name": name, "description": description,
                   "manager_id": manager, "status": "active", "created_at": SEEDED_AT})
        })
        .collect()
}

fn employees() -> Vec<Record> {
    let rows = [
        (1, ACME, "EMP001", "John", "Smith", 1, "Engineering", "Senior Engineer", "2021-03-15", 95000, "active"),
        (2, ACME, "EMP002", "Sarah", "Johnson", 2, "Human Resources", "HR Manager", "2020-07-01", 82000, "active"),
        (3, ACME, "EMP003", "Michael", "Brown", 3, "Sales", "Sales Lead", "2019-11-20", 78000, "active"),
        (4, ACME, "EMP004", "Emily", "Davis", 4, "Finance", "Accountant", "2022-01-10", 67000, "active"),
        (5, ACME, "EMP005", "David", "Wilson", 1, "Engineering", "Frontend Engineer", "2022-06-06", 88000, "active"),
        (6, ACME, "EMP006", "Olivia", "Martinez", 5, "Operations", "Operations Coordinator", "2023-02-13", 56000, "on_leave"),
        (7, ACME, "EMP007", "James", "Taylor", 1, "Engineering", "QA Engineer", "2021-09-27", 72000, "active"),
        (8, ACME, "EMP008", "Sophia", "Anderson", 3, "Sales", "Account Executive", "2023-08-21", 61000, "inactive"),
        (9, GLOBEX, "EMP001", "Liam", "Thomas", 6, "Engineering", "Engineering Manager", "2018-05-02", 120000, "active"),
        (10, GLOBEX, "EMP002", "Ava", "Jackson", 7, "Marketing", "Marketing Specialist", "2022-04-18", 64000, "active"),
        (11, GLOBEX, "EMP003", "Noah", "White", 8, "Support", "Support Engineer", "2021-12-01", 58000, "active"),
        (12, GLOBEX, "EMP004", "Mia", "Harris", 6, "Engineering", "Backend Engineer", "2023-03-06", 91000, "active"),
    ];
    rows.iter()
        .map(|(id, company, code, first, last, dept_id, dept, position, hired, salary, status)| {
            let domain = if *company == ACME { "acme.com" } else { "globex.com" };
            json!({
                "id": id, "company_id": company, "employee_id": code,
                "first_name": first, "last_name": last,
                "email": format!("{}.{}@{domain}", first.to_lowercase(), last.to_lowercase()),
                "phone": format!("+1-555-01{id:02}"),
                "department_id": dept_id, "department": dept, "position": position,
                "hire_date": hired, "salary": salary, "status": status,
                "created_at": SEEDED_AT,
            })
        })
        .collect()
}

fn leaves() -> Vec<Record> {
    let rows = [
        (1, ACME, 1, "John Smith", "annual", "2024-07-01", "2024-07-05", 5, "Summer vacation", "approved"),
        (2, ACME, 5, "David Wilson", "sick", "2024-06-10", "2024-06-11", 2, "Flu", "approved"),
        (3, ACME, 6, "Olivia Martinez", "maternity", "2024-06-01", "2024-08-30", 65, "Maternity leave", "approved"),
        (4, ACME, 3, "Michael Brown", "annual", "2024-08-12", "2024-08-16", 5, "Family trip", "pending"),
        (5, ACME, 7, "James Taylor", "personal", "2024-07-22", "2024-07-22", 1, "Moving house", "pending"),
        (6, GLOBEX, 10, "Ava Jackson", "annual", "2024-09-02", "2024-09-06", 5, "Holiday", "pending"),
        (7, GLOBEX, 11, "Noah White", "sick", "2024-05-14", "2024-05-14", 1, "Medical appointment", "rejected"),
    ];
    rows.iter()
        .map(|(id, company, employee, name, kind, start, end, days, reason, status)| {
            json!({
                "id": id, "company_id": company, "employee_id": employee, "employee_name": name,
                "leave_type": kind, "start_date": start, "end_date": end, "days": days,
                "reason": reason, "status": status, "created_at": SEEDED_AT,
            })
        })
        .collect()
}

fn leave_policies() -> Vec<Record> {
    let rows = [
        (1, ACME, "Annual Leave", "annual", 20, true),
        (2, ACME, "Sick Leave", "sick", 10, false),
        (3, ACME, "Personal Leave", "personal", 3, false),
        (4, ACME, "Maternity Leave", "maternity", 90, false),
        (5, GLOBEX, "Annual Leave", "annual", 25, true),
        (6, GLOBEX, "Sick Leave", "sick", 12, false),
    ];
    rows.iter()
        .map(|(id, company, name, kind, days, carry)| {
            json!({"id": id, "company_id": company, "name": name, "leave_type": kind,
                   "days_per_year": days, "carry_forward": carry, "status": "active",
                   "created_at": SEEDED_AT})
        })
        .collect()
}

fn attendance() -> Vec<Record> {
    let rows = [
        (1, ACME, 1, "John Smith", Some("09:02"), Some("17:45"), 8.7, "present"),
        (2, ACME, 2, "Sarah Johnson", Some("08:55"), Some("17:30"), 8.6, "present"),
        (3, ACME, 3, "Michael Brown", Some("09:40"), Some("18:10"), 8.5, "late"),
        (4, ACME, 5, "David Wilson", None, None, 0.0, "absent"),
        (5, ACME, 7, "James Taylor", Some("09:00"), Some("13:00"), 4.0, "half_day"),
        (6, GLOBEX, 9, "Liam Thomas", Some("08:30"), Some("17:15"), 8.75, "present"),
        (7, GLOBEX, 10, "Ava Jackson", Some("09:10"), Some("17:40"), 8.5, "present"),
    ];
    rows.iter()
        .map(|(id, company, employee, name, check_in, check_out, hours, status)| {
            json!({
                "id": id, "company_id": company, "employee_id": employee, "employee_name": name,
                "date": "2024-06-17", "check_in": check_in, "check_out": check_out,
                "hours": hours, "status": status, "created_at": SEEDED_AT,
            })
        })
        .collect()
}

fn projects() -> Vec<Record> {
    let rows = [
        (1, ACME, "Website Redesign", "Refresh the public marketing site", "in_progress", "high", "2024-03-01", "2024-09-30", 65, 1, 50000),
        (2, ACME, "Mobile App", "Customer self-service app", "planning", "medium", "2024-07-01", "2025-01-31", 10, 5, 120000),
        (3, ACME, "ERP Migration", "Move finance onto the new ERP", "completed", "high", "2023-09-01", "2024-04-30", 100, 4, 80000),
        (4, GLOBEX, "Factory Dashboard", "Live production metrics", "in_progress", "high", "2024-02-15", "2024-10-31", 40, 9, 75000),
        (5, GLOBEX, "Brand Refresh", "New brand guidelines", "on_hold", "low", "2024-05-01", "2024-12-31", 20, 10, 30000),
    ];
    rows.iter()
        .map(|(id, company, name, description, status, priority, start, end, progress, manager, budget)| {
            json!({
                "id": id, "company_id": company, "name": name, "description": description,
                "status": status, "priority": priority, "start_date": start, "end_date": end,
                "progress": progress, "manager_id": manager, "budget": budget,
                "created_at": SEEDED_AT,
            })
        })
        .collect()
}

fn tasks() -> Vec<Record> {
    let rows = [
        (1, ACME, 1, "Design new homepage", 5, "in_progress", "high", "2024-07-15"),
        (2, ACME, 1, "Set up CMS", 1, "done", "medium", "2024-05-30"),
        (3, ACME, 1, "SEO audit", 3, "todo", "low", "2024-08-01"),
        (4, ACME, 2, "Write app requirements", 1, "in_progress", "high", "2024-07-20"),
        (5, ACME, 2, "Pick mobile framework", 5, "todo", "medium", "2024-07-31"),
        (6, ACME, 3, "Migrate ledgers", 4, "done", "high", "2024-03-31"),
        (7, GLOBEX, 4, "Collect sensor feeds", 12, "in_progress", "high", "2024-07-10"),
        (8, GLOBEX, 4, "Build charts", 9, "todo", "medium", "2024-08-15"),
        (9, GLOBEX, 5, "Logo concepts", 10, "review", "low", "2024-09-01"),
    ];
    rows.iter()
        .map(|(id, company, project, title, assignee, status, priority, due)| {
            json!({
                "id": id, "company_id": company, "project_id": project, "title": title,
                "description": "", "assignee_id": assignee, "status": status,
                "priority": priority, "due_date": due, "created_at": SEEDED_AT,
            })
        })
        .collect()
}

fn expenses() -> Vec<Record> {
    let rows = [
        (1, ACME, 1, "John Smith", "travel", 1250.00, "Client visit flights", "2024-05-20", "approved"),
        (2, ACME, 3, "Michael Brown", "meals", 86.40, "Team lunch", "2024-06-03", "pending"),
        (3, ACME, 5, "David Wilson", "equipment", 349.99, "Monitor", "2024-06-10", "pending"),
        (4, ACME, 4, "Emily Davis", "software", 120.00, "Accounting add-on", "2024-04-02", "rejected"),
        (5, GLOBEX, 9, "Liam Thomas", "travel", 980.00, "Supplier audit", "2024-05-28", "approved"),
        (6, GLOBEX, 11, "Noah White", "training", 450.00, "Certification exam", "2024-06-12", "pending"),
    ];
    rows.iter()
        .map(|(id, company, employee, name, category, amount, description, date, status)| {
            let currency = if *company == ACME { "USD" } else { "GBP" };
            json!({
                "id": id, "company_id": company, "employee_id": employee, "employee_name": name,
                "category": category, "amount": amount, "currency": currency,
                "description": description, "date": date, "status": status,
                "created_at": SEEDED_AT,
            })
        })
        .collect()
}

fn job_postings() -> Vec<Record> {
    let rows = [
        (1, ACME, "Senior Backend Engineer", "Engineering", "Remote", "full_time", "open"),
        (2, ACME, "HR Generalist", "Human Resources", "New York, NY", "full_time", "open"),
        (3, ACME, "Sales Intern", "Sales", "Chicago, IL", "internship", "closed"),
        (4, GLOBEX, "Production Planner", "Operations", "Detroit, MI", "full_time", "open"),
        (5, GLOBEX, "Content Marketer", "Marketing", "Remote", "contract", "open"),
    ];
    rows.iter()
        .map(|(id, company, title, department, location, kind, status)| {
            json!({
                "id": id, "company_id": company, "title": title, "department": department,
                "location": location, "employment_type": kind, "status": status,
                "description": format!("{title} for the {department} team."),
                "created_at": SEEDED_AT,
            })
        })
        .collect()
}

fn candidates() -> Vec<Record> {
    let rows = [
        (1, ACME, 1, "Priya", "Patel", "interview", 4),
        (2, ACME, 1, "Tom", "Becker", "screening", 3),
        (3, ACME, 1, "Grace", "Kim", "applied", 0),
        (4, ACME, 2, "Luis", "Garcia", "offer", 5),
        (5, ACME, 3, "Hannah", "Lee", "rejected", 2),
        (6, GLOBEX, 4, "Omar", "Haddad", "interview", 4),
        (7, GLOBEX, 5, "Zoe", "Clark", "applied", 3),
    ];
    rows.iter()
        .map(|(id, company, job, first, last, stage, rating)| {
            json!({
                "id": id, "company_id": company, "job_id": job,
                "first_name": first, "last_name": last,
                "email": format!("{}.{}@mail.com", first.to_lowercase(), last.to_lowercase()),
                "phone": format!("+1-555-02{id:02}"),
                "stage": stage, "rating": rating, "created_at": SEEDED_AT,
            })
        })
        .collect()
}

fn reviews() -> Vec<Record> {
    let rows = [
        (1, ACME, 1, "John Smith", 2, 4.5, "submitted", "Strong technical leadership"),
        (2, ACME, 5, "David Wilson", 2, 4.0, "draft", ""),
        (3, ACME, 7, "James Taylor", 2, 3.5, "draft", ""),
        (4, GLOBEX, 10, "Ava Jackson", 9, 4.2, "submitted", "Great campaign results"),
    ];
    rows.iter()
        .map(|(id, company, employee, name, reviewer, rating, status, comments)| {
            json!({
                "id": id, "company_id": company, "employee_id": employee, "employee_name": name,
                "reviewer_id": reviewer, "period": "2024-H1", "rating": rating,
                "status": status, "comments": comments, "created_at": SEEDED_AT,
            })
        })
        .collect()
}

fn goals() -> Vec<Record> {
    let rows = [
        (1, ACME, 1, "Mentor two junior engineers", 50, "in_progress", "2024-12-31"),
        (2, ACME, 3, "Close $500k in new business", 70, "in_progress", "2024-12-31"),
        (3, ACME, 4, "Automate month-end close", 100, "completed", "2024-06-30"),
        (4, GLOBEX, 9, "Reduce line downtime by 10%", 30, "in_progress", "2024-12-31"),
    ];
    rows.iter()
        .map(|(id, company, employee, title, progress, status, due)| {
            json!({
                "id": id, "company_id": company, "employee_id": employee, "title": title,
                "description": "", "progress": progress, "status": status,
                "due_date": due, "created_at": SEEDED_AT,
            })
        })
        .collect()
}

fn assets() -> Vec<Record> {
    let rows = [
        (1, ACME, "MacBook Pro 14", "AST-001", "laptop", "C02XK1", "assigned", Some(1), "2023-01-10", 2499),
        (2, ACME, "Dell UltraSharp 27", "AST-002", "monitor", "CN0D1", "assigned", Some(5), "2023-03-22", 549),
        (3, ACME, "iPhone 15", "AST-003", "phone", "F2LX9", "available", None, "2024-02-01", 999),
        (4, ACME, "ThinkPad X1", "AST-004", "laptop", "PF3K2", "maintenance", None, "2022-06-15", 1899),
        (5, GLOBEX, "HP EliteBook", "AST-001", "laptop", "5CG12", "assigned", Some(9), "2022-11-05", 1599),
        (6, GLOBEX, "Label Printer", "AST-002", "equipment", "LP400", "available", None, "2023-07-19", 320),
    ];
    rows.iter()
        .map(|(id, company, name, tag, category, serial, status, assigned, purchased, value)| {
            json!({
                "id": id, "company_id": company, "name": name, "asset_tag": tag,
                "category": category, "serial_number": serial, "status": status,
                "assigned_to": assigned, "purchase_date": purchased, "value": value,
                "created_at": SEEDED_AT,
            })
        })
        .collect()
}

fn tickets() -> Vec<Record> {
    let rows = [
        (1, ACME, "VPN not connecting", "Cannot reach the VPN from home since Monday.", "it", "high", "open", 4, Some(1)),
        (2, ACME, "Payslip discrepancy", "May payslip is missing overtime.", "hr", "medium", "in_progress", 4, Some(2)),
        (3, ACME, "Request new monitor", "Second screen for the sales desk.", "facilities", "low", "resolved", 3, Some(1)),
        (4, GLOBEX, "Printer jam on floor 2", "Label printer jams on every batch.", "facilities", "low", "open", 6, None),
    ];
    rows.iter()
        .map(|(id, company, subject, description, category, priority, status, requester, assignee)| {
            let comments = if *id == 2 {
                json!([{"id": 1, "user_id": 2, "author": "Sarah Johnson",
                        "message": "Looking into it with payroll.", "created_at": SEEDED_AT}])
            } else {
                json!([])
            };
            json!({
                "id": id, "company_id": company, "subject": subject, "description": description,
                "category": category, "priority": priority, "status": status,
                "requester_id": requester, "assignee_id": assignee, "comments": comments,
                "created_at": SEEDED_AT,
            })
        })
        .collect()
}

fn notifications() -> Vec<Record> {
    let rows = [
        (1, ACME, 1, "Leave request", "Michael Brown requested annual leave", "leave", false),
        (2, ACME, 1, "Expense submitted", "David Wilson submitted an expense", "expense", false),
        (3, ACME, 2, "Review due", "Complete H1 reviews by July 15", "review", true),
        (4, ACME, 4, "Ticket update", "Your ticket 'Payslip discrepancy' is in progress", "ticket", false),
        (5, GLOBEX, 5, "Leave request", "Ava Jackson requested annual leave", "leave", false),
    ];
    rows.iter()
        .map(|(id, company, user, title, message, kind, read)| {
            json!({
                "id": id, "company_id": company, "user_id": user, "title": title,
                "message": message, "type": kind, "read": read, "created_at": SEEDED_AT,
            })
        })
        .collect()
}

fn dashboard() -> Value {
    let months = ["Jan", "Feb", "Mar", "Apr", "May", "Jun"];
    let revenue: [i64; 6] = [42000, 45500, 51000, 48700, 56200, 61400];
    let expenses: [i64; 6] = [31000, 29800, 33500, 35100, 34000, 36900];
    let headcount: [i64; 6] = [9, 10, 10, 11, 12, 12];
    let series = |values: &[i64]| -> Vec<Value> {
        months
            .iter()
            .zip(values)
            .map(|(m, v)| json!({"month": m, "value": v}))
            .collect()
    };
    json!({
        "revenue": series(&revenue),
        "expenses": series(&expenses),
        "headcount": series(&headcount),
        "attendance_rate": [
            {"day": "Mon", "value": 96}, {"day": "Tue", "value": 94},
            {"day": "Wed", "value": 97}, {"day": "Thu", "value": 92},
            {"day": "Fri", "value": 89}
        ],
    })
}
