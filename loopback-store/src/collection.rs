use std::fmt;

/// The closed set of resource collections held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Companies,
    Users,
    Employees,
    Departments,
    Leaves,
    LeavePolicies,
    Attendance,
    Projects,
    Tasks,
    Expenses,
    JobPostings,
    Candidates,
    Reviews,
    Goals,
    Assets,
    Tickets,
    Notifications,
}

impl Collection {
    pub const ALL: [Collection; 17] = [
        Collection::Companies,
        Collection::Users,
        Collection::Employees,
        Collection::Departments,
        Collection::Leaves,
        Collection::LeavePolicies,
        Collection::Attendance,
        Collection::Projects,
        Collection::Tasks,
        Collection::Expenses,
        Collection::JobPostings,
        Collection::Candidates,
        Collection::Reviews,
        Collection::Goals,
        Collection::Assets,
        Collection::Tickets,
        Collection::Notifications,
    ];

    /// Key used in the persisted snapshot.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Companies => "companies",
            Collection::Users => "users",
            Collection::Employees => "employees",
            Collection::Departments => "departments",
            Collection::Leaves => "leaves",
            Collection::LeavePolicies => "leave_policies",
            Collection::Attendance => "attendance",
            Collection::Projects => "projects",
            Collection::Tasks => "tasks",
            Collection::Expenses => "expenses",
            Collection::JobPostings => "job_postings",
            Collection::Candidates => "candidates",
            Collection::Reviews => "reviews",
            Collection::Goals => "goals",
            Collection::Assets => "assets",
            Collection::Tickets => "tickets",
            Collection::Notifications => "notifications",
        }
    }

    pub fn from_name(name: &str) -> Option<Collection> {
        Collection::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_and_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for c in Collection::ALL {
            assert!(seen.insert(c.name()));
            assert_eq!(Collection::from_name(c.name()), Some(c));
        }
        assert_eq!(Collection::from_name("widgets"), None);
    }
}
