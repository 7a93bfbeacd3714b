use std::fmt::{Display, Formatter};

/// Role label as stored after login. Unknown labels are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Admin,
    Manager,
    Employee,
    Other(String),
}

impl Role {
    pub fn parse(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        if trimmed.is_empty() { return None; }
        Some(match trimmed.to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "manager" => Role::Manager,
            "employee" => Role::Employee,
            _ => Role::Other(trimmed.to_string()),
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Employee => "employee",
            Role::Other(s) => s.as_str(),
        }
    }

    /// Admin and manager can use role-gated views; everything else, including an
    /// unrecognized label, cannot.
    pub fn grants_elevated_access(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
