//! Portal roles and the capabilities attached to each of them.
//!
//! Role names must match the `CHECK` constraint on `users.role` in
//! `20260301000001_create_users_table.sql`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_STUDENT: &str = "student";
pub const ROLE_FACULTY: &str = "faculty";

/// The role a user holds. Assigned once at signup and never changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Student,
    Faculty,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => ROLE_ADMIN,
            Role::Student => ROLE_STUDENT,
            Role::Faculty => ROLE_FACULTY,
        }
    }

    /// Students and faculty submit bookings; admins adjudicate them.
    pub fn can_submit_bookings(self) -> bool {
        matches!(self, Role::Student | Role::Faculty)
    }

    /// Only admins may approve or reject a booking.
    pub fn can_adjudicate(self) -> bool {
        self == Role::Admin
    }

    /// Roles a user may pick for themselves at signup.
    pub fn is_self_assignable(self) -> bool {
        self != Role::Admin
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ROLE_ADMIN => Ok(Role::Admin),
            ROLE_STUDENT => Ok(Role::Student),
            ROLE_FACULTY => Ok(Role::Faculty),
            other => Err(CoreError::Validation(format!(
                "Unknown role '{other}'. Must be one of: {ROLE_ADMIN}, {ROLE_STUDENT}, {ROLE_FACULTY}"
            ))),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
