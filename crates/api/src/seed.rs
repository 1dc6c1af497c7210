//! Demo account seeding (`SEED_DEMO_DATA=true`).

use venuebook_core::roles::Role;
use venuebook_db::models::user::CreateUser;
use venuebook_db::Store;

use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};

/// Password shared by every demo account.
pub const DEMO_PASSWORD: &str = "password123";

/// `(name, email, role)` of each demo account.
pub const DEMO_USERS: [(&str, &str, Role); 3] = [
    ("Admin User", "admin@edu.com", Role::Admin),
    ("Student User", "student@edu.com", Role::Student),
    ("Faculty User", "faculty@edu.com", Role::Faculty),
];

/// Create any demo account that does not exist yet. Returns how many were created.
pub async fn seed_demo_users(store: &dyn Store) -> AppResult<usize> {
    let mut created = 0;
    for (name, email, role) in DEMO_USERS {
        if store.find_user_by_email(email).await?.is_some() {
            continue;
        }
        let password_hash = hash_password(DEMO_PASSWORD)
            .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
        let user = store
            .create_user(&CreateUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash,
                role,
            })
            .await?;
        tracing::info!(user_id = user.id, email, role = %role, "Seeded demo user");
        created += 1;
    }
    Ok(created)
}
