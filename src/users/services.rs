use crate::auth::claims::SessionClaims;
use crate::users::repo::UserStore;
use crate::users::repo_types::Role;

/// Owner-or-admin check for `/user/{id}` mutations. An id that does not
/// parse never belongs to anyone.
pub fn is_owner(caller: &SessionClaims, target: Option<i64>) -> bool {
    caller.role == Role::Admin || target == Some(caller.id)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Keeps digits only; `None` when nothing is left.
pub fn normalize_phone(phone: &str) -> Option<String> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    (!digits.is_empty()).then_some(digits)
}

/// Whether an active user other than `except` already uses `email`.
pub async fn email_taken(
    store: &dyn UserStore,
    email: &str,
    except: Option<i64>,
) -> anyhow::Result<bool> {
    let existing = store.find_active_by_email(email).await?;
    Ok(existing.is_some_and(|u| Some(u.id) != except))
}
