use std::cmp::Ordering as CmpOrdering;
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::query::{Condition, Filter, Ordering, Page, Predicate, SortDirection};
use crate::users::repo::{column, UserStore};
use crate::users::repo_types::{NewUser, Role, User, UserChanges};

/// `UserStore` kept in process memory, for tests.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct row access so tests can arrange state the API cannot reach.
    pub fn with_user<R>(&self, id: i64, f: impl FnOnce(&mut User) -> R) -> Option<R> {
        let mut users = self.users.lock().unwrap();
        users.iter_mut().find(|u| u.id == id).map(f)
    }
}

/// Column value as Postgres would render it for `CAST(col AS TEXT)`; `None`
/// is SQL NULL.
fn value(user: &User, col: &str) -> Option<String> {
    match col {
        "id" => Some(user.id.to_string()),
        "name" => Some(user.name.clone()),
        "email" => Some(user.email.clone()),
        "phone" => user.phone.clone(),
        "role" => Some(user.role.as_str().to_string()),
        "created_at" => Some(user.created_at.to_string()),
        "updated_at" => Some(user.updated_at.to_string()),
        "finished_at" => user.finished_at.map(|t| t.to_string()),
        _ => None,
    }
}

/// `None` when the predicate names a field the SQL store ignores.
fn matches(user: &User, predicate: &Predicate) -> Option<bool> {
    let col = column(predicate.field)?;
    let hit = match &predicate.condition {
        Condition::Contains(needle) => value(user, col)
            .map(|t| t.to_lowercase().contains(&needle.to_lowercase()))
            .unwrap_or(false),
        Condition::Equals(expected) => value(user, col).as_deref() == Some(expected.as_str()),
        Condition::EqualsNumber(None) => value(user, col).is_none(),
        Condition::EqualsNumber(Some(n)) => value(user, col) == Some(n.to_string()),
        Condition::CreatedOnOrAfter(ts) => user.created_at >= *ts,
        Condition::CreatedOnOrBefore(ts) => user.created_at <= *ts,
    };
    Some(hit)
}

fn passes(user: &User, filter: &Filter) -> bool {
    let mut results = filter.any_of.iter().filter_map(|p| matches(user, p)).peekable();
    results.peek().is_none() || results.any(|hit| hit)
}

fn compare(a: &User, b: &User, field: &str) -> CmpOrdering {
    match field {
        "name" => a.name.cmp(&b.name),
        "email" => a.email.cmp(&b.email),
        "phone" => a.phone.cmp(&b.phone),
        "createdAt" => a.created_at.cmp(&b.created_at),
        "updatedAt" => a.updated_at.cmp(&b.updated_at),
        _ => a.id.cmp(&b.id),
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_active_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|u| u.is_active() && u.email == email)
            .cloned())
    }

    async fn find_active_session(
        &self,
        id: i64,
        name: &str,
        email: &str,
        role: Option<Role>,
    ) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|u| {
                u.is_active()
                    && u.id == id
                    && u.name == name
                    && u.email == email
                    && role.map_or(true, |r| r == u.role)
            })
            .cloned())
    }

    async fn create(&self, user: NewUser) -> anyhow::Result<User> {
        let mut users = self.users.lock().unwrap();
        let now = OffsetDateTime::now_utc();
        let row = User {
            id: users.iter().map(|u| u.id).max().unwrap_or(0) + 1,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            phone: user.phone,
            role: user.role,
            created_at: now,
            updated_at: now,
            finished_at: None,
        };
        users.push(row.clone());
        Ok(row)
    }

    async fn list(
        &self,
        filter: &Filter,
        ordering: Ordering,
        page: Page,
    ) -> anyhow::Result<Vec<User>> {
        let users = self.users.lock().unwrap();
        let mut rows: Vec<User> = users.iter().filter(|u| passes(u, filter)).cloned().collect();
        rows.sort_by(|a, b| {
            let ord = compare(a, b, ordering.field);
            match ordering.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });
        Ok(rows
            .into_iter()
            .skip(page.skip as usize)
            .take(page.take as usize)
            .collect())
    }

    async fn count(&self, filter: &Filter) -> anyhow::Result<i64> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().filter(|u| passes(u, filter)).count() as i64)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> anyhow::Result<Option<User>> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.iter_mut().find(|u| u.id == id && u.is_active()) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        if let Some(phone) = changes.phone {
            user.phone = Some(phone);
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }

    async fn soft_delete(&self, id: i64) -> anyhow::Result<bool> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == id && u.is_active()) {
            Some(user) => {
                let now = OffsetDateTime::now_utc();
                user.finished_at = Some(now);
                user.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn predicate(field: &'static str, condition: Condition) -> Filter {
        Filter {
            any_of: vec![Predicate { field, condition }],
        }
    }

    async fn store_with(phones: &[Option<&str>]) -> InMemoryUserStore {
        let store = InMemoryUserStore::new();
        for (i, phone) in phones.iter().enumerate() {
            store
                .create(NewUser {
                    name: format!("User {i}"),
                    email: format!("u{i}@example.com"),
                    password_hash: "hash".into(),
                    phone: phone.map(str::to_string),
                    role: Role::Standard,
                })
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn unknown_fields_are_ignored_like_sql() {
        let store = store_with(&[None, Some("123")]).await;
        let filter = predicate("managerId", Condition::EqualsNumber(Some(1)));
        assert_eq!(store.count(&filter).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn numeric_equality_applies_to_any_column() {
        let store = store_with(&[None, Some("123"), Some("456")]).await;
        assert_eq!(
            store
                .count(&predicate("phone", Condition::EqualsNumber(None)))
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            store
                .count(&predicate("phone", Condition::EqualsNumber(Some(456))))
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            store
                .count(&predicate("id", Condition::EqualsNumber(Some(2))))
                .await
                .unwrap(),
            1
        );
    }
}
