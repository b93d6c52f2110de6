use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::warn;

use crate::query::{Condition, Filter, Ordering, Page};
use crate::users::repo_types::{NewUser, Role, User, UserChanges};

/// Store access used by every handler. Built once at startup and shared
/// through `AppState`.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Active (not soft-deleted) user with this exact email.
    async fn find_active_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    /// Active user whose id, name and email all match; the role must match
    /// too when one is given.
    async fn find_active_session(
        &self,
        id: i64,
        name: &str,
        email: &str,
        role: Option<Role>,
    ) -> anyhow::Result<Option<User>>;

    async fn create(&self, user: NewUser) -> anyhow::Result<User>;

    async fn list(&self, filter: &Filter, ordering: Ordering, page: Page)
        -> anyhow::Result<Vec<User>>;

    async fn count(&self, filter: &Filter) -> anyhow::Result<i64>;

    /// Applies `changes` to an active user. `None` when no such user.
    async fn update(&self, id: i64, changes: UserChanges) -> anyhow::Result<Option<User>>;

    /// Sets `finished_at`. `false` when the user is unknown or already gone.
    async fn soft_delete(&self, id: i64) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_USERS: &str = "SELECT id, name, email, password_hash, phone, role, \
     created_at, updated_at, finished_at FROM users";

/// Maps API field names to columns. Anything else never reaches SQL.
pub(super) fn column(field: &str) -> Option<&'static str> {
    match field {
        "id" => Some("id"),
        "name" => Some("name"),
        "email" => Some("email"),
        "phone" => Some("phone"),
        "role" => Some("role"),
        "createdAt" => Some("created_at"),
        "updatedAt" => Some("updated_at"),
        "finishedAt" => Some("finished_at"),
        _ => None,
    }
}

fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    if filter.is_empty() {
        return;
    }
    let mut first = true;
    for predicate in &filter.any_of {
        let Some(col) = column(predicate.field) else {
            warn!(field = predicate.field, "filter on unknown field ignored");
            continue;
        };
        qb.push(if first { " WHERE (" } else { " OR " });
        first = false;

        match &predicate.condition {
            Condition::Contains(value) => {
                qb.push(format!("CAST({col} AS TEXT) ILIKE '%' || "));
                qb.push_bind(escape_like(value));
                qb.push(" || '%'");
            }
            Condition::Equals(value) => {
                qb.push(format!("CAST({col} AS TEXT) = "));
                qb.push_bind(value.clone());
            }
            Condition::EqualsNumber(None) => {
                qb.push(format!("{col} IS NULL"));
            }
            Condition::EqualsNumber(Some(n)) => {
                qb.push(format!("CAST({col} AS TEXT) = "));
                qb.push_bind(n.to_string());
            }
            Condition::CreatedOnOrAfter(ts) => {
                qb.push("created_at >= ");
                qb.push_bind(*ts);
            }
            Condition::CreatedOnOrBefore(ts) => {
                qb.push("created_at <= ");
                qb.push_bind(*ts);
            }
        }
    }
    if !first {
        qb.push(")");
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_active_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, phone, role,
                   created_at, updated_at, finished_at
            FROM users
            WHERE email = $1 AND finished_at IS NULL
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_active_session(
        &self,
        id: i64,
        name: &str,
        email: &str,
        role: Option<Role>,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, phone, role,
                   created_at, updated_at, finished_at
            FROM users
            WHERE id = $1 AND name = $2 AND email = $3
              AND ($4::user_role IS NULL OR role = $4)
              AND finished_at IS NULL
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(role)
        .fetch_optional(&self.pool)
        .await
        .context("find session user")?;
        Ok(user)
    }

    async fn create(&self, user: NewUser) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, phone, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, password_hash, phone, role,
                      created_at, updated_at, finished_at
            "#,
        )
        .bind(user.name)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.phone)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .context("insert user")?;
        Ok(user)
    }

    async fn list(
        &self,
        filter: &Filter,
        ordering: Ordering,
        page: Page,
    ) -> anyhow::Result<Vec<User>> {
        let mut qb = QueryBuilder::<Postgres>::new(SELECT_USERS);
        push_filter(&mut qb, filter);
        let order_col = column(ordering.field).unwrap_or("id");
        qb.push(format!(" ORDER BY {order_col} {}", ordering.direction.to_sql()));
        qb.push(" LIMIT ");
        qb.push_bind(page.take);
        qb.push(" OFFSET ");
        qb.push_bind(page.skip);

        let rows = qb
            .build_query_as::<User>()
            .fetch_all(&self.pool)
            .await
            .context("list users")?;
        Ok(rows)
    }

    async fn count(&self, filter: &Filter) -> anyhow::Result<i64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_filter(&mut qb, filter);
        let total = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .context("count users")?;
        Ok(total)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET name = COALESCE($2, name),
                   email = COALESCE($3, email),
                   password_hash = COALESCE($4, password_hash),
                   phone = COALESCE($5, phone),
                   updated_at = now()
             WHERE id = $1 AND finished_at IS NULL
            RETURNING id, name, email, password_hash, phone, role,
                      created_at, updated_at, finished_at
            "#,
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.email)
        .bind(changes.password_hash)
        .bind(changes.phone)
        .fetch_optional(&self.pool)
        .await
        .context("update user")?;
        Ok(user)
    }

    async fn soft_delete(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
               SET finished_at = now(), updated_at = now()
             WHERE id = $1 AND finished_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .context("soft delete user")?;
        Ok(result.rows_affected() > 0)
    }
}
