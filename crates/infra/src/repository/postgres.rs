//! Postgres-backed repositories and assignment store.
//!
//! ## Error Mapping
//!
//! Driver errors are logged with full detail and collapsed into the kind of
//! the failing operation:
//!
//! | Operation | SQLx error | DomainError |
//! |-----------|------------|-------------|
//! | insert/update user | unique violation (`23505`) on `email` | `ValidationFailed { field: "email" }` |
//! | any write | zero rows affected | `NotFound` |
//! | assign | foreign key violation (`23503`) or any other | `Assignment` |
//! | remove / sync | any | `Removal` / `Sync` |
//! | row write with member lists | any failure in the pivot part | `Sync` (row write rolled back) |
//! | reads | any | `Fetch` |

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Executor, FromRow, PgPool, Postgres, Row, Transaction};
use tracing::{Span, error, instrument};

use puppetmaster_core::{
    DomainError, DomainResult, Email, Permission, PermissionDraft, PermissionId, Role, RoleDraft,
    RoleId, User, UserDraft, UserId, UserPatch,
};

use super::{
    normalize_ids, require_ids, AssignmentStore, PermissionRepository, Relation, RoleRepository,
    UserRepository,
};

const USER_COLUMNS: &str = "id, name, email, password, created_at, updated_at";
const NAMED_COLUMNS: &str = "id, name, description, created_at, updated_at";

/// Postgres store implementing every repository.
///
/// Uses SQLx connection pool which is thread-safe (Arc + Send + Sync).
/// Pivot mutations, and role/user writes together with their member
/// lists, run in SERIALIZABLE transactions.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    async fn begin_serializable(
        &self,
        kind: &DomainError,
    ) -> DomainResult<Transaction<'static, Postgres>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", kind.clone(), e))?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("set_isolation", kind.clone(), e))?;
        Ok(tx)
    }

    /// Delete-by-owner followed by a set insert, inside `tx`.
    async fn replace_in(
        tx: &mut Transaction<'static, Postgres>,
        relation: Relation,
        ids: &[i64],
        owner: i64,
        kind: &DomainError,
    ) -> DomainResult<()> {
        clear_in(tx, relation, owner, kind).await?;

        let insert = format!(
            "INSERT INTO {} ({}, {}) SELECT $1, UNNEST($2::BIGINT[])",
            relation.table(),
            relation.owner_column(),
            relation.member_column(),
        );
        sqlx::query(&insert)
            .bind(owner)
            .bind(ids)
            .execute(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("insert_pivot", kind.clone(), e))?;
        Ok(())
    }

    /// Replace when `ids` is non-empty, clear otherwise, inside `tx`.
    async fn sync_in(
        tx: &mut Transaction<'static, Postgres>,
        relation: Relation,
        ids: &[i64],
        owner: i64,
        kind: &DomainError,
    ) -> DomainResult<()> {
        if ids.is_empty() {
            clear_in(tx, relation, owner, kind).await?;
            Ok(())
        } else {
            Self::replace_in(tx, relation, ids, owner, kind).await
        }
    }
}

async fn clear_in(
    tx: &mut Transaction<'static, Postgres>,
    relation: Relation,
    owner: i64,
    kind: &DomainError,
) -> DomainResult<u64> {
    let delete = format!(
        "DELETE FROM {} WHERE {} = $1",
        relation.table(),
        relation.owner_column()
    );
    let result = sqlx::query(&delete)
        .bind(owner)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("delete_pivot", kind.clone(), e))?;
    Ok(result.rows_affected())
}

#[async_trait]
impl UserRepository for PostgresStore {
    #[instrument(skip(self), err)]
    async fn fetch(&self) -> DomainResult<Vec<User>> {
        let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_users", DomainError::Fetch, e))?;
        decode_rows::<UserRow, _>(rows)
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn get_by_id(&self, id: UserId) -> DomainResult<User> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user", DomainError::Fetch, e))?;
        decode_one::<UserRow, _>(row)
    }

    #[instrument(skip(self, email), err)]
    async fn get_by_email(&self, email: &Email) -> DomainResult<User> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user_by_email", DomainError::Fetch, e))?;
        decode_one::<UserRow, _>(row)
    }

    #[instrument(skip(self, draft), fields(user_id), err)]
    async fn store(&self, draft: UserDraft) -> DomainResult<User> {
        let row = sqlx::query(&format!(
            "INSERT INTO users (name, email, password) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        ))
        .bind(&draft.name)
        .bind(draft.email.as_str())
        .bind(&draft.password_hash)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_user_write_error("insert_user", DomainError::Store, e))?;

        let user: User = decode_row::<UserRow>(&row)?.into();
        Span::current().record("user_id", user.id.get());
        Ok(user)
    }

    #[instrument(skip(self, patch, roles, permissions), fields(user_id = %id), err)]
    async fn update_with_assignments(
        &self,
        id: UserId,
        patch: UserPatch,
        roles: Option<&[i64]>,
        permissions: Option<&[i64]>,
    ) -> DomainResult<User> {
        let mut tx = self.begin_serializable(&DomainError::Update).await?;
        let user = update_user_row(&mut *tx, id, &patch).await?;

        let sync = DomainError::Sync;
        if let Some(ids) = roles {
            let ids = normalize_ids(ids);
            Self::sync_in(&mut tx, Relation::RoleUser, &ids, id.get(), &sync).await?;
        }
        if let Some(ids) = permissions {
            let ids = normalize_ids(ids);
            Self::sync_in(&mut tx, Relation::PermissionUser, &ids, id.get(), &sync).await?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", DomainError::Update, e))?;
        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn delete(&self, id: UserId) -> DomainResult<()> {
        delete_by_id(&self.pool, "users", id.get()).await
    }
}

#[async_trait]
impl RoleRepository for PostgresStore {
    #[instrument(skip(self), err)]
    async fn fetch(&self) -> DomainResult<Vec<Role>> {
        let rows = sqlx::query(&format!("SELECT {NAMED_COLUMNS} FROM roles ORDER BY id"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_roles", DomainError::Fetch, e))?;
        decode_rows::<NamedRow, _>(rows)
    }

    #[instrument(skip(self), fields(role_id = %id), err)]
    async fn get_by_id(&self, id: RoleId) -> DomainResult<Role> {
        let row = sqlx::query(&format!("SELECT {NAMED_COLUMNS} FROM roles WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_role", DomainError::Fetch, e))?;
        decode_one::<NamedRow, _>(row)
    }

    #[instrument(skip(self, draft, permissions), fields(count = permissions.len()), err)]
    async fn store_with_permissions(
        &self,
        draft: RoleDraft,
        permissions: &[i64],
    ) -> DomainResult<Role> {
        let mut tx = self.begin_serializable(&DomainError::Store).await?;
        let role = insert_role_row(&mut *tx, &draft).await?;
        Self::sync_in(
            &mut tx,
            Relation::PermissionRole,
            &normalize_ids(permissions),
            role.id.get(),
            &DomainError::Sync,
        )
        .await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", DomainError::Store, e))?;
        Ok(role)
    }

    #[instrument(skip(self, draft, permissions), fields(role_id = %id), err)]
    async fn update_with_permissions(
        &self,
        id: RoleId,
        draft: RoleDraft,
        permissions: Option<&[i64]>,
    ) -> DomainResult<Role> {
        let mut tx = self.begin_serializable(&DomainError::Update).await?;
        let role = update_role_row(&mut *tx, id, &draft).await?;
        if let Some(ids) = permissions {
            let ids = normalize_ids(ids);
            Self::sync_in(&mut tx, Relation::PermissionRole, &ids, id.get(), &DomainError::Sync)
                .await?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", DomainError::Update, e))?;
        Ok(role)
    }

    #[instrument(skip(self), fields(role_id = %id), err)]
    async fn delete(&self, id: RoleId) -> DomainResult<()> {
        delete_by_id(&self.pool, "roles", id.get()).await
    }

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn get_by_user_id(&self, user_id: UserId) -> DomainResult<Vec<Role>> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.name, r.description, r.created_at, r.updated_at
            FROM roles r
            JOIN role_user ru ON ru.role_id = r.id
            WHERE ru.user_id = $1
            ORDER BY r.id
            "#,
        )
        .bind(user_id.get())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_roles_by_user", DomainError::Fetch, e))?;
        decode_rows::<NamedRow, _>(rows)
    }
}

#[async_trait]
impl PermissionRepository for PostgresStore {
    #[instrument(skip(self), err)]
    async fn fetch(&self) -> DomainResult<Vec<Permission>> {
        let rows = sqlx::query(&format!("SELECT {NAMED_COLUMNS} FROM permissions ORDER BY id"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_permissions", DomainError::Fetch, e))?;
        decode_rows::<NamedRow, _>(rows)
    }

    #[instrument(skip(self), fields(permission_id = %id), err)]
    async fn get_by_id(&self, id: PermissionId) -> DomainResult<Permission> {
        let row = sqlx::query(&format!("SELECT {NAMED_COLUMNS} FROM permissions WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_permission", DomainError::Fetch, e))?;
        decode_one::<NamedRow, _>(row)
    }

    #[instrument(skip(self, draft), err)]
    async fn store(&self, draft: PermissionDraft) -> DomainResult<Permission> {
        let row = sqlx::query(&format!(
            "INSERT INTO permissions (name, description) VALUES ($1, $2) RETURNING {NAMED_COLUMNS}"
        ))
        .bind(&draft.name)
        .bind(&draft.description)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_permission", DomainError::Store, e))?;
        Ok(decode_row::<NamedRow>(&row)?.into())
    }

    #[instrument(skip(self, draft), fields(permission_id = %id), err)]
    async fn update(&self, id: PermissionId, draft: PermissionDraft) -> DomainResult<Permission> {
        let row = sqlx::query(&format!(
            "UPDATE permissions SET name = $1, description = $2, updated_at = NOW() WHERE id = $3 RETURNING {NAMED_COLUMNS}"
        ))
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_permission", DomainError::Update, e))?;
        decode_one::<NamedRow, _>(row)
    }

    #[instrument(skip(self), fields(permission_id = %id), err)]
    async fn delete(&self, id: PermissionId) -> DomainResult<()> {
        delete_by_id(&self.pool, "permissions", id.get()).await
    }

    #[instrument(skip(self), fields(role_id = %role_id), err)]
    async fn get_by_role_id(&self, role_id: RoleId) -> DomainResult<Vec<Permission>> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.name, p.description, p.created_at, p.updated_at
            FROM permissions p
            JOIN permission_role pr ON pr.permission_id = p.id
            WHERE pr.role_id = $1
            ORDER BY p.id
            "#,
        )
        .bind(role_id.get())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_permissions_by_role", DomainError::Fetch, e))?;
        decode_rows::<NamedRow, _>(rows)
    }

    #[instrument(skip(self), err)]
    async fn get_by_role_name(&self, role_name: &str) -> DomainResult<Vec<Permission>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT p.id, p.name, p.description, p.created_at, p.updated_at
            FROM permissions p
            JOIN permission_role pr ON pr.permission_id = p.id
            JOIN roles r ON r.id = pr.role_id
            WHERE r.name = $1
            ORDER BY p.id
            "#,
        )
        .bind(role_name)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_permissions_by_role_name", DomainError::Fetch, e))?;
        decode_rows::<NamedRow, _>(rows)
    }

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn get_by_user_id(&self, user_id: UserId) -> DomainResult<Vec<Permission>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT ON (p.name) p.id, p.name, p.description, p.created_at, p.updated_at
            FROM permissions p
            WHERE p.id IN (
                SELECT pu.permission_id FROM permission_user pu WHERE pu.user_id = $1
                UNION
                SELECT pr.permission_id
                FROM permission_role pr
                JOIN role_user ru ON ru.role_id = pr.role_id
                WHERE ru.user_id = $1
            )
            ORDER BY p.name, p.id
            "#,
        )
        .bind(user_id.get())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_permissions_by_user", DomainError::Fetch, e))?;
        decode_rows::<NamedRow, _>(rows)
    }
}

#[async_trait]
impl AssignmentStore for PostgresStore {
    #[instrument(skip(self, ids), fields(relation = %relation, count = ids.len()), err)]
    async fn assign(&self, relation: Relation, ids: &[i64], owner: i64) -> DomainResult<()> {
        require_ids(ids)?;
        let ids = normalize_ids(ids);
        let kind = DomainError::Assignment;

        let mut tx = self.begin_serializable(&kind).await?;
        Self::replace_in(&mut tx, relation, &ids, owner, &kind).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", kind, e))
    }

    #[instrument(skip(self, ids), fields(relation = %relation, requested = ids.len(), removed), err)]
    async fn remove(&self, relation: Relation, ids: &[i64], owner: i64) -> DomainResult<()> {
        let kind = DomainError::Removal;

        let mut tx = self.begin_serializable(&kind).await?;
        let removed = clear_in(&mut tx, relation, owner, &kind).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", kind, e))?;

        Span::current().record("removed", removed);
        Ok(())
    }

    #[instrument(skip(self, ids), fields(relation = %relation, count = ids.len()), err)]
    async fn sync(&self, relation: Relation, ids: &[i64], owner: i64) -> DomainResult<()> {
        let ids = normalize_ids(ids);
        let kind = DomainError::Sync;

        let mut tx = self.begin_serializable(&kind).await?;
        Self::sync_in(&mut tx, relation, &ids, owner, &kind).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", kind, e))
    }

    #[instrument(skip(self), fields(relation = %relation), err)]
    async fn members(&self, relation: Relation, owner: i64) -> DomainResult<Vec<i64>> {
        let select = format!(
            "SELECT {member} FROM {table} WHERE {owner_col} = $1 ORDER BY {member}",
            member = relation.member_column(),
            table = relation.table(),
            owner_col = relation.owner_column(),
        );
        let rows = sqlx::query(&select)
            .bind(owner)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_pivot", DomainError::Fetch, e))?;

        rows.iter()
            .map(|row| row.try_get::<i64, _>(0))
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("decode_pivot", DomainError::Fetch, e))
    }
}

async fn update_user_row<'e, E>(exec: E, id: UserId, patch: &UserPatch) -> DomainResult<User>
where
    E: Executor<'e, Database = Postgres>,
{
    let row = sqlx::query(&format!(
        r#"
        UPDATE users
        SET name = $1, email = $2, password = COALESCE($3, password), updated_at = NOW()
        WHERE id = $4
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(&patch.name)
    .bind(patch.email.as_str())
    .bind(patch.password_hash.as_deref())
    .bind(id.get())
    .fetch_optional(exec)
    .await
    .map_err(|e| map_user_write_error("update_user", DomainError::Update, e))?;
    decode_one::<UserRow, _>(row)
}

async fn insert_role_row<'e, E>(exec: E, draft: &RoleDraft) -> DomainResult<Role>
where
    E: Executor<'e, Database = Postgres>,
{
    let row = sqlx::query(&format!(
        "INSERT INTO roles (name, description) VALUES ($1, $2) RETURNING {NAMED_COLUMNS}"
    ))
    .bind(&draft.name)
    .bind(&draft.description)
    .fetch_one(exec)
    .await
    .map_err(|e| map_sqlx_error("insert_role", DomainError::Store, e))?;
    Ok(decode_row::<NamedRow>(&row)?.into())
}

async fn update_role_row<'e, E>(exec: E, id: RoleId, draft: &RoleDraft) -> DomainResult<Role>
where
    E: Executor<'e, Database = Postgres>,
{
    let row = sqlx::query(&format!(
        "UPDATE roles SET name = $1, description = $2, updated_at = NOW() WHERE id = $3 RETURNING {NAMED_COLUMNS}"
    ))
    .bind(&draft.name)
    .bind(&draft.description)
    .bind(id.get())
    .fetch_optional(exec)
    .await
    .map_err(|e| map_sqlx_error("update_role", DomainError::Update, e))?;
    decode_one::<NamedRow, _>(row)
}

async fn delete_by_id(pool: &PgPool, table: &'static str, id: i64) -> DomainResult<()> {
    let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("delete", DomainError::Delete, e))?;

    if result.rows_affected() == 0 {
        return Err(DomainError::NotFound);
    }
    Ok(())
}

/// Log the driver error and collapse it into `kind`.
fn map_sqlx_error(operation: &'static str, kind: DomainError, err: sqlx::Error) -> DomainError {
    match &err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.into_owned()).unwrap_or_default();
            error!(operation, %code, error = %db_err.message(), "database error");
        }
        _ => error!(operation, error = %err, "database error"),
    }
    kind
}

fn map_user_write_error(operation: &'static str, kind: DomainError, err: sqlx::Error) -> DomainError {
    if is_unique_violation(&err) {
        return DomainError::validation("email", "has already been taken");
    }
    map_sqlx_error(operation, kind, err)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}

fn decode_row<'r, R: FromRow<'r, PgRow>>(row: &'r PgRow) -> DomainResult<R> {
    R::from_row(row).map_err(|e| map_sqlx_error("decode_row", DomainError::Fetch, e))
}

fn decode_one<R, T>(row: Option<PgRow>) -> DomainResult<T>
where
    R: for<'r> FromRow<'r, PgRow> + Into<T>,
{
    let row = row.ok_or(DomainError::NotFound)?;
    Ok(decode_row::<R>(&row)?.into())
}

fn decode_rows<R, T>(rows: Vec<PgRow>) -> DomainResult<Vec<T>>
where
    R: for<'r> FromRow<'r, PgRow> + Into<T>,
{
    rows.iter()
        .map(|row| decode_row::<R>(row).map(Into::into))
        .collect()
}

// SQLx row types

#[derive(Debug)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    password: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password: row.try_get("password")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::new(row.id),
            name: row.name,
            email: row.email,
            password_hash: row.password,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Shared shape of the `roles` and `permissions` tables.
#[derive(Debug)]
struct NamedRow {
    id: i64,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for NamedRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(NamedRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<NamedRow> for Role {
    fn from(row: NamedRow) -> Self {
        Role {
            id: RoleId::new(row.id),
            name: row.name,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<NamedRow> for Permission {
    fn from(row: NamedRow) -> Self {
        Permission {
            id: PermissionId::new(row.id),
            name: row.name,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_errors_collapse_into_the_operation_kind() {
        assert_eq!(
            map_sqlx_error("fetch_users", DomainError::Fetch, sqlx::Error::PoolClosed),
            DomainError::Fetch
        );
        assert_eq!(
            map_user_write_error("insert_user", DomainError::Store, sqlx::Error::RowNotFound),
            DomainError::Store
        );
        assert!(!is_unique_violation(&sqlx::Error::PoolTimedOut));
    }

    #[test]
    fn named_rows_convert_into_roles_and_permissions() {
        let now = Utc::now();
        let row = || NamedRow {
            id: 4,
            name: "editor".into(),
            description: "edits".into(),
            created_at: now,
            updated_at: now,
        };
        let role: Role = row().into();
        let permission: Permission = row().into();
        assert_eq!(role.id, RoleId::new(4));
        assert_eq!(permission.id, PermissionId::new(4));
        assert_eq!(permission.name, "editor");
    }
}
