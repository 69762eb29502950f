//! SQLite-backed client repository.
//!
//! # Responsibility
//! - Serve the client contract straight from the `Clients` table, one or
//!   more bound-parameter statements per call, with no in-memory cache.
//! - Own the connection for the repository lifetime.
//!
//! # Invariants
//! - Write paths call `Client::validate()` and the count-based uniqueness
//!   queries before SQL mutations.
//! - Identity is assigned by the store (`INSERT ... RETURNING client_id`).
//! - Stored order is `client_id ASC`.
//! - Read paths reject invalid persisted rows instead of masking them.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::{open_db, open_db_in_memory};
use crate::model::client::{non_empty, Client, ClientId, ClientSummary, Gender};
use crate::model::validation::digits_only;
use crate::repo::client_repo::{ClientRepository, RepoError, RepoResult};
use crate::repo::uniqueness::UniquenessViolation;
use chrono::NaiveDate;
use log::{info, warn};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::cmp::Ordering;
use std::path::Path;

const CLIENT_SELECT_SQL: &str = "SELECT
    client_id,
    last_name,
    first_name,
    patronymic,
    passport_series,
    passport_number,
    phone_number,
    email,
    birth_date,
    gender
FROM Clients";

const REQUIRED_COLUMNS: [&str; 10] = [
    "client_id",
    "last_name",
    "first_name",
    "patronymic",
    "passport_series",
    "passport_number",
    "phone_number",
    "email",
    "birth_date",
    "gender",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Relational client repository over one owned SQLite connection.
pub struct SqliteClientRepository {
    conn: Connection,
}

impl SqliteClientRepository {
    /// Takes ownership of a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when the schema version is not current.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when `Clients` does
    ///   not have the expected shape.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        ensure_connection_ready(&conn)?;
        register_functions(&conn)?;
        Ok(Self { conn })
    }

    /// Opens (or creates) a database file and wraps it.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Self::try_new(open_db(path)?)
    }

    /// Wraps a private in-memory database.
    pub fn open_in_memory() -> RepoResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Releases the repository and hands the connection back.
    pub fn into_connection(self) -> Connection {
        self.conn
    }

    /// Returns whether a trivial query against `Clients` succeeds.
    pub fn test_connection(&self) -> bool {
        self.count().is_ok()
    }

    fn exists(&self, id: ClientId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM Clients WHERE client_id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    /// Same rule order as the in-memory checker: passport, phone, email.
    fn check_uniqueness(&self, candidate: &Client, exclude_id: Option<ClientId>) -> RepoResult<()> {
        let passport_matches = self.count_matching(
            "passport_series = ? AND passport_number = ?",
            vec![
                Value::Text(candidate.passport_series.clone()),
                Value::Text(candidate.passport_number.clone()),
            ],
            exclude_id,
        )?;
        if passport_matches > 0 {
            return Err(UniquenessViolation::Passport {
                series: candidate.passport_series.clone(),
                number: candidate.passport_number.clone(),
            }
            .into());
        }

        let phone = candidate.normalized_phone();
        let phone_matches = self.count_matching(
            "digits_only(phone_number) = ?",
            vec![Value::Text(phone.clone())],
            exclude_id,
        )?;
        if phone_matches > 0 {
            return Err(UniquenessViolation::Phone(phone).into());
        }

        if let Some(email) = candidate.email.as_deref().filter(|email| !email.is_empty()) {
            let email_matches =
                self.count_matching("email = ?", vec![Value::Text(email.to_string())], exclude_id)?;
            if email_matches > 0 {
                return Err(UniquenessViolation::Email(email.to_string()).into());
            }
        }

        Ok(())
    }

    fn count_matching(
        &self,
        predicate: &'static str,
        mut bind_values: Vec<Value>,
        exclude_id: Option<ClientId>,
    ) -> RepoResult<i64> {
        let mut sql = format!("SELECT COUNT(*) FROM Clients WHERE {predicate}");
        if let Some(id) = exclude_id {
            sql.push_str(" AND client_id != ?");
            bind_values.push(Value::Integer(id));
        }
        let count = self
            .conn
            .query_row(&sql, params_from_iter(bind_values), |row| row.get(0))?;
        Ok(count)
    }

    fn query_clients(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<Client>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut clients = Vec::new();
        while let Some(row) = rows.next()? {
            clients.push(parse_client_row(row)?);
        }
        Ok(clients)
    }
}

impl ClientRepository for SqliteClientRepository {
    fn load(&mut self) -> RepoResult<()> {
        Ok(())
    }

    fn save(&self) -> RepoResult<()> {
        Ok(())
    }

    fn get_by_id(&self, id: ClientId) -> RepoResult<Client> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CLIENT_SELECT_SQL} WHERE client_id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return parse_client_row(row);
        }
        Err(RepoError::NotFound(id))
    }

    fn get_short_list(&self, offset: usize, count: usize) -> RepoResult<Vec<ClientSummary>> {
        if count == 0 {
            return Err(RepoError::InvalidPageSize(count));
        }

        let mut stmt = self.conn.prepare(
            "SELECT
                client_id,
                last_name,
                first_name,
                patronymic,
                passport_series,
                passport_number,
                phone_number
             FROM Clients
             ORDER BY client_id ASC
             LIMIT ?1 OFFSET ?2;",
        )?;
        let mut rows = stmt.query(params![to_sql_int(count), to_sql_int(offset)])?;
        let mut page = Vec::new();
        while let Some(row) = rows.next()? {
            page.push(ClientSummary {
                id: row.get("client_id")?,
                last_name: row.get("last_name")?,
                first_name: row.get("first_name")?,
                patronymic: row
                    .get::<_, Option<String>>("patronymic")?
                    .and_then(non_empty),
                passport_series: row.get("passport_series")?,
                passport_number: row.get("passport_number")?,
                phone_number: row.get("phone_number")?,
            });
        }
        Ok(page)
    }

    fn get_all(&self) -> RepoResult<Vec<Client>> {
        self.query_clients(&format!("{CLIENT_SELECT_SQL} ORDER BY client_id ASC;"), Vec::new())
    }

    fn add(&mut self, candidate: &Client) -> RepoResult<Client> {
        let candidate = candidate.clone().normalized();
        candidate.validate()?;
        self.check_uniqueness(&candidate, None)?;

        let id: ClientId = self.conn.query_row(
            "INSERT INTO Clients (
                last_name,
                first_name,
                patronymic,
                passport_series,
                passport_number,
                phone_number,
                email,
                birth_date,
                gender
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            RETURNING client_id;",
            params![
                candidate.last_name.as_str(),
                candidate.first_name.as_str(),
                candidate.patronymic.as_deref(),
                candidate.passport_series.as_str(),
                candidate.passport_number.as_str(),
                candidate.phone_number.as_str(),
                candidate.email.as_deref(),
                candidate.birth_date.format(DATE_FORMAT).to_string(),
                candidate.gender.code(),
            ],
            |row| row.get(0),
        )?;

        info!("event=client_add module=repo status=ok backend=sqlite id={id}");
        Ok(candidate.with_id(id))
    }

    fn update(&mut self, id: ClientId, candidate: &Client) -> RepoResult<Client> {
        if !self.exists(id)? {
            return Err(RepoError::NotFound(id));
        }

        let replacement = candidate.clone().normalized().with_id(id);
        replacement.validate()?;
        self.check_uniqueness(&replacement, Some(id))?;

        let changed = self.conn.execute(
            "UPDATE Clients
             SET
                last_name = ?1,
                first_name = ?2,
                patronymic = ?3,
                passport_series = ?4,
                passport_number = ?5,
                phone_number = ?6,
                email = ?7,
                birth_date = ?8,
                gender = ?9
             WHERE client_id = ?10;",
            params![
                replacement.last_name.as_str(),
                replacement.first_name.as_str(),
                replacement.patronymic.as_deref(),
                replacement.passport_series.as_str(),
                replacement.passport_number.as_str(),
                replacement.phone_number.as_str(),
                replacement.email.as_deref(),
                replacement.birth_date.format(DATE_FORMAT).to_string(),
                replacement.gender.code(),
                id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        info!("event=client_update module=repo status=ok backend=sqlite id={id}");
        Ok(replacement)
    }

    fn delete(&mut self, id: ClientId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM Clients WHERE client_id = ?1;", [id])?;
        if changed > 0 {
            info!("event=client_delete module=repo status=ok backend=sqlite id={id}");
        }
        Ok(changed > 0)
    }

    fn count(&self) -> RepoResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM Clients;", [], |row| row.get(0))?;
        usize::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("invalid client count `{count}`")))
    }

    fn search_by_last_name(&self, needle: &str) -> RepoResult<Vec<Client>> {
        self.query_clients(
            &format!(
                "{CLIENT_SELECT_SQL}
                 WHERE instr(fold_case(last_name), fold_case(?)) > 0
                 ORDER BY client_id ASC;"
            ),
            vec![Value::Text(needle.to_string())],
        )
    }

    fn search_by_phone(&self, phone: &str) -> RepoResult<Vec<Client>> {
        self.query_clients(
            &format!(
                "{CLIENT_SELECT_SQL}
                 WHERE digits_only(phone_number) = ?
                 ORDER BY client_id ASC;"
            ),
            vec![Value::Text(digits_only(phone))],
        )
    }

    fn sort_by_cmp(&mut self, _compare: &dyn Fn(&Client, &Client) -> Ordering) -> RepoResult<()> {
        warn!("event=client_sort module=repo status=error backend=sqlite error_code=unsupported");
        Err(RepoError::Unsupported("sort_by"))
    }

    fn clear(&mut self) -> RepoResult<()> {
        let removed = self.conn.execute("DELETE FROM Clients;", [])?;
        info!("event=client_clear module=repo status=ok backend=sqlite removed={removed}");
        Ok(())
    }
}

fn parse_client_row(row: &Row<'_>) -> RepoResult<Client> {
    let id: ClientId = row.get("client_id")?;

    let birth_text: String = row.get("birth_date")?;
    let birth_date = NaiveDate::parse_from_str(&birth_text, DATE_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid birth date `{birth_text}` in Clients.birth_date for client {id}"
        ))
    })?;

    let gender = match row.get::<_, Option<String>>("gender")? {
        Some(code) => Gender::from_code(&code).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid gender code `{code}` in Clients.gender for client {id}"
            ))
        })?,
        None => {
            return Err(RepoError::InvalidData(format!(
                "missing gender in Clients.gender for client {id}"
            )));
        }
    };

    let client = Client {
        id,
        last_name: row.get("last_name")?,
        first_name: row.get("first_name")?,
        patronymic: row
            .get::<_, Option<String>>("patronymic")?
            .and_then(non_empty),
        passport_series: row.get("passport_series")?,
        passport_number: row.get("passport_number")?,
        phone_number: row.get("phone_number")?,
        email: row.get::<_, Option<String>>("email")?.and_then(non_empty),
        birth_date,
        gender,
    };
    client
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("client {id}: {err}")))?;
    Ok(client)
}

fn to_sql_int(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn register_functions(conn: &Connection) -> RepoResult<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;
    conn.create_scalar_function("digits_only", 1, flags, |ctx| {
        let value: Option<String> = ctx.get(0)?;
        Ok(value.map(|text| digits_only(&text)))
    })?;
    // SQLite's lower() only folds ASCII; Cyrillic names need full Unicode.
    conn.create_scalar_function("fold_case", 1, flags, |ctx| {
        let value: Option<String> = ctx.get(0)?;
        Ok(value.map(|text| text.to_lowercase()))
    })?;
    Ok(())
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "Clients")? {
        return Err(RepoError::MissingRequiredTable("Clients"));
    }

    for column in REQUIRED_COLUMNS {
        if !table_has_column(conn, "Clients", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "Clients",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1 COLLATE NOCASE
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &'static str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current.eq_ignore_ascii_case(column) {
            return Ok(true);
        }
    }
    Ok(false)
}
