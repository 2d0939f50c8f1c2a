//! Parameterized statement building.
//!
//! Statements are assembled together with their parameter list so the
//! positional placeholders and the bound values can never drift apart.
//! Fixed statements are written with bare `?` markers and numbered by
//! [`renumber`]; variable-length ones (batch inserts, `IN` lists) take
//! their numbers from a running [`Placeholders`] counter.

pub mod batch;
pub mod membership;

use rusqlite::types::{FromSql, Value};
use rusqlite::{params_from_iter, Connection};

pub use self::batch::{values_clause, BatchInsert};
pub use self::membership::{in_clause, MembershipCount};

/// Unresolved placeholder marker used in statement templates.
pub const MARKER: char = '?';

/// Highest parameter index bundled SQLite accepts
/// (`SQLITE_MAX_VARIABLE_NUMBER`).
pub const SQLITE_MAX_PARAMS: usize = 32766;

/// Positional parameter syntax of the target backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamStyle {
    /// `?1, ?2, ...`
    #[default]
    Sqlite,
    /// `$1, $2, ...`
    Postgres,
}

impl ParamStyle {
    fn prefix(self) -> char {
        match self {
            ParamStyle::Sqlite => '?',
            ParamStyle::Postgres => '$',
        }
    }

    /// Append the reference to the 1-based parameter `index`.
    pub fn push_placeholder(self, out: &mut String, index: usize) {
        out.push(self.prefix());
        out.push_str(&index.to_string());
    }

    pub fn placeholder(self, index: usize) -> String {
        let mut out = String::new();
        self.push_placeholder(&mut out, index);
        out
    }
}

/// Replace every `?` marker in `template` with the backend's positional
/// reference, numbered left to right from 1. Returns the statement and the
/// number of markers consumed.
///
/// The template is read in a single pass and emitted text is never scanned
/// again, so `?N` output and indices past 9 cannot be mistaken for markers.
/// Templates must not carry a literal `?` inside string constants.
pub fn renumber(template: &str, style: ParamStyle) -> (String, usize) {
    let mut out = String::with_capacity(template.len() + 16);
    let mut count = 0;

    for ch in template.chars() {
        if ch == MARKER {
            count += 1;
            style.push_placeholder(&mut out, count);
        } else {
            out.push(ch);
        }
    }

    (out, count)
}

/// Running counter handing out positional references in order.
#[derive(Debug, Clone)]
pub struct Placeholders {
    style: ParamStyle,
    issued: usize,
}

impl Placeholders {
    pub fn new(style: ParamStyle) -> Self {
        Self { style, issued: 0 }
    }

    /// Emit the next reference into `out`.
    pub fn push_next(&mut self, out: &mut String) {
        self.issued += 1;
        self.style.push_placeholder(out, self.issued);
    }

    pub fn issue(&mut self) -> String {
        let mut out = String::new();
        self.push_next(&mut out);
        out
    }

    pub fn issued(&self) -> usize {
        self.issued
    }
}

/// SQL text plus the values bound to its placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    params: Vec<Value>,
}

impl Statement {
    /// Build from text that is already numbered. `params[i]` binds
    /// placeholder `i + 1`.
    pub fn new(sql: String, params: Vec<Value>) -> Self {
        Self { sql, params }
    }

    /// Number the `?` markers of a fixed template and attach `params`.
    pub fn from_template(template: &str, style: ParamStyle, params: Vec<Value>) -> Self {
        let (sql, markers) = renumber(template, style);
        debug_assert_eq!(
            markers,
            params.len(),
            "placeholder count does not match parameters for: {}",
            template.trim()
        );
        Self { sql, params }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Run a statement that returns no rows; yields the affected row count.
    pub fn execute(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(&self.sql, params_from_iter(self.params.iter()))
    }

    /// First column of the single row produced by the statement.
    pub fn query_one<T: FromSql>(&self, conn: &Connection) -> rusqlite::Result<T> {
        conn.query_row(&self.sql, params_from_iter(self.params.iter()), |row| {
            row.get(0)
        })
    }

    /// First column of every row produced by the statement.
    pub fn query_column<T: FromSql>(&self, conn: &Connection) -> rusqlite::Result<Vec<T>> {
        let mut stmt = conn.prepare(&self.sql)?;
        let values = stmt
            .query_map(params_from_iter(self.params.iter()), |row| row.get(0))?
            .collect::<Result<Vec<T>, _>>()?;
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renumber_numbers_markers_left_to_right() {
        let (sql, count) = renumber(
            "INSERT INTO posts(create_by, text) VALUES (?, ?) RETURNING id",
            ParamStyle::Postgres,
        );
        assert_eq!(
            sql,
            "INSERT INTO posts(create_by, text) VALUES ($1, $2) RETURNING id"
        );
        assert_eq!(count, 2);
    }

    #[test]
    fn renumber_is_stable_when_style_reuses_the_marker() {
        let (sql, count) = renumber("a = ? AND b = ? AND c = ?", ParamStyle::Sqlite);
        assert_eq!(sql, "a = ?1 AND b = ?2 AND c = ?3");
        assert_eq!(count, 3);
    }

    #[test]
    fn renumber_handles_multi_digit_indices() {
        let template = vec!["?"; 120].join(",");

        for style in [ParamStyle::Sqlite, ParamStyle::Postgres] {
            let (sql, count) = renumber(&template, style);
            assert_eq!(count, 120);

            let refs: Vec<&str> = sql.split(',').collect();
            assert_eq!(refs.len(), 120);
            for (i, reference) in refs.iter().enumerate() {
                assert_eq!(*reference, style.placeholder(i + 1));
            }
        }
    }

    #[test]
    fn renumber_without_markers_is_identity() {
        let (sql, count) = renumber("SELECT count(*) FROM posts", ParamStyle::Sqlite);
        assert_eq!(sql, "SELECT count(*) FROM posts");
        assert_eq!(count, 0);
    }

    #[test]
    fn placeholders_continue_counting() {
        let mut placeholders = Placeholders::new(ParamStyle::Postgres);
        assert_eq!(placeholders.issue(), "$1");
        assert_eq!(placeholders.issue(), "$2");
        let mut out = String::from("x = ");
        placeholders.push_next(&mut out);
        assert_eq!(out, "x = $3");
        assert_eq!(placeholders.issued(), 3);
    }

    #[test]
    fn statement_binds_in_order() {
        let conn = Connection::open_in_memory().unwrap();
        let stmt = Statement::from_template(
            "SELECT ? || '-' || ?",
            ParamStyle::Sqlite,
            vec![Value::from("left".to_string()), Value::from("right".to_string())],
        );
        assert_eq!(stmt.sql(), "SELECT ?1 || '-' || ?2");
        let joined: String = stmt.query_one(&conn).unwrap();
        assert_eq!(joined, "left-right");
    }

    #[test]
    fn query_column_collects_every_row() {
        let conn = Connection::open_in_memory().unwrap();
        let stmt = Statement::new(
            "SELECT value FROM (SELECT ?1 AS value UNION ALL SELECT ?2) ORDER BY value".into(),
            vec![Value::from(2_i64), Value::from(1_i64)],
        );
        let values: Vec<i64> = stmt.query_column(&conn).unwrap();
        assert_eq!(values, vec![1, 2]);
    }
}
