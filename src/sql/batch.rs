use rusqlite::types::Value;

use super::{ParamStyle, Placeholders, Statement};

/// Emit `rows` parenthesized groups of `fields` placeholders each,
/// comma-separated, numbered from the counter's current position.
///
/// `rows == 0` yields an empty string; callers must not turn that into a
/// statement.
pub fn values_clause(placeholders: &mut Placeholders, rows: usize, fields: usize) -> String {
    let mut out = String::with_capacity(rows * (fields * 4 + 3));

    for row in 0..rows {
        if row > 0 {
            out.push(',');
        }
        out.push('(');
        for field in 0..fields {
            if field > 0 {
                out.push(',');
            }
            placeholders.push_next(&mut out);
        }
        out.push(')');
    }

    out
}

/// Multi-row `INSERT` for a fixed set of `N` columns.
///
/// Every row is an `[Value; N]`, so the number of bound values always
/// matches the number of generated placeholders.
#[derive(Debug, Clone)]
pub struct BatchInsert<const N: usize> {
    table: &'static str,
    columns: [&'static str; N],
    rows: Vec<[Value; N]>,
    returning: Option<&'static str>,
}

impl<const N: usize> BatchInsert<N> {
    pub fn new(table: &'static str, columns: [&'static str; N]) -> Self {
        Self {
            table,
            columns,
            rows: Vec::new(),
            returning: None,
        }
    }

    /// Append a `RETURNING <column>` clause after the values.
    pub fn returning(mut self, column: &'static str) -> Self {
        self.returning = Some(column);
        self
    }

    pub fn push(&mut self, row: [Value; N]) {
        self.rows.push(row);
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render the statement, or `None` when there is nothing to insert.
    pub fn build(mut self, style: ParamStyle) -> Option<Statement> {
        if self.rows.is_empty() {
            return None;
        }

        let rows = std::mem::take(&mut self.rows);
        Some(self.render(rows, style))
    }

    /// Render one statement per run of rows so that no statement binds
    /// more than `max_params` values. Numbering restarts at 1 in each
    /// statement. An empty batch yields no statements.
    pub fn build_chunks(mut self, style: ParamStyle, max_params: usize) -> Vec<Statement> {
        let rows_per_statement = (max_params / N.max(1)).max(1);
        let mut rows = std::mem::take(&mut self.rows).into_iter();
        let mut statements = Vec::new();

        loop {
            let chunk: Vec<[Value; N]> = rows.by_ref().take(rows_per_statement).collect();
            if chunk.is_empty() {
                break;
            }
            statements.push(self.render(chunk, style));
        }

        statements
    }

    fn render(&self, rows: Vec<[Value; N]>, style: ParamStyle) -> Statement {
        let mut placeholders = Placeholders::new(style);
        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ",
            self.table,
            self.columns.join(", ")
        );
        sql.push_str(&values_clause(&mut placeholders, rows.len(), N));
        if let Some(column) = self.returning {
            sql.push_str(" RETURNING ");
            sql.push_str(column);
        }

        let params: Vec<Value> = rows.into_iter().flatten().collect();
        debug_assert_eq!(placeholders.issued(), params.len());

        Statement::new(sql, params)
    }
}

impl<const N: usize> Extend<[Value; N]> for BatchInsert<N> {
    fn extend<I: IntoIterator<Item = [Value; N]>>(&mut self, rows: I) {
        self.rows.extend(rows);
    }
}
