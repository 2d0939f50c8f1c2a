use rusqlite::types::Value;

use super::{ParamStyle, Placeholders, Statement};

/// Emit `(p1, p2, ..., pN)` for `count` candidates. Zero candidates give
/// `()`, which matches nothing.
pub fn in_clause(placeholders: &mut Placeholders, count: usize) -> String {
    let mut out = String::with_capacity(count * 5 + 2);
    out.push('(');
    for i in 0..count {
        if i > 0 {
            out.push_str(", ");
        }
        placeholders.push_next(&mut out);
    }
    out.push(')');
    out
}

/// `SELECT count(*)` of candidate ids that belong to one owner.
#[derive(Debug, Clone, Copy)]
pub struct MembershipCount {
    pub table: &'static str,
    pub owner_column: &'static str,
    pub id_column: &'static str,
}

impl MembershipCount {
    /// The owner binds the first placeholder, the ids follow in the order
    /// given.
    pub fn build(&self, style: ParamStyle, owner: i64, ids: &[i64]) -> Statement {
        let mut placeholders = Placeholders::new(style);

        let mut sql = format!(
            "SELECT count(*) FROM {} WHERE {} = ",
            self.table, self.owner_column
        );
        placeholders.push_next(&mut sql);
        sql.push_str(" AND ");
        sql.push_str(self.id_column);
        sql.push_str(" IN ");
        sql.push_str(&in_clause(&mut placeholders, ids.len()));

        let mut params = Vec::with_capacity(ids.len() + 1);
        params.push(Value::from(owner));
        params.extend(ids.iter().copied().map(Value::from));

        Statement::new(sql, params)
    }

    /// Split `ids` so that no statement binds more than `max_params`
    /// values, owner included. The caller sums the counts, so `ids` must
    /// not repeat across chunks.
    pub fn build_chunks(
        &self,
        style: ParamStyle,
        owner: i64,
        ids: &[i64],
        max_params: usize,
    ) -> Vec<Statement> {
        let ids_per_statement = max_params.saturating_sub(1).max(1);
        ids.chunks(ids_per_statement)
            .map(|chunk| self.build(style, owner, chunk))
            .collect()
    }
}
