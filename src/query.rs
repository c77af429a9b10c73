use std::fmt;

/// Accumulates SQL clause fragments and compiles them into a single statement.
///
/// Fragments land in fixed buckets (operation, where, order, limit, literal) and are
/// always emitted in that order, whatever order the builder calls came in. Values are
/// never interpolated: `WHERE` clauses use `?` positional placeholders and inserts use
/// `:column` named placeholders. Identifiers are written verbatim, so table and column
/// names must come from trusted schema definitions.
/// ```rust
/// use simple_db::prelude::*;
///
/// let sql = Query::select("users")
///     .limit(1)
///     .where_eq(["email"])
///     .compile();
/// assert_eq!(sql, "SELECT * FROM users WHERE email = ? LIMIT 1");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    operation: Vec<String>,
    where_clauses: Vec<String>,
    order: Vec<String>,
    limit: Vec<String>,
    literal: Vec<String>,
}

impl Query {
    fn with_operation(operation: String) -> Self {
        Self {
            operation: vec![operation],
            ..Self::default()
        }
    }

    /// `SELECT * FROM <table>`.
    #[must_use]
    pub fn select(table: &str) -> Self {
        Self::select_fields(table, ["*"])
    }

    /// `SELECT <fields> FROM <table>`, fields comma-joined.
    #[must_use]
    pub fn select_fields<I, S>(table: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_operation(format!("SELECT {} FROM {table}", join(fields, ", ")))
    }

    #[must_use]
    pub fn delete(table: &str) -> Self {
        Self::with_operation(format!("DELETE FROM {table}"))
    }

    /// Named-placeholder insert. A non-empty `update` list adds MySQL's
    /// `ON DUPLICATE KEY UPDATE col = :col` for each listed column.
    #[must_use]
    pub fn insert<S, U>(table: &str, columns: &[S], update: &[U]) -> Self
    where
        S: AsRef<str>,
        U: AsRef<str>,
    {
        let mut base = insert_base(table, columns);
        if !update.is_empty() {
            base.push_str(" ON DUPLICATE KEY UPDATE ");
            base.push_str(&assignments(update));
        }
        Self::with_operation(base)
    }

    /// Named-placeholder insert with the `ON CONFLICT ... DO UPDATE SET` upsert spelling
    /// understood by SQLite and PostgreSQL. An empty `conflict` list leaves the target
    /// out, matching any uniqueness constraint.
    #[must_use]
    pub fn insert_on_conflict<S, C, U>(table: &str, columns: &[S], conflict: &[C], update: &[U]) -> Self
    where
        S: AsRef<str>,
        C: AsRef<str>,
        U: AsRef<str>,
    {
        let mut base = insert_base(table, columns);
        if !update.is_empty() {
            if conflict.is_empty() {
                base.push_str(" ON CONFLICT DO UPDATE SET ");
            } else {
                base.push_str(&format!(" ON CONFLICT({}) DO UPDATE SET ", join(conflict, ", ")));
            }
            base.push_str(&assignments(update));
        }
        Self::with_operation(base)
    }

    #[must_use]
    pub fn describe(table: &str) -> Self {
        Self::with_operation(format!("DESCRIBE {table}"))
    }

    #[must_use]
    pub fn show_tables() -> Self {
        Self::with_operation("SHOW TABLES".to_string())
    }

    /// SQLite's counterpart to `DESCRIBE`.
    #[must_use]
    pub fn table_info(table: &str) -> Self {
        Self::with_operation(format!("PRAGMA table_info({table})"))
    }

    /// Extend the operation with `INNER JOIN <table> ON <left> = <right>`.
    #[must_use]
    pub fn inner_join(mut self, table: &str, left: &str, right: &str) -> Self {
        self.operation
            .push(format!("INNER JOIN {table} ON {left} = {right}"));
        self
    }

    /// Conjunctive equality filter: `WHERE a = ?` for the first column, `AND b = ?` after.
    ///
    /// Pass the keys of a [`crate::Criteria`] map so the bound values line up with
    /// `criteria.values()`.
    #[must_use]
    pub fn where_eq<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for column in columns {
            let keyword = if self.where_clauses.is_empty() { "WHERE" } else { "AND" };
            self.where_clauses
                .push(format!("{keyword} {} = ?", column.as_ref()));
        }
        self
    }

    /// `ORDER BY <column> <DIRECTION>`.
    #[must_use]
    pub fn order(mut self, column: &str, direction: &str) -> Self {
        self.order
            .push(format!("ORDER BY {column} {}", direction.to_uppercase()));
        self
    }

    /// `ORDER BY c1 D1, c2 D2, ...` in iteration order. An empty list adds nothing.
    #[must_use]
    pub fn order_by<I, C, D>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = (C, D)>,
        C: AsRef<str>,
        D: AsRef<str>,
    {
        let terms: Vec<String> = columns
            .into_iter()
            .map(|(column, direction)| {
                format!("{} {}", column.as_ref(), direction.as_ref().to_uppercase())
            })
            .collect();
        if !terms.is_empty() {
            self.order.push(format!("ORDER BY {}", terms.join(", ")));
        }
        self
    }

    /// Row cap: `LIMIT <count>`.
    #[must_use]
    pub fn limit(mut self, count: u64) -> Self {
        self.limit.push(format!("LIMIT {count}"));
        self
    }

    /// Offset and count: `LIMIT <start>, <count>`.
    #[must_use]
    pub fn limit_range(mut self, start: u64, count: u64) -> Self {
        self.limit.push(format!("LIMIT {start}, {count}"));
        self
    }

    /// Append raw SQL after every other clause.
    #[must_use]
    pub fn literal(mut self, sql: &str) -> Self {
        self.literal.push(sql.to_string());
        self
    }

    /// Join the non-empty buckets with single spaces, collapse whitespace runs and trim.
    #[must_use]
    pub fn compile(&self) -> String {
        [
            &self.operation,
            &self.where_clauses,
            &self.order,
            &self.limit,
            &self.literal,
        ]
        .into_iter()
        .filter(|bucket| !bucket.is_empty())
        .map(|bucket| bucket.join(" "))
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.compile())
    }
}

impl From<Query> for String {
    fn from(query: Query) -> Self {
        query.compile()
    }
}

fn join<I, S>(items: I, separator: &str) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| item.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

fn insert_base<S: AsRef<str>>(table: &str, columns: &[S]) -> String {
    let placeholders = columns.iter().map(|column| format!(":{}", column.as_ref()));
    format!(
        "INSERT INTO {table} ({}) VALUES({})",
        join(columns, ", "),
        join(placeholders, ", ")
    )
}

fn assignments<S: AsRef<str>>(columns: &[S]) -> String {
    join(
        columns
            .iter()
            .map(|column| format!("{0} = :{0}", column.as_ref())),
        ", ",
    )
}
