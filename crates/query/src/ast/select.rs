//! The AST for a SELECT query, the only statement kind this library builds.

use crate::ast::expr::Expr;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Select {
    /// The columns or expressions to be returned, e.g. `id`, `name`.
    pub columns: Vec<Expr>,

    /// The primary table, e.g. `FROM users`.
    pub from: Option<FromClause>,

    /// The WHERE clause condition.
    pub where_clause: Option<Expr>,

    /// The ORDER BY clause.
    pub order_by: Vec<OrderByExpr>,

    /// The LIMIT clause.
    pub limit: Option<usize>,

    /// The OFFSET clause.
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub schema: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FromClause {
    pub table: TableRef,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDir {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByExpr {
    pub expr: Expr,
    pub direction: Option<OrderDir>,
}

pub struct SelectBuilder {
    ast: Select,
}

impl SelectBuilder {
    pub fn new() -> Self {
        SelectBuilder {
            ast: Select::default(),
        }
    }

    pub fn select(mut self, columns: Vec<Expr>) -> Self {
        self.ast.columns = columns;
        self
    }

    pub fn from(mut self, table: &str, alias: Option<&str>) -> Self {
        self.ast.from = Some(FromClause {
            table: TableRef {
                schema: None,
                name: table.to_string(),
            },
            alias: alias.map(|a| a.to_string()),
        });
        self
    }

    pub fn filter(mut self, predicate: Expr) -> Self {
        // Stack repeated filters with AND
        self.ast.where_clause = Some(match self.ast.where_clause {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    pub fn order_by(mut self, expr: Expr, direction: Option<OrderDir>) -> Self {
        self.ast.order_by.push(OrderByExpr { expr, direction });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.ast.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.ast.offset = Some(offset);
        self
    }

    pub fn build(self) -> Select {
        self.ast
    }
}

impl Default for SelectBuilder {
    fn default() -> Self {
        Self::new()
    }
}
