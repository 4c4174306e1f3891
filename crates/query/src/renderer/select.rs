use crate::{
    ast::select::{OrderDir, Select, TableRef},
    renderer::{Render, Renderer},
};

impl Render for Select {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("SELECT ");
        if self.columns.is_empty() {
            r.sql.push('*');
        } else {
            for (i, col) in self.columns.iter().enumerate() {
                if i > 0 {
                    r.sql.push_str(", ");
                }
                col.render(r);
            }
        }

        if let Some(from) = &self.from {
            r.sql.push_str(" FROM ");
            render_table_ref(&from.table, r);
            if let Some(alias) = &from.alias {
                r.sql.push_str(" AS ");
                r.sql.push_str(&r.dialect.quote_identifier(alias));
            }
        }

        if let Some(where_clause) = &self.where_clause {
            r.sql.push_str(" WHERE ");
            where_clause.render(r);
        }

        if !self.order_by.is_empty() {
            r.sql.push_str(" ORDER BY ");
            for (i, order) in self.order_by.iter().enumerate() {
                if i > 0 {
                    r.sql.push_str(", ");
                }
                order.expr.render(r);
                match order.direction {
                    Some(OrderDir::Asc) => r.sql.push_str(" ASC"),
                    Some(OrderDir::Desc) => r.sql.push_str(" DESC"),
                    None => {}
                }
            }
        }

        if let Some(limit) = self.limit {
            r.sql.push_str(&format!(" LIMIT {limit}"));
        }

        if let Some(offset) = self.offset {
            r.sql.push_str(&format!(" OFFSET {offset}"));
        }
    }
}

fn render_table_ref(table: &TableRef, r: &mut Renderer) {
    if let Some(schema) = &table.schema {
        r.sql.push_str(&r.dialect.quote_identifier(schema));
        r.sql.push('.');
    }
    r.sql.push_str(&r.dialect.quote_identifier(&table.name));
}
