use crate::{
    ast::expr::{Expr, Ident},
    renderer::{Render, Renderer},
};

impl Render for Expr {
    fn render(&self, r: &mut Renderer) {
        match self {
            Expr::Identifier(ident) => render_ident(ident, r),
            Expr::Value(val) => r.add_param(val.clone()),
            Expr::BinaryOp(op) => {
                // Parenthesize so nested AND/OR trees keep their shape
                r.sql.push('(');
                op.left.render(r);
                r.sql.push(' ');
                r.sql.push_str(op.op.as_sql());
                r.sql.push(' ');
                op.right.render(r);
                r.sql.push(')');
            }
        }
    }
}

fn render_ident(ident: &Ident, r: &mut Renderer) {
    if let Some(qualifier) = &ident.qualifier {
        r.sql.push_str(&r.dialect.quote_identifier(qualifier));
        r.sql.push('.');
    }
    r.sql.push_str(&r.dialect.quote_identifier(&ident.name));
}
