use crate::diagnostics::Spanned;
use crate::pp;
use crate::syntax::ast;

fn idents(printer: &mut pp::Printer, idents: &[Spanned<ast::Ident>]) {
    for ident in idents.iter() {
        printer.write(" ").write(ident);
    }
}

impl pp::PrettyPrintable for ast::Expr {
    fn pp(&self, printer: &mut pp::Printer) {
        match self {
            ast::Expr::New { tag, fields } => {
                printer.write("(new ").write(tag);
                idents(printer, fields);
            }
            ast::Expr::Proj { field, record } => {
                printer
                    .write("(proj ")
                    .write(field)
                    .write(" ")
                    .write(record);
            }
            ast::Expr::Pap { target, args } => {
                printer.write("(pap ").write(target);
                idents(printer, args);
            }
            ast::Expr::App { target, args } => {
                printer.write("(").write(target);
                idents(printer, args);
            }
            ast::Expr::Reset(var) => {
                printer.write("(reset ").write(var);
            }
            ast::Expr::Reuse { token, tag, fields } => {
                printer.write("(reuse ").write(token).write(" ").write(tag);
                idents(printer, fields);
            }
        }
        printer.write(")");
    }
}

impl pp::PrettyPrintable for ast::Body {
    fn pp(&self, printer: &mut pp::Printer) {
        match self {
            ast::Body::Ret(var) => {
                printer.write("(ret ").write(var).write(")");
            }
            ast::Body::Let { bindings, body } => {
                printer.write("(let (").spaced(bindings.iter(), |printer, (binder, expr)| {
                    printer.write(binder).write(" ").pp(&**expr);
                });
                printer.write(")").indent().pp(&***body).write(")").dedent();
            }
            ast::Body::Case { scrutinee, arms } => {
                printer.write("(case ").write(scrutinee).indent();
                for (i, (tag, body)) in arms.iter().enumerate() {
                    if i > 0 {
                        printer.newline();
                    }
                    printer.write(tag).indent().pp(&**body).dedent();
                }
                printer.write(")").dedent();
            }
            ast::Body::Inc { var, body } => {
                printer
                    .write("(inc ")
                    .write(var)
                    .indent()
                    .pp(&***body)
                    .write(")")
                    .dedent();
            }
            ast::Body::Dec { var, body } => {
                printer
                    .write("(dec ")
                    .write(var)
                    .indent()
                    .pp(&***body)
                    .write(")")
                    .dedent();
            }
        }
    }
}

impl pp::PrettyPrintable for ast::Item {
    fn pp(&self, printer: &mut pp::Printer) {
        match self {
            ast::Item::Type(decl) => {
                printer.write("(deftype ").write(&decl.tag);
                idents(printer, &decl.fields);
                printer.write(")");
            }
            ast::Item::Fn(decl) => {
                printer
                    .write("(defn ")
                    .write(&decl.name)
                    .write(" (")
                    .spaced(decl.params.iter(), |printer, param| {
                        printer.write(param);
                    })
                    .write(")")
                    .indent()
                    .pp(&*decl.body)
                    .write(")")
                    .dedent();
            }
        }
    }
}

impl pp::PrettyPrintable for ast::Ast {
    fn pp(&self, printer: &mut pp::Printer) {
        for item in self.items.iter() {
            printer.pp(&**item).newline().newline();
        }
    }
}
