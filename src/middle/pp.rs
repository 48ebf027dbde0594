//! Prints the IR back out in the surface syntax, so that the output of a transformation can be
//! read (and re-loaded) like any other program.

use crate::middle::ir;
use crate::pp;

fn vars(printer: &mut pp::Printer, vars: &[ir::Variable]) {
    for var in vars.iter() {
        printer.write(" ").write(var.as_str());
    }
}

impl pp::PrettyPrintable for ir::Ctor {
    fn pp(&self, printer: &mut pp::Printer) {
        printer.write(self.tag.as_str());
        vars(printer, &self.fields);
    }
}

impl pp::PrettyPrintable for ir::Expr {
    fn pp(&self, printer: &mut pp::Printer) {
        match self {
            ir::Expr::ConstAppFull { target, args } => {
                printer.write("(").write(target.as_str());
                vars(printer, args);
            }
            ir::Expr::VarPapFull { pap, args } => {
                printer.write("(").write(pap.as_str());
                vars(printer, args);
            }
            ir::Expr::ConstAppPart { target, args } => {
                printer.write("(pap ").write(target.as_str());
                vars(printer, args);
            }
            ir::Expr::VarPapPart { pap, args } => {
                printer.write("(pap ").write(pap.as_str());
                vars(printer, args);
            }
            ir::Expr::Ctor(ctor) => {
                printer.write("(new ").pp(ctor);
            }
            ir::Expr::Proj { field, record } => {
                printer
                    .write("(proj ")
                    .write(field.as_str())
                    .write(" ")
                    .write(record.as_str());
            }
            ir::Expr::Reset(var) => {
                printer.write("(reset ").write(var.as_str());
            }
            ir::Expr::Reuse { token, ctor } => {
                printer
                    .write("(reuse ")
                    .write(token.as_str())
                    .write(" ")
                    .pp(ctor);
            }
        }
        printer.write(")");
    }
}

impl pp::PrettyPrintable for ir::FnBody {
    fn pp(&self, printer: &mut pp::Printer) {
        match self {
            ir::FnBody::Ret(var) => {
                printer.write("(ret ").write(var.as_str()).write(")");
            }
            ir::FnBody::Let { .. } => {
                // consecutive lets share one binding list
                let mut bindings = vec![];
                let mut body = self;
                while let ir::FnBody::Let {
                    binding,
                    expr,
                    body: rest,
                } = body
                {
                    bindings.push((binding, expr));
                    body = &**rest;
                }
                printer
                    .write("(let (")
                    .spaced(bindings, |printer, (binding, expr)| {
                        printer.write(binding.as_str()).write(" ").pp(expr);
                    })
                    .write(")")
                    .indent()
                    .pp(body)
                    .write(")")
                    .dedent();
            }
            ir::FnBody::Case { scrutinee, arms } => {
                printer.write("(case ").write(scrutinee.as_str()).indent();
                for (i, (tag, body)) in arms.iter().enumerate() {
                    if i > 0 {
                        printer.newline();
                    }
                    printer.write(tag.as_str()).indent().pp(body).dedent();
                }
                printer.write(")").dedent();
            }
            ir::FnBody::Inc { var, body } => {
                printer
                    .write("(inc ")
                    .write(var.as_str())
                    .indent()
                    .pp(&**body)
                    .write(")")
                    .dedent();
            }
            ir::FnBody::Dec { var, body } => {
                printer
                    .write("(dec ")
                    .write(var.as_str())
                    .indent()
                    .pp(&**body)
                    .write(")")
                    .dedent();
            }
        }
    }
}

impl pp::PrettyPrintable for ir::TypeDef {
    fn pp(&self, printer: &mut pp::Printer) {
        printer.write("(deftype ").write(self.tag.as_str());
        for field in self.fields.iter() {
            printer.write(" ").write(field.as_str());
        }
        printer.write(")");
    }
}

impl pp::PrettyPrintable for ir::FnDef {
    fn pp(&self, printer: &mut pp::Printer) {
        printer
            .write("(defn ")
            .write(self.name.as_str())
            .write(" (")
            .spaced(self.params.iter(), |printer, param| {
                printer.write(param.as_str());
            })
            .write(")")
            .indent()
            .pp(&self.body)
            .write(")")
            .dedent();
    }
}

impl pp::PrettyPrintable for ir::Program {
    fn pp(&self, printer: &mut pp::Printer) {
        for def in self.types() {
            printer.pp(def).newline();
        }
        for def in self.fns() {
            printer.newline().pp(def).newline();
        }
    }
}
