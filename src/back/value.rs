use crate::back::{Heap, HeapValue, Location, MissingLocation};
use crate::middle::ir::{CtorName, FieldName, FnName, Program};
use crate::pp::Printer;

/// An owned copy of everything reachable from one location, with the locations themselves
/// forgotten. Two runs that build the same structure in different cells produce equal values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Ctor {
        tag: CtorName,
        fields: Vec<(FieldName, Value)>,
    },
    Pap {
        target: FnName,
        args: Vec<Value>,
    },
}

impl Value {
    pub fn ctor(tag: &str, fields: Vec<(&str, Value)>) -> Value {
        Value::Ctor {
            tag: CtorName::synthetic(tag),
            fields: fields
                .into_iter()
                .map(|(field, value)| (FieldName::synthetic(field), value))
                .collect(),
        }
    }

    fn pp(&self, program: &Program, printer: &mut Printer) {
        match self {
            Value::Ctor { tag, fields } if fields.is_empty() => {
                printer.write(tag.as_str());
            }
            Value::Ctor { tag, fields } => {
                printer.write("(").write(tag.as_str());
                for (_, value) in fields.iter() {
                    printer.write(" ");
                    value.pp(program, printer);
                }
                printer.write(")");
            }
            Value::Pap { target, args } => {
                let arity = program
                    .lookup_fn(target)
                    .map(|def| def.params.len().to_string())
                    .unwrap_or_else(|| "?".to_string());
                printer.write(&format!("<pap {} {}/{}>", target, args.len(), arity));
            }
        }
    }

    /// `Tag` for a constructor without fields, `(Tag child ...)` otherwise, and
    /// `<pap name supplied/arity>` for a partial application.
    pub fn render(&self, program: &Program) -> String {
        let mut printer = Printer::new();
        self.pp(program, &mut printer);
        printer.finish()
    }
}

impl Heap {
    pub fn snapshot(&self, loc: Location) -> Result<Value, MissingLocation> {
        match self.get(loc)? {
            HeapValue::Ctor(ctor) => {
                let mut fields = Vec::with_capacity(ctor.fields.len());
                for (field, child) in ctor.fields.iter() {
                    fields.push((field.clone(), self.snapshot(*child)?));
                }
                Ok(Value::Ctor {
                    tag: ctor.tag.clone(),
                    fields,
                })
            }
            HeapValue::Pap(pap) => Ok(Value::Pap {
                target: pap.target.clone(),
                args: pap
                    .args
                    .iter()
                    .map(|arg| self.snapshot(*arg))
                    .collect::<Result<_, _>>()?,
            }),
        }
    }
}
