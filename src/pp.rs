#[derive(Default)]
pub struct Printer {
    waiting_spaces: usize,
    indent: usize,
    out: String,
}

impl Printer {
    pub fn new() -> Printer {
        Printer::default()
    }

    fn flush_spaces(&mut self) {
        for _ in 0..self.waiting_spaces {
            self.out += "    ";
        }
        self.waiting_spaces = 0;
    }

    #[inline]
    pub fn newline(&mut self) -> &mut Printer {
        self.out += "\n";
        self.waiting_spaces = self.indent;
        self
    }

    #[inline]
    pub fn write(&mut self, line: &str) -> &mut Printer {
        self.flush_spaces();
        self.out += line;
        self
    }

    #[inline]
    pub fn writeln(&mut self, line: &str) -> &mut Printer {
        self.write(line).newline()
    }

    /// Moves onto a fresh line one level deeper.
    #[inline]
    pub fn indent(&mut self) -> &mut Printer {
        self.indent = self.indent.saturating_add(1);
        if self.waiting_spaces == 0 {
            self.newline()
        } else {
            self.waiting_spaces = self.indent;
            self
        }
    }

    /// Steps back out a level without breaking the current line, so closing parentheses can
    /// trail the form they close.
    #[inline]
    pub fn dedent(&mut self) -> &mut Printer {
        self.indent = self.indent.saturating_sub(1);
        self
    }

    /// Writes each element through `f`, separated by single spaces.
    pub fn spaced<T>(
        &mut self,
        elems: impl IntoIterator<Item = T>,
        f: impl Fn(&mut Printer, T),
    ) -> &mut Printer {
        for (i, elem) in elems.into_iter().enumerate() {
            if i > 0 {
                self.write(" ");
            }
            f(self, elem);
        }
        self
    }

    #[inline]
    pub fn pp<T: PrettyPrintable + ?Sized>(&mut self, t: &T) -> &mut Printer {
        t.pp(self);
        self
    }

    #[inline]
    pub fn finish(self) -> String {
        self.out
    }

    #[inline]
    pub fn log(self) {
        print!("{}", self.out)
    }
}

pub trait PrettyPrintable {
    fn pp(&self, printer: &mut Printer);
}

pub fn render<T: PrettyPrintable + ?Sized>(t: &T) -> String {
    let mut printer = Printer::new();
    printer.pp(t);
    printer.finish()
}

#[macro_export]
macro_rules! pp {
    ( $expr:expr ) => {{
        let mut printer = $crate::pp::Printer::new();
        printer.pp($expr);
        printer.log();
    }};
}
