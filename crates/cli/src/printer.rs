use starbase_styles::color::{self, OwoStyle};
use std::io::{self, Write};

enum Row {
    Field(String, String),
    Item(String),
}

/// A titled block of `key: value` fields and bulleted items.
pub struct Section {
    title: String,
    rows: Vec<Row>,
}

impl Section {
    pub fn field(&mut self, key: impl AsRef<str>, value: impl AsRef<str>) {
        self.rows.push(Row::Field(
            key.as_ref().to_owned(),
            value.as_ref().to_owned(),
        ));
    }

    pub fn items<I: IntoIterator<Item = V>, V: AsRef<str>>(&mut self, items: I) {
        self.rows
            .extend(items.into_iter().map(|item| Row::Item(item.as_ref().to_owned())));
    }

    fn render(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out)?;
        writeln!(
            out,
            "{}",
            OwoStyle::new().bold().style(color::muted_light(&self.title))
        )?;

        for row in &self.rows {
            match row {
                Row::Field(key, value) => writeln!(out, "  {key}: {value}")?,
                Row::Item(item) => writeln!(out, "  {} {item}", color::muted("-"))?,
            };
        }

        Ok(())
    }
}

/// Collects sections for `info` and `list` and writes them to stdout in
/// one go.
#[derive(Default)]
pub struct Printer {
    sections: Vec<Section>,
}

impl Printer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(&mut self, title: impl AsRef<str>, build: impl FnOnce(&mut Section)) {
        let mut section = Section {
            title: title.as_ref().to_owned(),
            rows: vec![],
        };

        build(&mut section);

        self.sections.push(section);
    }

    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        for section in &self.sections {
            section.render(out)?;
        }

        writeln!(out)
    }

    /// Write errors are ignored, the same as a closed pipe.
    pub fn print(&self) {
        let mut stdout = io::BufWriter::new(io::stdout().lock());

        let _ = self.render(&mut stdout).and_then(|_| stdout.flush());
    }
}
