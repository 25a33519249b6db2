//! Table rendering utilities for CLI outputs.
//!
//! Column widths follow the widest visible cell; ANSI color sequences in
//! cells do not count towards the width.

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

fn visible_width(cell: &str) -> usize {
    let mut width = 0;
    let mut in_escape = false;
    for c in cell.chars() {
        match (in_escape, c) {
            (false, '\x1b') => in_escape = true,
            (true, 'm') => in_escape = false,
            (true, _) => {}
            (false, _) => width += 1,
        }
    }
    width
}

impl Table {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Missing cells render empty, extra cells are ignored.
    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let widths: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                self.rows
                    .iter()
                    .filter_map(|r| r.get(i))
                    .map(|c| visible_width(c))
                    .chain(std::iter::once(h.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        render_line(&mut out, &widths, &self.headers);
        for row in &self.rows {
            render_line(&mut out, &widths, row);
        }

        out
    }
}

fn render_line(out: &mut String, widths: &[usize], cells: &[String]) {
    let line: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            format!("{cell}{}", " ".repeat(w.saturating_sub(visible_width(cell))))
        })
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}
