use regex::Regex;

use crate::error::OptlibError;

/// A rectangular table of optional text cells with named columns.
///
/// Missing cells are `None`, mirroring the empty cells of the upstream HTML
/// listings and of the persisted catalog CSV.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Parses the first `<table>` element of an HTML page. Its first row
    /// supplies the column names. Closing `</tr>`, `</td>` and `</th>` tags
    /// may be omitted; a row or cell then ends where the next one starts.
    pub fn from_html(html: &str) -> Result<Self, OptlibError> {
        let table_re = build_regex(r"(?is)<table\b[^>]*>(.*?)</table\s*>")?;
        let row_open_re = build_regex(r"(?i)<tr\b[^>]*>")?;
        let row_close_re = build_regex(r"(?i)</tr\s*>")?;
        let cell_open_re = build_regex(r"(?i)<t[dh]\b[^>]*>")?;
        let cell_close_re = build_regex(r"(?i)</t[dh]\s*>")?;
        let tag_re = build_regex(r"(?s)<[^>]*>")?;

        let body = table_re
            .captures(html)
            .and_then(|caps| caps.get(1))
            .ok_or_else(|| OptlibError::TableNotFound("html document".to_string()))?
            .as_str();

        let mut header: Option<Vec<String>> = None;
        let mut rows = Vec::new();
        for row in segments(&row_open_re, body) {
            let row = truncate_at(&row_close_re, row);
            let cells = segments(&cell_open_re, row)
                .map(|cell| cell_text(&tag_re, truncate_at(&cell_close_re, cell)))
                .collect::<Vec<_>>();
            if cells.is_empty() {
                continue;
            }
            if header.is_none() {
                header = Some(
                    cells
                        .into_iter()
                        .enumerate()
                        .map(|(idx, cell)| cell.unwrap_or_else(|| format!("Unnamed: {idx}")))
                        .collect(),
                );
                continue;
            }
            rows.push(cells);
        }

        let columns =
            header.ok_or_else(|| OptlibError::TableNotFound("empty table".to_string()))?;
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut cells| {
                cells.resize(width, None);
                cells
            })
            .collect();
        Ok(Self { columns, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    fn require_column(&self, name: &str) -> Result<usize, OptlibError> {
        self.column_index(name)
            .ok_or_else(|| OptlibError::CatalogParse(format!("missing column {name}")))
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }

    /// Renames `from` to `to`; absent columns are left alone.
    pub fn rename_column(&mut self, from: &str, to: &str) {
        if let Some(idx) = self.column_index(from) {
            self.columns[idx] = to.to_string();
        }
    }

    /// Renames the leading columns in order. Columns past `names` keep
    /// their names; a table narrower than `names` only renames what it has.
    pub fn rename_positional(&mut self, names: &[&str]) {
        for (column, name) in self.columns.iter_mut().zip(names) {
            *column = (*name).to_string();
        }
    }

    pub fn fill_missing(&mut self, column: &str, value: &str) -> Result<(), OptlibError> {
        let idx = self.require_column(column)?;
        for row in &mut self.rows {
            if row[idx].is_none() {
                row[idx] = Some(value.to_string());
            }
        }
        Ok(())
    }

    pub fn replace_values(
        &mut self,
        column: &str,
        replacements: &[(&str, &str)],
    ) -> Result<(), OptlibError> {
        let idx = self.require_column(column)?;
        for row in &mut self.rows {
            if let Some(value) = row[idx].as_mut() {
                if let Some((_, to)) = replacements.iter().find(|(from, _)| *from == value.as_str()) {
                    *value = (*to).to_string();
                }
            }
        }
        Ok(())
    }

    /// Adds `column`, or overwrites it when it already exists.
    pub fn set_column(
        &mut self,
        column: &str,
        values: Vec<Option<String>>,
    ) -> Result<(), OptlibError> {
        if values.len() != self.rows.len() {
            return Err(OptlibError::CatalogParse(format!(
                "column {column} has {} values for {} rows",
                values.len(),
                self.rows.len()
            )));
        }
        match self.column_index(column) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(column.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }

    pub fn column_values(&self, column: &str) -> Result<Vec<Option<String>>, OptlibError> {
        let idx = self.require_column(column)?;
        Ok(self.rows.iter().map(|row| row[idx].clone()).collect())
    }

    pub fn drop_last_row(&mut self) {
        self.rows.pop();
    }

    /// Sets `column` on every row whose `key_column` equals `key`.
    /// Returns how many rows were updated.
    pub fn set_where(
        &mut self,
        key_column: &str,
        key: &str,
        column: &str,
        value: &str,
    ) -> Result<usize, OptlibError> {
        let key_idx = self.require_column(key_column)?;
        let idx = self.require_column(column)?;
        let mut updated = 0;
        for row in &mut self.rows {
            if row[key_idx].as_deref() == Some(key) {
                row[idx] = Some(value.to_string());
                updated += 1;
            }
        }
        Ok(updated)
    }
}

fn build_regex(pattern: &str) -> Result<Regex, OptlibError> {
    Regex::new(pattern).map_err(|err| OptlibError::CatalogParse(err.to_string()))
}

/// The text following each match of `open`, up to the next match.
fn segments<'a>(open: &'a Regex, text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    let starts = open.find_iter(text).collect::<Vec<_>>();
    let ends = starts
        .iter()
        .skip(1)
        .map(|next| next.start())
        .chain(std::iter::once(text.len()))
        .collect::<Vec<_>>();
    starts
        .into_iter()
        .zip(ends)
        .map(move |(start, end)| &text[start.end()..end])
}

fn truncate_at<'a>(close: &Regex, text: &'a str) -> &'a str {
    match close.find(text) {
        Some(found) => &text[..found.start()],
        None => text,
    }
}

fn cell_text(tag_re: &Regex, raw: &str) -> Option<String> {
    let without_tags = tag_re.replace_all(raw, " ");
    let decoded = decode_entities(&without_tags);
    let collapsed = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let decoded = tail
            .find(';')
            .filter(|end| *end <= 10)
            .and_then(|end| decode_entity(&tail[1..end]).map(|ch| (ch, end)));
        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        "check" => Some('\u{2713}'),
        _ => {
            let numeric = entity.strip_prefix('#')?;
            let code = match numeric.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => numeric.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
        <table class="listing">
          <thead><tr><th>Instance</th><th>Status</th><th>Objective</th></tr></thead>
          <tbody>
            <tr><td><a href="x">air05</a></td><td>easy</td><td>26374</td></tr>
            <tr><td>neos&#45;1</td><td>open</td><td></td></tr>
          </tbody>
        </table>
        <table><tr><th>Other</th></tr></table>
        </body></html>
    "#;

    #[test]
    fn reads_first_table_only() {
        let table = Table::from_html(PAGE).unwrap();
        assert_eq!(table.columns, vec!["Instance", "Status", "Objective"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0, "Instance"), Some("air05"));
        assert_eq!(table.get(1, "Instance"), Some("neos-1"));
        assert_eq!(table.get(1, "Objective"), None);
    }

    #[test]
    fn closing_tags_may_be_omitted() {
        let html = "<table><tr><th>Instance<th>Status</tr>\
                    <tr><td>air05<td>easy</tr>\
                    <tr><td><b>neos-1</b><td>open\
                    <tr><td>rmine25</table>";
        let table = Table::from_html(html).unwrap();
        assert_eq!(table.columns, vec!["Instance", "Status"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(0, "Status"), Some("easy"));
        assert_eq!(table.get(1, "Instance"), Some("neos-1"));
        assert_eq!(table.get(1, "Status"), Some("open"));
        assert_eq!(table.get(2, "Instance"), Some("rmine25"));
        assert_eq!(table.get(2, "Status"), None);
    }

    #[test]
    fn missing_table_is_an_error() {
        assert!(Table::from_html("<p>nothing here</p>").is_err());
    }

    #[test]
    fn decodes_check_marks() {
        assert_eq!(decode_entities("&#10004; &amp; &#x2714;"), "\u{2714} & \u{2714}");
        assert_eq!(decode_entities("a & b"), "a & b");
    }

    #[test]
    fn column_operations() {
        let mut table = Table::from_html(PAGE).unwrap();
        table.rename_column("Objective", "Primal");
        table.fill_missing("Primal", "0").unwrap();
        table.replace_values("Status", &[("open", "unsolved")]).unwrap();
        assert_eq!(table.get(1, "Primal"), Some("0"));
        assert_eq!(table.get(1, "Status"), Some("unsolved"));

        let updated = table.set_where("Instance", "air05", "Primal", "1").unwrap();
        assert_eq!(updated, 1);
        assert_eq!(table.get(0, "Primal"), Some("1"));

        table
            .set_column("Extra", vec![Some("a".to_string()), None])
            .unwrap();
        assert_eq!(table.columns.len(), 4);
        table.drop_last_row();
        assert_eq!(table.len(), 1);
    }
}
