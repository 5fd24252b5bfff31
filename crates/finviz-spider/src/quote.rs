//! Extraction of the quote page's snapshot grid into an attribute map.

use crate::error::Error;
use scraper::{ElementRef, Html, Selector};
use serde::ser::{Serialize, SerializeMap, Serializer};

// Layout contract with the external page (finviz quote page, current version):
// the snapshot grid is a `table.snapshot-table2` whose rows carry 6 label/value
// column pairs, labels sitting in even columns 0,2,4,6,8,10. A change to the
// page invalidates these constants and must surface as `Error::Extraction`.
pub const SNAPSHOT_COLUMN_PAIRS: usize = 6;
const SNAPSHOT_TABLE: &str = "table.snapshot-table2";

/// Attribute map extracted from one quote page.
///
/// Keys keep document order (first-seen position) and duplicates overwrite in
/// place, mirroring how the source grid is read top-to-bottom.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeMap(Vec<(String, String)>);

impl AttributeMap {
    /// Insert with last-write-wins semantics; a duplicate key keeps its
    /// original position but takes the new value.
    pub fn insert(&mut self, key: String, value: String) {
        match self.0.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, existing_value)) => *existing_value = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    /// Iterate entries in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for AttributeMap {
    // serialized as a JSON object, preserving document order
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Parse the snapshot grid out of a quote document.
///
/// Each row is read pair-by-pair: the label cell's text nodes are zipped with
/// the value cell's text nodes and recorded as entries, values trimmed. Rows
/// shorter than the full 12 cells contribute what they have. A document with
/// no snapshot table at all fails with [`Error::Extraction`] — no attributes
/// can be produced, so this propagates rather than degrading.
pub fn extract_attributes(doc: &Html) -> Result<AttributeMap, Error> {
    let table_selector = Selector::parse(SNAPSHOT_TABLE).expect("snapshot table selector");
    let row_selector = Selector::parse("tr").expect("row selector");
    let cell_selector = Selector::parse("td").expect("cell selector");

    let table = doc.select(&table_selector).next().ok_or_else(|| Error::Extraction {
        reason: format!("no `{SNAPSHOT_TABLE}` in document"),
    })?;

    let mut attributes = AttributeMap::default();
    for row in table.select(&row_selector) {
        let cells: Vec<ElementRef> = row.select(&cell_selector).collect();
        for pair in 0..SNAPSHOT_COLUMN_PAIRS {
            let label_column = pair * 2;
            let (Some(label_cell), Some(value_cell)) =
                (cells.get(label_column), cells.get(label_column + 1))
            else {
                break;
            };
            for (label, value) in label_cell.text().zip(value_cell.text()) {
                attributes.insert(label.to_string(), value.trim().to_string());
            }
        }
    }

    Ok(attributes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_doc(rows: &str) -> Html {
        Html::parse_document(&format!(
            "<html><body><table class=\"snapshot-table2\">{rows}</table></body></html>"
        ))
    }

    #[test]
    fn reads_label_value_pairs_in_document_order() {
        let doc = snapshot_doc(
            "<tr><td>Index</td><td>DJIA S&amp;P500</td>\
             <td>P/E</td><td>33.95</td>\
             <td>EPS (ttm)</td><td>11.61</td>\
             <td>Insider Own</td><td>0.06%</td>\
             <td>Shs Outstand</td><td>7.43B</td>\
             <td>Perf Week</td><td>1.36%</td></tr>",
        );
        let attributes = extract_attributes(&doc).unwrap();

        assert_eq!(attributes.len(), 6);
        assert_eq!(attributes.get("P/E"), Some("33.95"));
        assert_eq!(attributes.get("Shs Outstand"), Some("7.43B"));

        let keys: Vec<&str> = attributes.iter().map(|(key, _)| key).collect();
        assert_eq!(
            keys,
            ["Index", "P/E", "EPS (ttm)", "Insider Own", "Shs Outstand", "Perf Week"]
        );
    }

    #[test]
    fn values_are_trimmed() {
        let doc = snapshot_doc("<tr><td>Price</td><td>  394.04 </td></tr>");
        let attributes = extract_attributes(&doc).unwrap();
        assert_eq!(attributes.get("Price"), Some("394.04"));
    }

    #[test]
    fn duplicate_label_overwrites_in_place() {
        let doc = snapshot_doc(
            "<tr><td>P/E</td><td>10</td><td>Beta</td><td>0.9</td></tr>\
             <tr><td>P/E</td><td>20</td></tr>",
        );
        let attributes = extract_attributes(&doc).unwrap();

        assert_eq!(attributes.get("P/E"), Some("20"));
        // position of the first write is kept
        let keys: Vec<&str> = attributes.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, ["P/E", "Beta"]);
    }

    #[test]
    fn short_row_contributes_what_it_has() {
        let doc = snapshot_doc("<tr><td>Price</td><td>394.04</td><td>Dangling</td></tr>");
        let attributes = extract_attributes(&doc).unwrap();
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes.get("Price"), Some("394.04"));
    }

    #[test]
    fn missing_snapshot_table_is_an_extraction_error() {
        let doc = Html::parse_document("<html><body><p>maintenance page</p></body></html>");
        let err = extract_attributes(&doc).unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
    }
}
