//! Aggregate consumption of a flat set of entity nodes.

use crate::coerce::{coerce, Coerced};
use crate::error::Error;
use crate::node::{EntityNode, ImportantAttributes};

/// A flat collection of nodes sharing one important-attribute set, e.g. a
/// sector's peers plus the root ticker.
#[derive(Debug)]
pub struct ComparisonSet<'a> {
    nodes: Vec<&'a EntityNode>,
}

impl<'a> ComparisonSet<'a> {
    pub fn new<I>(nodes: I) -> Self
    where
        I: IntoIterator<Item = &'a EntityNode>,
    {
        Self {
            nodes: nodes.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// One named attribute's value per node, e.g. for a distribution plot.
    /// Nodes where the attribute is missing or non-numeric are excluded, not
    /// an error.
    pub fn values_for(&self, attribute: &str) -> Vec<f64> {
        self.nodes
            .iter()
            .filter_map(|node| node.attributes().get(attribute))
            .filter_map(|raw| match coerce(raw) {
                Coerced::Numeric(value) => Some(value),
                Coerced::NonNumeric => None,
            })
            .collect()
    }

    /// Assemble the dense comparison matrix: one row per node, one column per
    /// important attribute in that set's iteration order. Gaps (the attribute
    /// did not coerce for that node) are `NaN`. Any node with an empty numeric
    /// vector fails the whole assembly with [`Error::Dimension`]: an
    /// uninitialized node was passed in, which is a caller bug.
    pub fn assemble_matrix(&self, important: &ImportantAttributes) -> Result<Matrix, Error> {
        for node in &self.nodes {
            if node.numeric_vector().is_empty() {
                return Err(Error::Dimension {
                    ticker: node.ticker().to_string(),
                });
            }
        }

        let rows = self.nodes.len();
        let cols = important.len();
        let mut data = Vec::with_capacity(rows * cols);
        for node in &self.nodes {
            for name in important.iter() {
                data.push(node.numeric_vector().get(name).unwrap_or(f64::NAN));
            }
        }

        Ok(Matrix { data, rows, cols })
    }
}

/// Row-major 2-D matrix handed to downstream numeric analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl Matrix {
    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.data[row * self.cols + col])
    }

    pub fn row(&self, row: usize) -> Option<&[f64]> {
        if row >= self.rows {
            return None;
        }
        Some(&self.data[row * self.cols..(row + 1) * self.cols])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::AttributeMap;

    fn node(ticker: &str, entries: &[(&str, &str)], important: &ImportantAttributes) -> EntityNode {
        let mut map = AttributeMap::default();
        for (key, value) in entries {
            map.insert(key.to_string(), value.to_string());
        }
        EntityNode::stub(ticker, map, important)
    }

    fn important5() -> ImportantAttributes {
        ImportantAttributes::new(["P/E", "PEG", "Beta", "Price", "ROE"])
    }

    #[test]
    fn matrix_shape_is_nodes_by_important_attributes() {
        let important = important5();
        let nodes = [
            node(
                "AAA",
                &[("P/E", "10"), ("PEG", "1.1"), ("Beta", "0.9"), ("Price", "100"), ("ROE", "12.5%")],
                &important,
            ),
            node(
                "BBB",
                &[("P/E", "20"), ("PEG", "2.2"), ("Beta", "1.1"), ("Price", "200"), ("ROE", "8.0%")],
                &important,
            ),
            node(
                "CCC",
                &[("P/E", "30"), ("PEG", "3.3"), ("Beta", "1.3"), ("Price", "300"), ("ROE", "4.5%")],
                &important,
            ),
        ];

        let set = ComparisonSet::new(&nodes);
        let matrix = set.assemble_matrix(&important).unwrap();

        assert_eq!(matrix.shape(), (3, 5));
        assert_eq!(matrix.get(0, 0), Some(10.0));
        assert_eq!(matrix.get(2, 4), Some(4.5));
        assert_eq!(matrix.row(1).unwrap(), [20.0, 2.2, 1.1, 200.0, 8.0]);
    }

    #[test]
    fn columns_follow_important_attribute_order() {
        let important = ImportantAttributes::new(["Price", "P/E"]);
        // document order is reversed relative to the important set
        let nodes = [node("AAA", &[("P/E", "10"), ("Price", "100")], &important)];

        let matrix = ComparisonSet::new(&nodes).assemble_matrix(&important).unwrap();
        assert_eq!(matrix.row(0).unwrap(), [100.0, 10.0]);
    }

    #[test]
    fn coercion_gap_becomes_nan_cell() {
        let important = ImportantAttributes::new(["P/E", "PEG"]);
        let nodes = [node("AAA", &[("P/E", "10"), ("PEG", "-")], &important)];

        let matrix = ComparisonSet::new(&nodes).assemble_matrix(&important).unwrap();
        assert_eq!(matrix.get(0, 0), Some(10.0));
        assert!(matrix.get(0, 1).unwrap().is_nan());
    }

    #[test]
    fn empty_numeric_vector_is_a_dimension_error() {
        let important = important5();
        let nodes = [
            node("AAA", &[("P/E", "10")], &important),
            node("BBB", &[("Earnings", "-")], &important),
        ];

        let err = ComparisonSet::new(&nodes)
            .assemble_matrix(&important)
            .unwrap_err();
        assert!(matches!(err, Error::Dimension { ref ticker } if ticker == "BBB"));
    }

    #[test]
    fn values_for_excludes_missing_and_non_numeric() {
        let important = important5();
        let nodes = [
            node("AAA", &[("PEG", "1.1")], &important),
            node("BBB", &[("PEG", "-")], &important),
            node("CCC", &[("P/E", "30")], &important),
            node("DDD", &[("PEG", "2.75")], &important),
        ];

        let set = ComparisonSet::new(&nodes);
        assert_eq!(set.values_for("PEG"), [1.1, 2.75]);
    }

    #[test]
    fn out_of_range_matrix_access_is_none() {
        let important = ImportantAttributes::new(["P/E"]);
        let nodes = [node("AAA", &[("P/E", "10")], &important)];
        let matrix = ComparisonSet::new(&nodes).assemble_matrix(&important).unwrap();

        assert_eq!(matrix.get(1, 0), None);
        assert_eq!(matrix.get(0, 1), None);
        assert!(matrix.row(1).is_none());
    }
}
