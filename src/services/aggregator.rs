use crate::models::{Cell, Table};
use serde::Serialize;
use std::collections::HashMap;

pub const CATEGORY_COLUMN: &str = "category";
pub const SALES_COLUMN: &str = "sales";
pub const COLUMNS_NOT_FOUND: &str = "Required columns are not found";

/// Fill policy for absent cells: every `Missing` becomes integer `0`,
/// whatever the column holds otherwise. No type-aware imputation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZeroFillPolicy;

impl ZeroFillPolicy {
    pub fn apply(&self, mut table: Table) -> Table {
        table.map_cells(|cell| {
            if cell.is_missing() {
                *cell = Cell::Int(0);
            }
        });
        table
    }
}

pub fn fill_missing(table: Table) -> Table {
    ZeroFillPolicy.apply(table)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: Cell,
    pub sales: Cell,
}

/// Outcome of [`aggregate`]: either the full grouping or the fallback
/// message, never a mix of both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AggregationResult {
    SalesByCategory {
        sales_by_category: Vec<CategoryTotal>,
    },
    ColumnsNotFound {
        message: String,
    },
}

impl AggregationResult {
    pub fn columns_not_found() -> Self {
        AggregationResult::ColumnsNotFound {
            message: COLUMNS_NOT_FOUND.to_string(),
        }
    }

    pub fn records(&self) -> Option<&[CategoryTotal]> {
        match self {
            AggregationResult::SalesByCategory { sales_by_category } => Some(sales_by_category),
            AggregationResult::ColumnsNotFound { .. } => None,
        }
    }
}

/// Running per-group sum. Stays integral until a float shows up or the
/// integer sum overflows.
#[derive(Debug, Clone, Copy)]
enum Total {
    Int(i64),
    Float(f64),
}

impl Total {
    fn add(self, cell: &Cell) -> Self {
        match (self, cell) {
            (Total::Int(acc), Cell::Int(v)) => acc
                .checked_add(*v)
                .map_or(Total::Float(acc as f64 + *v as f64), Total::Int),
            (Total::Int(acc), Cell::Float(v)) => Total::Float(acc as f64 + v),
            (Total::Float(acc), Cell::Int(v)) => Total::Float(acc + *v as f64),
            (Total::Float(acc), Cell::Float(v)) => Total::Float(acc + v),
            (total, _) => total,
        }
    }

    fn into_cell(self) -> Cell {
        match self {
            Total::Int(v) => Cell::Int(v),
            Total::Float(v) => Cell::Float(v),
        }
    }
}

/// Sums `sales` per distinct `category`, groups in first-seen order.
pub fn aggregate(table: &Table) -> AggregationResult {
    let (Some(categories), Some(sales)) =
        (table.column(CATEGORY_COLUMN), table.column(SALES_COLUMN))
    else {
        return AggregationResult::columns_not_found();
    };

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(Cell, Total)> = Vec::new();

    for (category, amount) in categories.iter().zip(sales) {
        let slot = *index.entry(category.group_key()).or_insert_with(|| {
            groups.push((category.clone(), Total::Int(0)));
            groups.len() - 1
        });
        groups[slot].1 = groups[slot].1.add(amount);
    }

    AggregationResult::SalesByCategory {
        sales_by_category: groups
            .into_iter()
            .map(|(category, total)| CategoryTotal {
                category,
                sales: total.into_cell(),
            })
            .collect(),
    }
}

/// Fill then aggregate.
pub fn process(table: Table) -> AggregationResult {
    aggregate(&fill_missing(table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Column;

    fn text(v: &str) -> Cell {
        Cell::Text(v.to_string())
    }

    fn sales_table(rows: &[(Cell, Cell)]) -> Table {
        Table::from_rows(
            vec![CATEGORY_COLUMN.to_string(), SALES_COLUMN.to_string()],
            rows.iter()
                .map(|(c, s)| vec![c.clone(), s.clone()])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_groups_in_first_seen_order() {
        let table = sales_table(&[
            (text("A"), Cell::Int(10)),
            (text("B"), Cell::Int(5)),
            (text("A"), Cell::Int(3)),
        ]);

        assert_eq!(
            process(table),
            AggregationResult::SalesByCategory {
                sales_by_category: vec![
                    CategoryTotal {
                        category: text("A"),
                        sales: Cell::Int(13)
                    },
                    CategoryTotal {
                        category: text("B"),
                        sales: Cell::Int(5)
                    },
                ]
            }
        );
    }

    #[test]
    fn test_first_seen_order_is_not_sorted() {
        let table = sales_table(&[
            (text("zeta"), Cell::Int(1)),
            (text("alpha"), Cell::Int(2)),
        ]);
        let result = process(table);
        let categories: Vec<_> = result
            .records()
            .unwrap()
            .iter()
            .map(|r| r.category.clone())
            .collect();
        assert_eq!(categories, vec![text("zeta"), text("alpha")]);
    }

    #[test]
    fn test_serialized_shape() {
        let table = sales_table(&[
            (text("A"), Cell::Int(10)),
            (text("B"), Cell::Int(5)),
            (text("A"), Cell::Int(3)),
        ]);
        assert_eq!(
            serde_json::to_value(process(table)).unwrap(),
            serde_json::json!({
                "sales_by_category": [
                    {"category": "A", "sales": 13},
                    {"category": "B", "sales": 5}
                ]
            })
        );
    }

    #[test]
    fn test_missing_columns_fall_back() {
        for names in [["category", "amount"], ["kind", "sales"]] {
            let table = Table::from_rows(
                names.iter().map(|n| n.to_string()).collect(),
                vec![vec![text("A"), Cell::Int(1)]],
            )
            .unwrap();
            let result = process(table);
            assert_eq!(result, AggregationResult::columns_not_found());
            assert!(result.records().is_none());
            assert_eq!(
                serde_json::to_value(&result).unwrap(),
                serde_json::json!({"message": "Required columns are not found"})
            );
        }
    }

    #[test]
    fn test_non_numeric_and_missing_sales_count_as_zero() {
        let table = sales_table(&[
            (text("A"), Cell::Missing),
            (text("A"), text("n/a-ish")),
            (text("A"), Cell::Bool(true)),
            (text("A"), Cell::Int(4)),
        ]);
        let result = process(table);
        assert_eq!(result.records().unwrap()[0].sales, Cell::Int(4));
    }

    #[test]
    fn test_float_sales_promote_total() {
        let table = sales_table(&[
            (text("A"), Cell::Int(1)),
            (text("A"), Cell::Float(0.5)),
        ]);
        let result = process(table);
        assert_eq!(result.records().unwrap()[0].sales, Cell::Float(1.5));
    }

    #[test]
    fn test_integer_overflow_promotes_to_float() {
        let table = sales_table(&[
            (text("A"), Cell::Int(i64::MAX)),
            (text("A"), Cell::Int(1)),
        ]);
        let result = process(table);
        assert!(matches!(result.records().unwrap()[0].sales, Cell::Float(_)));
    }

    #[test]
    fn test_missing_category_groups_under_zero() {
        let table = sales_table(&[
            (Cell::Missing, Cell::Int(2)),
            (Cell::Int(0), Cell::Int(3)),
        ]);
        let records = process(table);
        let records = records.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].category, Cell::Int(0));
        assert_eq!(records[0].sales, Cell::Int(5));
    }

    #[test]
    fn test_zero_fill_is_type_agnostic_and_idempotent() {
        let table = Table::new(vec![
            Column {
                name: "name".to_string(),
                cells: vec![text("x"), Cell::Missing],
            },
            Column {
                name: "price".to_string(),
                cells: vec![Cell::Missing, Cell::Float(1.5)],
            },
        ])
        .unwrap();

        let once = fill_missing(table);
        assert_eq!(once.column("name").unwrap(), &[text("x"), Cell::Int(0)]);
        assert_eq!(once.column("price").unwrap(), &[Cell::Int(0), Cell::Float(1.5)]);
        assert!(
            once.columns()
                .iter()
                .all(|c| c.cells.iter().all(|cell| !cell.is_missing()))
        );

        let twice = ZeroFillPolicy.apply(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_table_with_columns_has_no_groups() {
        let table = sales_table(&[]);
        assert_eq!(
            process(table),
            AggregationResult::SalesByCategory {
                sales_by_category: Vec::new()
            }
        );
    }
}
