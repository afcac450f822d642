//! Bundled sample queries against the demo catalog.

use serde::Serialize;

/// Query submitted when a session starts without one.
pub const DEFAULT_QUERY: &str =
    "SELECT * FROM customers JOIN orders ON customers.id = orders.customer_id WHERE orders.total > 100;";

/// A named sample query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SampleQuery {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub query: &'static str,
}

/// All sample queries.
pub const SAMPLE_QUERIES: &[SampleQuery] = &[
    SampleQuery {
        id: "simple_select",
        name: "Simple Select",
        description: "A basic query with a filter condition",
        query: "SELECT * FROM customers WHERE country = \"USA\";",
    },
    SampleQuery {
        id: "simple_join",
        name: "Simple Join",
        description: "A query joining two tables with a filter",
        query: "SELECT c.name, o.order_date, o.total\n\
                FROM customers c\n\
                JOIN orders o ON c.id = o.customer_id\n\
                WHERE o.total > 100;",
    },
    SampleQuery {
        id: "multi_join",
        name: "Multiple Joins",
        description: "A query joining multiple tables with filtering and sorting",
        query: "SELECT c.name, p.name, o.quantity, o.order_date\n\
                FROM customers c\n\
                JOIN orders o ON c.id = o.customer_id\n\
                JOIN order_items oi ON o.id = oi.order_id\n\
                JOIN products p ON oi.product_id = p.id\n\
                WHERE c.country = \"Canada\"\n\
                ORDER BY o.order_date DESC;",
    },
    SampleQuery {
        id: "aggregation",
        name: "Aggregation",
        description: "A query with grouping and aggregation",
        query: "SELECT c.country, COUNT(*) as customer_count, AVG(o.total) as avg_order\n\
                FROM customers c\n\
                JOIN orders o ON c.id = o.customer_id\n\
                GROUP BY c.country\n\
                HAVING COUNT(*) > 5\n\
                ORDER BY avg_order DESC;",
    },
    SampleQuery {
        id: "subquery",
        name: "Subquery",
        description: "A query with a subquery in the WHERE clause",
        query: "SELECT name, email\n\
                FROM customers\n\
                WHERE id IN (\n  \
                SELECT DISTINCT customer_id\n  \
                FROM orders\n  \
                WHERE total > 1000\n\
                );",
    },
];

/// Look up a sample by id.
pub fn sample(id: &str) -> Option<&'static SampleQuery> {
    SAMPLE_QUERIES.iter().find(|s| s.id == id)
}
