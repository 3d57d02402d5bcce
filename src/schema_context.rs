use tracing::info;

/// Builds the static natural-language documentation of the database schema
/// that is prepended to every generation prompt. This replaces a
/// model-training step: the agent is grounded per-request instead.
///
/// `build` is pure and deterministic; callers cache the result.
pub struct SchemaContextBuilder;

impl SchemaContextBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self) -> String {
        info!("Building schema context for the generation agent");

        let mut parts: Vec<String> = Vec::new();

        parts.push("DATABASE SCHEMA DOCUMENTATION".to_string());
        parts.push("=".repeat(60));

        parts.push(
            r#"
This is an e-commerce database with three main tables:
- customers: Contains customer information including name, email, segment (SMB, Enterprise, Individual), and country
- products: Product catalog with name, category, price, stock quantity, and description
- orders: Customer orders with order date, total amount, status (Pending, Delivered, Cancelled, Processing), and shipping address

The customers table has a one-to-many relationship with orders (one customer can have many orders).

IMPORTANT NOTES:
- For order revenue/pricing, use orders.total_amount (NOT 'price')
- Customer segments: 'SMB', 'Enterprise', 'Individual' (case-sensitive)
- Order statuses: 'Pending', 'Delivered', 'Cancelled', 'Processing' (case-sensitive)
- To join customers and orders: JOIN orders ON customers.id = orders.customer_id
"#
            .to_string(),
        );

        parts.push("\nTABLE SCHEMAS:".to_string());
        parts.push("-".repeat(60));

        parts.push(
            r#"
Table: customers
Columns:
  - id (SERIAL PRIMARY KEY)
  - name (VARCHAR) - Customer full name
  - email (VARCHAR) - Customer email address
  - segment (VARCHAR) - One of: 'SMB', 'Enterprise', 'Individual'
  - country (VARCHAR) - Customer country
  - created_at (TIMESTAMP)
  - updated_at (TIMESTAMP)
"#
            .to_string(),
        );

        parts.push(
            r#"
Table: products
Columns:
  - id (SERIAL PRIMARY KEY)
  - name (VARCHAR) - Product name
  - category (VARCHAR) - Product category (Electronics, Software, Hardware, etc.)
  - price (DECIMAL) - Product unit price
  - stock_quantity (INT) - Current inventory count
  - description (TEXT)
  - created_at (TIMESTAMP)
  - updated_at (TIMESTAMP)
"#
            .to_string(),
        );

        parts.push(
            r#"
Table: orders
Columns:
  - id (SERIAL PRIMARY KEY)
  - customer_id (INT) - Foreign key to customers.id
  - order_date (DATE) - Date of order
  - total_amount (DECIMAL) - TOTAL ORDER PRICE (use this for revenue, NOT 'price'!)
  - status (VARCHAR) - One of: 'Pending', 'Delivered', 'Cancelled', 'Processing'
  - shipping_address (TEXT)
  - created_at (TIMESTAMP)
  - updated_at (TIMESTAMP)
"#
            .to_string(),
        );

        parts.push("\nEXAMPLE QUERIES:".to_string());
        parts.push("-".repeat(60));

        let examples = [
            (
                "How many customers do we have?",
                "SELECT COUNT(*) as customer_count FROM customers;",
            ),
            (
                "What is the total revenue from all orders?",
                "SELECT SUM(total_amount) as total_revenue FROM orders;",
            ),
            (
                "List all delivered orders",
                "SELECT * FROM orders WHERE status = 'Delivered' ORDER BY order_date DESC;",
            ),
            (
                "How many orders per customer segment?",
                "SELECT c.segment, COUNT(o.id) as order_count FROM customers c LEFT JOIN orders o ON c.id = o.customer_id GROUP BY c.segment;",
            ),
            (
                "Top 10 customers by total spending",
                "SELECT c.name, c.email, SUM(o.total_amount) as total_spent FROM customers c JOIN orders o ON c.id = o.customer_id GROUP BY c.id, c.name, c.email ORDER BY total_spent DESC LIMIT 10;",
            ),
        ];

        for (i, (question, sql)) in examples.iter().enumerate() {
            parts.push(format!("\nExample {}:", i + 1));
            parts.push(format!("Question: {}", question));
            parts.push(format!("SQL: {}", sql));
        }

        parts.join("\n")
    }
}

impl Default for SchemaContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_is_idempotent() {
        let builder = SchemaContextBuilder::new();
        assert_eq!(builder.build(), builder.build());
    }

    #[test]
    fn context_documents_all_tables() {
        let context = SchemaContextBuilder::new().build();
        assert!(context.contains("Table: customers"));
        assert!(context.contains("Table: products"));
        assert!(context.contains("Table: orders"));
    }

    #[test]
    fn context_carries_disambiguation_and_examples() {
        let context = SchemaContextBuilder::new().build();
        assert!(context.contains("use orders.total_amount"));
        assert!(context.contains("EXAMPLE QUERIES:"));
        assert!(context.contains("SELECT COUNT(*) as customer_count FROM customers;"));
        assert!(context.starts_with("DATABASE SCHEMA DOCUMENTATION"));
    }
}
