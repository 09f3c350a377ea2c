//! Labels for weak references that no longer resolve.
//!
//! A sale keeps pointing at product 12 after product 12 is deleted; the
//! history stays readable and the missing side renders with these labels.

use crate::types::{Category, Customer, Product, Supplier};

pub const UNCATEGORIZED: &str = "Uncategorized";
pub const UNKNOWN_PRODUCT: &str = "Unknown product";
pub const WALK_IN_CUSTOMER: &str = "Walk-in customer";
pub const UNKNOWN_SUPPLIER: &str = "Unknown supplier";

pub fn category_label(category: Option<&Category>) -> String {
    category.map_or_else(|| UNCATEGORIZED.to_string(), |c| c.name.clone())
}

pub fn product_label(product: Option<&Product>) -> String {
    product.map_or_else(|| UNKNOWN_PRODUCT.to_string(), |p| p.name.clone())
}

pub fn customer_label(customer: Option<&Customer>) -> String {
    customer.map_or_else(|| WALK_IN_CUSTOMER.to_string(), |c| c.name.clone())
}

pub fn supplier_label(supplier: Option<&Supplier>) -> String {
    supplier.map_or_else(|| UNKNOWN_SUPPLIER.to_string(), |s| s.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_on_miss() {
        assert_eq!(category_label(None), "Uncategorized");
        assert_eq!(product_label(None), "Unknown product");
        assert_eq!(customer_label(None), "Walk-in customer");
        assert_eq!(supplier_label(None), "Unknown supplier");
    }

    #[test]
    fn test_labels_on_hit() {
        let category = Category::new("Dairy");
        assert_eq!(category_label(Some(&category)), "Dairy");
    }
}
