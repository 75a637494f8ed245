use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// A catalog row. `quantity` is the only source of truth for availability.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub retail_price: Decimal,
    pub wholesale_price: Decimal,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }

    pub fn unit_margin(&self) -> Decimal {
        self.retail_price - self.wholesale_price
    }
}

/// Public view of a product; wholesale price is never exposed.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.retail_price,
            quantity: product.quantity,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// Admin view of a product, including wholesale price.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminProductView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub wholesale_price: Decimal,
    pub retail_price: Decimal,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Product> for AdminProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            wholesale_price: product.wholesale_price,
            retail_price: product.retail_price,
            quantity: product.quantity,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}
