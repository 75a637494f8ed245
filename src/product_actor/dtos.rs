use rust_decimal::Decimal;

// DTOs for Product
#[derive(Debug, Clone)]
pub struct ProductCreate {
    pub name: String,
    pub description: String,
    pub retail_price: Decimal,
    pub wholesale_price: Decimal,
    pub quantity: u32,
}

impl ProductCreate {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        retail_price: Decimal,
        wholesale_price: Decimal,
        quantity: u32,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            retail_price,
            wholesale_price,
            quantity,
        }
    }
}

/// Partial update; `None` leaves the field as it is.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub retail_price: Option<Decimal>,
    pub wholesale_price: Option<Decimal>,
    pub quantity: Option<u32>,
}
