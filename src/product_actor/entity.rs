use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{error, info};

use super::actions::{ProductAction, ProductActionResult};
use super::dtos::{ProductCreate, ProductPatch};
use super::error::ProductError;
use crate::actor_framework::Entity;
use crate::domain::Product;

fn validate_name(name: &str) -> Result<(), ProductError> {
    if name.trim().is_empty() {
        return Err(ProductError::ValidationError("name must not be blank".into()));
    }
    Ok(())
}

fn validate_price(field: &str, price: Decimal) -> Result<(), ProductError> {
    if price <= Decimal::ZERO {
        return Err(ProductError::ValidationError(format!(
            "{field} must be greater than 0"
        )));
    }
    Ok(())
}

impl Product {
    fn debit(&mut self, amount: u32) -> Result<ProductActionResult, ProductError> {
        if amount == 0 {
            return Err(ProductError::InvalidQuantity(amount));
        }
        if amount > self.quantity {
            return Err(ProductError::InsufficientStock {
                product_id: self.id.clone(),
                requested: amount,
                available: self.quantity,
            });
        }
        // unreachable after the check above; a failure here is a ledger bug
        self.quantity = self.quantity.checked_sub(amount).ok_or_else(|| {
            error!(product_id = %self.id, amount, "Debit would drive quantity negative");
            ProductError::InvariantViolation(format!(
                "debit of {amount} from {} on {}",
                self.quantity, self.id
            ))
        })?;
        self.updated_at = Utc::now();
        info!(product_id = %self.id, remaining = self.quantity, "Stock debited");
        Ok(ProductActionResult::Debited(self.clone()))
    }

    fn credit(&mut self, amount: u32) -> Result<ProductActionResult, ProductError> {
        if amount == 0 {
            return Err(ProductError::InvalidQuantity(amount));
        }
        self.quantity = self.quantity.checked_add(amount).ok_or_else(|| {
            ProductError::InvariantViolation(format!(
                "credit of {amount} overflows quantity {} on {}",
                self.quantity, self.id
            ))
        })?;
        self.updated_at = Utc::now();
        info!(product_id = %self.id, quantity = self.quantity, "Stock credited");
        Ok(ProductActionResult::Credited(self.quantity))
    }
}

impl Entity for Product {
    const KIND: &'static str = "product";
    type Id = String;
    type CreatePayload = ProductCreate;
    type Patch = ProductPatch;
    type Action = ProductAction;
    type ActionResult = ProductActionResult;
    type Error = ProductError;

    fn id(&self) -> &String {
        &self.id
    }

    fn from_create(id: String, payload: ProductCreate) -> Result<Self, ProductError> {
        validate_name(&payload.name)?;
        validate_price("retail price", payload.retail_price)?;
        validate_price("wholesale price", payload.wholesale_price)?;
        let now = Utc::now();
        Ok(Self {
            id,
            name: payload.name,
            description: payload.description,
            retail_price: payload.retail_price,
            wholesale_price: payload.wholesale_price,
            quantity: payload.quantity,
            created_at: now,
            updated_at: now,
        })
    }

    fn on_update(&mut self, patch: ProductPatch) -> Result<(), ProductError> {
        if let Some(name) = patch.name {
            validate_name(&name)?;
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(price) = patch.retail_price {
            validate_price("retail price", price)?;
            self.retail_price = price;
        }
        if let Some(price) = patch.wholesale_price {
            validate_price("wholesale price", price)?;
            self.wholesale_price = price;
        }
        if let Some(quantity) = patch.quantity {
            self.quantity = quantity;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Handles the ledger actions.
    ///
    /// # Errors
    /// `InsufficientStock` when a debit exceeds the current quantity,
    /// `InvalidQuantity` for zero amounts.
    fn handle_action(&mut self, action: ProductAction) -> Result<ProductActionResult, ProductError> {
        match action {
            ProductAction::CheckStock => Ok(ProductActionResult::StockLevel(self.quantity)),
            ProductAction::Debit(amount) => self.debit(amount),
            ProductAction::Credit(amount) => self.credit(amount),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn product(quantity: u32) -> Product {
        let payload = ProductCreate::new(
            "Widget",
            "A widget",
            "100.00".parse().unwrap(),
            "60.00".parse().unwrap(),
            quantity,
        );
        Product::from_create("product_1".into(), payload).unwrap()
    }

    #[test]
    fn debit_reports_shortfall_without_touching_stock() {
        let mut p = product(2);
        let err = p.handle_action(ProductAction::Debit(3)).unwrap_err();
        assert_eq!(
            err,
            ProductError::InsufficientStock {
                product_id: "product_1".into(),
                requested: 3,
                available: 2
            }
        );
        assert_eq!(p.quantity, 2);
    }

    #[test]
    fn debit_returns_post_debit_row() {
        let mut p = product(10);
        match p.handle_action(ProductAction::Debit(3)).unwrap() {
            ProductActionResult::Debited(row) => {
                assert_eq!(row.quantity, 7);
                assert_eq!(row.name, "Widget");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn zero_amounts_are_rejected() {
        let mut p = product(1);
        assert_eq!(
            p.handle_action(ProductAction::Debit(0)).unwrap_err(),
            ProductError::InvalidQuantity(0)
        );
        assert_eq!(
            p.handle_action(ProductAction::Credit(0)).unwrap_err(),
            ProductError::InvalidQuantity(0)
        );
    }

    #[test]
    fn create_validates_name_and_prices() {
        let mut payload = ProductCreate::new(" ", "", Decimal::ONE, Decimal::ONE, 1);
        assert!(matches!(
            Product::from_create("p".into(), payload.clone()),
            Err(ProductError::ValidationError(_))
        ));
        payload.name = "ok".into();
        payload.retail_price = Decimal::ZERO;
        assert!(matches!(
            Product::from_create("p".into(), payload),
            Err(ProductError::ValidationError(_))
        ));
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let mut p = product(5);
        p.on_update(ProductPatch {
            retail_price: Some("120.00".parse().unwrap()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(p.retail_price, "120.00".parse::<Decimal>().unwrap());
        assert_eq!(p.name, "Widget");
        assert_eq!(p.quantity, 5);
    }

    proptest! {
        #[test]
        fn ledger_never_goes_negative(
            initial in 0u32..50,
            ops in prop::collection::vec((any::<bool>(), 1u32..20), 0..40),
        ) {
            let mut p = product(initial);
            let mut debited: u64 = 0;
            let mut credited: u64 = 0;
            for (is_debit, amount) in ops {
                let before = p.quantity;
                if is_debit {
                    match p.handle_action(ProductAction::Debit(amount)) {
                        Ok(_) => debited += u64::from(amount),
                        Err(ProductError::InsufficientStock { .. }) => {
                            prop_assert!(amount > before);
                            prop_assert_eq!(p.quantity, before);
                        }
                        Err(e) => prop_assert!(false, "unexpected error {}", e),
                    }
                } else {
                    p.handle_action(ProductAction::Credit(amount)).unwrap();
                    credited += u64::from(amount);
                }
            }
            prop_assert!(debited <= u64::from(initial) + credited);
            prop_assert_eq!(
                u64::from(p.quantity),
                u64::from(initial) + credited - debited
            );
        }
    }
}
