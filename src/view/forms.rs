//! Form models with local validation.
//!
//! A form that fails validation never produces a request, so nothing invalid
//! reaches the network layer.

use crate::domain::{MovementKind, MovementRequest, Product, ProductRequest};
use crate::error::{ValidationError, ValidationErrors};

pub const MIN_PRICE: f64 = 0.01;
pub const MAX_PRICE: f64 = 999_999.99;
pub const MAX_STOCK: i64 = 1_000_000;
pub const MAX_QUANTITY: i64 = 1_000_000;

/// Create/edit product form. Numeric fields are `None` until filled in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductForm {
    pub name: String,
    pub category: String,
    pub supplier: String,
    pub price: Option<f64>,
    pub stock: Option<i64>,
}

impl ProductForm {
    /// Pre-fills the edit form.
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            category: product.category.clone(),
            supplier: product.supplier.clone(),
            price: Some(product.price),
            stock: Some(i64::from(product.stock)),
        }
    }

    pub fn validate(&self) -> Result<ProductRequest, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        check_text(&mut errors, "name", &self.name, 3, 100);
        check_text(&mut errors, "category", &self.category, 3, 50);
        check_text(&mut errors, "supplier", &self.supplier, 3, 100);
        check_price(&mut errors, self.price);
        check_range(&mut errors, "stock", self.stock, 0, MAX_STOCK);

        errors.into_result(())?;
        Ok(ProductRequest {
            name: self.name.trim().to_string(),
            category: self.category.trim().to_string(),
            supplier: self.supplier.trim().to_string(),
            price: self.price.unwrap_or_default(),
            stock: self.stock.and_then(|s| u32::try_from(s).ok()).unwrap_or_default(),
        })
    }
}

/// Stock movement form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovementForm {
    pub product_id: Option<u64>,
    pub kind: Option<MovementKind>,
    pub quantity: Option<i64>,
}

impl MovementForm {
    pub fn new(product_id: u64, kind: MovementKind, quantity: i64) -> Self {
        Self {
            product_id: Some(product_id),
            kind: Some(kind),
            quantity: Some(quantity),
        }
    }

    pub fn validate(&self) -> Result<MovementRequest, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.product_id.is_none() {
            errors.push("productId", ValidationError::Required);
        }
        if self.kind.is_none() {
            errors.push("type", ValidationError::Required);
        }
        check_range(&mut errors, "quantity", self.quantity, 1, MAX_QUANTITY);

        match (self.product_id, self.kind, self.quantity) {
            (Some(product_id), Some(kind), Some(quantity)) if errors.is_empty() => {
                Ok(MovementRequest {
                    product_id,
                    kind,
                    quantity: u32::try_from(quantity).unwrap_or_default(),
                })
            }
            _ => Err(errors),
        }
    }
}

fn check_text(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) {
    let value = value.trim();
    let len = value.chars().count();
    if value.is_empty() {
        errors.push(field, ValidationError::Required);
    } else if len < min {
        errors.push(field, ValidationError::MinLength(min));
    } else if len > max {
        errors.push(field, ValidationError::MaxLength(max));
    }
}

fn check_price(errors: &mut ValidationErrors, price: Option<f64>) {
    match price {
        None => errors.push("price", ValidationError::Required),
        Some(p) if p.is_nan() => errors.push("price", ValidationError::Required),
        Some(p) if p < MIN_PRICE => errors.push("price", ValidationError::Min(MIN_PRICE)),
        Some(p) if p > MAX_PRICE => errors.push("price", ValidationError::Max(MAX_PRICE)),
        Some(_) => {}
    }
}

fn check_range(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<i64>,
    min: i64,
    max: i64,
) {
    match value {
        None => errors.push(field, ValidationError::Required),
        Some(v) if v < min => errors.push(field, ValidationError::Min(min as f64)),
        Some(v) if v > max => errors.push(field, ValidationError::Max(max as f64)),
        Some(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_framework::product;

    fn filled() -> ProductForm {
        ProductForm {
            name: "  Desk Lamp ".into(),
            category: "home".into(),
            supplier: "ACME".into(),
            price: Some(19.99),
            stock: Some(0),
        }
    }

    #[test]
    fn valid_form_produces_trimmed_request() {
        let request = filled().validate().unwrap();
        assert_eq!(request.name, "Desk Lamp");
        assert_eq!(request.stock, 0);
    }

    #[test]
    fn empty_form_reports_every_field() {
        let errors = ProductForm::default().validate().unwrap_err();
        assert_eq!(errors.len(), 5);
        for field in ["name", "category", "supplier", "price", "stock"] {
            assert_eq!(errors.for_field(field), Some(&ValidationError::Required));
        }
    }

    #[test]
    fn enforces_lengths_and_ranges() {
        let form = ProductForm {
            name: "ab".into(),
            category: "c".repeat(51),
            price: Some(0.0),
            stock: Some(-1),
            ..filled()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.for_field("name"), Some(&ValidationError::MinLength(3)));
        assert_eq!(errors.for_field("category"), Some(&ValidationError::MaxLength(50)));
        assert_eq!(errors.for_field("price"), Some(&ValidationError::Min(0.01)));
        assert_eq!(errors.for_field("stock"), Some(&ValidationError::Min(0.0)));

        let too_much = ProductForm { price: Some(1_000_000.0), stock: Some(1_000_001), ..filled() };
        let errors = too_much.validate().unwrap_err();
        assert_eq!(errors.for_field("price"), Some(&ValidationError::Max(MAX_PRICE)));
        assert_eq!(errors.for_field("stock"), Some(&ValidationError::Max(1_000_000.0)));
    }

    #[test]
    fn edit_form_round_trips_a_product() {
        let lamp = product(4, "Lamp", 7);
        let request = ProductForm::from_product(&lamp).validate().unwrap();
        assert_eq!(request.name, lamp.name);
        assert_eq!(request.stock, 7);
    }

    #[test]
    fn movement_quantity_must_be_positive() {
        let errors = MovementForm::new(1, MovementKind::Outbound, 0).validate().unwrap_err();
        assert_eq!(errors.for_field("quantity"), Some(&ValidationError::Min(1.0)));

        let errors = MovementForm::default().validate().unwrap_err();
        assert_eq!(errors.len(), 3);

        let request = MovementForm::new(1, MovementKind::Inbound, 5).validate().unwrap();
        assert_eq!(request.quantity, 5);
    }
}
