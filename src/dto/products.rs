use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::Product,
};

/// The admin product form, used for both create and edit. Validation runs
/// before any write; the data layer itself does not enforce these rules.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: i64,
    pub category: String,
    #[serde(default)]
    pub image_url: String,
    pub stock: i32,
    #[serde(default)]
    pub featured: bool,
}

impl ProductForm {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty()
            || self.description.trim().is_empty()
            || self.category.trim().is_empty()
        {
            return Err(AppError::BadRequest(
                "Please fill in all required fields".to_string(),
            ));
        }
        if self.price <= 0 {
            return Err(AppError::BadRequest(
                "Price must be greater than 0".to_string(),
            ));
        }
        if self.stock < 0 {
            return Err(AppError::BadRequest(
                "Stock cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryList {
    pub items: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ProductForm {
        ProductForm {
            name: "Headphones".into(),
            description: "Over-ear".into(),
            price: 69900,
            category: "electronics".into(),
            image_url: String::new(),
            stock: 10,
            featured: false,
        }
    }

    #[test]
    fn accepts_a_complete_form() {
        assert!(form().validate().is_ok());
    }

    #[test]
    fn zero_price_is_rejected_before_any_write() {
        let mut f = form();
        f.price = 0;
        assert!(f.validate().is_err());
    }

    #[test]
    fn negative_stock_is_rejected() {
        let mut f = form();
        f.stock = -1;
        assert!(f.validate().is_err());
    }

    #[test]
    fn blank_required_fields_are_rejected() {
        let mut f = form();
        f.category = "   ".into();
        assert!(f.validate().is_err());
    }
}
