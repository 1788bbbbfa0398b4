use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    checkout::PaymentDetails,
    models::{Address, Order},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub shipping_address: Address,
    pub payment: PaymentDetails,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
