use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    cart::BootstrapSource,
    checkout::PaymentDetails,
    dto::{
        auth::{
            AuthResponse, LoginRequest, OAuthRequest, RegisterRequest, UpdateProfileRequest,
            UserProfile,
        },
        cart::{
            AddItemRequest, CartView, ReplaceCartRequest, SetQuantityRequest, SyncCartRequest,
            SyncCartResponse,
        },
        orders::{CheckoutRequest, OrderList},
        products::{CategoryList, ProductForm, ProductList, UploadResponse},
    },
    models::{Address, CartItem, Order, Product},
    response::{ApiResponse, Meta},
    routes::{admin, auth, cart, health, orders, params, products},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::oauth,
        auth::me,
        auth::update_profile,
        products::list_products,
        products::list_categories,
        products::get_product,
        cart::sync_cart,
        cart::get_cart,
        cart::replace_cart,
        cart::add_item,
        cart::set_item_quantity,
        cart::remove_item,
        cart::clear_cart,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        admin::list_products,
        admin::create_product,
        admin::update_product,
        admin::delete_product,
        admin::upload_image,
    ),
    components(
        schemas(
            Product,
            CartItem,
            Order,
            Address,
            PaymentDetails,
            BootstrapSource,
            RegisterRequest,
            LoginRequest,
            OAuthRequest,
            UpdateProfileRequest,
            UserProfile,
            AuthResponse,
            SyncCartRequest,
            SyncCartResponse,
            ReplaceCartRequest,
            AddItemRequest,
            SetQuantityRequest,
            CartView,
            CheckoutRequest,
            OrderList,
            ProductForm,
            ProductList,
            CategoryList,
            UploadResponse,
            params::Pagination,
            params::ProductSort,
            params::CatalogQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartView>,
            ApiResponse<OrderList>,
            ApiResponse<Order>,
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, sign-in and profile"),
        (name = "Products", description = "Catalog browsing"),
        (name = "Cart", description = "Cart document and synchronization"),
        (name = "Orders", description = "Checkout and order history"),
        (name = "Admin", description = "Product management console"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
