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
    dto::{
        auth::{LoginRequest, LoginResponse},
        sales::{CreateSaleRequest, SaleDetail, SaleItemDetail, SaleList, SaleSummary},
    },
    models::{Employee, EmployeeRole, LowStockAlert, PaymentMethod, Product, Sale, SaleItem},
    response::{ApiResponse, Meta},
    routes::{auth, health, params, sales},
    sales::{CommittedSale, SaleLineRequest},
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
        auth::login,
        sales::create_sale,
        sales::list_sales,
        sales::get_sale,
    ),
    components(
        schemas(
            Product,
            Employee,
            EmployeeRole,
            PaymentMethod,
            Sale,
            SaleItem,
            LowStockAlert,
            LoginRequest,
            LoginResponse,
            SaleLineRequest,
            CreateSaleRequest,
            CommittedSale,
            SaleSummary,
            SaleItemDetail,
            SaleDetail,
            SaleList,
            params::Pagination,
            params::SortOrder,
            params::SaleListQuery,
            health::HealthData,
            Meta,
            ApiResponse<CommittedSale>,
            ApiResponse<SaleList>,
            ApiResponse<SaleDetail>,
            ApiResponse<LoginResponse>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Employee session endpoints"),
        (name = "Sales", description = "Sale processing endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
