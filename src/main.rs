//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;

mod common;
mod config;
mod db;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;
use crate::middleware::auth::auth_middleware;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // O admin inicial depende do bcrypt, então é semeado aqui e não no SQL
    app_state
        .auth_service
        .ensure_default_admin()
        .await
        .expect("Falha ao garantir o usuário admin padrão.");

    // Rotas de autenticação: login/refresh públicas, o resto protegido
    let auth_routes = Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/refresh", post(handlers::auth::refresh))
        .merge(
            Router::new()
                .route("/register", post(handlers::auth::register))
                .route("/me", get(handlers::auth::me))
                .route("/users", get(handlers::auth::list_users))
                .route(
                    "/users/{id}",
                    get(handlers::auth::get_user)
                        .put(handlers::auth::update_user)
                        .delete(handlers::auth::delete_user),
                )
                .route("/roles", get(handlers::auth::list_roles))
                .layer(axum_middleware::from_fn_with_state(
                    app_state.clone(),
                    auth_middleware,
                )),
        );

    let product_routes = Router::new()
        .route(
            "/",
            post(handlers::catalog::create_product).get(handlers::catalog::list_products),
        )
        .route(
            "/categories",
            post(handlers::catalog::create_category).get(handlers::catalog::list_categories),
        )
        .route("/categories/{id}", put(handlers::catalog::update_category))
        .route("/barcode/{barcode}", get(handlers::catalog::get_product_by_barcode))
        .route(
            "/{id}",
            get(handlers::catalog::get_product)
                .put(handlers::catalog::update_product)
                .delete(handlers::catalog::delete_product),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ));

    let supplier_routes = Router::new()
        .route(
            "/",
            post(handlers::catalog::create_supplier).get(handlers::catalog::list_suppliers),
        )
        .route(
            "/{id}",
            get(handlers::catalog::get_supplier).put(handlers::catalog::update_supplier),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ));

    let inventory_routes = Router::new()
        .route("/", get(handlers::inventory::list_inventory))
        .route("/product/{id}", get(handlers::inventory::stock_by_product))
        .route("/low-stock", get(handlers::inventory::low_stock))
        .route("/adjust", post(handlers::inventory::adjust_stock))
        .route("/transfer", post(handlers::inventory::transfer_stock))
        .route("/movements", get(handlers::inventory::list_movements))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ));

    let sales_routes = Router::new()
        .route(
            "/",
            post(handlers::sales::create_sale).get(handlers::sales::list_sales),
        )
        .route("/{id}", get(handlers::sales::get_sale))
        .route("/{id}/refund", post(handlers::sales::refund_sale))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ));

    let purchase_routes = Router::new()
        .route(
            "/",
            post(handlers::purchases::create_order).get(handlers::purchases::list_orders),
        )
        .route("/{id}", get(handlers::purchases::get_order))
        .route("/{id}/approve", post(handlers::purchases::approve_order))
        .route("/{id}/receive", post(handlers::purchases::receive_order))
        .route("/{id}/cancel", post(handlers::purchases::cancel_order))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ));

    let customer_routes = Router::new()
        .route(
            "/",
            post(handlers::customers::create_customer).get(handlers::customers::list_customers),
        )
        .route(
            "/{id}",
            get(handlers::customers::get_customer)
                .put(handlers::customers::update_customer)
                .delete(handlers::customers::delete_customer),
        )
        .route("/{id}/loyalty", get(handlers::customers::loyalty_summary))
        .route("/{id}/loyalty/adjust", post(handlers::customers::adjust_loyalty))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ));

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/products", product_routes)
        .nest("/api/suppliers", supplier_routes)
        .nest("/api/inventory", inventory_routes)
        .nest("/api/sales", sales_routes)
        .nest("/api/purchases", purchase_routes)
        .nest("/api/customers", customer_routes)
        .with_state(app_state);

    // Inicia o servidor
    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
