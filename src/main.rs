use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local;
use env_logger::{Env, Target};
use std::io::Write;

use instoredealz_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    let config = Config::from_toml().expect("Failed to load configuration");

    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let jwt_service = JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expires_in,
        config.jwt.refresh_token_expires_in,
    );

    if config.email.sendgrid_api_key.is_none() {
        log::warn!("SENDGRID_API_KEY not set; email notifications are disabled");
    }

    let auth_service = AuthService::new(pool.clone(), jwt_service.clone());

    if let (Some(email), Some(password)) = (
        config.admin.bootstrap_email.as_deref(),
        config.admin.bootstrap_password.as_deref(),
    ) {
        if let Err(e) = auth_service.ensure_admin_account(email, password).await {
            log::error!("Failed to bootstrap admin account: {e}");
        }
    }

    let user_service = UserService::new(pool.clone());
    let vendor_service = VendorService::new(pool.clone(), &config.pin);
    let deal_service = DealService::new(pool.clone());
    let claim_service = ClaimService::new(pool.clone(), &config.pin, config.claims.clone());
    let pos_service = PosService::new(pool.clone());
    let wishlist_service = WishlistService::new(pool.clone());
    let help_ticket_service = HelpTicketService::new(pool.clone());
    let admin_service = AdminService::new(pool.clone());

    tasks::spawn_all(claim_service.clone(), deal_service.clone());

    log::info!(
        "Starting HTTP server at {}:{} (claim code mode: {:?})",
        config.server.host,
        config.server.port,
        config.claims.code_mode,
    );

    HttpServer::new(move || {
        App::new()
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .wrap(create_cors())
            .wrap(Logger::default())
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(vendor_service.clone()))
            .app_data(web::Data::new(deal_service.clone()))
            .app_data(web::Data::new(claim_service.clone()))
            .app_data(web::Data::new(pos_service.clone()))
            .app_data(web::Data::new(wishlist_service.clone()))
            .app_data(web::Data::new(help_ticket_service.clone()))
            .app_data(web::Data::new(admin_service.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::auth_config)
                    .configure(handlers::user_config)
                    .configure(handlers::vendor_config)
                    .configure(handlers::deal_config)
                    .configure(handlers::claim_config)
                    .configure(handlers::pos_config)
                    .configure(handlers::wishlist_config)
                    .configure(handlers::help_ticket_config)
                    .configure(handlers::admin_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
