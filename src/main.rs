mod controllers {
    pub mod campaigns;
    pub mod coupons;
    pub mod discounts;
    pub mod pricing;
}
mod insertables;
use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use controllers::campaigns;
use controllers::coupons;
use controllers::discounts;
use controllers::pricing;
use dotenvy::dotenv;
use env_logger::Env;
use flight_pricing_api::config::AppConfig;
use flight_pricing_api::initialize_db_pool;
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::from_env()
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    let db_pool =
        initialize_db_pool(&config).map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
    log::info!("listening on {}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(db_pool.clone()))
            .route("/health", web::get().to(|| async { HttpResponse::Ok().body("OK") }))
            .service(discounts::get_discounts)
            .service(discounts::get_discount)
            .service(discounts::create_discount)
            .service(discounts::toggle_discount)
            .service(discounts::delete_discount)
            .service(campaigns::get_campaigns)
            .service(campaigns::get_campaign)
            .service(campaigns::create_campaign)
            .service(campaigns::toggle_campaign)
            .service(campaigns::delete_campaign)
            .service(coupons::validate_coupon)
            .service(coupons::redeem_coupon)
            .service(coupons::get_coupons)
            .service(coupons::get_coupon)
            .service(coupons::create_coupon)
            .service(coupons::toggle_coupon)
            .service(coupons::delete_coupon)
            .service(pricing::create_quote)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
