use chrono::{DateTime, Utc};
use diesel::insert_into;
use diesel::prelude::*;
use dotenvy::dotenv;
use flight_pricing_api::config::AppConfig;
use flight_pricing_api::establish_connection;
use flight_pricing_api::models::{normalize_code, DiscountCondition, DiscountType};
use flight_pricing_api::schema;
use schema::campaigns;
use schema::coupons;
use schema::package_discounts;
use serde::Deserialize;
use std::error::Error;
use std::fs;

#[derive(Deserialize, Insertable)]
struct PackageDiscount {
    flight_package_id: i32,
    name: String,
    discount_type: DiscountType,
    discount_value: f64,
    condition: DiscountCondition,
    specific_days: Option<Vec<i32>>,
}

#[derive(Deserialize, Insertable)]
struct Campaign {
    flight_package_id: i32,
    name: String,
    description: Option<String>,
    discount_type: DiscountType,
    discount_value: f64,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
}

#[derive(Deserialize, Insertable)]
struct Coupon {
    operator_id: i32,
    code: String,
    discount_type: DiscountType,
    discount_value: f64,
    flight_package_id: Option<i32>,
    expires_at: Option<DateTime<Utc>>,
    usage_limit: Option<i32>,
}

fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    let config = AppConfig::from_env()?;
    let connection = &mut establish_connection(&config)?;

    let discounts: Vec<PackageDiscount> =
        serde_json::from_str(&fs::read_to_string("src/bin/package_discounts.json")?)?;
    let campaigns_json: Vec<Campaign> =
        serde_json::from_str(&fs::read_to_string("src/bin/campaigns.json")?)?;
    let mut coupons_json: Vec<Coupon> =
        serde_json::from_str(&fs::read_to_string("src/bin/coupons.json")?)?;
    for coupon in &mut coupons_json {
        coupon.code = normalize_code(&coupon.code);
    }

    let inserted = insert_into(package_discounts::table)
        .values(&discounts)
        .execute(connection)?;
    println!("seeded {inserted} package discounts");

    let inserted = insert_into(campaigns::table)
        .values(&campaigns_json)
        .execute(connection)?;
    println!("seeded {inserted} campaigns");

    let inserted = insert_into(coupons::table)
        .values(&coupons_json)
        .execute(connection)?;
    println!("seeded {inserted} coupons");
    Ok(())
}
