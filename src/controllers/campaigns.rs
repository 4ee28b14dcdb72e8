use crate::insertables::NewCampaign;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use diesel::prelude::*;
use flight_pricing_api::errors::ApiError;
use flight_pricing_api::models::Campaign;
use flight_pricing_api::schema;
use flight_pricing_api::DbPool;
use schema::campaigns::dsl::*;

pub fn get_package_campaigns(
    conn: &mut PgConnection,
    package_id: i32,
) -> Result<Vec<Campaign>, ApiError> {
    let package_campaigns = campaigns
        .filter(flight_package_id.eq(package_id))
        .order(starts_at.desc())
        .select(Campaign::as_select())
        .load(conn)?;
    Ok(package_campaigns)
}

pub fn get_campaign_by_id(conn: &mut PgConnection, campaign_id: i32) -> Result<Campaign, ApiError> {
    campaigns
        .find(campaign_id)
        .select(Campaign::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound(format!("campaign {campaign_id}")))
}

pub fn insert_new_campaign(
    conn: &mut PgConnection,
    new_campaign: &NewCampaign,
) -> Result<Campaign, ApiError> {
    new_campaign.validate()?;
    let created = diesel::insert_into(campaigns)
        .values(new_campaign)
        .returning(Campaign::as_returning())
        .get_result(conn)?;
    log::info!(
        "created campaign {} for package {} ({} to {})",
        created.id,
        created.flight_package_id,
        created.starts_at,
        created.ends_at
    );
    Ok(created)
}

pub fn toggle_campaign_by_id(conn: &mut PgConnection, campaign_id: i32) -> Result<bool, ApiError> {
    diesel::update(campaigns.find(campaign_id))
        .set(is_active.eq(diesel::dsl::not(is_active)))
        .returning(is_active)
        .get_result::<bool>(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound(format!("campaign {campaign_id}")))
}

pub fn delete_campaign_by_id(
    conn: &mut PgConnection,
    campaign_id: i32,
) -> Result<String, ApiError> {
    let deleted = diesel::delete(campaigns.find(campaign_id)).execute(conn)?;
    if deleted == 0 {
        return Err(ApiError::NotFound(format!("campaign {campaign_id}")));
    }
    Ok("Campaign deleted".to_string())
}

#[get("/api/packages/{package_id}/campaigns")]
async fn get_campaigns(
    pool: web::Data<DbPool>,
    package_id: web::Path<i32>,
) -> Result<impl Responder, ApiError> {
    let package_campaigns = web::block(move || {
        let mut conn = pool.get()?;
        get_package_campaigns(&mut conn, *package_id)
    })
    .await??;
    Ok(HttpResponse::Ok().json(package_campaigns))
}

#[get("/api/campaigns/{campaign_id}")]
async fn get_campaign(
    pool: web::Data<DbPool>,
    campaign_id: web::Path<i32>,
) -> Result<impl Responder, ApiError> {
    let campaign = web::block(move || {
        let mut conn = pool.get()?;
        get_campaign_by_id(&mut conn, *campaign_id)
    })
    .await??;
    Ok(HttpResponse::Ok().json(campaign))
}

#[post("/api/campaigns")]
async fn create_campaign(
    pool: web::Data<DbPool>,
    form: web::Json<NewCampaign>,
) -> Result<impl Responder, ApiError> {
    let campaign = web::block(move || {
        let mut conn = pool.get()?;
        insert_new_campaign(&mut conn, &form)
    })
    .await??;
    Ok(HttpResponse::Created().json(campaign))
}

#[put("/api/campaigns/{campaign_id}/toggle")]
async fn toggle_campaign(
    pool: web::Data<DbPool>,
    campaign_id: web::Path<i32>,
) -> Result<impl Responder, ApiError> {
    let active = web::block(move || {
        let mut conn = pool.get()?;
        toggle_campaign_by_id(&mut conn, *campaign_id)
    })
    .await??;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "is_active": active })))
}

#[delete("/api/campaigns/{campaign_id}")]
async fn delete_campaign(
    pool: web::Data<DbPool>,
    campaign_id: web::Path<i32>,
) -> Result<impl Responder, ApiError> {
    let message = web::block(move || {
        let mut conn = pool.get()?;
        delete_campaign_by_id(&mut conn, *campaign_id)
    })
    .await??;
    Ok(HttpResponse::Ok().json(message))
}
