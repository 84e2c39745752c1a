use actix_web::{HttpResponse, web};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::info;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::personnel::{PersonnelRecord, RawPersonnel};
use crate::store::PersonnelStore;

#[derive(Serialize, ToSchema)]
pub struct PersonnelListResponse {
    pub personnel: Vec<PersonnelRecord>,
}

#[derive(Serialize, ToSchema)]
pub struct PersonnelResponse {
    #[schema(example = "Personnel added successfully")]
    pub message: String,
    pub personnel: PersonnelRecord,
}

#[utoipa::path(
    get,
    path = "/api/personnel",
    responses(
        (status = 200, description = "Whole roster, newest first", body = PersonnelListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Personnel"
)]
pub async fn list_personnel(
    store: web::Data<dyn PersonnelStore>,
) -> Result<HttpResponse, AppError> {
    let personnel = store.list_all().await?;
    Ok(HttpResponse::Ok().json(PersonnelListResponse { personnel }))
}

#[utoipa::path(
    get,
    path = "/api/personnel/{personnel_id}",
    params(
        ("personnel_id" = u64, Path, description = "Roster id")
    ),
    responses(
        (status = 200, description = "Personnel found", body = PersonnelRecord),
        (status = 404, description = "Personnel not found", body = Object, example = json!({
            "error": "Personnel not found"
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Personnel"
)]
pub async fn get_personnel(
    store: web::Data<dyn PersonnelStore>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let record = store
        .find_by_id(path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("Personnel not found"))?;

    Ok(HttpResponse::Ok().json(record))
}

/// Add a roster member. Legacy field names are accepted; a case-insensitive
/// army number match returns the existing record instead of a duplicate.
#[utoipa::path(
    post,
    path = "/api/personnel",
    request_body(
        content = Object,
        description = "Roster payload; canonical or legacy keys",
        example = json!({
            "armyNumber": "NA1",
            "fullName": "Jane Doe",
            "rank": "Capt",
            "basicSalary": "1,000",
            "allowance": 200,
            "deductions": 50
        })
    ),
    responses(
        (status = 201, description = "Personnel added", body = PersonnelResponse),
        (status = 200, description = "Army number already on the roster", body = PersonnelResponse),
        (status = 400, description = "Missing required fields")
    ),
    security(("bearer_auth" = [])),
    tag = "Personnel"
)]
pub async fn add_personnel(
    store: web::Data<dyn PersonnelStore>,
    body: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    let details = RawPersonnel::new(&body).resolve();

    if details.army_number.is_empty() || details.full_name.is_empty() {
        return Err(AppError::validation(
            "Missing required fields: armyNumber and fullName",
        ));
    }

    if let Some(existing) = store.find_by_army_number(&details.army_number).await? {
        info!(id = existing.id, army_number = %existing.details.army_number, "Personnel already on roster");
        return Ok(HttpResponse::Ok().json(PersonnelResponse {
            message: "Personnel already exists".to_string(),
            personnel: existing,
        }));
    }

    let record = store.insert(details).await?;
    info!(id = record.id, "Personnel added");

    Ok(HttpResponse::Created().json(PersonnelResponse {
        message: "Personnel added successfully".to_string(),
        personnel: record,
    }))
}

/// Partial update: only fields present in the payload change.
#[utoipa::path(
    put,
    path = "/api/personnel/{personnel_id}",
    params(
        ("personnel_id" = u64, Path, description = "Roster id")
    ),
    request_body(content = Object, example = json!({ "Allowance": "1,200", "status": "Inactive" })),
    responses(
        (status = 200, description = "Personnel updated", body = PersonnelResponse),
        (status = 404, description = "Personnel not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Personnel"
)]
pub async fn update_personnel(
    store: web::Data<dyn PersonnelStore>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    let changes = RawPersonnel::new(&body).changes();

    let record = store
        .update(path.into_inner(), &changes)
        .await?
        .ok_or_else(|| AppError::not_found("Personnel not found or invalid ID"))?;

    Ok(HttpResponse::Ok().json(PersonnelResponse {
        message: "Personnel updated successfully".to_string(),
        personnel: record,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/personnel/{personnel_id}",
    params(
        ("personnel_id" = u64, Path, description = "Roster id")
    ),
    responses(
        (status = 200, description = "Personnel deleted", body = Object, example = json!({
            "message": "Personnel deleted successfully"
        })),
        (status = 404, description = "Personnel not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Personnel"
)]
pub async fn delete_personnel(
    store: web::Data<dyn PersonnelStore>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let personnel_id = path.into_inner();

    if !store.delete(personnel_id).await? {
        return Err(AppError::not_found("Personnel not found or invalid ID"));
    }

    info!(personnel_id, "Personnel deleted");
    Ok(HttpResponse::Ok().json(json!({ "message": "Personnel deleted successfully" })))
}
