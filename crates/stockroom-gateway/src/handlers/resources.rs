//! Resource CRUD endpoints.
//!
//! The same five handlers serve every resource kind; each route group is
//! given its own [`ResourceController`] as state.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use stockroom_control::ResourceController;
use stockroom_store::{Record, ResourceStore};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::pipeline::Payload;

fn caller(user: Option<&AuthUser>) -> &str {
    user.map_or("anonymous", |u| u.user.as_str())
}

/// List every record.
///
/// ```text
/// GET /products
///
/// Response: 200 OK
/// [{ "id": 1, "name": "Lamp" }]
/// ```
pub async fn list<S>(
    State(controller): State<ResourceController<S>>,
) -> Result<Json<Vec<Record>>, ApiError>
where
    S: ResourceStore + 'static,
{
    Ok(Json(controller.list_all().await?))
}

/// Get one record by id.
pub async fn get_one<S>(
    State(controller): State<ResourceController<S>>,
    Path(id): Path<String>,
) -> Result<Json<Record>, ApiError>
where
    S: ResourceStore + 'static,
{
    let id = controller.resolve_id(&id)?;
    Ok(Json(controller.get_one(id).await?))
}

/// Create a record from the request body.
///
/// ```text
/// POST /products
/// { "name": "Lamp", "price": 20 }
///
/// Response: 201 Created
/// { "id": 1, "name": "Lamp", "price": 20 }
/// ```
pub async fn create<S>(
    State(controller): State<ResourceController<S>>,
    user: Option<AuthUser>,
    Payload(fields): Payload,
) -> Result<(StatusCode, Json<Record>), ApiError>
where
    S: ResourceStore + 'static,
{
    tracing::debug!(
        kind = %controller.kind(),
        caller = caller(user.as_ref()),
        "Create requested"
    );

    let record = controller.create(fields).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Merge the supplied body fields into a record.
pub async fn update<S>(
    State(controller): State<ResourceController<S>>,
    Path(id): Path<String>,
    user: Option<AuthUser>,
    Payload(fields): Payload,
) -> Result<Json<Record>, ApiError>
where
    S: ResourceStore + 'static,
{
    let id = controller.resolve_id(&id)?;
    tracing::debug!(
        kind = %controller.kind(),
        %id,
        caller = caller(user.as_ref()),
        "Update requested"
    );

    Ok(Json(controller.update(id, fields).await?))
}

/// Delete a record; answers `204 No Content`.
pub async fn delete<S>(
    State(controller): State<ResourceController<S>>,
    Path(id): Path<String>,
    user: Option<AuthUser>,
) -> Result<StatusCode, ApiError>
where
    S: ResourceStore + 'static,
{
    let id = controller.resolve_id(&id)?;
    tracing::debug!(
        kind = %controller.kind(),
        %id,
        caller = caller(user.as_ref()),
        "Delete requested"
    );

    controller.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
