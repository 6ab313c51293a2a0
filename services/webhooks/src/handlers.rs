use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use courseloom_common::{ApiResponse, AppError, PurchaseStatus};

use crate::models::{CheckoutSession, IdentityEvent, IdentityUserData, PaymentEvent, PaymentIntent};
use crate::store::{NewUser, UserProfile};
use crate::{stripe, verify, AppState};

// Identity sync: map provider user-lifecycle events onto the local user
// records.
pub async fn identity_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    let msg_id = header_str(&headers, verify::HEADER_ID)?;
    let timestamp = header_str(&headers, verify::HEADER_TIMESTAMP)?;
    let signature = header_str(&headers, verify::HEADER_SIGNATURE)?;

    state
        .identity_verifier
        .verify(msg_id, timestamp, signature, &body)?;

    let event: IdentityEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("malformed event payload: {e}")))?;

    match event.event_type.as_str() {
        "user.created" => {
            let data = identity_user_data(&event)?;
            let email = data.primary_email().ok_or_else(|| {
                AppError::Validation("user.created event carries no email address".to_string())
            })?;

            state
                .store
                .create_user(NewUser {
                    user_id: data.id.clone(),
                    email: email.to_string(),
                    name: data.display_name(),
                    image_url: data.image_url.clone(),
                })
                .await?;

            tracing::info!(user_id = %data.id, "user record created");
        }
        "user.updated" => {
            let data = identity_user_data(&event)?;
            let email = data.primary_email().ok_or_else(|| {
                AppError::Validation("user.updated event carries no email address".to_string())
            })?;

            state
                .store
                .update_user(
                    &data.id,
                    UserProfile {
                        email: email.to_string(),
                        name: data.display_name(),
                        image_url: data.image_url.clone(),
                    },
                )
                .await?;

            tracing::info!(user_id = %data.id, "user record updated");
        }
        "user.deleted" => {
            let data = identity_user_data(&event)?;
            state.store.delete_user(&data.id).await?;
            tracing::info!(user_id = %data.id, "user record deleted");
        }
        other => {
            tracing::debug!(event_type = other, "ignoring unhandled identity event");
        }
    }

    Ok(Json(json!({})))
}

// Payment sync: advance purchases and record enrollment from provider
// checkout/payment events.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = match headers
        .get(stripe::SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
    {
        Some(signature) => signature,
        None => return webhook_error("missing stripe-signature header"),
    };

    if let Err(err) = state.stripe.verify_signature(&body, signature) {
        tracing::warn!("payment webhook verification failed: {}", err);
        return webhook_error(&err.to_string());
    }

    let event: PaymentEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => return webhook_error(&format!("malformed event payload: {e}")),
    };

    tracing::debug!(event_id = %event.id, event_type = %event.event_type, created = event.created, "payment event received");

    let result = match event.event_type.as_str() {
        "checkout.session.completed" => handle_checkout_completed(&state, &event).await,
        "payment_intent.succeeded" => handle_payment_succeeded(&state, &event).await,
        "payment_intent.payment_failed" => handle_payment_failed(&state, &event).await,
        other => {
            tracing::info!(event_id = %event.id, event_type = other, "unhandled payment event");
            Ok(())
        }
    };

    match result {
        Ok(()) => Json(json!({ "received": true })).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn handle_checkout_completed(state: &AppState, event: &PaymentEvent) -> Result<(), AppError> {
    let session: CheckoutSession = serde_json::from_value(event.data.object.clone())
        .map_err(|e| AppError::Validation(format!("malformed checkout session: {e}")))?;

    tracing::info!(
        session_id = %session.id,
        payment_status = ?session.payment_status,
        "checkout session completed"
    );

    let purchase_id = purchase_id_from_metadata(&session)?;
    complete_purchase(state, purchase_id).await
}

async fn handle_payment_succeeded(state: &AppState, event: &PaymentEvent) -> Result<(), AppError> {
    let intent: PaymentIntent = serde_json::from_value(event.data.object.clone())
        .map_err(|e| AppError::Validation(format!("malformed payment intent: {e}")))?;

    let session = state
        .stripe
        .checkout_session_for_intent(&intent.id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("no checkout session for payment intent {}", intent.id))
        })?;

    let purchase_id = purchase_id_from_metadata(&session)?;
    complete_purchase(state, purchase_id).await
}

async fn handle_payment_failed(state: &AppState, event: &PaymentEvent) -> Result<(), AppError> {
    let intent: PaymentIntent = serde_json::from_value(event.data.object.clone())
        .map_err(|e| AppError::Validation(format!("malformed payment intent: {e}")))?;

    let session = state
        .stripe
        .checkout_session_for_intent(&intent.id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("no checkout session for payment intent {}", intent.id))
        })?;

    let purchase_id = purchase_id_from_metadata(&session)?;
    let purchase = state
        .store
        .find_purchase(purchase_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("purchase {purchase_id} not found")))?;

    // A settled purchase is never downgraded.
    if purchase.status != PurchaseStatus::Pending {
        tracing::debug!(%purchase_id, status = %purchase.status, "purchase already settled, skipping failure update");
        return Ok(());
    }

    state
        .store
        .set_purchase_status(purchase_id, PurchaseStatus::Failed)
        .await?;

    tracing::info!(%purchase_id, "purchase marked as failed");
    Ok(())
}

// Shared completion flow for checkout.session.completed and
// payment_intent.succeeded; both events fire for one transaction, so the
// status guard keeps the enrollment append from running twice.
async fn complete_purchase(state: &AppState, purchase_id: Uuid) -> Result<(), AppError> {
    let purchase = state
        .store
        .find_purchase(purchase_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("purchase {purchase_id} not found")))?;

    if purchase.status != PurchaseStatus::Pending {
        tracing::debug!(%purchase_id, status = %purchase.status, "purchase already settled, skipping");
        return Ok(());
    }

    let user = state
        .store
        .find_user(&purchase.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {} not found", purchase.user_id)))?;

    let course = state
        .store
        .find_course(purchase.course_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("course {} not found", purchase.course_id)))?;

    state
        .store
        .add_course_student(course.course_id, &user.user_id)
        .await?;

    state
        .store
        .add_user_course(&user.user_id, course.course_id)
        .await?;

    state
        .store
        .set_purchase_status(purchase_id, PurchaseStatus::Completed)
        .await?;

    tracing::info!(
        %purchase_id,
        user_id = %user.user_id,
        course_id = %course.course_id,
        amount = %purchase.amount,
        "purchase completed and enrollment recorded"
    );
    Ok(())
}

fn identity_user_data(event: &IdentityEvent) -> Result<IdentityUserData, AppError> {
    serde_json::from_value(event.data.clone())
        .map_err(|e| AppError::Validation(format!("malformed user payload: {e}")))
}

fn purchase_id_from_metadata(session: &CheckoutSession) -> Result<Uuid, AppError> {
    let raw = session.metadata.get("purchaseId").ok_or_else(|| {
        AppError::Validation("session metadata is missing purchaseId".to_string())
    })?;

    raw.parse()
        .map_err(|_| AppError::Validation(format!("purchaseId {raw} is not a valid id")))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AppError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::SignatureVerification(format!("missing {name} header")))
}

fn webhook_error(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, format!("Webhook Error: {message}")).into_response()
}

// Health check endpoint
pub async fn health_check() -> Json<ApiResponse<String>> {
    Json(ApiResponse::success(
        "Webhook sync service is healthy".to_string(),
    ))
}
