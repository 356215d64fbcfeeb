use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde_json::Value;
use tracing::{error, info, instrument};

use super::{extract_token, service_error_to_response, ApiState};
use crate::models::{
    CreateCustomerRequest, CreateSellerRequest, CustomerLoginRequest, CustomerResponse,
    SellerLoginRequest, SellerResponse, SessionResponse, SessionTokenRequest,
};

/// Register a new customer account
#[instrument(name = "register_customer", skip(state, request), fields(mobile_no = %request.mobile_no))]
pub async fn register_customer(
    State(state): State<ApiState>,
    Json(request): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<CustomerResponse>), (StatusCode, Json<Value>)> {
    info!("Registering customer");

    match state.auth_service.register_customer(request).await {
        Ok(customer) => {
            state.metrics.record_auth_operation("register", "customer", true);
            info!("Customer registered: {}", customer.customer_id);
            Ok((StatusCode::CREATED, Json(customer)))
        }
        Err(err) => {
            state.metrics.record_auth_operation("register", "customer", false);
            error!("Failed to register customer: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Register a new seller account
#[instrument(name = "register_seller", skip(state, request), fields(mobile = %request.mobile))]
pub async fn register_seller(
    State(state): State<ApiState>,
    Json(request): Json<CreateSellerRequest>,
) -> Result<(StatusCode, Json<SellerResponse>), (StatusCode, Json<Value>)> {
    info!("Registering seller");

    match state.auth_service.register_seller(request).await {
        Ok(seller) => {
            state.metrics.record_auth_operation("register", "seller", true);
            info!("Seller registered: {}", seller.seller_id);
            Ok((StatusCode::CREATED, Json(seller)))
        }
        Err(err) => {
            state.metrics.record_auth_operation("register", "seller", false);
            error!("Failed to register seller: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Customer login, answering with a session token
#[instrument(name = "login_customer", skip(state, request), fields(mobile_no = %request.mobile_no))]
pub async fn login_customer(
    State(state): State<ApiState>,
    Json(request): Json<CustomerLoginRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), (StatusCode, Json<Value>)> {
    info!("Customer login");

    match state.auth_service.login_customer(request).await {
        Ok(session) => {
            state.metrics.record_auth_operation("login", "customer", true);
            info!("Customer logged in: {}", session.user_id);
            Ok((StatusCode::ACCEPTED, Json(session.to_response())))
        }
        Err(err) => {
            state.metrics.record_auth_operation("login", "customer", false);
            error!("Customer login failed: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Seller login, answering with a session token
#[instrument(name = "login_seller", skip(state, request), fields(mobile = %request.mobile))]
pub async fn login_seller(
    State(state): State<ApiState>,
    Json(request): Json<SellerLoginRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), (StatusCode, Json<Value>)> {
    info!("Seller login");

    match state.auth_service.login_seller(request).await {
        Ok(session) => {
            state.metrics.record_auth_operation("login", "seller", true);
            info!("Seller logged in: {}", session.user_id);
            Ok((StatusCode::ACCEPTED, Json(session.to_response())))
        }
        Err(err) => {
            state.metrics.record_auth_operation("login", "seller", false);
            error!("Seller login failed: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Customer logout; the token rides in the request body
#[instrument(name = "logout_customer", skip(state, request))]
pub async fn logout_customer(
    State(state): State<ApiState>,
    Json(request): Json<SessionTokenRequest>,
) -> Result<(StatusCode, Json<SessionTokenRequest>), (StatusCode, Json<Value>)> {
    info!("Customer logout");
    logout(&state, request, "customer").await
}

/// Seller logout; the token rides in the request body
#[instrument(name = "logout_seller", skip(state, request))]
pub async fn logout_seller(
    State(state): State<ApiState>,
    Json(request): Json<SessionTokenRequest>,
) -> Result<(StatusCode, Json<SessionTokenRequest>), (StatusCode, Json<Value>)> {
    info!("Seller logout");
    logout(&state, request, "seller").await
}

async fn logout(
    state: &ApiState,
    request: SessionTokenRequest,
    user_type: &str,
) -> Result<(StatusCode, Json<SessionTokenRequest>), (StatusCode, Json<Value>)> {
    match state.auth_service.logout(&request.token).await {
        Ok(()) => {
            state.metrics.record_auth_operation("logout", user_type, true);
            info!("Logged out");
            Ok((
                StatusCode::ACCEPTED,
                Json(SessionTokenRequest {
                    token: request.token,
                    message: Some("Logged out successfully".to_string()),
                }),
            ))
        }
        Err(err) => {
            state.metrics.record_auth_operation("logout", user_type, false);
            error!("Logout failed: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Profile of the customer behind the request token
#[instrument(name = "current_customer", skip(state, headers))]
pub async fn current_customer(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Json<CustomerResponse>, (StatusCode, Json<Value>)> {
    let token = extract_token(&headers)?;

    match state.auth_service.get_customer_profile(token).await {
        Ok(customer) => Ok(Json(customer)),
        Err(err) => {
            error!("Failed to fetch customer profile: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Profile of the seller behind the request token
#[instrument(name = "current_seller", skip(state, headers))]
pub async fn current_seller(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Json<SellerResponse>, (StatusCode, Json<Value>)> {
    let token = extract_token(&headers)?;

    match state.auth_service.get_seller_profile(token).await {
        Ok(seller) => Ok(Json(seller)),
        Err(err) => {
            error!("Failed to fetch seller profile: {}", err);
            Err(service_error_to_response(err))
        }
    }
}
