//! API handlers.
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use solex_core::{SourceBundle, VerificationReport, SOLEX_VERSION};

use crate::AppState;

/// One named source block, as the documentation host supplies them.
#[derive(Debug, Deserialize)]
pub struct SourceBlock {
    pub name: String,
    pub body: String,
}

/// Body of `POST /v1/verify`.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub blocks: Vec<SourceBlock>,
}

pub async fn verify(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Json<VerificationReport> {
    let bundle = SourceBundle::from_blocks(
        request
            .blocks
            .iter()
            .map(|block| (block.name.as_str(), block.body.as_str())),
    );
    let report = state.verifier.verify(bundle).await;
    state.metrics.record(&report);
    Json(report)
}

pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "version": SOLEX_VERSION })),
    )
}

pub async fn metrics(State(state): State<AppState>) -> (StatusCode, String) {
    match state.metrics.encode() {
        Ok(text) => (StatusCode::OK, text),
        Err(error) => (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_request_shape() {
        let request: VerifyRequest = serde_json::from_str(
            r#"{ "blocks": [
                { "name": "solution", "body": "contract Coin {}" },
                { "name": "validation", "body": "contract TestCoin {}" }
            ]}"#,
        )
        .unwrap();
        assert_eq!(request.blocks.len(), 2);

        let bundle = SourceBundle::from_blocks(
            request
                .blocks
                .iter()
                .map(|block| (block.name.as_str(), block.body.as_str())),
        );
        assert_eq!(bundle.solution, "contract Coin {}");
        assert_eq!(bundle.validation, "contract TestCoin {}");
    }
}
