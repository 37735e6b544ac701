//! Fetch-based [`EngineApi`] implementation. Runs only in the browser.

use serde::de::DeserializeOwned;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

use crate::api::{
    AckDto, AdviceOutcome, AdviceResponseDto, AiMoveOutcome, AiMoveResponseDto, BoardDto,
    ClientError, EngineApi, LastMoveInfo, LastMoveInfoDto, LegalMoves, MoveOutcome,
    MoveResponseDto, ValidMovesDto, VerifyResponseDto, advice_outcome_from, ai_outcome_from,
    last_move_info_from, legal_moves_from, move_outcome_from, snapshot_from,
};
use crate::types::{Difficulty, GameSnapshot, Position};
use crate::verify::VerificationReport;

pub struct HttpEngine {
    base: String,
}

impl HttpEngine {
    pub fn new(base: impl Into<String>) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self { base }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.request(path, "GET", None).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, ClientError> {
        let payload = serde_json::to_string(body)
            .map_err(|e| ClientError::Decode(format!("request encode failed: {e}")))?;
        self.request(path, "POST", Some(payload)).await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        method: &str,
        body: Option<String>,
    ) -> Result<T, ClientError> {
        let opts = RequestInit::new();
        opts.set_method(method);
        if let Some(body) = &body {
            opts.set_body(&JsValue::from_str(body));
        }

        let request = Request::new_with_str_and_init(&self.url(path), &opts)
            .map_err(|e| network_err("building request", &e))?;
        if body.is_some() {
            request
                .headers()
                .set("Content-Type", "application/json")
                .map_err(|e| network_err("setting headers", &e))?;
        }

        let window = web_sys::window()
            .ok_or_else(|| ClientError::Network("no window object".to_string()))?;
        let response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(|e| network_err("fetch", &e))?;
        let response: Response = response
            .dyn_into()
            .map_err(|_| ClientError::Network("fetch returned a non-Response".to_string()))?;
        if !response.ok() {
            return Err(ClientError::Network(format!(
                "{method} {path} returned HTTP {}",
                response.status()
            )));
        }

        let json = JsFuture::from(
            response
                .json()
                .map_err(|e| network_err("reading body", &e))?,
        )
        .await
        .map_err(|e| network_err("parsing body", &e))?;
        serde_wasm_bindgen::from_value(json)
            .map_err(|e| ClientError::Decode(format!("{method} {path}: {e}")))
    }
}

fn network_err(stage: &str, err: &JsValue) -> ClientError {
    let detail = err
        .as_string()
        .unwrap_or_else(|| format!("{err:?}"));
    ClientError::Network(format!("{stage}: {detail}"))
}

impl EngineApi for HttpEngine {
    async fn snapshot(&self) -> Result<GameSnapshot, ClientError> {
        let dto: BoardDto = self.get_json("/board").await?;
        snapshot_from(dto)
    }

    async fn legal_moves(&self) -> Result<LegalMoves, ClientError> {
        let dto: ValidMovesDto = self.get_json("/valid_moves").await?;
        Ok(legal_moves_from(dto))
    }

    async fn submit_move(&self, pos: Position) -> Result<MoveOutcome, ClientError> {
        let body = serde_json::json!({ "row": pos.row, "col": pos.col });
        let dto: MoveResponseDto = self.post_json("/move", &body).await?;
        move_outcome_from(dto)
    }

    async fn ai_move(&self) -> Result<AiMoveOutcome, ClientError> {
        let dto: AiMoveResponseDto = self.get_json("/ai_move").await?;
        ai_outcome_from(dto)
    }

    async fn verification(&self) -> Result<VerificationReport, ClientError> {
        let dto: VerifyResponseDto = self.get_json("/verify").await?;
        Ok(dto.verification)
    }

    async fn advice(&self) -> Result<AdviceOutcome, ClientError> {
        // Cache-busting timestamp; the advisor endpoint is otherwise cached
        // by some browsers.
        let path = format!("/z3_hint?_t={}", js_sys::Date::now() as u64);
        let dto: AdviceResponseDto = self.get_json(&path).await?;
        advice_outcome_from(dto)
    }

    async fn set_difficulty(
        &self,
        difficulty: Difficulty,
        restart: bool,
    ) -> Result<(), ClientError> {
        let body = serde_json::json!({
            "difficulty": difficulty.as_str(),
            "restart_needed": restart,
        });
        let ack: AckDto = self.post_json("/set_difficulty", &body).await?;
        ack_to_result(ack, "set_difficulty")
    }

    async fn restart(&self) -> Result<(), ClientError> {
        let ack: AckDto = self
            .post_json("/restart", &serde_json::Value::Null)
            .await?;
        ack_to_result(ack, "restart")
    }

    async fn last_move_info(&self) -> Result<LastMoveInfo, ClientError> {
        let dto: LastMoveInfoDto = self.get_json("/last_move_info").await?;
        Ok(last_move_info_from(dto))
    }
}

fn ack_to_result(ack: AckDto, what: &str) -> Result<(), ClientError> {
    if ack.success {
        Ok(())
    } else {
        Err(ClientError::Decode(format!("engine refused {what}")))
    }
}
