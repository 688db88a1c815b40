use super::{ScenarioStore, SharedStore, StoreError};
use crate::scenario::Scenario;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use std::sync::Arc;

/// HttpScenarioStore는 대시보드 CRM API(`?path=...` 라우팅)에 시나리오를 위임한다.
#[derive(Debug, Clone)]
pub struct HttpScenarioStore {
    /// HTTP 클라이언트.
    client: Client,
    /// API 기본 URL.
    base_url: String,
}

impl HttpScenarioStore {
    /// 기본 URL을 받아 저장소를 생성한다.
    ///
    /// # 매개변수
    /// - `base_url`: `?path=` 쿼리를 붙여 호출할 CRM API 주소.
    ///
    /// # 반환값
    /// 기본 설정의 HTTP 클라이언트를 가진 [`HttpScenarioStore`]를 반환한다.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, StoreError> {
        let response = self
            .client
            .post(&self.base_url)
            .query(&[("path", path)])
            .json(body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        parse_response(status, &text)
    }
}

/// 응답 본문을 해석한다. `{"error": ..}` 본문이나 2xx가 아닌 상태는 실패로 본다.
fn parse_response(status: StatusCode, body: &str) -> Result<Value, StoreError> {
    let value: Value = if body.trim().is_empty() {
        Value::Null
    } else {
        match serde_json::from_str(body) {
            Ok(value) => value,
            Err(_) if !status.is_success() => {
                return Err(StoreError::Remote(format!("HTTP {status}")));
            }
            Err(err) => return Err(err.into()),
        }
    };
    if let Some(message) = value.get("error").and_then(Value::as_str) {
        return Err(StoreError::Remote(message.to_string()));
    }
    if !status.is_success() {
        return Err(StoreError::Remote(format!("HTTP {status}")));
    }
    Ok(value)
}

/// 목록 응답에서 `scenarios` 배열을 꺼낸다. 필드가 없으면 빈 목록이다.
fn scenarios_from_response(value: Value) -> Result<Vec<Scenario>, StoreError> {
    match value {
        Value::Object(mut map) => match map.remove("scenarios") {
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(list) => Ok(serde_json::from_value(list)?),
        },
        _ => Ok(Vec::new()),
    }
}

#[async_trait]
impl ScenarioStore for HttpScenarioStore {
    async fn list(&self) -> Result<Vec<Scenario>, StoreError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("path", "scenarios")])
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        scenarios_from_response(parse_response(status, &text)?)
    }

    async fn save(&self, scenario: &Scenario) -> Result<(), StoreError> {
        self.post("save_scenario", &serde_json::to_value(scenario)?)
            .await
            .map(|_| ())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.post("delete_scenario", &json!({ "id": id }))
            .await
            .map(|_| ())
    }
}

/// HttpScenarioStore를 [`SharedStore`] 형태로 감싸 반환한다.
pub fn new_http_store(base_url: String) -> SharedStore {
    Arc::new(HttpScenarioStore::new(base_url)) as SharedStore
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_field_wins_over_status() {
        let err = parse_response(StatusCode::OK, r#"{"error":"Unknown path"}"#)
            .expect_err("오류가 나야 한다");
        assert!(matches!(err, StoreError::Remote(msg) if msg == "Unknown path"));
    }

    #[test]
    fn non_json_failure_reports_status() {
        let err = parse_response(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>")
            .expect_err("오류가 나야 한다");
        assert!(matches!(err, StoreError::Remote(msg) if msg.contains("502")));
    }

    #[test]
    fn empty_success_body_is_accepted() {
        assert_eq!(parse_response(StatusCode::OK, "").expect("성공"), Value::Null);
    }

    #[test]
    fn missing_scenarios_field_is_an_empty_list() {
        assert!(scenarios_from_response(json!({})).expect("성공").is_empty());
        assert!(scenarios_from_response(json!({"scenarios": null})).expect("성공").is_empty());
    }

    #[test]
    fn scenarios_field_is_parsed_in_order() {
        let value = json!({"scenarios": [
            {"id": 2, "name": "B", "steps": [], "status": "draft", "created": ""},
            {"id": 1, "name": "A", "steps": [{"id": "start", "type": "greeting", "content": "hi"}],
             "status": "active", "created": "01.01.2026"}
        ]});
        let list = scenarios_from_response(value).expect("파싱 실패");
        assert_eq!(list.iter().map(|s| s.id).collect::<Vec<_>>(), vec![2, 1]);
        assert_eq!(list[1].steps.len(), 1);
    }
}
