use super::{ScenarioStore, SharedStore, StoreError};
use crate::scenario::{Scenario, ScenarioStatus, Step};
use anyhow::{Context, Result};
use async_trait::async_trait;
use deadpool_postgres::{Config as PoolConfig, ManagerConfig, Pool, RecyclingMethod, Runtime};
use std::sync::Arc;
use tokio_postgres::NoTls;

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS scenarios (
    id BIGINT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'draft',
    created TEXT NOT NULL DEFAULT '',
    steps JSONB NOT NULL DEFAULT '[]'::jsonb
)";

const UPSERT_SQL: &str = "INSERT INTO scenarios (id, name, description, status, created, steps)
VALUES ($1, $2, $3, $4, $5, $6)
ON CONFLICT (id) DO UPDATE SET
    name = EXCLUDED.name,
    description = EXCLUDED.description,
    status = EXCLUDED.status,
    created = EXCLUDED.created,
    steps = EXCLUDED.steps";

const SELECT_SQL: &str =
    "SELECT id, name, description, status, created, steps FROM scenarios ORDER BY id";

const DELETE_SQL: &str = "DELETE FROM scenarios WHERE id = $1";

/// PgScenarioStore는 PostgreSQL `scenarios` 테이블에 시나리오를 저장하는 구현체이다.
#[derive(Clone)]
pub struct PgScenarioStore {
    /// deadpool 기반 연결 풀이다.
    pool: Pool,
}

impl PgScenarioStore {
    /// 주어진 접속 정보로 연결 풀을 만들고 테이블을 준비한다.
    ///
    /// # 매개변수
    /// - `dsn`: `host`, `port`, `dbname` 등이 포함된 PostgreSQL DSN 문자열.
    /// - `user`: 데이터베이스 사용자명.
    /// - `password`: 해당 사용자 비밀번호.
    pub async fn connect(
        dsn: impl Into<String>,
        user: Option<String>,
        password: Option<String>,
    ) -> Result<Self> {
        let mut config = PoolConfig::new();
        config.url = Some(dsn.into());
        config.user = user;
        config.password = password;
        config.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let pool = config
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .context("PostgreSQL 커넥션 풀 생성 실패")?;
        let store = Self { pool };
        store.ensure_schema().await.context("scenarios 테이블 준비 실패")?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        let client = self.pool.get().await?;
        client.batch_execute(CREATE_TABLE_SQL).await?;
        Ok(())
    }
}

/// 조회한 컬럼 값을 Scenario로 조립한다.
fn scenario_from_columns(
    id: i64,
    name: String,
    description: String,
    status: &str,
    created: String,
    steps: serde_json::Value,
) -> Result<Scenario, StoreError> {
    let status: ScenarioStatus = status
        .parse()
        .map_err(|source| StoreError::InvalidRecord { id, source })?;
    let steps: Vec<Step> = serde_json::from_value(steps)?;
    Ok(Scenario {
        id,
        name,
        description,
        steps,
        status,
        created,
    })
}

#[async_trait]
impl ScenarioStore for PgScenarioStore {
    async fn list(&self) -> Result<Vec<Scenario>, StoreError> {
        let client = self.pool.get().await?;
        let rows = client.query(SELECT_SQL, &[]).await?;
        let mut scenarios = Vec::with_capacity(rows.len());
        for row in rows {
            let status: String = row.try_get("status")?;
            scenarios.push(scenario_from_columns(
                row.try_get("id")?,
                row.try_get("name")?,
                row.try_get("description")?,
                &status,
                row.try_get("created")?,
                row.try_get("steps")?,
            )?);
        }
        Ok(scenarios)
    }

    async fn save(&self, scenario: &Scenario) -> Result<(), StoreError> {
        let steps = serde_json::to_value(&scenario.steps)?;
        let status = scenario.status.as_str();
        let client = self.pool.get().await?;
        client
            .execute(
                UPSERT_SQL,
                &[
                    &scenario.id,
                    &scenario.name,
                    &scenario.description,
                    &status,
                    &scenario.created,
                    &steps,
                ],
            )
            .await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let client = self.pool.get().await?;
        client.execute(DELETE_SQL, &[&id]).await?;
        Ok(())
    }
}

/// PgScenarioStore를 [`SharedStore`] 형태로 감싸 반환한다.
pub async fn new_pg_store(
    dsn: String,
    user: Option<String>,
    password: Option<String>,
) -> Result<SharedStore> {
    let store = PgScenarioStore::connect(dsn, user, password).await?;
    Ok(Arc::new(store) as SharedStore)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{StepKind, UnknownScenarioStatus};
    use serde_json::json;

    #[test]
    fn columns_map_to_scenario() {
        let steps = json!([
            {"id": "start", "type": "greeting", "content": "안녕하세요"},
            {"id": "step-5", "type": "objection", "content": "", "nextStep": "start"}
        ]);
        let scenario = scenario_from_columns(
            5,
            "재방문".into(),
            "".into(),
            "active",
            "03.03.2026".into(),
            steps,
        )
        .expect("행 변환 실패");
        assert_eq!(scenario.status, ScenarioStatus::Active);
        assert_eq!(scenario.steps[1].kind, StepKind::Objection);
        assert_eq!(scenario.steps[1].next_step.as_deref(), Some("start"));
    }

    #[test]
    fn unknown_status_is_an_invalid_record() {
        let err = scenario_from_columns(9, "x".into(), "".into(), "paused", "".into(), json!([]))
            .expect_err("오류가 나야 한다");
        match err {
            StoreError::InvalidRecord { id, source } => {
                assert_eq!(id, 9);
                assert_eq!(source, UnknownScenarioStatus("paused".into()));
            }
            other => panic!("예상하지 못한 오류: {other}"),
        }
    }
}
