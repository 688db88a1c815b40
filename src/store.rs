mod http_store;
mod memory_store;
mod pg_store;
mod yaml_store;

use crate::scenario::{Scenario, UnknownScenarioStatus};
use async_trait::async_trait;
use std::sync::Arc;

pub use http_store::{HttpScenarioStore, new_http_store};
pub use memory_store::MemoryStore;
pub use pg_store::{PgScenarioStore, new_pg_store};
pub use yaml_store::YamlDirStore;

/// 시나리오 영속화 계층에서 발생하는 오류이다.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// 파일 입출력 실패.
    #[error("파일 입출력 실패: {0}")]
    Io(#[from] std::io::Error),
    /// YAML 직렬화/역직렬화 실패.
    #[error("YAML 처리 실패: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// JSON 직렬화/역직렬화 실패.
    #[error("JSON 처리 실패: {0}")]
    Json(#[from] serde_json::Error),
    /// 파일 탐색 패턴 오류.
    #[error("파일 패턴 오류: {0}")]
    Pattern(#[from] glob::PatternError),
    /// 커넥션 풀에서 연결을 얻지 못했다.
    #[error("PostgreSQL 커넥션 획득 실패: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
    /// 쿼리 실행 실패.
    #[error("PostgreSQL 쿼리 실패: {0}")]
    Query(#[from] tokio_postgres::Error),
    /// HTTP 전송 실패.
    #[error("HTTP 요청 실패: {0}")]
    Http(#[from] reqwest::Error),
    /// 원격 저장소가 오류를 응답했다.
    #[error("원격 저장소 오류: {0}")]
    Remote(String),
    /// 저장된 레코드를 해석할 수 없다.
    #[error("잘못된 시나리오 레코드 (id {id}): {source}")]
    InvalidRecord {
        id: i64,
        source: UnknownScenarioStatus,
    },
}

/// ScenarioStore는 시나리오를 보관하는 외부 저장소의 추상 계층이다.
///
/// `save`는 ID 기준 upsert이고 `delete`는 없는 ID에 대해서도 성공한다.
#[async_trait]
pub trait ScenarioStore: Send + Sync {
    /// 저장된 시나리오를 생성 순서대로 반환한다.
    async fn list(&self) -> Result<Vec<Scenario>, StoreError>;

    /// 시나리오 전체(Step 포함)를 저장한다.
    async fn save(&self, scenario: &Scenario) -> Result<(), StoreError>;

    /// 시나리오를 삭제한다.
    async fn delete(&self, id: i64) -> Result<(), StoreError>;
}

/// ScenarioStore를 공유하기 위한 Arc 타입 별칭이다.
pub type SharedStore = Arc<dyn ScenarioStore>;
