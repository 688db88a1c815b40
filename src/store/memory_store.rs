use super::{ScenarioStore, StoreError};
use crate::scenario::Scenario;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// MemoryStore는 프로세스 메모리에만 시나리오를 보관하는 기본 구현이다.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// 삽입 순서를 유지하는 시나리오 목록.
    scenarios: RwLock<Vec<Scenario>>,
}

impl MemoryStore {
    /// 빈 저장소를 생성한다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 초기 목록을 가진 저장소를 생성한다.
    pub fn with_scenarios(scenarios: Vec<Scenario>) -> Self {
        Self {
            scenarios: RwLock::new(scenarios),
        }
    }
}

#[async_trait]
impl ScenarioStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Scenario>, StoreError> {
        Ok(self.scenarios.read().await.clone())
    }

    /// 같은 ID가 있으면 제자리에서 교체하고 없으면 끝에 추가한다.
    async fn save(&self, scenario: &Scenario) -> Result<(), StoreError> {
        let mut guard = self.scenarios.write().await;
        match guard.iter_mut().find(|s| s.id == scenario.id) {
            Some(existing) => *existing = scenario.clone(),
            None => guard.push(scenario.clone()),
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.scenarios.write().await.retain(|s| s.id != id);
        Ok(())
    }
}
