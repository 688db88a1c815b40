use crate::editor::{EditorError, IdClock, ScenarioEditorState, today_label};
use crate::scenario::{Scenario, ScenarioStatus};
use crate::store::SharedStore;
use std::collections::HashSet;
use tracing::{debug, info};

/// 저장 동작 종류이다. 저장 시 상태를 고정한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// 초안으로 저장.
    Draft,
    /// 활성화하여 저장.
    Activate,
}

impl SaveMode {
    /// 이 동작이 고정하는 상태를 반환한다.
    pub fn status(&self) -> ScenarioStatus {
        match self {
            SaveMode::Draft => ScenarioStatus::Draft,
            SaveMode::Activate => ScenarioStatus::Active,
        }
    }
}

/// 시나리오 목록과 현재 편집 대상을 관리한다.
///
/// 목록은 저장소 응답으로만 갱신되고, 편집 버퍼는 목록과 분리된 복사본이다.
#[derive(Debug, Default)]
pub struct ScenarioBuilder {
    /// 저장소에서 받은 시나리오 목록.
    scenarios: Vec<Scenario>,
    /// 편집 중인 시나리오.
    editing: Option<ScenarioEditorState>,
    /// 시나리오 ID 발급기.
    clock: IdClock,
}

impl ScenarioBuilder {
    /// 빈 빌더를 생성한다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 목록을 받은 순서 그대로 반환한다.
    pub fn list(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// 저장소에서 다시 읽은 목록으로 교체한다. 편집 버퍼는 건드리지 않는다.
    pub fn replace_scenarios(&mut self, scenarios: Vec<Scenario>) {
        debug!(count = scenarios.len(), "시나리오 목록 갱신");
        self.scenarios = scenarios;
    }

    /// 현재 편집 상태를 반환한다.
    pub fn editing(&self) -> Option<&ScenarioEditorState> {
        self.editing.as_ref()
    }

    /// 현재 편집 상태를 변경 가능하게 반환한다.
    pub fn editing_mut(&mut self) -> Result<&mut ScenarioEditorState, EditorError> {
        self.editing.as_mut().ok_or(EditorError::NoScenarioSelected)
    }

    /// 지정한 시나리오가 편집 중인지 확인한다.
    pub fn is_editing(&self, id: i64) -> bool {
        self.editing.as_ref().is_some_and(|state| state.scenario_id() == id)
    }

    /// 새 초안 시나리오를 만들어 편집 대상으로 삼는다.
    pub fn create_scenario(&mut self) -> i64 {
        let taken: HashSet<i64> = self.scenarios.iter().map(|s| s.id).collect();
        let id = loop {
            let candidate = self.clock.next_millis();
            if !taken.contains(&candidate) {
                break candidate;
            }
        };
        self.editing = Some(ScenarioEditorState::new(Scenario::new(id, today_label())));
        info!(scenario_id = id, "새 시나리오 생성");
        id
    }

    /// 목록의 시나리오 복사본을 편집 대상으로 삼는다.
    pub fn select_scenario(&mut self, id: i64) -> Result<(), EditorError> {
        let scenario = self
            .scenarios
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(EditorError::UnknownScenario(id))?;
        self.editing = Some(ScenarioEditorState::open(scenario));
        Ok(())
    }

    /// 목록 밖에서 가져온 시나리오(예: YAML 파일)를 편집 대상으로 삼는다.
    pub fn open_external(&mut self, scenario: Scenario) {
        let mut state = ScenarioEditorState::open(scenario);
        state.dirty = true;
        self.editing = Some(state);
    }

    /// 편집 대상을 해제한다.
    pub fn deselect(&mut self) {
        self.editing = None;
    }

    /// 저장소에 보낼 payload를 만든다. 상태만 고정되며 편집 버퍼는 그대로다.
    pub fn save_payload(&self, mode: SaveMode) -> Result<Scenario, EditorError> {
        let state = self.editing.as_ref().ok_or(EditorError::NoScenarioSelected)?;
        Ok(Scenario {
            status: mode.status(),
            ..state.scenario.clone()
        })
    }

    /// 저장 요청이 성공했음을 반영한다. 같은 시나리오를 편집 중이면 상태를 맞춘다.
    pub fn on_saved(&mut self, payload: &Scenario) {
        let Some(state) = self.editing.as_mut() else {
            return;
        };
        if state.scenario_id() != payload.id {
            return;
        }
        state.scenario.status = payload.status;
        if state.scenario == *payload {
            state.dirty = false;
        }
    }

    /// 삭제 요청이 성공했음을 반영한다. 삭제된 시나리오를 편집 중이었다면 해제한다.
    pub fn on_deleted(&mut self, id: i64) {
        if self.is_editing(id) {
            self.editing = None;
        }
    }

    /// 편집 버퍼를 지정한 상태로 저장소에 보낸다.
    ///
    /// 실패해도 로컬 상태는 바뀌지 않는다.
    pub async fn save(&mut self, store: &SharedStore, mode: SaveMode) -> Result<Scenario, EditorError> {
        let payload = self.save_payload(mode)?;
        store.save(&payload).await?;
        info!(scenario_id = payload.id, status = payload.status.as_str(), "시나리오 저장");
        self.on_saved(&payload);
        Ok(payload)
    }

    /// 저장소에 삭제를 요청하고 성공 시 편집 대상을 정리한다.
    pub async fn delete(&mut self, store: &SharedStore, id: i64) -> Result<(), EditorError> {
        store.delete(id).await?;
        info!(scenario_id = id, "시나리오 삭제");
        self.on_deleted(id);
        Ok(())
    }

    /// 저장소에서 목록을 다시 읽는다.
    pub async fn reload(&mut self, store: &SharedStore) -> Result<(), EditorError> {
        let scenarios = store.list().await?;
        self.replace_scenarios(scenarios);
        Ok(())
    }
}
