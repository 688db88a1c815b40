use std::collections::HashSet;

use super::clock::IdClock;
use crate::scenario::{Scenario, Step, StepKind};

/// 편집 중인 시나리오 한 개의 버퍼와 활성 Step 선택을 보관한다.
///
/// 버퍼는 목록 항목의 복사본이며 저장 전까지 목록에 반영되지 않는다.
#[derive(Debug, Clone)]
pub struct ScenarioEditorState {
    /// 편집 대상 시나리오 복사본.
    pub scenario: Scenario,
    /// 활성 Step ID.
    pub selected_step_id: Option<String>,
    /// 마지막 저장 요청 이후 변경 여부.
    pub dirty: bool,
    /// Step ID 발급기.
    clock: IdClock,
}

impl ScenarioEditorState {
    /// 새로 생성된 시나리오를 편집 대상으로 삼고 시드 Step을 선택한다.
    pub fn new(scenario: Scenario) -> Self {
        let mut state = Self::open(scenario);
        state.dirty = true;
        state
    }

    /// 기존 시나리오 복사본을 편집 대상으로 삼고 첫 Step을 선택한다.
    pub fn open(scenario: Scenario) -> Self {
        let selected_step_id = scenario.steps.first().map(|step| step.id.clone());
        Self {
            scenario,
            selected_step_id,
            dirty: false,
            clock: IdClock::new(),
        }
    }

    /// 편집 중인 시나리오 ID를 반환한다.
    pub fn scenario_id(&self) -> i64 {
        self.scenario.id
    }

    /// 고유한 Step ID를 생성한다.
    pub fn generate_step_id(&mut self) -> String {
        let ids: HashSet<&str> = self.scenario.steps.iter().map(|s| s.id.as_str()).collect();
        loop {
            let candidate = format!("step-{}", self.clock.next_millis());
            if !ids.contains(candidate.as_str()) {
                return candidate;
            }
        }
    }

    /// 지정한 유형의 빈 Step을 끝에 추가하고 선택한다.
    pub fn add_step(&mut self, kind: StepKind) -> String {
        let id = self.generate_step_id();
        self.scenario.steps.push(Step::new(id.clone(), kind));
        self.selected_step_id = Some(id.clone());
        self.dirty = true;
        id
    }

    /// Step 내용만 교체한다. 없는 ID는 무시한다.
    pub fn update_step_content(&mut self, id: &str, content: impl Into<String>) {
        if let Some(step) = self.scenario.step_mut(id) {
            step.content = content.into();
            self.dirty = true;
        }
    }

    /// 지정된 Step을 제거하고 선택을 해제한다.
    ///
    /// 어떤 Step을 지우든 선택은 항상 해제된다.
    pub fn remove_step(&mut self, id: &str) {
        let before = self.scenario.steps.len();
        self.scenario.steps.retain(|step| step.id != id);
        if self.scenario.steps.len() != before {
            self.dirty = true;
        }
        self.selected_step_id = None;
    }

    /// 존재하는 Step을 활성 Step으로 선택한다.
    pub fn select_step(&mut self, id: &str) {
        if self.scenario.step(id).is_some() {
            self.selected_step_id = Some(id.to_string());
        }
    }

    /// 활성 Step을 반환한다.
    pub fn selected_step(&self) -> Option<&Step> {
        self.selected_step_id
            .as_deref()
            .and_then(|id| self.scenario.step(id))
    }

    /// 시나리오 이름을 바꾼다.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.scenario.name = name.into();
        self.dirty = true;
    }

    /// 시나리오 설명을 바꾼다.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.scenario.description = description.into();
        self.dirty = true;
    }
}
