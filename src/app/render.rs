use super::*;

/// 시나리오 목록을 출력 줄로 만든다. 편집 중인 항목에는 `*` 표시를 붙인다.
pub(super) fn list_lines(scenarios: &[Scenario], editing_id: Option<i64>) -> Vec<String> {
    if scenarios.is_empty() {
        return vec!["시나리오가 없습니다. new 로 첫 시나리오를 만드세요.".to_string()];
    }
    scenarios
        .iter()
        .map(|scenario| {
            let marker = if editing_id == Some(scenario.id) { '*' } else { ' ' };
            let description = if scenario.description.is_empty() {
                "설명 없음"
            } else {
                scenario.description.as_str()
            };
            format!(
                "{marker} {}  {}  - {}  ({})",
                scenario.id,
                scenario.name,
                description,
                scenario.summary()
            )
        })
        .collect()
}

/// 편집 중인 시나리오를 Step 순서대로 출력 줄로 만든다.
pub(super) fn editor_lines(state: &ScenarioEditorState) -> Vec<String> {
    let scenario = &state.scenario;
    let mut lines = vec![format!(
        "[편집] {} (id {}) · {}{}",
        scenario.name,
        scenario.id,
        scenario.status.label(),
        if state.dirty { " · 저장 안 됨" } else { "" }
    )];
    if !scenario.description.is_empty() {
        lines.push(format!("설명: {}", scenario.description));
    }
    if scenario.is_empty() {
        lines.push("Step을 추가하세요.".to_string());
        return lines;
    }
    for (index, step) in scenario.steps.iter().enumerate() {
        let cursor = if state.selected_step_id.as_deref() == Some(step.id.as_str()) {
            " ◀"
        } else {
            ""
        };
        lines.push(format!(
            "{:>3}. [{}] {}{cursor}",
            index + 1,
            step.kind.label(),
            step.id
        ));
        if !step.content.is_empty() {
            lines.push(format!("     {}", step.content));
        }
    }
    lines
}

impl ConsoleApp {
    /// 목록을 출력 버퍼에 적재한다.
    pub(super) fn render_list(&mut self) {
        let editing_id = self.builder.editing().map(|state| state.scenario_id());
        let lines = list_lines(self.builder.list(), editing_id);
        self.output.extend(lines);
    }

    /// 편집 화면을 출력 버퍼에 적재한다.
    pub(super) fn render_editor(&mut self) {
        let lines = match self.builder.editing() {
            Some(state) => editor_lines(state),
            None => vec!["편집할 시나리오를 선택하거나 새로 만드세요.".to_string()],
        };
        self.output.extend(lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::StepKind;

    #[test]
    fn empty_list_shows_hint() {
        let lines = list_lines(&[], None);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("new"));
    }

    #[test]
    fn list_marks_editing_entry() {
        let mut second = Scenario::new(2, "");
        second.description = "재방문 고객".into();
        let lines = list_lines(&[Scenario::new(1, ""), second], Some(2));
        assert!(lines[0].starts_with("  1"));
        assert!(lines[1].starts_with("* 2"));
        assert!(lines[1].contains("재방문 고객"));
        assert!(lines[1].contains("1 Step"));
    }

    #[test]
    fn editor_numbers_steps_and_marks_selection() {
        let mut state = ScenarioEditorState::new(Scenario::new(1, ""));
        let id = state.add_step(StepKind::Question);
        let lines = editor_lines(&state);
        assert!(lines[0].contains("저장 안 됨"));
        assert!(lines.iter().any(|l| l.contains("1. [인사] start") && !l.contains('◀')));
        assert!(lines.iter().any(|l| l.contains(&format!("2. [질문] {id} ◀"))));
    }

    #[test]
    fn editor_shows_empty_state() {
        let mut state = ScenarioEditorState::open(Scenario::new(1, ""));
        state.remove_step("start");
        let lines = editor_lines(&state);
        assert_eq!(lines.last().map(String::as_str), Some("Step을 추가하세요."));
    }
}
