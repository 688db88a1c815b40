mod commands;
mod events;
mod render;

use crate::builder::{SaveMode, ScenarioBuilder};
use crate::editor::{EditorError, ScenarioEditorState};
use crate::scenario::{Scenario, load_scenario_from_file, save_scenario_to_file};
use crate::store::SharedStore;
use anyhow::Context;
use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

pub use commands::{Command, CommandError, HELP, parse_command};
pub use events::StoreEvent;

/// 명령 처리 후 루프를 계속할지 여부이다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// 다음 입력을 기다린다.
    Continue,
    /// 루프를 종료한다.
    Quit,
}

/// 표준 입력으로 시나리오 빌더를 조작하는 콘솔 애플리케이션 상태이다.
pub struct ConsoleApp {
    /// 시나리오 목록과 편집 상태.
    builder: ScenarioBuilder,
    /// 시나리오 저장소.
    store: SharedStore,
    /// 백그라운드 작업 완료 이벤트 송신 채널.
    events_tx: UnboundedSender<StoreEvent>,
    /// 백그라운드 작업 완료 이벤트 수신 채널.
    events_rx: UnboundedReceiver<StoreEvent>,
    /// 저장/삭제 요청이 진행 중인 시나리오 ID.
    in_flight: HashSet<i64>,
    /// 마지막으로 보낸 목록 조회 요청 순번.
    reload_seq: u64,
    /// 마지막으로 반영한 목록 조회 순번. 이보다 오래된 응답은 버린다.
    applied_reload_seq: u64,
    /// 아직 출력하지 않은 줄.
    output: Vec<String>,
}

impl ConsoleApp {
    /// 저장소를 받아 빈 상태를 구성한다.
    pub fn new(store: SharedStore) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            builder: ScenarioBuilder::new(),
            store,
            events_tx,
            events_rx,
            in_flight: HashSet::new(),
            reload_seq: 0,
            applied_reload_seq: 0,
            output: Vec::new(),
        }
    }

    /// 표준 입력이 닫히거나 `quit`을 받을 때까지 명령을 처리한다.
    ///
    /// 저장소 작업은 백그라운드에서 돌고, 완료 이벤트는 입력을 기다리는 동안에도 반영된다.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        self.output.push(HELP.to_string());
        self.request_reload();
        loop {
            self.flush_output()?;
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line.context("표준 입력 읽기 실패")? else {
                        break;
                    };
                    if self.handle_line(&line) == Flow::Quit {
                        break;
                    }
                }
                Some(event) = self.events_rx.recv() => {
                    self.apply_event(event);
                    self.drain_events();
                }
            }
        }
        self.flush_output()?;
        Ok(())
    }

    fn flush_output(&mut self) -> anyhow::Result<()> {
        let mut stdout = std::io::stdout().lock();
        for line in self.output.drain(..) {
            writeln!(stdout, "{line}")?;
        }
        write!(stdout, "> ")?;
        stdout.flush()?;
        Ok(())
    }

    /// 한 줄 입력을 처리한다. 오류는 출력 버퍼에 적재된다.
    pub fn handle_line(&mut self, line: &str) -> Flow {
        let command = match parse_command(line) {
            Ok(command) => command,
            Err(CommandError::Empty) => return Flow::Continue,
            Err(err) => {
                self.output.push(err.to_string());
                return Flow::Continue;
            }
        };
        match self.execute(command) {
            Ok(flow) => flow,
            Err(err) => {
                self.output.push(err.to_string());
                Flow::Continue
            }
        }
    }

    fn editing_mut(&mut self) -> Result<&mut ScenarioEditorState, EditorError> {
        self.builder.editing_mut()
    }

    /// 해석된 명령을 실행한다.
    fn execute(&mut self, command: Command) -> Result<Flow, EditorError> {
        match command {
            Command::List => self.render_list(),
            Command::New => {
                self.builder.create_scenario();
                self.render_editor();
            }
            Command::Open(id) => {
                self.builder.select_scenario(id)?;
                self.render_editor();
            }
            Command::Load(path) => self.request_file_load(path),
            Command::Export(path) => self.request_file_export(path)?,
            Command::Close => self.builder.deselect(),
            Command::Name(name) => self.editing_mut()?.set_name(name),
            Command::Desc(description) => self.editing_mut()?.set_description(description),
            Command::Add(kind) => {
                let id = self.editing_mut()?.add_step(kind);
                self.output.push(format!("Step 추가: {id}"));
            }
            Command::Step(step_id) => {
                self.editing_mut()?.select_step(&step_id);
                self.render_editor();
            }
            Command::Set { step_id, content } => {
                self.editing_mut()?.update_step_content(&step_id, content)
            }
            Command::Rm(step_id) => {
                self.editing_mut()?.remove_step(&step_id);
                self.render_editor();
            }
            Command::Save => self.request_save(SaveMode::Draft)?,
            Command::Activate => self.request_save(SaveMode::Activate)?,
            Command::Delete(id) => self.request_delete(id),
            Command::Reload => self.request_reload(),
            Command::Show => self.render_editor(),
            Command::Help => self.output.push(HELP.to_string()),
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// 진행 중인 요청이 있으면 새 요청을 거절한다.
    fn reserve(&mut self, id: i64) -> bool {
        if self.in_flight.insert(id) {
            true
        } else {
            self.output
                .push(format!("시나리오 {id}에 대한 요청이 아직 처리 중입니다."));
            false
        }
    }

    /// 편집 버퍼를 백그라운드에서 저장한다.
    fn request_save(&mut self, mode: SaveMode) -> Result<(), EditorError> {
        let payload = self.builder.save_payload(mode)?;
        if !self.reserve(payload.id) {
            return Ok(());
        }
        info!(scenario_id = payload.id, ?mode, "시나리오 저장 요청");
        let store = self.store.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = store.save(&payload).await.map_err(|err| err.to_string());
            let _ = tx.send(StoreEvent::Saved {
                payload,
                mode,
                result,
            });
        });
        Ok(())
    }

    /// 시나리오 삭제를 백그라운드에서 요청한다.
    fn request_delete(&mut self, id: i64) {
        if !self.reserve(id) {
            return;
        }
        info!(scenario_id = id, "시나리오 삭제 요청");
        let store = self.store.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = store.delete(id).await.map_err(|err| err.to_string());
            let _ = tx.send(StoreEvent::Deleted { id, result });
        });
    }

    /// 저장소 목록을 백그라운드에서 다시 읽는다. 요청마다 순번을 붙인다.
    fn request_reload(&mut self) {
        self.reload_seq += 1;
        let seq = self.reload_seq;
        let store = self.store.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = store.list().await.map_err(|err| err.to_string());
            let _ = tx.send(StoreEvent::Loaded { seq, result });
        });
    }

    /// YAML 파일을 백그라운드에서 읽어 편집 대상으로 연다.
    fn request_file_load(&mut self, path: PathBuf) {
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = load_scenario_from_file(&path)
                .await
                .map_err(|err| format!("{err:#}"));
            let _ = tx.send(StoreEvent::FileLoaded { path, result });
        });
    }

    /// 편집 버퍼를 상태 변경 없이 YAML 파일로 내보낸다.
    fn request_file_export(&mut self, path: PathBuf) -> Result<(), EditorError> {
        let scenario = self.editing_mut()?.scenario.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = save_scenario_to_file(&scenario, &path)
                .await
                .map_err(|err| format!("{err:#}"));
            let _ = tx.send(StoreEvent::FileExported { path, result });
        });
        Ok(())
    }

    /// 완료 이벤트를 상태에 반영한다.
    fn apply_event(&mut self, event: StoreEvent) {
        match event {
            StoreEvent::Loaded { seq, .. } if seq < self.applied_reload_seq => {
                debug!(seq, applied = self.applied_reload_seq, "오래된 목록 응답 무시");
            }
            StoreEvent::Loaded { seq, result } => {
                self.applied_reload_seq = seq;
                match result {
                    Ok(scenarios) => {
                        self.builder.replace_scenarios(scenarios);
                        self.render_list();
                    }
                    Err(err) => {
                        warn!(error = %err, "시나리오 목록 조회 실패");
                        self.output.push(format!("목록을 불러오지 못했습니다: {err}"));
                    }
                }
            }
            StoreEvent::FileLoaded { path, result } => match result {
                Ok(scenario) => {
                    info!(path = %path.display(), scenario_id = scenario.id, "시나리오 파일 로드");
                    self.builder.open_external(scenario);
                    self.render_editor();
                }
                Err(err) => self
                    .output
                    .push(format!("시나리오 파일을 읽을 수 없습니다: {err}")),
            },
            StoreEvent::FileExported { path, result } => match result {
                Ok(()) => self
                    .output
                    .push(format!("{} 로 내보내기 완료", path.display())),
                Err(err) => self.output.push(format!("내보내기 실패: {err}")),
            },
            StoreEvent::Saved {
                payload,
                mode,
                result,
            } => {
                self.in_flight.remove(&payload.id);
                match result {
                    Ok(()) => {
                        self.builder.on_saved(&payload);
                        let verb = match mode {
                            SaveMode::Draft => "저장",
                            SaveMode::Activate => "활성화",
                        };
                        self.output.push(format!("'{}' {verb} 완료", payload.name));
                        self.request_reload();
                    }
                    Err(err) => {
                        warn!(scenario_id = payload.id, error = %err, "시나리오 저장 실패");
                        self.output.push(format!("저장 실패: {err}"));
                    }
                }
            }
            StoreEvent::Deleted { id, result } => {
                self.in_flight.remove(&id);
                match result {
                    Ok(()) => {
                        self.builder.on_deleted(id);
                        self.output.push(format!("시나리오 {id} 삭제 완료"));
                        self.request_reload();
                    }
                    Err(err) => {
                        warn!(scenario_id = id, error = %err, "시나리오 삭제 실패");
                        self.output.push(format!("삭제 실패: {err}"));
                    }
                }
            }
        }
    }

    /// 이미 도착한 완료 이벤트를 모두 소비한다.
    fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{ScenarioStatus, StepKind};
    use crate::store::{MemoryStore, ScenarioStore, StoreError};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    /// 저장과 삭제가 항상 실패하는 저장소이다.
    struct BrokenStore;

    #[async_trait]
    impl ScenarioStore for BrokenStore {
        async fn list(&self) -> Result<Vec<Scenario>, StoreError> {
            Ok(Vec::new())
        }

        async fn save(&self, _scenario: &Scenario) -> Result<(), StoreError> {
            Err(StoreError::Remote("503".into()))
        }

        async fn delete(&self, _id: i64) -> Result<(), StoreError> {
            Err(StoreError::Remote("503".into()))
        }
    }

    /// 첫 `list()`만 스냅샷을 뜬 뒤 늦게 응답하는 저장소이다.
    struct SlowFirstListStore {
        /// 실제 데이터를 보관하는 저장소.
        inner: MemoryStore,
        /// 첫 조회가 이미 시작되었는지 여부.
        first_taken: AtomicBool,
    }

    #[async_trait]
    impl ScenarioStore for SlowFirstListStore {
        async fn list(&self) -> Result<Vec<Scenario>, StoreError> {
            let snapshot = self.inner.list().await?;
            if !self.first_taken.swap(true, Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
            Ok(snapshot)
        }

        async fn save(&self, scenario: &Scenario) -> Result<(), StoreError> {
            self.inner.save(scenario).await
        }

        async fn delete(&self, id: i64) -> Result<(), StoreError> {
            self.inner.delete(id).await
        }
    }

    fn temp_path(tag: &str) -> PathBuf {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("시스템 시간이 UTC epoch 이전입니다.")
            .as_nanos();
        std::env::temp_dir().join(format!("console_{tag}_{timestamp}.yaml"))
    }

    async fn next_event(app: &mut ConsoleApp) {
        let event = app.events_rx.recv().await.expect("이벤트 채널이 닫혔습니다.");
        app.apply_event(event);
    }

    fn editing_id(app: &ConsoleApp) -> i64 {
        app.builder.editing().expect("편집 대상").scenario_id()
    }

    #[tokio::test]
    async fn activate_persists_and_reloads_list() {
        let store = Arc::new(MemoryStore::new());
        let mut app = ConsoleApp::new(store.clone());

        app.handle_line("new");
        app.handle_line("name 콜드콜");
        app.handle_line("add question");
        app.handle_line("activate");
        next_event(&mut app).await;
        next_event(&mut app).await;

        let stored = store.list().await.expect("조회 실패");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, ScenarioStatus::Active);
        assert_eq!(stored[0].name, "콜드콜");
        assert_eq!(stored[0].steps[1].kind, StepKind::Question);
        assert_eq!(app.builder.list(), stored.as_slice());
        assert!(app.in_flight.is_empty());
    }

    #[tokio::test]
    async fn second_save_while_in_flight_is_refused() {
        let mut app = ConsoleApp::new(Arc::new(MemoryStore::new()));
        app.handle_line("new");
        app.handle_line("save");
        app.output.clear();

        app.handle_line("activate");

        assert!(app.output.iter().any(|line| line.contains("처리 중")));
        next_event(&mut app).await;
        assert!(app.in_flight.is_empty());
    }

    #[tokio::test]
    async fn delete_of_open_scenario_closes_editor_after_success() {
        let store = Arc::new(MemoryStore::with_scenarios(vec![Scenario::new(11, "")]));
        let mut app = ConsoleApp::new(store.clone());
        app.handle_line("reload");
        next_event(&mut app).await;
        app.handle_line("open 11");
        assert_eq!(editing_id(&app), 11);

        app.handle_line("delete 11");
        assert!(app.builder.editing().is_some());
        next_event(&mut app).await;

        assert!(app.builder.editing().is_none());
        assert!(store.list().await.expect("조회 실패").is_empty());
    }

    #[tokio::test]
    async fn failed_save_keeps_buffer_and_reports() {
        let mut app = ConsoleApp::new(Arc::new(BrokenStore));
        app.handle_line("new");
        app.handle_line("add closing");
        let before = app.builder.editing().expect("편집 대상").scenario.clone();

        app.handle_line("activate");
        next_event(&mut app).await;

        assert!(app.output.iter().any(|line| line.contains("저장 실패: 원격 저장소 오류: 503")));
        let state = app.builder.editing().expect("편집 대상");
        assert_eq!(state.scenario, before);
        assert_eq!(state.scenario.status, ScenarioStatus::Draft);
        assert!(app.in_flight.is_empty());
    }

    #[tokio::test]
    async fn editing_commands_need_a_selection() {
        let mut app = ConsoleApp::new(Arc::new(MemoryStore::new()));
        app.handle_line("add greeting");
        app.handle_line("save");
        assert_eq!(
            app.output,
            vec![
                EditorError::NoScenarioSelected.to_string(),
                EditorError::NoScenarioSelected.to_string()
            ]
        );
        assert_eq!(app.handle_line("quit"), Flow::Quit);
    }

    #[tokio::test]
    async fn step_commands_edit_the_buffer() {
        let mut app = ConsoleApp::new(Arc::new(MemoryStore::new()));
        app.handle_line("new");
        app.handle_line("add question");
        let question = app
            .builder
            .editing()
            .and_then(|state| state.selected_step_id.clone())
            .expect("추가한 Step이 선택되어야 한다");

        app.handle_line(&format!("set {question} How can I help?"));
        app.handle_line("set missing ignored");
        app.handle_line("step start");
        assert_eq!(
            app.builder.editing().and_then(|s| s.selected_step_id.as_deref()),
            Some("start")
        );

        app.handle_line(&format!("rm {question}"));
        let state = app.builder.editing().expect("편집 대상");
        assert_eq!(state.scenario.steps.len(), 1);
        assert!(state.selected_step_id.is_none());
    }

    #[tokio::test]
    async fn late_stale_reload_does_not_replace_newer_list() {
        let store = Arc::new(SlowFirstListStore {
            inner: MemoryStore::new(),
            first_taken: AtomicBool::new(false),
        });
        let mut app = ConsoleApp::new(store.clone());

        app.handle_line("reload");
        app.handle_line("new");
        app.handle_line("save");
        // 저장 완료, 저장 후 재조회, 늦게 도착한 첫 조회 순서로 도착한다.
        next_event(&mut app).await;
        next_event(&mut app).await;
        assert_eq!(app.builder.list().len(), 1);
        next_event(&mut app).await;

        let stored = store.list().await.expect("조회 실패");
        assert_eq!(stored.len(), 1);
        assert_eq!(app.builder.list(), stored.as_slice());
        assert_eq!(app.applied_reload_seq, app.reload_seq);
    }

    #[tokio::test]
    async fn export_then_load_reopens_the_same_buffer() {
        let path = temp_path("export");
        let mut app = ConsoleApp::new(Arc::new(MemoryStore::new()));
        app.handle_line("new");
        app.handle_line("name 재방문");
        app.handle_line("add objection");
        let exported = app.builder.editing().expect("편집 대상").scenario.clone();

        app.handle_line(&format!("export {}", path.display()));
        next_event(&mut app).await;
        app.handle_line("close");
        app.handle_line(&format!("load {}", path.display()));
        next_event(&mut app).await;

        let state = app.builder.editing().expect("불러온 시나리오가 열려야 한다");
        assert_eq!(state.scenario, exported);
        assert!(state.dirty);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn load_of_missing_file_reports_and_keeps_state() {
        let mut app = ConsoleApp::new(Arc::new(MemoryStore::new()));
        app.handle_line("load /nonexistent/avt/scenario.yaml");
        next_event(&mut app).await;

        assert!(app.builder.editing().is_none());
        assert!(
            app.output
                .iter()
                .any(|line| line.starts_with("시나리오 파일을 읽을 수 없습니다"))
        );
    }
}
