use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// 새 시나리오를 만들 때 사용하는 기본 이름이다.
pub const DEFAULT_SCENARIO_NAME: &str = "새 시나리오";

/// 시드 Step의 고정 ID이다.
pub const SEED_STEP_ID: &str = "start";

/// 시드 인사 Step에 채워지는 기본 문구이다.
pub const SEED_GREETING: &str = "안녕하세요! 저는 AI 어시스턴트입니다...";

/// 대화 Step의 유형을 표현한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// 인사 Step.
    Greeting,
    /// 질문 Step.
    Question,
    /// 반론 대응 Step.
    Objection,
    /// 마무리 Step.
    Closing,
    /// 자유 형식 Step.
    Custom,
}

impl StepKind {
    /// 지원하는 모든 유형을 팔레트 순서대로 반환한다.
    pub const ALL: [StepKind; 5] = [
        StepKind::Greeting,
        StepKind::Question,
        StepKind::Objection,
        StepKind::Closing,
        StepKind::Custom,
    ];

    /// 직렬화에 쓰이는 식별 문자열을 반환한다.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Greeting => "greeting",
            StepKind::Question => "question",
            StepKind::Objection => "objection",
            StepKind::Closing => "closing",
            StepKind::Custom => "custom",
        }
    }

    /// 화면 표시용 이름을 반환한다.
    pub fn label(&self) -> &'static str {
        match self {
            StepKind::Greeting => "인사",
            StepKind::Question => "질문",
            StepKind::Objection => "반론 대응",
            StepKind::Closing => "마무리",
            StepKind::Custom => "사용자 정의",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 알 수 없는 Step 유형 문자열을 만났을 때의 오류이다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("알 수 없는 Step 유형입니다: {0}")]
pub struct UnknownStepKind(pub String);

impl FromStr for StepKind {
    type Err = UnknownStepKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StepKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownStepKind(s.to_string()))
    }
}

/// 시나리오의 저장 상태이다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    /// 초안. AI 통화에 사용되지 않는다.
    #[default]
    Draft,
    /// 활성. 실제 통화에 사용할 수 있다.
    Active,
}

impl ScenarioStatus {
    /// 직렬화에 쓰이는 식별 문자열을 반환한다.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioStatus::Draft => "draft",
            ScenarioStatus::Active => "active",
        }
    }

    /// 목록 배지에 표시할 이름이다.
    pub fn label(&self) -> &'static str {
        match self {
            ScenarioStatus::Draft => "초안",
            ScenarioStatus::Active => "활성",
        }
    }
}

/// 알 수 없는 시나리오 상태 문자열을 만났을 때의 오류이다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("알 수 없는 시나리오 상태입니다: {0}")]
pub struct UnknownScenarioStatus(pub String);

impl FromStr for ScenarioStatus {
    type Err = UnknownScenarioStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ScenarioStatus::Draft),
            "active" => Ok(ScenarioStatus::Active),
            other => Err(UnknownScenarioStatus(other.to_string())),
        }
    }
}

/// 조건부 분기 메타데이터이다. 저장 시 그대로 보존될 뿐 해석되지 않는다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepBranch {
    /// 분기 조건 문구.
    pub condition: String,
    /// 이동할 Step ID.
    pub next_step: String,
}

/// Scenario 안의 대화 단위이다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// 고유 Step ID.
    pub id: String,
    /// 생성 시 고정되는 Step 유형.
    #[serde(rename = "type")]
    pub kind: StepKind,
    /// 발화 문구.
    #[serde(default)]
    pub content: String,
    /// 다음 Step 참조.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_step: Option<String>,
    /// 조건부 분기 목록.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<StepBranch>,
}

impl Step {
    /// 내용이 비어 있는 Step을 생성한다.
    pub fn new(id: impl Into<String>, kind: StepKind) -> Self {
        Self {
            id: id.into(),
            kind,
            content: String::new(),
            next_step: None,
            branches: Vec::new(),
        }
    }

    /// 새 시나리오에 들어가는 시드 인사 Step이다.
    pub fn seed() -> Self {
        Self {
            content: SEED_GREETING.to_string(),
            ..Self::new(SEED_STEP_ID, StepKind::Greeting)
        }
    }
}

/// AI 통화 흐름 하나를 표현하는 Step 순서 목록이다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// 생성 시각(밀리초) 기반 ID.
    pub id: i64,
    /// 표시 이름.
    pub name: String,
    /// 설명.
    #[serde(default)]
    pub description: String,
    /// 실행 순서대로 정렬된 Step 목록.
    #[serde(default)]
    pub steps: Vec<Step>,
    /// 저장 상태.
    #[serde(default)]
    pub status: ScenarioStatus,
    /// 생성일(표시용).
    #[serde(default)]
    pub created: String,
}

impl Scenario {
    /// 시드 인사 Step 하나를 가진 초안 시나리오를 생성한다.
    pub fn new(id: i64, created: impl Into<String>) -> Self {
        Self {
            id,
            name: DEFAULT_SCENARIO_NAME.to_string(),
            description: String::new(),
            steps: vec![Step::seed()],
            status: ScenarioStatus::Draft,
            created: created.into(),
        }
    }

    /// ID로 Step을 조회한다.
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|step| step.id == id)
    }

    /// ID로 Step을 조회한다.
    pub fn step_mut(&mut self, id: &str) -> Option<&mut Step> {
        self.steps.iter_mut().find(|step| step.id == id)
    }

    /// 전체 Step 수를 반환한다.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Step 수가 비었는지 여부를 확인한다.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// 목록에 표시할 한 줄 요약이다.
    pub fn summary(&self) -> String {
        format!("{} Step · {}", self.len(), self.status.label())
    }
}

/// YAML 파일을 읽어 Scenario로 역직렬화한다.
///
/// # 매개변수
/// - `path`: 읽을 YAML 파일 경로.
///
/// # 반환값
/// 파싱된 [`Scenario`]를 담은 [`anyhow::Result`]를 반환한다.
pub async fn load_scenario_from_file(path: &Path) -> anyhow::Result<Scenario> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("시나리오 파일 읽기 실패: {}", path.display()))?;
    load_scenario_from_reader(&mut text.as_bytes())
}

/// Scenario를 YAML 파일로 기록한다. 같은 경로의 파일은 덮어쓴다.
///
/// # 매개변수
/// - `scenario`: 기록할 시나리오.
/// - `path`: 대상 YAML 파일 경로.
pub async fn save_scenario_to_file(scenario: &Scenario, path: &Path) -> anyhow::Result<()> {
    let yaml = serde_yaml::to_string(scenario)?;
    tokio::fs::write(path, yaml)
        .await
        .with_context(|| format!("시나리오 파일 쓰기 실패: {}", path.display()))?;
    Ok(())
}

/// Reader에서 YAML을 읽어 Scenario 구조체로 파싱한다.
pub fn load_scenario_from_reader<R: Read>(reader: &mut R) -> anyhow::Result<Scenario> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf)?;
    let scenario: Scenario = serde_yaml::from_str(&buf)?;
    Ok(scenario)
}
