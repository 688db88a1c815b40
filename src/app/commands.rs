use crate::scenario::{StepKind, UnknownStepKind};
use std::path::PathBuf;

/// 콘솔에서 입력 가능한 명령이다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 시나리오 목록 출력.
    List,
    /// 새 시나리오 생성.
    New,
    /// 목록의 시나리오 편집 시작.
    Open(i64),
    /// YAML 파일을 편집 대상으로 불러오기.
    Load(PathBuf),
    /// 편집 중인 시나리오를 YAML 파일로 내보내기.
    Export(PathBuf),
    /// 편집 종료.
    Close,
    /// 이름 변경.
    Name(String),
    /// 설명 변경.
    Desc(String),
    /// Step 추가.
    Add(StepKind),
    /// 활성 Step 선택.
    Step(String),
    /// Step 내용 변경.
    Set { step_id: String, content: String },
    /// Step 제거.
    Rm(String),
    /// 초안으로 저장.
    Save,
    /// 활성화하여 저장.
    Activate,
    /// 시나리오 삭제.
    Delete(i64),
    /// 저장소에서 목록 다시 읽기.
    Reload,
    /// 편집 중인 시나리오 출력.
    Show,
    /// 도움말.
    Help,
    /// 종료.
    Quit,
}

/// 명령 해석 오류이다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// 빈 입력.
    #[error("명령이 비어 있습니다.")]
    Empty,
    /// 알 수 없는 명령.
    #[error("알 수 없는 명령입니다: {0} (help 참고)")]
    Unknown(String),
    /// 인자가 부족하다.
    #[error("{command} 명령에는 {expected} 인자가 필요합니다.")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },
    /// 시나리오 ID가 숫자가 아니다.
    #[error("시나리오 ID는 숫자여야 합니다: {0}")]
    InvalidId(String),
    /// Step 유형을 알 수 없다.
    #[error(transparent)]
    Kind(#[from] UnknownStepKind),
}

/// 도움말 문구이다.
pub const HELP: &str = "\
list                  시나리오 목록
new                   새 시나리오
open <id>             시나리오 편집
load <path>           YAML 파일 불러오기
export <path>         편집 중인 시나리오를 YAML로 내보내기
close                 편집 종료
name <text>           이름 변경
desc <text>           설명 변경
add <kind>            Step 추가 (greeting|question|objection|closing|custom)
step <step-id>        Step 선택
set <step-id> <text>  Step 내용 변경
rm <step-id>          Step 제거
save                  초안으로 저장
activate              활성화
delete <id>           시나리오 삭제
reload                목록 새로고침
show                  편집 중인 시나리오 보기
quit                  종료";

fn split_head(line: &str) -> (&str, &str) {
    match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    }
}

fn required<'a>(
    rest: &'a str,
    command: &'static str,
    expected: &'static str,
) -> Result<&'a str, CommandError> {
    if rest.is_empty() {
        Err(CommandError::MissingArgument { command, expected })
    } else {
        Ok(rest)
    }
}

fn parse_id(raw: &str) -> Result<i64, CommandError> {
    raw.parse()
        .map_err(|_| CommandError::InvalidId(raw.to_string()))
}

/// 한 줄 입력을 명령으로 해석한다.
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(CommandError::Empty);
    }
    let (head, rest) = split_head(line);
    let command = match head.to_ascii_lowercase().as_str() {
        "list" | "ls" => Command::List,
        "new" => Command::New,
        "open" => Command::Open(parse_id(required(rest, "open", "<id>")?)?),
        "load" => Command::Load(PathBuf::from(required(rest, "load", "<path>")?)),
        "export" => Command::Export(PathBuf::from(required(rest, "export", "<path>")?)),
        "close" => Command::Close,
        // 이름과 설명은 비워 둘 수 있다.
        "name" => Command::Name(rest.to_string()),
        "desc" => Command::Desc(rest.to_string()),
        "add" => Command::Add(required(rest, "add", "<kind>")?.parse()?),
        "step" => Command::Step(required(rest, "step", "<step-id>")?.to_string()),
        "set" => {
            let (step_id, content) = split_head(required(rest, "set", "<step-id> <text>")?);
            Command::Set {
                step_id: step_id.to_string(),
                content: content.to_string(),
            }
        }
        "rm" => Command::Rm(required(rest, "rm", "<step-id>")?.to_string()),
        "save" => Command::Save,
        "activate" => Command::Activate,
        "delete" => Command::Delete(parse_id(required(rest, "delete", "<id>")?)?),
        "reload" => Command::Reload,
        "show" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(command)
}
