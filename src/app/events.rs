use crate::builder::SaveMode;
use crate::scenario::Scenario;
use std::path::PathBuf;

/// 백그라운드 작업이 콘솔 루프로 보내는 완료 이벤트이다.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// 목록 조회 완료. `seq`는 요청 순번이다.
    Loaded {
        seq: u64,
        result: Result<Vec<Scenario>, String>,
    },
    /// 저장 완료.
    Saved {
        payload: Scenario,
        mode: SaveMode,
        result: Result<(), String>,
    },
    /// 삭제 완료.
    Deleted { id: i64, result: Result<(), String> },
    /// YAML 파일 읽기 완료.
    FileLoaded {
        path: PathBuf,
        result: Result<Scenario, String>,
    },
    /// YAML 파일 쓰기 완료.
    FileExported {
        path: PathBuf,
        result: Result<(), String>,
    },
}
