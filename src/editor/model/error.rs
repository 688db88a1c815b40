use crate::store::StoreError;

/// 에디터/빌더 작업 중 발생 가능한 오류를 표현한다.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// 편집 중인 시나리오가 없는 상태에서 편집 작업을 요청한 경우이다.
    #[error("편집 중인 시나리오가 없습니다.")]
    NoScenarioSelected,
    /// 목록에 없는 시나리오를 선택하려 한 경우이다.
    #[error("존재하지 않는 시나리오입니다: {0}")]
    UnknownScenario(i64),
    /// 저장소 호출이 실패한 경우이다.
    #[error(transparent)]
    Store(#[from] StoreError),
}
