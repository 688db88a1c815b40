use chrono::{Local, Utc};

/// 생성 시각(밀리초) 기반 ID를 단조 증가하도록 발급한다.
///
/// 같은 밀리초 안에서 여러 번 호출되어도 직전 값보다 큰 값을 돌려준다.
#[derive(Debug, Clone, Default)]
pub struct IdClock {
    /// 마지막으로 발급한 값.
    last: i64,
}

impl IdClock {
    /// 새 발급기를 생성한다.
    pub fn new() -> Self {
        Self { last: 0 }
    }

    /// 현재 시각 이후의 고유한 밀리초 값을 반환한다.
    pub fn next_millis(&mut self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let value = now.max(self.last + 1);
        self.last = value;
        value
    }
}

/// 표시용 생성일 문자열(`DD.MM.YYYY`)을 반환한다.
pub fn today_label() -> String {
    Local::now().format("%d.%m.%Y").to_string()
}
