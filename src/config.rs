use crate::store::{MemoryStore, SharedStore, YamlDirStore, new_http_store, new_pg_store};
use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// 설정 파일 경로를 지정하는 환경 변수이다.
pub const CONFIG_ENV: &str = "AVT_CONFIG";

/// 애플리케이션 전체 설정이다.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 시나리오 저장소 설정.
    #[serde(default)]
    pub store: StoreConfig,
}

/// 사용할 저장소 종류를 표현한다.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// 프로세스 메모리.
    #[default]
    Memory,
    /// 디렉터리 안의 YAML 파일.
    YamlDir,
    /// PostgreSQL 테이블.
    Postgres,
    /// 대시보드 CRM HTTP API.
    Http,
}

/// 시나리오 저장소 연결 정의이다. 문자열 값에는 `${VAR}` 환경 변수를 쓸 수 있다.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    /// 저장소 종류.
    #[serde(default)]
    pub kind: StoreKind,
    /// YAML 저장 디렉터리.
    pub dir: Option<String>,
    /// PostgreSQL DSN.
    pub dsn: Option<String>,
    /// 사용자명.
    pub user: Option<String>,
    /// 비밀번호.
    pub password: Option<String>,
    /// HTTP API 기본 URL.
    pub base_url: Option<String>,
}

/// `${VAR}` 패턴을 조회 함수 결과로 치환한다. 남은 패턴이 있으면 오류다.
pub fn expand_with(
    template: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<String> {
    static PLACEHOLDER: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\$\{([A-Z0-9_]+)\}").expect("정규식 컴파일 실패"));
    let result = PLACEHOLDER.replace_all(template, |caps: &regex::Captures| {
        let key = &caps[1];
        lookup(key).unwrap_or_else(|| format!("${{{key}}}"))
    });
    let result = result.to_string();
    if PLACEHOLDER.is_match(&result) {
        anyhow::bail!("플레이스홀더 치환 실패: {result}");
    }
    Ok(result)
}

/// 환경 변수로 `${VAR}`를 치환한다.
pub fn expand_env(template: &str) -> anyhow::Result<String> {
    expand_with(template, |key| std::env::var(key).ok())
}

fn expand_required(value: Option<&String>, field: &str) -> anyhow::Result<String> {
    let raw = value.ok_or_else(|| anyhow::anyhow!("store.{field} 값이 누락되었습니다."))?;
    expand_env(raw).with_context(|| format!("store.{field} 필드의 플레이스홀더를 치환할 수 없습니다."))
}

fn expand_optional(value: Option<&String>, field: &str) -> anyhow::Result<Option<String>> {
    value.map(|_| expand_required(value, field)).transpose()
}

/// YAML 파일을 읽어 AppConfig로 역직렬화한다.
pub fn load_config_from_file(path: &Path) -> anyhow::Result<AppConfig> {
    let mut file =
        File::open(path).with_context(|| format!("설정 파일 열기 실패: {}", path.display()))?;
    load_config_from_reader(&mut file)
}

/// Reader에서 YAML을 읽어 AppConfig로 파싱한다.
pub fn load_config_from_reader<R: Read>(reader: &mut R) -> anyhow::Result<AppConfig> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf)?;
    let config: AppConfig = serde_yaml::from_str(&buf).context("설정 YAML 파싱 실패")?;
    Ok(config)
}

/// 인자 또는 `AVT_CONFIG`가 가리키는 설정을 읽는다. 둘 다 없으면 기본값(메모리 저장소)이다.
pub fn load_app_config(arg: Option<String>) -> anyhow::Result<AppConfig> {
    match arg.or_else(|| std::env::var(CONFIG_ENV).ok()) {
        Some(path) => {
            info!(path = %path, "설정 파일 로드");
            load_config_from_file(Path::new(&path))
        }
        None => Ok(AppConfig::default()),
    }
}

/// 설정에 맞는 저장소를 구성한다.
///
/// # 매개변수
/// - `config`: 저장소 종류와 접속 정보. 문자열 값의 `${VAR}`는 환경 변수로 치환된다.
///
/// # 반환값
/// 구성된 저장소를 [`SharedStore`]로 감싸 반환한다. 필수 값이 없거나 치환에 실패하면 오류이다.
pub async fn build_store(config: &StoreConfig) -> anyhow::Result<SharedStore> {
    info!(kind = ?config.kind, "시나리오 저장소 구성");
    match config.kind {
        StoreKind::Memory => Ok(Arc::new(MemoryStore::new()) as SharedStore),
        StoreKind::YamlDir => {
            let dir = expand_required(config.dir.as_ref(), "dir")?;
            Ok(Arc::new(YamlDirStore::new(dir)) as SharedStore)
        }
        StoreKind::Postgres => {
            let dsn = expand_required(config.dsn.as_ref(), "dsn")?;
            let user = expand_optional(config.user.as_ref(), "user")?;
            let password = expand_optional(config.password.as_ref(), "password")?;
            new_pg_store(dsn, user, password).await
        }
        StoreKind::Http => {
            let base_url = expand_required(config.base_url.as_ref(), "base_url")?;
            Ok(new_http_store(base_url))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_store_section_defaults_to_memory() {
        let config = load_config_from_reader(&mut "{}".as_bytes()).expect("파싱 실패");
        assert_eq!(config.store.kind, StoreKind::Memory);
    }

    #[test]
    fn postgres_section_is_parsed() {
        let yaml = "store:\n  kind: postgres\n  dsn: ${DATABASE_URL}\n  user: crm\n";
        let config = load_config_from_reader(&mut yaml.as_bytes()).expect("파싱 실패");
        assert_eq!(config.store.kind, StoreKind::Postgres);
        assert_eq!(config.store.dsn.as_deref(), Some("${DATABASE_URL}"));
        assert!(config.store.password.is_none());
    }

    #[test]
    fn unknown_store_kind_is_rejected() {
        let yaml = "store:\n  kind: redis\n";
        assert!(load_config_from_reader(&mut yaml.as_bytes()).is_err());
    }

    #[test]
    fn placeholders_are_expanded_from_lookup() {
        let out = expand_with("postgres://${DB_HOST}:${DB_PORT}/crm", |key| match key {
            "DB_HOST" => Some("db".into()),
            "DB_PORT" => Some("5432".into()),
            _ => None,
        })
        .expect("치환 실패");
        assert_eq!(out, "postgres://db:5432/crm");
    }

    #[test]
    fn unresolved_placeholder_is_an_error() {
        assert!(expand_with("${NOPE}", |_| None).is_err());
        assert_eq!(expand_with("plain", |_| None).expect("치환 실패"), "plain");
    }

    #[tokio::test]
    async fn yaml_dir_store_requires_dir() {
        let config = StoreConfig {
            kind: StoreKind::YamlDir,
            ..Default::default()
        };
        assert!(build_store(&config).await.is_err());
    }

    #[tokio::test]
    async fn memory_store_is_built_without_settings() {
        let store = build_store(&StoreConfig::default()).await.expect("구성 실패");
        assert!(store.list().await.expect("조회 실패").is_empty());
    }
}
