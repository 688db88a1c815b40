use super::{ScenarioStore, StoreError};
use crate::scenario::Scenario;
use async_trait::async_trait;
use glob::{Pattern, glob};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// YamlDirStore는 디렉터리에 시나리오마다 YAML 파일 하나를 두는 구현이다.
#[derive(Debug, Clone)]
pub struct YamlDirStore {
    /// 시나리오 파일을 보관할 디렉터리.
    dir: PathBuf,
}

impl YamlDirStore {
    /// 지정한 디렉터리를 사용하는 저장소를 생성한다. 디렉터리는 첫 저장 때 만들어진다.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 시나리오 ID에 대응하는 파일 경로를 반환한다.
    fn path_for(&self, id: i64) -> PathBuf {
        self.dir.join(format!("scenario_{id}.yaml"))
    }

    /// 디렉터리 안의 시나리오 파일 목록을 찾는다.
    fn scenario_files(&self) -> Result<Vec<PathBuf>, StoreError> {
        let pattern = format!(
            "{}/scenario_*.yaml",
            Pattern::escape(&self.dir.to_string_lossy())
        );
        Ok(glob(&pattern)?.filter_map(Result::ok).collect())
    }
}

async fn read_scenario(path: &Path) -> Result<Scenario, StoreError> {
    let text = fs::read_to_string(path).await?;
    Ok(serde_yaml::from_str(&text)?)
}

#[async_trait]
impl ScenarioStore for YamlDirStore {
    /// ID(생성 시각) 오름차순으로 반환한다.
    async fn list(&self) -> Result<Vec<Scenario>, StoreError> {
        let mut scenarios = Vec::new();
        for path in self.scenario_files()? {
            scenarios.push(read_scenario(&path).await?);
        }
        scenarios.sort_by_key(|s| s.id);
        Ok(scenarios)
    }

    async fn save(&self, scenario: &Scenario) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).await?;
        let yaml = serde_yaml::to_string(scenario)?;
        let target = self.path_for(scenario.id);
        let tmp = target.with_extension("yaml.tmp");
        fs::write(&tmp, yaml).await?;
        fs::rename(&tmp, &target).await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(id)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
