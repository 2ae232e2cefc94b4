//! Per-run output directory: parameter dumps, the episode CSV and weight checkpoints.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::config::{AgentConfig, ArtifactConfig, RunConfig};
use crate::error::Result;
use crate::session::EpisodeSummary;

pub struct RunArtifacts {
    dir: PathBuf,
    episode_log: BufWriter<File>,
    num_agents: usize,
}

impl RunArtifacts {
    /// Create `<output_dir>/<prefix>_<timestamp>` and open the episode log inside it.
    pub fn create(config: &ArtifactConfig, num_agents: usize) -> Result<Self> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let dir = config.output_dir.join(format!("{}_{}", config.run_prefix, stamp));
        Self::create_in(dir, num_agents)
    }

    /// Use `dir` as the run directory, creating it if needed.
    pub fn create_in(dir: PathBuf, num_agents: usize) -> Result<Self> {
        fs::create_dir_all(&dir)?;
        let mut episode_log = BufWriter::new(File::create(dir.join("episodeData.csv"))?);
        writeln!(episode_log, "{}", Self::csv_header(num_agents))?;
        Ok(RunArtifacts {
            dir,
            episode_log,
            num_agents,
        })
    }

    fn csv_header(num_agents: usize) -> String {
        let mut columns = vec!["Episode".to_string(), "Frame".to_string()];
        columns.extend((1..=num_agents).map(|i| format!("A{} Epsilon", i)));
        columns.extend((1..=num_agents).map(|i| format!("A{} Episode Reward", i)));
        columns.join(", ")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Hyperparameter dump for agent `index` (zero based), with its current epsilon.
    pub fn write_agent_parameters(&self, index: usize, config: &AgentConfig, epsilon: f32) -> Result<PathBuf> {
        let path = self.dir.join(format!("a{}Parameters.txt", index + 1));
        let mut file = File::create(&path)?;
        writeln!(file, "Gamma: {}", config.gamma)?;
        writeln!(file, "Epsilon: {}", epsilon)?;
        writeln!(file, "Epsilon decay rate: {}", config.epsilon_decay)?;
        writeln!(file, "Epsilon min: {}", config.epsilon_min)?;
        writeln!(file, "Epsilon delay: {}", config.epsilon_delay)?;
        writeln!(file, "Learning rate: {}", config.learning_rate)?;
        writeln!(file, "Memory length: {}", config.memory_length)?;
        Ok(path)
    }

    /// Training parameter summary plus the full config as JSON.
    pub fn write_run_parameters(&self, config: &RunConfig) -> Result<()> {
        let mut file = File::create(self.dir.join("trainingParameters.txt"))?;
        writeln!(file, "Number of episodes: {}", config.session.num_episodes)?;
        writeln!(file, "State size: {}", config.agent.state_size)?;
        writeln!(file, "Action size: {}", config.agent.action_size)?;
        writeln!(file, "Replay size: {}", config.session.batch_size)?;
        writeln!(file, "Frame downsample factor: {}", config.session.downsample)?;
        writeln!(file, "Target update interval: {}", config.session.target_update_interval)?;

        fs::write(self.dir.join("config.json"), config.to_json()?)?;
        Ok(())
    }

    pub fn record_episode(&mut self, summary: &EpisodeSummary) -> Result<()> {
        let mut row = vec![summary.episode.to_string(), summary.frame.to_string()];
        row.extend(summary.epsilons.iter().map(|e| e.to_string()));
        row.extend(summary.rewards.iter().map(|r| r.to_string()));
        debug_assert_eq!(row.len(), 2 + 2 * self.num_agents);
        writeln!(self.episode_log, "{}", row.join(","))?;
        Ok(())
    }

    /// Checkpoint path for agent `index` (zero based) at the end of `episode`
    pub fn weight_path(&self, index: usize, episode: usize) -> PathBuf {
        self.dir.join(format!("a{}w_ep{}.bin", index + 1, episode))
    }

    pub fn flush(&mut self) -> Result<()> {
        self.episode_log.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_log_layout() {
        let root = tempfile::tempdir().unwrap();
        let mut artifacts = RunArtifacts::create_in(root.path().join("run"), 2).unwrap();
        artifacts
            .record_episode(&EpisodeSummary {
                episode: 1,
                frame: 57,
                epsilons: vec![1.0, 0.5],
                rewards: vec![-1.0, 2.0],
            })
            .unwrap();
        artifacts.flush().unwrap();

        let log = fs::read_to_string(artifacts.dir().join("episodeData.csv")).unwrap();
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(
            lines[0],
            "Episode, Frame, A1 Epsilon, A2 Epsilon, A1 Episode Reward, A2 Episode Reward"
        );
        assert_eq!(lines[1], "1,57,1,0.5,-1,2");
    }

    #[test]
    fn test_parameter_dumps() {
        let root = tempfile::tempdir().unwrap();
        let artifacts = RunArtifacts::create(
            &ArtifactConfig {
                output_dir: root.path().to_path_buf(),
                ..ArtifactConfig::default()
            },
            1,
        )
        .unwrap();
        assert!(artifacts.dir().file_name().unwrap().to_string_lossy().starts_with("pongData_"));

        let path = artifacts.write_agent_parameters(0, &AgentConfig::default(), 1.0).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("Gamma: 0.99"));
        assert!(text.contains("Memory length: 200000"));

        artifacts.write_run_parameters(&RunConfig::default()).unwrap();
        let json = fs::read_to_string(artifacts.dir().join("config.json")).unwrap();
        let parsed: RunConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, RunConfig::default());
        assert_eq!(artifacts.weight_path(1, 7).file_name().unwrap(), "a2w_ep7.bin");
    }
}
