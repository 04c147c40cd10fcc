use std::{
    fs::{self, File},
    io::{self, BufWriter, StdoutLock, Write as _},
    path::Path,
};

use anyhow::Context;
use evonet_env::{CartPoleConfig, StepLimit};

/// Destination of a JSON document: a file when a path is given, stdout otherwise.
#[derive(Debug)]
pub enum Output {
    Stdout(StdoutLock<'static>),
    File(BufWriter<File>),
}

impl Output {
    pub fn save_json<T>(value: &T, path: Option<&Path>) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let target = path.map_or_else(|| "stdout".to_owned(), |p| p.display().to_string());
        let mut output = match path {
            Some(path) => Self::create(path)?,
            None => Self::Stdout(io::stdout().lock()),
        };
        serde_json::to_writer_pretty(&mut output, value)
            .with_context(|| format!("Failed to write JSON to {target}"))?;
        writeln!(output)
            .and_then(|()| output.flush())
            .with_context(|| format!("Failed to flush output to {target}"))
    }

    fn create(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Self::File(BufWriter::new(file)))
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Stdout(writer) => writer.write(buf),
            Self::File(writer) => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Stdout(writer) => writer.flush(),
            Self::File(writer) => writer.flush(),
        }
    }
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {file_kind} file: {}", path.display()))?;
    serde_json::from_reader(io::BufReader::new(file))
        .with_context(|| format!("Failed to parse {file_kind} file: {}", path.display()))
}

/// Cart-pole configuration with the per-episode cap taken from the command line.
pub fn cart_pole_config(episode_limit: StepLimit) -> CartPoleConfig {
    CartPoleConfig {
        max_episode_steps: match episode_limit {
            StepLimit::Limited(n) => Some(n),
            StepLimit::Unbounded => None,
        },
        ..CartPoleConfig::default()
    }
}

/// Picks the run seed: the one given on the command line, or a fresh random one.
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(rand::random)
}

/// Derives the seed of the environment an agent plays on in a given generation.
///
/// Every (generation, agent) pair gets a distinct stream, and the same run seed
/// reproduces the same streams.
pub fn episode_seed(run_seed: u64, generation: usize, index: usize) -> u64 {
    let generation = generation as u64;
    let index = index as u64;
    run_seed ^ generation.rotate_left(32) ^ index.wrapping_mul(0x9e37_79b9_7f4a_7c15)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_episode_seeds_differ_per_generation_and_agent() {
        let seeds = (0..10)
            .flat_map(|generation| (0..20).map(move |index| episode_seed(42, generation, index)))
            .collect::<HashSet<_>>();
        assert_eq!(seeds.len(), 200);
        assert_eq!(episode_seed(42, 3, 4), episode_seed(42, 3, 4));
        assert_ne!(episode_seed(42, 3, 4), episode_seed(43, 3, 4));
    }

    #[test]
    fn test_saved_json_reads_back() {
        let dir = std::env::temp_dir().join(format!("evonet-util-{}", std::process::id()));
        let path = dir.join("nested").join("limits.json");
        let limits = vec![StepLimit::Limited(200), StepLimit::Unbounded];

        Output::save_json(&limits, Some(&path)).unwrap();
        let loaded: Vec<StepLimit> = read_json_file("limits", &path).unwrap();
        assert_eq!(loaded, limits);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file_names_its_kind() {
        let err = read_json_file::<StepLimit, _>("model", "/nonexistent/evonet/model.json")
            .unwrap_err();
        assert!(err.to_string().contains("model file"));
    }

    #[test]
    fn test_explicit_seed_is_kept() {
        assert_eq!(resolve_seed(Some(9)), 9);
    }

    #[test]
    fn test_episode_limit_maps_to_cart_pole_cap() {
        assert_eq!(
            cart_pole_config(StepLimit::Limited(200)).max_episode_steps,
            Some(200)
        );
        assert_eq!(cart_pole_config(StepLimit::Unbounded).max_episode_steps, None);
    }
}
