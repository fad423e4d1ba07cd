use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    allocator::FolderIdRange, errors::Error, plan::PlanLimits, planner::PlannerSettings, Result,
};

/// Typed configuration, read from the environment (and an optional `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    // Trigger surface
    pub telegram_bot_token: String,
    pub telegram_allowed_users: Vec<i64>,

    // Classifier
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_timeout: Duration,
    pub classifier_max_response_bytes: usize,

    // Folder limits
    pub folder_id_range: FolderIdRange,
    pub plan_limits: PlanLimits,
    pub personal_folder_title: String,
    pub bots_folder_title: String,

    // Transient artifacts
    pub artifact_dir: PathBuf,
    pub keep_artifacts: bool,

    // File-backed platform
    pub platform_snapshot_path: PathBuf,
    pub platform_folders_path: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the process environment in `load`).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);
        let parse_u64 = |key: &str| get(key).and_then(|s| s.trim().parse::<u64>().ok());
        let parse_usize = |key: &str| get(key).and_then(|s| s.trim().parse::<usize>().ok());
        let parse_i32 = |key: &str| get(key).and_then(|s| s.trim().parse::<i32>().ok());

        // Required env vars
        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        let telegram_allowed_users = parse_csv_i64(get("TELEGRAM_ALLOWED_USERS"));
        let gemini_api_key = get("GEMINI_API_KEY").unwrap_or_default();

        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }
        if telegram_allowed_users.is_empty() {
            return Err(Error::Config(
                "TELEGRAM_ALLOWED_USERS environment variable is required".to_string(),
            ));
        }
        if gemini_api_key.trim().is_empty() {
            return Err(Error::Config(
                "GEMINI_API_KEY environment variable is required".to_string(),
            ));
        }

        // Classifier
        let gemini_model = get("GEMINI_MODEL").unwrap_or_else(|| "gemini-2.0-flash".to_string());
        let gemini_timeout = Duration::from_secs(parse_u64("GEMINI_TIMEOUT_SECS").unwrap_or(120));
        let classifier_max_response_bytes =
            parse_usize("CLASSIFIER_MAX_RESPONSE_BYTES").unwrap_or(200_000);

        // Folder limits (Telegram accepts small ids; the original bot drew from 11..=99)
        let folder_id_range = FolderIdRange::new(
            parse_i32("FOLDER_ID_MIN").unwrap_or(11),
            parse_i32("FOLDER_ID_MAX").unwrap_or(99),
        )?;
        let defaults = PlanLimits::default();
        let plan_limits = PlanLimits {
            folder_title_max_chars: parse_usize("FOLDER_TITLE_MAX_CHARS")
                .unwrap_or(defaults.folder_title_max_chars)
                .max(1),
            topic_label_max_chars: parse_usize("TOPIC_LABEL_MAX_CHARS")
                .unwrap_or(defaults.topic_label_max_chars)
                .max(1),
            max_topics: parse_usize("MAX_TOPICS").unwrap_or(defaults.max_topics),
        };
        if plan_limits.max_topics + 2 > folder_id_range.size() {
            return Err(Error::Config(format!(
                "folder id range {}..={} cannot hold {} topic folders plus Personal and Bots",
                folder_id_range.min(),
                folder_id_range.max(),
                plan_limits.max_topics
            )));
        }

        let personal_folder_title =
            get("PERSONAL_FOLDER_TITLE").unwrap_or_else(|| "Personal".to_string());
        let bots_folder_title = get("BOTS_FOLDER_TITLE").unwrap_or_else(|| "Bots".to_string());

        // Transient artifacts
        let artifact_dir =
            PathBuf::from(get("ARTIFACT_DIR").unwrap_or_else(|| "/tmp/tgf-artifacts".to_string()));
        let keep_artifacts = get("KEEP_ARTIFACTS").map(|s| parse_bool(&s)).unwrap_or(false);

        // File-backed platform
        let platform_snapshot_path = PathBuf::from(
            get("PLATFORM_SNAPSHOT_PATH").unwrap_or_else(|| "dialogs.json".to_string()),
        );
        let platform_folders_path = PathBuf::from(
            get("PLATFORM_FOLDERS_PATH").unwrap_or_else(|| "folders.json".to_string()),
        );

        Ok(Self {
            telegram_bot_token,
            telegram_allowed_users,
            gemini_api_key,
            gemini_model,
            gemini_timeout,
            classifier_max_response_bytes,
            folder_id_range,
            plan_limits,
            personal_folder_title,
            bots_folder_title,
            artifact_dir,
            keep_artifacts,
            platform_snapshot_path,
            platform_folders_path,
        })
    }

    pub fn planner_settings(&self) -> PlannerSettings {
        PlannerSettings {
            limits: self.plan_limits,
            id_range: self.folder_id_range,
            personal_title: self.personal_folder_title.clone(),
            bots_title: self.bots_folder_title.clone(),
        }
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_csv_i64(v: Option<String>) -> Vec<i64> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i64>().ok())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
