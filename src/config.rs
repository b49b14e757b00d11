//! Run configuration and where its values come from.
//!
//! Layers, lowest precedence first: built-in defaults, a named preset, the
//! global config file, the project `.reeltty` file, in-script `@set` lines,
//! and finally invocation overrides. A key set by an invocation override
//! is pinned: later `@set` lines for it are ignored.
//!
//! Config files hold `key=value` lines; lines starting with `#` are
//! comments. Values use exactly the `@set` grammar.

use crate::compositor::DecorationOptions;
use crate::error::ConfigError;
use crate::options::{OptionKey, OptionValue};
use crate::script::Setting;
use crate::suggest::suggest;
use crate::terminal::TerminalSize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory under the platform config dir.
pub const CONFIG_DIR_NAME: &str = "reeltty";
/// Global config file name inside [`CONFIG_DIR_NAME`].
pub const GLOBAL_CONFIG_FILE: &str = "config";
/// Project config file, looked up next to the script.
pub const PROJECT_CONFIG_FILE: &str = ".reeltty";
pub const PRESET_EXTENSION: &str = "conf";

const FALLBACK_SHELL: &str = "/bin/sh";

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub cols: u16,
    pub rows: u16,
    /// Default pause after each key.
    pub delay: Duration,
    /// How long `@wait` polls before giving up.
    pub timeout: Duration,
    pub output_dir: PathBuf,
    pub shell: Option<String>,
    /// Keep the intermediate `.txt` of non-text captures.
    pub keep_raw: bool,
    pub decorations: DecorationOptions,
    overridden: BTreeSet<OptionKey>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            cols: 80,
            rows: 24,
            delay: Duration::from_millis(100),
            timeout: Duration::from_secs(30),
            output_dir: PathBuf::from("."),
            shell: None,
            keep_raw: false,
            decorations: DecorationOptions::default(),
            overridden: BTreeSet::new(),
        }
    }
}

impl RunConfig {
    /// Merge config files and invocation overrides.
    pub fn resolve(
        layers: &ConfigLayers,
        overrides: &[(OptionKey, OptionValue)],
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        for path in layers.files() {
            for (key, value) in parse_config_file(path)? {
                config.apply(key, &value);
            }
            tracing::debug!("loaded config {}", path.display());
        }
        for (key, value) in overrides {
            config.override_with(*key, value);
        }
        Ok(config)
    }

    /// Set a value unconditionally.
    pub fn apply(&mut self, key: OptionKey, value: &OptionValue) {
        let applied = match (key, value) {
            (OptionKey::Cols, OptionValue::Int(v)) => set(&mut self.cols, to_u16(*v)),
            (OptionKey::Rows, OptionValue::Int(v)) => set(&mut self.rows, to_u16(*v)),
            (OptionKey::Delay, OptionValue::Int(v)) => set(&mut self.delay, Duration::from_millis(*v)),
            (OptionKey::Timeout, OptionValue::Int(v)) => {
                set(&mut self.timeout, Duration::from_secs(*v))
            }
            (OptionKey::OutputDir, OptionValue::Text(v)) => {
                set(&mut self.output_dir, PathBuf::from(v))
            }
            (OptionKey::Shell, OptionValue::Text(v)) => set(&mut self.shell, Some(v.clone())),
            (OptionKey::KeepRaw, OptionValue::Flag(v)) => set(&mut self.keep_raw, *v),
            _ => apply_decoration(&mut self.decorations, key, value),
        };
        if !applied {
            tracing::debug!("ignoring {key} value of unexpected type: {value:?}");
        }
    }

    /// Apply an invocation override and pin the key.
    pub fn override_with(&mut self, key: OptionKey, value: &OptionValue) {
        self.apply(key, value);
        self.overridden.insert(key);
    }

    /// Apply an in-script `@set`. Returns `false` when the key is pinned by
    /// an invocation override.
    pub fn apply_setting(&mut self, setting: &Setting) -> bool {
        if self.is_overridden(setting.key) {
            tracing::debug!(
                "@set:{}:{} ignored; overridden on the command line",
                setting.key,
                setting.value
            );
            return false;
        }
        self.apply(setting.key, &setting.value);
        true
    }

    pub fn is_overridden(&self, key: OptionKey) -> bool {
        self.overridden.contains(&key)
    }

    /// Program to run when none is given: the `shell` option, then
    /// `$SHELL`, then `/bin/sh`.
    pub fn shell_program(&self) -> String {
        self.shell
            .clone()
            .or_else(|| std::env::var("SHELL").ok().filter(|s| !s.is_empty()))
            .unwrap_or_else(|| FALLBACK_SHELL.to_string())
    }

    pub fn terminal_size(&self) -> TerminalSize {
        TerminalSize {
            cols: self.cols,
            rows: self.rows,
        }
    }
}

fn set<T>(slot: &mut T, value: T) -> bool {
    *slot = value;
    true
}

fn to_u16(value: u64) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

fn to_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn apply_decoration(opts: &mut DecorationOptions, key: OptionKey, value: &OptionValue) -> bool {
    match (key, value) {
        (OptionKey::GifDelay, OptionValue::Int(v)) => set(&mut opts.frame_delay_ms, *v),
        (OptionKey::Speed, OptionValue::Decimal(v)) => set(&mut opts.speed, *v),
        (OptionKey::LoopOffset, OptionValue::Int(v)) => set(&mut opts.loop_offset_ms, *v),
        (OptionKey::WindowBar, OptionValue::Bar(style)) => set(&mut opts.window_bar, *style),
        (OptionKey::BarColor, OptionValue::Color(c)) => set(&mut opts.bar_color, Some(*c)),
        (OptionKey::BarHeight, OptionValue::Int(v)) => set(&mut opts.bar_height, to_u32(*v)),
        (OptionKey::BorderRadius, OptionValue::Int(v)) => set(&mut opts.border_radius, to_u32(*v)),
        (OptionKey::Margin, OptionValue::Int(v)) => set(&mut opts.margin, to_u32(*v)),
        (OptionKey::MarginColor, OptionValue::Color(c)) => set(&mut opts.margin_color, Some(*c)),
        (OptionKey::Padding, OptionValue::Int(v)) => set(&mut opts.padding, to_u32(*v)),
        (OptionKey::PaddingColor, OptionValue::Color(c)) => set(&mut opts.padding_color, Some(*c)),
        (OptionKey::Shadow, OptionValue::Flag(v)) => set(&mut opts.shadow.enabled, *v),
        (OptionKey::ShadowBlur, OptionValue::Int(v)) => set(&mut opts.shadow.blur, to_u32(*v)),
        (OptionKey::ShadowOffsetX, OptionValue::Signed(v)) => set(&mut opts.shadow.offset_x, *v),
        (OptionKey::ShadowOffsetY, OptionValue::Signed(v)) => set(&mut opts.shadow.offset_y, *v),
        (OptionKey::ShadowOpacity, OptionValue::Decimal(v)) => set(&mut opts.shadow.opacity, *v),
        (OptionKey::ShadowColor, OptionValue::Color(c)) => set(&mut opts.shadow.color, *c),
        (OptionKey::Theme, OptionValue::Theme(theme)) => set(&mut opts.theme, Some(*theme)),
        _ => false,
    }
}

/// Config files that exist for a run, lowest precedence first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayers {
    pub preset: Option<PathBuf>,
    pub global: Option<PathBuf>,
    pub project: Option<PathBuf>,
}

impl ConfigLayers {
    /// Find the preset, global and project config files.
    ///
    /// A missing global or project file is simply skipped; a named preset
    /// that does not exist is an error.
    pub fn discover(project_dir: &Path, preset: Option<&str>) -> Result<Self, ConfigError> {
        let root = dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME));
        Self::discover_in(root.as_deref(), project_dir, preset)
    }

    fn discover_in(
        config_root: Option<&Path>,
        project_dir: &Path,
        preset: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let preset = match preset {
            None => None,
            Some(name) => {
                let file = format!("{name}.{PRESET_EXTENSION}");
                let path = match config_root {
                    Some(root) => root.join("presets").join(file),
                    None => PathBuf::from(CONFIG_DIR_NAME).join("presets").join(file),
                };
                if !path.is_file() {
                    return Err(ConfigError::UnknownPreset {
                        name: name.to_string(),
                        path,
                    });
                }
                Some(path)
            }
        };
        let global = config_root
            .map(|root| root.join(GLOBAL_CONFIG_FILE))
            .filter(|path| path.is_file());
        let project = Some(project_dir.join(PROJECT_CONFIG_FILE)).filter(|path| path.is_file());
        Ok(Self {
            preset,
            global,
            project,
        })
    }

    pub fn files(&self) -> impl Iterator<Item = &Path> {
        [&self.preset, &self.global, &self.project]
            .into_iter()
            .filter_map(|path| path.as_deref())
    }
}

pub fn parse_config_file(path: &Path) -> Result<Vec<(OptionKey, OptionValue)>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config_str(&content, path)
}

/// Parse `key=value` lines. `path` is only used in error messages.
pub fn parse_config_str(
    content: &str,
    path: &Path,
) -> Result<Vec<(OptionKey, OptionValue)>, ConfigError> {
    let mut values = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let entry = parse_entry(line).map_err(|message| ConfigError::Invalid {
            path: path.to_path_buf(),
            line: idx + 1,
            message,
        })?;
        values.push(entry);
    }
    Ok(values)
}

/// Parse a `--set key=value` override.
pub fn parse_override(raw: &str) -> Result<(OptionKey, OptionValue), ConfigError> {
    parse_entry(raw).map_err(|message| ConfigError::InvalidOverride {
        raw: raw.to_string(),
        message,
    })
}

fn parse_entry(line: &str) -> Result<(OptionKey, OptionValue), String> {
    let (name, raw) = line
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{line}'"))?;
    let name = name.trim();
    let key = OptionKey::from_name(name).ok_or_else(|| {
        let known = OptionKey::ALL.iter().map(|k| k.name());
        match suggest(name, known) {
            Some(hint) => format!("unknown option '{name}' (did you mean '{hint}'?)"),
            None => format!("unknown option '{name}'"),
        }
    })?;
    let value = key.parse_value(raw)?;
    Ok((key, value))
}
