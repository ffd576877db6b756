/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub grid: GridConfig,
    pub timing: TimingConfig,
    pub rules: RulesConfig,
    pub gamepad: GamepadConfig,
    pub seed: Option<u64>,
    pub log_file: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct GridConfig {
    pub rows: usize,
    pub cols: usize,
    pub treasures: usize,
    pub wall_density: f64,   // fraction of each row that becomes wall
    pub safe_block: usize,   // side of the never-walled square at the origin
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub frame_ms: u64,
    pub enemy_tick_ms: u64,
    pub curse_delay_ms: u64,
}

#[derive(Clone, Debug)]
pub struct RulesConfig {
    pub curse_probability: f64,
    pub win_policy: WinPolicy,
}

/// When does the player win?
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinPolicy {
    /// Win the moment the collected count reaches the goal.
    AllCollected,
    /// Win once collected + cursed reach the goal and no treasure is left.
    AllResolved,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub restart: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    grid: TomlGrid,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlGrid {
    #[serde(default = "default_rows")]
    rows: usize,
    #[serde(default = "default_cols")]
    cols: usize,
    #[serde(default = "default_treasures")]
    treasures: usize,
    #[serde(default = "default_wall_density")]
    wall_density: f64,
    #[serde(default = "default_safe_block")]
    safe_block: usize,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
    #[serde(default = "default_enemy_tick")]
    enemy_tick_ms: u64,
    #[serde(default = "default_curse_delay")]
    curse_delay_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_curse_probability")]
    curse_probability: f64,
    #[serde(default = "default_win_policy")]
    win_policy: WinPolicy,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_restart")]
    restart: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
struct TomlGeneral {
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    log_file: Option<String>,
}

// ── Defaults ──

fn default_rows() -> usize { 8 }
fn default_cols() -> usize { 12 }
fn default_treasures() -> usize { 10 }
fn default_wall_density() -> f64 { 0.3 }
fn default_safe_block() -> usize { 2 }

fn default_frame_ms() -> u64 { 16 }
fn default_enemy_tick() -> u64 { 350 }
fn default_curse_delay() -> u64 { 800 }

fn default_curse_probability() -> f64 { 0.8 }
fn default_win_policy() -> WinPolicy { WinPolicy::AllResolved }

fn default_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }
fn default_restart() -> Vec<String> { vec!["Start".into()] }

impl Default for TomlGrid {
    fn default() -> Self {
        TomlGrid {
            rows: default_rows(),
            cols: default_cols(),
            treasures: default_treasures(),
            wall_density: default_wall_density(),
            safe_block: default_safe_block(),
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            frame_ms: default_frame_ms(),
            enemy_tick_ms: default_enemy_tick(),
            curse_delay_ms: default_curse_delay(),
        }
    }
}

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules {
            curse_probability: default_curse_probability(),
            win_policy: default_win_policy(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            cancel: default_cancel(),
            restart: default_restart(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default())
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let mut cfg = GameConfig::from_toml(load_toml(&search_dirs));
        for warning in cfg.clamp() {
            eprintln!("Warning: {warning}");
        }
        cfg
    }

    /// Parse a config document. Missing keys take their defaults.
    #[cfg(test)]
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<TomlConfig>(text).map(GameConfig::from_toml)
    }

    fn from_toml(t: TomlConfig) -> Self {
        GameConfig {
            grid: GridConfig {
                rows: t.grid.rows,
                cols: t.grid.cols,
                treasures: t.grid.treasures,
                wall_density: t.grid.wall_density,
                safe_block: t.grid.safe_block,
            },
            timing: TimingConfig {
                frame_ms: t.timing.frame_ms,
                enemy_tick_ms: t.timing.enemy_tick_ms,
                curse_delay_ms: t.timing.curse_delay_ms,
            },
            rules: RulesConfig {
                curse_probability: t.rules.curse_probability,
                win_policy: t.rules.win_policy,
            },
            gamepad: GamepadConfig {
                confirm: t.gamepad.confirm,
                cancel: t.gamepad.cancel,
                restart: t.gamepad.restart,
            },
            seed: t.general.seed,
            log_file: t.general.log_file.map(PathBuf::from),
        }
    }

    /// Pull out-of-range values back into range. Returns one message per fix.
    pub fn clamp(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();
        let g = &mut self.grid;

        if g.rows < 2 {
            warnings.push(format!("grid.rows = {} is too small, using 2", g.rows));
            g.rows = 2;
        }
        if g.cols < 2 {
            warnings.push(format!("grid.cols = {} is too small, using 2", g.cols));
            g.cols = 2;
        }
        if g.treasures == 0 {
            warnings.push("grid.treasures = 0, using 1".to_string());
            g.treasures = 1;
        }
        if !(0.0..=1.0).contains(&g.wall_density) {
            let fixed = if g.wall_density.is_nan() { default_wall_density() } else { g.wall_density.clamp(0.0, 1.0) };
            warnings.push(format!("grid.wall_density = {} out of [0, 1], using {fixed}", g.wall_density));
            g.wall_density = fixed;
        }
        let max_block = g.rows.min(g.cols);
        if g.safe_block == 0 || g.safe_block > max_block {
            let fixed = g.safe_block.clamp(1, max_block);
            warnings.push(format!("grid.safe_block = {} out of [1, {max_block}], using {fixed}", g.safe_block));
            g.safe_block = fixed;
        }

        let r = &mut self.rules;
        if !(0.0..=1.0).contains(&r.curse_probability) {
            let fixed = if r.curse_probability.is_nan() { default_curse_probability() } else { r.curse_probability.clamp(0.0, 1.0) };
            warnings.push(format!("rules.curse_probability = {} out of [0, 1], using {fixed}", r.curse_probability));
            r.curse_probability = fixed;
        }

        if self.timing.frame_ms == 0 {
            warnings.push("timing.frame_ms = 0, using 1".to_string());
            self.timing.frame_ms = 1;
        }
        if self.timing.enemy_tick_ms == 0 {
            warnings.push("timing.enemy_tick_ms = 0, using 1".to_string());
            self.timing.enemy_tick_ms = 1;
        }

        warnings
    }
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/cursed-vault");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory
    let sys = PathBuf::from("/usr/share/cursed-vault");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_board() {
        let cfg = GameConfig::default();
        assert_eq!((cfg.grid.rows, cfg.grid.cols), (8, 12));
        assert_eq!(cfg.grid.treasures, 10);
        assert_eq!(cfg.grid.safe_block, 2);
        assert!((cfg.grid.wall_density - 0.3).abs() < 1e-9);
        assert_eq!(cfg.timing.enemy_tick_ms, 350);
        assert_eq!(cfg.timing.curse_delay_ms, 800);
        assert!((cfg.rules.curse_probability - 0.8).abs() < 1e-9);
        assert_eq!(cfg.rules.win_policy, WinPolicy::AllResolved);
        assert_eq!(cfg.seed, None);
        assert_eq!(cfg.log_file, None);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg = GameConfig::from_toml_str(
            "[grid]\ntreasures = 7\n\n[rules]\nwin_policy = \"all_collected\"\n\n[general]\nseed = 42\n",
        ).unwrap();
        assert_eq!(cfg.grid.treasures, 7);
        assert_eq!(cfg.grid.cols, 12);
        assert_eq!(cfg.rules.win_policy, WinPolicy::AllCollected);
        assert_eq!(cfg.seed, Some(42));
        assert_eq!(cfg.timing.enemy_tick_ms, 350);
    }

    #[test]
    fn unknown_policy_is_an_error() {
        assert!(GameConfig::from_toml_str("[rules]\nwin_policy = \"whenever\"\n").is_err());
    }

    #[test]
    fn clamp_fixes_out_of_range() {
        let mut cfg = GameConfig::from_toml_str(
            "[grid]\nrows = 1\nwall_density = 1.7\nsafe_block = 9\ntreasures = 0\n\n[rules]\ncurse_probability = -0.5\n",
        ).unwrap();
        let warnings = cfg.clamp();
        assert_eq!(warnings.len(), 5);
        assert_eq!(cfg.grid.rows, 2);
        assert_eq!(cfg.grid.treasures, 1);
        assert!((cfg.grid.wall_density - 1.0).abs() < 1e-9);
        assert_eq!(cfg.grid.safe_block, 2);
        assert_eq!(cfg.rules.curse_probability, 0.0);
    }

    #[test]
    fn clamp_leaves_defaults_alone() {
        let mut cfg = GameConfig::default();
        assert!(cfg.clamp().is_empty());
    }
}
