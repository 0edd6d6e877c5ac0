//! Command-line argument parsing.

use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::config::AdvisorConfig;
use crate::schedule::BehaviorClass;

/// Format accepted by `--now`.
pub const NOW_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Default `--duration` when `--task` is given alone.
pub const DEFAULT_DURATION_HOURS: f64 = 1.0;

/// Default API port.
#[cfg(feature = "api")]
pub const DEFAULT_PORT: u16 = 3000;

/// Parsed CLI arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub config: Option<PathBuf>,
    pub preset: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub weather_csv: Option<PathBuf>,
    /// Local time of the location to anchor the forecast at.
    pub now: Option<NaiveDateTime>,
    pub task: Option<String>,
    pub duration_hours: f64,
    pub behavior: Option<BehaviorClass>,
    pub forecast_out: Option<PathBuf>,
    #[cfg(feature = "api")]
    pub serve: bool,
    #[cfg(feature = "api")]
    pub port: u16,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            config: None,
            preset: None,
            latitude: None,
            longitude: None,
            weather_csv: None,
            now: None,
            task: None,
            duration_hours: DEFAULT_DURATION_HOURS,
            behavior: None,
            forecast_out: None,
            #[cfg(feature = "api")]
            serve: false,
            #[cfg(feature = "api")]
            port: DEFAULT_PORT,
        }
    }
}

/// What the process was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Run(CliArgs),
    Help,
}

impl CliArgs {
    /// Loads the selected configuration and applies command-line overrides.
    ///
    /// `--config` takes priority over `--preset`; without either the
    /// baseline preset is used.
    ///
    /// # Errors
    ///
    /// Returns the `ConfigError` from loading the file or preset.
    pub fn load_config(&self) -> Result<AdvisorConfig, crate::config::ConfigError> {
        let mut cfg = match (&self.config, &self.preset) {
            (Some(path), _) => AdvisorConfig::from_toml_file(path)?,
            (None, Some(name)) => AdvisorConfig::from_preset(name)?,
            (None, None) => AdvisorConfig::baseline(),
        };
        self.apply_overrides(&mut cfg);
        Ok(cfg)
    }

    /// Applies `--lat`, `--lon` and `--weather-csv` on top of `cfg`.
    pub fn apply_overrides(&self, cfg: &mut AdvisorConfig) {
        if let Some(lat) = self.latitude {
            cfg.location.latitude = lat;
        }
        if let Some(lon) = self.longitude {
            cfg.location.longitude = lon;
        }
        if let Some(path) = &self.weather_csv {
            cfg.weather.source = "csv".to_string();
            cfg.weather.csv_path = Some(path.clone());
        }
    }
}

/// Parses `std::env::args()`, skipping the program name.
///
/// # Errors
///
/// See [`parse_args_from`].
pub fn parse_args() -> Result<Command, String> {
    parse_args_from(std::env::args().skip(1))
}

/// Parses an argument list (without the program name).
///
/// # Errors
///
/// Returns a message for unknown flags, missing or malformed values,
/// repeated flags, and `--config` combined with `--preset`.
pub fn parse_args_from<I, S>(args: I) -> Result<Command, String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let args: Vec<String> = args.into_iter().map(Into::into).collect();
    let mut cli = CliArgs::default();
    let mut duration = None;
    let mut i = 0usize;

    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--config" => {
                i += 1;
                let path = args.next_or_err(i, "--config requires a path argument")?;
                set_once(&mut cli.config, PathBuf::from(path), "--config")?;
            }
            "--preset" => {
                i += 1;
                let name = args.next_or_err(i, "--preset requires a name argument")?;
                set_once(&mut cli.preset, name.to_string(), "--preset")?;
            }
            "--lat" => {
                i += 1;
                let v = args.next_or_err(i, "--lat requires a number argument")?;
                set_once(&mut cli.latitude, parse_number(v, "--lat")?, "--lat")?;
            }
            "--lon" => {
                i += 1;
                let v = args.next_or_err(i, "--lon requires a number argument")?;
                set_once(&mut cli.longitude, parse_number(v, "--lon")?, "--lon")?;
            }
            "--weather-csv" => {
                i += 1;
                let path = args.next_or_err(i, "--weather-csv requires a path argument")?;
                set_once(&mut cli.weather_csv, PathBuf::from(path), "--weather-csv")?;
            }
            "--now" => {
                i += 1;
                let v = args.next_or_err(i, "--now requires a YYYY-MM-DDTHH:MM argument")?;
                let now = NaiveDateTime::parse_from_str(v, NOW_FORMAT).map_err(|e| {
                    format!("--now value \"{v}\" is not a valid YYYY-MM-DDTHH:MM time: {e}")
                })?;
                set_once(&mut cli.now, now, "--now")?;
            }
            "--task" => {
                i += 1;
                let name = args.next_or_err(i, "--task requires a name argument")?;
                set_once(&mut cli.task, name.to_string(), "--task")?;
            }
            "--duration" => {
                i += 1;
                let v = args.next_or_err(i, "--duration requires an hours argument")?;
                set_once(&mut duration, parse_number(v, "--duration")?, "--duration")?;
            }
            "--behavior" => {
                i += 1;
                let v = args.next_or_err(i, "--behavior requires attended or unattended")?;
                let behavior = v
                    .parse::<BehaviorClass>()
                    .map_err(|e| format!("--behavior: {e}"))?;
                set_once(&mut cli.behavior, behavior, "--behavior")?;
            }
            "--forecast-out" => {
                i += 1;
                let path = args.next_or_err(i, "--forecast-out requires a path argument")?;
                set_once(&mut cli.forecast_out, PathBuf::from(path), "--forecast-out")?;
            }
            #[cfg(feature = "api")]
            "--serve" => {
                cli.serve = true;
            }
            #[cfg(feature = "api")]
            "--port" => {
                i += 1;
                let v = args.next_or_err(i, "--port requires a u16 argument")?;
                cli.port = v
                    .parse()
                    .map_err(|_| format!("--port value \"{v}\" is not a valid u16"))?;
            }
            other => return Err(format!("unknown argument \"{other}\"")),
        }
        i += 1;
    }

    if cli.config.is_some() && cli.preset.is_some() {
        return Err("--config and --preset are mutually exclusive; choose one source".to_string());
    }
    if cli.task.is_none() && (duration.is_some() || cli.behavior.is_some()) {
        return Err("--duration and --behavior require --task".to_string());
    }
    if let Some(hours) = duration {
        cli.duration_hours = hours;
    }

    Ok(Command::Run(cli))
}

fn set_once<T>(slot: &mut Option<T>, value: T, flag: &str) -> Result<(), String> {
    if slot.replace(value).is_some() {
        return Err(format!("{flag} provided more than once"));
    }
    Ok(())
}

fn parse_number(value: &str, flag: &str) -> Result<f64, String> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("{flag} value \"{value}\" is not a valid number"))
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

/// Prints usage to stderr.
pub fn print_usage() {
    eprintln!("gridslot - carbon-aware appliance scheduling advisor");
    eprintln!();
    eprintln!("Usage: gridslot [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>          Load configuration from a TOML file");
    eprintln!("  --preset <name>          Use a built-in preset (baseline, strict)");
    eprintln!("  --lat <deg>              Override latitude");
    eprintln!("  --lon <deg>              Override longitude");
    eprintln!("  --weather-csv <path>     Read hourly weather from a CSV file");
    eprintln!("  --now <YYYY-MM-DDTHH:MM> Local time to forecast from");
    eprintln!("  --task <name>            Appliance task to schedule");
    eprintln!("  --duration <hours>       Task duration (default: 1)");
    eprintln!("  --behavior <class>       attended or unattended (default: from appliance)");
    eprintln!("  --forecast-out <path>    Export the forecast to CSV");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Start REST API server after the forecast");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --config or --preset is given, the baseline preset is used.");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(args: &[&str]) -> CliArgs {
        match parse_args_from(args.iter().copied()) {
            Ok(Command::Run(cli)) => cli,
            other => panic!("expected run command, got {other:?}"),
        }
    }

    #[test]
    fn no_args_uses_defaults() {
        let cli = run(&[]);
        assert_eq!(cli, CliArgs::default());
        assert_eq!(cli.duration_hours, DEFAULT_DURATION_HOURS);
    }

    #[test]
    fn help_flag() {
        assert_eq!(parse_args_from(["--help"]), Ok(Command::Help));
        assert_eq!(parse_args_from(["--task", "Oven", "-h"]), Ok(Command::Help));
    }

    #[test]
    fn supports_task_cli() {
        let cli = run(&[
            "--task",
            "Dishwasher",
            "--duration",
            "2.5",
            "--behavior",
            "Unattended",
            "--now",
            "2024-05-01T14:30",
        ]);
        assert_eq!(cli.task.as_deref(), Some("Dishwasher"));
        assert_eq!(cli.duration_hours, 2.5);
        assert_eq!(cli.behavior, Some(BehaviorClass::Unattended));
        assert_eq!(
            cli.now.map(|t| t.format(NOW_FORMAT).to_string()).as_deref(),
            Some("2024-05-01T14:30")
        );
    }

    #[test]
    fn config_and_preset_are_exclusive() {
        let err = parse_args_from(["--config", "a.toml", "--preset", "strict"]).unwrap_err();
        assert!(err.contains("mutually exclusive"));
    }

    #[test]
    fn duration_requires_task() {
        let err = parse_args_from(["--duration", "2"]).unwrap_err();
        assert!(err.contains("require --task"));
    }

    #[test]
    fn repeated_flag_is_rejected() {
        let err = parse_args_from(["--task", "a", "--task", "b"]).unwrap_err();
        assert!(err.contains("more than once"));
    }

    #[test]
    fn missing_value_is_rejected() {
        let err = parse_args_from(["--lat"]).unwrap_err();
        assert!(err.contains("requires"));
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(parse_args_from(["--lat", "north"]).is_err());
        assert!(parse_args_from(["--lon", "NaN"]).is_err());
        assert!(parse_args_from(["--now", "tomorrow"]).is_err());
        assert!(parse_args_from(["--task", "x", "--behavior", "sometimes"]).is_err());
    }

    #[test]
    fn unknown_argument() {
        let err = parse_args_from(["--seed", "42"]).unwrap_err();
        assert!(err.contains("unknown argument"));
    }

    #[test]
    fn overrides_apply_to_config() {
        let cli = run(&["--lat", "48.85", "--lon", "2.35", "--weather-csv", "w.csv"]);
        let cfg = cli.load_config().unwrap();
        assert_eq!(cfg.location.latitude, 48.85);
        assert_eq!(cfg.location.longitude, 2.35);
        assert_eq!(cfg.weather.source, "csv");
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn preset_is_loaded() {
        let cfg = run(&["--preset", "strict"]).load_config().unwrap();
        assert_eq!(cfg.optimizer.green_threshold, 120.0);
    }
}
