use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

const HEADER_LINE: &str = "-------------------------------------------------------------------------------";
const HEADER_TITLE: &str = "Tibia - Graphical Multi-User-Dungeon";

const WEEKDAYS: [&str; 7] = ["Thu", "Fri", "Sat", "Sun", "Mon", "Tue", "Wed"];
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Writes every record into `game.log`; warnings and errors also land in
/// `error.log`.
struct FileLogger {
    level: LevelFilter,
    game: Mutex<File>,
    error: Mutex<File>,
}

static LOGGER: OnceLock<FileLogger> = OnceLock::new();

/// Installs the file logger under `<root>/log`. A second call is a no-op.
pub fn init(root: &Path, level: LevelFilter) -> Result<(), String> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let log_dir = root.join("log");
    std::fs::create_dir_all(&log_dir)
        .map_err(|err| format!("log directory create failed: {}", err))?;

    let game = open_log(&log_dir, "game.log", true)?;
    let error = open_log(&log_dir, "error.log", false)?;
    let logger = LOGGER.get_or_init(|| FileLogger {
        level,
        game: Mutex::new(game),
        error: Mutex::new(error),
    });
    log::set_logger(logger).map_err(|err| format!("log system already initialized: {}", err))?;
    log::set_max_level(level);
    Ok(())
}

fn open_log(dir: &Path, name: &str, header: bool) -> Result<File, String> {
    let path = dir.join(name);
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|err| format!("open log {} failed: {}", name, err))?;
    if header && file.metadata().map(|m| m.len()).unwrap_or(0) == 0 {
        write_header(&mut file, name)?;
    }
    Ok(file)
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(&format_timestamp(), record.level(), &record.args().to_string());
        let _ = write_line(&self.game, &line);
        if record.level() <= Level::Warn {
            let _ = write_line(&self.error, &line);
        }
    }

    fn flush(&self) {
        for file in [&self.game, &self.error] {
            if let Ok(mut file) = file.lock() {
                let _ = file.flush();
            }
        }
    }
}

fn format_line(timestamp: &str, level: Level, message: &str) -> String {
    format!("{timestamp} ({}): {message}\n", level.as_str().to_lowercase())
}

fn write_line(file: &Mutex<File>, line: &str) -> std::io::Result<()> {
    let mut file = file
        .lock()
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::Other, "log lock poisoned"))?;
    file.write_all(line.as_bytes())?;
    file.flush()
}

fn write_header(file: &mut File, name: &str) -> Result<(), String> {
    let timestamp = format_header_timestamp(unix_timestamp());
    writeln!(file, "{HEADER_LINE}")
        .and_then(|_| writeln!(file, "{HEADER_TITLE}"))
        .and_then(|_| writeln!(file, "{name} - gestartet {timestamp}"))
        .map_err(|err| format!("header write failed: {}", err))
}

fn format_header_timestamp(ts: i64) -> String {
    let datetime = breakdown_timestamp(ts);
    let weekday = WEEKDAYS[(datetime.weekday as usize).min(6)];
    let month = MONTHS[(datetime.month as usize).saturating_sub(1).min(11)];
    format!(
        "{weekday} {month} {:>2} {:02}:{:02}:{:02} {}",
        datetime.day, datetime.hour, datetime.minute, datetime.second, datetime.year
    )
}

fn format_timestamp() -> String {
    let datetime = breakdown_timestamp(unix_timestamp());
    format!(
        "{:02}.{:02}.{} {:02}:{:02}:{:02}",
        datetime.day, datetime.month, datetime.year, datetime.hour, datetime.minute, datetime.second
    )
}

fn unix_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

struct DateTimeParts {
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
    weekday: u32,
}

fn breakdown_timestamp(ts: i64) -> DateTimeParts {
    let secs = ts.max(0);
    let days = secs / 86_400;
    let seconds_of_day = (secs % 86_400) as u32;
    let (year, month, day) = civil_from_days(days);
    DateTimeParts {
        year,
        month,
        day,
        hour: seconds_of_day / 3_600,
        minute: (seconds_of_day % 3_600) / 60,
        second: seconds_of_day % 60,
        // 1970-01-01 was a Thursday, the first entry of WEEKDAYS
        weekday: (days % 7) as u32,
    }
}

// Howard Hinnant's days-to-civil conversion.
fn civil_from_days(days: i64) -> (i32, u32, u32) {
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = mp + if mp < 10 { 3 } else { -9 };
    let year = (y + if m <= 2 { 1 } else { 0 }) as i32;
    (year, m as u32, d as u32)
}
