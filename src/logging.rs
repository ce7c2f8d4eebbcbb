use crate::config::LogTarget;
use std::env;
use std::fs::OpenOptions;
use std::io::Write;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

pub fn format_timestamp(at: OffsetDateTime) -> String {
    at.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    ))
    .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

/// `at` shifted to `offset`, formatted for the log file.
pub fn local_timestamp(at: OffsetDateTime, offset: UtcOffset) -> String {
    format_timestamp(at.to_offset(offset))
}

/// Installs the global logger. `RUST_LOG` defaults to `INFO`.
///
/// Call before any other thread starts. The local offset is read once, here.
pub fn init(target: &LogTarget) -> anyhow::Result<()> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    if let Err(env::VarError::NotPresent) = env::var("RUST_LOG") {
        env::set_var("RUST_LOG", "INFO");
    }
    match target {
        LogTarget::Stderr => pretty_env_logger::formatted_timed_builder()
            .parse_default_env()
            .try_init()?,
        LogTarget::File(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            pretty_env_logger::formatted_builder()
                .parse_default_env()
                .format(move |buf, record| {
                    writeln!(
                        buf,
                        "[{}] {}",
                        local_timestamp(OffsetDateTime::now_utc(), offset),
                        record.args()
                    )
                })
                .target(env_logger::Target::Pipe(Box::new(file)))
                .try_init()?
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, offset};

    #[test]
    fn timestamp_is_zero_padded() {
        assert_eq!(
            format_timestamp(datetime!(2024-03-05 07:08:09 UTC)),
            "2024-03-05 07:08:09"
        );
    }

    #[test]
    fn timestamp_uses_captured_offset() {
        let at = datetime!(2024-03-05 23:30:00 UTC);
        assert_eq!(local_timestamp(at, offset!(+2)), "2024-03-06 01:30:00");
        assert_eq!(local_timestamp(at, UtcOffset::UTC), "2024-03-05 23:30:00");
    }
}
